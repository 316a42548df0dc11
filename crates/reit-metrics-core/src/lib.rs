pub mod config;
pub mod error;
pub mod record;
pub mod reit;
pub mod types;

pub use config::MetricsConfig;
pub use error::ReitMetricsError;
pub use record::FinancialRecord;
pub use types::*;

/// Standard result type for all REIT metric operations
pub type ReitMetricsResult<T> = Result<T, ReitMetricsError>;
