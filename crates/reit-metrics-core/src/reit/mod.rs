pub mod acfo;
pub mod afcf;
pub mod burn_rate;
pub mod coverage;
pub mod dilution;
pub mod ffo_affo;
pub mod leverage;
pub mod orchestrator;
pub mod reconciliation;
pub mod validation;

pub use orchestrator::{calculate_reit_metrics, calculate_reit_metrics_as_of};
