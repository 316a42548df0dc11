pub mod metrics;
pub mod risk;
pub mod waterfall;

use clap::Args;
use serde_json::Value;

use reit_metrics_core::FinancialRecord;

use crate::input;

/// Input source shared by every record-driven subcommand.
#[derive(Args)]
pub struct RecordArgs {
    /// Path to a JSON or YAML financial record (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,
}

/// Load the record from `--input`, else from piped stdin.
pub fn load_record(args: &RecordArgs) -> Result<FinancialRecord, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_document(path);
    }
    match input::stdin::read_stdin()? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err("no record supplied: pass --input <file> or pipe a record on stdin".into()),
    }
}

/// Load the record as untyped JSON, keeping fields the typed record ignores.
pub fn load_raw(args: &RecordArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_document(path);
    }
    input::stdin::read_stdin()?
        .ok_or_else(|| "no record supplied: pass --input <file> or pipe a record on stdin".into())
}
