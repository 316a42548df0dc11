use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout. A closed pipe (`reitm ... | head`) ends quietly.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|_| writeln!(out));

    if let Err(e) = written {
        if e.kind() != io::ErrorKind::BrokenPipe {
            tracing::error!(error = %e, "failed to write JSON output");
        }
    }
}
