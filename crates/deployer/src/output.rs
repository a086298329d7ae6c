//! Output formatting helpers for the `deployer` CLI.

use serde::Serialize;
use std::io::{self, Write};

/// Print a value as pretty JSON on stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print `name hash` lines with the names padded to a common width.
pub fn output_pairs(pairs: &[(String, String)]) {
    let width = pairs.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (name, value) in pairs {
        let _ = writeln!(handle, "{name:<width$}  {value}");
    }
}
