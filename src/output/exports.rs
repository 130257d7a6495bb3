use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::config::OutputFormat;

/// Exports a report in the requested machine-readable format.
///
/// Summary output is terminal-oriented and handled directly in the CLI;
/// everything that reaches this function serializes through serde.
pub fn export_report<T: Serialize>(
    report: &T,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            unreachable!("Summary format should be handled in CLI")
        }
        OutputFormat::Json => export_json(report, pretty, output),
    }
}

fn export_json<T: Serialize>(report: &T, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{}", json)?;
    Ok(())
}
