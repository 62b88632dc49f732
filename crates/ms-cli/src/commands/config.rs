//! Config command: prints the effective configuration.

use std::io::Write;

use anyhow::Result;
use ms_core::AnalysisConfig;

pub fn run<W: Write>(writer: &mut W, config: &AnalysisConfig) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(config)?)?;
    Ok(())
}
