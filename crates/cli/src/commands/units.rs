//! Number formatting commands

use anyhow::Result;
use footprint_lib::{scale_numbers, units::ChartValue, Prefix};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_rows, OutputFormat};

#[derive(Tabled, Serialize)]
struct FormatRow {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Formatted")]
    formatted: String,
}

/// Format each value with the best-fitting prefix
pub fn format_values(values: &[String], format: OutputFormat) -> Result<()> {
    let rows: Vec<FormatRow> = values
        .iter()
        .map(|input| FormatRow {
            input: input.clone(),
            formatted: ChartValue::parse(input).format(),
        })
        .collect();

    print_rows(&rows, &rows, format)
}

/// Render `x / y` given in `prefix` units with one shared prefix
pub fn scale(x: f64, y: f64, prefix: &str, format: OutputFormat) -> Result<()> {
    let prefix = Prefix::from_symbol(prefix)?;
    let formatted = scale_numbers(x, y, prefix);

    match format {
        OutputFormat::Table => println!("{}", formatted),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "formatted": formatted }))?
        ),
    }
    Ok(())
}
