//! CLI command implementations

pub mod footprint;
pub mod histogram;
pub mod units;

use anyhow::{bail, Context, Result};
use std::io::Read;

/// Read a file, or stdin when `path` is `-`
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}

/// Parse numbers given as a JSON array or separated by whitespace/commas
pub fn parse_values(input: &str) -> Result<Vec<f64>> {
    let trimmed = input.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON number array");
    }

    let mut values = Vec::new();
    for token in trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match token.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) => bail!("Not a number: '{}'", token),
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        assert_eq!(parse_values(" [1, 2.5, 3]\n").unwrap(), vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn test_parse_plain_list() {
        assert_eq!(
            parse_values("1\n2.5, 3\t4\n").unwrap(),
            vec![1.0, 2.5, 3.0, 4.0]
        );
        assert!(parse_values("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_values("1 two 3").is_err());
    }
}
