//! Human-readable number rendering with decimal prefixes

use serde::{Deserialize, Serialize};

use super::prefix::Prefix;

/// Round to two decimal places
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Render a magnitude with the best-fitting prefix, e.g. `1.5 K`.
///
/// Values below 1 are printed as-is; values outside the prefix table with an
/// absolute value of at least 1000 fall back to scientific notation.
pub fn format_number(x: f64) -> String {
    match Prefix::for_magnitude(x) {
        Some(prefix) => with_prefix(&round2(x / prefix.power()).to_string(), prefix),
        None if x.abs() >= 1000.0 => format!("{:e}", x),
        None => x.to_string(),
    }
}

/// Render `x / y` with one shared prefix chosen from `y`.
///
/// Both inputs are interpreted as already scaled by `current` and are first
/// brought back to raw magnitudes.
pub fn scale_numbers(x: f64, y: f64, current: Prefix) -> String {
    let raw_x = x * current.power();
    let raw_y = y * current.power();

    match Prefix::for_magnitude(raw_y) {
        Some(prefix) => with_prefix(
            &format!(
                "{} / {}",
                round2(raw_x / prefix.power()),
                round2(raw_y / prefix.power())
            ),
            prefix,
        ),
        None if raw_y.abs() >= 1000.0 => format!("{:e} / {:e}", raw_x, raw_y),
        None => format!("{} / {}", raw_x, raw_y),
    }
}

fn with_prefix(value: &str, prefix: Prefix) -> String {
    if prefix == Prefix::Base {
        value.to_string()
    } else {
        format!("{} {}", value, prefix.symbol())
    }
}

/// A chart axis entry: either a number to be formatted or a category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartValue {
    Number(f64),
    Label(String),
}

impl ChartValue {
    /// Interpret free-form input, keeping anything non-numeric as a label
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<f64>() {
            Ok(x) if !x.is_nan() => ChartValue::Number(x),
            _ => ChartValue::Label(input.to_string()),
        }
    }

    /// Numbers go through [`format_number`], labels pass through unchanged
    pub fn format(&self) -> String {
        match self {
            ChartValue::Number(x) if x.is_nan() => x.to_string(),
            ChartValue::Number(x) => format_number(*x),
            ChartValue::Label(label) => label.clone(),
        }
    }
}

impl From<f64> for ChartValue {
    fn from(x: f64) -> Self {
        ChartValue::Number(x)
    }
}

impl From<&str> for ChartValue {
    fn from(label: &str) -> Self {
        ChartValue::Label(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_scaled(s: &str) -> (f64, f64, Prefix) {
        let (x, rest) = s.split_once(" / ").unwrap();
        let mut parts = rest.split(' ');
        let y = parts.next().unwrap();
        let prefix = Prefix::from_symbol(parts.next().unwrap_or("")).unwrap();
        (x.parse().unwrap(), y.parse().unwrap(), prefix)
    }

    #[test]
    fn test_format_number_picks_prefix() {
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1 K");
        assert_eq!(format_number(1536.0), "1.54 K");
        assert_eq!(format_number(2.5e9), "2.5 G");
        assert_eq!(format_number(7.25e18), "7.25 E");
    }

    #[test]
    fn test_format_number_outside_table() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(-5000.0), "-5e3");
        assert_eq!(format_number(3e21), "3e21");
    }

    #[test]
    fn test_labels_pass_through() {
        assert_eq!(ChartValue::from("abc").format(), "abc");
        assert_eq!(ChartValue::parse("abc").format(), "abc");
        assert_eq!(ChartValue::parse("2048").format(), "2.05 K");
    }

    #[test]
    fn test_chart_value_untagged_json() {
        let values: Vec<ChartValue> = serde_json::from_str(r#"[1500, "node01"]"#).unwrap();
        assert_eq!(values[0], ChartValue::Number(1500.0));
        assert_eq!(values[1], ChartValue::Label("node01".to_string()));
    }

    #[test]
    fn test_scale_numbers_shares_prefix() {
        assert_eq!(scale_numbers(1500.0, 3000.0, Prefix::Kilo), "1.5 / 3 M");
        assert_eq!(scale_numbers(250.0, 512.0, Prefix::Giga), "250 / 512 G");
        assert_eq!(scale_numbers(12.0, 64.0, Prefix::Base), "12 / 64");
    }

    #[test]
    fn test_scale_numbers_recovers_inputs() {
        let cases = [
            (1500.0, 3000.0, Prefix::Kilo),
            (0.75, 2.0, Prefix::Tera),
            (40.0, 512.0, Prefix::Giga),
            (3.0, 7.5, Prefix::Base),
        ];

        for (x, y, prefix) in cases {
            let (sx, sy, sp) = parse_scaled(&scale_numbers(x, y, prefix));
            let back_x = super::super::prefix::convert(sx, sp, prefix);
            let back_y = super::super::prefix::convert(sy, sp, prefix);
            let tolerance = 0.005 * sp.factor_to(prefix) + 1e-9;
            assert!((back_x - x).abs() <= tolerance, "x: {} vs {}", back_x, x);
            assert!((back_y - y).abs() <= tolerance, "y: {} vs {}", back_y, y);
        }
    }

    #[test]
    fn test_scale_numbers_large_reference_falls_back() {
        assert_eq!(scale_numbers(1.0, 2.0, Prefix::Exa), "1 / 2 E");
        assert_eq!(scale_numbers(2000.0, 5000.0, Prefix::Exa), "2e21 / 5e21");
    }
}
