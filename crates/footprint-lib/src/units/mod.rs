//! Metric units and display scaling
//!
//! Provides the decimal prefix table, unit string parsing, and the number
//! formatting helpers used to render "used / max" style values.

mod prefix;
mod scale;

pub use prefix::{convert, Prefix, PREFIXES};
pub use scale::{format_number, round2, scale_numbers, ChartValue};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FootprintError, Result};

/// Measures that never carry a prefix
const UNPREFIXED: &[&str] = &["", "load", "CPI", "IPC", "%", "percent"];

/// Measures that may follow a prefix
const MEASURES: &[&str] = &[
    "B", "F", "Hz", "W", "J", "s", "C", "degC", "packets", "events", "cycles", "requests",
];

/// Display unit as delivered by the backend: prefix and base kept apart
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub base: String,
}

impl Unit {
    pub fn new(prefix: Prefix, base: impl Into<String>) -> Self {
        Self {
            prefix: prefix.symbol().to_string(),
            base: base.into(),
        }
    }

    /// Parse a combined unit string such as `GB/s`, `F/s` or `load`
    pub fn parse(unit: &str) -> Result<Self> {
        let unit = unit.trim();
        if UNPREFIXED.contains(&unit) {
            return Ok(Self {
                prefix: String::new(),
                base: unit.to_string(),
            });
        }

        let (numerator, denominator) = match unit.split_once('/') {
            Some((num, den)) => (num, Some(den)),
            None => (unit, None),
        };
        if let Some(den) = denominator {
            if !MEASURES.contains(&den) {
                return Err(FootprintError::InvalidUnit(unit.to_string()));
            }
        }

        if MEASURES.contains(&numerator) {
            return Ok(Self {
                prefix: String::new(),
                base: unit.to_string(),
            });
        }

        let mut chars = numerator.chars();
        let symbol = chars.next().map(String::from).unwrap_or_default();
        let measure = chars.as_str();
        if !MEASURES.contains(&measure) {
            return Err(FootprintError::InvalidUnit(unit.to_string()));
        }
        let prefix = Prefix::from_symbol(&symbol)
            .map_err(|_| FootprintError::InvalidUnit(unit.to_string()))?;

        Ok(Self::new(prefix, &unit[symbol.len()..]))
    }

    /// The prefix as an enum, if it is one of the supported symbols
    pub fn prefix(&self) -> Result<Prefix> {
        Prefix::from_symbol(&self.prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.base.is_empty()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.base)
    }
}
