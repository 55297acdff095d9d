//! Decimal SI prefixes used for metric display

use std::fmt;

use crate::error::{FootprintError, Result};

/// Decimal prefix of a metric unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prefix {
    #[default]
    Base,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
    Exa,
}

/// Prefixes in ascending order of magnitude
pub const PREFIXES: [Prefix; 7] = [
    Prefix::Base,
    Prefix::Kilo,
    Prefix::Mega,
    Prefix::Giga,
    Prefix::Tera,
    Prefix::Peta,
    Prefix::Exa,
];

/// Exclusive upper bound of the largest prefix (one step above Exa)
const POWER_CEILING: f64 = 1e21;

impl Prefix {
    /// Short display symbol, empty for the base unit
    pub fn symbol(&self) -> &'static str {
        match self {
            Prefix::Base => "",
            Prefix::Kilo => "K",
            Prefix::Mega => "M",
            Prefix::Giga => "G",
            Prefix::Tera => "T",
            Prefix::Peta => "P",
            Prefix::Exa => "E",
        }
    }

    pub fn power(&self) -> f64 {
        match self {
            Prefix::Base => 1.0,
            Prefix::Kilo => 1e3,
            Prefix::Mega => 1e6,
            Prefix::Giga => 1e9,
            Prefix::Tera => 1e12,
            Prefix::Peta => 1e15,
            Prefix::Exa => 1e18,
        }
    }

    /// Parse a prefix symbol. Lowercase aliases are accepted except for `m`,
    /// which means Mega for the counting units this crate deals with.
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            "" => Ok(Prefix::Base),
            "K" | "k" => Ok(Prefix::Kilo),
            "M" | "m" => Ok(Prefix::Mega),
            "G" | "g" => Ok(Prefix::Giga),
            "T" | "t" => Ok(Prefix::Tera),
            "P" | "p" => Ok(Prefix::Peta),
            "E" | "e" => Ok(Prefix::Exa),
            other => Err(FootprintError::InvalidUnit(format!(
                "unknown prefix '{}'",
                other
            ))),
        }
    }

    /// Largest prefix whose power does not exceed `x`.
    ///
    /// Returns `None` for values below 1 (including negatives and NaN) and
    /// for values at or above 1e21.
    pub fn for_magnitude(x: f64) -> Option<Self> {
        PREFIXES.iter().enumerate().find_map(|(i, p)| {
            let upper = PREFIXES.get(i + 1).map_or(POWER_CEILING, |next| next.power());
            (p.power() <= x && x < upper).then_some(*p)
        })
    }

    /// Conversion factor that turns a value in `self` into a value in `to`
    pub fn factor_to(&self, to: Prefix) -> f64 {
        self.power() / to.power()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a value between two prefixes of the same base unit
pub fn convert(value: f64, from: Prefix, to: Prefix) -> f64 {
    value * from.factor_to(to)
}
