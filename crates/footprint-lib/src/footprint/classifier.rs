//! Footprint severity classification
//!
//! Compares a job's observed metric average against the metric's threshold
//! profile and produces a color, an impact rank and a message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FootprintError, Result};
use crate::units::Unit;

use super::{metric_traits, MetricPolarity};

/// Averages at or beyond this multiple of the peak are almost certainly artifacts
pub const ARTIFACT_SEVERE_FACTOR: f64 = 1.5;

/// Averages at or beyond this multiple of the peak deserve an artifact check
pub const ARTIFACT_MILD_FACTOR: f64 = 1.05;

/// Threshold profile of one metric on one hardware class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholdProfile {
    pub normal: f64,
    pub caution: f64,
    pub alert: f64,
    pub peak: f64,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub polarity: MetricPolarity,
    /// Multiplier applied to `peak` before comparison
    #[serde(default = "default_peak_factor")]
    pub peak_factor: f64,
}

fn default_peak_factor() -> f64 {
    1.0
}

impl MetricThresholdProfile {
    /// Profile with standard polarity and no peak derating
    pub fn new(normal: f64, caution: f64, alert: f64, peak: f64) -> Self {
        Self {
            normal,
            caution,
            alert,
            peak,
            unit: Unit::default(),
            polarity: MetricPolarity::HigherIsBetter,
            peak_factor: 1.0,
        }
    }

    /// Profile with polarity and derating taken from the built-in metric table
    pub fn for_metric(metric: &str, normal: f64, caution: f64, alert: f64, peak: f64) -> Self {
        let traits = metric_traits(metric);
        Self {
            polarity: traits.polarity,
            peak_factor: traits.peak_factor,
            ..Self::new(normal, caution, alert, peak)
        }
    }

    pub fn with_polarity(mut self, polarity: MetricPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Peak used for comparisons after derating
    pub fn effective_peak(&self) -> f64 {
        self.peak * self.peak_factor
    }
}

/// Display color of a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Danger,
    Warning,
    Success,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one metric average
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintClassification {
    pub color: Severity,
    pub message: String,
    /// Severity rank. Positive values grow with distance from the good band,
    /// negative values flag averages above the peak.
    pub impact: i8,
}

impl FootprintClassification {
    fn new(color: Severity, impact: i8, level: &str) -> Self {
        Self {
            color,
            message: format!("This metric is {}", level),
            impact,
        }
    }

    /// True when the average most likely stems from a measurement artifact
    pub fn is_artifact_suspect(&self) -> bool {
        self.impact < 0
    }
}

/// Classify `avg` for the named metric, deriving polarity and peak derating
/// from the built-in metric table.
pub fn classify(
    metric: &str,
    avg: f64,
    normal: f64,
    caution: f64,
    alert: f64,
    peak: f64,
) -> Result<FootprintClassification> {
    let profile = MetricThresholdProfile::for_metric(metric, normal, caution, alert, peak);
    classify_profile(avg, &profile)
}

/// Classify `avg` against a resolved threshold profile.
///
/// Fails with [`FootprintError::InvalidInput`] for non-finite averages;
/// callers are expected to drop metrics without data beforehand.
pub fn classify_profile(
    avg: f64,
    profile: &MetricThresholdProfile,
) -> Result<FootprintClassification> {
    if !avg.is_finite() {
        return Err(FootprintError::InvalidInput(format!(
            "metric average must be finite, got {}",
            avg
        )));
    }

    let peak = profile.effective_peak();
    let levels = Levels {
        peak: peak - avg,
        normal: profile.normal - avg,
        caution: profile.caution - avg,
        alert: profile.alert - avg,
    };

    let classification = match profile.polarity {
        MetricPolarity::HigherIsBetter => classify_higher_is_better(avg, peak, &levels),
        MetricPolarity::LowerIsBetter => classify_lower_is_better(avg, peak, &levels),
    };
    Ok(classification)
}

/// Distance of each threshold above the average; positive means the
/// average has not reached that threshold yet.
struct Levels {
    peak: f64,
    normal: f64,
    caution: f64,
    alert: f64,
}

fn classify_higher_is_better(avg: f64, peak: f64, levels: &Levels) -> FootprintClassification {
    if levels.alert > 0.0 {
        FootprintClassification::new(Severity::Danger, 3, "strongly below common levels.")
    } else if levels.caution > 0.0 {
        FootprintClassification::new(Severity::Warning, 2, "below common levels.")
    } else if levels.normal > 0.0 {
        FootprintClassification::new(Severity::Success, 1, "within common levels.")
    } else if levels.peak > 0.0 {
        FootprintClassification::new(Severity::Info, 0, "better than common levels.")
    } else {
        above_peak(avg, peak).unwrap_or_else(|| {
            FootprintClassification::new(Severity::Info, 0, "better than common levels.")
        })
    }
}

fn classify_lower_is_better(avg: f64, peak: f64, levels: &Levels) -> FootprintClassification {
    if levels.normal > 0.0 {
        FootprintClassification::new(Severity::Success, 1, "within common levels.")
    } else if levels.caution > 0.0 {
        FootprintClassification::new(Severity::Warning, 2, "above common levels.")
    } else if levels.alert > 0.0 {
        FootprintClassification::new(Severity::Danger, 3, "strongly above common levels.")
    } else if levels.peak > 0.0 {
        FootprintClassification::new(Severity::Danger, 4, "extremely above common levels.")
    } else {
        above_peak(avg, peak).unwrap_or_else(|| {
            FootprintClassification::new(Severity::Danger, 4, "extremely above common levels.")
        })
    }
}

/// Artifact bands above the effective peak; `None` while still plausible
fn above_peak(avg: f64, peak: f64) -> Option<FootprintClassification> {
    if avg >= ARTIFACT_SEVERE_FACTOR * peak {
        Some(FootprintClassification::new(
            Severity::Danger,
            -2,
            "at least 50% above common peak: check for artifacts.",
        ))
    } else if avg >= ARTIFACT_MILD_FACTOR * peak {
        Some(FootprintClassification::new(
            Severity::Warning,
            -1,
            "at least 5% above common peak: check for artifacts.",
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_bw() -> MetricThresholdProfile {
        MetricThresholdProfile::for_metric("mem_bw", 60.0, 30.0, 10.0, 100.0)
    }

    fn mem_used() -> MetricThresholdProfile {
        MetricThresholdProfile::for_metric("mem_used", 40.0, 60.0, 80.0, 100.0)
    }

    fn outcome(avg: f64, profile: &MetricThresholdProfile) -> (Severity, i8) {
        let c = classify_profile(avg, profile).unwrap();
        (c.color, c.impact)
    }

    #[test]
    fn test_mem_bw_scenarios() {
        let profile = mem_bw();
        assert_eq!(outcome(45.0, &profile), (Severity::Success, 1));
        assert_eq!(outcome(5.0, &profile), (Severity::Danger, 3));
        assert_eq!(outcome(160.0, &profile), (Severity::Danger, -2));
    }

    #[test]
    fn test_mem_used_scenarios() {
        let profile = mem_used();
        assert_eq!(profile.polarity, MetricPolarity::LowerIsBetter);
        assert_eq!(outcome(20.0, &profile), (Severity::Success, 1));
        assert_eq!(outcome(95.0, &profile), (Severity::Danger, 4));
    }

    #[test]
    fn test_higher_is_better_is_monotonic() {
        let profile = mem_bw();
        let expected = [
            (Severity::Danger, 3),
            (Severity::Warning, 2),
            (Severity::Success, 1),
            (Severity::Info, 0),
        ];

        let mut seen: Vec<(Severity, i8)> = Vec::new();
        let mut avg = 0.0;
        while avg < 100.0 {
            let current = outcome(avg, &profile);
            if seen.last() != Some(&current) {
                seen.push(current);
            }
            avg += 0.5;
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_lower_is_better_is_monotonic() {
        let profile = mem_used();
        let expected = [
            (Severity::Success, 1),
            (Severity::Warning, 2),
            (Severity::Danger, 3),
            (Severity::Danger, 4),
        ];

        let mut seen: Vec<(Severity, i8)> = Vec::new();
        let mut avg = 0.0;
        while avg < 105.0 {
            let current = outcome(avg, &profile);
            if seen.last() != Some(&current) {
                seen.push(current);
            }
            avg += 0.5;
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_threshold_boundaries_belong_to_better_band() {
        let profile = mem_bw();
        assert_eq!(outcome(10.0, &profile), (Severity::Warning, 2));
        assert_eq!(outcome(30.0, &profile), (Severity::Success, 1));
        assert_eq!(outcome(60.0, &profile), (Severity::Info, 0));
    }

    #[test]
    fn test_artifact_bands() {
        let profile = mem_bw();
        assert_eq!(outcome(100.0, &profile), (Severity::Info, 0));
        assert_eq!(outcome(104.0, &profile), (Severity::Info, 0));
        assert_eq!(outcome(105.0, &profile), (Severity::Warning, -1));
        assert_eq!(outcome(150.0, &profile), (Severity::Danger, -2));

        let used = mem_used();
        assert_eq!(outcome(102.0, &used), (Severity::Danger, 4));
        assert_eq!(outcome(120.0, &used), (Severity::Warning, -1));
        assert_eq!(outcome(151.0, &used), (Severity::Danger, -2));
    }

    #[test]
    fn test_flop_rate_peak_is_derated() {
        let profile = MetricThresholdProfile::for_metric("flops_any", 50.0, 20.0, 5.0, 100.0);
        assert!((profile.effective_peak() - 85.0).abs() < 1e-9);

        // Above the derated peak but below 1.05x of it
        assert_eq!(outcome(88.0, &profile), (Severity::Info, 0));
        assert_eq!(outcome(90.0, &profile), (Severity::Warning, -1));
        assert_eq!(outcome(130.0, &profile), (Severity::Danger, -2));
    }

    #[test]
    fn test_non_finite_average_rejected() {
        let profile = mem_bw();
        assert!(matches!(
            classify_profile(f64::NAN, &profile),
            Err(FootprintError::InvalidInput(_))
        ));
        assert!(classify_profile(f64::INFINITY, &profile).is_err());
    }

    #[test]
    fn test_classify_by_name() {
        let c = classify("mem_bw", 45.0, 60.0, 30.0, 10.0, 100.0).unwrap();
        assert_eq!(c.color, Severity::Success);
        assert_eq!(c.message, "This metric is within common levels.");
        assert!(!c.is_artifact_suspect());

        let c = classify("mem_bw", 160.0, 60.0, 30.0, 10.0, 100.0).unwrap();
        assert!(c.is_artifact_suspect());
    }

    #[test]
    fn test_classification_json() {
        let c = classify("mem_used", 95.0, 40.0, 60.0, 80.0, 100.0).unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["color"], "danger");
        assert_eq!(json["impact"], 4);
    }
}
