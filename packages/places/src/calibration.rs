//! Confidence bands and distance scaling for the places analysis.
//!
//! The exact numbers are product tuning. What must hold is the ordering of
//! the bands (primary above secondary above exclusion above outside), which
//! [`Calibration::validate`] enforces.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const EMBEDDED_CALIBRATION: &str = include_str!("../calibration.toml");

static EMBEDDED: LazyLock<Calibration> = LazyLock::new(|| {
    Calibration::from_toml_str(EMBEDDED_CALIBRATION)
        .unwrap_or_else(|e| panic!("Failed to load embedded calibration.toml: {e}"))
});

/// Errors from loading a calibration.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// TOML parsing failed.
    #[error("Failed to parse calibration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values violate band ordering or range constraints.
    #[error("Invalid calibration: {message}")]
    Invalid {
        /// Which constraint failed.
        message: String,
    },
}

/// A confidence range for one kind of outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub min: i32,
    pub base: i32,
    pub max: i32,
}

impl ConfidenceBand {
    /// Maps a normalized signal in `[-1, 1]` into the band.
    ///
    /// `-1` lands on `min`, `0` on `base`, `1` on `max`. The result never
    /// leaves the band.
    #[must_use]
    pub fn score(&self, signal: f64) -> i32 {
        let signal = if signal.is_finite() {
            signal.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let span = if signal >= 0.0 {
            f64::from(self.max - self.base)
        } else {
            f64::from(self.base - self.min)
        };

        #[allow(clippy::cast_possible_truncation)]
        let score = (f64::from(self.base) + signal * span).round() as i32;

        score.clamp(self.min, self.max)
    }

    fn validate(&self, name: &str) -> Result<(), CalibrationError> {
        if !(0..=100).contains(&self.min) || !(0..=100).contains(&self.max) {
            return Err(CalibrationError::Invalid {
                message: format!("{name} band must lie within 0-100"),
            });
        }
        if self.min > self.base || self.base > self.max {
            return Err(CalibrationError::Invalid {
                message: format!("{name} band must satisfy min <= base <= max"),
            });
        }
        Ok(())
    }
}

/// Full set of confidence bands plus distance scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Inside margin (degrees) under which a point is near the edge.
    pub edge_margin_deg: f64,
    /// Margin (degrees) at which the distance signal saturates.
    pub full_depth_deg: f64,
    pub primary: ConfidenceBand,
    pub secondary: ConfidenceBand,
    pub exclusion: ConfidenceBand,
    /// Not in any boundary, or in a boundary with unrecognized types.
    pub outside: ConfidenceBand,
}

impl Calibration {
    /// Returns the calibration compiled into the crate.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `calibration.toml` is malformed (a
    /// compile-time guarantee since the file is embedded and covered by
    /// tests).
    #[must_use]
    pub fn embedded() -> &'static Self {
        &EMBEDDED
    }

    /// Parses and validates a calibration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError`] if parsing or validation fails.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CalibrationError> {
        let calibration: Self = toml::de::from_str(toml_str)?;
        calibration.validate()?;
        Ok(calibration)
    }

    /// Checks band ranges, band ordering, and distance scales.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Invalid`] naming the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        self.primary.validate("primary")?;
        self.secondary.validate("secondary")?;
        self.exclusion.validate("exclusion")?;
        self.outside.validate("outside")?;

        let ordered = [
            ("primary", self.primary),
            ("secondary", self.secondary),
            ("exclusion", self.exclusion),
            ("outside", self.outside),
        ];
        for pair in ordered.windows(2) {
            let (upper_name, upper) = pair[0];
            let (lower_name, lower) = pair[1];
            if upper.min <= lower.max {
                return Err(CalibrationError::Invalid {
                    message: format!("{upper_name} band must sit above {lower_name} band"),
                });
            }
        }

        if !(self.edge_margin_deg > 0.0 && self.edge_margin_deg < self.full_depth_deg) {
            return Err(CalibrationError::Invalid {
                message: "expected 0 < edge_margin_deg < full_depth_deg".to_string(),
            });
        }

        Ok(())
    }

    /// Signal for a point inside a boundary, from its margin to the edge.
    ///
    /// Near the edge the signal runs from `-1` (on the edge) to `0` (at
    /// `edge_margin_deg`), then rises to `1` at `full_depth_deg`.
    #[must_use]
    pub fn inside_signal(&self, distance: Option<f64>) -> f64 {
        let Some(d) = distance else {
            return 0.0;
        };

        if d < self.edge_margin_deg {
            (d.max(0.0) / self.edge_margin_deg) - 1.0
        } else {
            ((d - self.edge_margin_deg) / (self.full_depth_deg - self.edge_margin_deg)).min(1.0)
        }
    }

    /// Signal for a point outside every boundary, from the closest miss.
    ///
    /// `0` right at an edge, falling to `-1` at `full_depth_deg` away.
    #[must_use]
    pub fn outside_signal(&self, distance: Option<f64>) -> f64 {
        distance.map_or(0.0, |d| (d.min(0.0) / self.full_depth_deg).max(-1.0))
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::embedded().clone()
    }
}
