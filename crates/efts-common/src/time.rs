//! Time axis construction for forecast datasets.
//!
//! A store carries two independent time axes: an absolute issue-time axis
//! built once at creation, and a lead-time axis of relative integer offsets
//! tagged with a step unit. Offsets stay relative so the same lead-time
//! axis can be re-anchored to any issue time without re-deriving the file.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building time or lead-time axes.
#[derive(Debug, Error)]
pub enum AxisError {
    /// Axis length or step is not a positive quantity.
    #[error("invalid axis specification: {0}")]
    InvalidAxisSpec(String),
}

/// The closed set of step units an axis may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "seconds" => Some(TimeUnit::Seconds),
            "hours" => Some(TimeUnit::Hours),
            "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    /// Duration spanned by `n` steps of this unit.
    pub fn duration(&self, n: i64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::seconds(n),
            TimeUnit::Hours => Duration::hours(n),
            TimeUnit::Days => Duration::days(n),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Specification of a regular absolute time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeAxisSpec {
    /// First timestamp on the axis.
    pub start: DateTime<Utc>,
    /// Step unit.
    pub unit: TimeUnit,
    /// Number of units per step.
    pub step: i64,
    /// Number of timestamps on the axis.
    pub length: usize,
}

impl TimeAxisSpec {
    pub fn new(start: DateTime<Utc>, unit: TimeUnit, step: i64, length: usize) -> Self {
        Self {
            start,
            unit,
            step,
            length,
        }
    }

    pub fn validate(&self) -> Result<(), AxisError> {
        if self.length == 0 {
            return Err(AxisError::InvalidAxisSpec(
                "time axis length must be positive".to_string(),
            ));
        }
        if self.step <= 0 {
            return Err(AxisError::InvalidAxisSpec(format!(
                "time axis step must be positive, got {}",
                self.step
            )));
        }
        Ok(())
    }

    /// Materialise the axis: exactly `length` strictly increasing
    /// timestamps, the first equal to `start`.
    pub fn build(&self) -> Result<Vec<DateTime<Utc>>, AxisError> {
        self.validate()?;
        Ok((0..self.length as i64)
            .map(|i| self.start + self.unit.duration(i * self.step))
            .collect())
    }
}

/// Integer lead-time offsets with a uniform stride.
///
/// Offsets are index metadata only; they are combined with a step unit and
/// a caller-supplied issue time when a forecast is read back:
/// `valid_time[i] = issue_time + offset[i] * unit`.
pub fn lead_time_offsets(
    start_offset: i64,
    count: usize,
    stride: i64,
) -> Result<Vec<i64>, AxisError> {
    if count == 0 {
        return Err(AxisError::InvalidAxisSpec(
            "lead-time axis length must be positive".to_string(),
        ));
    }
    if stride <= 0 {
        return Err(AxisError::InvalidAxisSpec(format!(
            "lead-time stride must be positive, got {}",
            stride
        )));
    }
    Ok((0..count as i64).map(|i| start_offset + i * stride).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 8, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_build_time_axis_hours() {
        let axis = TimeAxisSpec::new(start(), TimeUnit::Hours, 1, 10)
            .build()
            .unwrap();
        assert_eq!(axis.len(), 10);
        assert_eq!(axis[0], start());
        assert_eq!(axis[1], start() + Duration::hours(1));
        assert!(axis.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_build_time_axis_scaled_step() {
        let axis = TimeAxisSpec::new(start(), TimeUnit::Days, 2, 4)
            .build()
            .unwrap();
        assert_eq!(axis[3], start() + Duration::days(6));
    }

    #[test]
    fn test_invalid_axis_spec() {
        assert!(TimeAxisSpec::new(start(), TimeUnit::Hours, 1, 0)
            .build()
            .is_err());
        assert!(TimeAxisSpec::new(start(), TimeUnit::Hours, 0, 10)
            .build()
            .is_err());
        assert!(TimeAxisSpec::new(start(), TimeUnit::Hours, -1, 10)
            .build()
            .is_err());
    }

    #[test]
    fn test_lead_time_offsets() {
        assert_eq!(lead_time_offsets(1, 4, 1).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(lead_time_offsets(1, 4, 3).unwrap(), vec![1, 4, 7, 10]);
        assert!(lead_time_offsets(1, 0, 1).is_err());
        assert!(lead_time_offsets(1, 4, 0).is_err());
    }

    #[test]
    fn test_unit_round_trip() {
        for unit in [TimeUnit::Seconds, TimeUnit::Hours, TimeUnit::Days] {
            assert_eq!(TimeUnit::parse(unit.as_str()), Some(unit));
        }
        assert_eq!(TimeUnit::parse("HOURS"), Some(TimeUnit::Hours));
        assert_eq!(TimeUnit::parse("fortnights"), None);
    }
}
