//! Generation bounds attached to generator-config descriptors.

use serde::{Deserialize, Serialize};

pub const DEFAULT_START_DATE: &str = "2000-01-01T00:00:00+00:00";
pub const DEFAULT_END_DATE: &str = "2100-01-01T00:00:00+00:00";

/// Invalid bounds supplied by flags or the config file.
#[derive(Debug, thiserror::Error)]
pub enum BoundsError {
    #[error("{what}: minimum {min} is greater than maximum {max}")]
    InvertedRange { what: &'static str, min: i64, max: i64 },

    #[error("invalid {what} '{value}': {source}")]
    InvalidDate {
        what: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("start date {start} is after end date {end}")]
    InvertedDates { start: String, end: String },
}

/// Inclusive integer range for `int` descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl Default for IntRange {
    fn default() -> Self {
        Self { min: 0, max: 10 }
    }
}

/// Inclusive length range for strings and arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: u32,
    pub max: u32,
}

impl Default for LengthRange {
    fn default() -> Self {
        Self { min: 0, max: 10 }
    }
}

/// RFC 3339 date range for `date` descriptors.
///
/// The strings are emitted verbatim, so whatever offset format the operator
/// chose is preserved in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_DATE.to_string(),
            end: DEFAULT_END_DATE.to_string(),
        }
    }
}

impl DateRange {
    pub fn validate(&self) -> Result<(), BoundsError> {
        let start = parse_date("start date", &self.start)?;
        let end = parse_date("end date", &self.end)?;
        if start > end {
            return Err(BoundsError::InvertedDates {
                start: self.start.clone(),
                end: self.end.clone(),
            });
        }
        Ok(())
    }
}

fn parse_date(
    what: &'static str,
    value: &str,
) -> Result<chrono::DateTime<chrono::FixedOffset>, BoundsError> {
    chrono::DateTime::parse_from_rfc3339(value).map_err(|source| BoundsError::InvalidDate {
        what,
        value: value.to_string(),
        source,
    })
}

/// Ranges used when emitting bounded descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationBounds {
    pub int: IntRange,
    pub string: LengthRange,
    pub array: LengthRange,
    pub dates: DateRange,
}

impl GenerationBounds {
    pub fn validate(&self) -> Result<(), BoundsError> {
        check_order("integer range", self.int.min, self.int.max)?;
        check_order(
            "string length",
            i64::from(self.string.min),
            i64::from(self.string.max),
        )?;
        check_order(
            "array length",
            i64::from(self.array.min),
            i64::from(self.array.max),
        )?;
        self.dates.validate()
    }
}

fn check_order(what: &'static str, min: i64, max: i64) -> Result<(), BoundsError> {
    if min > max {
        return Err(BoundsError::InvertedRange { what, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        GenerationBounds::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_range() {
        let bounds = GenerationBounds {
            string: LengthRange { min: 8, max: 2 },
            ..Default::default()
        };
        let err = bounds.validate().unwrap_err();
        assert!(matches!(
            err,
            BoundsError::InvertedRange {
                what: "string length",
                min: 8,
                max: 2
            }
        ));
    }

    #[test]
    fn test_invalid_and_inverted_dates() {
        let bad = DateRange {
            start: "yesterday".to_string(),
            end: DEFAULT_END_DATE.to_string(),
        };
        assert!(matches!(
            bad.validate().unwrap_err(),
            BoundsError::InvalidDate { what: "start date", .. }
        ));

        let inverted = DateRange {
            start: DEFAULT_END_DATE.to_string(),
            end: DEFAULT_START_DATE.to_string(),
        };
        assert!(matches!(
            inverted.validate().unwrap_err(),
            BoundsError::InvertedDates { .. }
        ));
    }
}
