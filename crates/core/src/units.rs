//! Course unit semantics: parsing, validation, and display formatting.
//!
//! Completed-course units are plain decimal values summed by the rollup
//! engine. Course-requirement units may be a single value or an inclusive
//! range; ranges are a display concern only and are never summed.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum units a single course may carry.
pub const MAX_UNITS_ALLOWED: f64 = 10.0;

/// Maximum number of fractional digits accepted on unit input.
pub const MAX_FRACTION_DIGITS: usize = 2;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an already-numeric unit value.
///
/// Units must be finite, strictly positive, and at most
/// [`MAX_UNITS_ALLOWED`]. The rollup engine assumes every course it sees
/// has passed this check at the edit boundary.
pub fn validate_units(units: f64) -> Result<(), CoreError> {
    if units.is_nan() || units.is_infinite() {
        return Err(CoreError::Validation(
            "Units must be a finite number".to_string(),
        ));
    }
    if units <= 0.0 || units > MAX_UNITS_ALLOWED {
        return Err(CoreError::Validation(format!(
            "Units must be a number between 0 and {MAX_UNITS_ALLOWED}, got {units}"
        )));
    }
    Ok(())
}

/// Parse a unit value from user input.
///
/// Accepts decimal values with at most [`MAX_FRACTION_DIGITS`] fractional
/// digits. Rejects non-numeric input before it can reach the rollup engine.
pub fn parse_units(input: &str) -> Result<f64, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Units are required".to_string()));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.is_empty() || fraction.len() > MAX_FRACTION_DIGITS {
            return Err(CoreError::Validation(format!(
                "Units may have at most {MAX_FRACTION_DIGITS} decimal places, got '{trimmed}'"
            )));
        }
    }
    let units: f64 = trimmed.parse().map_err(|_| {
        CoreError::Validation(format!("Invalid units value '{trimmed}'"))
    })?;
    validate_units(units)?;
    Ok(units)
}

/// Validate an inclusive unit range: both ends valid, upper >= lower.
pub fn validate_unit_range(lower: f64, upper: f64) -> Result<(), CoreError> {
    validate_units(lower)?;
    validate_units(upper)?;
    if upper < lower {
        return Err(CoreError::Validation(
            "Units upper range value must be greater than lower range value".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Display formatting
// ---------------------------------------------------------------------------

/// Numeric formatting rules for unit totals, passed explicitly into the
/// read-side snapshot rather than read from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct UnitFormat {
    /// Maximum fractional digits rendered; trailing zeros are trimmed.
    pub fraction_digits: usize,
}

impl Default for UnitFormat {
    fn default() -> Self {
        Self {
            fraction_digits: MAX_FRACTION_DIGITS,
        }
    }
}

impl UnitFormat {
    /// Format a unit value for display: "4", "3.5", "1.35".
    pub fn format(&self, units: f64) -> String {
        let rendered = format!("{units:.digits$}", digits = self.fraction_digits);
        if rendered.contains('.') {
            rendered
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            rendered
        }
    }
}

/// Format a unit value with the default rules.
pub fn format_units(units: f64) -> String {
    UnitFormat::default().format(units)
}

// ---------------------------------------------------------------------------
// Requirement units
// ---------------------------------------------------------------------------

/// The units a course requirement expects: a fixed value or an inclusive
/// range ("3-5"). Never summed by the rollup engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementUnits {
    Single(f64),
    Range { lower: f64, upper: f64 },
}

impl RequirementUnits {
    /// The lower end of the range, or the value itself.
    pub fn lower(&self) -> f64 {
        match self {
            Self::Single(value) => *value,
            Self::Range { lower, .. } => *lower,
        }
    }
}

impl fmt::Display for RequirementUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{}", format_units(*value)),
            Self::Range { lower, upper } => {
                write!(f, "{}-{}", format_units(*lower), format_units(*upper))
            }
        }
    }
}

impl FromStr for RequirementUnits {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((lower, upper)) = trimmed.split_once('-') {
            let lower = parse_units(lower)?;
            let upper = parse_units(upper)?;
            validate_unit_range(lower, upper)?;
            Ok(Self::Range { lower, upper })
        } else {
            parse_units(trimmed).map(Self::Single)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- validate_units ------------------------------------------------------

    #[test]
    fn accepts_whole_and_fractional_units() {
        assert!(validate_units(1.0).is_ok());
        assert!(validate_units(3.5).is_ok());
        assert!(validate_units(MAX_UNITS_ALLOWED).is_ok());
    }

    #[test]
    fn rejects_zero_and_negative_units() {
        assert!(validate_units(0.0).is_err());
        assert!(validate_units(-2.0).is_err());
    }

    #[test]
    fn rejects_units_above_maximum() {
        assert!(validate_units(10.5).is_err());
    }

    #[test]
    fn rejects_nan_and_infinity() {
        assert!(validate_units(f64::NAN).is_err());
        assert!(validate_units(f64::INFINITY).is_err());
    }

    // -- parse_units ---------------------------------------------------------

    #[test]
    fn parses_valid_input() {
        assert_eq!(parse_units("4").unwrap(), 4.0);
        assert_eq!(parse_units(" 3.5 ").unwrap(), 3.5);
        assert_eq!(parse_units("1.35").unwrap(), 1.35);
    }

    #[test]
    fn rejects_empty_input() {
        assert_matches!(parse_units(""), Err(CoreError::Validation(_)));
        assert_matches!(parse_units("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_matches!(parse_units("four"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_too_many_decimal_places() {
        assert_matches!(parse_units("1.234"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_trailing_decimal_point() {
        assert!(parse_units("4.").is_err());
    }

    // -- validate_unit_range -------------------------------------------------

    #[test]
    fn accepts_ordered_range() {
        assert!(validate_unit_range(3.0, 5.0).is_ok());
        assert!(validate_unit_range(4.0, 4.0).is_ok());
    }

    #[test]
    fn rejects_inverted_range() {
        let err = validate_unit_range(5.0, 3.0).unwrap_err();
        assert!(err.to_string().contains("upper range"));
    }

    // -- formatting ----------------------------------------------------------

    #[test]
    fn formats_whole_units_without_fraction() {
        assert_eq!(format_units(4.0), "4");
    }

    #[test]
    fn formats_fractional_units_trimmed() {
        assert_eq!(format_units(3.5), "3.5");
        assert_eq!(format_units(1.35), "1.35");
        assert_eq!(format_units(2.50), "2.5");
    }

    #[test]
    fn format_rounds_to_configured_digits() {
        let fmt = UnitFormat { fraction_digits: 1 };
        assert_eq!(fmt.format(3.25), "3.2");
        assert_eq!(fmt.format(4.0), "4");
    }

    // -- RequirementUnits ----------------------------------------------------

    #[test]
    fn parses_single_requirement_units() {
        assert_eq!(
            "4".parse::<RequirementUnits>().unwrap(),
            RequirementUnits::Single(4.0)
        );
    }

    #[test]
    fn parses_requirement_unit_range() {
        assert_eq!(
            "3-5".parse::<RequirementUnits>().unwrap(),
            RequirementUnits::Range {
                lower: 3.0,
                upper: 5.0
            }
        );
    }

    #[test]
    fn rejects_inverted_requirement_range() {
        assert!("5-3".parse::<RequirementUnits>().is_err());
    }

    #[test]
    fn displays_requirement_units() {
        assert_eq!(RequirementUnits::Single(4.0).to_string(), "4");
        assert_eq!(
            RequirementUnits::Range {
                lower: 2.5,
                upper: 4.0
            }
            .to_string(),
            "2.5-4"
        );
    }
}
