//! Duration codec.
//!
//! # Responsibility
//! - Parse `H:MM:SS` input into seconds.
//! - Format absolute offsets as `第 {day} 天 HH:MM:SS`.
//!
//! # Invariants
//! - Parsing never range-checks minutes/seconds; `0:90:00` is 5400 seconds.
//! - `format_absolute_time` is total over `u64`.

use std::error::Error;
use std::fmt::{Display, Formatter};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const CLOCK_COMPONENTS: usize = 3;

/// Malformed duration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationFormatError {
    /// Input carries a `-` anywhere.
    NegativeSign(String),
    /// Splitting on `:` did not yield exactly three parts.
    ComponentCount { input: String, found: usize },
    /// One part is not a plain decimal number.
    InvalidComponent { input: String, component: String },
    /// Total does not fit into `u64` seconds.
    Overflow(String),
}

impl Display for DurationFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeSign(input) => {
                write!(f, "duration must not be negative: `{input}`")
            }
            Self::ComponentCount { input, found } => write!(
                f,
                "duration must look like H:MM:SS, got {found} component(s) in `{input}`"
            ),
            Self::InvalidComponent { input, component } => write!(
                f,
                "duration component `{component}` is not a number in `{input}`"
            ),
            Self::Overflow(input) => write!(f, "duration is too large: `{input}`"),
        }
    }
}

impl Error for DurationFormatError {}

/// Parses `H:MM:SS` into a count of seconds.
///
/// # Errors
/// - `NegativeSign` when the input contains `-`.
/// - `ComponentCount` when there are not exactly three `:`-separated parts.
/// - `InvalidComponent` when a part is empty or has non-digit characters.
/// - `Overflow` when the total exceeds `u64::MAX`.
pub fn parse_duration(input: &str) -> Result<u64, DurationFormatError> {
    let trimmed = input.trim();
    if trimmed.contains('-') {
        return Err(DurationFormatError::NegativeSign(trimmed.to_string()));
    }

    let components = trimmed.split(':').collect::<Vec<_>>();
    if components.len() != CLOCK_COMPONENTS {
        return Err(DurationFormatError::ComponentCount {
            input: trimmed.to_string(),
            found: components.len(),
        });
    }

    let mut total: u64 = 0;
    let mut unit: u64 = 1;
    for component in components.iter().rev() {
        let value = parse_component(trimmed, component)?;
        total = value
            .checked_mul(unit)
            .and_then(|scaled| total.checked_add(scaled))
            .ok_or_else(|| DurationFormatError::Overflow(trimmed.to_string()))?;
        unit *= SECONDS_PER_MINUTE;
    }

    Ok(total)
}

/// Formats an absolute offset as `第 {day} 天 HH:MM:SS`.
///
/// `day` is 1-indexed; hours wrap at 24.
pub fn format_absolute_time(seconds: u64) -> String {
    let day = seconds / SECONDS_PER_DAY + 1;
    let remainder = seconds % SECONDS_PER_DAY;
    format!("第 {day} 天 {}", format_clock(remainder))
}

/// Formats a relative duration as `HH:MM:SS` without day rollover.
///
/// Output parses back to the same value through `parse_duration`.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

fn parse_component(input: &str, component: &str) -> Result<u64, DurationFormatError> {
    let invalid = || DurationFormatError::InvalidComponent {
        input: input.to_string(),
        component: component.to_string(),
    };

    if component.is_empty() || !component.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    component
        .parse::<u64>()
        .map_err(|_| DurationFormatError::Overflow(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_component, DurationFormatError};

    #[test]
    fn parse_component_rejects_sign_prefix() {
        let err = parse_component("+1:00:00", "+1").unwrap_err();
        assert!(matches!(err, DurationFormatError::InvalidComponent { .. }));
    }

    #[test]
    fn parse_component_accepts_leading_zeros() {
        assert_eq!(parse_component("007:00:00", "007").unwrap(), 7);
    }
}
