//! Time string parsing and formatting
//!
//! Durations are whole seconds. User input follows the grammar
//! `(INT 'h')? (INT 'm')? (INT 's')? | INT`, case-insensitive with
//! whitespace ignored, e.g. `"4m"`, `"2m30s"`, `"1h 30m"` or `"90"`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TimeParseError;

static HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)h").expect("valid hours pattern"));
static MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)m").expect("valid minutes pattern"));
static SECONDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)s").expect("valid seconds pattern"));

/// A duration as written in settings: either a bare number of seconds or a
/// time string such as `"6m55s"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    /// Plain number of seconds (fractions are truncated)
    Seconds(f64),
    /// Time string in the `1h30m15s` grammar
    Text(String),
}

impl TimeSpec {
    /// Resolve to whole seconds
    pub fn seconds(&self) -> Result<u64, TimeParseError> {
        match self {
            TimeSpec::Seconds(value) => seconds_from_number(*value),
            TimeSpec::Text(text) => parse_time_string(text),
        }
    }
}

impl From<&str> for TimeSpec {
    fn from(value: &str) -> Self {
        TimeSpec::Text(value.to_string())
    }
}

impl From<u64> for TimeSpec {
    fn from(value: u64) -> Self {
        TimeSpec::Seconds(value as f64)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Seconds(value) => write!(f, "{}s", value.trunc()),
            TimeSpec::Text(text) => f.write_str(text),
        }
    }
}

/// Truncate a numeric duration to whole seconds
pub fn seconds_from_number(value: f64) -> Result<u64, TimeParseError> {
    if !value.is_finite() {
        return Err(TimeParseError::InvalidFormat(value.to_string()));
    }
    if value < 0.0 {
        return Err(TimeParseError::Negative(value));
    }
    if value >= u64::MAX as f64 {
        return Err(TimeParseError::Overflow(value.to_string()));
    }
    Ok(value.trunc() as u64)
}

/// Parse a user-friendly time string into seconds
///
/// Each of the `h`, `m` and `s` components is optional and they are summed.
/// When no component is present the whole string must be a bare integer.
///
/// # Examples
///
/// ```
/// use spoken_countdown::time::parse_time_string;
///
/// assert_eq!(parse_time_string("2m30s").unwrap(), 150);
/// assert_eq!(parse_time_string("1h30m").unwrap(), 5400);
/// assert_eq!(parse_time_string(" 45 ").unwrap(), 45);
/// assert!(parse_time_string("soon").is_err());
/// ```
pub fn parse_time_string(input: &str) -> Result<u64, TimeParseError> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let mut matched = false;
    let mut total: u64 = 0;

    for (pattern, unit) in [(&*HOURS, 3600u64), (&*MINUTES, 60), (&*SECONDS, 1)] {
        if let Some(captures) = pattern.captures(&normalized) {
            matched = true;
            let value: u64 = captures[1]
                .parse()
                .map_err(|_| TimeParseError::Overflow(input.to_string()))?;
            total = value
                .checked_mul(unit)
                .and_then(|part| total.checked_add(part))
                .ok_or_else(|| TimeParseError::Overflow(input.to_string()))?;
        }
    }

    if matched {
        return Ok(total);
    }

    normalized
        .parse::<u64>()
        .map_err(|_| TimeParseError::InvalidFormat(input.to_string()))
}

/// Format seconds as zero-padded `MM:SS`
///
/// Minutes are not wrapped at 60 and fractional input is truncated.
pub fn format_time(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

fn plural(count: u64, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Format seconds as a spoken phrase, e.g. `"2 minutes 5 seconds remaining"`
pub fn format_time_announcement(seconds: u64) -> String {
    if seconds >= 60 {
        let minutes = seconds / 60;
        let leftover = seconds % 60;
        let minute_word = plural(minutes, "minute", "minutes");
        if leftover == 0 {
            format!("{minutes} {minute_word} remaining")
        } else {
            let second_word = plural(leftover, "second", "seconds");
            format!("{minutes} {minute_word} {leftover} {second_word} remaining")
        }
    } else {
        format!(
            "{seconds} {} remaining",
            plural(seconds, "second", "seconds")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        assert_eq!(parse_time_string("4m").unwrap(), 240);
        assert_eq!(parse_time_string("30s").unwrap(), 30);
        assert_eq!(parse_time_string("2m30s").unwrap(), 150);
        assert_eq!(parse_time_string("1h30m").unwrap(), 5400);
        assert_eq!(parse_time_string("1h2m3s").unwrap(), 3723);
        assert_eq!(parse_time_string("6m55s").unwrap(), 415);
    }

    #[test]
    fn test_parse_is_case_and_space_insensitive() {
        assert_eq!(parse_time_string(" 2M 30S ").unwrap(), 150);
        assert_eq!(parse_time_string("1H").unwrap(), 3600);
    }

    #[test]
    fn test_parse_components_in_any_order() {
        assert_eq!(parse_time_string("30s2m").unwrap(), 150);
    }

    #[test]
    fn test_parse_bare_integer() {
        assert_eq!(parse_time_string("90").unwrap(), 90);
        assert_eq!(parse_time_string("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_zero_component() {
        assert_eq!(parse_time_string("0s").unwrap(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_time_string("soon"),
            Err(TimeParseError::InvalidFormat(_))
        ));
        assert!(parse_time_string("").is_err());
        assert!(parse_time_string("-5").is_err());
    }

    #[test]
    fn test_parse_overflow() {
        assert!(matches!(
            parse_time_string("99999999999999999999h"),
            Err(TimeParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_time_spec_numbers_truncate() {
        assert_eq!(TimeSpec::Seconds(12.9).seconds().unwrap(), 12);
        assert!(TimeSpec::Seconds(-1.0).seconds().is_err());
        assert_eq!(TimeSpec::from("1m").seconds().unwrap(), 60);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(150.0), "02:30");
        assert_eq!(format_time(59.99), "00:59");
        assert_eq!(format_time(3725.0), "62:05");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[test]
    fn test_format_time_announcement() {
        assert_eq!(format_time_announcement(1), "1 second remaining");
        assert_eq!(format_time_announcement(30), "30 seconds remaining");
        assert_eq!(format_time_announcement(60), "1 minute remaining");
        assert_eq!(format_time_announcement(61), "1 minute 1 second remaining");
        assert_eq!(format_time_announcement(75), "1 minute 15 seconds remaining");
        assert_eq!(format_time_announcement(120), "2 minutes remaining");
        assert_eq!(format_time_announcement(0), "0 seconds remaining");
    }
}
