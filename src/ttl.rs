//! Duration literals for token lifetimes ("15m", "1h", "7d", "2 weeks").
//!
//! A bare number is seconds. Units are case-insensitive and may be separated
//! from the number by whitespace.

use std::time::Duration;

use crate::error::ConfigError;

const SECOND: u64 = 1;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
// 365.25 days
const YEAR: u64 = 31_557_600;

/// Parse a lifetime literal into a non-zero [`Duration`].
///
/// Millisecond values are kept as-is here; token expiry works in whole
/// seconds and rounds them up (see [`whole_seconds`]).
pub fn parse_ttl(literal: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(literal.to_string());

    let trimmed = literal.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    let unit = unit.trim_start().to_ascii_lowercase();
    let duration = match unit.as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Duration::from_millis(value),
        _ => {
            let scale = unit_seconds(&unit).ok_or_else(invalid)?;
            Duration::from_secs(value.checked_mul(scale).ok_or_else(invalid)?)
        }
    };

    if duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    let scale = match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return None,
    };
    Some(scale)
}

/// Lifetime in whole seconds, rounding any sub-second remainder up.
pub fn whole_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 { secs + 1 } else { secs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_literals() {
        assert_eq!(parse_ttl("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_ttl("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_ttl("2w").unwrap(), Duration::from_secs(14 * 86_400));
    }

    #[test]
    fn test_bare_number_is_seconds() {
        assert_eq!(parse_ttl("3600").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_long_forms_and_spacing() {
        assert_eq!(parse_ttl("2 days").unwrap(), Duration::from_secs(2 * 86_400));
        assert_eq!(parse_ttl(" 1 Hour ").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_ttl("1y").unwrap(), Duration::from_secs(YEAR));
    }

    #[test]
    fn test_milliseconds_round_up() {
        let ttl = parse_ttl("1500ms").unwrap();
        assert_eq!(ttl, Duration::from_millis(1500));
        assert_eq!(whole_seconds(ttl), 2);
        assert_eq!(whole_seconds(Duration::from_secs(60)), 60);
    }

    #[test]
    fn test_rejects_bad_literals() {
        for bad in ["", "h", "1 fortnight", "-1h", "0s", "1.5h", "99999999999999999999y"] {
            assert!(
                matches!(parse_ttl(bad), Err(ConfigError::InvalidDuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
