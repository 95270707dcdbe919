//! Poll interval parsing for the command line

use std::time::Duration;

/// Interval used when the operator gives an empty value
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Parse an interval such as `30`, `30m`, `4h` or `1w`.
///
/// A bare number is seconds; anything else goes through humantime and must
/// come out as a whole number of seconds.
pub fn parse_interval(input: &str) -> crate::Result<Duration> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Ok(DEFAULT_INTERVAL);
    }

    let interval = match input.parse::<i64>() {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds as u64),
        Ok(_) => {
            return Err(crate::PageWatchError::Config(
                "Interval must be a positive number of seconds".to_string(),
            ))
        }
        Err(_) => humantime::parse_duration(&input).map_err(|e| {
            crate::PageWatchError::Config(format!("Invalid interval '{}': {}", input, e))
        })?,
    };

    if interval.is_zero() {
        return Err(crate::PageWatchError::Config(
            "Interval must be positive".to_string(),
        ));
    }
    if interval.subsec_nanos() != 0 {
        return Err(crate::PageWatchError::Config(format!(
            "Interval '{}' must be a whole number of seconds",
            input
        )));
    }
    Ok(interval)
}
