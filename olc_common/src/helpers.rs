use std::time::Duration;

use thiserror::Error;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid duration in milliseconds: {0}")]
pub struct DurationParseError(String);

/// Parse a whole number of milliseconds (e.g. `"1500"`) into a [`Duration`]. Zero is a valid value.
pub fn parse_millis(value: &str) -> Result<Duration, DurationParseError> {
    value.trim().parse::<u64>().map(Duration::from_millis).map_err(|e| DurationParseError(format!("{value}: {e}")))
}
