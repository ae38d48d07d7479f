mod helpers;
mod secret;

pub use helpers::{parse_boolean_flag, parse_millis, DurationParseError};
pub use secret::Secret;
