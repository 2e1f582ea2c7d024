//! Environment variable parsing helpers shared by the pool and service configs.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an environment variable, returning `None` if missing or invalid.
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Read a boolean flag. Accepts `true/false`, `1/0`, `yes/no` (any case).
pub fn parse_env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
