//! Environment variable parsing utilities.
//!
//! Every helper takes a [`Lookup`] instead of reading `std::env` directly so
//! configuration can be loaded from a fixed map in tests.

use std::str::FromStr;

use super::ConfigError;

/// Variable source: returns the raw value for a key, if set.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads from the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get variable with default value.
pub fn var_or(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Get optional variable (None if empty or missing).
pub fn var_opt(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse variable as boolean.
/// Treats "1", "true", "yes", "on" (case-insensitive) as true and
/// "0", "false", "no", "off" as false.
pub fn var_bool(lookup: Lookup<'_>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match var_opt(lookup, key) {
        None => Ok(default),
        Some(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Parse {
                key: key.into(),
                value: v,
                error: "expected a boolean".into(),
            }),
        },
    }
}

/// Parse variable with type conversion.
pub fn var_parse<T: FromStr>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match var_opt(lookup, key) {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.into(),
            value: v,
            error: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a port value. "off" or an empty value disables the listener.
pub fn parse_port(key: &str, value: &str) -> Result<Option<u16>, ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("off") {
        return Ok(None);
    }

    let port: i64 = value.parse().map_err(|e| ConfigError::Parse {
        key: key.into(),
        value: value.into(),
        error: format!("{}", e),
    })?;

    if !(0..=65535).contains(&port) {
        return Err(ConfigError::Invalid {
            key: key.into(),
            message: "port number must be between 0 and 65535".into(),
        });
    }

    Ok(Some(port as u16))
}

/// Parse variable as a port, using `default` when unset.
pub fn var_port(lookup: Lookup<'_>, key: &str, default: &str) -> Result<Option<u16>, ConfigError> {
    parse_port(key, &var_or(lookup, key, default))
}

/// Parse a comma-separated list, skipping empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
