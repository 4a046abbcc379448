//! Journal settings stored as string key/value pairs.

/// Settings key holding the user's starting capital baseline.
pub const BASE_CAPITAL_KEY: &str = "base_capital";

/// Default base capital when the setting is absent or malformed.
pub const DEFAULT_BASE_CAPITAL: f64 = 21_000.0;

/// Total parse of the string-encoded base capital. Missing or unparsable
/// values fall back to the default rather than erroring.
pub fn parse_base_capital(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_BASE_CAPITAL)
}
