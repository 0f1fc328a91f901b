use once_cell::sync::Lazy;
use regex::Regex;

static ME_ID_PATTERN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z_]+-[A-Za-z0-9]{16}$").unwrap());

/// True when `value` has the shape of a Dynatrace Monitored Entity ID,
/// e.g. `HOST-0123456789ABCDEF`: a type prefix, a dash, then exactly 16
/// alphanumeric characters.
pub fn is_me_id(value: &str) -> bool {
  ME_ID_PATTERN.is_match(value)
}
