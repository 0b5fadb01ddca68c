use crate::cell::RawCell;
use crate::error::ImportError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static MSISDN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^03\d{9}$").expect("static MSISDN pattern compiles"));

/// Mobile number in national `03XXXXXXXXX` form. Only produced by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Msisdn(String);

impl Msisdn {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Msisdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Msisdn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Msisdn> for String {
    fn from(value: Msisdn) -> Self {
        value.0
    }
}

impl FromStr for Msisdn {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_str(s).ok_or_else(|| ImportError::InvalidNumber(s.to_string()))
    }
}

/// Normalizes one raw cell into a canonical number.
///
/// Non-digits are stripped after trimming; a ten digit value starting with
/// `3` gets its dropped trunk zero back. Anything that does not end up as
/// `^03\d{9}$` is rejected.
pub fn normalize(raw: &RawCell) -> Option<Msisdn> {
    if raw.is_empty() {
        return None;
    }
    normalize_str(&raw.to_string())
}

pub fn normalize_str(raw: &str) -> Option<Msisdn> {
    let mut digits: String = raw.trim().chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 10 && digits.starts_with('3') {
        digits.insert(0, '0');
    }

    if MSISDN_PATTERN.is_match(&digits) {
        Some(Msisdn(digits))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(value: &str) -> Option<String> {
        normalize(&RawCell::from(value)).map(Msisdn::into_string)
    }

    #[test]
    fn test_restores_trunk_zero() {
        assert_eq!(norm("3001234567"), Some("03001234567".to_string()));
    }

    #[test]
    fn test_strips_separators() {
        assert_eq!(norm("0300-123-4567"), Some("03001234567".to_string()));
        assert_eq!(norm("  0300 123 4567 "), Some("03001234567".to_string()));
        assert_eq!(norm("(0300) 1234567"), Some("03001234567".to_string()));
    }

    #[test]
    fn test_rejects_wrong_prefix_or_length() {
        assert_eq!(norm("021345678"), None);
        assert_eq!(norm("02134567890"), None);
        assert_eq!(norm("030012345678"), None);
        assert_eq!(norm("abc"), None);
        assert_eq!(norm(""), None);
    }

    #[test]
    fn test_country_code_is_not_rewritten() {
        assert_eq!(norm("+92 300 1234567"), None);
    }

    #[test]
    fn test_empty_cell_is_rejected() {
        assert_eq!(normalize(&RawCell::Empty), None);
    }

    #[test]
    fn test_numeric_cells() {
        let n = normalize(&RawCell::Number(3001234567.0)).unwrap();
        assert_eq!(n.as_str(), "03001234567");
        assert_eq!(normalize(&RawCell::Number(3.5)), None);
        assert_eq!(normalize(&RawCell::Number(f64::NAN)), None);
    }

    #[test]
    fn test_idempotent_on_canonical_input() {
        for raw in ["3001234567", "0300-123-4567", "0345 9876543", "03111111111"] {
            let once = normalize(&RawCell::from(raw)).unwrap();
            let twice = normalize(&RawCell::from(once.as_str())).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_from_str() {
        let parsed: Msisdn = "0300 1234567".parse().unwrap();
        assert_eq!(parsed.to_string(), "03001234567");
        assert!("12345".parse::<Msisdn>().is_err());
    }
}
