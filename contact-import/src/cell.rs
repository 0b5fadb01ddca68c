use std::fmt;

/// One untrusted value taken from an uploaded table or a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// Maps a JSON value the way a spreadsheet cell would arrive. Values that
    /// cannot be a phone number keep their JSON rendering and fail later.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawCell::Empty,
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => RawCell::Number(f),
                None => RawCell::Text(n.to_string()),
            },
            serde_json::Value::String(s) => RawCell::Text(s.clone()),
            other => RawCell::Text(other.to_string()),
        }
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Empty => Ok(()),
            // Integral values print without a fractional part, so 3001234567.0
            // renders as the digits a spreadsheet would show.
            RawCell::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 => {
                write!(f, "{:.0}", n)
            }
            RawCell::Number(n) => write!(f, "{}", n),
            RawCell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        RawCell::Number(value as f64)
    }
}

impl<T: Into<RawCell>> From<Option<T>> for RawCell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawCell::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_variants() {
        assert_eq!(RawCell::from_json(&json!(null)), RawCell::Empty);
        assert_eq!(RawCell::from_json(&json!(3001234567u64)), RawCell::Number(3001234567.0));
        assert_eq!(RawCell::from_json(&json!("0300")), RawCell::Text("0300".to_string()));
        assert_eq!(RawCell::from_json(&json!(true)), RawCell::Text("true".to_string()));
    }

    #[test]
    fn test_integral_numbers_render_without_fraction() {
        assert_eq!(RawCell::Number(3001234567.0).to_string(), "3001234567");
        assert_eq!(RawCell::Number(12.5).to_string(), "12.5");
        assert_eq!(RawCell::Empty.to_string(), "");
    }

    #[test]
    fn test_option_conversion() {
        let missing: Option<&str> = None;
        assert_eq!(RawCell::from(missing), RawCell::Empty);
        assert_eq!(RawCell::from(Some("x")), RawCell::Text("x".to_string()));
    }
}
