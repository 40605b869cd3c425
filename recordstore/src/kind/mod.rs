use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Classification label carried by every stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
    String,
    Char,
    Number,
    Date,
    Error,
}

impl KindTag {
    pub const ALL: [KindTag; 5] = [
        KindTag::String,
        KindTag::Char,
        KindTag::Number,
        KindTag::Date,
        KindTag::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KindTag::String => "string",
            KindTag::Char => "char",
            KindTag::Number => "number",
            KindTag::Date => "date",
            KindTag::Error => "error",
        }
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KindTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KindTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown kind tag '{s}' (expected one of string, char, number, date, error)"))
    }
}

/// Classify a value into its kind tag.
///
/// Scalars are checked for numeric content before their length is looked at,
/// so `"7"` is a `number` and `"x"` is a `char`. Structured values (objects,
/// arrays, null) are `error` when they carry a truthy `message`, `date`
/// otherwise.
pub fn resolve_kind(value: &Value) -> KindTag {
    match value {
        Value::Number(_) | Value::Bool(_) => KindTag::Number,
        Value::String(s) => {
            if is_numeric_text(s) {
                KindTag::Number
            } else if s.encode_utf16().count() == 1 {
                KindTag::Char
            } else {
                KindTag::String
            }
        }
        Value::Object(map) => match map.get("message") {
            Some(message) if is_truthy(message) => KindTag::Error,
            _ => KindTag::Date,
        },
        Value::Array(_) | Value::Null => KindTag::Date,
    }
}

/// Whether text reads as a number under loose numeric conversion.
/// Empty text never does.
pub(crate) fn is_numeric_text(s: &str) -> bool {
    parse_numeric_text(s).is_some()
}

/// Numeric value of `s` under loose conversion: surrounding whitespace is
/// ignored and whitespace-only text is zero. Accepts signed decimals with
/// optional fraction and exponent, `Infinity` with an optional sign, and
/// unsigned `0x`/`0o`/`0b` integers. Empty text is `None`.
pub(crate) fn parse_numeric_text(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let prefixed = trimmed.get(..2).map(str::to_ascii_lowercase);
    let radix = match prefixed.as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_integer(&trimmed[2..], radix);
    }

    if is_decimal_literal(trimmed) {
        trimmed.parse::<f64>().ok()
    } else {
        None
    }
}

fn parse_radix_integer(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// `[+-] (digits [. digits*] | . digits) [(e|E) [+-] digits]`
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }
    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Loose truthiness: null, `false`, zero and empty text are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_character_is_char() {
        assert_eq!(resolve_kind(&json!("Y")), KindTag::Char);
        assert_eq!(resolve_kind(&json!("é")), KindTag::Char);
    }

    #[test]
    fn test_multi_character_and_empty_are_string() {
        assert_eq!(resolve_kind(&json!("Ann")), KindTag::String);
        assert_eq!(resolve_kind(&json!("")), KindTag::String);
        // Surrogate pair: two UTF-16 code units
        assert_eq!(resolve_kind(&json!("😀")), KindTag::String);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(resolve_kind(&json!(30)), KindTag::Number);
        assert_eq!(resolve_kind(&json!(-1.5)), KindTag::Number);
        assert_eq!(resolve_kind(&json!(true)), KindTag::Number);
    }

    #[test]
    fn test_numeric_check_runs_before_length_check() {
        assert_eq!(resolve_kind(&json!("7")), KindTag::Number);
        assert_eq!(resolve_kind(&json!(" 42 ")), KindTag::Number);
        assert_eq!(resolve_kind(&json!("NaN")), KindTag::String);

        for numeric in [
            "-1.5", "+3", ".5", "5.", "1e3", "2E-2", "Infinity", "-Infinity", "+Infinity",
            "0x1F", "0X1f", "0o7", "0b11",
        ] {
            assert_eq!(resolve_kind(&json!(numeric)), KindTag::Number, "{numeric:?}");
        }

        for text in [
            "inf", "INF", "infinity", "-inf", "nan", "-0x1F", "0x", "0b12", "1e", "e5", "1_000",
            "Inf",
        ] {
            assert_eq!(resolve_kind(&json!(text)), KindTag::String, "{text:?}");
        }
    }

    #[test]
    fn test_whitespace_only_text_is_number() {
        assert_eq!(resolve_kind(&json!(" ")), KindTag::Number);
        assert_eq!(resolve_kind(&json!("   ")), KindTag::Number);
        assert_eq!(resolve_kind(&json!("\t\n")), KindTag::Number);
        assert_eq!(parse_numeric_text("  "), Some(0.0));
        assert_eq!(parse_numeric_text(""), None);
    }

    #[test]
    fn test_parse_numeric_text_values() {
        assert_eq!(parse_numeric_text("0x1F"), Some(31.0));
        assert_eq!(parse_numeric_text("0o17"), Some(15.0));
        assert_eq!(parse_numeric_text("0b101"), Some(5.0));
        assert_eq!(parse_numeric_text(" -2.5e1 "), Some(-25.0));
        assert_eq!(parse_numeric_text("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_numeric_text("infinity"), None);
    }

    #[test]
    fn test_message_must_be_truthy() {
        for falsy in [json!(""), json!(0), json!(false), Value::Null] {
            assert_eq!(
                resolve_kind(&json!({ "message": falsy.clone() })),
                KindTag::Date,
                "{falsy}"
            );
        }
        for truthy in [json!("boom"), json!(1), json!(true), json!([]), json!({})] {
            assert_eq!(
                resolve_kind(&json!({ "message": truthy.clone() })),
                KindTag::Error,
                "{truthy}"
            );
        }
    }

    #[test]
    fn test_structured_values() {
        assert_eq!(resolve_kind(&json!({ "message": "boom" })), KindTag::Error);
        assert_eq!(
            resolve_kind(&json!({ "year": 2024, "month": 0, "day": 1 })),
            KindTag::Date
        );
        assert_eq!(resolve_kind(&Value::Null), KindTag::Date);
    }

    #[test]
    fn test_parse_and_display() {
        for tag in KindTag::ALL {
            assert_eq!(tag.to_string().parse::<KindTag>().unwrap(), tag);
        }
        assert!("boolean".parse::<KindTag>().is_err());
        assert_eq!(serde_json::to_value(KindTag::Char).unwrap(), json!("char"));
    }
}
