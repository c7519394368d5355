use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// Country calling code assumed for numbers entered without one
pub const DEFAULT_COUNTRY_CODE: &str = "55";

/// A guest phone number in international format (`+<country><number>`).
///
/// Normalization is a best-effort prefix rewrite, not validation: anything the
/// guest typed survives as digits and is left for the SMS gateway to reject.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Rewrite a raw phone number into international format using `country_code`
    /// when the input does not carry one
    pub fn normalize(raw: &str, country_code: &str) -> Self {
        lazy_static::lazy_static! {
            static ref NON_DIGITS: Regex = Regex::new(r"[^0-9]").unwrap();
        }

        let raw = raw.trim_start();
        let digits = NON_DIGITS.replace_all(raw, "");

        let value = if raw.starts_with('+') || digits.starts_with(country_code) {
            format!("+{}", digits)
        } else if let Some(national) = digits.strip_prefix('0') {
            // Trunk prefix
            format!("+{}{}", country_code, national)
        } else {
            format!("+{}{}", country_code, digits)
        };

        Self(value)
    }
}

impl FromStr for PhoneNumber {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !value.chars().any(|c| c.is_ascii_digit()) {
            return Err("Phone number cannot be empty".into());
        }
        Ok(Self::normalize(value, DEFAULT_COUNTRY_CODE))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
