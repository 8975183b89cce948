use serde::{Deserialize, Serialize};
use std::fmt;

/// Five ASCII digits. Construction is the only place ZIP shape is checked, so the resolver
/// can stay total over anything it receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    /// Accepts exactly five digits and nothing else.
    pub fn parse(value: &str) -> Result<Self, ZipCodeError> {
        if value.len() == 5 && value.bytes().all(|byte| byte.is_ascii_digit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(ZipCodeError::Malformed {
                value: value.to_string(),
            })
        }
    }

    /// Lenient form used at the HTTP edge: drops every non-digit, keeps the first five
    /// digits, and rejects anything shorter (`"60601-1234"` becomes `"60601"`).
    pub fn sanitize(raw: &str) -> Result<Self, ZipCodeError> {
        let digits: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_digit())
            .take(5)
            .collect();

        if digits.len() < 5 {
            return Err(ZipCodeError::TooShort {
                digits: digits.len(),
            });
        }

        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Three-digit sectional center prefix.
    pub fn prefix(&self) -> &str {
        &self.0[..3]
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZipCodeError {
    #[error("Valid 5-digit ZIP code required")]
    TooShort { digits: usize },
    #[error("'{value}' is not a 5-digit ZIP code")]
    Malformed { value: String },
}

/// Two-letter USPS state or district code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateCode(pub String);

impl StateCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Alcohol sub-types that carry retail-percentage excise overlays. Tobacco is absent on
/// purpose: its excise is already in the wholesale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquorCategory {
    Spirits,
    Wine,
    Beer,
}

impl LiquorCategory {
    pub const fn ordered() -> [Self; 3] {
        [Self::Spirits, Self::Wine, Self::Beer]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Spirits => "spirits",
            Self::Wine => "wine",
            Self::Beer => "beer",
        }
    }
}

/// Level of government an overlay belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionLayer {
    State,
    County,
    City,
}

impl JurisdictionLayer {
    pub const fn label(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::County => "county",
            Self::City => "city",
        }
    }
}

/// Half-up rounding for non-negative percentages. Only applied when a value leaves the
/// engine; composition works on unrounded figures.
pub fn round_rate(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_requires_exactly_five_digits() {
        assert_eq!(ZipCode::parse("60601").expect("valid").as_str(), "60601");
        assert!(ZipCode::parse("6060").is_err());
        assert!(ZipCode::parse("606011").is_err());
        assert!(ZipCode::parse("6060a").is_err());
        assert!(ZipCode::parse(" 6060").is_err());
    }

    #[test]
    fn sanitize_strips_noise_and_truncates() {
        assert_eq!(
            ZipCode::sanitize("60601-1234").expect("zip+4").as_str(),
            "60601"
        );
        assert_eq!(
            ZipCode::sanitize(" 1 0 0 0 1 ").expect("spaced").as_str(),
            "10001"
        );
        assert_eq!(
            ZipCode::sanitize("IL 60601").expect("labelled").prefix(),
            "606"
        );
    }

    #[test]
    fn sanitize_rejects_short_input() {
        assert_eq!(
            ZipCode::sanitize("60-6"),
            Err(ZipCodeError::TooShort { digits: 3 })
        );
        let error = ZipCode::sanitize("").expect_err("empty rejected");
        assert_eq!(error.to_string(), "Valid 5-digit ZIP code required");
    }

    #[test]
    fn state_codes_normalize_case() {
        assert_eq!(StateCode::new(" il ").as_str(), "IL");
    }

    #[test]
    fn rounding_is_half_up_at_requested_precision() {
        assert_eq!(round_rate(10.125, 2), 10.13);
        assert_eq!(round_rate(6.875, 3), 6.875);
        assert_eq!(round_rate(10.004, 2), 10.0);
        assert_eq!(round_rate(0.0, 2), 0.0);
    }
}
