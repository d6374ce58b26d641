use crate::core::amount::Token;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 4217-style currency code.
///
/// Used as the product of obligation terms: an obligation is a promise to
/// deliver a quantity of some issued currency.
///
/// # Examples
///
/// ```
/// use netting_verifier::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let gbp = CurrencyCode::new("GBP");
/// assert_ne!(usd, gbp);
/// assert_eq!(usd.fraction_digits(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of minor-unit digits for the currency.
    pub fn fraction_digits(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "CLP" | "ISK" | "VND" => 0,
            "BHD" | "KWD" | "OMR" | "JOD" | "TND" => 3,
            _ => 2,
        }
    }
}

impl Token for CurrencyCode {
    fn display_token_size(&self) -> Decimal {
        Decimal::new(1, self.fraction_digits())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
