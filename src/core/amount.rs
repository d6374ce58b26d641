use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Something an [`Amount`] can be denominated in.
///
/// The display token size is the decimal value of one unit of quantity:
/// for a currency with two fraction digits it is `0.01`, so a quantity of
/// `150` displays as `1.50`. Tokens with no natural fraction use `1`.
pub trait Token:
    Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    fn display_token_size(&self) -> Decimal {
        Decimal::ONE
    }
}

impl Token for String {}

/// Errors arising from amount arithmetic and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount overflow: {left} + {right} exceeds the representable quantity")]
    Overflow { left: u64, right: u64 },
    #[error("amount underflow: cannot subtract {right} from {left}")]
    Underflow { left: u64, right: u64 },
    #[error("token mismatch: cannot combine {left} with {right}")]
    TokenMismatch { left: String, right: String },
    #[error("amount must not be negative, got {0}")]
    Negative(Decimal),
    #[error("{value} cannot be represented as a whole quantity of {token}")]
    Unrepresentable { value: Decimal, token: String },
    #[error("cannot sum an empty list of amounts")]
    EmptySum,
    #[error("net position of {party} exceeds the representable range")]
    PositionOverflow { party: String },
}

/// A non-negative quantity of some token.
///
/// All arithmetic is exact and checked: adding amounts of different tokens
/// or overflowing the quantity fails with an [`AmountError`] instead of
/// wrapping or saturating.
///
/// # Examples
///
/// ```
/// use netting_verifier::core::amount::Amount;
/// use netting_verifier::core::currency::CurrencyCode;
/// use rust_decimal_macros::dec;
///
/// let usd = CurrencyCode::new("USD");
/// let a = Amount::new(1_000, usd.clone());
/// let b = Amount::from_decimal(dec!(2.50), usd).unwrap();
///
/// let total = a.checked_add(&b).unwrap();
/// assert_eq!(total.quantity(), 1_250);
/// assert_eq!(total.to_decimal(), dec!(12.50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount<T> {
    quantity: u64,
    display_token_size: Decimal,
    token: T,
}

impl<T: Token> Amount<T> {
    /// Create an amount of `quantity` indivisible units of `token`.
    pub fn new(quantity: u64, token: T) -> Self {
        let display_token_size = token.display_token_size();
        Self {
            quantity,
            display_token_size,
            token,
        }
    }

    /// The zero amount of `token`.
    pub fn zero(token: T) -> Self {
        Self::new(0, token)
    }

    /// Convert a display value into a quantity, rounding half-even to the
    /// token's display size.
    pub fn from_decimal(value: Decimal, token: T) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        let size = token.display_token_size();
        let quantity = value
            .checked_div(size)
            .map(|units| units.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
            .and_then(|units| units.to_u64())
            .ok_or_else(|| AmountError::Unrepresentable {
                value,
                token: token.to_string(),
            })?;
        Ok(Self::new(quantity, token))
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn display_token_size(&self) -> Decimal {
        self.display_token_size
    }

    pub fn is_zero(&self) -> bool {
        self.quantity == 0
    }

    /// The quantity scaled by the display token size.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.display_token_size)
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, AmountError> {
        self.require_same_token(other)?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or(AmountError::Overflow {
                left: self.quantity,
                right: other.quantity,
            })?;
        Ok(Self {
            quantity,
            display_token_size: self.display_token_size,
            token: self.token.clone(),
        })
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, AmountError> {
        self.require_same_token(other)?;
        let quantity = self
            .quantity
            .checked_sub(other.quantity)
            .ok_or(AmountError::Underflow {
                left: self.quantity,
                right: other.quantity,
            })?;
        Ok(Self {
            quantity,
            display_token_size: self.display_token_size,
            token: self.token.clone(),
        })
    }

    /// Sum a non-empty sequence of amounts sharing one token.
    pub fn sum_or_error<I>(amounts: I) -> Result<Self, AmountError>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = amounts.into_iter();
        let first = iter.next().ok_or(AmountError::EmptySum)?;
        iter.try_fold(first, |acc, next| acc.checked_add(&next))
    }

    /// Sum a sequence of amounts, yielding zero of `token` when empty.
    pub fn sum_or_zero<I>(amounts: I, token: T) -> Result<Self, AmountError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(token), |acc, next| acc.checked_add(&next))
    }

    fn require_same_token(&self, other: &Self) -> Result<(), AmountError> {
        if self.token != other.token || self.display_token_size != other.display_token_size {
            return Err(AmountError::TokenMismatch {
                left: self.token.to_string(),
                right: other.token.to_string(),
            });
        }
        Ok(())
    }
}

impl<T: Token> fmt::Display for Amount<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.token)
    }
}
