use crate::core::amount::Token;
use crate::core::party::PartyAndReference;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A product together with the party (and issuance reference) that issued it.
///
/// Two issuances of the same product by different issuers are distinct
/// tokens and can never be summed together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Issued<P> {
    pub issuer: PartyAndReference,
    pub product: P,
}

impl<P> Issued<P> {
    pub fn new(issuer: PartyAndReference, product: P) -> Self {
        Self { issuer, product }
    }
}

impl<P: Token> Token for Issued<P> {
    fn display_token_size(&self) -> Decimal {
        self.product.display_token_size()
    }
}

impl<P: fmt::Display> fmt::Display for Issued<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issued by {}", self.product, self.issuer)
    }
}
