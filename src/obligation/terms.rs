use crate::core::amount::Token;
use crate::core::issued::Issued;
use crate::error::VerificationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

fn default_time_tolerance() -> u64 {
    30
}

/// The contract template of an obligation: what is owed and by when.
///
/// Terms say nothing about how much is owed or to whom; those live on the
/// [`ObligationState`]. Two obligations can only ever be netted together
/// when their terms are equal.
///
/// [`ObligationState`]: crate::obligation::state::ObligationState
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Token + serde::Deserialize<'de>"))]
pub struct Terms<P> {
    /// Hashes of the contract code that may be used to settle.
    acceptable_contracts: BTreeSet<String>,
    /// Issued products accepted in settlement.
    acceptable_issued_products: BTreeSet<Issued<P>>,
    /// The obligation may be marked defaulted once this has passed.
    due_before: DateTime<Utc>,
    /// Allowed clock skew when comparing against `due_before`.
    #[serde(default = "default_time_tolerance")]
    time_tolerance_secs: u64,
}

impl<P: Token> Terms<P> {
    /// Create terms. Both acceptance sets must be non-empty.
    pub fn new(
        acceptable_contracts: impl IntoIterator<Item = String>,
        acceptable_issued_products: impl IntoIterator<Item = Issued<P>>,
        due_before: DateTime<Utc>,
    ) -> Result<Self, VerificationError> {
        let acceptable_contracts: BTreeSet<String> = acceptable_contracts.into_iter().collect();
        let acceptable_issued_products: BTreeSet<Issued<P>> =
            acceptable_issued_products.into_iter().collect();

        if acceptable_contracts.is_empty() {
            return Err(VerificationError::Structural {
                context: "Terms".to_string(),
                reason: "at least one acceptable contract is required".to_string(),
            });
        }
        if acceptable_issued_products.is_empty() {
            return Err(VerificationError::Structural {
                context: "Terms".to_string(),
                reason: "at least one acceptable issued product is required".to_string(),
            });
        }

        Ok(Self {
            acceptable_contracts,
            acceptable_issued_products,
            due_before,
            time_tolerance_secs: default_time_tolerance(),
        })
    }

    pub fn with_time_tolerance(mut self, seconds: u64) -> Self {
        self.time_tolerance_secs = seconds;
        self
    }

    pub fn acceptable_contracts(&self) -> &BTreeSet<String> {
        &self.acceptable_contracts
    }

    pub fn acceptable_issued_products(&self) -> &BTreeSet<Issued<P>> {
        &self.acceptable_issued_products
    }

    pub fn due_before(&self) -> DateTime<Utc> {
        self.due_before
    }

    pub fn time_tolerance_secs(&self) -> u64 {
        self.time_tolerance_secs
    }

    /// The product owed, if every acceptable issued product agrees on it.
    pub fn product(&self) -> Option<&P> {
        let mut products = self.acceptable_issued_products.iter().map(|i| &i.product);
        let first = products.next()?;
        products.all(|p| p == first).then_some(first)
    }
}

impl<P: Token> Token for Terms<P> {
    fn display_token_size(&self) -> Decimal {
        self.product()
            .map(|product| product.display_token_size())
            .unwrap_or(Decimal::ONE)
    }
}

impl<P: Token> fmt::Display for Terms<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.product() {
            Some(product) => write!(f, "{}", product)?,
            None => write!(f, "mixed products")?,
        }
        write!(f, " due before {}", self.due_before.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}
