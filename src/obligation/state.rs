use crate::core::amount::{Amount, Token};
use crate::core::issued::Issued;
use crate::core::party::{Party, PublicKey};
use crate::obligation::net_state::NetState;
use crate::obligation::terms::Terms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Whether an obligation is live or has been marked as defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifecycle {
    #[default]
    Normal,
    Defaulted,
}

impl Lifecycle {
    /// The lifecycle a state must currently have to be moved into `self`.
    pub fn inverse(self) -> Self {
        match self {
            Lifecycle::Normal => Lifecycle::Defaulted,
            Lifecycle::Defaulted => Lifecycle::Normal,
        }
    }
}

/// A single debt: `obligor` owes `beneficiary` `quantity` units of what
/// `template` describes.
///
/// States are immutable values. Transitions are expressed by consuming
/// states as transaction inputs and producing new ones as outputs.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use netting_verifier::core::currency::CurrencyCode;
/// use netting_verifier::core::issued::Issued;
/// use netting_verifier::core::party::{Party, PublicKey};
/// use netting_verifier::obligation::state::ObligationState;
/// use netting_verifier::obligation::terms::Terms;
///
/// let bank = Party::new("Bank", PublicKey::new("key-bank"));
/// let alice = Party::new("Alice", PublicKey::new("key-alice"));
/// let terms = Terms::new(
///     vec!["cash-v1".to_string()],
///     vec![Issued::new(bank.reference(vec![1]), CurrencyCode::new("USD"))],
///     Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
///
/// let debt = ObligationState::new(alice, terms, 100_00, PublicKey::new("key-bob"));
/// assert_eq!(debt.amount().quantity(), 100_00);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Token + serde::Deserialize<'de>"))]
pub struct ObligationState<P> {
    #[serde(default)]
    pub lifecycle: Lifecycle,
    /// The party that owes.
    pub obligor: Party,
    pub template: Terms<P>,
    /// Amount owed, in indivisible units of the template's product.
    pub quantity: u64,
    /// Key of the party that is owed.
    pub beneficiary: PublicKey,
}

impl<P: Token> ObligationState<P> {
    /// Create a live obligation.
    ///
    /// # Panics
    ///
    /// Panics if `quantity` is zero.
    pub fn new(obligor: Party, template: Terms<P>, quantity: u64, beneficiary: PublicKey) -> Self {
        assert!(quantity > 0, "Obligation quantity must be positive, got {}", quantity);
        Self {
            lifecycle: Lifecycle::Normal,
            obligor,
            template,
            quantity,
            beneficiary,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// The obligation as an issued token: issued by the obligor under these terms.
    pub fn issuance_key(&self) -> Issued<Terms<P>> {
        Issued::new(self.obligor.reference(vec![0]), self.template.clone())
    }

    /// The amount owed, denominated in [`ObligationState::issuance_key`].
    pub fn amount(&self) -> Amount<Issued<Terms<P>>> {
        Amount::new(self.quantity, self.issuance_key())
    }

    /// Grouping key for close-out netting.
    pub fn bilateral_net_state(&self) -> NetState<P> {
        NetState::Bilateral {
            party_keys: self.participants(),
            template: self.template.clone(),
        }
    }

    /// Grouping key for payment netting.
    pub fn multilateral_net_state(&self) -> NetState<P> {
        NetState::Multilateral {
            template: self.template.clone(),
        }
    }

    /// Keys of the obligor and the beneficiary.
    pub fn participants(&self) -> BTreeSet<PublicKey> {
        BTreeSet::from([self.obligor.owning_key.clone(), self.beneficiary.clone()])
    }
}

impl<P: Token> fmt::Display for ObligationState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} owes {} {} ({:?})",
            self.obligor,
            self.beneficiary,
            Amount::new(self.quantity, self.template.clone()),
            self.lifecycle
        )
    }
}
