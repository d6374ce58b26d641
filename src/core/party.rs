use serde::{Deserialize, Serialize};
use std::fmt;

/// An encoded public key identifying a signer on the ledger.
///
/// The verifier never inspects key material: signatures are checked
/// upstream and only set membership of keys matters here. Keys are
/// therefore opaque, ordered values.
///
/// # Examples
///
/// ```
/// use netting_verifier::core::party::PublicKey;
///
/// let alice = PublicKey::new("ed25519:alice");
/// let bob = PublicKey::new("ed25519:bob");
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the encoded form of this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PublicKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A named legal identity together with the key it signs with.
///
/// Equality covers both the name and the key, so two parties sharing a
/// key under different names are distinct values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub owning_key: PublicKey,
}

impl Party {
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }

    /// Reference a specific issuance made by this party.
    pub fn reference(&self, reference: impl Into<Vec<u8>>) -> PartyAndReference {
        PartyAndReference {
            party: self.clone(),
            reference: reference.into(),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A party plus an opaque reference distinguishing one of its issuances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyAndReference {
    pub party: Party,
    pub reference: Vec<u8>,
}

impl fmt::Display for PartyAndReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.party)?;
        if !self.reference.is_empty() {
            write!(f, "#")?;
            for byte in &self.reference {
                write!(f, "{:02x}", byte)?;
            }
        }
        Ok(())
    }
}
