use crate::core::party::PublicKey;
use crate::error::VerificationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Contract-specific command payload.
///
/// Commands are compared by value when clauses claim them, so they must
/// be totally ordered. The [`CommandData::Tag`] discriminant is what
/// clauses declare in their required-command sets.
pub trait CommandData: Clone + Ord + fmt::Debug + Send + Sync + 'static {
    type Tag: Copy + Ord + fmt::Debug + Send + Sync + 'static;

    fn tag(&self) -> Self::Tag;
}

/// A command together with the keys that signed the enclosing transaction.
///
/// `signers` has already been cryptographically verified by the caller;
/// verification here only ever checks set membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedCommand<C> {
    pub signers: BTreeSet<PublicKey>,
    pub value: C,
}

impl<C> AuthenticatedCommand<C> {
    pub fn new(value: C, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            signers: signers.into_iter().collect(),
            value,
        }
    }
}

/// The view of a transaction that a single contract verifies.
///
/// Built fresh by the caller for each verification; nothing here is
/// shared or mutated across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForContract<S, C> {
    pub id: Uuid,
    pub inputs: Vec<S>,
    pub outputs: Vec<S>,
    pub commands: Vec<AuthenticatedCommand<C>>,
    /// Notary-attested instant the transaction is known to come after.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

impl<S, C> TransactionForContract<S, C> {
    pub fn new(
        inputs: Vec<S>,
        outputs: Vec<S>,
        commands: Vec<AuthenticatedCommand<C>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            inputs,
            outputs,
            commands,
            time: None,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }
}

/// A contract: accepts or rejects a transaction touching its states.
///
/// Verification is a pure function of the transaction. It has no side
/// effects and can run concurrently on independent transactions.
pub trait Contract<S, C>: Send + Sync {
    fn verify(&self, tx: &TransactionForContract<S, C>) -> Result<(), VerificationError>;
}

/// Select the one command whose tag is `tag`, failing if there are zero or several.
pub fn require_single_command<'a, C: CommandData>(
    commands: &'a [AuthenticatedCommand<C>],
    tag: C::Tag,
    context: &str,
) -> Result<&'a AuthenticatedCommand<C>, VerificationError> {
    let mut matching = commands.iter().filter(|c| c.value.tag() == tag);
    match (matching.next(), matching.next()) {
        (Some(command), None) => Ok(command),
        (first, _) => {
            let found = if first.is_none() {
                0
            } else {
                2 + matching.count()
            };
            Err(VerificationError::Structural {
                context: context.to_string(),
                reason: format!("expected single {:?} command, found {}", tag, found),
            })
        }
    }
}

/// Union of the signers of every command in `commands`.
pub fn signers_of<'a, C: 'a>(
    commands: impl IntoIterator<Item = &'a AuthenticatedCommand<C>>,
) -> BTreeSet<PublicKey> {
    commands
        .into_iter()
        .flat_map(|c| c.signers.iter().cloned())
        .collect()
}
