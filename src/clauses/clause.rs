use crate::core::transaction::{AuthenticatedCommand, CommandData, TransactionForContract};
use crate::error::VerificationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the clause engine does after a clause has (or has not) matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchBehaviour {
    /// Move on to the next clause.
    Continue,
    /// Stop evaluating clauses for this group.
    End,
    /// Reject the transaction.
    Error,
}

/// Everything a clause sees when it is invoked.
///
/// At the top level `inputs`/`outputs` are the whole transaction and
/// `group_key` is `None`; inside a [`GroupClauseVerifier`] they are one
/// group's states and its shared key.
///
/// [`GroupClauseVerifier`]: crate::clauses::group_verifier::GroupClauseVerifier
pub struct ClauseContext<'a, S, C, K> {
    pub tx: &'a TransactionForContract<S, C>,
    pub inputs: &'a [S],
    pub outputs: &'a [S],
    pub commands: &'a [AuthenticatedCommand<C>],
    pub group_key: Option<&'a K>,
}

impl<'a, S, C> ClauseContext<'a, S, C, ()> {
    /// Context covering every state and command of `tx`.
    pub fn for_transaction(tx: &'a TransactionForContract<S, C>) -> Self {
        Self {
            tx,
            inputs: &tx.inputs,
            outputs: &tx.outputs,
            commands: &tx.commands,
            group_key: None,
        }
    }
}

impl<S, C, K> Clone for ClauseContext<'_, S, C, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C, K> Copy for ClauseContext<'_, S, C, K> {}

/// A single composable verification rule.
///
/// A clause declares which command kinds it needs; the engine only invokes
/// [`Clause::verify`] when all of them are present. `verify` returns the
/// command values the clause has fully handled ("claimed"), or rejects the
/// transaction.
pub trait Clause<S, C: CommandData, K>: Send + Sync {
    /// Name used in logs and rejection messages.
    fn name(&self) -> &str;

    fn required_commands(&self) -> BTreeSet<C::Tag> {
        BTreeSet::new()
    }

    fn if_matched(&self) -> MatchBehaviour {
        MatchBehaviour::Continue
    }

    fn if_not_matched(&self) -> MatchBehaviour {
        MatchBehaviour::Continue
    }

    /// Whether every required command kind is present. A clause with no
    /// requirements always matches.
    fn matches(&self, commands: &[AuthenticatedCommand<C>]) -> bool {
        let required = self.required_commands();
        if required.is_empty() {
            return true;
        }
        let present: BTreeSet<C::Tag> = commands.iter().map(|c| c.value.tag()).collect();
        required.is_subset(&present)
    }

    fn verify(&self, ctx: &ClauseContext<'_, S, C, K>) -> Result<BTreeSet<C>, VerificationError>;
}

/// An ordered list of clauses, evaluated front to back.
pub type ClauseList<S, C, K> = Vec<Box<dyn Clause<S, C, K>>>;
