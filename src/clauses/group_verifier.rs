use crate::clauses::clause::{Clause, ClauseContext, MatchBehaviour};
use crate::clauses::engine::evaluate_clauses;
use crate::clauses::grouping::group_states;
use crate::core::transaction::CommandData;
use crate::error::VerificationError;
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

/// A top-level clause that splits the transaction into groups and runs an
/// inner clause list over each group independently.
///
/// Every group sees all of the transaction's commands. Claims are unioned
/// across groups, so one command may legitimately be claimed by several
/// groups (a single `Move` covering two currencies, for instance).
pub struct GroupClauseVerifier<S, C: CommandData, K> {
    name: String,
    key_of: fn(&S) -> K,
    clauses: Vec<Box<dyn Clause<S, C, K>>>,
    if_matched: MatchBehaviour,
    if_not_matched: MatchBehaviour,
}

impl<S, C: CommandData, K> GroupClauseVerifier<S, C, K> {
    pub fn new(
        name: impl Into<String>,
        key_of: fn(&S) -> K,
        clauses: Vec<Box<dyn Clause<S, C, K>>>,
    ) -> Self {
        Self {
            name: name.into(),
            key_of,
            clauses,
            if_matched: MatchBehaviour::End,
            if_not_matched: MatchBehaviour::Continue,
        }
    }

    pub fn with_behaviour(mut self, if_matched: MatchBehaviour, if_not_matched: MatchBehaviour) -> Self {
        self.if_matched = if_matched;
        self.if_not_matched = if_not_matched;
        self
    }
}

impl<S, C, K> Clause<S, C, ()> for GroupClauseVerifier<S, C, K>
where
    S: Clone,
    C: CommandData,
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn if_matched(&self) -> MatchBehaviour {
        self.if_matched
    }

    fn if_not_matched(&self) -> MatchBehaviour {
        self.if_not_matched
    }

    fn verify(&self, ctx: &ClauseContext<'_, S, C, ()>) -> Result<BTreeSet<C>, VerificationError> {
        let groups = group_states(ctx.inputs, ctx.outputs, self.key_of);
        let mut claimed = BTreeSet::new();

        for group in &groups {
            debug!(
                "{}: verifying group {:?} ({} inputs, {} outputs)",
                self.name,
                group.key,
                group.inputs.len(),
                group.outputs.len()
            );
            let group_ctx = ClauseContext {
                tx: ctx.tx,
                inputs: &group.inputs,
                outputs: &group.outputs,
                commands: ctx.commands,
                group_key: Some(&group.key),
            };
            claimed.extend(evaluate_clauses(&self.clauses, &group_ctx)?);
        }

        Ok(claimed)
    }
}
