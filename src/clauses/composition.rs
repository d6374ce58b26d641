//! Clauses built out of other clauses.
//!
//! Composites let a contract express "all of these rules", "whichever of
//! these rules apply" and "the first rule that applies" as a single entry
//! in a clause list. Their own `if_matched` / `if_not_matched` behaviour is
//! configured with `with_behaviour` and defaults to `Continue`.

use crate::clauses::clause::{Clause, ClauseContext, MatchBehaviour};
use crate::clauses::engine::record_claims;
use crate::core::transaction::{AuthenticatedCommand, CommandData};
use crate::error::VerificationError;
use std::collections::BTreeSet;

fn composite_name<S, C: CommandData, K>(kind: &str, clauses: &[Box<dyn Clause<S, C, K>>]) -> String {
    let names: Vec<&str> = clauses.iter().map(|c| c.name()).collect();
    format!("{}({})", kind, names.join(", "))
}

macro_rules! composite_behaviour {
    () => {
        pub fn with_behaviour(mut self, if_matched: MatchBehaviour, if_not_matched: MatchBehaviour) -> Self {
            self.if_matched = if_matched;
            self.if_not_matched = if_not_matched;
            self
        }
    };
}

/// Every child must match; their claims are combined.
pub struct AllOf<S, C: CommandData, K> {
    name: String,
    clauses: Vec<Box<dyn Clause<S, C, K>>>,
    if_matched: MatchBehaviour,
    if_not_matched: MatchBehaviour,
}

impl<S, C: CommandData, K> AllOf<S, C, K> {
    pub fn new(clauses: Vec<Box<dyn Clause<S, C, K>>>) -> Self {
        Self {
            name: composite_name("AllOf", &clauses),
            clauses,
            if_matched: MatchBehaviour::Continue,
            if_not_matched: MatchBehaviour::Continue,
        }
    }

    composite_behaviour!();
}

impl<S, C: CommandData, K> Clause<S, C, K> for AllOf<S, C, K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_commands(&self) -> BTreeSet<C::Tag> {
        self.clauses
            .iter()
            .flat_map(|c| c.required_commands())
            .collect()
    }

    fn if_matched(&self) -> MatchBehaviour {
        self.if_matched
    }

    fn if_not_matched(&self) -> MatchBehaviour {
        self.if_not_matched
    }

    fn matches(&self, commands: &[AuthenticatedCommand<C>]) -> bool {
        self.clauses.iter().all(|c| c.matches(commands))
    }

    fn verify(&self, ctx: &ClauseContext<'_, S, C, K>) -> Result<BTreeSet<C>, VerificationError> {
        let mut claimed = BTreeSet::new();
        for clause in &self.clauses {
            if !clause.matches(ctx.commands) {
                return Err(VerificationError::ClauseMustMatch {
                    clause: clause.name().to_string(),
                    outcome: format!("did not match within {}", self.name),
                });
            }
            record_claims(&mut claimed, clause.verify(ctx)?, clause.name())?;
        }
        Ok(claimed)
    }
}

/// Runs every child that matches; at least one must.
pub struct AnyOf<S, C: CommandData, K> {
    name: String,
    clauses: Vec<Box<dyn Clause<S, C, K>>>,
    if_matched: MatchBehaviour,
    if_not_matched: MatchBehaviour,
}

impl<S, C: CommandData, K> AnyOf<S, C, K> {
    pub fn new(clauses: Vec<Box<dyn Clause<S, C, K>>>) -> Self {
        Self {
            name: composite_name("AnyOf", &clauses),
            clauses,
            if_matched: MatchBehaviour::Continue,
            if_not_matched: MatchBehaviour::Continue,
        }
    }

    composite_behaviour!();
}

impl<S, C: CommandData, K> Clause<S, C, K> for AnyOf<S, C, K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn if_matched(&self) -> MatchBehaviour {
        self.if_matched
    }

    fn if_not_matched(&self) -> MatchBehaviour {
        self.if_not_matched
    }

    fn matches(&self, commands: &[AuthenticatedCommand<C>]) -> bool {
        self.clauses.iter().any(|c| c.matches(commands))
    }

    fn verify(&self, ctx: &ClauseContext<'_, S, C, K>) -> Result<BTreeSet<C>, VerificationError> {
        let mut claimed = BTreeSet::new();
        let mut any_matched = false;
        for clause in self.clauses.iter().filter(|c| c.matches(ctx.commands)) {
            any_matched = true;
            record_claims(&mut claimed, clause.verify(ctx)?, clause.name())?;
        }
        if !any_matched {
            return Err(VerificationError::NoClauseMatched {
                clause: self.name.clone(),
            });
        }
        Ok(claimed)
    }
}

/// Runs only the first child that matches.
pub struct FirstOf<S, C: CommandData, K> {
    name: String,
    clauses: Vec<Box<dyn Clause<S, C, K>>>,
    if_matched: MatchBehaviour,
    if_not_matched: MatchBehaviour,
}

impl<S, C: CommandData, K> FirstOf<S, C, K> {
    pub fn new(clauses: Vec<Box<dyn Clause<S, C, K>>>) -> Self {
        Self {
            name: composite_name("FirstOf", &clauses),
            clauses,
            if_matched: MatchBehaviour::Continue,
            if_not_matched: MatchBehaviour::Continue,
        }
    }

    composite_behaviour!();
}

impl<S, C: CommandData, K> Clause<S, C, K> for FirstOf<S, C, K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn if_matched(&self) -> MatchBehaviour {
        self.if_matched
    }

    fn if_not_matched(&self) -> MatchBehaviour {
        self.if_not_matched
    }

    fn matches(&self, commands: &[AuthenticatedCommand<C>]) -> bool {
        self.clauses.iter().any(|c| c.matches(commands))
    }

    fn verify(&self, ctx: &ClauseContext<'_, S, C, K>) -> Result<BTreeSet<C>, VerificationError> {
        let clause = self
            .clauses
            .iter()
            .find(|c| c.matches(ctx.commands))
            .ok_or_else(|| VerificationError::NoClauseMatched {
                clause: self.name.clone(),
            })?;
        clause.verify(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clauses::engine::test_support::*;
    use crate::clauses::engine::verify_clauses;

    #[test]
    fn test_first_of_runs_only_first_match() {
        let tx = tx(&[Cmd::A, Cmd::B]);
        let first = FirstOf::new(vec![
            Rule::new("c", &[Cmd::C], &[Cmd::C]).failing().boxed(),
            Rule::new("a", &[Cmd::A], &[Cmd::A, Cmd::B]).boxed(),
            Rule::new("b", &[Cmd::B], &[]).failing().boxed(),
        ]);
        assert_eq!(first.name(), "FirstOf(c, a, b)");
        let clauses: Vec<Box<dyn Clause<u32, Cmd, ()>>> = vec![Box::new(first)];
        assert!(verify_clauses(&tx, &clauses).is_ok());
    }

    #[test]
    fn test_first_of_no_match_with_error_behaviour() {
        let tx = tx(&[Cmd::A]);
        let first = FirstOf::new(vec![Rule::new("b", &[Cmd::B], &[Cmd::B]).boxed()])
            .with_behaviour(MatchBehaviour::End, MatchBehaviour::Error);
        let clauses: Vec<Box<dyn Clause<u32, Cmd, ()>>> = vec![Box::new(first)];
        let err = verify_clauses(&tx, &clauses).unwrap_err();
        assert!(matches!(err, VerificationError::ClauseMustMatch { .. }));
    }

    #[test]
    fn test_all_of_requires_every_child() {
        let tx = tx(&[Cmd::A]);
        let all = AllOf::new(vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("b", &[Cmd::B], &[Cmd::B]).boxed(),
        ]);
        let ctx = ClauseContext::for_transaction(&tx);
        assert!(!all.matches(ctx.commands));
        assert_eq!(all.required_commands(), BTreeSet::from([Cmd::A, Cmd::B]));
        assert!(all.verify(&ctx).is_err());
    }

    #[test]
    fn test_all_of_combines_claims() {
        let tx = tx(&[Cmd::A, Cmd::B]);
        let all = AllOf::new(vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("b", &[Cmd::B], &[Cmd::B]).boxed(),
        ]);
        let ctx = ClauseContext::for_transaction(&tx);
        assert_eq!(all.verify(&ctx).unwrap(), BTreeSet::from([Cmd::A, Cmd::B]));
    }

    #[test]
    fn test_all_of_rejects_overlapping_claims() {
        let tx = tx(&[Cmd::A]);
        let all = AllOf::new(vec![
            Rule::new("one", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("two", &[Cmd::A], &[Cmd::A]).boxed(),
        ]);
        let ctx = ClauseContext::for_transaction(&tx);
        assert!(matches!(
            all.verify(&ctx),
            Err(VerificationError::CommandClaimedTwice { .. })
        ));
    }

    #[test]
    fn test_any_of_runs_all_matching() {
        let tx = tx(&[Cmd::A, Cmd::C]);
        let any = AnyOf::new(vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("b", &[Cmd::B], &[Cmd::B]).failing().boxed(),
            Rule::new("c", &[Cmd::C], &[Cmd::C]).boxed(),
        ]);
        let ctx = ClauseContext::for_transaction(&tx);
        assert_eq!(any.verify(&ctx).unwrap(), BTreeSet::from([Cmd::A, Cmd::C]));
    }

    #[test]
    fn test_any_of_needs_one_match() {
        let tx = tx(&[Cmd::A]);
        let any = AnyOf::new(vec![Rule::new("b", &[Cmd::B], &[Cmd::B]).boxed()]);
        let ctx = ClauseContext::for_transaction(&tx);
        assert_eq!(
            any.verify(&ctx).unwrap_err(),
            VerificationError::NoClauseMatched {
                clause: "AnyOf(b)".to_string()
            }
        );
    }
}
