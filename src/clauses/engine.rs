//! The ordered, short-circuiting clause runner.
//!
//! # Algorithm
//!
//! 1. Walk the clauses in declared order.
//! 2. A clause whose required commands are all present is invoked; its
//!    claimed commands are recorded and its `if_matched` behaviour applies.
//!    Otherwise it is skipped and its `if_not_matched` behaviour applies.
//! 3. `End` stops the walk, `Error` rejects, `Continue` moves on.
//! 4. At the top level, every command in the transaction must have been
//!    claimed by some clause.

use crate::clauses::clause::{Clause, ClauseContext, MatchBehaviour};
use crate::core::transaction::{CommandData, TransactionForContract};
use crate::error::VerificationError;
use log::{debug, trace};
use std::collections::BTreeSet;

/// Run `clauses` over one group and return the commands they claimed.
pub fn evaluate_clauses<S, C, K>(
    clauses: &[Box<dyn Clause<S, C, K>>],
    ctx: &ClauseContext<'_, S, C, K>,
) -> Result<BTreeSet<C>, VerificationError>
where
    C: CommandData,
{
    let mut claimed = BTreeSet::new();

    for clause in clauses {
        let matched = clause.matches(ctx.commands);
        let behaviour = if matched {
            let newly_claimed = clause.verify(ctx)?;
            debug!(
                "clause {} matched and claimed {:?}",
                clause.name(),
                newly_claimed
            );
            record_claims(&mut claimed, newly_claimed, clause.name())?;
            clause.if_matched()
        } else {
            trace!("clause {} skipped: required commands absent", clause.name());
            clause.if_not_matched()
        };

        match behaviour {
            MatchBehaviour::Continue => {}
            MatchBehaviour::End => break,
            MatchBehaviour::Error => {
                return Err(VerificationError::ClauseMustMatch {
                    clause: clause.name().to_string(),
                    outcome: if matched { "matched" } else { "did not match" }.to_string(),
                })
            }
        }
    }

    Ok(claimed)
}

/// Verify a whole transaction against a top-level clause list.
///
/// Fails with [`VerificationError::UnclaimedCommand`] if any command of the
/// transaction survives evaluation without a clause claiming it.
pub fn verify_clauses<S, C>(
    tx: &TransactionForContract<S, C>,
    clauses: &[Box<dyn Clause<S, C, ()>>],
) -> Result<(), VerificationError>
where
    C: CommandData,
{
    let ctx = ClauseContext::for_transaction(tx);
    let claimed = evaluate_clauses(clauses, &ctx)?;

    if let Some(unclaimed) = tx.commands.iter().find(|c| !claimed.contains(&c.value)) {
        return Err(VerificationError::UnclaimedCommand {
            command: format!("{:?}", unclaimed.value),
        });
    }
    Ok(())
}

/// Add `newly_claimed` to `claimed`, rejecting any command already present.
pub(crate) fn record_claims<C: CommandData>(
    claimed: &mut BTreeSet<C>,
    newly_claimed: BTreeSet<C>,
    clause: &str,
) -> Result<(), VerificationError> {
    for command in newly_claimed {
        if claimed.contains(&command) {
            return Err(VerificationError::CommandClaimedTwice {
                clause: clause.to_string(),
                command: format!("{:?}", command),
            });
        }
        claimed.insert(command);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_all_commands_claimed() {
        let tx = tx(&[Cmd::A, Cmd::B]);
        let clauses = vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("b", &[Cmd::B], &[Cmd::B]).boxed(),
        ];
        assert!(verify_clauses(&tx, &clauses).is_ok());
    }

    #[test]
    fn test_unclaimed_command_rejected() {
        let tx = tx(&[Cmd::A, Cmd::B]);
        let clauses = vec![Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed()];
        let err = verify_clauses(&tx, &clauses).unwrap_err();
        assert_eq!(
            err,
            VerificationError::UnclaimedCommand {
                command: "B".to_string()
            }
        );
    }

    #[test]
    fn test_end_short_circuits() {
        let tx = tx(&[Cmd::A]);
        let clauses = vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A])
                .behaviour(MatchBehaviour::End, MatchBehaviour::Continue)
                .boxed(),
            Rule::new("never", &[], &[]).failing().boxed(),
        ];
        assert!(verify_clauses(&tx, &clauses).is_ok());
    }

    #[test]
    fn test_continue_runs_next_clause() {
        let tx = tx(&[Cmd::A]);
        let clauses = vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("always", &[], &[]).failing().boxed(),
        ];
        let err = verify_clauses(&tx, &clauses).unwrap_err();
        assert!(matches!(err, VerificationError::Requirement { .. }));
    }

    #[test]
    fn test_skipped_clause_not_invoked() {
        let tx = tx(&[Cmd::A]);
        let clauses = vec![
            Rule::new("c", &[Cmd::C], &[Cmd::C]).failing().boxed(),
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
        ];
        assert!(verify_clauses(&tx, &clauses).is_ok());
    }

    #[test]
    fn test_partial_requirements_do_not_match() {
        let tx = tx(&[Cmd::A]);
        let clauses = vec![
            Rule::new("ab", &[Cmd::A, Cmd::B], &[Cmd::A, Cmd::B]).failing().boxed(),
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
        ];
        assert!(verify_clauses(&tx, &clauses).is_ok());
    }

    #[test]
    fn test_error_when_not_matched() {
        let tx = tx(&[Cmd::A]);
        let clauses = vec![
            Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("must-b", &[Cmd::B], &[Cmd::B])
                .behaviour(MatchBehaviour::End, MatchBehaviour::Error)
                .boxed(),
        ];
        let err = verify_clauses(&tx, &clauses).unwrap_err();
        assert_eq!(
            err,
            VerificationError::ClauseMustMatch {
                clause: "must-b".to_string(),
                outcome: "did not match".to_string()
            }
        );
    }

    #[test]
    fn test_double_claim_rejected() {
        let tx = tx(&[Cmd::A]);
        let clauses = vec![
            Rule::new("first", &[Cmd::A], &[Cmd::A]).boxed(),
            Rule::new("second", &[Cmd::A], &[Cmd::A]).boxed(),
        ];
        let err = verify_clauses(&tx, &clauses).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::CommandClaimedTwice { ref clause, .. } if clause == "second"
        ));
    }

    #[test]
    fn test_no_commands_no_clauses() {
        let tx = tx(&[]);
        let clauses: Vec<Box<dyn Clause<u32, Cmd, ()>>> = Vec::new();
        assert!(verify_clauses(&tx, &clauses).is_ok());
    }

    #[test]
    fn test_evaluate_returns_claims() {
        let tx = tx(&[Cmd::A, Cmd::B]);
        let ctx = ClauseContext::for_transaction(&tx);
        let clauses = vec![Rule::new("a", &[Cmd::A], &[Cmd::A]).boxed()];
        let claimed = evaluate_clauses(&clauses, &ctx).unwrap();
        assert_eq!(claimed, BTreeSet::from([Cmd::A]));
    }
}
