use crate::clauses::clause::{Clause, MatchBehaviour};
use crate::clauses::composition::FirstOf;
use crate::clauses::engine::verify_clauses;
use crate::clauses::group_verifier::GroupClauseVerifier;
use crate::core::amount::Token;
use crate::core::transaction::{Contract, TransactionForContract};
use crate::error::VerificationError;
use crate::obligation::commands::ObligationCommand;
use crate::obligation::group_clauses::{
    ConserveAmount, IssuanceKey, IssueClause, NoZeroSizedOutputs, SetLifecycleClause,
    VerifyLifecycle,
};
use crate::obligation::net_clause::NetClause;
use crate::obligation::state::ObligationState;
use log::{debug, warn};

type TopLevelClause<P> = Box<dyn Clause<ObligationState<P>, ObligationCommand<P>, ()>>;
type GroupClause<P> = Box<dyn Clause<ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>>>;

/// The obligation contract.
///
/// Netting is checked first and, when a `Net` command is present, is
/// sufficient on its own. Otherwise states are grouped by issuance and each
/// group must be a valid lifecycle change, issuance, move or exit.
pub struct ObligationContract<P> {
    clauses: Vec<TopLevelClause<P>>,
}

impl<P: Token> ObligationContract<P> {
    pub fn new() -> Self {
        let per_issuance: Vec<GroupClause<P>> = vec![
            Box::new(SetLifecycleClause::new()),
            Box::new(NoZeroSizedOutputs::new()),
            Box::new(VerifyLifecycle::new()),
            Box::new(
                FirstOf::new(vec![
                    Box::new(IssueClause::new()) as GroupClause<P>,
                    Box::new(ConserveAmount::new()),
                ])
                .with_behaviour(MatchBehaviour::End, MatchBehaviour::Error),
            ),
        ];

        let clauses: Vec<TopLevelClause<P>> = vec![
            Box::new(NetClause::new()),
            Box::new(GroupClauseVerifier::new(
                "Group",
                ObligationState::issuance_key,
                per_issuance,
            )),
        ];

        Self { clauses }
    }

    pub fn clauses(&self) -> &[TopLevelClause<P>] {
        &self.clauses
    }
}

impl<P: Token> Default for ObligationContract<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Token> Contract<ObligationState<P>, ObligationCommand<P>> for ObligationContract<P> {
    fn verify(
        &self,
        tx: &TransactionForContract<ObligationState<P>, ObligationCommand<P>>,
    ) -> Result<(), VerificationError> {
        verify_clauses(tx, &self.clauses)
            .map(|()| debug!("transaction {} accepted", tx.id))
            .map_err(|err| {
                warn!("transaction {} rejected: {}", tx.id, err);
                err
            })
    }
}
