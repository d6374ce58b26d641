//! Clauses run per issuance group: obligations sharing one obligor and one
//! set of terms.

use crate::clauses::clause::{Clause, ClauseContext, MatchBehaviour};
use crate::core::amount::{Amount, Token};
use crate::core::issued::Issued;
use crate::core::party::PublicKey;
use crate::core::transaction::{require_single_command, signers_of};
use crate::error::{require_that, VerificationError};
use crate::obligation::commands::{ObligationCommand, ObligationCommandTag};
use crate::obligation::state::{Lifecycle, ObligationState};
use crate::obligation::terms::Terms;
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// Grouping key of the per-issuance clauses.
pub type IssuanceKey<P> = Issued<Terms<P>>;

type GroupContext<'a, P> =
    ClauseContext<'a, ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>>;
type Claimed<P> = Result<BTreeSet<ObligationCommand<P>>, VerificationError>;

fn group_key<'a, P>(ctx: &GroupContext<'a, P>, clause: &str) -> Result<&'a IssuanceKey<P>, VerificationError> {
    ctx.group_key.ok_or_else(|| VerificationError::Structural {
        context: clause.to_string(),
        reason: "clause must run inside an issuance group".to_string(),
    })
}

fn sum_amounts<P: Token>(
    states: &[ObligationState<P>],
    key: &IssuanceKey<P>,
) -> Result<Amount<IssuanceKey<P>>, VerificationError> {
    Ok(Amount::sum_or_zero(
        states.iter().map(ObligationState::amount),
        key.clone(),
    )?)
}

fn input_beneficiaries<P>(inputs: &[ObligationState<P>]) -> BTreeSet<PublicKey> {
    inputs.iter().map(|state| state.beneficiary.clone()).collect()
}

fn missing_signers(required: &BTreeSet<PublicKey>, signers: &BTreeSet<PublicKey>) -> Vec<PublicKey> {
    required.difference(signers).cloned().collect()
}

macro_rules! unit_clause {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<P> {
            _product: PhantomData<fn() -> P>,
        }

        impl<P> $name<P> {
            pub fn new() -> Self {
                Self { _product: PhantomData }
            }
        }

        impl<P> Default for $name<P> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

unit_clause!(
    /// Creates new obligations. Must be signed by the obligor, and must
    /// strictly increase the amount owed.
    IssueClause
);

unit_clause!(
    /// The amount owed is conserved across a transfer, less anything
    /// explicitly exited. Every beneficiary giving up a claim must sign.
    ConserveAmount
);

unit_clause!(
    /// Moves obligations between `Normal` and `Defaulted` once they are due.
    SetLifecycleClause
);

unit_clause!(
    /// No output may have a zero quantity.
    NoZeroSizedOutputs
);

unit_clause!(
    /// Only `Normal` obligations may be issued, moved, exited or netted.
    VerifyLifecycle
);

impl<P: Token> Clause<ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>> for IssueClause<P> {
    fn name(&self) -> &str {
        "Issue"
    }

    fn required_commands(&self) -> BTreeSet<ObligationCommandTag> {
        BTreeSet::from([ObligationCommandTag::Issue])
    }

    fn verify(&self, ctx: &GroupContext<'_, P>) -> Claimed<P> {
        let key = group_key(ctx, self.name())?;
        let command = require_single_command(ctx.commands, ObligationCommandTag::Issue, self.name())?;

        let obligor = &key.issuer.party.owning_key;
        if !command.signers.contains(obligor) {
            return Err(VerificationError::Authorization {
                context: key.to_string(),
                reason: "issuance must be signed by the obligor".to_string(),
                missing: vec![obligor.clone()],
            });
        }

        let input_total = sum_amounts(ctx.inputs, key)?;
        let output_total = sum_amounts(ctx.outputs, key)?;
        require_that(
            output_total.quantity() > input_total.quantity(),
            self.name(),
            "output values sum to more than the inputs",
        )?;

        Ok(BTreeSet::from([command.value.clone()]))
    }
}

impl<P: Token> Clause<ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>> for ConserveAmount<P> {
    fn name(&self) -> &str {
        "ConserveAmount"
    }

    fn verify(&self, ctx: &GroupContext<'_, P>) -> Claimed<P> {
        let key = group_key(ctx, self.name())?;

        let exits: Vec<_> = ctx
            .commands
            .iter()
            .filter(|c| matches!(&c.value, ObligationCommand::Exit(amount) if amount.token() == key))
            .collect();
        if exits.len() > 1 {
            return Err(VerificationError::Structural {
                context: key.to_string(),
                reason: format!("expected at most one exit command, found {}", exits.len()),
            });
        }
        let exit_amount = match exits.first().map(|c| &c.value) {
            Some(ObligationCommand::Exit(amount)) => amount.clone(),
            _ => Amount::zero(key.clone()),
        };

        let input_total = sum_amounts(ctx.inputs, key)?;
        let output_total = sum_amounts(ctx.outputs, key)?;
        let accounted = output_total.checked_add(&exit_amount)?;
        if input_total != accounted {
            return Err(VerificationError::Conservation {
                group: key.to_string(),
                input: input_total.to_string(),
                output: accounted.to_string(),
            });
        }

        let moves: Vec<_> = ctx
            .commands
            .iter()
            .filter(|c| c.value == ObligationCommand::Move)
            .collect();
        let signers = signers_of(moves.iter().copied().chain(exits.iter().copied()));
        let missing = missing_signers(&input_beneficiaries(ctx.inputs), &signers);
        if !missing.is_empty() {
            return Err(VerificationError::Authorization {
                context: key.to_string(),
                reason: "every beneficiary giving up a claim must sign a move or exit".to_string(),
                missing,
            });
        }

        Ok(moves
            .into_iter()
            .chain(exits)
            .map(|c| c.value.clone())
            .collect())
    }
}

impl<P: Token> Clause<ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>> for SetLifecycleClause<P> {
    fn name(&self) -> &str {
        "SetLifecycle"
    }

    fn required_commands(&self) -> BTreeSet<ObligationCommandTag> {
        BTreeSet::from([ObligationCommandTag::SetLifecycle])
    }

    fn if_matched(&self) -> MatchBehaviour {
        MatchBehaviour::End
    }

    fn verify(&self, ctx: &GroupContext<'_, P>) -> Claimed<P> {
        let key = group_key(ctx, self.name())?;
        let command =
            require_single_command(ctx.commands, ObligationCommandTag::SetLifecycle, self.name())?;
        let ObligationCommand::SetLifecycle(target) = command.value else {
            return Err(VerificationError::Structural {
                context: self.name().to_string(),
                reason: "set lifecycle command carries no lifecycle".to_string(),
            });
        };

        require_that(
            ctx.inputs.len() == ctx.outputs.len(),
            self.name(),
            "number of inputs and outputs must match",
        )?;

        let time = ctx.tx.time.ok_or_else(|| VerificationError::Requirement {
            clause: self.name().to_string(),
            rule: "transaction must carry a time".to_string(),
        })?;
        let template = &key.product;
        let deadline = i64::try_from(template.time_tolerance_secs())
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|tolerance| template.due_before().checked_add_signed(tolerance))
            .ok_or_else(|| VerificationError::Structural {
                context: key.to_string(),
                reason: "time tolerance out of range".to_string(),
            })?;
        require_that(time > deadline, self.name(), "the due date has passed")?;

        require_that(
            ctx.inputs.iter().all(|state| state.lifecycle == target.inverse()),
            self.name(),
            "inputs are in the state opposite to the requested lifecycle",
        )?;
        require_that(
            ctx.inputs
                .iter()
                .zip(ctx.outputs)
                .all(|(input, output)| &input.clone().with_lifecycle(target) == output),
            self.name(),
            "outputs match inputs with the lifecycle changed",
        )?;

        let missing = missing_signers(&input_beneficiaries(ctx.inputs), &command.signers);
        if !missing.is_empty() {
            return Err(VerificationError::Authorization {
                context: key.to_string(),
                reason: "lifecycle changes must be signed by every beneficiary".to_string(),
                missing,
            });
        }

        Ok(BTreeSet::from([command.value.clone()]))
    }
}

impl<P: Token> Clause<ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>> for NoZeroSizedOutputs<P> {
    fn name(&self) -> &str {
        "NoZeroSizedOutputs"
    }

    fn verify(&self, ctx: &GroupContext<'_, P>) -> Claimed<P> {
        require_that(
            ctx.outputs.iter().all(|state| state.quantity > 0),
            self.name(),
            "there are no zero sized outputs",
        )?;
        Ok(BTreeSet::new())
    }
}

impl<P: Token> Clause<ObligationState<P>, ObligationCommand<P>, IssuanceKey<P>> for VerifyLifecycle<P> {
    fn name(&self) -> &str {
        "VerifyLifecycle"
    }

    fn verify(&self, ctx: &GroupContext<'_, P>) -> Claimed<P> {
        require_that(
            ctx.inputs
                .iter()
                .chain(ctx.outputs)
                .all(|state| state.lifecycle == Lifecycle::Normal),
            self.name(),
            "all states are in the normal lifecycle",
        )?;
        Ok(BTreeSet::new())
    }
}
