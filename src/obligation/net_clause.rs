//! Close-out and payment netting.
//!
//! A `Net` command consumes a set of obligations and replaces them with a
//! smaller set that leaves every party's net position unchanged.
//!
//! # Algorithm
//!
//! 1. Select the single `Net` command.
//! 2. Group every obligation by its bilateral (close-out) or multilateral
//!    (payment) net state.
//! 3. Per group: check the template, build input and output balance
//!    matrices, compare the per-party net positions, then check signers.
//!
//! Every state must be in the `Normal` lifecycle and every output must
//! carry a positive quantity.
//!
//! Close-out needs any one involved party to sign. Payment needs all of them.

use crate::clauses::clause::{Clause, ClauseContext, MatchBehaviour};
use crate::clauses::grouping::group_states;
use crate::core::amount::Token;
use crate::core::party::PublicKey;
use crate::core::transaction::{require_single_command, AuthenticatedCommand};
use crate::error::{require_that, VerificationError};
use crate::obligation::balances::BalanceMatrix;
use crate::obligation::commands::{ObligationCommand, ObligationCommandTag};
use crate::obligation::net_state::{NetState, NetType};
use crate::obligation::state::{Lifecycle, ObligationState};
use log::{debug, trace};
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// Top-level clause verifying `Net` commands.
///
/// Claims the net command and ends evaluation when it matches; lets the
/// remaining clauses run when no net command is present.
pub struct NetClause<P> {
    _product: PhantomData<fn() -> P>,
}

impl<P> NetClause<P> {
    pub fn new() -> Self {
        Self {
            _product: PhantomData,
        }
    }
}

impl<P> Default for NetClause<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Token> Clause<ObligationState<P>, ObligationCommand<P>, ()> for NetClause<P> {
    fn name(&self) -> &str {
        "Net"
    }

    fn required_commands(&self) -> BTreeSet<ObligationCommandTag> {
        BTreeSet::from([ObligationCommandTag::Net])
    }

    fn if_matched(&self) -> MatchBehaviour {
        MatchBehaviour::End
    }

    fn if_not_matched(&self) -> MatchBehaviour {
        MatchBehaviour::Continue
    }

    fn verify(
        &self,
        ctx: &ClauseContext<'_, ObligationState<P>, ObligationCommand<P>, ()>,
    ) -> Result<BTreeSet<ObligationCommand<P>>, VerificationError> {
        let command = require_single_command(ctx.commands, ObligationCommandTag::Net, self.name())?;
        let net_type = command.value.net_type().ok_or_else(|| VerificationError::Structural {
            context: self.name().to_string(),
            reason: "net command carries no net type".to_string(),
        })?;

        require_that(
            ctx.inputs
                .iter()
                .chain(ctx.outputs)
                .all(|state| state.lifecycle == Lifecycle::Normal),
            self.name(),
            "all states are in the normal lifecycle",
        )?;

        let groups = match net_type {
            NetType::CloseOut => group_states(ctx.inputs, ctx.outputs, ObligationState::bilateral_net_state),
            NetType::Payment => group_states(ctx.inputs, ctx.outputs, ObligationState::multilateral_net_state),
        };
        debug!("{} netting over {} group(s)", net_type, groups.len());

        for group in &groups {
            verify_net_command(&group.inputs, &group.outputs, command, &group.key)?;
        }

        Ok(BTreeSet::from([command.value.clone()]))
    }
}

/// Verify one netting group.
///
/// Conservation is checked per party: the net position of every party
/// (owed minus owing, zero positions dropped) must be the same across
/// inputs and outputs. Equal grand totals are not enough.
///
/// Fails with `Structural` if any state carries a template other than
/// `net_state`'s, `Requirement` if an output is zero sized, `Conservation`
/// if input and output net positions differ, and `Authorization` if the
/// signers do not satisfy the net type's rule. Close-out over a group with
/// no inputs has no involved party and is always rejected.
pub fn verify_net_command<P: Token>(
    inputs: &[ObligationState<P>],
    outputs: &[ObligationState<P>],
    command: &AuthenticatedCommand<ObligationCommand<P>>,
    net_state: &NetState<P>,
) -> Result<(), VerificationError> {
    let template = net_state.template();
    let group = net_state.to_string();

    if inputs
        .iter()
        .chain(outputs)
        .any(|state| &state.template != template)
    {
        return Err(VerificationError::Structural {
            context: group,
            reason: "states grouped incorrectly: template differs from the group's".to_string(),
        });
    }

    require_that(
        outputs.iter().all(|state| state.quantity > 0),
        "Net",
        "there are no zero sized outputs",
    )?;

    let input_positions = BalanceMatrix::extract(template, inputs)?.net_positions()?;
    let output_positions = BalanceMatrix::extract(template, outputs)?.net_positions()?;
    trace!("{}: input positions {}, output positions {}", group, input_positions, output_positions);

    if input_positions != output_positions {
        return Err(VerificationError::Conservation {
            group,
            input: input_positions.to_string(),
            output: output_positions.to_string(),
        });
    }

    let involved = involved_parties(inputs);
    let net_type = command.value.net_type().ok_or_else(|| VerificationError::Structural {
        context: group.clone(),
        reason: "net command carries no net type".to_string(),
    })?;

    match net_type {
        NetType::CloseOut => {
            if involved.is_disjoint(&command.signers) {
                return Err(VerificationError::Authorization {
                    context: group,
                    reason: "close-out netting must be signed by at least one involved party"
                        .to_string(),
                    missing: involved.into_iter().collect(),
                });
            }
        }
        NetType::Payment => {
            let missing: Vec<PublicKey> = involved.difference(&command.signers).cloned().collect();
            if !missing.is_empty() {
                return Err(VerificationError::Authorization {
                    context: group,
                    reason: "payment netting must be signed by every involved party".to_string(),
                    missing,
                });
            }
        }
    }

    Ok(())
}

/// Every obligor and beneficiary key appearing on the inputs.
pub fn involved_parties<P>(inputs: &[ObligationState<P>]) -> BTreeSet<PublicKey> {
    inputs
        .iter()
        .flat_map(|state| [state.obligor.owning_key.clone(), state.beneficiary.clone()])
        .collect()
}
