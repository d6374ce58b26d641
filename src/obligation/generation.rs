//! Builders for netting transactions.
//!
//! Both builders produce proposals the [`NetClause`] accepts once signed by
//! the proposal's required signers.
//!
//! [`NetClause`]: crate::obligation::net_clause::NetClause

use crate::core::amount::{Amount, Token};
use crate::core::party::{Party, PublicKey};
use crate::core::transaction::{AuthenticatedCommand, TransactionForContract};
use crate::error::VerificationError;
use crate::obligation::balances::BalanceMatrix;
use crate::obligation::commands::ObligationCommand;
use crate::obligation::net_clause::involved_parties;
use crate::obligation::net_state::{NetState, NetType};
use crate::obligation::state::ObligationState;
use crate::obligation::terms::Terms;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A netting transaction ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Token + serde::Deserialize<'de>"))]
pub struct NettingProposal<P> {
    pub template: Terms<P>,
    pub inputs: Vec<ObligationState<P>>,
    pub outputs: Vec<ObligationState<P>>,
    pub net_type: NetType,
    /// Keys whose signatures make the proposal valid.
    pub required_signers: BTreeSet<PublicKey>,
}

impl<P: Token> NettingProposal<P> {
    pub fn command(&self) -> ObligationCommand<P> {
        ObligationCommand::Net(self.net_type)
    }

    /// Total owed across the inputs.
    pub fn gross_total(&self) -> Result<Amount<Terms<P>>, VerificationError> {
        total_of(&self.template, &self.inputs)
    }

    /// Total owed across the outputs.
    pub fn net_total(&self) -> Result<Amount<Terms<P>>, VerificationError> {
        total_of(&self.template, &self.outputs)
    }

    /// Liquidity saved by netting, in display units.
    pub fn savings(&self) -> Result<Decimal, VerificationError> {
        Ok(self.gross_total()?.to_decimal() - self.net_total()?.to_decimal())
    }

    /// Savings as a percentage of gross.
    pub fn savings_percent(&self) -> Result<f64, VerificationError> {
        let gross = self.gross_total()?.to_decimal();
        if gross == Decimal::ZERO {
            return Ok(0.0);
        }
        let pct = self.savings()? * Decimal::from(100) / gross;
        Ok(pct.to_f64().unwrap_or(0.0))
    }

    /// Build the transaction with the given signer set.
    pub fn into_transaction(
        self,
        signers: impl IntoIterator<Item = PublicKey>,
    ) -> TransactionForContract<ObligationState<P>, ObligationCommand<P>> {
        let command = AuthenticatedCommand::new(self.command(), signers);
        TransactionForContract::new(self.inputs, self.outputs, vec![command])
    }

    /// Build the transaction signed by exactly the required signers.
    pub fn into_signed_transaction(
        self,
    ) -> TransactionForContract<ObligationState<P>, ObligationCommand<P>> {
        let signers = self.required_signers.clone();
        self.into_transaction(signers)
    }
}

fn total_of<P: Token>(
    template: &Terms<P>,
    states: &[ObligationState<P>],
) -> Result<Amount<Terms<P>>, VerificationError> {
    Ok(Amount::sum_or_zero(
        states
            .iter()
            .map(|state| Amount::new(state.quantity, template.clone())),
        template.clone(),
    )?)
}

impl<P: Token> fmt::Display for NettingProposal<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} Netting ===", self.net_type)?;
        writeln!(f, "Template:       {}", self.template)?;
        writeln!(f, "Obligations:    {} -> {}", self.inputs.len(), self.outputs.len())?;
        match (self.gross_total(), self.net_total()) {
            (Ok(gross), Ok(net)) => {
                writeln!(f, "Gross Total:    {}", gross)?;
                writeln!(f, "Net Total:      {}", net)?;
            }
            _ => writeln!(f, "Totals:         overflow")?,
        }
        if let Ok(pct) = self.savings_percent() {
            writeln!(f, "Savings %:      {:.1}%", pct)?;
        }
        let signers: Vec<&str> = self.required_signers.iter().map(PublicKey::as_str).collect();
        write!(f, "Signers:        {}", signers.join(", "))
    }
}

/// Common net state of `states` under `key_of`, failing if they disagree.
fn shared_net_state<P: Token>(
    states: &[ObligationState<P>],
    key_of: fn(&ObligationState<P>) -> NetState<P>,
) -> Result<NetState<P>, VerificationError> {
    let first = states.first().ok_or_else(|| VerificationError::Structural {
        context: "netting".to_string(),
        reason: "no obligations to net".to_string(),
    })?;
    let net_state = key_of(first);
    if let Some(stray) = states.iter().find(|state| key_of(state) != net_state) {
        return Err(VerificationError::Structural {
            context: net_state.to_string(),
            reason: format!("obligation '{}' cannot be netted with the others", stray),
        });
    }
    Ok(net_state)
}

fn obligors_by_key<P>(states: &[ObligationState<P>]) -> BTreeMap<PublicKey, Party> {
    states
        .iter()
        .map(|state| (state.obligor.owning_key.clone(), state.obligor.clone()))
        .collect()
}

fn settlement_state<P: Token>(
    obligors: &BTreeMap<PublicKey, Party>,
    template: &Terms<P>,
    debtor: &PublicKey,
    creditor: &PublicKey,
    quantity: i128,
) -> Result<ObligationState<P>, VerificationError> {
    let obligor = obligors
        .get(debtor)
        .cloned()
        .ok_or_else(|| VerificationError::Structural {
            context: template.to_string(),
            reason: format!("net debtor {} is not an obligor on any input", debtor),
        })?;
    let quantity = u64::try_from(quantity).map_err(|_| VerificationError::Structural {
        context: template.to_string(),
        reason: format!("settlement quantity {} out of range", quantity),
    })?;
    Ok(ObligationState::new(obligor, template.clone(), quantity, creditor.clone()))
}

/// Close out everything two parties owe each other.
///
/// All `states` must share one bilateral net state, and `signer` must be
/// one of its two parties. The output is the single residual obligation,
/// or nothing when the debts cancel exactly.
pub fn generate_close_out_netting<P: Token>(
    signer: &PublicKey,
    states: Vec<ObligationState<P>>,
) -> Result<NettingProposal<P>, VerificationError> {
    let net_state = shared_net_state(&states, ObligationState::bilateral_net_state)?;
    if let NetState::Bilateral { party_keys, .. } = &net_state {
        if !party_keys.contains(signer) {
            return Err(VerificationError::Authorization {
                context: net_state.to_string(),
                reason: format!("signer {} is not a party to these obligations", signer),
                missing: party_keys.iter().cloned().collect(),
            });
        }
    }

    let template = net_state.template().clone();
    let matrix = BalanceMatrix::extract(&template, &states)?;
    let obligors = obligors_by_key(&states);

    let outputs = matrix
        .net_amounts_due()
        .into_iter()
        .map(|((debtor, creditor), quantity)| {
            settlement_state(&obligors, &template, &debtor, &creditor, i128::from(quantity))
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!("close-out of {} obligations leaves {}", states.len(), outputs.len());

    Ok(NettingProposal {
        template,
        inputs: states,
        outputs,
        net_type: NetType::CloseOut,
        required_signers: BTreeSet::from([signer.clone()]),
    })
}

/// Net a multilateral set of obligations down to one payment per
/// debtor/creditor match.
///
/// Net debtors are matched against net creditors in key order, each
/// transfer covering as much of both as possible. Every party appearing
/// on an input must sign.
pub fn generate_payment_netting<P: Token>(
    states: Vec<ObligationState<P>>,
) -> Result<NettingProposal<P>, VerificationError> {
    let net_state = shared_net_state(&states, ObligationState::multilateral_net_state)?;
    let template = net_state.template().clone();
    let positions = BalanceMatrix::extract(&template, &states)?.net_positions()?;
    let obligors = obligors_by_key(&states);

    let mut creditors = positions.creditors().into_iter();
    let mut current_creditor = creditors.next();
    let mut outputs = Vec::new();

    for (debtor, mut owed) in positions.debtors() {
        while owed > 0 {
            let Some((creditor, due)) = current_creditor.as_mut() else {
                return Err(VerificationError::Structural {
                    context: net_state.to_string(),
                    reason: "net positions do not balance".to_string(),
                });
            };
            let transfer = owed.min(*due);
            outputs.push(settlement_state(&obligors, &template, &debtor, creditor, transfer)?);
            owed -= transfer;
            *due -= transfer;
            if *due == 0 {
                current_creditor = creditors.next();
            }
        }
    }
    debug!(
        "payment netting of {} obligations leaves {} (net settlement {})",
        states.len(),
        outputs.len(),
        positions.total_net_settlement()
    );

    let required_signers = involved_parties(&states);
    Ok(NettingProposal {
        template,
        inputs: states,
        outputs,
        net_type: NetType::Payment,
        required_signers,
    })
}
