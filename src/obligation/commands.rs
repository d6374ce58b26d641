use crate::core::amount::{Amount, Token};
use crate::core::issued::Issued;
use crate::core::transaction::CommandData;
use crate::obligation::net_state::NetType;
use crate::obligation::state::Lifecycle;
use crate::obligation::terms::Terms;
use serde::{Deserialize, Serialize};

/// Commands understood by the obligation contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Token + serde::Deserialize<'de>"))]
pub enum ObligationCommand<P> {
    /// Net obligations together; see [`NetType`].
    Net(NetType),
    /// Create new obligations. The nonce keeps otherwise identical issuances distinct.
    Issue { nonce: u64 },
    /// Transfer obligations between beneficiaries without changing the total owed.
    Move,
    /// Remove the given amount of one issuance from the ledger.
    Exit(Amount<Issued<Terms<P>>>),
    /// Mark obligations as defaulted, or restore them to normal.
    SetLifecycle(Lifecycle),
}

/// Discriminant of [`ObligationCommand`], used in clause requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObligationCommandTag {
    Net,
    Issue,
    Move,
    Exit,
    SetLifecycle,
}

impl<P: Token> CommandData for ObligationCommand<P> {
    type Tag = ObligationCommandTag;

    fn tag(&self) -> ObligationCommandTag {
        match self {
            ObligationCommand::Net(_) => ObligationCommandTag::Net,
            ObligationCommand::Issue { .. } => ObligationCommandTag::Issue,
            ObligationCommand::Move => ObligationCommandTag::Move,
            ObligationCommand::Exit(_) => ObligationCommandTag::Exit,
            ObligationCommand::SetLifecycle(_) => ObligationCommandTag::SetLifecycle,
        }
    }
}

impl<P> ObligationCommand<P> {
    pub fn net_type(&self) -> Option<NetType> {
        match self {
            ObligationCommand::Net(net_type) => Some(*net_type),
            _ => None,
        }
    }
}
