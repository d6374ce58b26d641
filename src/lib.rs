//! # netting-verifier
//!
//! Clause-based transaction verification with obligation netting rules.
//!
//! A transaction consumes input states and produces output states under a
//! set of signed commands. A contract decides whether that transition is
//! legal by running an ordered list of clauses over it, each clause
//! claiming the commands it fully handles. The obligation contract built
//! here checks close-out and payment netting, issuance, transfer, exit and
//! default of debts between parties.
//!
//! ## Architecture
//!
//! - **core**: keys, parties, amounts, issued tokens, the transaction view
//! - **clauses**: state grouping, the clause engine, composite clauses
//! - **obligation**: obligation states, netting accounting, the contract
//! - **simulation**: random obligation networks
//! - **infra**: network map and address liveness polling interfaces

pub mod clauses;
pub mod core;
pub mod error;
pub mod infra;
pub mod obligation;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::clauses::clause::{Clause, ClauseContext, MatchBehaviour};
    pub use crate::clauses::composition::{AllOf, AnyOf, FirstOf};
    pub use crate::clauses::engine::{evaluate_clauses, verify_clauses};
    pub use crate::clauses::group_verifier::GroupClauseVerifier;
    pub use crate::clauses::grouping::{group_states, InOutGroup};
    pub use crate::core::amount::{Amount, AmountError, Token};
    pub use crate::core::currency::CurrencyCode;
    pub use crate::core::issued::Issued;
    pub use crate::core::party::{Party, PartyAndReference, PublicKey};
    pub use crate::core::transaction::{
        AuthenticatedCommand, CommandData, Contract, TransactionForContract,
    };
    pub use crate::error::VerificationError;
    pub use crate::obligation::balances::{BalanceMatrix, NetPositions};
    pub use crate::obligation::commands::ObligationCommand;
    pub use crate::obligation::contract::ObligationContract;
    pub use crate::obligation::generation::{
        generate_close_out_netting, generate_payment_netting, NettingProposal,
    };
    pub use crate::obligation::net_clause::{verify_net_command, NetClause};
    pub use crate::obligation::net_state::{NetState, NetType};
    pub use crate::obligation::state::{Lifecycle, ObligationState};
    pub use crate::obligation::terms::Terms;
}
