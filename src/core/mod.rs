//! Ledger value types: keys, parties, amounts, issued tokens and the
//! transaction view handed to contract verification.

pub mod amount;
pub mod currency;
pub mod issued;
pub mod party;
pub mod transaction;
