//! Generic clause-based verification: state grouping, the ordered clause
//! engine, composite clauses and the per-group verifier.

pub mod clause;
pub mod composition;
pub mod engine;
pub mod group_verifier;
pub mod grouping;
