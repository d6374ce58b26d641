pub mod balances;
pub mod commands;
pub mod contract;
pub mod generation;
pub mod group_clauses;
pub mod net_clause;
pub mod net_state;
pub mod state;
pub mod terms;
