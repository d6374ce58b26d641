//! Interfaces to the infrastructure around verification: the network map
//! and node liveness polling.
//!
//! Nothing here is reachable from contract verification. These are
//! blocking, timed operations used by node tooling and tests.

pub mod node;
pub mod polling;
