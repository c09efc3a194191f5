//! # zonehub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **bus client port** ([`ports::BusClient`]) that transport
//!   adapters implement
//! - Provide the [`System`](services::system::System) aggregate: connection
//!   lifecycle, refresh, zone discovery, and every validated command that pairs
//!   a remote write with a local commit
//! - Provide the [`Controller`](controller::Controller) task that serializes
//!   commands so each read → write → commit sequence runs alone
//!
//! ## Dependency rule
//! Depends on `zonehub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
