//! # zonehub-adapter-virtual
//!
//! Simulated Koolnova controller implementing the
//! [`BusClient`](zonehub_app::ports::BusClient) port.
//!
//! The simulator keeps register contents in memory, seeded from a
//! [`VirtualConfig`]. It journals every request and lets callers inject
//! faults per [`Operation`], which makes it usable both as a demo backend for
//! the daemon and as a test double for end-to-end scenarios.
//!
//! ## Dependency rule
//!
//! Depends on `zonehub-app` (port traits) and `zonehub-domain` only.

mod bus;
pub mod config;

pub use bus::{Call, Operation, VirtualBus};
pub use config::{VirtualConfig, VirtualEngineConfig, VirtualZoneConfig};
