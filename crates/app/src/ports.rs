//! Port definitions — traits that adapters implement.
//!
//! The only port is the bus client: everything the application knows about a
//! controller goes through it. Transport adapters (serial line, simulator)
//! depend on this crate to implement it.

pub mod bus;

pub use bus::BusClient;
