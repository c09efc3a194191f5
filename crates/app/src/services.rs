//! Application services — use-case implementations.
//!
//! [`system::System`] takes its bus client as a generic parameter, so the
//! same commands run against a transport adapter, the simulator, or a test
//! fake.

pub mod system;
