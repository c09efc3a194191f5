//! # zonehub-domain
//!
//! Pure domain model for a multi-zone HVAC controller.
//!
//! ## Responsibilities
//! - Foundational types: bus-addressed identifiers, error taxonomy, timestamps
//! - Define **Zones** (climate-controlled areas) and their snapshots
//! - Define **Units** (flow engines)
//! - Define the operating **modes** and their register codes
//! - Hold controller **limits** and transport defaults
//! - Enforce every field invariant before a value is stored
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! The bus boundary is expressed as a trait in the `app` crate (port).

pub mod error;
pub mod id;
pub mod limits;
pub mod time;

pub mod device;
pub mod mode;
pub mod unit;
pub mod zone;
