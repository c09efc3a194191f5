//! Error types shared across the workspace.
//!
//! Each failure kind is a typed variant with typed sources; there are no
//! free-form `String` variants. Adapters report bus failures as [`BusError`],
//! and the application layer wraps them into [`ZoneHubError`] together with
//! the operation that was attempted.

use std::error::Error as StdError;

use crate::id::ZoneId;

/// Top-level error returned by domain and application operations.
#[derive(Debug, thiserror::Error)]
pub enum ZoneHubError {
    /// A value is outside the domain of the field it targets.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The operation needs a live bus connection and there is none.
    #[error("bus client not connected")]
    ClientNotConnected {
        /// The transport error raised while connecting, when there was one.
        #[source]
        source: Option<BusError>,
    },

    /// The local zone collection could not resolve an id.
    #[error("zone lookup failed")]
    Lookup(#[from] LookupError),

    /// The controller reports that no zone is registered under this id.
    #[error("zone {0} is not registered on the controller")]
    ZoneNotRegistered(ZoneId),

    /// The zone is already part of the local collection.
    #[error("zone {0} is already registered")]
    ZoneAlreadyRegistered(ZoneId),

    /// Fan speed cannot change while the zone is powered down.
    #[error("zone {0} is powered off")]
    ZonePoweredOff(ZoneId),

    /// A bus write was not acknowledged. Local state is unchanged.
    #[error("failed to write {operation} to the controller")]
    RemoteWriteFailed {
        operation: &'static str,
        #[source]
        source: BusError,
    },

    /// A bus read failed.
    #[error("failed to read {operation} from the controller")]
    RemoteReadFailed {
        operation: &'static str,
        #[source]
        source: BusError,
    },

    /// The controller task has stopped and no longer accepts commands.
    #[error("controller task stopped")]
    ControllerStopped,
}

impl ZoneHubError {
    /// Wrap a bus error raised by a write.
    #[must_use]
    pub fn write(operation: &'static str, source: BusError) -> Self {
        Self::RemoteWriteFailed { operation, source }
    }

    /// Wrap a bus error raised by a read.
    #[must_use]
    pub fn read(operation: &'static str, source: BusError) -> Self {
        Self::RemoteReadFailed { operation, source }
    }
}

/// A value falls outside the declared domain of a field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("order temperature {value} must be between {min} and {max}")]
    OrderTempOutOfRange { value: f32, min: f32, max: f32 },

    #[error("unit id {0} must be between 1 and {max}", max = crate::limits::NUM_OF_ENGINES)]
    InvalidUnitId(u8),

    #[error("zone id {0} must be between 1 and {max}", max = crate::limits::NUM_OF_ZONES)]
    InvalidZoneId(u8),

    #[error("flow engine value {value} must be between {min} and {max}")]
    FlowEngineOutOfRange { value: u16, min: u16, max: u16 },

    /// A register code does not map to any variant of the named enum.
    #[error("code {code} is not a valid {kind}")]
    InvalidVariant { kind: &'static str, code: u16 },
}

/// Inconsistency found while resolving a zone id in the local collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("zone {0} not found")]
    ZoneNotFound(ZoneId),

    #[error("multiple zones share id {0}")]
    MultipleZonesWithSameId(ZoneId),
}

/// Failure reported by a bus client implementation.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("bus not connected")]
    NotConnected,

    #[error("bus request timed out")]
    Timeout,

    /// The controller answered with an exception for this register.
    #[error("controller rejected access to {register}")]
    Rejected { register: &'static str },

    /// The controller answered with a value that does not decode.
    #[error("invalid response from controller")]
    InvalidResponse(#[source] ValidationError),

    /// Any other transport failure (serial port, framing, …).
    #[error("transport error")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),
}

impl From<ValidationError> for BusError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidResponse(err)
    }
}
