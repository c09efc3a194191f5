//! Typed identifiers.
//!
//! Zones and units are addressed on the bus by small positive integers, so
//! their ids are bounded `u8` newtypes that can only hold a valid address.
//! The device itself carries a stable UUID supplied by configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::limits::{NUM_OF_ENGINES, NUM_OF_ZONES};

macro_rules! define_bus_id {
    ($(#[doc = $doc:expr])* $name:ident, max = $max:expr, err = $err:path) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub struct $name(u8);

        impl $name {
            /// Validate and wrap a raw bus address.
            ///
            /// # Errors
            ///
            /// Returns a [`ValidationError`] when `value` is zero or above the
            /// highest address.
            pub fn new(value: u8) -> Result<Self, ValidationError> {
                if value == 0 || value > $max {
                    return Err($err(value));
                }
                Ok(Self(value))
            }

            /// The raw bus address.
            #[must_use]
            pub fn get(self) -> u8 {
                self.0
            }

            /// Every valid id, in ascending order.
            pub fn all() -> impl Iterator<Item = Self> {
                (1..=$max).map(Self)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ValidationError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for u8 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_bus_id!(
    /// Bus address of a [`Zone`](crate::zone::Zone), `1..=NUM_OF_ZONES`.
    ZoneId,
    max = NUM_OF_ZONES,
    err = ValidationError::InvalidZoneId
);

define_bus_id!(
    /// Bus address of a [`Unit`](crate::unit::Unit), `1..=NUM_OF_ENGINES`.
    UnitId,
    max = NUM_OF_ENGINES,
    err = ValidationError::InvalidUnitId
);

/// Stable identifier of a controller, as shown in the device description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(uuid::Uuid);

// Random per call, so no `Default`.
#[allow(clippy::new_without_default)]
impl DeviceId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_every_zone_address_in_range() {
        for raw in 1..=NUM_OF_ZONES {
            assert_eq!(ZoneId::new(raw).unwrap().get(), raw);
        }
    }

    #[test]
    fn should_reject_zone_zero() {
        assert_eq!(ZoneId::new(0), Err(ValidationError::InvalidZoneId(0)));
    }

    #[test]
    fn should_reject_zone_above_bus_range() {
        let raw = NUM_OF_ZONES + 1;
        assert_eq!(ZoneId::new(raw), Err(ValidationError::InvalidZoneId(raw)));
    }

    #[test]
    fn should_reject_unit_above_engine_count() {
        let raw = NUM_OF_ENGINES + 1;
        assert_eq!(UnitId::new(raw), Err(ValidationError::InvalidUnitId(raw)));
    }

    #[test]
    fn should_list_every_unit_id() {
        let ids: Vec<u8> = UnitId::all().map(UnitId::get).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn should_reject_out_of_range_zone_id_when_deserializing() {
        let parsed: Result<ZoneId, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
        let parsed: ZoneId = serde_json::from_str("3").unwrap();
        assert_eq!(parsed.get(), 3);
    }

    #[test]
    fn should_parse_device_id_from_configuration_string() {
        let id: DeviceId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn should_return_error_when_parsing_invalid_device_id() {
        assert!(DeviceId::from_str("deadbeef").is_err());
    }
}
