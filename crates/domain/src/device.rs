//! Device description — how the controller presents itself to a host.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Manufacturer reported for every controller.
pub const MANUFACTURER: &str = "Koolnova";

/// Name, manufacturer, and stable identifier of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: String,
    pub identifier: DeviceId,
}

impl DeviceInfo {
    /// Describe a controller named `name` with a configuration-supplied
    /// identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, identifier: DeviceId) -> Self {
        Self {
            name: name.into(),
            manufacturer: MANUFACTURER.to_string(),
            identifier,
        }
    }
}
