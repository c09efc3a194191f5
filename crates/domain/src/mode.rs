//! Operating modes and on/off flags exchanged with the controller.
//!
//! Every enum maps to the integer code the controller stores in its
//! registers. Conversion from a raw code is fallible; conversion to a code is
//! not.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! register_enum {
    (
        $(#[doc = $doc:expr])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Register code of this variant.
            #[must_use]
            pub fn code(self) -> u16 {
                match self {
                    $( Self::$variant => $code ),+
                }
            }

            /// Every variant, in register-code order.
            pub const ALL: &'static [Self] = &[$( Self::$variant ),+];
        }

        impl TryFrom<u16> for $name {
            type Error = ValidationError;

            fn try_from(code: u16) -> Result<Self, Self::Error> {
                match code {
                    $( $code => Ok(Self::$variant), )+
                    _ => Err(ValidationError::InvalidVariant {
                        kind: stringify!($name),
                        code,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$variant => f.write_str($label) ),+
                }
            }
        }
    };
}

register_enum!(
    /// Power flag of a zone.
    ZoneState {
        #[default]
        Off = 0 => "off",
        On = 1 => "on",
    }
);

register_enum!(
    /// Raw on/off flag as observed in the zone's register.
    ZoneRegister {
        #[default]
        Off = 0 => "off",
        On = 1 => "on",
    }
);

register_enum!(
    /// Fan speed of a zone. [`Off`](Self::Off) is reported for powered-down zones.
    ZoneFanMode {
        #[default]
        Off = 0 => "off",
        Low = 1 => "low",
        Medium = 2 => "medium",
        High = 3 => "high",
        Auto = 4 => "auto",
    }
);

register_enum!(
    /// Climate mode requested for a zone.
    ZoneClimMode {
        #[default]
        Off = 0 => "off",
        Cool = 1 => "cool",
        Heat = 2 => "heat",
        Auto = 3 => "auto",
    }
);

register_enum!(
    /// System-wide heating or cooling selector.
    GlobalMode {
        #[default]
        Cold = 1 => "cold",
        Heat = 2 => "heat",
        HeatingFloor = 4 => "heating_floor",
        RefreshingFloor = 5 => "refreshing_floor",
    }
);

register_enum!(
    /// Performance/power profile of the whole system.
    Efficiency {
        #[default]
        Lower = 1 => "lower",
        Low = 2 => "low",
        Medium = 3 => "medium",
        High = 4 => "high",
        Higher = 5 => "higher",
    }
);

register_enum!(
    /// Top-level power state of the controller.
    SysState {
        #[default]
        Off = 0 => "off",
        On = 1 => "on",
    }
);

register_enum!(
    /// Regulation mode of a flow engine.
    FlowState {
        #[default]
        Auto = 0 => "auto",
        Manual = 1 => "manual",
    }
);

impl ZoneState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<ZoneState> for ZoneRegister {
    fn from(state: ZoneState) -> Self {
        match state {
            ZoneState::Off => Self::Off,
            ZoneState::On => Self::On,
        }
    }
}
