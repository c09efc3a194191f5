//! Controller limits and transport defaults.

/// Lowest target temperature a zone accepts, in °C.
pub const MIN_TEMP_ORDER: f32 = 15.0;
/// Highest target temperature a zone accepts, in °C.
pub const MAX_TEMP_ORDER: f32 = 30.0;

/// Lowest target temperature of a flow engine once set, in °C.
pub const UNIT_MIN_TEMP_ORDER: f32 = 15.0;
/// Highest target temperature of a flow engine, in °C.
pub const UNIT_MAX_TEMP_ORDER: f32 = 30.0;

/// Number of zone addresses on the controller.
pub const NUM_OF_ZONES: u8 = 16;
/// Number of flow engines on the controller.
pub const NUM_OF_ENGINES: u8 = 4;

pub const FLOW_ENGINE_VAL_MIN: u16 = 1;
pub const FLOW_ENGINE_VAL_MAX: u16 = 15;

/// Modbus slave address of the controller.
pub const DEFAULT_ADDR: u8 = 49;
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_BYTESIZE: u8 = 8;
pub const DEFAULT_STOPBITS: u8 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 1;

/// Whether `value` is an acceptable zone target temperature.
#[must_use]
pub fn is_valid_zone_order_temp(value: f32) -> bool {
    (MIN_TEMP_ORDER..=MAX_TEMP_ORDER).contains(&value)
}
