//! Zone — one climate-controlled area served by the controller.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::ZoneId;
use crate::limits::{MAX_TEMP_ORDER, MIN_TEMP_ORDER, is_valid_zone_order_temp};
use crate::mode::{ZoneClimMode, ZoneFanMode, ZoneRegister, ZoneState};

/// A climate-controlled area with its own power flag, fan speed, climate mode,
/// and target temperature.
///
/// Fields are private so the target temperature can only move through
/// [`Zone::set_order_temp`], which enforces
/// `MIN_TEMP_ORDER ≤ order_temp ≤ MAX_TEMP_ORDER`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    id: ZoneId,
    name: String,
    state: ZoneState,
    register: ZoneRegister,
    fan_mode: ZoneFanMode,
    clim_mode: ZoneClimMode,
    real_temp: f32,
    order_temp: f32,
}

/// Everything the controller reports about one registered zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub id: ZoneId,
    pub name: String,
    pub state: ZoneState,
    pub register: ZoneRegister,
    pub fan: ZoneFanMode,
    pub clim: ZoneClimMode,
    pub real_temp: f32,
    pub order_temp: f32,
}

/// Check a zone target temperature.
///
/// # Errors
///
/// Returns [`ValidationError::OrderTempOutOfRange`] when `value` is outside
/// `[MIN_TEMP_ORDER, MAX_TEMP_ORDER]` or not a number.
pub fn validate_order_temp(value: f32) -> Result<f32, ValidationError> {
    if is_valid_zone_order_temp(value) {
        Ok(value)
    } else {
        Err(ValidationError::OrderTempOutOfRange {
            value,
            min: MIN_TEMP_ORDER,
            max: MAX_TEMP_ORDER,
        })
    }
}

impl Zone {
    /// Create a builder for the zone at `id`.
    #[must_use]
    pub fn builder(id: ZoneId) -> ZoneBuilder {
        ZoneBuilder::new(id)
    }

    /// Build a zone from a controller snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OrderTempOutOfRange`] if the reported target
    /// temperature is outside the zone range.
    pub fn from_snapshot(snapshot: ZoneSnapshot) -> Result<Self, ValidationError> {
        Self::builder(snapshot.id)
            .name(snapshot.name)
            .state(snapshot.state)
            .register(snapshot.register)
            .fan_mode(snapshot.fan)
            .clim_mode(snapshot.clim)
            .real_temp(snapshot.real_temp)
            .order_temp(snapshot.order_temp)
            .build()
    }

    /// Overwrite every remote-observed field from `snapshot`.
    ///
    /// The name and id are kept. Nothing changes unless the whole snapshot is
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OrderTempOutOfRange`] if the reported target
    /// temperature is outside the zone range.
    pub fn apply_snapshot(&mut self, snapshot: &ZoneSnapshot) -> Result<(), ValidationError> {
        let order_temp = validate_order_temp(snapshot.order_temp)?;
        self.state = snapshot.state;
        self.register = snapshot.register;
        self.fan_mode = snapshot.fan;
        self.clim_mode = snapshot.clim;
        self.real_temp = snapshot.real_temp;
        self.order_temp = order_temp;
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Power flag as tracked locally.
    #[must_use]
    pub fn state(&self) -> ZoneState {
        self.state
    }

    pub fn set_state(&mut self, state: ZoneState) {
        self.state = state;
    }

    /// Raw on/off flag last read from the zone's register.
    #[must_use]
    pub fn register(&self) -> ZoneRegister {
        self.register
    }

    pub fn set_register(&mut self, register: ZoneRegister) {
        self.register = register;
    }

    #[must_use]
    pub fn fan_mode(&self) -> ZoneFanMode {
        self.fan_mode
    }

    pub fn set_fan_mode(&mut self, fan_mode: ZoneFanMode) {
        self.fan_mode = fan_mode;
    }

    #[must_use]
    pub fn clim_mode(&self) -> ZoneClimMode {
        self.clim_mode
    }

    pub fn set_clim_mode(&mut self, clim_mode: ZoneClimMode) {
        self.clim_mode = clim_mode;
    }

    /// Measured temperature, in °C.
    #[must_use]
    pub fn real_temp(&self) -> f32 {
        self.real_temp
    }

    pub fn set_real_temp(&mut self, real_temp: f32) {
        self.real_temp = real_temp;
    }

    /// Target temperature, in °C.
    #[must_use]
    pub fn order_temp(&self) -> f32 {
        self.order_temp
    }

    /// Set the target temperature.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OrderTempOutOfRange`] and keeps the previous
    /// value when `order_temp` is outside the zone range.
    pub fn set_order_temp(&mut self, order_temp: f32) -> Result<(), ValidationError> {
        self.order_temp = validate_order_temp(order_temp)?;
        Ok(())
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "zone {} ({}): {} fan={} clim={} real={:.1} order={:.1}",
            self.id,
            self.name,
            self.state,
            self.fan_mode,
            self.clim_mode,
            self.real_temp,
            self.order_temp,
        )
    }
}

/// Step-by-step builder for [`Zone`].
#[derive(Debug)]
pub struct ZoneBuilder {
    id: ZoneId,
    name: Option<String>,
    state: ZoneState,
    register: ZoneRegister,
    fan_mode: ZoneFanMode,
    clim_mode: ZoneClimMode,
    real_temp: f32,
    order_temp: Option<f32>,
}

impl ZoneBuilder {
    fn new(id: ZoneId) -> Self {
        Self {
            id,
            name: None,
            state: ZoneState::default(),
            register: ZoneRegister::default(),
            fan_mode: ZoneFanMode::default(),
            clim_mode: ZoneClimMode::default(),
            real_temp: 0.0,
            order_temp: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: ZoneState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn register(mut self, register: ZoneRegister) -> Self {
        self.register = register;
        self
    }

    #[must_use]
    pub fn fan_mode(mut self, fan_mode: ZoneFanMode) -> Self {
        self.fan_mode = fan_mode;
        self
    }

    #[must_use]
    pub fn clim_mode(mut self, clim_mode: ZoneClimMode) -> Self {
        self.clim_mode = clim_mode;
        self
    }

    #[must_use]
    pub fn real_temp(mut self, real_temp: f32) -> Self {
        self.real_temp = real_temp;
        self
    }

    #[must_use]
    pub fn order_temp(mut self, order_temp: f32) -> Self {
        self.order_temp = Some(order_temp);
        self
    }

    /// Consume the builder, validate, and return a [`Zone`].
    ///
    /// A missing name defaults to `"Zone <id>"`; a missing target temperature
    /// defaults to [`MIN_TEMP_ORDER`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OrderTempOutOfRange`] if the target
    /// temperature is outside the zone range.
    pub fn build(self) -> Result<Zone, ValidationError> {
        let order_temp = validate_order_temp(self.order_temp.unwrap_or(MIN_TEMP_ORDER))?;
        Ok(Zone {
            id: self.id,
            name: self.name.unwrap_or_else(|| format!("Zone {}", self.id)),
            state: self.state,
            register: self.register,
            fan_mode: self.fan_mode,
            clim_mode: self.clim_mode,
            real_temp: self.real_temp,
            order_temp,
        })
    }
}
