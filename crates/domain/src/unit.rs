//! Unit — a flow engine pushing air to one or more zones.

use serde::Serialize;

use crate::error::ValidationError;
use crate::id::UnitId;
use crate::limits::{
    FLOW_ENGINE_VAL_MAX, FLOW_ENGINE_VAL_MIN, UNIT_MAX_TEMP_ORDER, UNIT_MIN_TEMP_ORDER,
};
use crate::mode::FlowState;

/// A flow engine and its regulation settings.
///
/// `order_temp == 0.0` means the engine has no target temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    unit_id: UnitId,
    flow_engine: u16,
    flow_state: FlowState,
    order_temp: f32,
}

fn validate_flow_engine(value: u16) -> Result<u16, ValidationError> {
    if (FLOW_ENGINE_VAL_MIN..=FLOW_ENGINE_VAL_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::FlowEngineOutOfRange {
            value,
            min: FLOW_ENGINE_VAL_MIN,
            max: FLOW_ENGINE_VAL_MAX,
        })
    }
}

fn validate_unit_order_temp(value: f32) -> Result<f32, ValidationError> {
    if value == 0.0 || (UNIT_MIN_TEMP_ORDER..=UNIT_MAX_TEMP_ORDER).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OrderTempOutOfRange {
            value,
            min: UNIT_MIN_TEMP_ORDER,
            max: UNIT_MAX_TEMP_ORDER,
        })
    }
}

impl Unit {
    /// Create a builder for the engine at `unit_id`.
    #[must_use]
    pub fn builder(unit_id: UnitId) -> UnitBuilder {
        UnitBuilder {
            unit_id,
            flow_engine: FLOW_ENGINE_VAL_MIN,
            flow_state: FlowState::default(),
            order_temp: 0.0,
        }
    }

    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// Move the unit to another engine address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUnitId`] when `raw` is zero or above
    /// `NUM_OF_ENGINES`.
    pub fn set_unit_id(&mut self, raw: u8) -> Result<(), ValidationError> {
        self.unit_id = UnitId::new(raw)?;
        Ok(())
    }

    #[must_use]
    pub fn flow_engine(&self) -> u16 {
        self.flow_engine
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::FlowEngineOutOfRange`] when `value` is
    /// outside `[FLOW_ENGINE_VAL_MIN, FLOW_ENGINE_VAL_MAX]`.
    pub fn set_flow_engine(&mut self, value: u16) -> Result<(), ValidationError> {
        self.flow_engine = validate_flow_engine(value)?;
        Ok(())
    }

    #[must_use]
    pub fn flow_state(&self) -> FlowState {
        self.flow_state
    }

    pub fn set_flow_state(&mut self, flow_state: FlowState) {
        self.flow_state = flow_state;
    }

    #[must_use]
    pub fn order_temp(&self) -> f32 {
        self.order_temp
    }

    /// Whether the engine has a target temperature.
    #[must_use]
    pub fn has_order_temp(&self) -> bool {
        self.order_temp > 0.0
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::OrderTempOutOfRange`] when `value` is
    /// non-zero and outside `[UNIT_MIN_TEMP_ORDER, UNIT_MAX_TEMP_ORDER]`.
    pub fn set_order_temp(&mut self, value: f32) -> Result<(), ValidationError> {
        self.order_temp = validate_unit_order_temp(value)?;
        Ok(())
    }
}

/// Step-by-step builder for [`Unit`].
#[derive(Debug)]
pub struct UnitBuilder {
    unit_id: UnitId,
    flow_engine: u16,
    flow_state: FlowState,
    order_temp: f32,
}

impl UnitBuilder {
    #[must_use]
    pub fn flow_engine(mut self, flow_engine: u16) -> Self {
        self.flow_engine = flow_engine;
        self
    }

    #[must_use]
    pub fn flow_state(mut self, flow_state: FlowState) -> Self {
        self.flow_state = flow_state;
        self
    }

    #[must_use]
    pub fn order_temp(mut self, order_temp: f32) -> Self {
        self.order_temp = order_temp;
        self
    }

    /// Consume the builder, validate, and return a [`Unit`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found among the flow rate and the
    /// target temperature.
    pub fn build(self) -> Result<Unit, ValidationError> {
        Ok(Unit {
            unit_id: self.unit_id,
            flow_engine: validate_flow_engine(self.flow_engine)?,
            flow_state: self.flow_state,
            order_temp: validate_unit_order_temp(self.order_temp)?,
        })
    }
}
