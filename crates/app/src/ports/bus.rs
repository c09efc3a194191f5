//! Bus client port: typed register access to the controller.
//!
//! Implementations own the transport (serial line, TCP gateway, simulator)
//! and the register-level encode/decode. The application core only sees
//! decoded domain values and [`BusError`]s.

use std::future::Future;

use zonehub_domain::error::BusError;
use zonehub_domain::id::{UnitId, ZoneId};
use zonehub_domain::mode::{
    Efficiency, FlowState, GlobalMode, SysState, ZoneClimMode, ZoneFanMode, ZoneState,
};
use zonehub_domain::zone::ZoneSnapshot;

/// Typed read/write access to a controller.
///
/// Every call is one remote round-trip and may suspend the caller. Timeouts
/// and retries, if any, are the implementation's business.
pub trait BusClient: Send + Sync {
    /// Open the connection.
    fn connect(&mut self) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Whether the connection is currently usable.
    fn connected(&self) -> bool;

    /// Close the connection.
    fn disconnect(&mut self) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Whether the whole system is switched on.
    fn system_status(&self) -> impl Future<Output = Result<SysState, BusError>> + Send;

    /// Switch the whole system on or off.
    fn set_system_status(
        &self,
        state: SysState,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Global operating mode.
    fn global_mode(&self) -> impl Future<Output = Result<GlobalMode, BusError>> + Send;

    /// Write the global operating mode.
    fn set_global_mode(
        &self,
        mode: GlobalMode,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Global efficiency level.
    fn efficiency(&self) -> impl Future<Output = Result<Efficiency, BusError>> + Send;

    /// Write the global efficiency level.
    fn set_efficiency(
        &self,
        efficiency: Efficiency,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Read the snapshot of every zone registered on the controller.
    fn discover_registered_zones(
        &self,
    ) -> impl Future<Output = Result<Vec<ZoneSnapshot>, BusError>> + Send;

    /// Read one zone's snapshot, or `None` when the controller has no zone
    /// registered at `id`.
    fn zone_registered(
        &self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<ZoneSnapshot>, BusError>> + Send;

    /// Measured temperature of a zone, in °C.
    fn area_temp(&self, id: ZoneId) -> impl Future<Output = Result<f32, BusError>> + Send;

    /// Target temperature of a zone, in °C.
    fn area_target_temp(&self, id: ZoneId)
    -> impl Future<Output = Result<f32, BusError>> + Send;

    /// Write a zone's target temperature, in °C.
    fn set_area_target_temp(
        &self,
        id: ZoneId,
        value: f32,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Switch a zone on or off.
    fn set_area_state(
        &self,
        id: ZoneId,
        state: ZoneState,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Write a zone's climate mode.
    fn set_area_clim_mode(
        &self,
        id: ZoneId,
        mode: ZoneClimMode,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Write a zone's fan speed.
    fn set_area_fan_mode(
        &self,
        id: ZoneId,
        mode: ZoneFanMode,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Flow rate of an engine.
    fn flow_engine(&self, id: UnitId) -> impl Future<Output = Result<u16, BusError>> + Send;

    /// Flow regulation state of an engine.
    fn flow_state_engine(
        &self,
        id: UnitId,
    ) -> impl Future<Output = Result<FlowState, BusError>> + Send;

    /// Target temperature of an engine, `0.0` when unset.
    fn order_temp_engine(&self, id: UnitId)
    -> impl Future<Output = Result<f32, BusError>> + Send;
}
