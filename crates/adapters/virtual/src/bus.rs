//! In-memory controller behind the [`BusClient`] port.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use zonehub_app::ports::BusClient;
use zonehub_domain::error::BusError;
use zonehub_domain::id::{UnitId, ZoneId};
use zonehub_domain::limits::is_valid_zone_order_temp;
use zonehub_domain::mode::{
    Efficiency, FlowState, GlobalMode, SysState, ZoneClimMode, ZoneFanMode, ZoneRegister,
    ZoneState,
};
use zonehub_domain::zone::ZoneSnapshot;

use crate::config::{VirtualConfig, VirtualEngineConfig, VirtualZoneConfig};

/// A bus request, as recorded in the call journal and targeted by faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    SystemStatus,
    SetSystemStatus,
    GlobalMode,
    SetGlobalMode,
    Efficiency,
    SetEfficiency,
    DiscoverZones,
    ZoneRegistered,
    AreaTemp,
    AreaTargetTemp,
    SetAreaTargetTemp,
    SetAreaState,
    SetAreaClimMode,
    SetAreaFanMode,
    FlowEngine,
    FlowStateEngine,
    OrderTempEngine,
}

/// One journaled request. `address` is the zone or engine id, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub address: Option<u8>,
}

impl Call {
    #[must_use]
    pub fn global(operation: Operation) -> Self {
        Self {
            operation,
            address: None,
        }
    }

    #[must_use]
    pub fn addressed(operation: Operation, address: u8) -> Self {
        Self {
            operation,
            address: Some(address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Once,
    Always,
}

#[derive(Debug)]
struct Inner {
    sys_state: SysState,
    global_mode: GlobalMode,
    efficiency: Efficiency,
    zones: BTreeMap<ZoneId, ZoneSnapshot>,
    engines: Vec<VirtualEngineConfig>,
    faults: HashMap<Operation, Fault>,
    calls: Vec<Call>,
}

impl Inner {
    fn zone(&self, id: ZoneId) -> Result<&ZoneSnapshot, BusError> {
        self.zones
            .get(&id)
            .ok_or(BusError::Rejected { register: "zone" })
    }

    fn zone_mut(&mut self, id: ZoneId) -> Result<&mut ZoneSnapshot, BusError> {
        self.zones
            .get_mut(&id)
            .ok_or(BusError::Rejected { register: "zone" })
    }

    fn engine(&self, id: UnitId) -> Result<&VirtualEngineConfig, BusError> {
        self.engines
            .get(usize::from(id.get()) - 1)
            .ok_or(BusError::Rejected { register: "engine" })
    }
}

/// A simulated controller.
///
/// Register contents live behind a mutex so the bus can be shared by
/// reference, the way a real client shares its serial line. Every request is
/// journaled, and any operation can be made to fail once or permanently.
#[derive(Debug)]
pub struct VirtualBus {
    connected: bool,
    inner: Mutex<Inner>,
}

impl Default for VirtualBus {
    fn default() -> Self {
        Self::new(&VirtualConfig::default())
    }
}

impl VirtualBus {
    #[must_use]
    pub fn new(config: &VirtualConfig) -> Self {
        let zones = config
            .zones
            .iter()
            .map(|zone| (zone.id, zone.snapshot()))
            .collect();
        Self {
            connected: false,
            inner: Mutex::new(Inner {
                sys_state: config.sys_state,
                global_mode: config.global_mode,
                efficiency: config.efficiency,
                zones,
                engines: config.engines.clone(),
                faults: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Make the next `operation` fail.
    pub fn fail_next(&self, operation: Operation) {
        self.lock().faults.insert(operation, Fault::Once);
    }

    /// Make every `operation` fail until [`clear_faults`](Self::clear_faults).
    pub fn fail_always(&self, operation: Operation) {
        self.lock().faults.insert(operation, Fault::Always);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current register contents of one zone.
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<ZoneSnapshot> {
        self.lock().zones.get(&id).cloned()
    }

    /// Register a zone on the controller, replacing any previous one.
    pub fn register_zone(&self, zone: &VirtualZoneConfig) {
        self.lock().zones.insert(zone.id, zone.snapshot());
    }

    pub fn unregister_zone(&self, id: ZoneId) {
        self.lock().zones.remove(&id);
    }

    /// Simulate a new sensor reading.
    pub fn set_real_temp(&self, id: ZoneId, value: f32) {
        if let Some(zone) = self.lock().zones.get_mut(&id) {
            zone.real_temp = value;
        }
    }

    /// Change the global mode from the controller's own panel.
    pub fn set_panel_global_mode(&self, mode: GlobalMode) {
        self.lock().global_mode = mode;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journal a request, then check the link and injected faults.
    fn request(&self, call: Call) -> Result<MutexGuard<'_, Inner>, BusError> {
        let mut inner = self.lock();
        tracing::trace!(
            operation = ?call.operation,
            address = ?call.address,
            "virtual bus request"
        );
        inner.calls.push(call);

        if call.operation != Operation::Connect && !self.connected {
            return Err(BusError::NotConnected);
        }
        match inner.faults.get(&call.operation).copied() {
            Some(Fault::Once) => {
                inner.faults.remove(&call.operation);
                Err(fault_error(call.operation))
            }
            Some(Fault::Always) => Err(fault_error(call.operation)),
            None => Ok(inner),
        }
    }

    fn zone_request(
        &self,
        operation: Operation,
        id: ZoneId,
    ) -> Result<MutexGuard<'_, Inner>, BusError> {
        self.request(Call::addressed(operation, id.get()))
    }

    fn engine_request(
        &self,
        operation: Operation,
        id: UnitId,
    ) -> Result<MutexGuard<'_, Inner>, BusError> {
        self.request(Call::addressed(operation, id.get()))
    }
}

fn fault_error(operation: Operation) -> BusError {
    tracing::debug!(?operation, "injected bus fault");
    if operation == Operation::Connect {
        BusError::Transport(Box::new(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "virtual controller refused the connection",
        )))
    } else {
        BusError::Timeout
    }
}

impl BusClient for VirtualBus {
    async fn connect(&mut self) -> Result<(), BusError> {
        drop(self.request(Call::global(Operation::Connect))?);
        self.connected = true;
        tracing::debug!("virtual bus connected");
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        self.connected = false;
        tracing::debug!("virtual bus disconnected");
        Ok(())
    }

    async fn system_status(&self) -> Result<SysState, BusError> {
        Ok(self.request(Call::global(Operation::SystemStatus))?.sys_state)
    }

    async fn set_system_status(&self, state: SysState) -> Result<(), BusError> {
        self.request(Call::global(Operation::SetSystemStatus))?
            .sys_state = state;
        Ok(())
    }

    async fn global_mode(&self) -> Result<GlobalMode, BusError> {
        Ok(self.request(Call::global(Operation::GlobalMode))?.global_mode)
    }

    async fn set_global_mode(&self, mode: GlobalMode) -> Result<(), BusError> {
        self.request(Call::global(Operation::SetGlobalMode))?
            .global_mode = mode;
        Ok(())
    }

    async fn efficiency(&self) -> Result<Efficiency, BusError> {
        Ok(self.request(Call::global(Operation::Efficiency))?.efficiency)
    }

    async fn set_efficiency(&self, efficiency: Efficiency) -> Result<(), BusError> {
        self.request(Call::global(Operation::SetEfficiency))?
            .efficiency = efficiency;
        Ok(())
    }

    async fn discover_registered_zones(&self) -> Result<Vec<ZoneSnapshot>, BusError> {
        let inner = self.request(Call::global(Operation::DiscoverZones))?;
        Ok(inner.zones.values().cloned().collect())
    }

    async fn zone_registered(&self, id: ZoneId) -> Result<Option<ZoneSnapshot>, BusError> {
        let inner = self.zone_request(Operation::ZoneRegistered, id)?;
        Ok(inner.zones.get(&id).cloned())
    }

    async fn area_temp(&self, id: ZoneId) -> Result<f32, BusError> {
        let inner = self.zone_request(Operation::AreaTemp, id)?;
        Ok(inner.zone(id)?.real_temp)
    }

    async fn area_target_temp(&self, id: ZoneId) -> Result<f32, BusError> {
        let inner = self.zone_request(Operation::AreaTargetTemp, id)?;
        Ok(inner.zone(id)?.order_temp)
    }

    async fn set_area_target_temp(&self, id: ZoneId, value: f32) -> Result<(), BusError> {
        let mut inner = self.zone_request(Operation::SetAreaTargetTemp, id)?;
        if !is_valid_zone_order_temp(value) {
            return Err(BusError::Rejected {
                register: "zone target temperature",
            });
        }
        inner.zone_mut(id)?.order_temp = value;
        Ok(())
    }

    async fn set_area_state(&self, id: ZoneId, state: ZoneState) -> Result<(), BusError> {
        let mut inner = self.zone_request(Operation::SetAreaState, id)?;
        let zone = inner.zone_mut(id)?;
        zone.state = state;
        zone.register = ZoneRegister::from(state);
        Ok(())
    }

    async fn set_area_clim_mode(&self, id: ZoneId, mode: ZoneClimMode) -> Result<(), BusError> {
        let mut inner = self.zone_request(Operation::SetAreaClimMode, id)?;
        inner.zone_mut(id)?.clim = mode;
        Ok(())
    }

    async fn set_area_fan_mode(&self, id: ZoneId, mode: ZoneFanMode) -> Result<(), BusError> {
        let mut inner = self.zone_request(Operation::SetAreaFanMode, id)?;
        inner.zone_mut(id)?.fan = mode;
        Ok(())
    }

    async fn flow_engine(&self, id: UnitId) -> Result<u16, BusError> {
        let inner = self.engine_request(Operation::FlowEngine, id)?;
        Ok(inner.engine(id)?.flow)
    }

    async fn flow_state_engine(&self, id: UnitId) -> Result<FlowState, BusError> {
        let inner = self.engine_request(Operation::FlowStateEngine, id)?;
        Ok(inner.engine(id)?.state)
    }

    async fn order_temp_engine(&self, id: UnitId) -> Result<f32, BusError> {
        let inner = self.engine_request(Operation::OrderTempEngine, id)?;
        Ok(inner.engine(id)?.order_temp)
    }
}
