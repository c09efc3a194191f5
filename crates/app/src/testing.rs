//! Recording bus client used by the unit tests of this crate.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use zonehub_domain::error::BusError;
use zonehub_domain::id::{UnitId, ZoneId};
use zonehub_domain::mode::{
    Efficiency, FlowState, GlobalMode, SysState, ZoneClimMode, ZoneFanMode, ZoneRegister,
    ZoneState,
};
use zonehub_domain::zone::ZoneSnapshot;

use crate::ports::BusClient;

/// One remote call, in the order it was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SystemStatus,
    SetSystemStatus(SysState),
    GlobalMode,
    SetGlobalMode(GlobalMode),
    Efficiency,
    SetEfficiency(Efficiency),
    Discover,
    ZoneRegistered(u8),
    AreaTemp(u8),
    AreaTargetTemp(u8),
    SetAreaTargetTemp(u8, f32),
    SetAreaState(u8, ZoneState),
    SetAreaClimMode(u8, ZoneClimMode),
    SetAreaFanMode(u8, ZoneFanMode),
    FlowEngine(u8),
    FlowStateEngine(u8),
    OrderTempEngine(u8),
}

/// Discriminant of a [`Call`], used to pick which calls fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SystemStatus,
    SetSystemStatus,
    GlobalMode,
    SetGlobalMode,
    Efficiency,
    SetEfficiency,
    Discover,
    ZoneRegistered,
    AreaTemp,
    AreaTargetTemp,
    SetAreaTargetTemp,
    SetAreaState,
    SetAreaClimMode,
    SetAreaFanMode,
    FlowEngine,
}

#[derive(Default)]
struct Inner {
    sys_state: SysState,
    global_mode: GlobalMode,
    efficiency: Efficiency,
    zones: BTreeMap<u8, ZoneSnapshot>,
    /// Answer to `discover_registered_zones` instead of `zones`, duplicates
    /// included.
    discovery: Option<Vec<ZoneSnapshot>>,
    /// Answer to `zone_registered` for the given raw id, whatever it holds.
    registered: BTreeMap<u8, ZoneSnapshot>,
    failing: HashSet<Op>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeBus {
    connected: bool,
    refuse_connection: bool,
    inner: Mutex<Inner>,
}

pub fn zone_id(raw: u8) -> ZoneId {
    ZoneId::new(raw).unwrap()
}

pub fn snapshot(raw: u8, name: &str, state: ZoneState) -> ZoneSnapshot {
    ZoneSnapshot {
        id: zone_id(raw),
        name: name.to_string(),
        state,
        register: ZoneRegister::from(state),
        fan: ZoneFanMode::Auto,
        clim: ZoneClimMode::Heat,
        real_temp: 21.0,
        order_temp: 22.0,
    }
}

impl FakeBus {
    pub fn with_zones(zones: impl IntoIterator<Item = ZoneSnapshot>) -> Self {
        let bus = Self::default();
        {
            let mut inner = bus.lock();
            for zone in zones {
                inner.zones.insert(zone.id.get(), zone);
            }
        }
        bus
    }

    pub fn answer_discovery_with(&self, zones: Vec<ZoneSnapshot>) {
        self.lock().discovery = Some(zones);
    }

    pub fn answer_zone_registered_with(&self, raw: u8, zone: ZoneSnapshot) {
        self.lock().registered.insert(raw, zone);
    }

    pub fn refusing_connection() -> Self {
        Self {
            refuse_connection: true,
            ..Self::default()
        }
    }

    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn set_remote_global_mode(&self, mode: GlobalMode) {
        self.lock().global_mode = mode;
    }

    pub fn update_zone(&self, raw: u8, f: impl FnOnce(&mut ZoneSnapshot)) {
        if let Some(zone) = self.lock().zones.get_mut(&raw) {
            f(zone);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, call: Call, op: Op) -> Result<(), BusError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.failing.contains(&op) {
            return Err(BusError::Timeout);
        }
        Ok(())
    }

    fn zone_mut<T>(&self, id: ZoneId, f: impl FnOnce(&mut ZoneSnapshot) -> T) -> Result<T, BusError> {
        self.lock()
            .zones
            .get_mut(&id.get())
            .map(f)
            .ok_or(BusError::Rejected { register: "zone" })
    }
}

impl BusClient for FakeBus {
    async fn connect(&mut self) -> Result<(), BusError> {
        if !self.refuse_connection {
            self.connected = true;
        }
        Ok(())
    }

    fn connected(&self) -> bool {
        self.connected
    }

    async fn disconnect(&mut self) -> Result<(), BusError> {
        self.connected = false;
        Err(BusError::Timeout)
    }

    async fn system_status(&self) -> Result<SysState, BusError> {
        self.record(Call::SystemStatus, Op::SystemStatus)?;
        Ok(self.lock().sys_state)
    }

    async fn set_system_status(&self, state: SysState) -> Result<(), BusError> {
        self.record(Call::SetSystemStatus(state), Op::SetSystemStatus)?;
        self.lock().sys_state = state;
        Ok(())
    }

    async fn global_mode(&self) -> Result<GlobalMode, BusError> {
        self.record(Call::GlobalMode, Op::GlobalMode)?;
        Ok(self.lock().global_mode)
    }

    async fn set_global_mode(&self, mode: GlobalMode) -> Result<(), BusError> {
        self.record(Call::SetGlobalMode(mode), Op::SetGlobalMode)?;
        self.lock().global_mode = mode;
        Ok(())
    }

    async fn efficiency(&self) -> Result<Efficiency, BusError> {
        self.record(Call::Efficiency, Op::Efficiency)?;
        Ok(self.lock().efficiency)
    }

    async fn set_efficiency(&self, efficiency: Efficiency) -> Result<(), BusError> {
        self.record(Call::SetEfficiency(efficiency), Op::SetEfficiency)?;
        self.lock().efficiency = efficiency;
        Ok(())
    }

    async fn discover_registered_zones(&self) -> Result<Vec<ZoneSnapshot>, BusError> {
        self.record(Call::Discover, Op::Discover)?;
        let inner = self.lock();
        Ok(match &inner.discovery {
            Some(zones) => zones.clone(),
            None => inner.zones.values().cloned().collect(),
        })
    }

    async fn zone_registered(&self, id: ZoneId) -> Result<Option<ZoneSnapshot>, BusError> {
        self.record(Call::ZoneRegistered(id.get()), Op::ZoneRegistered)?;
        let inner = self.lock();
        Ok(inner
            .registered
            .get(&id.get())
            .or_else(|| inner.zones.get(&id.get()))
            .cloned())
    }

    async fn area_temp(&self, id: ZoneId) -> Result<f32, BusError> {
        self.record(Call::AreaTemp(id.get()), Op::AreaTemp)?;
        self.zone_mut(id, |z| z.real_temp)
    }

    async fn area_target_temp(&self, id: ZoneId) -> Result<f32, BusError> {
        self.record(Call::AreaTargetTemp(id.get()), Op::AreaTargetTemp)?;
        self.zone_mut(id, |z| z.order_temp)
    }

    async fn set_area_target_temp(&self, id: ZoneId, value: f32) -> Result<(), BusError> {
        self.record(Call::SetAreaTargetTemp(id.get(), value), Op::SetAreaTargetTemp)?;
        self.zone_mut(id, |z| z.order_temp = value)
    }

    async fn set_area_state(&self, id: ZoneId, state: ZoneState) -> Result<(), BusError> {
        self.record(Call::SetAreaState(id.get(), state), Op::SetAreaState)?;
        self.zone_mut(id, |z| {
            z.state = state;
            z.register = state.into();
        })
    }

    async fn set_area_clim_mode(&self, id: ZoneId, mode: ZoneClimMode) -> Result<(), BusError> {
        self.record(Call::SetAreaClimMode(id.get(), mode), Op::SetAreaClimMode)?;
        self.zone_mut(id, |z| z.clim = mode)
    }

    async fn set_area_fan_mode(&self, id: ZoneId, mode: ZoneFanMode) -> Result<(), BusError> {
        self.record(Call::SetAreaFanMode(id.get(), mode), Op::SetAreaFanMode)?;
        self.zone_mut(id, |z| z.fan = mode)
    }

    async fn flow_engine(&self, id: UnitId) -> Result<u16, BusError> {
        self.record(Call::FlowEngine(id.get()), Op::FlowEngine)?;
        Ok(u16::from(id.get()) + 2)
    }

    async fn flow_state_engine(&self, id: UnitId) -> Result<FlowState, BusError> {
        self.lock().calls.push(Call::FlowStateEngine(id.get()));
        Ok(FlowState::Auto)
    }

    async fn order_temp_engine(&self, id: UnitId) -> Result<f32, BusError> {
        self.lock().calls.push(Call::OrderTempEngine(id.get()));
        Ok(if id.get() == 1 { 0.0 } else { 20.0 })
    }
}
