//! Virtual controller configuration.

use serde::Deserialize;
use zonehub_domain::id::ZoneId;
use zonehub_domain::limits::NUM_OF_ENGINES;
use zonehub_domain::mode::{
    Efficiency, FlowState, GlobalMode, SysState, ZoneClimMode, ZoneFanMode, ZoneRegister,
    ZoneState,
};
use zonehub_domain::zone::ZoneSnapshot;

/// Initial register contents of the simulated controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    pub sys_state: SysState,
    pub global_mode: GlobalMode,
    pub efficiency: Efficiency,
    /// Zones registered on the controller.
    pub zones: Vec<VirtualZoneConfig>,
    /// Flow engines, addressed by position (first entry is engine 1).
    pub engines: Vec<VirtualEngineConfig>,
}

/// One registered zone.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualZoneConfig {
    pub id: ZoneId,
    pub name: String,
    #[serde(default)]
    pub state: ZoneState,
    #[serde(default)]
    pub fan: ZoneFanMode,
    #[serde(default)]
    pub clim: ZoneClimMode,
    #[serde(default = "default_real_temp")]
    pub real_temp: f32,
    #[serde(default = "default_order_temp")]
    pub order_temp: f32,
}

/// One flow engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VirtualEngineConfig {
    pub flow: u16,
    pub state: FlowState,
    pub order_temp: f32,
}

fn default_real_temp() -> f32 {
    21.0
}

fn default_order_temp() -> f32 {
    22.0
}

impl VirtualZoneConfig {
    pub(crate) fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
            register: ZoneRegister::from(self.state),
            fan: self.fan,
            clim: self.clim,
            real_temp: self.real_temp,
            order_temp: self.order_temp,
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        let seeds = [("Living Room", ZoneState::On), ("Bedroom", ZoneState::Off)];
        let zones = ZoneId::all()
            .zip(seeds)
            .map(|(id, (name, state))| VirtualZoneConfig {
                id,
                name: name.to_string(),
                state,
                fan: if state.is_on() {
                    ZoneFanMode::Auto
                } else {
                    ZoneFanMode::Off
                },
                clim: ZoneClimMode::Heat,
                real_temp: default_real_temp(),
                order_temp: default_order_temp(),
            })
            .collect();
        Self {
            sys_state: SysState::On,
            global_mode: GlobalMode::Heat,
            efficiency: Efficiency::Medium,
            zones,
            engines: (0..NUM_OF_ENGINES)
                .map(|_| VirtualEngineConfig::default())
                .collect(),
        }
    }
}

impl Default for VirtualEngineConfig {
    fn default() -> Self {
        Self {
            flow: 5,
            state: FlowState::Auto,
            order_temp: 0.0,
        }
    }
}
