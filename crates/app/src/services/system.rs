//! System service — the aggregate root owning the bus client, the zones, and
//! the flow engines of one controller.
//!
//! Every command follows the same order: validate, write to the controller,
//! then commit locally. A failed write returns
//! [`ZoneHubError::RemoteWriteFailed`] and leaves local state as it was, so
//! the model never claims a value the controller did not acknowledge.

mod units;
mod zones;

use chrono::TimeDelta;
use serde::Serialize;
use zonehub_domain::device::DeviceInfo;
use zonehub_domain::error::ZoneHubError;
use zonehub_domain::mode::{Efficiency, GlobalMode, SysState};
use zonehub_domain::time::{Timestamp, is_stale, now};
use zonehub_domain::unit::Unit;
use zonehub_domain::zone::Zone;

use crate::ports::BusClient;

/// One of the controller-wide fields re-read by [`System::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalField {
    SysState,
    GlobalMode,
    Efficiency,
}

/// Outcome of [`System::update`].
///
/// A refresh never fails as a whole: each field whose read failed was reset
/// to its default and is listed in `failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub failed: Vec<GlobalField>,
}

impl RefreshReport {
    /// Whether every field was read from the controller.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Serializable view of a [`System`] for hosts and logs.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub device: DeviceInfo,
    pub sys_state: SysState,
    pub global_mode: GlobalMode,
    pub efficiency: Efficiency,
    pub zones: Vec<Zone>,
    pub units: Vec<Unit>,
    pub last_refresh: Option<Timestamp>,
}

/// In-memory model of one controller, kept in sync through a [`BusClient`].
///
/// Methods that talk to the controller take `&mut self`: one command runs at
/// a time per `System`. Share it across tasks through
/// [`Controller`](crate::controller::Controller).
pub struct System<B> {
    client: B,
    device: DeviceInfo,
    global_mode: GlobalMode,
    efficiency: Efficiency,
    sys_state: SysState,
    zones: Vec<Zone>,
    units: Vec<Unit>,
    last_refresh: Option<Timestamp>,
}

impl<B: BusClient> System<B> {
    /// Create a disconnected system with default global fields and no zones.
    pub fn new(client: B, device: DeviceInfo) -> Self {
        Self {
            client,
            device,
            global_mode: GlobalMode::default(),
            efficiency: Efficiency::default(),
            sys_state: SysState::default(),
            zones: Vec::new(),
            units: Vec::new(),
            last_refresh: None,
        }
    }

    /// The bus client owned by this system.
    pub fn client(&self) -> &B {
        &self.client
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    /// Open the bus connection.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::ClientNotConnected`] when the transport fails
    /// or the client still reports not-connected afterwards.
    #[tracing::instrument(skip(self), fields(device = %self.device.name))]
    pub async fn connect(&mut self) -> Result<(), ZoneHubError> {
        if let Err(err) = self.client.connect().await {
            return Err(ZoneHubError::ClientNotConnected { source: Some(err) });
        }
        if !self.client.connected() {
            return Err(ZoneHubError::ClientNotConnected { source: None });
        }
        tracing::info!("connected to controller");
        Ok(())
    }

    pub fn connected(&self) -> bool {
        self.client.connected()
    }

    /// Close the bus connection. Transport errors are logged, never returned.
    pub async fn disconnect(&mut self) {
        match self.client.disconnect().await {
            Ok(()) => tracing::info!(device = %self.device.name, "disconnected from controller"),
            Err(err) => {
                tracing::warn!(%err, device = %self.device.name, "error while closing bus connection");
            }
        }
    }

    fn ensure_connected(&self) -> Result<(), ZoneHubError> {
        if self.client.connected() {
            Ok(())
        } else {
            Err(ZoneHubError::ClientNotConnected { source: None })
        }
    }

    /// Re-read system state, global mode, and efficiency.
    ///
    /// A failed read does not stop the others; the field falls back to its
    /// default (off / cold / lower) and is reported in the returned
    /// [`RefreshReport`].
    #[tracing::instrument(skip(self))]
    pub async fn update(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();

        tracing::debug!("reading system status");
        self.sys_state = match self.client.system_status().await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(%err, "failed to read system status, assuming off");
                report.failed.push(GlobalField::SysState);
                SysState::default()
            }
        };

        tracing::debug!("reading global mode");
        self.global_mode = match self.client.global_mode().await {
            Ok(mode) => mode,
            Err(err) => {
                tracing::error!(%err, "failed to read global mode, assuming cold");
                report.failed.push(GlobalField::GlobalMode);
                GlobalMode::default()
            }
        };

        tracing::debug!("reading efficiency");
        self.efficiency = match self.client.efficiency().await {
            Ok(efficiency) => efficiency,
            Err(err) => {
                tracing::error!(%err, "failed to read efficiency, assuming lower");
                report.failed.push(GlobalField::Efficiency);
                Efficiency::default()
            }
        };

        self.last_refresh = Some(now());
        report
    }

    /// Time of the last [`update`](Self::update), if any.
    pub fn last_refresh(&self) -> Option<Timestamp> {
        self.last_refresh
    }

    /// Whether the last refresh is missing or older than `max_age`.
    pub fn needs_refresh(&self, max_age: TimeDelta) -> bool {
        is_stale(self.last_refresh, max_age, now())
    }

    pub fn global_mode(&self) -> GlobalMode {
        self.global_mode
    }

    /// Write the global mode, then commit it locally.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::RemoteWriteFailed`] when the controller does
    /// not acknowledge the write; the local value is unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn set_global_mode(&mut self, mode: GlobalMode) -> Result<(), ZoneHubError> {
        self.client
            .set_global_mode(mode)
            .await
            .map_err(|err| ZoneHubError::write("global mode", err))?;
        self.global_mode = mode;
        Ok(())
    }

    pub fn efficiency(&self) -> Efficiency {
        self.efficiency
    }

    /// Write the efficiency profile, then commit it locally.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::RemoteWriteFailed`] when the controller does
    /// not acknowledge the write; the local value is unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn set_efficiency(&mut self, efficiency: Efficiency) -> Result<(), ZoneHubError> {
        self.client
            .set_efficiency(efficiency)
            .await
            .map_err(|err| ZoneHubError::write("efficiency", err))?;
        self.efficiency = efficiency;
        Ok(())
    }

    pub fn sys_state(&self) -> SysState {
        self.sys_state
    }

    /// Write the system power state, then commit it locally.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::RemoteWriteFailed`] when the controller does
    /// not acknowledge the write; the local value is unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn set_sys_state(&mut self, state: SysState) -> Result<(), ZoneHubError> {
        self.client
            .set_system_status(state)
            .await
            .map_err(|err| ZoneHubError::write("system status", err))?;
        self.sys_state = state;
        Ok(())
    }

    /// Zones in discovery/registration order.
    pub fn areas(&self) -> &[Zone] {
        &self.zones
    }

    /// Flow engines found by [`discover_units`](Self::discover_units).
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Copy the current state into a serializable snapshot.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            device: self.device.clone(),
            sys_state: self.sys_state,
            global_mode: self.global_mode,
            efficiency: self.efficiency,
            zones: self.zones.clone(),
            units: self.units.clone(),
            last_refresh: self.last_refresh,
        }
    }
}

impl<B> std::fmt::Debug for System<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("device", &self.device.name)
            .field("global_mode", &self.global_mode)
            .field("efficiency", &self.efficiency)
            .field("sys_state", &self.sys_state)
            .field("zones", &self.zones.len())
            .field("units", &self.units.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBus, Op};
    use zonehub_domain::id::DeviceId;

    fn system(bus: FakeBus) -> System<FakeBus> {
        System::new(bus, DeviceInfo::new("Koolnova", DeviceId::new()))
    }

    async fn connected_system() -> System<FakeBus> {
        let mut sys = system(FakeBus::default());
        sys.connect().await.unwrap();
        sys
    }

    #[tokio::test]
    async fn should_start_with_documented_defaults() {
        let sys = system(FakeBus::default());
        assert_eq!(sys.global_mode(), GlobalMode::Cold);
        assert_eq!(sys.efficiency(), Efficiency::Lower);
        assert_eq!(sys.sys_state(), SysState::Off);
        assert!(sys.areas().is_empty());
        assert!(sys.units().is_empty());
        assert!(sys.needs_refresh(TimeDelta::seconds(30)));
    }

    #[tokio::test]
    async fn should_connect_when_client_reports_connected() {
        let sys = connected_system().await;
        assert!(sys.connected());
    }

    #[tokio::test]
    async fn should_fail_connect_when_client_stays_disconnected() {
        let mut sys = system(FakeBus::refusing_connection());
        let result = sys.connect().await;
        assert!(matches!(
            result,
            Err(ZoneHubError::ClientNotConnected { source: None })
        ));
        assert!(!sys.connected());
    }

    #[tokio::test]
    async fn should_swallow_transport_error_on_disconnect() {
        let mut sys = connected_system().await;
        sys.disconnect().await;
        assert!(!sys.connected());
    }

    #[tokio::test]
    async fn should_read_global_fields_on_update() {
        let mut sys = connected_system().await;
        sys.client().set_remote_global_mode(GlobalMode::Heat);

        let report = sys.update().await;

        assert!(report.is_complete());
        assert_eq!(sys.global_mode(), GlobalMode::Heat);
        assert!(sys.last_refresh().is_some());
        assert!(!sys.needs_refresh(TimeDelta::seconds(30)));
    }

    #[tokio::test]
    async fn should_reset_failed_field_to_default_and_keep_reading_others() {
        let mut sys = connected_system().await;
        sys.set_global_mode(GlobalMode::Heat).await.unwrap();
        sys.set_efficiency(Efficiency::High).await.unwrap();
        sys.client().fail(Op::GlobalMode);
        sys.client().clear_calls();

        let report = sys.update().await;

        assert_eq!(report.failed, vec![GlobalField::GlobalMode]);
        assert_eq!(sys.global_mode(), GlobalMode::Cold);
        assert_eq!(sys.efficiency(), Efficiency::High);
        assert_eq!(
            sys.client().calls(),
            vec![Call::SystemStatus, Call::GlobalMode, Call::Efficiency]
        );
    }

    #[tokio::test]
    async fn should_report_every_failed_field() {
        let mut sys = connected_system().await;
        sys.set_sys_state(SysState::On).await.unwrap();
        sys.client().fail(Op::SystemStatus);
        sys.client().fail(Op::Efficiency);

        let report = sys.update().await;

        assert_eq!(
            report.failed,
            vec![GlobalField::SysState, GlobalField::Efficiency]
        );
        assert_eq!(sys.sys_state(), SysState::Off);
        assert_eq!(sys.efficiency(), Efficiency::Lower);
    }

    #[tokio::test]
    async fn should_commit_global_mode_after_successful_write() {
        let mut sys = connected_system().await;
        sys.set_global_mode(GlobalMode::HeatingFloor).await.unwrap();
        assert_eq!(sys.global_mode(), GlobalMode::HeatingFloor);
        assert_eq!(
            sys.client().calls(),
            vec![Call::SetGlobalMode(GlobalMode::HeatingFloor)]
        );
    }

    #[tokio::test]
    async fn should_keep_global_mode_when_write_fails() {
        let mut sys = connected_system().await;
        sys.client().fail(Op::SetGlobalMode);

        let result = sys.set_global_mode(GlobalMode::Heat).await;

        assert!(matches!(
            result,
            Err(ZoneHubError::RemoteWriteFailed { operation: "global mode", .. })
        ));
        assert_eq!(sys.global_mode(), GlobalMode::Cold);
    }

    #[tokio::test]
    async fn should_keep_efficiency_when_write_fails() {
        let mut sys = connected_system().await;
        sys.client().fail(Op::SetEfficiency);

        let result = sys.set_efficiency(Efficiency::Higher).await;

        assert!(matches!(result, Err(ZoneHubError::RemoteWriteFailed { .. })));
        assert_eq!(sys.efficiency(), Efficiency::Lower);
    }

    #[tokio::test]
    async fn should_keep_sys_state_when_write_fails() {
        let mut sys = connected_system().await;
        sys.client().fail(Op::SetSystemStatus);

        let result = sys.set_sys_state(SysState::On).await;

        assert!(matches!(result, Err(ZoneHubError::RemoteWriteFailed { .. })));
        assert_eq!(sys.sys_state(), SysState::Off);

        sys.client().recover(Op::SetSystemStatus);
        sys.set_sys_state(SysState::On).await.unwrap();
        assert_eq!(sys.sys_state(), SysState::On);
    }

    #[tokio::test]
    async fn should_serialize_snapshot_with_lowercase_modes() {
        let mut sys = connected_system().await;
        sys.set_efficiency(Efficiency::Medium).await.unwrap();

        let json = serde_json::to_value(sys.snapshot()).unwrap();

        assert_eq!(json["efficiency"], "medium");
        assert_eq!(json["global_mode"], "cold");
        assert_eq!(json["device"]["manufacturer"], "Koolnova");
    }
}
