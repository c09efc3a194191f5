//! Controller task — single owner of a [`System`], fed through a channel.
//!
//! Several callers (a refresh loop, a host UI, automations) may want to drive
//! the same controller. Each command on a [`System`] is a read → write →
//! commit sequence spanning one or more bus round-trips, so two commands must
//! never interleave. [`Controller::spawn`] moves the `System` into a tokio task
//! that runs commands strictly one at a time; [`ControllerHandle`] is the
//! cloneable front end.
//!
//! A command runs to completion once received, even if the caller stops
//! waiting for the reply, so a write acknowledged by the controller is always
//! committed locally.

use std::ops::ControlFlow;

use chrono::TimeDelta;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use zonehub_domain::device::DeviceInfo;
use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::ZoneId;
use zonehub_domain::mode::{Efficiency, GlobalMode, SysState, ZoneClimMode, ZoneFanMode};
use zonehub_domain::zone::Zone;

use crate::ports::BusClient;
use crate::services::system::{RefreshReport, System, SystemSnapshot};

type Reply<T> = oneshot::Sender<Result<T, ZoneHubError>>;

enum Command {
    Connect(Reply<()>),
    Connected(oneshot::Sender<bool>),
    Disconnect(oneshot::Sender<()>),
    DeviceInfo(oneshot::Sender<DeviceInfo>),
    Update(oneshot::Sender<RefreshReport>),
    RefreshIfStale(TimeDelta, oneshot::Sender<Option<RefreshReport>>),
    DiscoverZones(Reply<usize>),
    DiscoverUnits(Reply<usize>),
    AddManualZone {
        name: String,
        id: ZoneId,
        reply: Reply<Zone>,
    },
    GetArea(ZoneId, Reply<Zone>),
    UpdateArea(ZoneId, Reply<Zone>),
    SetGlobalMode(GlobalMode, Reply<()>),
    SetEfficiency(Efficiency, Reply<()>),
    SetSysState(SysState, Reply<()>),
    GetAreaTemp(ZoneId, Reply<f32>),
    GetAreaTargetTemp(ZoneId, Reply<f32>),
    SetAreaTargetTemp(ZoneId, f32, Reply<()>),
    SetAreaClimMode(ZoneId, ZoneClimMode, Reply<()>),
    SetAreaFanMode(ZoneId, ZoneFanMode, Reply<()>),
    Snapshot(oneshot::Sender<SystemSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Task owning a [`System`].
pub struct Controller<B> {
    system: System<B>,
    receiver: mpsc::Receiver<Command>,
}

impl<B: BusClient + 'static> Controller<B> {
    /// Move `system` into a new task and return a handle to it.
    ///
    /// `capacity` bounds the number of queued commands; callers wait when the
    /// queue is full. The task ends after [`ControllerHandle::shutdown`] or
    /// once every handle is dropped, and yields the `System` back.
    #[must_use]
    pub fn spawn(system: System<B>, capacity: usize) -> (ControllerHandle, JoinHandle<System<B>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let controller = Self { system, receiver };
        let task = tokio::spawn(controller.run());
        (ControllerHandle { sender }, task)
    }

    async fn run(mut self) -> System<B> {
        while let Some(command) = self.receiver.recv().await {
            if self.handle(command).await.is_break() {
                break;
            }
        }
        tracing::debug!("controller task stopped");
        self.system
    }

    // A dropped reply receiver only means the caller stopped waiting.
    async fn handle(&mut self, command: Command) -> ControlFlow<()> {
        let system = &mut self.system;
        match command {
            Command::Connect(reply) => {
                let _ = reply.send(system.connect().await);
            }
            Command::Connected(reply) => {
                let _ = reply.send(system.connected());
            }
            Command::Disconnect(reply) => {
                system.disconnect().await;
                let _ = reply.send(());
            }
            Command::DeviceInfo(reply) => {
                let _ = reply.send(system.device_info().clone());
            }
            Command::Update(reply) => {
                let _ = reply.send(system.update().await);
            }
            Command::RefreshIfStale(max_age, reply) => {
                let report = if system.needs_refresh(max_age) {
                    Some(system.update().await)
                } else {
                    None
                };
                let _ = reply.send(report);
            }
            Command::DiscoverZones(reply) => {
                let _ = reply.send(system.discover_zones().await);
            }
            Command::DiscoverUnits(reply) => {
                let _ = reply.send(system.discover_units().await);
            }
            Command::AddManualZone { name, id, reply } => {
                let result = system
                    .add_manual_registered_zone(name, id)
                    .await
                    .cloned();
                let _ = reply.send(result);
            }
            Command::GetArea(id, reply) => {
                let _ = reply.send(system.get_area(id).cloned());
            }
            Command::UpdateArea(id, reply) => {
                let result = system.update_area(id).await.cloned();
                let _ = reply.send(result);
            }
            Command::SetGlobalMode(mode, reply) => {
                let _ = reply.send(system.set_global_mode(mode).await);
            }
            Command::SetEfficiency(efficiency, reply) => {
                let _ = reply.send(system.set_efficiency(efficiency).await);
            }
            Command::SetSysState(state, reply) => {
                let _ = reply.send(system.set_sys_state(state).await);
            }
            Command::GetAreaTemp(id, reply) => {
                let _ = reply.send(system.get_area_temp(id).await);
            }
            Command::GetAreaTargetTemp(id, reply) => {
                let _ = reply.send(system.get_area_target_temp(id).await);
            }
            Command::SetAreaTargetTemp(id, temp, reply) => {
                let _ = reply.send(system.set_area_target_temp(id, temp).await);
            }
            Command::SetAreaClimMode(id, mode, reply) => {
                let _ = reply.send(system.set_area_clim_mode(id, mode).await);
            }
            Command::SetAreaFanMode(id, mode, reply) => {
                let _ = reply.send(system.set_area_fan_mode(id, mode).await);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(system.snapshot());
            }
            Command::Shutdown(reply) => {
                system.disconnect().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Cloneable handle to a running [`Controller`].
///
/// Every method fails with [`ZoneHubError::ControllerStopped`] once the task
/// has ended.
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<Command>,
}

impl ControllerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ZoneHubError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| ZoneHubError::ControllerStopped)?;
        response.await.map_err(|_| ZoneHubError::ControllerStopped)
    }

    /// See [`System::connect`].
    ///
    /// # Errors
    ///
    /// Same as [`System::connect`], or [`ZoneHubError::ControllerStopped`].
    pub async fn connect(&self) -> Result<(), ZoneHubError> {
        self.request(Command::Connect).await?
    }

    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] once the task has ended.
    pub async fn connected(&self) -> Result<bool, ZoneHubError> {
        self.request(Command::Connected).await
    }

    /// Close the bus connection and keep the task running, so a later
    /// [`connect`](Self::connect) can reopen it. See [`System::disconnect`].
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] once the task has ended.
    pub async fn disconnect(&self) -> Result<(), ZoneHubError> {
        self.request(Command::Disconnect).await
    }

    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] once the task has ended.
    pub async fn device_info(&self) -> Result<DeviceInfo, ZoneHubError> {
        self.request(Command::DeviceInfo).await
    }

    /// See [`System::update`].
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] once the task has ended.
    pub async fn update(&self) -> Result<RefreshReport, ZoneHubError> {
        self.request(Command::Update).await
    }

    /// Run [`System::update`] only when the last refresh is older than
    /// `max_age`. Returns `None` when the refresh was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] once the task has ended.
    pub async fn refresh_if_stale(
        &self,
        max_age: TimeDelta,
    ) -> Result<Option<RefreshReport>, ZoneHubError> {
        self.request(|reply| Command::RefreshIfStale(max_age, reply))
            .await
    }

    /// See [`System::discover_zones`].
    ///
    /// # Errors
    ///
    /// Same as [`System::discover_zones`], or [`ZoneHubError::ControllerStopped`].
    pub async fn discover_zones(&self) -> Result<usize, ZoneHubError> {
        self.request(Command::DiscoverZones).await?
    }

    /// See [`System::discover_units`].
    ///
    /// # Errors
    ///
    /// Same as [`System::discover_units`], or [`ZoneHubError::ControllerStopped`].
    pub async fn discover_units(&self) -> Result<usize, ZoneHubError> {
        self.request(Command::DiscoverUnits).await?
    }

    /// See [`System::add_manual_registered_zone`].
    ///
    /// # Errors
    ///
    /// Same as [`System::add_manual_registered_zone`], or
    /// [`ZoneHubError::ControllerStopped`].
    pub async fn add_manual_registered_zone(
        &self,
        name: impl Into<String>,
        id: ZoneId,
    ) -> Result<Zone, ZoneHubError> {
        let name = name.into();
        self.request(|reply| Command::AddManualZone { name, id, reply })
            .await?
    }

    /// Copy of the local zone with `id`. See [`System::get_area`].
    ///
    /// # Errors
    ///
    /// Same as [`System::get_area`], or [`ZoneHubError::ControllerStopped`].
    pub async fn get_area(&self, id: ZoneId) -> Result<Zone, ZoneHubError> {
        self.request(|reply| Command::GetArea(id, reply)).await?
    }

    /// See [`System::update_area`].
    ///
    /// # Errors
    ///
    /// Same as [`System::update_area`], or [`ZoneHubError::ControllerStopped`].
    pub async fn update_area(&self, id: ZoneId) -> Result<Zone, ZoneHubError> {
        self.request(|reply| Command::UpdateArea(id, reply)).await?
    }

    /// See [`System::set_global_mode`].
    ///
    /// # Errors
    ///
    /// Same as [`System::set_global_mode`], or [`ZoneHubError::ControllerStopped`].
    pub async fn set_global_mode(&self, mode: GlobalMode) -> Result<(), ZoneHubError> {
        self.request(|reply| Command::SetGlobalMode(mode, reply))
            .await?
    }

    /// See [`System::set_efficiency`].
    ///
    /// # Errors
    ///
    /// Same as [`System::set_efficiency`], or [`ZoneHubError::ControllerStopped`].
    pub async fn set_efficiency(&self, efficiency: Efficiency) -> Result<(), ZoneHubError> {
        self.request(|reply| Command::SetEfficiency(efficiency, reply))
            .await?
    }

    /// See [`System::set_sys_state`].
    ///
    /// # Errors
    ///
    /// Same as [`System::set_sys_state`], or [`ZoneHubError::ControllerStopped`].
    pub async fn set_sys_state(&self, state: SysState) -> Result<(), ZoneHubError> {
        self.request(|reply| Command::SetSysState(state, reply))
            .await?
    }

    /// See [`System::get_area_temp`].
    ///
    /// # Errors
    ///
    /// Same as [`System::get_area_temp`], or [`ZoneHubError::ControllerStopped`].
    pub async fn get_area_temp(&self, id: ZoneId) -> Result<f32, ZoneHubError> {
        self.request(|reply| Command::GetAreaTemp(id, reply))
            .await?
    }

    /// See [`System::get_area_target_temp`].
    ///
    /// # Errors
    ///
    /// Same as [`System::get_area_target_temp`], or
    /// [`ZoneHubError::ControllerStopped`].
    pub async fn get_area_target_temp(&self, id: ZoneId) -> Result<f32, ZoneHubError> {
        self.request(|reply| Command::GetAreaTargetTemp(id, reply))
            .await?
    }

    /// See [`System::set_area_target_temp`].
    ///
    /// # Errors
    ///
    /// Same as [`System::set_area_target_temp`], or
    /// [`ZoneHubError::ControllerStopped`].
    pub async fn set_area_target_temp(&self, id: ZoneId, temp: f32) -> Result<(), ZoneHubError> {
        self.request(|reply| Command::SetAreaTargetTemp(id, temp, reply))
            .await?
    }

    /// See [`System::set_area_clim_mode`].
    ///
    /// # Errors
    ///
    /// Same as [`System::set_area_clim_mode`], or
    /// [`ZoneHubError::ControllerStopped`].
    pub async fn set_area_clim_mode(
        &self,
        id: ZoneId,
        mode: ZoneClimMode,
    ) -> Result<(), ZoneHubError> {
        self.request(|reply| Command::SetAreaClimMode(id, mode, reply))
            .await?
    }

    /// See [`System::set_area_fan_mode`].
    ///
    /// # Errors
    ///
    /// Same as [`System::set_area_fan_mode`], or
    /// [`ZoneHubError::ControllerStopped`].
    pub async fn set_area_fan_mode(
        &self,
        id: ZoneId,
        mode: ZoneFanMode,
    ) -> Result<(), ZoneHubError> {
        self.request(|reply| Command::SetAreaFanMode(id, mode, reply))
            .await?
    }

    /// Serializable copy of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] once the task has ended.
    pub async fn snapshot(&self) -> Result<SystemSnapshot, ZoneHubError> {
        self.request(Command::Snapshot).await
    }

    /// Disconnect the bus and stop the task. Queued commands sent before the
    /// shutdown still run first.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::ControllerStopped`] if the task had already
    /// ended.
    pub async fn shutdown(&self) -> Result<(), ZoneHubError> {
        self.request(Command::Shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBus, Op, snapshot, zone_id};
    use zonehub_domain::device::DeviceInfo;
    use zonehub_domain::id::DeviceId;
    use zonehub_domain::mode::ZoneState;

    fn spawn(bus: FakeBus) -> (ControllerHandle, JoinHandle<System<FakeBus>>) {
        let system = System::new(bus, DeviceInfo::new("Koolnova", DeviceId::new()));
        Controller::spawn(system, 8)
    }

    fn two_zones() -> FakeBus {
        FakeBus::with_zones([
            snapshot(1, "Living Room", ZoneState::On),
            snapshot(2, "Bedroom", ZoneState::Off),
        ])
    }

    #[tokio::test]
    async fn should_run_commands_through_the_task() {
        let (handle, task) = spawn(two_zones());
        handle.connect().await.unwrap();
        assert!(handle.connected().await.unwrap());
        assert_eq!(handle.discover_zones().await.unwrap(), 2);

        handle
            .set_area_clim_mode(zone_id(2), ZoneClimMode::Cool)
            .await
            .unwrap();
        handle.set_global_mode(GlobalMode::Heat).await.unwrap();

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.global_mode, GlobalMode::Heat);
        assert_eq!(snap.zones[1].state(), ZoneState::On);
        assert_eq!(snap.zones[1].clim_mode(), ZoneClimMode::Cool);

        handle.shutdown().await.unwrap();
        let system = task.await.unwrap();
        assert!(!system.connected());
    }

    #[tokio::test]
    async fn should_serialize_concurrent_commands() {
        let (handle, task) = spawn(two_zones());
        handle.connect().await.unwrap();
        handle.discover_zones().await.unwrap();

        let a = handle.clone();
        let b = handle.clone();
        let (first, second) = tokio::join!(
            a.set_area_clim_mode(zone_id(2), ZoneClimMode::Cool),
            b.set_area_clim_mode(zone_id(2), ZoneClimMode::Heat),
        );
        first.unwrap();
        second.unwrap();

        handle.shutdown().await.unwrap();
        let system = task.await.unwrap();
        let power_on_writes = system
            .client()
            .calls()
            .into_iter()
            .filter(|call| *call == Call::SetAreaState(2, ZoneState::On))
            .count();
        assert_eq!(power_on_writes, 1);
    }

    #[tokio::test]
    async fn should_propagate_command_errors() {
        let (handle, _task) = spawn(two_zones());
        handle.connect().await.unwrap();
        handle.discover_zones().await.unwrap();

        let result = handle.set_area_fan_mode(zone_id(2), ZoneFanMode::High).await;
        assert!(matches!(result, Err(ZoneHubError::ZonePoweredOff(_))));

        let result = handle.add_manual_registered_zone("Living Room", zone_id(1)).await;
        assert!(matches!(result, Err(ZoneHubError::ZoneAlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn should_return_updated_zone_copy() {
        let bus = two_zones();
        bus.update_zone(1, |z| z.real_temp = 23.5);
        let (handle, _task) = spawn(bus);
        handle.connect().await.unwrap();
        handle.discover_zones().await.unwrap();

        let zone = handle.update_area(zone_id(1)).await.unwrap();
        assert!((zone.real_temp() - 23.5).abs() < f32::EPSILON);
        assert!((handle.get_area_temp(zone_id(1)).await.unwrap() - 23.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn should_skip_refresh_when_recent() {
        let (handle, _task) = spawn(two_zones());
        handle.connect().await.unwrap();

        let first = handle.refresh_if_stale(TimeDelta::minutes(5)).await.unwrap();
        let second = handle.refresh_if_stale(TimeDelta::minutes(5)).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn should_report_refresh_failures_through_handle() {
        let bus = two_zones();
        bus.fail(Op::Efficiency);
        let (handle, _task) = spawn(bus);
        handle.connect().await.unwrap();

        let report = handle.update().await.unwrap();
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn should_reconnect_after_disconnect() {
        let (handle, task) = spawn(two_zones());
        handle.connect().await.unwrap();

        handle.disconnect().await.unwrap();
        assert!(!handle.connected().await.unwrap());

        handle.connect().await.unwrap();
        assert!(handle.connected().await.unwrap());
        assert_eq!(handle.discover_zones().await.unwrap(), 2);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn should_return_zone_copy_by_id() {
        let (handle, _task) = spawn(two_zones());
        handle.connect().await.unwrap();
        handle.discover_zones().await.unwrap();

        let zone = handle.get_area(zone_id(2)).await.unwrap();
        assert_eq!(zone.name(), "Bedroom");
        assert_eq!(zone.state(), ZoneState::Off);

        let result = handle.get_area(zone_id(9)).await;
        assert!(matches!(result, Err(ZoneHubError::Lookup(_))));
    }

    #[tokio::test]
    async fn should_expose_device_info() {
        let id = DeviceId::new();
        let system = System::new(two_zones(), DeviceInfo::new("Ground floor", id));
        let (handle, _task) = Controller::spawn(system, 8);

        let info = handle.device_info().await.unwrap();

        assert_eq!(info.name, "Ground floor");
        assert_eq!(info.identifier, id);
        assert_eq!(info.manufacturer, "Koolnova");
    }

    #[tokio::test]
    async fn should_fail_with_stopped_after_shutdown() {
        let (handle, task) = spawn(two_zones());
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let result = handle.set_sys_state(SysState::On).await;
        assert!(matches!(result, Err(ZoneHubError::ControllerStopped)));
    }
}
