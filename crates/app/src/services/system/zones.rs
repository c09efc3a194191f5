//! Zone discovery, registration, refresh, and per-zone commands.

use zonehub_domain::error::{BusError, LookupError, ZoneHubError};
use zonehub_domain::id::ZoneId;
use zonehub_domain::mode::{ZoneClimMode, ZoneFanMode, ZoneState};
use zonehub_domain::zone::{Zone, validate_order_temp};

use super::System;
use crate::ports::BusClient;

impl<B: BusClient> System<B> {
    /// Position of the zone with `id`, by id equality.
    fn zone_index(&self, id: ZoneId) -> Result<usize, LookupError> {
        let mut found = self
            .zones
            .iter()
            .enumerate()
            .filter(|(_, zone)| zone.id() == id)
            .map(|(idx, _)| idx);
        let idx = found.next().ok_or(LookupError::ZoneNotFound(id))?;
        if found.next().is_some() {
            return Err(LookupError::MultipleZonesWithSameId(id));
        }
        Ok(idx)
    }

    fn zone_mut(&mut self, id: ZoneId) -> Result<&mut Zone, LookupError> {
        let idx = self.zone_index(id)?;
        Ok(&mut self.zones[idx])
    }

    /// Replace the local zones with every zone registered on the controller.
    ///
    /// Returns the number of zones found. On error the local collection is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// - [`ZoneHubError::ClientNotConnected`] when the bus is down.
    /// - [`ZoneHubError::RemoteReadFailed`] when the read fails or a snapshot
    ///   does not validate.
    /// - [`LookupError::MultipleZonesWithSameId`] when the controller reports
    ///   an id twice.
    #[tracing::instrument(skip(self))]
    pub async fn discover_zones(&mut self) -> Result<usize, ZoneHubError> {
        self.ensure_connected()?;
        let snapshots = self
            .client
            .discover_registered_zones()
            .await
            .map_err(|err| ZoneHubError::read("registered zones", err))?;

        let mut zones: Vec<Zone> = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            if zones.iter().any(|zone| zone.id() == snapshot.id) {
                return Err(LookupError::MultipleZonesWithSameId(snapshot.id).into());
            }
            let zone = Zone::from_snapshot(snapshot)
                .map_err(|err| ZoneHubError::read("registered zones", err.into()))?;
            zones.push(zone);
        }

        tracing::info!(count = zones.len(), "zones discovered");
        self.zones = zones;
        Ok(self.zones.len())
    }

    /// Register a single zone under a user-supplied name after checking that
    /// the controller knows it.
    ///
    /// # Errors
    ///
    /// - [`ZoneHubError::ClientNotConnected`] when the bus is down.
    /// - [`ZoneHubError::ZoneAlreadyRegistered`] when `id` is already local
    ///   (no remote call is made).
    /// - [`ZoneHubError::ZoneNotRegistered`] when the controller has no zone
    ///   at `id`.
    /// - [`ZoneHubError::RemoteReadFailed`] when the read fails or the
    ///   snapshot does not validate.
    #[tracing::instrument(skip(self, name), fields(zone = %id))]
    pub async fn add_manual_registered_zone(
        &mut self,
        name: impl Into<String>,
        id: ZoneId,
    ) -> Result<&Zone, ZoneHubError> {
        self.ensure_connected()?;
        if self.zones.iter().any(|zone| zone.id() == id) {
            tracing::error!("zone is already registered");
            return Err(ZoneHubError::ZoneAlreadyRegistered(id));
        }

        let Some(mut snapshot) = self
            .client
            .zone_registered(id)
            .await
            .map_err(|err| ZoneHubError::read("zone registration", err))?
        else {
            tracing::error!("zone is not registered on the controller");
            return Err(ZoneHubError::ZoneNotRegistered(id));
        };

        snapshot.name = name.into();
        let zone = Zone::from_snapshot(snapshot)
            .map_err(|err| ZoneHubError::read("zone registration", err.into()))?;
        tracing::debug!(%zone, "zone registered");
        self.zones.push(zone);
        Ok(&self.zones[self.zones.len() - 1])
    }

    /// Look up a zone by id.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ZoneNotFound`] when no zone has this id.
    pub fn get_area(&self, id: ZoneId) -> Result<&Zone, ZoneHubError> {
        let idx = self.zone_index(id)?;
        Ok(&self.zones[idx])
    }

    /// Re-read one zone from the controller and overwrite its remote-observed
    /// fields.
    ///
    /// # Errors
    ///
    /// - [`LookupError::ZoneNotFound`] before any remote call when `id` is
    ///   not local.
    /// - [`ZoneHubError::ZoneNotRegistered`] when the controller no longer
    ///   knows the zone.
    /// - [`ZoneHubError::RemoteReadFailed`] when the read fails or the
    ///   snapshot does not validate or belongs to another zone. The zone is
    ///   unchanged in every error case.
    #[tracing::instrument(skip(self))]
    pub async fn update_area(&mut self, id: ZoneId) -> Result<&Zone, ZoneHubError> {
        let idx = self.zone_index(id)?;
        let snapshot = match self.client.zone_registered(id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Err(ZoneHubError::ZoneNotRegistered(id)),
            Err(err) => {
                tracing::error!(%err, "failed to read zone");
                return Err(ZoneHubError::read("zone snapshot", err));
            }
        };
        if snapshot.id != id {
            tracing::error!(answered = %snapshot.id, "controller answered for another zone");
            return Err(ZoneHubError::read(
                "zone snapshot",
                BusError::Rejected { register: "zone" },
            ));
        }

        let zone = &mut self.zones[idx];
        zone.apply_snapshot(&snapshot)
            .map_err(|err| ZoneHubError::read("zone snapshot", err.into()))?;
        Ok(zone)
    }

    /// Read a zone's measured temperature and store it locally.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::RemoteReadFailed`] when the read fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_area_temp(&mut self, id: ZoneId) -> Result<f32, ZoneHubError> {
        let temp = self.client.area_temp(id).await.map_err(|err| {
            tracing::error!(%err, "failed to read zone temperature");
            ZoneHubError::read("zone temperature", err)
        })?;
        for zone in self.zones.iter_mut().filter(|zone| zone.id() == id) {
            zone.set_real_temp(temp);
        }
        Ok(temp)
    }

    /// Read a zone's target temperature and store it locally.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneHubError::RemoteReadFailed`] when the read fails or the
    /// controller reports a target outside the zone range.
    #[tracing::instrument(skip(self))]
    pub async fn get_area_target_temp(&mut self, id: ZoneId) -> Result<f32, ZoneHubError> {
        let temp = self.client.area_target_temp(id).await.map_err(|err| {
            tracing::error!(%err, "failed to read zone target temperature");
            ZoneHubError::read("zone target temperature", err)
        })?;
        let temp = validate_order_temp(temp)
            .map_err(|err| ZoneHubError::read("zone target temperature", BusError::from(err)))?;
        for zone in self.zones.iter_mut().filter(|zone| zone.id() == id) {
            zone.set_order_temp(temp)?;
        }
        Ok(temp)
    }

    /// Write a zone's target temperature, then commit it locally.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::OrderTempOutOfRange`](zonehub_domain::error::ValidationError::OrderTempOutOfRange)
    ///   before any remote call.
    /// - [`LookupError::ZoneNotFound`] when `id` is not local.
    /// - [`ZoneHubError::RemoteWriteFailed`] when the write is not
    ///   acknowledged; the zone is unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn set_area_target_temp(&mut self, id: ZoneId, temp: f32) -> Result<(), ZoneHubError> {
        let temp = validate_order_temp(temp)?;
        let idx = self.zone_index(id)?;
        self.client
            .set_area_target_temp(id, temp)
            .await
            .map_err(|err| {
                tracing::error!(%err, "failed to write zone target temperature");
                ZoneHubError::write("zone target temperature", err)
            })?;
        self.zones[idx].set_order_temp(temp)?;
        Ok(())
    }

    /// Change a zone's climate mode.
    ///
    /// [`ZoneClimMode::Off`] powers the zone down and leaves its climate mode
    /// as it was. Any other mode powers a zone that is off back on first,
    /// then writes the mode.
    ///
    /// # Errors
    ///
    /// - [`LookupError::ZoneNotFound`] when `id` is not local.
    /// - [`ZoneHubError::RemoteWriteFailed`] when a write is not
    ///   acknowledged. If the power-on write succeeded but the mode write did
    ///   not, the zone is left on with its previous climate mode.
    #[tracing::instrument(skip(self))]
    pub async fn set_area_clim_mode(
        &mut self,
        id: ZoneId,
        mode: ZoneClimMode,
    ) -> Result<(), ZoneHubError> {
        let idx = self.zone_index(id)?;

        if mode == ZoneClimMode::Off {
            tracing::debug!("powering zone off");
            self.write_area_state(id, ZoneState::Off).await?;
            self.zones[idx].set_state(ZoneState::Off);
            return Ok(());
        }

        if self.zones[idx].state() == ZoneState::Off {
            tracing::debug!("powering zone on before changing climate mode");
            self.write_area_state(id, ZoneState::On).await?;
            self.zones[idx].set_state(ZoneState::On);
        }

        self.client
            .set_area_clim_mode(id, mode)
            .await
            .map_err(|err| {
                tracing::error!(%err, "failed to write zone climate mode");
                ZoneHubError::write("zone climate mode", err)
            })?;
        self.zones[idx].set_clim_mode(mode);
        Ok(())
    }

    async fn write_area_state(&self, id: ZoneId, state: ZoneState) -> Result<(), ZoneHubError> {
        self.client.set_area_state(id, state).await.map_err(|err| {
            tracing::error!(%err, %state, "failed to write zone power state");
            ZoneHubError::write("zone power state", err)
        })
    }

    /// Change a zone's fan speed. The zone must already be on.
    ///
    /// # Errors
    ///
    /// - [`LookupError::ZoneNotFound`] when `id` is not local.
    /// - [`ZoneHubError::ZonePoweredOff`] when the zone is off; nothing is
    ///   written.
    /// - [`ZoneHubError::RemoteWriteFailed`] when the write is not
    ///   acknowledged; the zone is unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn set_area_fan_mode(
        &mut self,
        id: ZoneId,
        mode: ZoneFanMode,
    ) -> Result<(), ZoneHubError> {
        let idx = self.zone_index(id)?;
        if self.zones[idx].state() == ZoneState::Off {
            tracing::warn!("zone is off, cannot change fan speed");
            return Err(ZoneHubError::ZonePoweredOff(id));
        }

        self.client
            .set_area_fan_mode(id, mode)
            .await
            .map_err(|err| {
                tracing::error!(%err, "failed to write zone fan mode");
                ZoneHubError::write("zone fan mode", err)
            })?;
        self.zone_mut(id)?.set_fan_mode(mode);
        Ok(())
    }
}
