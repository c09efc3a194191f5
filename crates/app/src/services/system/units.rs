//! Flow engine sweep.

use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::UnitId;
use zonehub_domain::unit::Unit;

use super::System;
use crate::ports::BusClient;

impl<B: BusClient> System<B> {
    /// Read every flow engine and replace the local units.
    ///
    /// Units are replaced only when every engine was read and validated.
    ///
    /// # Errors
    ///
    /// - [`ZoneHubError::ClientNotConnected`] when the bus is down.
    /// - [`ZoneHubError::RemoteReadFailed`] when a read fails or an engine
    ///   reports a value outside its range.
    #[tracing::instrument(skip(self))]
    pub async fn discover_units(&mut self) -> Result<usize, ZoneHubError> {
        self.ensure_connected()?;

        let mut units = Vec::new();
        for id in UnitId::all() {
            tracing::debug!(unit = %id, "reading flow engine");
            let flow_engine = self
                .client
                .flow_engine(id)
                .await
                .map_err(|err| ZoneHubError::read("engine flow", err))?;
            let flow_state = self
                .client
                .flow_state_engine(id)
                .await
                .map_err(|err| ZoneHubError::read("engine flow state", err))?;
            let order_temp = self
                .client
                .order_temp_engine(id)
                .await
                .map_err(|err| ZoneHubError::read("engine order temperature", err))?;

            let unit = Unit::builder(id)
                .flow_engine(flow_engine)
                .flow_state(flow_state)
                .order_temp(order_temp)
                .build()
                .map_err(|err| ZoneHubError::read("engine", err.into()))?;
            units.push(unit);
        }

        tracing::info!(count = units.len(), "flow engines read");
        self.units = units;
        Ok(self.units.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBus, Op};
    use zonehub_domain::device::DeviceInfo;
    use zonehub_domain::id::DeviceId;
    use zonehub_domain::limits::NUM_OF_ENGINES;

    async fn connected() -> System<FakeBus> {
        let mut sys = System::new(
            FakeBus::default(),
            DeviceInfo::new("Koolnova", DeviceId::new()),
        );
        sys.connect().await.unwrap();
        sys
    }

    #[tokio::test]
    async fn should_read_every_engine() {
        let mut sys = connected().await;

        let count = sys.discover_units().await.unwrap();

        assert_eq!(count, usize::from(NUM_OF_ENGINES));
        let first = &sys.units()[0];
        assert_eq!(first.unit_id().get(), 1);
        assert_eq!(first.flow_engine(), 3);
        assert!(!first.has_order_temp());
        assert!(sys.units()[1].has_order_temp());
        assert_eq!(
            &sys.client().calls()[..3],
            &[
                Call::FlowEngine(1),
                Call::FlowStateEngine(1),
                Call::OrderTempEngine(1),
            ]
        );
    }

    #[tokio::test]
    async fn should_keep_units_when_an_engine_read_fails() {
        let mut sys = connected().await;
        sys.discover_units().await.unwrap();
        sys.client().fail(Op::FlowEngine);

        let result = sys.discover_units().await;

        assert!(matches!(result, Err(ZoneHubError::RemoteReadFailed { .. })));
        assert_eq!(sys.units().len(), usize::from(NUM_OF_ENGINES));
    }

    #[tokio::test]
    async fn should_refuse_unit_sweep_while_disconnected() {
        let mut sys = System::new(
            FakeBus::default(),
            DeviceInfo::new("Koolnova", DeviceId::new()),
        );
        let result = sys.discover_units().await;
        assert!(matches!(
            result,
            Err(ZoneHubError::ClientNotConnected { .. })
        ));
        assert!(sys.units().is_empty());
    }
}
