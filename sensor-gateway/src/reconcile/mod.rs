/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Reconciliation engine.
//!
//! Applies node updates, sensor updates and availability toggles to the
//! registry and to the producer tasks behind it. Every reconciliation holds the
//! key lock of the entity it changes for its whole duration, so updates for
//! the same node or sensor are applied one at a time and in arrival order.
//!
//! The registry mutex is only held for short, synchronous critical sections.
//! Producers are drained (cancel + join) with the registry unlocked while the
//! affected slot reads `Draining`.

mod error;
mod lifecycle;
mod node_replacement;
mod sensor_deactivation;
mod sensor_replacement;

pub use error::{NodeReconciliation, ReconcileError, SensorReconciliation};

use crate::config::GatewayConfig;
use crate::egress::publisher::SamplePublisher;
use crate::producer::generator::SampleGenerator;
use crate::producer::handle::ProducerHandle;
use crate::producer::node_producer::NodeProducer;
use crate::producer::sample_producer::SampleProducer;
use crate::registry::entry::{Node, Sensor};
use crate::registry::keyed_lock::KeyedLocks;
use crate::registry::snapshot::{
    NodeSnapshot, PendingNodeSnapshot, PendingSensorSnapshot, SensorSnapshot,
};
use crate::registry::table::Registry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) struct Reconciler {
    registry: Mutex<Registry>,
    /// Set by `stop_all`, cleared by `start_all`. Read and written with the registry locked.
    halted: AtomicBool,
    locks: KeyedLocks,
    publisher: Arc<SamplePublisher>,
    generator: Arc<dyn SampleGenerator>,
    config: GatewayConfig,
}

impl Reconciler {
    pub(crate) fn new(
        publisher: Arc<SamplePublisher>,
        generator: Arc<dyn SampleGenerator>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            halted: AtomicBool::new(false),
            locks: KeyedLocks::default(),
            publisher,
            generator,
            config,
        }
    }

    /// Direct registry access for the bootstrap loader, which runs before any producer.
    pub(crate) fn registry(&self) -> &Mutex<Registry> {
        &self.registry
    }

    fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    fn spawn_sample_producer(&self, sensor: &Sensor) -> ProducerHandle {
        SampleProducer::new(
            sensor.record.clone(),
            sensor.history.clone(),
            self.publisher.clone(),
            self.generator.clone(),
            self.config.sample_interval(),
        )
        .spawn()
    }

    fn spawn_node_producer(&self, node: &Node) -> ProducerHandle {
        NodeProducer::new(node.id(), self.config.node_heartbeat_interval()).spawn()
    }

    pub(crate) async fn node_snapshot(&self, node_id: &str) -> Option<NodeSnapshot> {
        let pending = {
            let registry = self.registry.lock().await;
            PendingNodeSnapshot::capture(registry.lookup_node(node_id)?)
        };
        Some(pending.resolve().await)
    }

    pub(crate) async fn sensor_snapshot(&self, code: &str) -> Option<SensorSnapshot> {
        let pending = {
            let registry = self.registry.lock().await;
            let (_, sensor) = registry.lookup_sensor_by_code(code)?;
            PendingSensorSnapshot::capture(sensor)
        };
        Some(pending.resolve().await)
    }

    pub(crate) async fn node_snapshots(&self) -> Vec<NodeSnapshot> {
        let pending: Vec<PendingNodeSnapshot> = {
            let registry = self.registry.lock().await;
            registry
                .node_ids()
                .iter()
                .filter_map(|node_id| registry.lookup_node(node_id))
                .map(PendingNodeSnapshot::capture)
                .collect()
        };

        let mut snapshots = Vec::with_capacity(pending.len());
        for node in pending {
            snapshots.push(node.resolve().await);
        }
        snapshots
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Reconciler;
    use crate::config::GatewayConfig;
    use crate::egress::publisher::SamplePublisher;
    use crate::egress::session::{DeliveryGuarantee, PublishSessionBuilder};
    use crate::model::sensor::SensorRecord;
    use crate::producer::generator::SampleGenerator;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use up_rust::{UCode, UStatus, UTransport, UUri};

    /// Drops every sample at the session layer; history is still recorded.
    struct OfflineSessions;

    #[async_trait]
    impl PublishSessionBuilder for OfflineSessions {
        async fn open(
            &self,
            _client_id: &str,
            _delivery: DeliveryGuarantee,
        ) -> Result<Box<dyn UTransport>, UStatus> {
            Err(UStatus::fail_with_code(UCode::UNAVAILABLE, "offline"))
        }
    }

    /// Tags each value with the record's configured value so generations are distinguishable.
    struct TaggingGenerator;

    impl SampleGenerator for TaggingGenerator {
        fn generate(&self, sensor: &SensorRecord, sequence: u64) -> Value {
            json!({"gen": sensor.value, "seq": sequence})
        }
    }

    pub(crate) fn reconciler() -> Reconciler {
        let topic = UUri::try_from_parts("gw", 0x5ba0, 0x1, 0x8004).expect("topic should build");
        let publisher = SamplePublisher::new(topic, Arc::new(OfflineSessions), 0, Duration::ZERO);
        Reconciler::new(
            Arc::new(publisher),
            Arc::new(TaggingGenerator),
            GatewayConfig::default().with_sample_interval(Duration::from_millis(5)),
        )
    }
}
