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

//! Node-update handling.

use super::{NodeReconciliation, Reconciler};
use crate::model::node::NodeRecord;
use crate::observability::events;
use crate::producer::handle::ProducerSlot;
use crate::registry::entry::Node;
use crate::registry::keyed_lock::EntityKey;
use tracing::{debug, info};

const COMPONENT: &str = "node_replacement";

impl Reconciler {
    /// Registers a new node or replaces an existing one.
    ///
    /// A replaced node keeps the sensors already attached to it, including their
    /// running producers and histories; `record.sensors` is ignored. Only the
    /// node producer is restarted.
    pub(crate) async fn replace_node(&self, record: NodeRecord) -> NodeReconciliation {
        let node_id = record.node_id.clone();
        let _node_guard = self.locks.lock(EntityKey::node(&node_id)).await;

        let previous_producer = {
            let mut registry = self.registry.lock().await;
            match registry.lookup_node_mut(&node_id) {
                Some(node) => node.producer.begin_drain(),
                None => {
                    let sensors = record.sensors.len();
                    registry.upsert_node(Node::from_record(record));
                    info!(
                        event = events::NODE_REGISTERED,
                        component = COMPONENT,
                        node_id = node_id.as_str(),
                        sensors,
                        "registered new node; it starts with the next gateway start"
                    );
                    return NodeReconciliation::Registered;
                }
            }
        };

        info!(
            event = events::NODE_REPLACE_START,
            component = COMPONENT,
            node_id = node_id.as_str(),
            was_running = previous_producer.is_some(),
            "replacing node"
        );
        if let Some(handle) = previous_producer {
            handle.stop().await;
        }

        let available = record.available;
        {
            let mut registry = self.registry.lock().await;
            let replacement = match registry.remove_node(&node_id) {
                Some(previous) => Node::replacing(record, previous),
                None => Node::from_record(record),
            };
            registry.upsert_node(replacement);
        }

        let started = available && self.start_node_locked(&node_id).await;
        info!(
            event = events::NODE_REPLACE_OK,
            component = COMPONENT,
            node_id = node_id.as_str(),
            available,
            started,
            "node replaced"
        );
        NodeReconciliation::Replaced { started }
    }

    /// Starts the node producer and every available, idle sensor of the node.
    ///
    /// The caller must hold the node key. Returns whether the node producer is
    /// running afterwards.
    pub(super) async fn start_node_locked(&self, node_id: &str) -> bool {
        let sensor_codes: Vec<String> = {
            let mut registry = self.registry.lock().await;
            if self.is_halted() {
                return false;
            }
            let Some(node) = registry.lookup_node_mut(node_id) else {
                return false;
            };
            if !node.record.available {
                return false;
            }
            if node.producer.is_idle() {
                let handle = self.spawn_node_producer(node);
                info!(
                    event = events::NODE_START,
                    component = COMPONENT,
                    node_id,
                    producer_id = handle.producer_id(),
                    "node producer started"
                );
                node.producer = ProducerSlot::Running(handle);
            }
            node.sensors
                .iter()
                .filter(|sensor| sensor.record.available && sensor.producer.is_idle())
                .map(|sensor| sensor.code().to_string())
                .collect()
        };

        for code in sensor_codes {
            let _sensor_guard = self.locks.lock(EntityKey::sensor(&code)).await;
            let mut registry = self.registry.lock().await;
            if self.is_halted() {
                break;
            }
            let Some(node) = registry.lookup_node_mut(node_id) else {
                break;
            };
            if !node.record.available {
                break;
            }
            let Some(sensor) = node.sensor_mut(&code) else {
                debug!(
                    event = events::SENSOR_START_WITHHELD,
                    component = COMPONENT,
                    node_id,
                    sensor_code = code.as_str(),
                    "sensor moved away before it could be started"
                );
                continue;
            };
            if !sensor.record.available || !sensor.producer.is_idle() {
                continue;
            }

            let handle = self.spawn_sample_producer(sensor);
            info!(
                event = events::SENSOR_START,
                component = COMPONENT,
                node_id,
                sensor_code = code.as_str(),
                producer_id = handle.producer_id(),
                "sensor producer started"
            );
            sensor.producer = ProducerSlot::Running(handle);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crate::model::node::NodeRecord;
    use crate::model::sensor::SensorRecord;
    use crate::reconcile::test_support::reconciler;
    use crate::reconcile::NodeReconciliation;
    use crate::registry::snapshot::LifecycleState;

    #[tokio::test]
    async fn new_node_is_registered_but_not_started() {
        let reconciler = reconciler();

        let outcome = reconciler
            .replace_node(NodeRecord::new("n1", true).with_sensor(SensorRecord::new("s1", "n1", true)))
            .await;

        assert_eq!(outcome, NodeReconciliation::Registered);
        let node = reconciler.node_snapshot("n1").await.expect("n1 registered");
        assert_eq!(node.state, LifecycleState::Stopped);
        assert_eq!(node.sensors[0].state, LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn replacing_unavailable_node_stops_only_the_node_producer() {
        let reconciler = reconciler();
        reconciler
            .replace_node(NodeRecord::new("n1", true).with_sensor(SensorRecord::new("s1", "n1", true)))
            .await;
        reconciler.start_all().await;

        let outcome = reconciler.replace_node(NodeRecord::new("n1", false)).await;

        assert_eq!(outcome, NodeReconciliation::Replaced { started: false });
        let node = reconciler.node_snapshot("n1").await.expect("n1 registered");
        assert!(!node.available);
        assert_eq!(node.state, LifecycleState::Stopped);
        assert_eq!(node.sensors.len(), 1);
        assert_eq!(node.sensors[0].state, LifecycleState::Running);

        reconciler.stop_all().await;
    }
}
