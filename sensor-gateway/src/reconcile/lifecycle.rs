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

//! Gateway-wide start and stop.

use super::Reconciler;
use crate::producer::handle::ProducerHandle;
use crate::registry::keyed_lock::EntityKey;
use futures::future::join_all;
use std::sync::atomic::Ordering;

impl Reconciler {
    /// Starts every available node together with its available sensors.
    /// Returns the number of nodes whose producer is running afterwards.
    pub(crate) async fn start_all(&self) -> usize {
        let node_ids = {
            let registry = self.registry.lock().await;
            self.halted.store(false, Ordering::SeqCst);
            registry.node_ids()
        };

        let mut started = 0;
        for node_id in node_ids {
            let _node_guard = self.locks.lock(EntityKey::node(&node_id)).await;
            if self.start_node_locked(&node_id).await {
                started += 1;
            }
        }
        started
    }

    /// Stops every running producer and keeps new ones from starting until the
    /// next `start_all`. Returns the number of producers that were stopped.
    pub(crate) async fn stop_all(&self) -> usize {
        let handles: Vec<ProducerHandle> = {
            let mut registry = self.registry.lock().await;
            self.halted.store(true, Ordering::SeqCst);
            let mut handles = Vec::new();
            for node in registry.nodes_mut() {
                handles.extend(node.producer.take());
                for sensor in node.sensors.iter_mut() {
                    handles.extend(sensor.producer.take());
                }
            }
            handles
        };

        let stopped = handles.len();
        join_all(handles.into_iter().map(ProducerHandle::stop)).await;
        stopped
    }
}

#[cfg(test)]
mod tests {
    use crate::model::node::NodeRecord;
    use crate::model::sensor::{SensorAvailability, SensorRecord};
    use crate::reconcile::test_support::reconciler;
    use crate::registry::snapshot::LifecycleState;

    #[tokio::test]
    async fn start_all_skips_unavailable_nodes_and_sensors() {
        let reconciler = reconciler();
        reconciler
            .replace_node(
                NodeRecord::new("n1", true)
                    .with_sensor(SensorRecord::new("s1", "n1", true))
                    .with_sensor(SensorRecord::new("s2", "n1", false)),
            )
            .await;
        reconciler
            .replace_node(NodeRecord::new("n2", false).with_sensor(SensorRecord::new("s3", "n2", true)))
            .await;

        assert_eq!(reconciler.start_all().await, 1);

        let snapshots = reconciler.node_snapshots().await;
        let states: Vec<(String, LifecycleState)> = snapshots
            .iter()
            .flat_map(|node| node.sensors.iter().map(|s| (s.code.clone(), s.state)))
            .collect();
        assert_eq!(
            states,
            vec![
                ("s1".to_string(), LifecycleState::Running),
                ("s2".to_string(), LifecycleState::Stopped),
                ("s3".to_string(), LifecycleState::Stopped),
            ]
        );

        assert_eq!(reconciler.stop_all().await, 2);
    }

    #[tokio::test]
    async fn nothing_starts_after_stop_all() {
        let reconciler = reconciler();
        reconciler
            .replace_node(NodeRecord::new("n1", true).with_sensor(SensorRecord::new("s1", "n1", false)))
            .await;
        reconciler.start_all().await;
        reconciler.stop_all().await;

        reconciler
            .apply_availability(SensorAvailability::new("s1", true))
            .await
            .expect("activation should apply");

        let sensor = reconciler.sensor_snapshot("s1").await.expect("s1 registered");
        assert!(sensor.available);
        assert_eq!(sensor.state, LifecycleState::Stopped);
    }
}
