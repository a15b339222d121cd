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

//! Sensor-update and availability-activation handling.

use super::{ReconcileError, Reconciler, SensorReconciliation};
use crate::model::sensor::{SensorAvailability, SensorRecord};
use crate::observability::{events, fields};
use crate::producer::handle::ProducerSlot;
use crate::registry::entry::Sensor;
use crate::registry::keyed_lock::EntityKey;
use tracing::info;

const COMPONENT: &str = "sensor_replacement";

impl Reconciler {
    /// Replaces the sensor registered under `record.code` with `record`.
    pub(crate) async fn replace_sensor(
        &self,
        record: SensorRecord,
    ) -> Result<SensorReconciliation, ReconcileError> {
        let _sensor_guard = self.locks.lock(EntityKey::sensor(&record.code)).await;
        self.replace_sensor_locked(record).await
    }

    /// Applies an availability toggle: activation replaces the sensor with its
    /// current record marked available, deactivation stops it in place.
    pub(crate) async fn apply_availability(
        &self,
        update: SensorAvailability,
    ) -> Result<SensorReconciliation, ReconcileError> {
        let _sensor_guard = self.locks.lock(EntityKey::sensor(&update.code)).await;
        if !update.available {
            return self.deactivate_locked(&update.code).await;
        }

        let record = {
            let registry = self.registry.lock().await;
            let (_, sensor) = registry.lookup_sensor_by_code(&update.code).ok_or_else(|| {
                ReconcileError::UnknownSensor {
                    code: update.code.clone(),
                }
            })?;
            update.apply_to(&sensor.record)
        };
        self.replace_sensor_locked(record).await
    }

    /// The caller must hold the sensor key of `record.code`.
    ///
    /// Both references are resolved before anything is cancelled, so an update
    /// naming an unknown node leaves the current sensor running untouched.
    pub(super) async fn replace_sensor_locked(
        &self,
        record: SensorRecord,
    ) -> Result<SensorReconciliation, ReconcileError> {
        let code = record.code.clone();
        let node_id = record.node_id.clone();

        let (previous_node_id, history, previous_producer) = {
            let mut registry = self.registry.lock().await;
            let previous_node_id = match registry.lookup_sensor_by_code(&code) {
                Some((node, _)) => node.id().to_string(),
                None => return Err(ReconcileError::UnknownSensor { code }),
            };
            if registry.lookup_node(&node_id).is_none() {
                return Err(ReconcileError::UnknownNode { node_id, code });
            }
            let Some(sensor) = registry.sensor_mut(&code) else {
                return Err(ReconcileError::UnknownSensor { code });
            };
            (
                previous_node_id,
                sensor.history.clone(),
                sensor.producer.begin_drain(),
            )
        };

        info!(
            event = events::SENSOR_REPLACE_START,
            component = COMPONENT,
            sensor_code = code.as_str(),
            from_node = previous_node_id.as_str(),
            node_id = node_id.as_str(),
            was_running = previous_producer.is_some(),
            "replacing sensor"
        );
        if let Some(handle) = previous_producer {
            handle.stop().await;
        }

        let mut registry = self.registry.lock().await;
        registry.detach_sensor(&previous_node_id, &code);

        let node_available = registry
            .lookup_node(&node_id)
            .is_some_and(|node| node.record.available);
        let sensor_available = record.available;
        if !registry.attach_sensor(Sensor::with_history(record, history)) {
            return Err(ReconcileError::UnknownNode { node_id, code });
        }

        let withheld_reason = if self.is_halted() {
            Some(fields::REASON_GATEWAY_HALTED)
        } else if !node_available {
            Some(fields::REASON_NODE_UNAVAILABLE)
        } else if !sensor_available {
            Some(fields::REASON_SENSOR_UNAVAILABLE)
        } else {
            None
        };

        let started = match (withheld_reason, registry.sensor_mut(&code)) {
            (None, Some(sensor)) => {
                let handle = self.spawn_sample_producer(sensor);
                info!(
                    event = events::SENSOR_START,
                    component = COMPONENT,
                    node_id = node_id.as_str(),
                    sensor_code = code.as_str(),
                    producer_id = handle.producer_id(),
                    "sensor producer started"
                );
                sensor.producer = ProducerSlot::Running(handle);
                true
            }
            (reason, _) => {
                info!(
                    event = events::SENSOR_START_WITHHELD,
                    component = COMPONENT,
                    node_id = node_id.as_str(),
                    sensor_code = code.as_str(),
                    reason = reason.unwrap_or(fields::NONE),
                    "sensor replaced without starting a producer"
                );
                false
            }
        };
        drop(registry);

        info!(
            event = events::SENSOR_REPLACE_OK,
            component = COMPONENT,
            node_id = node_id.as_str(),
            sensor_code = code.as_str(),
            started,
            "sensor replaced"
        );
        Ok(SensorReconciliation::Replaced { node_id, started })
    }
}
