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

use super::{ReconcileError, Reconciler, SensorReconciliation};
use crate::observability::events;
use tracing::info;

const COMPONENT: &str = "sensor_deactivation";

impl Reconciler {
    /// The caller must hold the sensor key of `code`.
    ///
    /// Marks the sensor unavailable in place and stops its producer. The sensor
    /// stays attached to its node with its history intact.
    pub(super) async fn deactivate_locked(
        &self,
        code: &str,
    ) -> Result<SensorReconciliation, ReconcileError> {
        let producer = {
            let mut registry = self.registry.lock().await;
            let Some(sensor) = registry.sensor_mut(code) else {
                return Err(ReconcileError::UnknownSensor {
                    code: code.to_string(),
                });
            };
            sensor.record.available = false;
            sensor.producer.begin_drain()
        };

        let was_running = producer.is_some();
        if let Some(handle) = producer {
            handle.stop().await;
            if let Some(sensor) = self.registry.lock().await.sensor_mut(code) {
                sensor.producer.finish_drain();
            }
        }

        info!(
            event = events::SENSOR_DEACTIVATE_OK,
            component = COMPONENT,
            sensor_code = code,
            was_running,
            "sensor deactivated"
        );
        Ok(SensorReconciliation::Deactivated)
    }
}
