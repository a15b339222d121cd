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

use crate::model::sensor::SensorRecord;
use serde_json::Value;

/// Produces the value payload of each sample for a sensor.
///
/// Per-sensor-type synthesis lives behind this trait so the gateway only deals
/// with lifecycle; `sequence` restarts at zero for every producer generation.
pub trait SampleGenerator: Send + Sync {
    fn generate(&self, sensor: &SensorRecord, sequence: u64) -> Value;
}

/// Emits the reading configured on the sensor record.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfiguredValueGenerator;

impl SampleGenerator for ConfiguredValueGenerator {
    fn generate(&self, sensor: &SensorRecord, _sequence: u64) -> Value {
        sensor.value.clone()
    }
}
