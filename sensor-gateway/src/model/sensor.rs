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

use crate::model::codec::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire representation of a sensor.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    pub code: String,
    pub node_id: String,
    pub available: bool,
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Configured reading, interpreted by the [`SampleGenerator`](crate::SampleGenerator).
    #[serde(default)]
    pub value: Value,
    /// Per-sensor sampling period; the gateway default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}

impl SensorRecord {
    pub fn new(code: &str, node_id: &str, available: bool) -> Self {
        Self {
            code: code.to_string(),
            node_id: node_id.to_string(),
            available,
            kind: String::new(),
            value: Value::Null,
            interval_ms: None,
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

impl Record for SensorRecord {
    fn is_well_formed(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Payload of the sensor-availability topic.
///
/// Only `code` and `available` are meaningful; `nodeId` may be supplied to move
/// the sensor while re-activating it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorAvailability {
    pub code: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl SensorAvailability {
    pub fn new(code: &str, available: bool) -> Self {
        Self {
            code: code.to_string(),
            available,
            node_id: None,
        }
    }

    /// Builds the replacement record used when the availability change re-activates a sensor.
    pub(crate) fn apply_to(&self, current: &SensorRecord) -> SensorRecord {
        let mut record = current.clone();
        record.available = self.available;
        if let Some(node_id) = self.node_id.as_ref().filter(|node_id| !node_id.is_empty()) {
            record.node_id = node_id.clone();
        }
        record
    }
}

impl Record for SensorAvailability {
    fn is_well_formed(&self) -> bool {
        !self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{SensorAvailability, SensorRecord};
    use crate::model::codec::Record;
    use serde_json::json;

    #[test]
    fn decode_reads_type_and_interval() {
        let sensor = SensorRecord::decode(
            br#"{"code":"s1","nodeId":"n1","available":true,"type":"temperature","value":21.5,"intervalMs":250}"#,
        )
        .expect("sensor should decode");

        assert_eq!(
            sensor,
            SensorRecord::new("s1", "n1", true)
                .with_kind("temperature")
                .with_value(json!(21.5))
                .with_interval_ms(250)
        );
    }

    #[test]
    fn decode_rejects_missing_availability() {
        assert!(SensorRecord::decode(br#"{"code":"s1","nodeId":"n1"}"#).is_none());
    }

    #[test]
    fn availability_keeps_current_fields_and_overrides_node_when_given() {
        let current = SensorRecord::new("s1", "n1", false)
            .with_kind("humidity")
            .with_value(json!(40));

        let reactivated = SensorAvailability::new("s1", true).apply_to(&current);
        assert!(reactivated.available);
        assert_eq!(reactivated.node_id, "n1");
        assert_eq!(reactivated.kind, "humidity");

        let moved = SensorAvailability {
            node_id: Some("n2".to_string()),
            ..SensorAvailability::new("s1", true)
        }
        .apply_to(&current);
        assert_eq!(moved.node_id, "n2");
    }

    #[test]
    fn availability_decodes_without_node() {
        let update = SensorAvailability::decode(br#"{"code":"s1","available":false}"#)
            .expect("availability should decode");

        assert_eq!(update, SensorAvailability::new("s1", false));
    }
}
