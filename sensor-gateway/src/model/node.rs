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
use crate::model::sensor::SensorRecord;
use serde::{Deserialize, Serialize};

/// Wire representation of a node.
///
/// `sensors` is only honoured when a node is first registered; replacing an
/// existing node keeps the sensors that are already attached to it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node_id: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

impl NodeRecord {
    pub fn new(node_id: &str, available: bool) -> Self {
        Self {
            node_id: node_id.to_string(),
            available,
            description: None,
            sensors: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_sensor(mut self, sensor: SensorRecord) -> Self {
        self.sensors.push(sensor);
        self
    }
}

impl Record for NodeRecord {
    fn is_well_formed(&self) -> bool {
        !self.node_id.is_empty() && self.sensors.iter().all(SensorRecord::is_well_formed)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeRecord;
    use crate::model::codec::Record;

    #[test]
    fn decode_accepts_node_without_sensors() {
        let node = NodeRecord::decode(br#"{"nodeId":"n1","available":true}"#)
            .expect("node should decode");

        assert_eq!(node, NodeRecord::new("n1", true));
    }

    #[test]
    fn decode_rejects_missing_identifier() {
        assert!(NodeRecord::decode(br#"{"nodeId":"","available":true}"#).is_none());
        assert!(NodeRecord::decode(br#"{"available":true}"#).is_none());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(NodeRecord::decode(b"not json").is_none());
        assert!(NodeRecord::decode(b"[]").is_none());
    }
}
