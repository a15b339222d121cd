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

use async_trait::async_trait;
use sensor_gateway::{split_record_array, NodeStore};
use std::fs::{self, canonicalize};
use std::path::PathBuf;
use tracing::debug;
use up_rust::{UCode, UStatus};

/// [`NodeStore`] backed by two JSON files, each holding one array of records.
///
/// The files are re-read on every call, so edits between restarts are picked up.
pub struct NodeStoreStaticFile {
    nodes_file: String,
    sensors_file: String,
}

impl NodeStoreStaticFile {
    pub fn new(nodes_file: String, sensors_file: String) -> Self {
        NodeStoreStaticFile {
            nodes_file,
            sensors_file,
        }
    }

    fn read_records(static_file: &str) -> Result<Vec<Vec<u8>>, UStatus> {
        let static_file = PathBuf::from(static_file);

        debug!("static store file: {static_file:?}");
        let canonicalized_result = canonicalize(static_file);
        debug!("canonicalize: {canonicalized_result:?}");

        let static_file = match canonicalized_result {
            Ok(path) => path,
            Err(e) => {
                return Err(UStatus::fail_with_code(
                    UCode::INVALID_ARGUMENT,
                    format!("Static store file not found: {e:?}"),
                ))
            }
        };

        let data = fs::read(static_file).map_err(|e| {
            UStatus::fail_with_code(
                UCode::INVALID_ARGUMENT,
                format!("Unable to read file: {e:?}"),
            )
        })?;

        let records = split_record_array(&data)?;
        debug!("read {} records", records.len());
        Ok(records)
    }
}

#[async_trait]
impl NodeStore for NodeStoreStaticFile {
    async fn list_nodes(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        Self::read_records(&self.nodes_file)
    }

    async fn list_sensors(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        Self::read_records(&self.sensors_file)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeStoreStaticFile;
    use sensor_gateway::{NodeRecord, NodeStore, Record, SensorRecord};
    use up_rust::UCode;

    const NODES_FILE: &str = "static-configs/nodes.json";
    const SENSORS_FILE: &str = "static-configs/sensors.json";

    #[tokio::test]
    async fn reads_fixture_records_in_file_order() {
        let store = NodeStoreStaticFile::new(NODES_FILE.to_string(), SENSORS_FILE.to_string());

        let nodes: Vec<NodeRecord> = store
            .list_nodes()
            .await
            .expect("nodes fixture should load")
            .iter()
            .filter_map(|raw| NodeRecord::decode(raw))
            .collect();
        let sensors: Vec<SensorRecord> = store
            .list_sensors()
            .await
            .expect("sensors fixture should load")
            .iter()
            .filter_map(|raw| SensorRecord::decode(raw))
            .collect();

        let node_ids: Vec<&str> = nodes.iter().map(|node| node.node_id.as_str()).collect();
        assert_eq!(node_ids, vec!["greenhouse-1", "greenhouse-2"]);
        assert_eq!(sensors.len(), 3);
        assert!(sensors
            .iter()
            .all(|sensor| node_ids.contains(&sensor.node_id.as_str())));
    }

    #[tokio::test]
    async fn missing_file_is_an_invalid_argument() {
        let store = NodeStoreStaticFile::new(
            "static-configs/does-not-exist.json".to_string(),
            SENSORS_FILE.to_string(),
        );

        let status = store.list_nodes().await.expect_err("missing file should fail");

        assert_eq!(status.code.enum_value_or_default(), UCode::INVALID_ARGUMENT);
    }
}
