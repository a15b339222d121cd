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

//! One-shot registry population from a [`NodeStore`].

use crate::bootstrap::store::NodeStore;
use crate::model::codec::Record;
use crate::model::node::NodeRecord;
use crate::model::sensor::SensorRecord;
use crate::observability::{events, fields};
use crate::registry::entry::{Node, Sensor};
use crate::registry::table::Registry;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use up_rust::UStatus;

const COMPONENT: &str = "bootstrap_loader";

/// Counts of what a bootstrap run did with the store's records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BootstrapReport {
    pub nodes_loaded: usize,
    /// Malformed node records and duplicate identifiers.
    pub nodes_skipped: usize,
    pub sensors_attached: usize,
    /// Malformed sensor records, unknown nodes and duplicate codes.
    pub sensors_dropped: usize,
}

/// Loads nodes, then sensors, into `registry`. Existing entries are never
/// overwritten. A store failure aborts the run with nothing further applied.
pub(crate) async fn load(
    store: &dyn NodeStore,
    registry: &Mutex<Registry>,
) -> Result<BootstrapReport, UStatus> {
    info!(
        event = events::BOOTSTRAP_START,
        component = COMPONENT,
        "loading registry from store"
    );
    let mut report = BootstrapReport::default();

    let nodes = store.list_nodes().await.map_err(log_store_failure)?;
    {
        let mut registry = registry.lock().await;
        for raw in nodes {
            let Some(record) = NodeRecord::decode(&raw) else {
                skip_malformed("node");
                report.nodes_skipped += 1;
                continue;
            };
            if registry.upsert_node(Node::from_record(record)) {
                report.nodes_loaded += 1;
            } else {
                report.nodes_skipped += 1;
            }
        }
    }

    let sensors = store.list_sensors().await.map_err(log_store_failure)?;
    {
        let mut registry = registry.lock().await;
        for raw in sensors {
            let Some(record) = SensorRecord::decode(&raw) else {
                skip_malformed("sensor");
                report.sensors_dropped += 1;
                continue;
            };
            if registry.lookup_node(&record.node_id).is_none() {
                warn!(
                    event = events::BOOTSTRAP_SENSOR_ORPHANED,
                    component = COMPONENT,
                    node_id = record.node_id.as_str(),
                    sensor_code = record.code.as_str(),
                    "dropping sensor whose node is unknown"
                );
                report.sensors_dropped += 1;
                continue;
            }
            if registry.attach_sensor(Sensor::from_record(record)) {
                report.sensors_attached += 1;
            } else {
                report.sensors_dropped += 1;
            }
        }

        info!(
            event = events::BOOTSTRAP_OK,
            component = COMPONENT,
            nodes = registry.len(),
            nodes_loaded = report.nodes_loaded,
            nodes_skipped = report.nodes_skipped,
            sensors_attached = report.sensors_attached,
            sensors_dropped = report.sensors_dropped,
            "registry loaded"
        );
    }

    Ok(report)
}

fn skip_malformed(record_kind: &'static str) {
    warn!(
        event = events::BOOTSTRAP_RECORD_SKIPPED,
        component = COMPONENT,
        record_kind,
        reason = fields::REASON_MALFORMED_PAYLOAD,
        "skipping malformed store record"
    );
}

fn log_store_failure(status: UStatus) -> UStatus {
    error!(
        event = events::BOOTSTRAP_FAILED,
        component = COMPONENT,
        err = %status,
        "store request failed"
    );
    status
}
