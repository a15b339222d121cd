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

//! Per-node umbrella task.
//!
//! Sensor producers are owned by the registry entries, not by this task, so
//! cancelling a node producer never touches the sensors of that node.

use crate::observability::events;
use crate::producer::handle::{ProducerHandle, ProducerKind};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const COMPONENT: &str = "node_producer";
const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) struct NodeProducer {
    node_id: String,
    heartbeat_interval: Duration,
}

impl NodeProducer {
    pub(crate) fn new(node_id: &str, heartbeat_interval: Duration) -> Self {
        Self {
            node_id: node_id.to_string(),
            heartbeat_interval: heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL),
        }
    }

    pub(crate) fn spawn(self) -> ProducerHandle {
        let node_id = self.node_id.clone();
        ProducerHandle::spawn(ProducerKind::Node, &node_id, move |producer_id, cancel| {
            self.run(producer_id, cancel)
        })
    }

    async fn run(self, producer_id: String, cancel: CancellationToken) {
        let mut ticker = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut beats: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    beats += 1;
                    debug!(
                        event = events::NODE_HEARTBEAT,
                        component = COMPONENT,
                        producer_id = producer_id.as_str(),
                        node_id = self.node_id.as_str(),
                        beats,
                        "node heartbeat"
                    );
                }
            }
        }
    }
}
