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

//! Registry entries: records plus the runtime state the gateway attaches to them.

use crate::model::node::NodeRecord;
use crate::model::sample::Sample;
use crate::model::sensor::SensorRecord;
use crate::producer::handle::ProducerSlot;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Append-only sample history shared between a sensor entry and its producer.
#[derive(Clone, Default)]
pub(crate) struct SampleHistory {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl SampleHistory {
    pub(crate) async fn append(&self, sample: Sample) {
        self.samples.lock().await.push(sample);
    }

    pub(crate) async fn snapshot(&self) -> Vec<Sample> {
        self.samples.lock().await.clone()
    }
}

pub(crate) struct Sensor {
    pub(crate) record: SensorRecord,
    pub(crate) history: SampleHistory,
    pub(crate) producer: ProducerSlot,
}

impl Sensor {
    pub(crate) fn from_record(record: SensorRecord) -> Self {
        Self::with_history(record, SampleHistory::default())
    }

    /// A new sensor generation that continues the history of the previous one.
    pub(crate) fn with_history(record: SensorRecord, history: SampleHistory) -> Self {
        Self {
            record,
            history,
            producer: ProducerSlot::Idle,
        }
    }

    pub(crate) fn code(&self) -> &str {
        &self.record.code
    }
}

pub(crate) struct Node {
    /// Always stored with an empty `sensors` list; `sensors` below is authoritative.
    pub(crate) record: NodeRecord,
    pub(crate) sensors: Vec<Sensor>,
    pub(crate) producer: ProducerSlot,
}

impl Node {
    /// Builds a fresh entry; embedded sensors are re-owned by this node.
    pub(crate) fn from_record(mut record: NodeRecord) -> Self {
        let sensors = std::mem::take(&mut record.sensors)
            .into_iter()
            .map(|mut sensor| {
                sensor.node_id = record.node_id.clone();
                Sensor::from_record(sensor)
            })
            .collect();

        Self {
            record,
            sensors,
            producer: ProducerSlot::Idle,
        }
    }

    /// Builds the next generation of `previous`, keeping its sensors verbatim.
    ///
    /// The sensors listed in `record` are discarded. The previous node producer
    /// must already be stopped.
    pub(crate) fn replacing(mut record: NodeRecord, previous: Node) -> Self {
        record.sensors.clear();
        Self {
            record,
            sensors: previous.sensors,
            producer: ProducerSlot::Idle,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.record.node_id
    }

    pub(crate) fn sensor(&self, code: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|sensor| sensor.code() == code)
    }

    pub(crate) fn sensor_mut(&mut self, code: &str) -> Option<&mut Sensor> {
        self.sensors.iter_mut().find(|sensor| sensor.code() == code)
    }
}
