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

//! Read-only views of registry entries.

use crate::model::sample::Sample;
use crate::producer::handle::ProducerSlot;
use crate::registry::entry::{Node, SampleHistory, Sensor};

/// Whether an entity currently has a producer task.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleState {
    Stopped,
    Running,
}

impl LifecycleState {
    pub(crate) fn of(slot: &ProducerSlot) -> Self {
        if slot.is_running() {
            LifecycleState::Running
        } else {
            LifecycleState::Stopped
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SensorSnapshot {
    pub code: String,
    pub node_id: String,
    pub available: bool,
    pub kind: String,
    pub state: LifecycleState,
    pub history: Vec<Sample>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
    pub node_id: String,
    pub available: bool,
    pub description: Option<String>,
    pub state: LifecycleState,
    pub sensors: Vec<SensorSnapshot>,
}

/// Captures everything but the history, which is read after the registry lock is released.
pub(crate) struct PendingSensorSnapshot {
    snapshot: SensorSnapshot,
    history: SampleHistory,
}

impl PendingSensorSnapshot {
    pub(crate) fn capture(sensor: &Sensor) -> Self {
        Self {
            snapshot: SensorSnapshot {
                code: sensor.record.code.clone(),
                node_id: sensor.record.node_id.clone(),
                available: sensor.record.available,
                kind: sensor.record.kind.clone(),
                state: LifecycleState::of(&sensor.producer),
                history: Vec::new(),
            },
            history: sensor.history.clone(),
        }
    }

    pub(crate) async fn resolve(self) -> SensorSnapshot {
        SensorSnapshot {
            history: self.history.snapshot().await,
            ..self.snapshot
        }
    }
}

pub(crate) struct PendingNodeSnapshot {
    node_id: String,
    available: bool,
    description: Option<String>,
    state: LifecycleState,
    sensors: Vec<PendingSensorSnapshot>,
}

impl PendingNodeSnapshot {
    pub(crate) fn capture(node: &Node) -> Self {
        Self {
            node_id: node.record.node_id.clone(),
            available: node.record.available,
            description: node.record.description.clone(),
            state: LifecycleState::of(&node.producer),
            sensors: node.sensors.iter().map(PendingSensorSnapshot::capture).collect(),
        }
    }

    pub(crate) async fn resolve(self) -> NodeSnapshot {
        let mut sensors = Vec::with_capacity(self.sensors.len());
        for sensor in self.sensors {
            sensors.push(sensor.resolve().await);
        }

        NodeSnapshot {
            node_id: self.node_id,
            available: self.available,
            description: self.description,
            state: self.state,
            sensors,
        }
    }
}
