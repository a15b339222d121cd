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

//! In-memory node/sensor table with a code → node index.

use crate::observability::events;
use crate::registry::entry::{Node, Sensor};
use std::collections::{HashMap, HashSet};
use tracing::warn;

const COMPONENT: &str = "registry";

/// Nodes keyed by identifier, plus an index from sensor code to owning node.
///
/// All operations are no-ops on missing references. Insertion never
/// overwrites: duplicates are rejected and reported through `false`.
#[derive(Default)]
pub(crate) struct Registry {
    nodes: HashMap<String, Node>,
    sensor_index: HashMap<String, String>,
}

impl Registry {
    /// Inserts `node` if its identifier is not registered yet.
    ///
    /// Embedded sensors whose code already exists anywhere in the registry are
    /// dropped with a warning.
    pub(crate) fn upsert_node(&mut self, mut node: Node) -> bool {
        if self.nodes.contains_key(node.id()) {
            warn!(
                event = events::REGISTRY_DUPLICATE_NODE,
                component = COMPONENT,
                node_id = node.id(),
                "node identifier already registered; ignoring insert"
            );
            return false;
        }

        let node_id = node.id().to_string();
        let mut seen = HashSet::new();
        node.sensors.retain(|sensor| {
            let unique =
                !self.sensor_index.contains_key(sensor.code()) && seen.insert(sensor.code().to_string());
            if !unique {
                warn!(
                    event = events::REGISTRY_DUPLICATE_SENSOR,
                    component = COMPONENT,
                    node_id = node_id.as_str(),
                    sensor_code = sensor.code(),
                    "sensor code already registered; dropping embedded sensor"
                );
            }
            unique
        });

        for sensor in &node.sensors {
            self.sensor_index
                .insert(sensor.code().to_string(), node_id.clone());
        }
        self.nodes.insert(node_id, node);
        true
    }

    pub(crate) fn remove_node(&mut self, node_id: &str) -> Option<Node> {
        let node = self.nodes.remove(node_id)?;
        for sensor in &node.sensors {
            self.sensor_index.remove(sensor.code());
        }
        Some(node)
    }

    pub(crate) fn lookup_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub(crate) fn lookup_node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    pub(crate) fn lookup_sensor_by_code(&self, code: &str) -> Option<(&Node, &Sensor)> {
        let node = self.nodes.get(self.sensor_index.get(code)?)?;
        let sensor = node.sensor(code)?;
        Some((node, sensor))
    }

    pub(crate) fn sensor_mut(&mut self, code: &str) -> Option<&mut Sensor> {
        let node_id = self.sensor_index.get(code)?;
        self.nodes.get_mut(node_id)?.sensor_mut(code)
    }

    /// Attaches `sensor` to the node named by its record, unless that node is
    /// missing or the code is already registered.
    pub(crate) fn attach_sensor(&mut self, sensor: Sensor) -> bool {
        if self.sensor_index.contains_key(sensor.code()) {
            warn!(
                event = events::REGISTRY_DUPLICATE_SENSOR,
                component = COMPONENT,
                node_id = sensor.record.node_id.as_str(),
                sensor_code = sensor.code(),
                "sensor code already registered; ignoring attach"
            );
            return false;
        }

        let Some(node) = self.nodes.get_mut(&sensor.record.node_id) else {
            return false;
        };
        self.sensor_index
            .insert(sensor.code().to_string(), sensor.record.node_id.clone());
        node.sensors.push(sensor);
        true
    }

    pub(crate) fn detach_sensor(&mut self, node_id: &str, code: &str) -> Option<Sensor> {
        let node = self.nodes.get_mut(node_id)?;
        let position = node.sensors.iter().position(|sensor| sensor.code() == code)?;
        self.sensor_index.remove(code);
        Some(node.sensors.remove(position))
    }

    /// Registered node identifiers in ascending order.
    pub(crate) fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}
