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

use std::error::Error;
use std::fmt::{Display, Formatter};

/// An update referenced an entity the registry does not know about.
///
/// The update is dropped; nothing was cancelled or mutated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReconcileError {
    UnknownSensor { code: String },
    UnknownNode { node_id: String, code: String },
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::UnknownSensor { code } => write!(f, "unknown sensor: {code}"),
            ReconcileError::UnknownNode { node_id, code } => {
                write!(f, "unknown node {node_id} for sensor {code}")
            }
        }
    }
}

impl Error for ReconcileError {}

/// Result of applying a node update.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeReconciliation {
    /// The node was new; it stays stopped until the next `start`.
    Registered,
    /// An existing node was replaced; `started` tells whether its producer runs.
    Replaced { started: bool },
}

/// Result of applying a sensor update or availability toggle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SensorReconciliation {
    Replaced { node_id: String, started: bool },
    Deactivated,
}
