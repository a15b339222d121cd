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

//! Registry layer.
//!
//! - `table` owns nodes, sensors and the code index
//! - `entry` attaches producer slots and sample history to records
//! - `keyed_lock` serializes reconciliations per entity
//! - `snapshot` exposes read-only views

pub(crate) mod entry;
pub(crate) mod keyed_lock;
pub(crate) mod snapshot;
pub(crate) mod table;
