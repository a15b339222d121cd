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

//! Producer layer.
//!
//! One cancellable task per running node and per running sensor. Every task is
//! owned through a [`handle::ProducerHandle`]; stopping a handle signals the
//! task and joins it, so a replacement generation never overlaps the old one.

pub(crate) mod generator;
pub(crate) mod handle;
pub(crate) mod node_producer;
pub(crate) mod sample_producer;
