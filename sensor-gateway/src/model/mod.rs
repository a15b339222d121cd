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

//! Records exchanged with the outside world: nodes, sensors, availability
//! toggles and samples.

pub(crate) mod codec;
pub(crate) mod node;
pub(crate) mod sample;
pub(crate) mod sensor;
