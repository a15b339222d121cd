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

//! Canonical structured event names used across `sensor-gateway`.

// Update listener events.
pub const UPDATE_RECEIVE: &str = "update_receive";
pub const UPDATE_DROP_DECODE_FAILED: &str = "update_drop_decode_failed";
pub const UPDATE_DROP_UNKNOWN_REFERENCE: &str = "update_drop_unknown_reference";
pub const UPDATE_LISTENER_REGISTER_OK: &str = "update_listener_register_ok";
pub const UPDATE_LISTENER_REGISTER_FAILED: &str = "update_listener_register_failed";
pub const UPDATE_LISTENER_UNREGISTER_OK: &str = "update_listener_unregister_ok";
pub const UPDATE_LISTENER_UNREGISTER_FAILED: &str = "update_listener_unregister_failed";

// Reconciliation events.
pub const NODE_REGISTERED: &str = "node_registered";
pub const NODE_REPLACE_START: &str = "node_replace_start";
pub const NODE_REPLACE_OK: &str = "node_replace_ok";
pub const NODE_START: &str = "node_start";
pub const SENSOR_REPLACE_START: &str = "sensor_replace_start";
pub const SENSOR_REPLACE_OK: &str = "sensor_replace_ok";
pub const SENSOR_START_WITHHELD: &str = "sensor_start_withheld";
pub const SENSOR_DEACTIVATE_OK: &str = "sensor_deactivate_ok";
pub const SENSOR_START: &str = "sensor_start";

// Registry events.
pub const REGISTRY_DUPLICATE_NODE: &str = "registry_duplicate_node";
pub const REGISTRY_DUPLICATE_SENSOR: &str = "registry_duplicate_sensor";

// Producer lifecycle events.
pub const PRODUCER_SPAWN: &str = "producer_spawn";
pub const PRODUCER_STOP_REQUESTED: &str = "producer_stop_requested";
pub const PRODUCER_STOPPED: &str = "producer_stopped";
pub const PRODUCER_JOIN_FAILED: &str = "producer_join_failed";
pub const NODE_HEARTBEAT: &str = "node_heartbeat";
pub const SAMPLE_PRODUCED: &str = "sample_produced";
pub const SAMPLE_DROPPED: &str = "sample_dropped";

// Sample publisher events.
pub const PUBLISH_ATTEMPT: &str = "publish_attempt";
pub const PUBLISH_OK: &str = "publish_ok";
pub const PUBLISH_FAILED: &str = "publish_failed";
pub const PUBLISH_SESSION_OPEN_FAILED: &str = "publish_session_open_failed";

// Bootstrap events.
pub const BOOTSTRAP_START: &str = "bootstrap_start";
pub const BOOTSTRAP_OK: &str = "bootstrap_ok";
pub const BOOTSTRAP_FAILED: &str = "bootstrap_failed";
pub const BOOTSTRAP_RECORD_SKIPPED: &str = "bootstrap_record_skipped";
pub const BOOTSTRAP_SENSOR_ORPHANED: &str = "bootstrap_sensor_orphaned";

// Gateway lifecycle events.
pub const GATEWAY_CREATED: &str = "gateway_created";
pub const GATEWAY_START: &str = "gateway_start";
pub const GATEWAY_SHUTDOWN: &str = "gateway_shutdown";
