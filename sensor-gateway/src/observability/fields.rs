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

//! Canonical structured field keys and value-format helpers.

use up_rust::{UMessage, UUri};

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const PRODUCER_ID: &str = "producer_id";
pub const NODE_ID: &str = "node_id";
pub const SENSOR_CODE: &str = "sensor_code";
pub const UPDATE_KIND: &str = "update_kind";

pub const MSG_ID: &str = "msg_id";
pub const SRC: &str = "src";
pub const TOPIC: &str = "topic";

pub const ATTEMPT: &str = "attempt";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_NODE_UNAVAILABLE: &str = "node_unavailable";
pub const REASON_SENSOR_UNAVAILABLE: &str = "sensor_unavailable";
pub const REASON_GATEWAY_HALTED: &str = "gateway_halted";
pub const REASON_MISSING_PAYLOAD: &str = "missing_payload";
pub const REASON_MALFORMED_PAYLOAD: &str = "malformed_payload";

pub fn format_message_id(message: &UMessage) -> String {
    message
        .attributes
        .as_ref()
        .and_then(|attributes| attributes.id.as_ref())
        .map(|id| id.to_hyphenated_string())
        .unwrap_or_else(|| NONE.to_string())
}

pub fn format_source_uri(message: &UMessage) -> String {
    message
        .attributes
        .as_ref()
        .and_then(|attributes| attributes.source.as_ref())
        .map(format_uri)
        .unwrap_or_else(|| NONE.to_string())
}

pub fn format_uri(uri: &UUri) -> String {
    uri.to_uri(false).trim_start_matches("//").to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_message_id, format_source_uri, format_uri, NONE};
    use up_rust::{UAttributes, UMessage, UUri};

    #[test]
    fn format_message_id_returns_none_when_absent() {
        let message = UMessage::default();

        assert_eq!(format_message_id(&message), NONE);
    }

    #[test]
    fn format_source_uri_is_stable_compact_path() {
        let source = UUri::try_from_parts("gateway", 0x5ba0, 0x1, 0x8001)
            .expect("source URI should build");
        let message = UMessage {
            attributes: Some(UAttributes {
                source: Some(source).into(),
                ..Default::default()
            })
            .into(),
            ..Default::default()
        };

        assert_eq!(format_source_uri(&message), "gateway/5BA0/1/8001");
    }

    #[test]
    fn format_uri_strips_authority_prefix() {
        let topic = UUri::try_from_parts("gateway", 0x5ba0, 0x1, 0x8004)
            .expect("topic URI should build");

        assert_eq!(format_uri(&topic), "gateway/5BA0/1/8004");
    }
}
