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

//! Per-sample MQTT 5 sessions.
//!
//! Each sample gets its own broker connection, identified by the sensor code,
//! and is published with the QoS matching the requested delivery guarantee.
//! The connection is disconnected explicitly once the message went out.

use crate::config::MqttConfig;
use async_trait::async_trait;
use paho_mqtt as mqtt;
use sensor_gateway::{DeliveryGuarantee, PublishSessionBuilder};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use up_rust::{UCode, UListener, UMessage, UStatus, UTransport, UUri};

const COMPONENT: &str = "mqtt_session";

/// Opens a dedicated broker connection for every sample.
pub(crate) struct MqttSessionBuilder {
    server_uri: String,
    open_clients: Mutex<HashMap<String, mqtt::AsyncClient>>,
}

impl MqttSessionBuilder {
    pub(crate) fn new(mqtt: &MqttConfig) -> Self {
        Self {
            server_uri: server_uri(&mqtt.broker_uri),
            open_clients: Mutex::new(HashMap::new()),
        }
    }

    fn track(&self, client_id: &str, client: mqtt::AsyncClient) -> Result<(), UStatus> {
        let mut open_clients = self.open_clients.lock().map_err(|_| {
            UStatus::fail_with_code(UCode::INTERNAL, "mqtt session table poisoned")
        })?;
        open_clients.insert(client_id.to_string(), client);
        Ok(())
    }

    fn untrack(&self, client_id: &str) -> Option<mqtt::AsyncClient> {
        self.open_clients
            .lock()
            .ok()
            .and_then(|mut open_clients| open_clients.remove(client_id))
    }
}

/// Adds the `tcp://` scheme paho expects when the broker is given as `host:port`.
fn server_uri(broker_uri: &str) -> String {
    if broker_uri.contains("://") {
        broker_uri.to_string()
    } else {
        format!("tcp://{broker_uri}")
    }
}

fn qos_for(delivery: DeliveryGuarantee) -> i32 {
    match delivery {
        DeliveryGuarantee::AtMostOnce => mqtt::QOS_0,
        DeliveryGuarantee::AtLeastOnce => mqtt::QOS_1,
        DeliveryGuarantee::ExactlyOnce => mqtt::QOS_2,
    }
}

/// `authority/ue_id/version/resource`, numbers in upper-case hex.
fn topic_for(source: &UUri) -> String {
    format!(
        "{}/{:X}/{:X}/{:X}",
        source.authority_name, source.ue_id, source.ue_version_major, source.resource_id
    )
}

fn transport_error(context: &str, err: mqtt::Error) -> UStatus {
    UStatus::fail_with_code(UCode::UNAVAILABLE, format!("{context}: {err}"))
}

#[async_trait]
impl PublishSessionBuilder for MqttSessionBuilder {
    async fn open(
        &self,
        client_id: &str,
        delivery: DeliveryGuarantee,
    ) -> Result<Box<dyn UTransport>, UStatus> {
        let create_options = mqtt::CreateOptionsBuilder::new()
            .server_uri(self.server_uri.as_str())
            .client_id(client_id)
            .mqtt_version(mqtt::MQTT_VERSION_5)
            .finalize();
        let client = mqtt::AsyncClient::new(create_options)
            .map_err(|e| transport_error("unable to create mqtt client", e))?;

        let connect_options = mqtt::ConnectOptionsBuilder::new_v5()
            .clean_start(true)
            .finalize();
        client
            .connect(connect_options)
            .await
            .map_err(|e| transport_error("unable to connect to mqtt broker", e))?;

        debug!(
            component = COMPONENT,
            client_id,
            qos = qos_for(delivery),
            "mqtt session opened"
        );
        self.track(client_id, client.clone())?;

        Ok(Box::new(MqttSession {
            client,
            qos: qos_for(delivery),
        }))
    }

    async fn close(&self, client_id: &str, session: Box<dyn UTransport>) {
        drop(session);
        let Some(client) = self.untrack(client_id) else {
            return;
        };
        if !client.is_connected() {
            return;
        }
        match client.disconnect(None::<mqtt::DisconnectOptions>).await {
            Ok(_) => debug!(component = COMPONENT, client_id, "mqtt session closed"),
            Err(err) => warn!(
                component = COMPONENT,
                client_id,
                err = %err,
                "unable to disconnect mqtt session"
            ),
        }
    }
}

/// Publish-only transport over one broker connection.
struct MqttSession {
    client: mqtt::AsyncClient,
    qos: i32,
}

impl MqttSession {
    fn build_message(&self, message: &UMessage) -> Result<mqtt::Message, UStatus> {
        let attributes = message.attributes.as_ref().ok_or_else(|| {
            UStatus::fail_with_code(UCode::INVALID_ARGUMENT, "message has no attributes")
        })?;
        let source = attributes.source.as_ref().ok_or_else(|| {
            UStatus::fail_with_code(UCode::INVALID_ARGUMENT, "message has no source")
        })?;

        let mut properties = mqtt::Properties::new();
        let mut user_properties = vec![
            ("uP".to_string(), "1".to_string()),
            ("2".to_string(), attributes.type_.value().to_string()),
            ("3".to_string(), String::from(source)),
            ("12".to_string(), attributes.payload_format.value().to_string()),
        ];
        if let Some(id) = attributes.id.as_ref() {
            user_properties.push(("1".to_string(), id.to_hyphenated_string()));
        }
        for (key, value) in user_properties {
            properties
                .push_string_pair(mqtt::PropertyCode::UserProperty, &key, &value)
                .map_err(|e| {
                    UStatus::fail_with_code(
                        UCode::INTERNAL,
                        format!("unable to set mqtt property {key}: {e}"),
                    )
                })?;
        }

        let payload = message
            .payload
            .as_ref()
            .map(|payload| payload.to_vec())
            .unwrap_or_default();

        Ok(mqtt::MessageBuilder::new()
            .topic(topic_for(source))
            .payload(payload)
            .qos(self.qos)
            .properties(properties)
            .finalize())
    }
}

#[async_trait]
impl UTransport for MqttSession {
    async fn send(&self, message: UMessage) -> Result<(), UStatus> {
        let mqtt_message = self.build_message(&message)?;
        self.client
            .publish(mqtt_message)
            .await
            .map_err(|e| transport_error("unable to publish sample", e))
    }

    async fn receive(
        &self,
        _source_filter: &UUri,
        _sink_filter: Option<&UUri>,
    ) -> Result<UMessage, UStatus> {
        Err(UStatus::fail_with_code(
            UCode::UNIMPLEMENTED,
            "publish sessions do not receive",
        ))
    }

    async fn register_listener(
        &self,
        _source_filter: &UUri,
        _sink_filter: Option<&UUri>,
        _listener: Arc<dyn UListener>,
    ) -> Result<(), UStatus> {
        Err(UStatus::fail_with_code(
            UCode::UNIMPLEMENTED,
            "publish sessions do not listen",
        ))
    }

    async fn unregister_listener(
        &self,
        _source_filter: &UUri,
        _sink_filter: Option<&UUri>,
        _listener: Arc<dyn UListener>,
    ) -> Result<(), UStatus> {
        Err(UStatus::fail_with_code(
            UCode::UNIMPLEMENTED,
            "publish sessions do not listen",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{qos_for, server_uri, topic_for};
    use paho_mqtt as mqtt;
    use sensor_gateway::DeliveryGuarantee;
    use up_rust::UUri;

    #[test]
    fn exactly_once_publishes_at_qos_2() {
        assert_eq!(qos_for(DeliveryGuarantee::ExactlyOnce), mqtt::QOS_2);
        assert_eq!(qos_for(DeliveryGuarantee::AtLeastOnce), mqtt::QOS_1);
        assert_eq!(qos_for(DeliveryGuarantee::AtMostOnce), mqtt::QOS_0);
    }

    #[test]
    fn bare_broker_address_gets_tcp_scheme() {
        assert_eq!(server_uri("localhost:1883"), "tcp://localhost:1883");
        assert_eq!(server_uri("ssl://broker:8883"), "ssl://broker:8883");
    }

    #[test]
    fn topic_is_derived_from_source_uri() {
        let source = UUri::try_from_parts("sensor-gateway", 0x5ba0, 1, 0x8004)
            .expect("valid samples uri");
        assert_eq!(topic_for(&source), "sensor-gateway/5BA0/1/8004");
    }
}
