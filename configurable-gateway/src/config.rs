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

use sensor_gateway::{GatewayConfig, TopicConfig};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) gateway: GatewayConfig,
    #[serde(default)]
    pub(crate) topics: TopicConfig,
    pub(crate) store: StoreConfig,
    pub(crate) mqtt: MqttConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StoreConfig {
    StaticFile {
        nodes_file: String,
        sensors_file: String,
    },
    Http {
        base_url: String,
        #[serde(default)]
        request_timeout_ms: Option<u64>,
    },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    /// Broker address in `host:port` form.
    pub(crate) broker_uri: String,
}

#[cfg(test)]
mod tests {
    use super::{Config, StoreConfig};

    #[test]
    fn shipped_config_parses() {
        let contents =
            std::fs::read_to_string("CONFIG.json5").expect("shipped config should be readable");
        let config: Config = json5::from_str(&contents).expect("shipped config should parse");

        assert!(matches!(config.store, StoreConfig::StaticFile { .. }));
        assert_eq!(config.mqtt.broker_uri, "localhost:1883");
        assert!(config.topics.build().is_ok());
    }

    #[test]
    fn http_store_and_defaults() {
        let config: Config = json5::from_str(
            r#"{
                store: { mode: "http", base_url: "http://localhost:1880" },
                mqtt: { broker_uri: "broker:1883" },
            }"#,
        )
        .expect("config should parse");

        assert!(matches!(
            config.store,
            StoreConfig::Http {
                request_timeout_ms: None,
                ..
            }
        ));
        assert_eq!(config.gateway, sensor_gateway::GatewayConfig::default());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let result: Result<Config, _> = json5::from_str(
            r#"{
                store: { mode: "http", base_url: "http://localhost:1880" },
                mqtt: { broker_uri: "broker:1883" },
                zenoh: {},
            }"#,
        );

        assert!(result.is_err());
    }
}
