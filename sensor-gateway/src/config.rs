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

//! Runtime tuning for the gateway.

use serde::Deserialize;
use std::time::Duration;

const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
const DEFAULT_NODE_HEARTBEAT_INTERVAL_MS: u64 = 5000;
const DEFAULT_PUBLISH_RETRIES: u32 = 2;
const DEFAULT_PUBLISH_RETRY_DELAY_MS: u64 = 200;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Sampling interval for sensors without their own `intervalMs`.
    pub sample_interval_ms: u64,
    pub node_heartbeat_interval_ms: u64,
    /// Extra attempts after a failed publish; `0` disables retrying.
    pub publish_retries: u32,
    pub publish_retry_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            node_heartbeat_interval_ms: DEFAULT_NODE_HEARTBEAT_INTERVAL_MS,
            publish_retries: DEFAULT_PUBLISH_RETRIES,
            publish_retry_delay_ms: DEFAULT_PUBLISH_RETRY_DELAY_MS,
        }
    }
}

impl GatewayConfig {
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval_ms = saturating_millis(interval);
        self
    }

    pub fn with_publish_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.publish_retries = retries;
        self.publish_retry_delay_ms = saturating_millis(delay);
        self
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn node_heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.node_heartbeat_interval_ms)
    }

    pub fn publish_retry_delay(&self) -> Duration {
        Duration::from_millis(self.publish_retry_delay_ms)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::GatewayConfig;
    use std::time::Duration;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"sample_interval_ms": 250}"#).expect("config should parse");

        assert_eq!(config.sample_interval(), Duration::from_millis(250));
        assert_eq!(config.publish_retries, GatewayConfig::default().publish_retries);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<GatewayConfig>(r#"{"sample_rate": 1}"#).is_err());
    }

    #[test]
    fn oversized_durations_saturate() {
        let config = GatewayConfig::default()
            .with_sample_interval(Duration::MAX)
            .with_publish_retries(1, Duration::MAX);

        assert_eq!(config.sample_interval_ms, u64::MAX);
        assert_eq!(config.publish_retry_delay_ms, u64::MAX);
    }
}
