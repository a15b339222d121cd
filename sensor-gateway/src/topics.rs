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

//! Topic addressing for the update and samples channels.

use serde::Deserialize;
use std::collections::HashSet;
use up_rust::{UCode, UStatus, UUri};

const DEFAULT_AUTHORITY: &str = "sensor-gateway";
const DEFAULT_UE_ID: u32 = 0x5ba0;
const DEFAULT_UE_VERSION_MAJOR: u8 = 0x1;

/// Where the gateway listens for updates and publishes samples.
///
/// All four topics share one authority and entity; they differ by resource id,
/// which must lie in the uProtocol topic range (`0x8000..=0xFFFE`) and be
/// distinct, so no listener receives another topic's events.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TopicConfig {
    pub authority: String,
    pub ue_id: u32,
    pub ue_version_major: u8,
    pub node_update_resource: u16,
    pub sensor_update_resource: u16,
    pub sensor_availability_resource: u16,
    pub samples_resource: u16,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
            ue_id: DEFAULT_UE_ID,
            ue_version_major: DEFAULT_UE_VERSION_MAJOR,
            node_update_resource: 0x8001,
            sensor_update_resource: 0x8002,
            sensor_availability_resource: 0x8003,
            samples_resource: 0x8004,
        }
    }
}

impl TopicConfig {
    pub fn with_authority(mut self, authority: &str) -> Self {
        self.authority = authority.to_string();
        self
    }

    pub fn build(&self) -> Result<UpdateTopics, UStatus> {
        let resources = [
            self.node_update_resource,
            self.sensor_update_resource,
            self.sensor_availability_resource,
            self.samples_resource,
        ];
        let mut seen = HashSet::new();
        if let Some(duplicate) = resources.iter().find(|resource| !seen.insert(**resource)) {
            return Err(UStatus::fail_with_code(
                UCode::INVALID_ARGUMENT,
                format!("resource id {duplicate:#06X} is used by more than one topic"),
            ));
        }

        Ok(UpdateTopics {
            node_update: self.topic(self.node_update_resource)?,
            sensor_update: self.topic(self.sensor_update_resource)?,
            sensor_availability: self.topic(self.sensor_availability_resource)?,
            samples: self.topic(self.samples_resource)?,
        })
    }

    fn topic(&self, resource_id: u16) -> Result<UUri, UStatus> {
        if resource_id < 0x8000 || resource_id == 0xFFFF {
            return Err(UStatus::fail_with_code(
                UCode::INVALID_ARGUMENT,
                format!("resource id {resource_id:#06X} is not a topic resource"),
            ));
        }

        UUri::try_from_parts(
            &self.authority,
            self.ue_id,
            self.ue_version_major,
            resource_id,
        )
        .map_err(|err| {
            UStatus::fail_with_code(
                UCode::INVALID_ARGUMENT,
                format!("invalid topic for {}: {err:?}", self.authority),
            )
        })
    }
}

/// Resolved topic URIs.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateTopics {
    pub node_update: UUri,
    pub sensor_update: UUri,
    pub sensor_availability: UUri,
    pub samples: UUri,
}
