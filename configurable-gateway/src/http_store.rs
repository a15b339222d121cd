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

//! Node store backed by the cloud REST endpoints.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use sensor_gateway::{split_record_array, NodeStore};
use std::time::Duration;
use tracing::debug;
use up_rust::{UCode, UStatus};

const NODES_PATH: &str = "node-cloud/nodes/";
const SENSORS_PATH: &str = "node-cloud/sensors/";

pub(crate) struct HttpNodeStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNodeStore {
    pub(crate) fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self, UStatus> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            UStatus::fail_with_code(
                UCode::INTERNAL,
                format!("Unable to build HTTP client: {e:?}"),
            )
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_records(&self, path: &str) -> Result<Vec<Vec<u8>>, UStatus> {
        let url = format!("{}/{path}", self.base_url);
        debug!("fetching store records from {url}");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                UStatus::fail_with_code(UCode::UNAVAILABLE, format!("GET {url} failed: {e:?}"))
            })?;

        let body = response.bytes().await.map_err(|e| {
            UStatus::fail_with_code(
                UCode::UNAVAILABLE,
                format!("Unable to read body of {url}: {e:?}"),
            )
        })?;

        split_record_array(&body)
    }
}

#[async_trait]
impl NodeStore for HttpNodeStore {
    async fn list_nodes(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        self.fetch_records(NODES_PATH).await
    }

    async fn list_sensors(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        self.fetch_records(SENSORS_PATH).await
    }
}
