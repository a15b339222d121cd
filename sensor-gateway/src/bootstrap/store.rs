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

use async_trait::async_trait;
use serde_json::value::RawValue;
use up_rust::{UCode, UStatus};

/// Remote source of truth the registry is rebuilt from at startup.
///
/// Each call returns the raw records in store order, encoded the same way as
/// the update topics. Records are decoded by the loader, so one malformed
/// entry never hides the rest.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Vec<u8>>, UStatus>;

    async fn list_sensors(&self) -> Result<Vec<Vec<u8>>, UStatus>;
}

/// Splits a JSON array body into its raw elements without decoding them.
///
/// Anything other than a top-level array is rejected.
pub fn split_record_array(body: &[u8]) -> Result<Vec<Vec<u8>>, UStatus> {
    let elements: Vec<&RawValue> = serde_json::from_slice(body).map_err(|err| {
        UStatus::fail_with_code(
            UCode::INVALID_ARGUMENT,
            format!("store response is not a JSON array: {err}"),
        )
    })?;

    Ok(elements
        .into_iter()
        .map(|element| element.get().as_bytes().to_vec())
        .collect())
}
