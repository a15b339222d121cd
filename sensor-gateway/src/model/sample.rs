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

use crate::model::codec::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One timestamped measurement emitted by a running sensor.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub code: String,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(code: &str, value: Value) -> Self {
        Self {
            code: code.to_string(),
            value,
            timestamp: Utc::now(),
        }
    }
}

impl Record for Sample {
    fn is_well_formed(&self) -> bool {
        !self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Sample;
    use crate::model::codec::Record;
    use serde_json::json;

    #[test]
    fn encoded_sample_carries_code_value_and_timestamp() {
        let sample = Sample::new("s1", json!({"celsius": 21.5}));
        let encoded = sample.encode().expect("sample should encode");
        let raw: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");

        assert_eq!(raw["code"], "s1");
        assert_eq!(raw["value"]["celsius"], 21.5);
        assert!(raw["timestamp"].is_string());
        assert_eq!(Sample::decode(&encoded), Some(sample));
    }
}
