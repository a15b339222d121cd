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

//! Byte-level encode/decode contract shared by every record type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to encode a record into its wire representation.
#[derive(Debug)]
pub enum RecordError {
    Encode(serde_json::Error),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::Encode(err) => write!(f, "unable to encode record: {err}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RecordError::Encode(err) => Some(err),
        }
    }
}

/// A record exchanged on the update topics, the samples topic and the bootstrap store.
///
/// Records travel as JSON. Decoding never fails loudly: malformed input, or input
/// that parses but is not [`well formed`](Record::is_well_formed), yields `None`
/// and callers treat that as "ignore this event".
pub trait Record: Serialize + DeserializeOwned {
    /// Semantic validation applied after a successful parse.
    fn is_well_formed(&self) -> bool {
        true
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(bytes)
            .ok()
            .filter(Self::is_well_formed)
    }

    fn encode(&self) -> Result<Vec<u8>, RecordError> {
        serde_json::to_vec(self).map_err(RecordError::Encode)
    }
}
