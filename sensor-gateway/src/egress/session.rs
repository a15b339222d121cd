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
use up_rust::{UStatus, UTransport};

/// Delivery level requested for a publish session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeliveryGuarantee {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// Opens short-lived transport sessions for outbound samples.
///
/// Every sample is published on its own session, identified by a client id
/// derived from the sensor code. Implementations decide how a session maps
/// onto the underlying transport (a fresh broker connection, a pooled client,
/// an in-memory loopback in tests).
///
/// ```
/// use async_trait::async_trait;
/// use sensor_gateway::{DeliveryGuarantee, PublishSessionBuilder};
/// use up_rust::{UCode, UStatus, UTransport};
///
/// struct Offline;
///
/// #[async_trait]
/// impl PublishSessionBuilder for Offline {
///     async fn open(
///         &self,
///         client_id: &str,
///         _delivery: DeliveryGuarantee,
///     ) -> Result<Box<dyn UTransport>, UStatus> {
///         Err(UStatus::fail_with_code(
///             UCode::UNAVAILABLE,
///             format!("no broker for {client_id}"),
///         ))
///     }
/// }
/// ```
#[async_trait]
pub trait PublishSessionBuilder: Send + Sync {
    async fn open(
        &self,
        client_id: &str,
        delivery: DeliveryGuarantee,
    ) -> Result<Box<dyn UTransport>, UStatus>;

    /// Releases the session opened for a client id once its single message
    /// was sent (or failed).
    async fn close(&self, _client_id: &str, session: Box<dyn UTransport>) {
        drop(session);
    }
}
