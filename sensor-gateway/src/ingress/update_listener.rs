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

//! Listener bound to one update topic.

use crate::model::codec::Record;
use crate::model::node::NodeRecord;
use crate::model::sensor::{SensorAvailability, SensorRecord};
use crate::observability::{events, fields};
use crate::reconcile::{ReconcileError, Reconciler};
use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn, Level};
use up_rust::{UListener, UMessage};

const COMPONENT: &str = "update_listener";

/// The three update classes, one topic each.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateKind {
    NodeUpdate,
    SensorUpdate,
    SensorAvailability,
}

impl UpdateKind {
    pub(crate) const ALL: [UpdateKind; 3] = [
        UpdateKind::NodeUpdate,
        UpdateKind::SensorUpdate,
        UpdateKind::SensorAvailability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::NodeUpdate => "node_update",
            UpdateKind::SensorUpdate => "sensor_update",
            UpdateKind::SensorAvailability => "sensor_availability",
        }
    }
}

impl Display for UpdateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes updates of one kind and reconciles them before returning, so the
/// transport's per-topic delivery order is the order updates are applied in.
pub(crate) struct UpdateListener {
    kind: UpdateKind,
    reconciler: Arc<Reconciler>,
}

impl UpdateListener {
    pub(crate) fn new(kind: UpdateKind, reconciler: Arc<Reconciler>) -> Self {
        Self { kind, reconciler }
    }

    fn drop_malformed(&self, msg: &UMessage, reason: &str) {
        warn!(
            event = events::UPDATE_DROP_DECODE_FAILED,
            component = COMPONENT,
            update_kind = self.kind.as_str(),
            msg_id = %fields::format_message_id(msg),
            src = %fields::format_source_uri(msg),
            reason,
            "dropping update that could not be decoded"
        );
    }

    async fn reconcile(&self, payload: &[u8]) -> Option<Result<(), ReconcileError>> {
        match self.kind {
            UpdateKind::NodeUpdate => {
                let record = NodeRecord::decode(payload)?;
                self.reconciler.replace_node(record).await;
                Some(Ok(()))
            }
            UpdateKind::SensorUpdate => {
                let record = SensorRecord::decode(payload)?;
                Some(self.reconciler.replace_sensor(record).await.map(|_| ()))
            }
            UpdateKind::SensorAvailability => {
                let update = SensorAvailability::decode(payload)?;
                Some(self.reconciler.apply_availability(update).await.map(|_| ()))
            }
        }
    }
}

#[async_trait]
impl UListener for UpdateListener {
    async fn on_receive(&self, msg: UMessage) {
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::UPDATE_RECEIVE,
                component = COMPONENT,
                update_kind = self.kind.as_str(),
                msg_id = %fields::format_message_id(&msg),
                src = %fields::format_source_uri(&msg),
                "received update"
            );
        }

        let Some(payload) = msg.payload.as_deref() else {
            self.drop_malformed(&msg, fields::REASON_MISSING_PAYLOAD);
            return;
        };

        match self.reconcile(payload).await {
            None => self.drop_malformed(&msg, fields::REASON_MALFORMED_PAYLOAD),
            Some(Ok(())) => {}
            Some(Err(err)) => warn!(
                event = events::UPDATE_DROP_UNKNOWN_REFERENCE,
                component = COMPONENT,
                update_kind = self.kind.as_str(),
                msg_id = %fields::format_message_id(&msg),
                err = %err,
                "dropping update that references an unknown entity"
            ),
        }
    }
}
