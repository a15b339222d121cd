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

//! Registration of the update listeners on a transport.

use crate::ingress::update_listener::{UpdateKind, UpdateListener};
use crate::observability::{events, fields};
use crate::reconcile::Reconciler;
use crate::topics::UpdateTopics;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};
use up_rust::{UStatus, UTransport, UUri};

const COMPONENT: &str = "update_subscriptions";

#[derive(Debug)]
pub enum ListenerRegistrationError {
    AlreadySubscribed,
    NotSubscribed,
    FailedToRegister { kind: UpdateKind, status: UStatus },
    FailedToUnregister { kind: UpdateKind, status: UStatus },
}

impl Display for ListenerRegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerRegistrationError::AlreadySubscribed => {
                write!(f, "update listeners are already registered")
            }
            ListenerRegistrationError::NotSubscribed => {
                write!(f, "update listeners are not registered")
            }
            ListenerRegistrationError::FailedToRegister { kind, status } => {
                write!(f, "failed to register {kind} listener: {status}")
            }
            ListenerRegistrationError::FailedToUnregister { kind, status } => {
                write!(f, "failed to unregister {kind} listener: {status}")
            }
        }
    }
}

impl Error for ListenerRegistrationError {}

struct Registration {
    kind: UpdateKind,
    topic: UUri,
    listener: Arc<UpdateListener>,
}

/// The listeners currently registered on one transport.
pub(crate) struct UpdateSubscriptions {
    transport: Arc<dyn UTransport>,
    registrations: Vec<Registration>,
}

fn topic_for(topics: &UpdateTopics, kind: UpdateKind) -> &UUri {
    match kind {
        UpdateKind::NodeUpdate => &topics.node_update,
        UpdateKind::SensorUpdate => &topics.sensor_update,
        UpdateKind::SensorAvailability => &topics.sensor_availability,
    }
}

impl UpdateSubscriptions {
    /// Registers one listener per update kind. On the first failure, the
    /// listeners registered so far are unregistered again.
    pub(crate) async fn register(
        transport: Arc<dyn UTransport>,
        topics: &UpdateTopics,
        reconciler: Arc<Reconciler>,
    ) -> Result<Self, ListenerRegistrationError> {
        let mut subscriptions = Self {
            transport,
            registrations: Vec::with_capacity(UpdateKind::ALL.len()),
        };

        for kind in UpdateKind::ALL {
            let topic = topic_for(topics, kind).clone();
            let listener = Arc::new(UpdateListener::new(kind, reconciler.clone()));

            if let Err(status) = subscriptions
                .transport
                .register_listener(&topic, None, listener.clone())
                .await
            {
                warn!(
                    event = events::UPDATE_LISTENER_REGISTER_FAILED,
                    component = COMPONENT,
                    update_kind = kind.as_str(),
                    topic = %fields::format_uri(&topic),
                    err = %status,
                    "unable to register update listener"
                );
                subscriptions.unregister_all().await;
                return Err(ListenerRegistrationError::FailedToRegister { kind, status });
            }

            debug!(
                event = events::UPDATE_LISTENER_REGISTER_OK,
                component = COMPONENT,
                update_kind = kind.as_str(),
                topic = %fields::format_uri(&topic),
                "registered update listener"
            );
            subscriptions.registrations.push(Registration {
                kind,
                topic,
                listener,
            });
        }

        Ok(subscriptions)
    }

    /// Unregisters every listener, reporting the first failure.
    pub(crate) async fn unregister(mut self) -> Result<(), ListenerRegistrationError> {
        match self.unregister_all().await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn unregister_all(&mut self) -> Option<ListenerRegistrationError> {
        let mut first_error = None;

        for registration in self.registrations.drain(..) {
            let topic = fields::format_uri(&registration.topic);
            match self
                .transport
                .unregister_listener(&registration.topic, None, registration.listener)
                .await
            {
                Ok(()) => debug!(
                    event = events::UPDATE_LISTENER_UNREGISTER_OK,
                    component = COMPONENT,
                    update_kind = registration.kind.as_str(),
                    topic = %topic,
                    "unregistered update listener"
                ),
                Err(status) => {
                    warn!(
                        event = events::UPDATE_LISTENER_UNREGISTER_FAILED,
                        component = COMPONENT,
                        update_kind = registration.kind.as_str(),
                        topic = %topic,
                        err = %status,
                        "unable to unregister update listener"
                    );
                    first_error.get_or_insert(ListenerRegistrationError::FailedToUnregister {
                        kind: registration.kind,
                        status,
                    });
                }
            }
        }

        first_error
    }
}
