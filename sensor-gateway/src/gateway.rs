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

use crate::bootstrap::loader::{self, BootstrapReport};
use crate::bootstrap::store::NodeStore;
use crate::config::GatewayConfig;
use crate::egress::publisher::SamplePublisher;
use crate::egress::session::PublishSessionBuilder;
use crate::ingress::subscriptions::{ListenerRegistrationError, UpdateSubscriptions};
use crate::model::node::NodeRecord;
use crate::model::sensor::{SensorAvailability, SensorRecord};
use crate::observability::{events, fields};
use crate::producer::generator::{ConfiguredValueGenerator, SampleGenerator};
use crate::reconcile::{NodeReconciliation, ReconcileError, Reconciler, SensorReconciliation};
use crate::registry::snapshot::{NodeSnapshot, SensorSnapshot};
use crate::topics::UpdateTopics;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use up_rust::{UStatus, UTransport};

const COMPONENT: &str = "sensor_gateway";

/// Process-scoped gateway: the registry, its producers and the update listeners.
///
/// Typical lifecycle is [`bootstrap`](Self::bootstrap), [`start`](Self::start),
/// [`subscribe`](Self::subscribe), then [`shutdown`](Self::shutdown) on exit.
/// Updates can also be applied directly through the `apply_*` methods, which
/// run the same reconciliation the listeners do.
pub struct SensorGateway {
    name: String,
    topics: UpdateTopics,
    reconciler: Arc<Reconciler>,
    subscriptions: Mutex<Option<UpdateSubscriptions>>,
}

impl SensorGateway {
    /// Creates a gateway whose sensors publish their configured reading.
    pub fn new(
        name: &str,
        config: GatewayConfig,
        topics: UpdateTopics,
        sessions: Arc<dyn PublishSessionBuilder>,
    ) -> Self {
        Self::with_generator(
            name,
            config,
            topics,
            sessions,
            Arc::new(ConfiguredValueGenerator),
        )
    }

    pub fn with_generator(
        name: &str,
        config: GatewayConfig,
        topics: UpdateTopics,
        sessions: Arc<dyn PublishSessionBuilder>,
        generator: Arc<dyn SampleGenerator>,
    ) -> Self {
        let publisher = SamplePublisher::new(
            topics.samples.clone(),
            sessions,
            config.publish_retries,
            config.publish_retry_delay(),
        );
        let reconciler = Reconciler::new(Arc::new(publisher), generator, config);

        info!(
            event = events::GATEWAY_CREATED,
            component = COMPONENT,
            gateway = name,
            samples_topic = %fields::format_uri(&topics.samples),
            "sensor gateway created"
        );

        Self {
            name: name.to_string(),
            topics,
            reconciler: Arc::new(reconciler),
            subscriptions: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topics(&self) -> &UpdateTopics {
        &self.topics
    }

    /// Loads nodes and sensors from `store`. Call once, before [`start`](Self::start).
    pub async fn bootstrap(&self, store: &dyn NodeStore) -> Result<BootstrapReport, UStatus> {
        loader::load(store, self.reconciler.registry()).await
    }

    /// Starts every available node and its available sensors. Nodes registered
    /// by updates since the previous start are picked up here.
    pub async fn start(&self) -> usize {
        let started = self.reconciler.start_all().await;
        info!(
            event = events::GATEWAY_START,
            component = COMPONENT,
            gateway = self.name.as_str(),
            nodes_started = started,
            "sensor gateway started"
        );
        started
    }

    /// Registers the node-update, sensor-update and sensor-availability
    /// listeners on `transport`.
    pub async fn subscribe(
        &self,
        transport: Arc<dyn UTransport>,
    ) -> Result<(), ListenerRegistrationError> {
        let mut subscriptions = self.subscriptions.lock().await;
        if subscriptions.is_some() {
            return Err(ListenerRegistrationError::AlreadySubscribed);
        }

        *subscriptions = Some(
            UpdateSubscriptions::register(transport, &self.topics, self.reconciler.clone())
                .await?,
        );
        Ok(())
    }

    pub async fn unsubscribe(&self) -> Result<(), ListenerRegistrationError> {
        let subscriptions = self.subscriptions.lock().await.take();
        match subscriptions {
            Some(subscriptions) => subscriptions.unregister().await,
            None => Err(ListenerRegistrationError::NotSubscribed),
        }
    }

    pub async fn apply_node_update(&self, record: NodeRecord) -> NodeReconciliation {
        self.reconciler.replace_node(record).await
    }

    pub async fn apply_sensor_update(
        &self,
        record: SensorRecord,
    ) -> Result<SensorReconciliation, ReconcileError> {
        self.reconciler.replace_sensor(record).await
    }

    pub async fn apply_sensor_availability(
        &self,
        update: SensorAvailability,
    ) -> Result<SensorReconciliation, ReconcileError> {
        self.reconciler.apply_availability(update).await
    }

    pub async fn node(&self, node_id: &str) -> Option<NodeSnapshot> {
        self.reconciler.node_snapshot(node_id).await
    }

    pub async fn sensor(&self, code: &str) -> Option<SensorSnapshot> {
        self.reconciler.sensor_snapshot(code).await
    }

    /// All nodes, ordered by identifier.
    pub async fn nodes(&self) -> Vec<NodeSnapshot> {
        self.reconciler.node_snapshots().await
    }

    /// Unregisters the listeners, if any, then stops every producer.
    ///
    /// Returns the number of producers that were stopped. The registry is kept,
    /// so a later [`start`](Self::start) resumes production.
    pub async fn shutdown(&self) -> usize {
        match self.unsubscribe().await {
            Ok(()) | Err(ListenerRegistrationError::NotSubscribed) => {}
            Err(err) => warn!(
                event = events::UPDATE_LISTENER_UNREGISTER_FAILED,
                component = COMPONENT,
                gateway = self.name.as_str(),
                err = %err,
                "unable to unregister update listeners during shutdown"
            ),
        }

        let stopped = self.reconciler.stop_all().await;
        info!(
            event = events::GATEWAY_SHUTDOWN,
            component = COMPONENT,
            gateway = self.name.as_str(),
            producers_stopped = stopped,
            "sensor gateway stopped"
        );
        stopped
    }
}
