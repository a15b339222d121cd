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

//! # sensor-gateway
//!
//! `sensor-gateway` keeps an in-memory registry of nodes and their sensors
//! consistent with updates arriving over uProtocol, while every running sensor
//! publishes samples back onto the same transport.
//!
//! Typical usage is API-first and centered on [`SensorGateway`]:
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use sensor_gateway::{
//!     DeliveryGuarantee, GatewayConfig, LifecycleState, NodeRecord, NodeReconciliation,
//!     PublishSessionBuilder, SensorGateway, SensorRecord, TopicConfig,
//! };
//! use up_rust::{UCode, UStatus, UTransport};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl PublishSessionBuilder for Offline {
//!     async fn open(
//!         &self,
//!         _client_id: &str,
//!         _delivery: DeliveryGuarantee,
//!     ) -> Result<Box<dyn UTransport>, UStatus> {
//!         Err(UStatus::fail_with_code(UCode::UNAVAILABLE, "offline"))
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let topics = TopicConfig::default().build().unwrap();
//! let gateway = SensorGateway::new("quick-start", GatewayConfig::default(), topics, Arc::new(Offline));
//!
//! let node = NodeRecord::new("n1", true).with_sensor(SensorRecord::new("s1", "n1", true));
//! assert_eq!(gateway.apply_node_update(node).await, NodeReconciliation::Registered);
//!
//! assert_eq!(gateway.start().await, 1);
//! let sensor = gateway.sensor("s1").await.unwrap();
//! assert_eq!(sensor.state, LifecycleState::Running);
//!
//! gateway.shutdown().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Model: node, sensor, availability and sample records with their JSON codec
//! - Registry: node table, sensor code index, per-entity key locks
//! - Producers: one cancellable task per running node and per running sensor
//! - Reconcile: node replacement, sensor replacement and deactivation
//! - Ingress: update listeners registered on a `UTransport`
//! - Egress: sample publishing over short-lived sessions
//! - Bootstrap: one-shot registry population from a [`NodeStore`]
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events and never installs a subscriber;
//! binaries and tests initialize `tracing_subscriber` themselves.

mod bootstrap;
pub use bootstrap::loader::BootstrapReport;
pub use bootstrap::store::{split_record_array, NodeStore};

mod config;
pub use config::GatewayConfig;

mod egress;
pub use egress::publisher::PublishError;
pub use egress::session::{DeliveryGuarantee, PublishSessionBuilder};

mod gateway;
pub use gateway::SensorGateway;

mod ingress;
pub use ingress::subscriptions::ListenerRegistrationError;
pub use ingress::update_listener::UpdateKind;

mod model;
pub use model::codec::{Record, RecordError};
pub use model::node::NodeRecord;
pub use model::sample::Sample;
pub use model::sensor::{SensorAvailability, SensorRecord};

#[doc(hidden)]
pub mod observability;

mod producer;
pub use producer::generator::{ConfiguredValueGenerator, SampleGenerator};

mod reconcile;
pub use reconcile::{NodeReconciliation, ReconcileError, SensorReconciliation};

mod registry;
pub use registry::snapshot::{LifecycleState, NodeSnapshot, SensorSnapshot};

mod topics;
pub use topics::{TopicConfig, UpdateTopics};
