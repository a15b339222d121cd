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

mod config;
mod http_store;
mod mqtt_session;

use crate::config::{Config, StoreConfig};
use crate::http_store::HttpNodeStore;
use crate::mqtt_session::MqttSessionBuilder;
use clap::Parser;
use node_store_static_file::NodeStoreStaticFile;
use sensor_gateway::{NodeStore, SensorGateway};
use std::fs::File;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use up_rust::{UCode, UStatus, UTransport};
use up_transport_mqtt5::{Mqtt5Transport, Mqtt5TransportOptions, MqttClientOptions};

#[derive(Parser)]
#[command()]
struct GatewayArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), UStatus> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started configurable-gateway");

    // Get the config file.
    let args = GatewayArgs::parse();
    let mut file = File::open(args.config)
        .map_err(|e| UStatus::fail_with_code(UCode::NOT_FOUND, format!("File not found: {e:?}")))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        UStatus::fail_with_code(
            UCode::INTERNAL,
            format!("Unable to read config file: {e:?}"),
        )
    })?;

    let config: Config = json5::from_str(&contents).map_err(|e| {
        UStatus::fail_with_code(
            UCode::INTERNAL,
            format!("Unable to parse config file: {e:?}"),
        )
    })?;

    let topics = config.topics.build()?;
    let authority = config.topics.authority.clone();
    let sessions = Arc::new(MqttSessionBuilder::new(&config.mqtt));
    let gateway = SensorGateway::new("configurable-gateway", config.gateway, topics, sessions);

    // Rebuild the registry from the store; a failing store aborts startup.
    let store: Box<dyn NodeStore> = match config.store {
        StoreConfig::StaticFile {
            nodes_file,
            sensors_file,
        } => Box::new(NodeStoreStaticFile::new(nodes_file, sensors_file)),
        StoreConfig::Http {
            base_url,
            request_timeout_ms,
        } => Box::new(HttpNodeStore::new(
            &base_url,
            request_timeout_ms.map(Duration::from_millis),
        )?),
    };
    let report = gateway.bootstrap(store.as_ref()).await?;
    info!("Bootstrap finished: {report:?}");

    let nodes_started = gateway.start().await;
    info!("Started {nodes_started} nodes");

    // Long-lived connection for the update topics.
    let mqtt_client_options = MqttClientOptions {
        broker_uri: config.mqtt.broker_uri.clone(),
        ..Default::default()
    };
    let mqtt_transport_options = Mqtt5TransportOptions {
        mqtt_client_options,
        ..Default::default()
    };
    let mqtt5_transport = Mqtt5Transport::new(mqtt_transport_options, authority).await?;
    mqtt5_transport.connect().await?;
    let mqtt5_transport: Arc<dyn UTransport> = Arc::new(mqtt5_transport);

    gateway
        .subscribe(mqtt5_transport)
        .await
        .map_err(|e| UStatus::fail_with_code(UCode::INTERNAL, e.to_string()))?;

    tokio::signal::ctrl_c().await.map_err(|e| {
        UStatus::fail_with_code(
            UCode::INTERNAL,
            format!("Unable to wait for shutdown signal: {e:?}"),
        )
    })?;

    let stopped = gateway.shutdown().await;
    info!("Stopped {stopped} producers");
    Ok(())
}
