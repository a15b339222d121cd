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

//! Per-sensor sampling loop.

use crate::egress::publisher::SamplePublisher;
use crate::model::sample::Sample;
use crate::model::sensor::SensorRecord;
use crate::observability::events;
use crate::producer::generator::SampleGenerator;
use crate::producer::handle::{ProducerHandle, ProducerKind};
use crate::registry::entry::SampleHistory;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const COMPONENT: &str = "sample_producer";
const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Everything one sensor generation needs to produce samples.
pub(crate) struct SampleProducer {
    record: SensorRecord,
    history: SampleHistory,
    publisher: Arc<SamplePublisher>,
    generator: Arc<dyn SampleGenerator>,
    interval: Duration,
}

impl SampleProducer {
    pub(crate) fn new(
        record: SensorRecord,
        history: SampleHistory,
        publisher: Arc<SamplePublisher>,
        generator: Arc<dyn SampleGenerator>,
        default_interval: Duration,
    ) -> Self {
        let interval = record
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(default_interval)
            .max(MIN_SAMPLE_INTERVAL);

        Self {
            record,
            history,
            publisher,
            generator,
            interval,
        }
    }

    pub(crate) fn spawn(self) -> ProducerHandle {
        let code = self.record.code.clone();
        ProducerHandle::spawn(ProducerKind::Sensor, &code, move |producer_id, cancel| {
            self.run(producer_id, cancel)
        })
    }

    /// Samples until cancelled. Cancellation is observed between samples only, so
    /// a sample that was generated is always recorded and handed to the publisher.
    pub(crate) async fn run(self, producer_id: String, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sequence: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let value = self.generator.generate(&self.record, sequence);
            sequence += 1;
            let sample = Sample::new(&self.record.code, value);
            self.history.append(sample.clone()).await;

            debug!(
                event = events::SAMPLE_PRODUCED,
                component = COMPONENT,
                producer_id = producer_id.as_str(),
                sensor_code = self.record.code.as_str(),
                sequence,
                "sample produced"
            );

            if let Err(err) = self.publisher.publish(&sample).await {
                warn!(
                    event = events::SAMPLE_DROPPED,
                    component = COMPONENT,
                    producer_id = producer_id.as_str(),
                    sensor_code = self.record.code.as_str(),
                    sequence,
                    err = %err,
                    "sample could not be published; dropping it"
                );
            }
        }
    }
}
