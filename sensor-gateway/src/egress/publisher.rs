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

//! Publishes samples, one dedicated session per message.

use crate::egress::session::{DeliveryGuarantee, PublishSessionBuilder};
use crate::model::codec::{Record, RecordError};
use crate::model::sample::Sample;
use crate::observability::{events, fields};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn, Level};
use up_rust::{UMessage, UMessageBuilder, UMessageError, UPayloadFormat, UStatus, UUri};

const COMPONENT: &str = "sample_publisher";
const SAMPLE_DELIVERY: DeliveryGuarantee = DeliveryGuarantee::ExactlyOnce;

#[derive(Debug)]
pub enum PublishError {
    Encode(RecordError),
    Message(UMessageError),
    Transport { attempts: u32, status: UStatus },
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Encode(err) => write!(f, "{err}"),
            PublishError::Message(err) => write!(f, "unable to build publish message: {err:?}"),
            PublishError::Transport { attempts, status } => {
                write!(f, "publish failed after {attempts} attempt(s): {status}")
            }
        }
    }
}

impl Error for PublishError {}

pub(crate) struct SamplePublisher {
    topic: UUri,
    sessions: Arc<dyn PublishSessionBuilder>,
    retries: u32,
    retry_delay: Duration,
}

impl SamplePublisher {
    pub(crate) fn new(
        topic: UUri,
        sessions: Arc<dyn PublishSessionBuilder>,
        retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            topic,
            sessions,
            retries,
            retry_delay,
        }
    }

    /// Sends `sample` on the samples topic, retrying transport failures.
    pub(crate) async fn publish(&self, sample: &Sample) -> Result<(), PublishError> {
        let payload = sample.encode().map_err(PublishError::Encode)?;
        let message = UMessageBuilder::publish(self.topic.clone())
            .build_with_payload(payload, UPayloadFormat::UPAYLOAD_FORMAT_JSON)
            .map_err(PublishError::Message)?;
        let msg_id = tracing::enabled!(Level::DEBUG).then(|| fields::format_message_id(&message));

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if let Some(msg_id) = msg_id.as_deref() {
                debug!(
                    event = events::PUBLISH_ATTEMPT,
                    component = COMPONENT,
                    sensor_code = sample.code.as_str(),
                    msg_id,
                    attempt,
                    "attempting sample publish"
                );
            }

            match self.send_once(&sample.code, message.clone()).await {
                Ok(()) => {
                    if let Some(msg_id) = msg_id.as_deref() {
                        debug!(
                            event = events::PUBLISH_OK,
                            component = COMPONENT,
                            sensor_code = sample.code.as_str(),
                            msg_id,
                            attempt,
                            "sample published"
                        );
                    }
                    return Ok(());
                }
                Err(status) => {
                    warn!(
                        event = events::PUBLISH_FAILED,
                        component = COMPONENT,
                        sensor_code = sample.code.as_str(),
                        attempt,
                        err = %status,
                        "sample publish attempt failed"
                    );
                    if attempt > self.retries {
                        return Err(PublishError::Transport {
                            attempts: attempt,
                            status,
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn send_once(&self, client_id: &str, message: UMessage) -> Result<(), UStatus> {
        let session = match self.sessions.open(client_id, SAMPLE_DELIVERY).await {
            Ok(session) => session,
            Err(status) => {
                warn!(
                    event = events::PUBLISH_SESSION_OPEN_FAILED,
                    component = COMPONENT,
                    sensor_code = client_id,
                    err = %status,
                    "unable to open publish session"
                );
                return Err(status);
            }
        };

        let result = session.send(message).await;
        self.sessions.close(client_id, session).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{PublishError, SamplePublisher};
    use crate::egress::session::{DeliveryGuarantee, PublishSessionBuilder};
    use crate::model::sample::Sample;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use up_rust::{UCode, UListener, UMessage, UStatus, UTransport, UUri};

    struct CapturingTransport {
        sent: Arc<Mutex<Vec<UMessage>>>,
    }

    #[async_trait]
    impl UTransport for CapturingTransport {
        async fn send(&self, message: UMessage) -> Result<(), UStatus> {
            self.sent.lock().expect("lock").push(message);
            Ok(())
        }

        async fn receive(
            &self,
            _source_filter: &UUri,
            _sink_filter: Option<&UUri>,
        ) -> Result<UMessage, UStatus> {
            Err(UStatus::fail_with_code(
                UCode::UNIMPLEMENTED,
                "not used in tests",
            ))
        }

        async fn register_listener(
            &self,
            _source_filter: &UUri,
            _sink_filter: Option<&UUri>,
            _listener: Arc<dyn UListener>,
        ) -> Result<(), UStatus> {
            Ok(())
        }

        async fn unregister_listener(
            &self,
            _source_filter: &UUri,
            _sink_filter: Option<&UUri>,
            _listener: Arc<dyn UListener>,
        ) -> Result<(), UStatus> {
            Ok(())
        }
    }

    /// Fails the first `failures` opens, then hands out capturing sessions.
    struct FlakySessions {
        failures: u32,
        opens: AtomicU32,
        clients: Mutex<Vec<(String, DeliveryGuarantee)>>,
        sent: Arc<Mutex<Vec<UMessage>>>,
    }

    impl FlakySessions {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                opens: AtomicU32::new(0),
                clients: Mutex::new(Vec::new()),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl PublishSessionBuilder for FlakySessions {
        async fn open(
            &self,
            client_id: &str,
            delivery: DeliveryGuarantee,
        ) -> Result<Box<dyn UTransport>, UStatus> {
            let open = self.opens.fetch_add(1, Ordering::SeqCst);
            self.clients
                .lock()
                .expect("lock")
                .push((client_id.to_string(), delivery));
            if open < self.failures {
                return Err(UStatus::fail_with_code(UCode::UNAVAILABLE, "broker down"));
            }
            Ok(Box::new(CapturingTransport {
                sent: self.sent.clone(),
            }))
        }
    }

    fn topic() -> UUri {
        UUri::try_from_parts("gateway", 0x5ba0, 0x1, 0x8004).expect("topic should build")
    }

    #[tokio::test]
    async fn publish_uses_sensor_code_and_strongest_delivery() {
        let sessions = Arc::new(FlakySessions::new(0));
        let publisher = SamplePublisher::new(topic(), sessions.clone(), 0, Duration::ZERO);

        publisher
            .publish(&Sample::new("s1", json!(42)))
            .await
            .expect("publish should succeed");

        assert_eq!(
            *sessions.clients.lock().expect("lock"),
            vec![("s1".to_string(), DeliveryGuarantee::ExactlyOnce)]
        );
        let sent = sessions.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        let payload = sent[0].payload.as_deref().expect("payload present");
        let raw: serde_json::Value = serde_json::from_slice(payload).expect("json payload");
        assert_eq!(raw["code"], "s1");
        assert_eq!(raw["value"], 42);
    }

    #[tokio::test]
    async fn publish_retries_transport_failures() {
        let sessions = Arc::new(FlakySessions::new(2));
        let publisher = SamplePublisher::new(topic(), sessions.clone(), 2, Duration::from_millis(1));

        publisher
            .publish(&Sample::new("s1", json!(1)))
            .await
            .expect("third attempt should succeed");

        assert_eq!(sessions.opens.load(Ordering::SeqCst), 3);
        assert_eq!(sessions.sent.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn publish_gives_up_after_retries() {
        let sessions = Arc::new(FlakySessions::new(u32::MAX));
        let publisher = SamplePublisher::new(topic(), sessions.clone(), 1, Duration::from_millis(1));

        let err = publisher
            .publish(&Sample::new("s1", json!(1)))
            .await
            .expect_err("publish should fail");

        assert!(matches!(err, PublishError::Transport { attempts: 2, .. }));
        assert!(sessions.sent.lock().expect("lock").is_empty());
    }
}
