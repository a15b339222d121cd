#![allow(dead_code)]

use async_trait::async_trait;
use sensor_gateway::{
    split_record_array, DeliveryGuarantee, GatewayConfig, NodeStore, PublishSessionBuilder,
    Record, Sample, SampleGenerator, SensorGateway, SensorRecord, TopicConfig, UpdateTopics,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use up_rust::{
    UCode, UListener, UMessage, UMessageBuilder, UPayloadFormat, UStatus, UTransport, UUri,
};

pub(crate) const SAMPLE_INTERVAL: Duration = Duration::from_millis(5);

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub(crate) fn topics() -> UpdateTopics {
    TopicConfig::default()
        .with_authority("gateway-test")
        .build()
        .expect("test topics should build")
}

pub(crate) fn make_gateway(name: &str, sessions: Arc<RecordingSessions>) -> SensorGateway {
    let config = GatewayConfig::default()
        .with_sample_interval(SAMPLE_INTERVAL)
        .with_publish_retries(0, Duration::ZERO);
    SensorGateway::with_generator(name, config, topics(), sessions, Arc::new(TaggedGenerator))
}

/// Wraps the record's configured value with a per-generation sequence number.
pub(crate) struct TaggedGenerator;

impl SampleGenerator for TaggedGenerator {
    fn generate(&self, sensor: &SensorRecord, sequence: u64) -> Value {
        json!({"gen": sensor.value, "seq": sequence})
    }
}

pub(crate) fn generation_of(sample: &Sample) -> Value {
    sample.value["gen"].clone()
}

pub(crate) fn sequence_of(sample: &Sample) -> u64 {
    sample.value["seq"].as_u64().expect("tagged sample carries a sequence")
}

/// Asserts that samples form one contiguous run per generation, each run
/// counting up from zero without gaps.
pub(crate) fn assert_generations_do_not_interleave(history: &[Sample]) {
    let mut finished: Vec<Value> = Vec::new();
    let mut current: Option<(Value, u64)> = None;

    for sample in history {
        let generation = generation_of(sample);
        let sequence = sequence_of(sample);
        match current.take() {
            Some((active, last)) if active == generation => {
                assert_eq!(sequence, last + 1, "gap or reorder inside generation {active}");
                current = Some((active, sequence));
            }
            previous => {
                if let Some((active, _)) = previous {
                    finished.push(active);
                }
                assert!(
                    !finished.contains(&generation),
                    "generation {generation} produced again after it was replaced"
                );
                assert_eq!(sequence, 0, "generation {generation} did not start at zero");
                current = Some((generation, sequence));
            }
        }
    }
}

pub(crate) async fn wait_for_history(gateway: &SensorGateway, code: &str, at_least: usize) {
    for _ in 0..200 {
        let sensor = gateway.sensor(code).await.expect("sensor should be registered");
        if sensor.history.len() >= at_least {
            return;
        }
        tokio::time::sleep(SAMPLE_INTERVAL).await;
    }
    panic!("sensor {code} did not reach {at_least} samples");
}

/// Session builder whose sessions decode and record every published sample.
#[derive(Default)]
pub(crate) struct RecordingSessions {
    opened: AtomicUsize,
    closed: AtomicUsize,
    clients: Mutex<Vec<(String, DeliveryGuarantee)>>,
    published: Arc<Mutex<Vec<Sample>>>,
}

impl RecordingSessions {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn clients(&self) -> Vec<(String, DeliveryGuarantee)> {
        self.clients.lock().expect("lock clients").clone()
    }

    pub(crate) fn published(&self) -> Vec<Sample> {
        self.published.lock().expect("lock published").clone()
    }
}

struct RecordingSession {
    published: Arc<Mutex<Vec<Sample>>>,
}

#[async_trait]
impl UTransport for RecordingSession {
    async fn send(&self, message: UMessage) -> Result<(), UStatus> {
        let sample = message
            .payload
            .as_deref()
            .and_then(Sample::decode)
            .ok_or_else(|| UStatus::fail_with_code(UCode::INVALID_ARGUMENT, "not a sample"))?;
        self.published.lock().expect("lock published").push(sample);
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
        Err(UStatus::fail_with_code(
            UCode::UNIMPLEMENTED,
            "publish sessions do not listen",
        ))
    }

    async fn unregister_listener(
        &self,
        _source_filter: &UUri,
        _sink_filter: Option<&UUri>,
        _listener: Arc<dyn UListener>,
    ) -> Result<(), UStatus> {
        Err(UStatus::fail_with_code(
            UCode::UNIMPLEMENTED,
            "publish sessions do not listen",
        ))
    }
}

#[async_trait]
impl PublishSessionBuilder for RecordingSessions {
    async fn open(
        &self,
        client_id: &str,
        delivery: DeliveryGuarantee,
    ) -> Result<Box<dyn UTransport>, UStatus> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.clients
            .lock()
            .expect("lock clients")
            .push((client_id.to_string(), delivery));
        Ok(Box::new(RecordingSession {
            published: self.published.clone(),
        }))
    }

    async fn close(&self, _client_id: &str, session: Box<dyn UTransport>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        drop(session);
    }
}

/// In-process transport that delivers a published message to every listener
/// registered for its source topic, before `send` returns.
#[derive(Default)]
pub(crate) struct LoopbackTransport {
    listeners: Mutex<Vec<(UUri, Arc<dyn UListener>)>>,
}

impl LoopbackTransport {
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.lock().expect("lock listeners").len()
    }

    pub(crate) async fn publish_json(&self, topic: &UUri, body: &str) {
        let message = UMessageBuilder::publish(topic.clone())
            .build_with_payload(body.as_bytes().to_vec(), UPayloadFormat::UPAYLOAD_FORMAT_JSON)
            .expect("publish message should build");
        self.send(message).await.expect("loopback send should succeed");
    }
}

#[async_trait]
impl UTransport for LoopbackTransport {
    async fn send(&self, message: UMessage) -> Result<(), UStatus> {
        let source = message
            .attributes
            .as_ref()
            .and_then(|attributes| attributes.source.as_ref())
            .cloned()
            .ok_or_else(|| UStatus::fail_with_code(UCode::INVALID_ARGUMENT, "missing source"))?;

        let matching: Vec<Arc<dyn UListener>> = self
            .listeners
            .lock()
            .expect("lock listeners")
            .iter()
            .filter(|(topic, _)| *topic == source)
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in matching {
            listener.on_receive(message.clone()).await;
        }
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
        source_filter: &UUri,
        _sink_filter: Option<&UUri>,
        listener: Arc<dyn UListener>,
    ) -> Result<(), UStatus> {
        self.listeners
            .lock()
            .expect("lock listeners")
            .push((source_filter.clone(), listener));
        Ok(())
    }

    async fn unregister_listener(
        &self,
        source_filter: &UUri,
        _sink_filter: Option<&UUri>,
        listener: Arc<dyn UListener>,
    ) -> Result<(), UStatus> {
        let mut listeners = self.listeners.lock().expect("lock listeners");
        let before = listeners.len();
        listeners.retain(|(topic, registered)| {
            !(topic == source_filter && Arc::ptr_eq(registered, &listener))
        });
        if listeners.len() == before {
            return Err(UStatus::fail_with_code(UCode::NOT_FOUND, "no such listener"));
        }
        Ok(())
    }
}

/// Store backed by two JSON array documents.
pub(crate) struct MemoryStore {
    nodes: String,
    sensors: String,
}

impl MemoryStore {
    pub(crate) fn new(nodes: &str, sensors: &str) -> Self {
        Self {
            nodes: nodes.to_string(),
            sensors: sensors.to_string(),
        }
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn list_nodes(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        split_record_array(self.nodes.as_bytes())
    }

    async fn list_sensors(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        split_record_array(self.sensors.as_bytes())
    }
}

/// Store whose sensor listing is unreachable.
pub(crate) struct UnreachableSensorStore;

#[async_trait]
impl NodeStore for UnreachableSensorStore {
    async fn list_nodes(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        split_record_array(br#"[{"nodeId":"n1","available":true}]"#)
    }

    async fn list_sensors(&self) -> Result<Vec<Vec<u8>>, UStatus> {
        Err(UStatus::fail_with_code(UCode::UNAVAILABLE, "store offline"))
    }
}
