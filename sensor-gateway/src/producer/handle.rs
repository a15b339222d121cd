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

//! Cancellable producer task handle with join-before-replace semantics.

use crate::observability::events;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use up_rust::UUID;

const COMPONENT: &str = "producer_handle";

/// Kind of entity a producer task belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ProducerKind {
    Node,
    Sensor,
}

impl ProducerKind {
    fn as_str(&self) -> &'static str {
        match self {
            ProducerKind::Node => "node",
            ProducerKind::Sensor => "sensor",
        }
    }
}

/// Owns one spawned producer task: its cancellation token and join handle.
pub(crate) struct ProducerHandle {
    producer_id: String,
    kind: ProducerKind,
    subject: String,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl ProducerHandle {
    /// Spawns `run` on the current runtime with a fresh producer id and token.
    pub(crate) fn spawn<F, Fut>(kind: ProducerKind, subject: &str, run: F) -> Self
    where
        F: FnOnce(String, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let producer_id = UUID::build().to_hyphenated_string();
        let cancel = CancellationToken::new();
        let join = tokio::spawn(run(producer_id.clone(), cancel.clone()));

        debug!(
            event = events::PRODUCER_SPAWN,
            component = COMPONENT,
            producer_kind = kind.as_str(),
            subject,
            producer_id = producer_id.as_str(),
            "spawned producer task"
        );

        Self {
            producer_id,
            kind,
            subject: subject.to_string(),
            cancel,
            join,
        }
    }

    pub(crate) fn producer_id(&self) -> &str {
        &self.producer_id
    }

    /// Signals cancellation and waits until the task has fully exited.
    pub(crate) async fn stop(self) {
        debug!(
            event = events::PRODUCER_STOP_REQUESTED,
            component = COMPONENT,
            producer_kind = self.kind.as_str(),
            subject = self.subject.as_str(),
            producer_id = self.producer_id.as_str(),
            "stopping producer task"
        );
        self.cancel.cancel();

        match self.join.await {
            Ok(()) => debug!(
                event = events::PRODUCER_STOPPED,
                component = COMPONENT,
                producer_kind = self.kind.as_str(),
                subject = self.subject.as_str(),
                producer_id = self.producer_id.as_str(),
                "producer task stopped"
            ),
            Err(err) => warn!(
                event = events::PRODUCER_JOIN_FAILED,
                component = COMPONENT,
                producer_kind = self.kind.as_str(),
                subject = self.subject.as_str(),
                producer_id = self.producer_id.as_str(),
                err = %err,
                "producer task ended abnormally"
            ),
        }
    }
}

/// Producer ownership state of a registry entry.
#[derive(Default)]
pub(crate) enum ProducerSlot {
    #[default]
    Idle,
    Running(ProducerHandle),
    /// Cancellation was signalled and the owner is joining the task outside the registry lock.
    Draining,
}

impl ProducerSlot {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, ProducerSlot::Idle)
    }

    pub(crate) fn is_running(&self) -> bool {
        matches!(self, ProducerSlot::Running(_))
    }

    /// Takes the running handle, leaving the slot `Draining`. Idle slots stay idle.
    pub(crate) fn begin_drain(&mut self) -> Option<ProducerHandle> {
        match std::mem::take(self) {
            ProducerSlot::Running(handle) => {
                *self = ProducerSlot::Draining;
                Some(handle)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    pub(crate) fn finish_drain(&mut self) {
        if matches!(self, ProducerSlot::Draining) {
            *self = ProducerSlot::Idle;
        }
    }

    /// Takes the running handle and resets the slot to `Idle`.
    pub(crate) fn take(&mut self) -> Option<ProducerHandle> {
        match std::mem::take(self) {
            ProducerSlot::Running(handle) => Some(handle),
            other => {
                *self = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ProducerHandle, ProducerKind, ProducerSlot};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn stop_returns_only_after_task_exit() {
        let exited = Arc::new(AtomicBool::new(false));
        let exited_in_task = exited.clone();

        let handle = ProducerHandle::spawn(ProducerKind::Sensor, "s1", |_, cancel| async move {
            cancel.cancelled().await;
            tokio::task::yield_now().await;
            exited_in_task.store(true, Ordering::SeqCst);
        });

        handle.stop().await;
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn begin_drain_only_moves_running_slots() {
        let mut idle = ProducerSlot::Idle;
        assert!(idle.begin_drain().is_none());
        assert!(idle.is_idle());

        let mut running = ProducerSlot::Running(ProducerHandle::spawn(
            ProducerKind::Node,
            "n1",
            |_, cancel| async move { cancel.cancelled().await },
        ));
        let handle = running.begin_drain().expect("running slot yields its handle");
        assert!(matches!(running, ProducerSlot::Draining));
        assert!(!running.is_idle());

        handle.stop().await;
        running.finish_drain();
        assert!(running.is_idle());
    }
}
