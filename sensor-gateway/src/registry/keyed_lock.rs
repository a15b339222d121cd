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

//! One async mutex per registry entity.
//!
//! Entries live only while a guard holds or waits on them, so keys of
//! removed or never-registered entities do not accumulate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = StdMutex<HashMap<EntityKey, Arc<Mutex<()>>>>;

/// Entity a reconciliation serializes on.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum EntityKey {
    Node(String),
    Sensor(String),
}

impl EntityKey {
    pub(crate) fn node(node_id: &str) -> Self {
        EntityKey::Node(node_id.to_string())
    }

    pub(crate) fn sensor(code: &str) -> Self {
        EntityKey::Sensor(code.to_string())
    }
}

/// Hands out per-key locks. Callers that need both a node and a sensor key
/// must acquire the node key first.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Arc<LockTable>,
}

impl KeyedLocks {
    pub(crate) async fn lock(&self, key: EntityKey) -> KeyGuard {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.clone()).or_default().clone()
        };

        // Built before waiting, so a cancelled wait still cleans up the entry.
        let mut guard = KeyGuard {
            key,
            table: self.locks.clone(),
            entry: Some(entry.clone()),
            held: None,
        };
        guard.held = Some(entry.lock_owned().await);
        guard
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

/// Exclusive hold on one entity key; released on drop.
pub(crate) struct KeyGuard {
    key: EntityKey,
    table: Arc<LockTable>,
    entry: Option<Arc<Mutex<()>>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        drop(self.entry.take());

        // Clones are only taken under the table lock, so a count of one here
        // means no other guard holds or waits on this key.
        let mut locks = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
