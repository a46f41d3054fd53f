//! In-memory task queue implementation for testing.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No persistence, no distribution
//! - **Single-process only**: Units are not visible across process boundaries
//! - **No delay support**: The delay option is accepted but ignored
//! - **Deduplication is queue-scoped**: Keys are released when units are
//!   dequeued

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use ulid::Ulid;

use super::{BatchEnvelope, EnqueueOptions, EnqueueResult, TaskQueue};
use crate::error::{Error, Result};

/// Entry in the in-memory queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Message ID.
    pub message_id: String,
    /// Idempotency key for deduplication.
    pub idempotency_key: String,
    /// Batch envelope.
    pub envelope: BatchEnvelope,
    /// Options used when enqueuing.
    pub options: EnqueueOptions,
}

/// Internal queue state protected by a single lock.
#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<QueueEntry>,
    seen_keys: HashMap<String, String>,
}

/// In-memory task queue for testing.
///
/// Thread-safe implementation of the [`TaskQueue`] trait using `RwLock` for
/// synchronization. A test failure mode can be simulated with
/// [`InMemoryTaskQueue::fail_after`].
#[derive(Debug)]
pub struct InMemoryTaskQueue {
    name: String,
    state: RwLock<QueueState>,
    max_capacity: Option<usize>,
    /// When set, enqueue returns a dispatch error once this many entries
    /// exist. Used to exercise the orchestrator's failure path.
    fail_after: Option<usize>,
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("task queue lock poisoned")
}

impl InMemoryTaskQueue {
    /// Creates a new in-memory task queue.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(QueueState::default()),
            max_capacity: None,
            fail_after: None,
        }
    }

    /// Creates a queue with a maximum capacity.
    #[must_use]
    pub fn with_capacity(name: impl Into<String>, max_capacity: usize) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            ..Self::new(name)
        }
    }

    /// Creates a queue that errors on enqueue once `threshold` entries exist.
    #[must_use]
    pub fn fail_after(name: impl Into<String>, threshold: usize) -> Self {
        Self {
            fail_after: Some(threshold),
            ..Self::new(name)
        }
    }

    /// Generates a new message ID.
    fn generate_message_id() -> String {
        Ulid::new().to_string()
    }

    /// Takes the next unit from the queue.
    ///
    /// Returns `None` if the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn take(&self) -> Result<Option<QueueEntry>> {
        let mut state = self.state.write().map_err(poison_err)?;
        let entry = state.queue.pop_front();
        if let Some(ref entry) = entry {
            state.seen_keys.remove(&entry.idempotency_key);
        }
        drop(state);
        Ok(entry)
    }

    /// Peeks at the next unit without removing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn peek(&self) -> Result<Option<QueueEntry>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.queue.front().cloned())
    }

    /// Returns all enqueued units, emptying the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn drain(&self) -> Result<Vec<QueueEntry>> {
        let mut state = self.state.write().map_err(poison_err)?;
        let drained: Vec<_> = state.queue.drain(..).collect();
        for entry in &drained {
            state.seen_keys.remove(&entry.idempotency_key);
        }
        drop(state);
        Ok(drained)
    }

    /// Clears the queue and deduplication state.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.queue.clear();
        state.seen_keys.clear();
        drop(state);
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(
        &self,
        envelope: BatchEnvelope,
        options: EnqueueOptions,
    ) -> Result<EnqueueResult> {
        let idempotency_key = envelope.idempotency_key();

        let mut state = self.state.write().map_err(poison_err)?;

        if let Some(threshold) = self.fail_after {
            if state.queue.len() >= threshold {
                return Err(Error::dispatch("injected enqueue failure"));
            }
        }

        if let Some(existing) = state.seen_keys.get(&idempotency_key) {
            return Ok(EnqueueResult::Deduplicated {
                existing_message_id: existing.clone(),
            });
        }

        if let Some(max) = self.max_capacity {
            if state.queue.len() >= max {
                return Ok(EnqueueResult::QueueFull);
            }
        }

        let message_id = Self::generate_message_id();
        state
            .seen_keys
            .insert(idempotency_key.clone(), message_id.clone());
        state.queue.push_back(QueueEntry {
            message_id: message_id.clone(),
            idempotency_key,
            envelope,
            options,
        });
        drop(state);

        Ok(EnqueueResult::Enqueued { message_id })
    }

    async fn queue_depth(&self) -> Result<usize> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.queue.len())
    }

    fn queue_name(&self) -> &str {
        &self.name
    }
}
