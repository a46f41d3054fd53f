//! # courant-send
//!
//! Campaign lifecycle and send orchestration for the Courant newsletter
//! platform.
//!
//! This crate implements the send-orchestration domain, providing:
//!
//! - **Lifecycle Management**: Validated campaign state transitions
//!   (create, schedule, reschedule, cancel)
//! - **Send Orchestration**: Exclusive locking of due campaigns, batch
//!   fan-out, and status finalization
//! - **Batch Dispatch**: Rate-limited per-recipient delivery with an
//!   isolated failure domain
//! - **Delivery Tracking**: Per-recipient send-log aggregation
//!
//! ## Core Concepts
//!
//! - **Campaign**: A scheduled send instruction tied to a template and a
//!   recipient set - not itself an email
//! - **Lock (CAS)**: The atomic conditional status update from `scheduled`
//!   to `sending` guaranteeing at-most-one orchestration run proceeds
//! - **Batch**: A bounded partition of eligible recipients dispatched as one
//!   independent unit of work
//! - **Send Log**: The per-recipient delivery-outcome ledger
//!
//! ## Guarantees
//!
//! - **At-most-once orchestration**: Concurrent triggers on one campaign
//!   resolve through the status CAS; exactly one run fans out
//! - **At-least-once dispatch**: Batch envelopes may be re-enqueued after a
//!   mid-fan-out failure; the send log converges via per-recipient upsert
//! - **Dispatch-complete, not delivery-complete**: a `sent` campaign means
//!   all batches were handed off; per-recipient outcomes live in the send log
//!
//! ## Example
//!
//! ```rust,no_run
//! use courant_core::CompanyId;
//! use courant_send::config::SendConfig;
//! use courant_send::dispatch::memory::InMemoryTaskQueue;
//! use courant_send::error::Result;
//! use courant_send::lifecycle::{CreateCampaign, LifecycleManager};
//! use courant_send::orchestrator::SendOrchestrator;
//! use courant_send::store::memory::{
//!     InMemoryCampaignStore, InMemoryCompanyStore, InMemorySendLogStore,
//!     InMemorySubscriberStore, InMemoryTemplateStore,
//! };
//!
//! # async fn demo() -> Result<()> {
//! let campaigns = InMemoryCampaignStore::new();
//! let companies = InMemoryCompanyStore::new();
//! let subscribers = InMemorySubscriberStore::new();
//! let templates = InMemoryTemplateStore::new();
//! let send_logs = InMemorySendLogStore::new();
//! let queue = InMemoryTaskQueue::new("email-batches");
//! let config = SendConfig::default();
//!
//! let lifecycle = LifecycleManager::new(
//!     &campaigns,
//!     &companies,
//!     &subscribers,
//!     &templates,
//!     &send_logs,
//! );
//!
//! let orchestrator = SendOrchestrator::new(
//!     &campaigns,
//!     &companies,
//!     &subscribers,
//!     &queue,
//!     config,
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod audience;
pub mod batch;
pub mod campaign;
pub mod config;
pub mod dispatch;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod orchestrator;
pub mod ratelimit;
pub mod send_log;
pub mod store;
pub mod template;
