//! # Queue Workers
//!
//! State machine applied to every item of the Ahjo queues:
//!
//! ```text
//! Aggregation | Subscriber  ->  Retry  ->  Error (terminal)
//! ```
//!
//! Items that fail migration are retried in place until they are older than
//! the queue's retry window, then moved one step down the chain with the
//! current queue name appended to their update type.

pub mod config;
pub mod error;
pub mod processor;
pub mod runner;

pub use config::QueueWorkerConfig;
pub use error::WorkerError;
pub use processor::{process_item, process_item_at, ItemOutcome};
pub use runner::{FatalItem, QueueRunner, RunSummary};
