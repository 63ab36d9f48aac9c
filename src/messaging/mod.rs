//! # Messaging Module
//!
//! Queue payloads and the queue backend contract the Ahjo workers consume.

pub mod errors;
pub mod message;
pub mod queue;

pub use errors::{MessagingError, MessagingResult};
pub use message::{AhjoQueueMessage, ClaimedItem, MessageContent};
pub use queue::{InMemoryQueueBackend, QueueBackend};
