//! Message bus port
//!
//! Defines how the state machine and adapters publish workflow messages and
//! how observers subscribe to the messages of one run.
//!
//! Delivery contract:
//! - a subscriber only ever receives messages carrying the correlation id it
//!   subscribed with
//! - messages from one publisher within one run arrive in publish order
//! - every message is delivered at least once to every matching subscriber
//!   that is alive when it is published
//! - `publish` never waits on a subscriber

use futures::stream::BoxStream;
use thiserror::Error;
use tribunal_domain::{CorrelationId, Message, TopicFilter};

/// Stream of messages for one subscription; ends when the run is closed
pub type MessageStream = BoxStream<'static, Message>;

/// Errors raised by the bus transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Message bus is shut down")]
    Shutdown,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

pub trait MessageBus: Send + Sync {
    /// Deliver `message` to every live subscription of its run
    fn publish(&self, message: Message) -> Result<(), BusError>;

    /// Receive the messages of one run that match `filter`
    fn subscribe(&self, filter: TopicFilter, correlation_id: &CorrelationId) -> MessageStream;

    /// End every subscription of a finished run
    fn close_run(&self, correlation_id: &CorrelationId);

    /// Stop accepting messages; all subscriptions end
    fn shutdown(&self);
}
