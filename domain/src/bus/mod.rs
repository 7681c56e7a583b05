//! Message bus envelope types

pub mod message;

pub use message::{FailureNote, Message, MessageSource, Payload, ProgressNote, Topic, TopicFilter};
