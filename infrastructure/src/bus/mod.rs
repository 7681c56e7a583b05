//! Message bus implementations
//!
//! Provides [`InProcessMessageBus`], the in-process implementation of the
//! [`MessageBus`](tribunal_application::MessageBus) port.

mod in_process;

pub use in_process::InProcessMessageBus;
