//! Events emitted by the node manager.
//!
//! Every persisted node mutation publishes a [`Message`]; user-visible
//! outcomes are published as [`Notification`]s. Both travel over the
//! [`Channel`].

mod channel;
mod node;
mod notification;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use node::*;
pub use notification::*;

use crate::model::NodeId;

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Event message carrying the node it concerns.
#[derive(Debug, Clone)]
pub struct Message {
    /// Node that generated this event.
    pub node_id: NodeId,
    /// The actual event data.
    pub event: NodeEvent,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}
