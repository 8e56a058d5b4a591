//! Broadcast queue for one-to-many message distribution.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{NodeherdError, Result};

/// Broadcast queue where every subscriber receives every message.
///
/// Backed by tokio's broadcast channel. Sending with no subscribers is not an
/// error: node events are published whether or not anyone listens.
#[derive(Clone)]
pub struct BroadcastQueue<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    /// create a new broadcast queue
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(cap);

        Arc::new(Self {
            sender: Arc::new(tx),
        })
    }

    /// send a message to the queue, returns the number of receivers
    pub fn send(
        &self,
        msg: T,
    ) -> Result<usize> {
        if self.sender.receiver_count() == 0 {
            return Ok(0);
        }
        self.sender.send(msg).map_err(|e| NodeherdError::Engine(e.to_string()))
    }

    /// subscribe to the queue
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_to_all_subscribers() {
        let queue = BroadcastQueue::<u32>::new(8);
        assert_eq!(queue.send(1).unwrap(), 0);

        let mut a = queue.subscribe();
        let mut b = queue.subscribe();
        assert_eq!(queue.send(2).unwrap(), 2);
        assert_eq!(a.recv().await.unwrap(), 2);
        assert_eq!(b.recv().await.unwrap(), 2);
    }
}
