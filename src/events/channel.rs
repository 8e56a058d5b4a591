use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::{
    NodeherdError, Result, ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{Event, Message, NodeEvent, Notification, NotificationKind, Notifier},
    model::{NodeId, NodeStatus},
    utils,
};

macro_rules! dispatch_event {
    ($handles:expr, $(&$item:ident), +) => {
        let handlers = $handles.read().unwrap_or_else(PoisonError::into_inner);
        for handle in handlers.iter() {
            (handle)($(&$item),+);
        }
    };
}

macro_rules! dispatch_event_async {
    ($runtime:expr, $handles:expr, $(&$item:ident), +) => {
        let handles = $handles.clone();

        $runtime.spawn(async move {
            let handlers = handles.read().unwrap_or_else(PoisonError::into_inner).clone();
            for handle in handlers.iter() {
                (handle)($(&$item),+).await;
            }
        });
    };
}

const EVENT_QUEUE_SIZE: usize = 2048;
const NOTIFICATION_QUEUE_SIZE: usize = 256;

pub type NodeEventHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;
pub type NotificationHandle = Arc<dyn Fn(&Event<Notification>) + Send + Sync>;
pub type NodeEventHandleAsync = Arc<dyn Fn(&Event<Message>) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// use the glob pattern to match the node id
    /// eg. 3f2a*
    pub node_id: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            node_id: "*".to_string(),
        }
    }
}

impl ChannelOptions {
    pub fn with_node_id(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }
}

/// Pub/sub hub for node events and notifications.
pub struct Channel {
    event_queue: Arc<BroadcastQueue<Event<Message>>>,
    notification_queue: Arc<BroadcastQueue<Event<Notification>>>,

    events: ShareLock<Vec<NodeEventHandle>>,
    notifications: ShareLock<Vec<NotificationHandle>>,
    events_async: ShareLock<Vec<NodeEventHandleAsync>>,

    listening: AtomicBool,
    runtime: Handle,
    shutdown: Arc<Shutdown>,
}

impl Channel {
    pub(crate) fn new(runtime: Handle) -> Self {
        Self {
            event_queue: BroadcastQueue::new(EVENT_QUEUE_SIZE),
            notification_queue: BroadcastQueue::new(NOTIFICATION_QUEUE_SIZE),
            events: Arc::new(RwLock::new(Vec::new())),
            notifications: Arc::new(RwLock::new(Vec::new())),
            events_async: Arc::new(RwLock::new(Vec::new())),
            listening: AtomicBool::new(false),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub fn event_queue(&self) -> Arc<BroadcastQueue<Event<Message>>> {
        self.event_queue.clone()
    }

    pub fn notification_queue(&self) -> Arc<BroadcastQueue<Event<Notification>>> {
        self.notification_queue.clone()
    }

    pub(crate) fn publish(
        &self,
        node_id: &str,
        event: NodeEvent,
    ) {
        let message = Message {
            node_id: node_id.to_string(),
            event,
            timestamp: utils::time::time_millis(),
        };
        if let Err(e) = self.event_queue.send(Event::new(&message)) {
            warn!(node_id, error = %e, "failed to publish node event");
        }
    }

    /// Starts dispatching queued events to registered handlers. Calling it
    /// again while already listening is a no-op.
    pub(crate) fn listen(&self) {
        if self.listening.swap(true, Ordering::Relaxed) {
            return;
        }

        let mut event_queue = self.event_queue.subscribe();
        let mut notification_queue = self.notification_queue.subscribe();
        let events = self.events.clone();
        let notifications = self.notifications.clone();
        let events_async = self.events_async.clone();

        let runtime = self.runtime.clone();
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Ok(e) = event_queue.recv() => {
                        let evt = e.clone();
                        dispatch_event!(events, &evt);
                        dispatch_event_async!(runtime, events_async, &e);
                    }
                    Ok(n) = notification_queue.recv() => {
                        dispatch_event!(notifications, &n);
                    }
                    else => break,
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }
}

impl Notifier for Channel {
    fn notify(
        &self,
        kind: NotificationKind,
        display_name: &str,
    ) {
        info!(kind = kind.as_ref(), display_name, "notification");
        let notification = Notification {
            kind,
            severity: kind.severity(),
            display_name: display_name.to_string(),
            timestamp: utils::time::time_millis(),
        };
        if let Err(e) = self.notification_queue.send(Event::new(&notification)) {
            warn!(error = %e, "failed to publish notification");
        }
    }
}

/// Handler registration filtered by a node id glob.
#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,

    glob: globset::GlobMatcher,
}

impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Result<Self> {
        let glob = globset::Glob::new(&options.node_id).map_err(|e| NodeherdError::Config(e.to_string()))?.compile_matcher();
        Ok(Self {
            channel,
            glob,
        })
    }

    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap_or_else(PoisonError::into_inner).push(Arc::new(move |e| {
            if glob.is_match(&e.node_id) {
                f(e);
            }
        }));
    }

    pub fn on_status(
        &self,
        f: impl Fn(&NodeId, NodeStatus) + Send + Sync + 'static,
    ) {
        self.on_event(move |e| {
            if let Some(status) = e.event.status() {
                f(&e.node_id, status);
            }
        });
    }

    pub fn on_removed(
        &self,
        f: impl Fn(&NodeId) + Send + Sync + 'static,
    ) {
        self.on_event(move |e| {
            if e.event == NodeEvent::Removed {
                f(&e.node_id);
            }
        });
    }

    pub fn on_event_async<F>(
        &self,
        f: F,
    ) where
        F: Fn(&Event<Message>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let glob = self.glob.clone();

        self.channel.events_async.write().unwrap_or_else(PoisonError::into_inner).push(Arc::new(move |e| {
            if glob.is_match(&e.node_id) {
                f(e)
            } else {
                Box::pin(async {})
            }
        }));
    }

    /// Notifications are not tied to a node, so the glob does not apply.
    pub fn on_notification(
        &self,
        f: impl Fn(&Event<Notification>) + Send + Sync + 'static,
    ) {
        self.channel.notifications.write().unwrap_or_else(PoisonError::into_inner).push(Arc::new(f));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    fn channel() -> Arc<Channel> {
        let channel = Arc::new(Channel::new(Handle::current()));
        channel.listen();
        channel
    }

    #[tokio::test]
    async fn test_on_status_filters_by_glob() {
        let channel = channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        ChannelEvent::channel(channel.clone(), ChannelOptions::with_node_id("node-a*")).unwrap().on_status(move |id, status| {
            let _ = tx.send((id.clone(), status));
        });

        channel.publish("node-b", NodeEvent::StatusChanged(NodeStatus::Running));
        channel.publish("node-a1", NodeEvent::Added);
        channel.publish("node-a1", NodeEvent::StatusChanged(NodeStatus::Starting));

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received, ("node-a1".to_string(), NodeStatus::Starting));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_on_event_async() {
        let channel = channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        ChannelEvent::channel(channel.clone(), ChannelOptions::default()).unwrap().on_event_async(move |e| {
            let tx = tx.clone();
            let event = e.event.clone();
            Box::pin(async move {
                let _ = tx.send(event);
            })
        });

        channel.publish("node-a", NodeEvent::Removed);
        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received, NodeEvent::Removed);
    }

    #[tokio::test]
    async fn test_notifications() {
        let channel = channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        ChannelEvent::channel(channel.clone(), ChannelOptions::default()).unwrap().on_notification(move |n| {
            let _ = tx.send(n.inner().clone());
        });

        channel.notify(NotificationKind::ClientUpdateError, "Geth");
        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received.kind, NotificationKind::ClientUpdateError);
        assert_eq!(received.severity, crate::events::Severity::Warning);
        assert_eq!(received.display_name, "Geth");
    }

    #[tokio::test]
    async fn test_invalid_glob() {
        let channel = channel();
        assert!(ChannelEvent::channel(channel, ChannelOptions::with_node_id("[")).is_err());
    }
}
