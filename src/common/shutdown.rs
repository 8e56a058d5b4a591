use tokio::sync::watch;

/// One-way shutdown signal shared between a background loop and its owner.
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender,
        }
    }

    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    #[cfg(test)]
    pub fn is_terminated(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `shutdown` has been called, immediately if it already was.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            let _ = receiver.wait_for(|terminated| *terminated).await;
        }
    }
}
