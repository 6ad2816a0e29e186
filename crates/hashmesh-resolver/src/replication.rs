use hashmesh_types::{BackendId, ContentHash};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Outcome of copying a newly created object to one backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicationEvent {
    Replicated {
        hash: ContentHash,
        backend: BackendId,
    },
    Failed {
        hash: ContentHash,
        backend: BackendId,
        reason: String,
    },
}

impl ReplicationEvent {
    pub fn hash(&self) -> &ContentHash {
        match self {
            Self::Replicated { hash, .. } | Self::Failed { hash, .. } => hash,
        }
    }

    pub fn backend(&self) -> &BackendId {
        match self {
            Self::Replicated { backend, .. } | Self::Failed { backend, .. } => backend,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A broadcast receiver for replication outcomes.
pub type ReplicationStream = broadcast::Receiver<ReplicationEvent>;

/// Failure sink for detached replication tasks: logs every outcome and
/// publishes it to subscribers, if any.
#[derive(Clone, Debug)]
pub(crate) struct ReplicationSink {
    sender: broadcast::Sender<ReplicationEvent>,
}

impl ReplicationSink {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> ReplicationStream {
        self.sender.subscribe()
    }

    pub(crate) fn record(&self, event: ReplicationEvent) {
        match &event {
            ReplicationEvent::Replicated { hash, backend } => {
                debug!(hash = %hash, backend = %backend, "replicated object");
            }
            ReplicationEvent::Failed {
                hash,
                backend,
                reason,
            } => {
                warn!(hash = %hash, backend = %backend, %reason, "replication failed");
            }
        }
        // No subscribers is fine: the log line above is the record.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ok: bool) -> ReplicationEvent {
        let hash = ContentHash::of_bytes(b"obj");
        let backend = BackendId::new("net").unwrap();
        if ok {
            ReplicationEvent::Replicated { hash, backend }
        } else {
            ReplicationEvent::Failed {
                hash,
                backend,
                reason: "offline".into(),
            }
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let sink = ReplicationSink::new(8);
        let mut rx = sink.subscribe();
        sink.record(event(true));
        sink.record(event(false));
        assert!(!rx.recv().await.unwrap().is_failure());
        let failed = rx.recv().await.unwrap();
        assert!(failed.is_failure());
        assert_eq!(failed.backend().as_str(), "net");
        assert_eq!(failed.hash(), &ContentHash::of_bytes(b"obj"));
    }

    #[test]
    fn recording_without_subscribers_is_harmless() {
        let sink = ReplicationSink::new(0);
        sink.record(event(false));
    }
}
