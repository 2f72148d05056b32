use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::definitions::ReceivedDocument;

/// Statuses buffered per subscriber on top of the replayed latest one.
const EXTRA_BUFFER: usize = 16;

/// Progress of a single transfer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferSessionStatus {
    Connecting,
    Connected,
    DeviceEngagementCompleted,
    RequestSent,
    Disconnected,
    Error(String),
    ResponseReceived(Vec<ReceivedDocument>),
}

impl TransferSessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Disconnected | Self::Error(_) | Self::ResponseReceived(_)
        )
    }
}

/// Fan-out of session statuses that replays the most recent one to new
/// subscribers.
///
/// Every publish is tagged with the session epoch it belongs to. Once the epoch
/// moves on, publishes from the old session are dropped.
#[derive(Debug)]
pub struct StatusStream {
    state: Mutex<StreamState>,
    sender: broadcast::Sender<TransferSessionStatus>,
}

#[derive(Debug, Default)]
struct StreamState {
    latest: Option<TransferSessionStatus>,
    epoch: u64,
}

/// Receiving half of a [StatusStream].
#[derive(Debug)]
pub struct StatusReceiver {
    replay: Option<TransferSessionStatus>,
    inner: broadcast::Receiver<TransferSessionStatus>,
}

impl StatusStream {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EXTRA_BUFFER);
        Self {
            state: Mutex::new(StreamState::default()),
            sender,
        }
    }

    fn state(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn epoch(&self) -> u64 {
        self.state().epoch
    }

    pub fn latest(&self) -> Option<TransferSessionStatus> {
        self.state().latest.clone()
    }

    /// Publish `status` if `epoch` is still current. Returns whether it was
    /// published.
    pub fn publish(&self, epoch: u64, status: TransferSessionStatus) -> bool {
        let mut state = self.state();
        if state.epoch != epoch {
            return false;
        }
        state.latest = Some(status.clone());
        // No subscribers is fine, the status is still kept for replay.
        let _ = self.sender.send(status);
        true
    }

    /// Move on to a new epoch and forget the latest status, so nothing of the
    /// previous session is replayed.
    pub fn reset(&self) -> u64 {
        let mut state = self.state();
        state.epoch += 1;
        state.latest = None;
        state.epoch
    }

    pub fn subscribe(&self) -> StatusReceiver {
        let state = self.state();
        StatusReceiver {
            replay: state.latest.clone(),
            inner: self.sender.subscribe(),
        }
    }
}

impl Default for StatusStream {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReceiver {
    /// Wait for the next status. Returns [None] once the stream is gone.
    pub async fn recv(&mut self) -> Option<TransferSessionStatus> {
        if let Some(status) = self.replay.take() {
            return Some(status);
        }
        loop {
            match self.inner.recv().await {
                Ok(status) => return Some(status),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status subscriber lagged behind")
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The next status if one is already available.
    pub fn try_recv(&mut self) -> Option<TransferSessionStatus> {
        if let Some(status) = self.replay.take() {
            return Some(status);
        }
        loop {
            match self.inner.try_recv() {
                Ok(status) => return Some(status),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "status subscriber lagged behind")
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn late_subscriber_sees_latest() {
        let stream = StatusStream::new();
        let epoch = stream.epoch();
        stream.publish(epoch, TransferSessionStatus::Connecting);
        stream.publish(epoch, TransferSessionStatus::Connected);

        let mut receiver = stream.subscribe();
        assert_eq!(receiver.recv().await, Some(TransferSessionStatus::Connected));

        stream.publish(epoch, TransferSessionStatus::RequestSent);
        assert_eq!(receiver.recv().await, Some(TransferSessionStatus::RequestSent));
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn stale_epoch_is_dropped() {
        let stream = StatusStream::new();
        let old = stream.epoch();
        let mut receiver = stream.subscribe();

        let new = stream.reset();
        assert!(!stream.publish(old, TransferSessionStatus::Disconnected));
        assert_eq!(receiver.try_recv(), None);
        assert_eq!(stream.latest(), None);

        assert!(stream.publish(new, TransferSessionStatus::Connecting));
        assert_eq!(receiver.try_recv(), Some(TransferSessionStatus::Connecting));
    }

    #[test]
    fn reset_forgets_latest() {
        let stream = StatusStream::new();
        let epoch = stream.epoch();
        stream.publish(epoch, TransferSessionStatus::Error("timeout".into()));
        stream.reset();
        assert_eq!(stream.subscribe().try_recv(), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(TransferSessionStatus::Disconnected.is_terminal());
        assert!(TransferSessionStatus::Error("x".into()).is_terminal());
        assert!(TransferSessionStatus::ResponseReceived(vec![]).is_terminal());
        assert!(!TransferSessionStatus::RequestSent.is_terminal());
    }
}
