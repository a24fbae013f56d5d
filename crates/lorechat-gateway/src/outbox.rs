use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use lorechat_types::events::ServerEvent;

/// Result of offering one event to one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Recipient already went away or was kicked earlier.
    Dropped,
    /// Queue was full: event dropped and the recipient is being disconnected.
    Kicked,
}

/// Sending half of a connection's bounded outbound queue, plus the token
/// used to force that connection off when it cannot keep up.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<ServerEvent>,
    kick: CancellationToken,
}

impl Outbox {
    /// Create a queue holding at most `capacity` undelivered events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                kick: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Enqueue without waiting. Never blocks the caller, so it is safe to
    /// call with the dispatcher lock held.
    pub fn offer(&self, event: ServerEvent) -> Delivery {
        if self.kick.is_cancelled() {
            return Delivery::Dropped;
        }

        match self.tx.try_send(event) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Closed(_)) => Delivery::Dropped,
            Err(TrySendError::Full(_)) => {
                self.kick.cancel();
                Delivery::Kicked
            }
        }
    }

    /// Cancelled once this connection has been kicked for falling behind.
    pub fn kick_token(&self) -> CancellationToken {
        self.kick.clone()
    }

    pub fn is_kicked(&self) -> bool {
        self.kick.is_cancelled()
    }
}
