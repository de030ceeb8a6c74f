//! Bounded fan-in queues.
//!
//! Producers hold plain [`tokio::sync::mpsc::Sender`]s; a send on a full
//! queue waits, so a slow consumer pauses the producing loops instead of
//! losing items. Consumers hold an [`Inbox`], which can be cloned so several tasks
//! drain the same queue.

// ============================================================================
// Imports
// ============================================================================

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};

// ============================================================================
// Constructor
// ============================================================================

/// Creates a bounded queue.
pub(crate) fn bounded<T>(capacity: NonZeroUsize) -> (mpsc::Sender<T>, Inbox<T>) {
    let (sender, receiver) = mpsc::channel(capacity.get());
    (sender, Inbox::new(receiver))
}

// ============================================================================
// Inbox
// ============================================================================

/// Consumer side of a shared queue.
pub struct Inbox<T> {
    receiver: Arc<Mutex<mpsc::Receiver<T>>>,
    closed: Arc<AtomicBool>,
}

impl<T> Clone for Inbox<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<T> Inbox<T> {
    fn new(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Waits for the next item.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        self.receiver.lock().await.recv().await
    }

    /// Takes the next item if one is buffered and no other consumer is waiting.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// Returns `true` once the queue accepts no further items.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
            || self
                .receiver
                .try_lock()
                .is_ok_and(|receiver| receiver.is_closed())
    }

    /// Refuses further sends. Buffered items can still be drained.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut receiver) = self.receiver.try_lock() {
            receiver.close();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    #[tokio::test]
    async fn test_clones_share_queue() {
        let (sender, inbox) = bounded(capacity(4));
        let other = inbox.clone();

        sender.send(1).await.expect("send");
        sender.send(2).await.expect("send");

        assert_eq!(inbox.recv().await, Some(1));
        assert_eq!(other.try_recv(), Some(2));
        assert_eq!(other.try_recv(), None);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let (sender, inbox) = bounded(capacity(4));
        sender.send("a").await.expect("send");

        inbox.close();
        assert!(inbox.is_closed());
        assert!(sender.send("b").await.is_err());

        assert_eq!(inbox.recv().await, Some("a"));
        drop(sender);
        assert_eq!(inbox.recv().await, None);
    }
}
