//! Scripted in-memory transport.
//!
//! Each accepted dial creates a link the test can push frames into. Dropping
//! the link makes the pending read fail, as a remote close would.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::Frame;

use super::dialer::{Dialer, Transport};

// ============================================================================
// MockDialer
// ============================================================================

#[derive(Default)]
struct Script {
    refuse_first: FxHashMap<String, usize>,
    refuse_always: FxHashSet<String>,
    fail_close: FxHashSet<String>,
    attempts: FxHashMap<String, usize>,
    links: FxHashMap<String, Link>,
}

struct Link {
    frames: mpsc::UnboundedSender<Frame>,
    closes: Arc<AtomicUsize>,
}

/// Dialer whose outcomes are set per URL. Unscripted URLs accept.
#[derive(Default)]
pub(crate) struct MockDialer {
    script: Mutex<Script>,
}

impl MockDialer {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Refuses the next `count` dials to `url`.
    pub(crate) fn refuse_first(&self, url: &str, count: usize) {
        self.script.lock().refuse_first.insert(url.to_string(), count);
    }

    /// Refuses every dial to `url`.
    pub(crate) fn refuse_always(&self, url: &str) {
        self.script.lock().refuse_always.insert(url.to_string());
    }

    /// Makes `close` fail on transports dialed to `url` from now on.
    pub(crate) fn fail_close(&self, url: &str) {
        self.script.lock().fail_close.insert(url.to_string());
    }

    pub(crate) fn attempts(&self, url: &str) -> usize {
        self.script.lock().attempts.get(url).copied().unwrap_or(0)
    }

    /// Delivers a frame on the live link to `url`.
    pub(crate) fn push(&self, url: &str, frame: Frame) -> bool {
        self.script
            .lock()
            .links
            .get(url)
            .is_some_and(|link| link.frames.send(frame).is_ok())
    }

    /// Drops the live link to `url`, failing its pending read.
    pub(crate) fn sever(&self, url: &str) {
        self.script.lock().links.remove(url);
    }

    /// Returns `true` if the last transport dialed to `url` was closed.
    pub(crate) fn was_closed(&self, url: &str) -> bool {
        self.close_count(url) > 0
    }

    /// Number of `close` calls on the last transport dialed to `url`.
    pub(crate) fn close_count(&self, url: &str) -> usize {
        self.script
            .lock()
            .links
            .get(url)
            .map_or(0, |link| link.closes.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, url: &str) -> Result<Box<dyn Transport>> {
        let mut script = self.script.lock();
        *script.attempts.entry(url.to_string()).or_default() += 1;

        if script.refuse_always.contains(url) {
            return Err(Error::dial(url, "connection refused"));
        }
        if let Some(remaining) = script.refuse_first.get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::dial(url, "connection refused"));
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));
        script.links.insert(
            url.to_string(),
            Link {
                frames: frames_tx,
                closes: Arc::clone(&closes),
            },
        );

        Ok(Box::new(MockTransport {
            frames: frames_rx,
            closes,
            fail_close: script.fail_close.contains(url),
        }))
    }
}

// ============================================================================
// MockTransport
// ============================================================================

struct MockTransport {
    frames: mpsc::UnboundedReceiver<Frame>,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn read_frame(&mut self) -> Result<Frame> {
        if self.closes.load(Ordering::SeqCst) > 0 {
            return Err(Error::ConnectionClosed);
        }
        self.frames.recv().await.ok_or(Error::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(Error::close("broken pipe"));
        }
        Ok(())
    }
}
