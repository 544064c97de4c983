//! Background reads of the editor's surrounding text.
//!
//! Each request carries the expected selection at the moment it was issued.
//! The worker never touches the cache; it sends the outcome back with the
//! same stamp and the cache decides whether it is still current. A newer
//! request supersedes older queued ones, so only the latest is read.

use crate::remote::{RemoteEditor, SurroundingText};
use crate::text_cache::Selection;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Expected selection captured when a read was issued. `None` is the
/// unknown position.
pub type SelectionStamp = Option<Selection>;

/// One surrounding-text read.
#[derive(Clone)]
pub struct ReloadRequest {
    /// Monotonic request number
    pub id: u64,
    pub stamp: SelectionStamp,
    pub editor: Arc<dyn RemoteEditor>,
    /// Units to read before the selection
    pub before: usize,
    /// Units to read after the selection
    pub after: usize,
    /// Reads slower than this are logged
    pub slow_threshold: Duration,
}

impl std::fmt::Debug for ReloadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadRequest")
            .field("id", &self.id)
            .field("stamp", &self.stamp)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}

/// Result of a read, still carrying the stamp it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub id: u64,
    pub stamp: SelectionStamp,
    /// `None` when the editor could not be asked
    pub text: Option<SurroundingText>,
    pub elapsed: Duration,
}

impl ReloadOutcome {
    /// Whether this outcome answers a read issued under `stamp`.
    pub fn matches_exact(&self, stamp: SelectionStamp) -> bool {
        self.stamp == stamp
    }
}

/// Perform a read on the calling thread.
pub fn read_surrounding(request: ReloadRequest) -> ReloadOutcome {
    let started = Instant::now();
    let text = request.editor.surrounding_text(request.before, request.after);
    let elapsed = started.elapsed();
    if elapsed >= request.slow_threshold {
        warn!(
            target: "libkeyboard_core::reload",
            event = "slow_reload",
            id = request.id,
            elapsed_ms = elapsed.as_millis() as u64,
            "laggy editor connection on surrounding text reload"
        );
    }
    ReloadOutcome {
        id: request.id,
        stamp: request.stamp,
        text,
        elapsed,
    }
}

/// Worker thread that performs reads off the input path.
pub struct ReloadWorker {
    tx: Sender<ReloadRequest>,
    rx: Receiver<ReloadOutcome>,
}

impl ReloadWorker {
    /// Spawn the worker thread. It exits when the worker is dropped.
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx_cmd) = crossbeam_channel::unbounded::<ReloadRequest>();
        let (tx_evt, rx_evt) = crossbeam_channel::unbounded();

        thread::Builder::new()
            .name("libkeyboard-reload".to_string())
            .spawn(move || {
                for req in rx_cmd.iter() {
                    let mut latest = req;
                    // Only the newest read can still be current.
                    while let Ok(next) = rx_cmd.try_recv() {
                        debug!(
                            target: "libkeyboard_core::reload",
                            event = "superseded",
                            id = latest.id,
                            "reload request superseded before it ran"
                        );
                        latest = next;
                    }
                    if tx_evt.send(read_surrounding(latest)).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self { tx, rx: rx_evt })
    }

    /// Queue a read. Returns false if the worker thread has gone away.
    pub fn submit(&self, request: ReloadRequest) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Finished reads, without blocking.
    pub fn try_recv(&self) -> Option<ReloadOutcome> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished read.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ReloadOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl std::fmt::Debug for ReloadWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadWorker")
            .field("queued", &self.tx.len())
            .field("finished", &self.rx.len())
            .finish()
    }
}
