//! Cooperative cancellation and pause/resume.
//!
//! A cancel latch plus a second latch for pausing: the voter checks both
//! flags at the two suspension points named in §5 — before issuing an
//! outbound LLM request, and immediately after a candidate arrives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// What a checkpoint found. `Cancel` means the caller must unwind without
/// touching `Context`; `Continue` means proceed as normal (a pause, if any
/// was in effect, has already been waited out).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Cancel,
}

/// Shared cancel/pause flags for one pipeline run. Cheap to clone — all
/// clones observe the same underlying state.
#[derive(Clone)]
pub struct InterruptHandler {
    cancelled: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl std::fmt::Debug for InterruptHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptHandler")
            .field("cancelled", &self.is_cancelled())
            .field("paused", &self.is_paused())
            .finish()
    }
}

impl Default for InterruptHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptHandler {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Propagate a single termination signal that unwinds all nested
    /// votes (outer Generate vote and any sub-function Generate votes).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume parks the phase no longer; wakes anything blocked in
    /// `checkpoint`.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Reset for a fresh run (e.g. after `cancel` takes the pipeline back
    /// to `Idle` and a new `start` is issued).
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Check before issuing an outbound LLM request: a cancelled run
    /// aborts immediately without spending a call.
    pub fn checkpoint_before_request(&self) -> Signal {
        if self.is_cancelled() {
            Signal::Cancel
        } else {
            Signal::Continue
        }
    }

    /// Park after a candidate has arrived and been classified, if a pause
    /// is in effect. Blocks until `resume()` or `cancel()`; never drops
    /// the candidate that just arrived (the caller classifies it before
    /// calling this).
    pub async fn checkpoint_after_candidate(&self) -> Signal {
        loop {
            if self.is_cancelled() {
                return Signal::Cancel;
            }
            if !self.is_paused() {
                return Signal::Continue;
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let h = InterruptHandler::new();
        assert!(!h.is_cancelled());
        assert!(!h.is_paused());
    }

    #[test]
    fn test_cancel_sets_flag() {
        let h = InterruptHandler::new();
        h.cancel();
        assert!(h.is_cancelled());
        assert_eq!(h.checkpoint_before_request(), Signal::Cancel);
    }

    #[tokio::test]
    async fn test_pause_then_resume_unblocks() {
        let h = InterruptHandler::new();
        h.pause();
        assert!(h.is_paused());

        let h2 = h.clone();
        let waiter = tokio::spawn(async move { h2.checkpoint_after_candidate().await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        h.resume();

        let signal = tokio::time::timeout(std::time::Duration::from_millis(200), waiter)
            .await
            .expect("checkpoint did not return")
            .unwrap();
        assert_eq!(signal, Signal::Continue);
    }

    #[tokio::test]
    async fn test_cancel_while_paused_unblocks_with_cancel() {
        let h = InterruptHandler::new();
        h.pause();

        let h2 = h.clone();
        let waiter = tokio::spawn(async move { h2.checkpoint_after_candidate().await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        h.cancel();

        let signal = tokio::time::timeout(std::time::Duration::from_millis(200), waiter)
            .await
            .expect("checkpoint did not return")
            .unwrap();
        assert_eq!(signal, Signal::Cancel);
    }

    #[test]
    fn test_reset_clears_both_flags() {
        let h = InterruptHandler::new();
        h.cancel();
        h.pause();
        h.reset();
        assert!(!h.is_cancelled());
        assert!(!h.is_paused());
    }
}
