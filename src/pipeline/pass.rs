//! Analysis-pass tracking: generation counter + cancellation token.
//! Each pass over a frame or static image gets a fresh id; starting a new
//! pass cancels the previous pass's token, and guards copied into in-flight
//! resolutions can tell when their pass has been superseded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// Issues pass ids and owns the token for the current pass.
pub struct PassTracker {
    current_token: RwLock<CancellationToken>,
    pass: Arc<AtomicU64>,
}

impl Default for PassTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PassTracker {
    pub fn new() -> Self {
        Self {
            current_token: RwLock::new(CancellationToken::new()),
            pass: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel the previous pass's tasks, advance the pass id, and return a
    /// guard for the new pass.
    pub fn begin_pass(&self) -> PassGuard {
        let mut token_guard = self.current_token.write();
        token_guard.cancel();
        let root = CancellationToken::new();
        let child = root.child_token();
        *token_guard = root;
        let pass = self.pass.fetch_add(1, Ordering::SeqCst) + 1;
        PassGuard {
            pass: Arc::clone(&self.pass),
            my_pass: pass,
            token: child,
        }
    }

    /// Current pass id (0 before the first pass).
    pub fn current_pass(&self) -> u64 {
        self.pass.load(Ordering::SeqCst)
    }

    /// Teardown: cancel everything without starting a new pass, and bump the
    /// id so every existing guard reads as stale.
    pub fn cancel_all(&self) {
        self.current_token.read().cancel();
        self.pass.fetch_add(1, Ordering::SeqCst);
    }
}

/// Checked by in-flight work before committing results. Stale or cancelled
/// guards turn the remaining work into a no-op.
#[derive(Clone)]
pub struct PassGuard {
    pass: Arc<AtomicU64>,
    my_pass: u64,
    token: CancellationToken,
}

impl PassGuard {
    /// True while no newer pass has started.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.pass.load(Ordering::SeqCst) == self.my_pass
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Not cancelled and still the current pass.
    #[inline]
    pub fn should_continue(&self) -> bool {
        !self.is_cancelled() && self.is_current()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn pass(&self) -> u64 {
        self.my_pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pass_supersedes_previous_guard() {
        let tracker = PassTracker::new();
        let a = tracker.begin_pass();
        assert!(a.should_continue());
        assert_eq!(a.pass(), 1);

        let b = tracker.begin_pass();
        assert!(!a.is_current());
        assert!(a.is_cancelled());
        assert!(!a.should_continue());
        assert!(b.should_continue());
        assert_eq!(b.pass(), 2);
    }

    #[test]
    fn cancel_all_invalidates_current_guard() {
        let tracker = PassTracker::new();
        let guard = tracker.begin_pass();
        tracker.cancel_all();
        assert!(guard.is_cancelled());
        assert!(!guard.is_current());
        assert!(!guard.should_continue());
    }

    #[tokio::test]
    async fn token_fires_on_supersede() {
        let tracker = PassTracker::new();
        let guard = tracker.begin_pass();
        let token = guard.token().clone();
        tracker.begin_pass();
        // Resolutions race resolve() against this; it must complete.
        token.cancelled().await;
    }
}
