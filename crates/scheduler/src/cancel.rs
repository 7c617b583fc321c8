//! Cancellation tokens for per-page highlight work
//!
//! Every mounted page owns a token. Unmounting the page, or resetting it for a
//! new query or scale, cancels the token so results computed against the old
//! render are never applied.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

/// Cancellation token for cooperative cancellation
///
/// Clones share the same state, so a token handed to an in-flight request
/// observes a cancel issued by the page lifecycle.
///
/// # Example
///
/// ```
/// use seekmark_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let request_token = token.clone();
///
/// token.cancel();
/// assert!(request_token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token and every clone of it. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Page index → token of the page's current render
///
/// # Example
///
/// ```
/// use seekmark_scheduler::CancellationRegistry;
///
/// let registry = CancellationRegistry::new();
/// let first = registry.register(3);
///
/// // re-rendering the page supersedes the previous token
/// let second = registry.register(3);
/// assert!(first.is_cancelled());
/// assert!(!second.is_cancelled());
/// ```
#[derive(Debug)]
pub struct CancellationRegistry {
    tokens: Mutex<HashMap<u32, CancellationToken>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<u32, CancellationToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a fresh token for `page`, cancelling the one it replaces.
    pub fn register(&self, page: u32) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.tokens().insert(page, token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Cancel and forget the token for `page`. Returns `true` if one existed.
    pub fn cancel(&self, page: u32) -> bool {
        match self.tokens().remove(&page) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered token. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut tokens = self.tokens();
        let count = tokens.len();
        for (_, token) in tokens.drain() {
            token.cancel();
        }
        count
    }

    pub fn get(&self, page: u32) -> Option<CancellationToken> {
        self.tokens().get(&page).cloned()
    }

    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().is_empty()
    }
}

impl Default for CancellationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
