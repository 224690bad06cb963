//! Generation-based cancellation for long-running reconstructions.
//!
//! Every new request takes a token from a shared [`GenerationCounter`].
//! Issuing a newer token implicitly cancels all older ones, so at most one
//! request per counter is ever considered current.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, SvdError};

/// Shared monotonically increasing request counter.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Create a counter starting at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, cancelling every previously issued token.
    pub fn next_token(&self) -> CancelToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            current: Arc::clone(&self.current),
            generation,
        }
    }

    /// The newest generation issued so far.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Handle checked by computations to detect that they were superseded.
#[derive(Debug, Clone)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl CancelToken {
    /// A token with its own private counter; it is never cancelled.
    pub fn never() -> Self {
        GenerationCounter::new().next_token()
    }

    /// Generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer token has been issued since this one.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }

    /// Return `Err(SvdError::Cancelled)` if this token is stale.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            log::debug!("Generation {} superseded, stopping", self.generation);
            return Err(SvdError::Cancelled);
        }
        Ok(())
    }
}
