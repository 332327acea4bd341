use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{PlotError, PlotResult};

/// Shared fail-fast flag for a group of generations.
///
/// Checked only at coarse checkpoints; a data source query already in flight runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return [`PlotError::Cancelled`] once the token has been cancelled.
    pub fn checkpoint(&self) -> PlotResult<()> {
        if self.is_cancelled() {
            return Err(PlotError::Cancelled);
        }
        Ok(())
    }
}
