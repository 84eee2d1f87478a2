//! Wall-clock pacer backed by the tokio timer.

use std::time::Duration;

use crate::ports::pacer::{Pacer, PauseFuture};

/// Sleeps for real between service calls.
#[derive(Debug, Default)]
pub struct TokioPacer;

impl TokioPacer {
    /// Create a wall-clock pacer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Pacer for TokioPacer {
    fn pause(&self, duration: Duration) -> PauseFuture<'_> {
        Box::pin(async move {
            if !duration.is_zero() {
                tokio::time::sleep(duration).await;
            }
        })
    }
}
