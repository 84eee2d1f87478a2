//! Pacer port: the only backpressure between service calls.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future type returned by [`Pacer::pause`].
pub type PauseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Suspends the batch for a requested duration.
pub trait Pacer: Send + Sync {
    /// Wait for `duration` before the caller continues.
    fn pause(&self, duration: Duration) -> PauseFuture<'_>;
}
