//! Running filesystem probes off the async executor.

/// Run `blocker` on tokio's blocking pool.
///
/// Returns `None` if the task panicked or was cancelled; the caller treats
/// that the same as any other failed lookup.
pub(crate) async fn run<F, R>(blocker: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    match tokio::task::spawn_blocking(blocker).await {
        Ok(ret) => Some(ret),
        Err(err) => {
            tracing::error!("blocking task failed: {}", err);
            None
        }
    }
}
