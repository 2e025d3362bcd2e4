//! Runtime used for engine work, and the bridge that lets synchronous
//! callers wait on it from any context.

use crate::error::{AnalysisError, Result};
use once_cell::sync::OnceCell;
use std::future::Future;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

static WORKER: OnceCell<Runtime> = OnceCell::new();

/// Handle to the dedicated worker runtime, started on first use.
///
/// Computations shared between callers are spawned here, so they never
/// depend on a caller's runtime staying alive or being able to make progress.
pub fn worker_handle() -> Result<Handle> {
    WORKER
        .get_or_try_init(|| {
            let threads = std::thread::available_parallelism()
                .map(|n| n.get().clamp(2, 8))
                .unwrap_or(2);
            tracing::debug!("Starting structscope worker runtime with {} threads", threads);
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .worker_threads(threads)
                .thread_name("structscope-worker")
                .build()
        })
        .map(|rt| rt.handle().clone())
        .map_err(|e| AnalysisError::Internal(format!("failed to start worker runtime: {e}")))
}

/// Runs `fut` on the worker runtime and blocks the calling thread until it
/// completes.
///
/// Safe to call from plain threads and from inside a multi-threaded tokio
/// runtime. On a current-thread runtime the caller's thread is parked while
/// the worker runtime makes progress, so it cannot deadlock on itself.
pub fn block_on<F>(fut: F) -> Result<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = worker_handle()?;
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    handle.spawn(async move {
        let _ = tx.send(fut.await);
    });

    let wait = move || {
        rx.recv()
            .map_err(|_| AnalysisError::Internal("worker dropped a blocking call".into()))
    };
    match Handle::try_current() {
        Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(wait)
        }
        _ => wait(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_block_on_from_plain_thread() {
        let v = block_on(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            5
        })
        .unwrap();
        assert_eq!(v, 5);
    }

    #[tokio::test]
    async fn test_block_on_inside_current_thread_runtime() {
        let v = block_on(async { 1 + 1 }).unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_on_inside_multi_thread_runtime() {
        let v = block_on(async { "ok" }).unwrap();
        assert_eq!(v, "ok");
    }
}
