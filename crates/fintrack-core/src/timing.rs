//! Execution timing around fetch, resolve, normalise and render steps

use std::future::Future;
use std::time::Instant;

/// Await `future` and log how long it took
pub async fn timed<F>(label: &str, future: F) -> F::Output
where
    F: Future,
{
    let start = Instant::now();
    let output = future.await;
    log::info!(
        "{} executed in {:.4} seconds",
        label,
        start.elapsed().as_secs_f64()
    );
    output
}

/// Run `f` and log how long it took
pub fn timed_sync<T, F>(label: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let output = f();
    log::info!(
        "{} executed in {:.4} seconds",
        label,
        start.elapsed().as_secs_f64()
    );
    output
}
