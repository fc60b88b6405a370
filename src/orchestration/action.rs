//! Console reporting for a named long-running action

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

/// Await `future`, announcing start, success or failure of `label`
///
/// The error is passed through untouched; the caller prints its details.
pub async fn run_logged<F, T, E>(label: &str, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let start = Instant::now();
    println!("⏳ {}...", label);
    tracing::info!(action = label, "started");

    let result = future.await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            println!("✅ {} ({:.1}s)", label, elapsed.as_secs_f64());
            tracing::info!(action = label, elapsed_ms = elapsed.as_millis() as u64, "succeeded");
        }
        Err(e) => {
            println!("❌ {} ({:.1}s)", label, elapsed.as_secs_f64());
            tracing::warn!(action = label, elapsed_ms = elapsed.as_millis() as u64, error = %e, "failed");
        }
    }

    result
}
