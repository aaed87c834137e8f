//! Basic example: a dispatcher in front of a flaky catalog endpoint.
//!
//! The fake upstream answers `503` twice before succeeding, so the first
//! lookup retries with backoff and the second is served from the cache.
//!
//! Run with `RUST_LOG=catalog_dispatch=debug cargo run --example basic` to see
//! every dispatch decision.

use catalog_dispatch::{
    AttemptOutcome, CancellationToken, Dispatcher, DomainError, RequestKey, RetryPolicy,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dispatcher = Dispatcher::builder()
        .with_requests_per_second(2.0)
        .with_retry_policy(RetryPolicy::new(
            4,
            Duration::from_millis(200),
            Duration::from_secs(2),
            2.0,
        )?)
        .build()?;

    let calls = AtomicU32::new(0);
    let cancel = CancellationToken::new();
    let key = RequestKey::new("GET", "/products/detail")
        .with_scope("USD")
        .with_param("sku", "C12345")
        .to_string();

    println!("=== Basic Dispatch Example ===\n");

    for round in 1..=2 {
        let result = dispatcher
            .execute(&key, Duration::from_secs(60), &cancel, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    if n < 2 {
                        AttemptOutcome::with_status(503, "maintenance window")
                    } else {
                        AttemptOutcome::ok(r#"{"sku":"C12345","stock":1200}"#)
                    }
                }
            })
            .await;

        match result {
            Ok(payload) => println!("round {}: {}", round, String::from_utf8_lossy(&payload)),
            Err(DomainError::NotFound { identifier }) => {
                println!("round {}: {} not found", round, identifier)
            }
            Err(e) => println!("round {}: failed: {}", round, e),
        }
    }

    // Missing parts fail fast: 404 is never retried
    let missing = dispatcher
        .execute("detail:USD:C0", Duration::from_secs(60), &cancel, || async {
            AttemptOutcome::with_status(404, "C0")
        })
        .await;
    println!("missing part: {:?}", missing);

    let snapshot = dispatcher.metrics().snapshot();
    println!("\n=== Example Complete ===");
    println!("upstream calls: {}", calls.load(Ordering::SeqCst));
    println!("{:#?}", snapshot);
    println!("cache hit rate: {:.2}", snapshot.cache_hit_rate());

    Ok(())
}
