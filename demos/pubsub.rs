//! # Example: pubsub
//!
//! One producer, three kinds of consumers.
//!
//! Demonstrates how to:
//! - Attach a [`LogHandler`] at build time.
//! - Consume a persistent [`Subscription`] as a stream.
//! - Use a one-shot listener.
//! - Give up on a slow consumer with `emit_timeout`.
//!
//! ## Flow
//! ```text
//! Emitter::builder().with_handler("order", LogHandler)
//!     ├─► on("order.created")        persistent stream
//!     ├─► once("order.cancelled")    first cancellation only
//!     ├─► emit(...) × 3              each awaited via Completion::settled()
//!     ├─► emit_timeout("order.shipped")  nobody reads "audit" → abandoned
//!     └─► close_all(".*")            every stream ends
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example pubsub --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use eventvisor::{Emitter, EmitterConfig, Event, LogHandler, Pattern};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Emitter with a logging handler on everything that mentions "order"
    let emitter = Emitter::builder(EmitterConfig::default())
        .with_handler("order", Arc::new(LogHandler::new()))
        .build();

    // 2. Consumers
    let created = emitter.on(Pattern::glob("order.created")?).await?;
    let mut cancelled = emitter.once("order.cancelled").await?;
    let _audit = emitter.on(Pattern::exact("order.shipped")).await?;

    let reader = tokio::spawn(async move {
        created
            .map(|ev| ev.arg::<u32>(0).copied().unwrap_or_default())
            .collect::<Vec<_>>()
            .await
    });
    let one_shot = tokio::spawn(async move {
        let first = cancelled.recv().await;
        let after = cancelled.recv().await;
        (first.map(|ev| ev.name().to_string()), after.is_none())
    });

    // 3. Produce
    for id in [1u32, 2] {
        let done = emitter.emit(Event::new("order.created").with_arg(id)).await?;
        println!("created #{id}: {:?}", done.settled().await);
    }
    let done = emitter.emit(Event::new("order.cancelled").with_arg(2u32)).await?;
    println!("cancelled: {:?}", done.settled().await);

    // 4. Nobody reads the "order.shipped" stream: give up after 50ms
    let done = emitter
        .emit_timeout(Event::new("order.shipped").with_arg(1u32), Duration::from_millis(50))
        .await?;
    println!("shipped: {:?}", done.settled().await);

    // 5. Release everything
    emitter.close_all(".*").await?;

    println!("created ids: {:?}", reader.await?);
    println!("one-shot: {:?}", one_shot.await?);
    Ok(())
}
