use std::sync::Arc;

use washline_infra::{InMemoryStore, LifecycleEngine, PostgresStore};
use washline_notify::TracingDispatcher;
use washline_sequence::SequenceAllocator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    washline_observability::init();

    let store_code = std::env::var("STORE_CODE").unwrap_or_else(|_| {
        tracing::warn!("STORE_CODE not set; using default store code 001");
        "001".to_string()
    });

    let dispatcher = Arc::new(TracingDispatcher);

    let engine = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url).await?;
            let store = Arc::new(PostgresStore::new(pool));
            store.ensure_schema().await?;
            LifecycleEngine::new(
                store.clone(),
                store.clone(),
                SequenceAllocator::new(store, store_code),
                dispatcher,
            )
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using volatile in-memory store");
            let store = Arc::new(InMemoryStore::new());
            LifecycleEngine::new(
                store.clone(),
                store.clone(),
                SequenceAllocator::new(store, store_code),
                dispatcher,
            )
        }
    };

    let app = washline_api::app::build_app(Arc::new(engine));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
