use std::sync::Arc;

use anyhow::Context;

use shopcart_catalog_server::{build_app, Catalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopcart_observability::init();

    let db_path = std::env::var("SHOPCART_CATALOG_DB").unwrap_or_else(|_| {
        tracing::warn!("SHOPCART_CATALOG_DB not set; using ./db.json");
        "db.json".to_string()
    });
    let addr = std::env::var("SHOPCART_CATALOG_ADDR").unwrap_or_else(|_| "127.0.0.1:3333".to_string());

    let catalog = Catalog::load(&db_path)?;
    tracing::info!(
        db = %db_path,
        products = catalog.products().count(),
        "catalog loaded"
    );

    let app = build_app(Arc::new(catalog));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
