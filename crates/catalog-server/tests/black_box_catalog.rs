use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use shopcart_catalog_server::{build_app, Catalog, CatalogDb};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(catalog: Catalog) -> Self {
        let app = build_app(Arc::new(catalog));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn fixture() -> Catalog {
    let db: CatalogDb = serde_json::from_value(json!({
        "products": [
            {"id": 1, "title": "Walking shoe", "price": 179.9, "image": "walk.jpg"},
            {"id": 2, "title": "Trail shoe", "price": 139.9, "image": "trail.jpg", "brand": "Acme"}
        ],
        "stock": [
            {"id": 1, "amount": 3},
            {"id": 2, "amount": 0}
        ]
    }))
    .unwrap();
    Catalog::from_db(db).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = TestServer::spawn(fixture()).await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn product_by_id_returns_catalog_fields() {
    let srv = TestServer::spawn(fixture()).await;
    let res = reqwest::get(format!("{}/products/2", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["id"], 2);
    assert_eq!(body["title"], "Trail shoe");
    assert_eq!(body["brand"], "Acme");
}

#[tokio::test]
async fn stock_by_id_returns_amount() {
    let srv = TestServer::spawn(fixture()).await;
    let res = reqwest::get(format!("{}/stock/1", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"id": 1, "amount": 3}));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let srv = TestServer::spawn(fixture()).await;

    for path in ["products/99", "stock/99"] {
        let res = reqwest::get(format!("{}/{}", srv.base_url, path)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let srv = TestServer::spawn(fixture()).await;
    let res = reqwest::get(format!("{}/stock/abc", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn listings_return_everything() {
    let srv = TestServer::spawn(fixture()).await;

    let products: Vec<serde_json::Value> = reqwest::get(format!("{}/products", srv.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 2);

    let stock: Vec<serde_json::Value> = reqwest::get(format!("{}/stock", srv.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stock.len(), 2);
}

#[test]
fn bundled_db_file_loads() {
    let catalog = Catalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/db.json")).unwrap();
    assert!(catalog.products().count() > 0);
    for product in catalog.products() {
        assert!(catalog.stock(product.id).is_some(), "missing stock for {}", product.id);
    }
}
