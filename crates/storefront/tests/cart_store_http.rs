//! Cart store against the real HTTP catalog client and SQLite slot.

use std::sync::Arc;

use serde_json::json;

use shopcart_cart::Cart;
use shopcart_catalog_server::{build_app, Catalog, CatalogDb};
use shopcart_core::ProductId;
use shopcart_storefront::{
    CartOutcome, CartStorage, CartStore, HttpCatalogApi, Notice, RecordingNotifier,
    SqliteStorage, StorefrontConfig,
};

const KEY: &str = "@shopcart:cart";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let db: CatalogDb = serde_json::from_value(json!({
            "products": [
                {"id": 1, "title": "Walking shoe", "price": 179.9, "image": "walk.jpg"},
                {"id": 2, "title": "Trail shoe", "price": 139.9, "image": "trail.jpg"},
                {"id": 3, "title": "Sold out shoe", "price": 99.9, "image": "gone.jpg"}
            ],
            "stock": [
                {"id": 1, "amount": 3},
                {"id": 2, "amount": 1},
                {"id": 3, "amount": 0}
            ]
        }))
        .unwrap();
        let app = build_app(Arc::new(Catalog::from_db(db).unwrap()));

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

async fn open_store(
    base_url: &str,
    storage: &SqliteStorage,
) -> (CartStore, RecordingNotifier) {
    let notices = RecordingNotifier::new();
    let store = CartStore::load(
        Arc::new(HttpCatalogApi::new(base_url)),
        Arc::new(storage.clone()),
        Arc::new(notices.clone()),
        KEY,
    )
    .await
    .unwrap();
    (store, notices)
}

async fn persisted(storage: &SqliteStorage) -> Option<Cart> {
    storage
        .get_item(KEY)
        .await
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

fn id(n: u64) -> ProductId {
    ProductId::new(n)
}

#[tokio::test]
async fn connectivity_check_hits_health() {
    let srv = TestServer::spawn().await;
    assert!(HttpCatalogApi::new(&srv.base_url).check_connectivity().await);
}

#[tokio::test]
async fn add_new_product_creates_single_line_item_with_catalog_fields() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, notices) = open_store(&srv.base_url, &storage).await;

    assert_eq!(store.add_product(id(1)).await, CartOutcome::Applied);

    let cart = store.snapshot().await;
    assert_eq!(cart.len(), 1);
    let item = cart.get(id(1)).unwrap();
    assert_eq!(item.amount, 1);
    assert_eq!(item.product.title, "Walking shoe");
    assert_eq!(item.product.image, "walk.jpg");
    assert!(notices.notices().is_empty());
}

#[tokio::test]
async fn repeated_adds_stop_at_stock() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, notices) = open_store(&srv.base_url, &storage).await;

    for _ in 0..3 {
        assert_eq!(store.add_product(id(1)).await, CartOutcome::Applied);
    }
    assert_eq!(
        store.add_product(id(1)).await,
        CartOutcome::Rejected(Notice::OutOfStock)
    );

    assert_eq!(store.snapshot().await.get(id(1)).unwrap().amount, 3);
    assert_eq!(persisted(&storage).await.unwrap().get(id(1)).unwrap().amount, 3);
    assert_eq!(notices.notices(), vec![Notice::OutOfStock]);
}

#[tokio::test]
async fn sold_out_product_can_be_added_once_but_not_incremented() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, _) = open_store(&srv.base_url, &storage).await;

    assert_eq!(store.add_product(id(3)).await, CartOutcome::Applied);
    assert_eq!(
        store.add_product(id(3)).await,
        CartOutcome::Rejected(Notice::OutOfStock)
    );
    assert_eq!(store.snapshot().await.get(id(3)).unwrap().amount, 1);
}

#[tokio::test]
async fn update_amount_is_validated_against_remote_stock() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, notices) = open_store(&srv.base_url, &storage).await;
    store.add_product(id(1)).await;

    assert_eq!(
        store.update_product_amount(id(1), 0).await,
        CartOutcome::Rejected(Notice::OutOfStock)
    );
    assert_eq!(
        store.update_product_amount(id(1), 4).await,
        CartOutcome::Rejected(Notice::OutOfStock)
    );
    assert_eq!(store.snapshot().await.get(id(1)).unwrap().amount, 1);
    assert_eq!(persisted(&storage).await.unwrap().get(id(1)).unwrap().amount, 1);

    assert_eq!(store.update_product_amount(id(1), 3).await, CartOutcome::Applied);
    assert_eq!(store.snapshot().await.get(id(1)).unwrap().amount, 3);
    assert_eq!(notices.take().len(), 2);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, notices) = open_store(&srv.base_url, &storage).await;
    store.add_product(id(1)).await;
    store.add_product(id(2)).await;

    assert_eq!(store.remove_product(id(2)).await, CartOutcome::Applied);
    assert_eq!(store.remove_product(id(2)).await, CartOutcome::Unchanged);

    let cart = store.snapshot().await;
    assert_eq!(cart.len(), 1);
    assert!(cart.contains(id(1)));
    assert!(notices.notices().is_empty());
}

#[tokio::test]
async fn persisted_cart_reloads_equal_to_memory() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, _) = open_store(&srv.base_url, &storage).await;

    store.add_product(id(1)).await;
    store.add_product(id(2)).await;
    store.update_product_amount(id(1), 2).await;
    store.add_product(id(1)).await;
    store.remove_product(id(2)).await;

    let in_memory = store.snapshot().await;
    assert_eq!(persisted(&storage).await.unwrap(), in_memory);

    let (reopened, _) = open_store(&srv.base_url, &storage).await;
    assert_eq!(reopened.snapshot().await, in_memory);
    assert_eq!(in_memory.get(id(1)).unwrap().amount, 3);
}

#[tokio::test]
async fn persisted_blob_is_a_flat_json_array() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, _) = open_store(&srv.base_url, &storage).await;
    store.add_product(id(2)).await;

    let raw = storage.get_item(KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        json!([{"id": 2, "title": "Trail shoe", "price": 139.9, "image": "trail.jpg", "amount": 1}])
    );
}

#[tokio::test]
async fn unreachable_catalog_surfaces_notices_and_leaves_storage_alone() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let storage = SqliteStorage::in_memory();
    let (store, notices) = open_store(&dead_url, &storage).await;

    assert_eq!(
        store.add_product(id(1)).await,
        CartOutcome::Rejected(Notice::AddFailed)
    );
    assert!(store.snapshot().await.is_empty());
    assert_eq!(persisted(&storage).await, None);
    assert_eq!(notices.notices(), vec![Notice::AddFailed]);
}

#[tokio::test]
async fn open_wires_http_client_and_sqlite_file() {
    let srv = TestServer::spawn().await;
    let path = std::env::temp_dir().join(format!(
        "shopcart-open-test-{}-{}.db",
        std::process::id(),
        srv.base_url.rsplit(':').next().unwrap_or_default()
    ));

    let config = StorefrontConfig {
        api_url: srv.base_url.clone(),
        storage_path: Some(path.clone()),
        ..StorefrontConfig::default()
    };

    let store = CartStore::open(&config, Arc::new(RecordingNotifier::new()))
        .await
        .unwrap();
    assert_eq!(store.add_product(id(2)).await, CartOutcome::Applied);

    let reopened = CartStore::open(&config, Arc::new(RecordingNotifier::new()))
        .await
        .unwrap();
    assert_eq!(reopened.snapshot().await, store.snapshot().await);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn concurrent_adds_of_different_products_are_both_kept() {
    let srv = TestServer::spawn().await;
    let storage = SqliteStorage::in_memory();
    let (store, _) = open_store(&srv.base_url, &storage).await;

    let (a, b) = tokio::join!(store.add_product(id(1)), store.add_product(id(2)));
    assert_eq!(a, CartOutcome::Applied);
    assert_eq!(b, CartOutcome::Applied);

    let cart = store.snapshot().await;
    assert_eq!(cart.len(), 2);
    assert_eq!(persisted(&storage).await.unwrap(), cart);
}
