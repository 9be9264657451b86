use std::path::PathBuf;
use std::sync::Arc;

use fantasy_api::app::{AppServices, build_app};
use fantasy_infra::loader::ImportSources;
use fantasy_infra::store::open_store;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(Arc::new(services));
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post(client: &reqwest::Client, srv: &TestServer, path: &str, body: Value) -> (StatusCode, Value) {
    let res = client.post(srv.url(path)).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn get(client: &reqwest::Client, srv: &TestServer, path: &str) -> (StatusCode, Value) {
    let res = client.get(srv.url(path)).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

/// Worked example: 2 customers, 2 invoices, 2 products, 3 sales.
async fn seed(client: &reqwest::Client, srv: &TestServer) {
    for (first, condition) in [("John", 1), ("Jane", 0)] {
        let (status, _) = post(
            client,
            srv,
            "/customers",
            json!({"first_name": first, "last_name": "Doe", "condition": condition}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for customer_id in [1, 2] {
        let (status, _) = post(
            client,
            srv,
            "/invoices",
            json!({"datetime": "2022-05-15 10:00:00", "customer_id": customer_id}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for (description, price) in [("P1", 10.0), ("P2", 5.0)] {
        let (status, _) = post(
            client,
            srv,
            "/products",
            json!({"description": description, "price": price}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for (product_id, invoice_id, quantity) in [(1, 1, 10), (2, 1, 10), (1, 2, 20)] {
        let (status, _) = post(
            client,
            srv,
            "/sales",
            json!({"product_id": product_id, "invoice_id": invoice_id, "quantity": quantity}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let (status, body) = get(&reqwest::Client::new(), &srv, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn create_returns_assigned_id_and_lists_show_it() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        &srv,
        "/customers",
        json!({"first_name": "Ike", "last_name": "Fifield", "condition": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "customer created");
    assert_eq!(body["data"]["id"], 1);

    let (status, body) = get(&client, &srv, "/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": [{"id": 1, "first_name": "Ike", "last_name": "Fifield", "condition": 0}]})
    );
}

#[tokio::test]
async fn recompute_then_reports() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();
    seed(&client, &srv).await;

    let res = client.patch(srv.url("/invoices/totals")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "invoices total updated"}));

    let (_, invoices) = get(&client, &srv, "/invoices").await;
    let totals: Vec<f64> = invoices["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["total"].as_f64().unwrap())
        .collect();
    assert_eq!(totals, vec![150.0, 200.0]);

    let (status, top) = get(&client, &srv, "/products/top").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        top,
        json!({"data": [
            {"id": 1, "description": "P1", "total": 30},
            {"id": 2, "description": "P2", "total": 10},
        ]})
    );

    let (_, by_condition) = get(&client, &srv, "/invoices/totals-by-condition").await;
    assert_eq!(
        by_condition,
        json!({"data": [
            {"condition": 0, "total": 200.0},
            {"condition": 1, "total": 150.0},
        ]})
    );

    let (_, customers) = get(&client, &srv, "/customers/top?limit=1").await;
    assert_eq!(
        customers,
        json!({"data": [{"id": 2, "first_name": "Jane", "last_name": "Doe", "amount": 200.0}]})
    );
}

#[tokio::test]
async fn dangling_reference_is_a_conflict() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        &srv,
        "/invoices",
        json!({"datetime": "2022-05-15", "customer_id": 9}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "referential_violation");
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let srv = TestServer::spawn(AppServices::in_memory()).await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        &srv,
        "/customers",
        json!({"first_name": "  ", "last_name": "Doe"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = post(
        &client,
        &srv,
        "/invoices",
        json!({"datetime": "15/05/2022", "customer_id": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(srv.url("/products"))
        .header("content-type", "application/json")
        .body("{\"description\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_json");

    for query in ["limit=0", "limit=101", "limit=abc"] {
        let (status, _) = get(&client, &srv, &format!("/products/top?{query}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
    }
}

/// Import source in the temp dir, removed on drop.
struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    fn write(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("fantasy-api-{name}-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&path, contents).unwrap();
        Self { path }
    }
}

impl Drop for SourceFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[tokio::test]
async fn startup_import_on_sqlite_serves_reports() {
    let customers_src = SourceFile::write(
        "customers",
        r#"[{"id":1,"first_name":"John","last_name":"Doe","condition":1},
            {"id":2,"first_name":"Jane","last_name":"Doe","condition":0}]"#,
    );
    let invoices_src = SourceFile::write(
        "invoices",
        r#"[{"id":1,"datetime":"2022-05-15 10:00:00","customer_id":1,"total":0},
            {"id":2,"datetime":"2022-05-16 10:00:00","customer_id":2,"total":0}]"#,
    );
    let products_src = SourceFile::write(
        "products",
        r#"[{"id":1,"description":"P1","price":10.0},{"id":2,"description":"P2","price":5.0}]"#,
    );
    let sales_src = SourceFile::write(
        "sales",
        r#"[{"id":1,"product_id":1,"invoice_id":1,"quantity":10},
            {"id":2,"product_id":2,"invoice_id":1,"quantity":10},
            {"id":3,"product_id":1,"invoice_id":2,"quantity":20}]"#,
    );
    let sources = ImportSources {
        customers: customers_src.path.clone(),
        invoices: invoices_src.path.clone(),
        products: products_src.path.clone(),
        sales: sales_src.path.clone(),
    };

    let store = open_store(Some("sqlite::memory:")).await.unwrap();
    let services = AppServices::new(store);
    let summary = services.import(&sources, true).await.unwrap();
    assert_eq!(summary.total(), 9);

    let srv = TestServer::spawn(services).await;
    let client = reqwest::Client::new();

    let (_, customers) = get(&client, &srv, "/customers/top").await;
    let amounts: Vec<f64> = customers["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![200.0, 150.0]);
}
