//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use txtpages_core::StockPages;
use txtpages_core::config::AppConfig;
use txtpages_server::{AppState, create_router};
use txtpages_store::{PageStore, SqliteStore};

use super::flaky::FlakyStore;

/// Secret of the seed page in every test store.
#[allow(dead_code)]
pub const SEED_SECRET: &str = "seed-secret-words";

const ABOUT_MD: &str = "# About TxtPages\n\nQuickly create fast text web pages.\n";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

/// Status, headers and body text of a response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with a fresh store and one stock page.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::with_store(modifier, |store| store).await
    }

    /// Create a test server whose store fails on demand.
    pub async fn flaky() -> (Self, Arc<FlakyStore>) {
        let mut flaky = None;
        let server = Self::with_store(
            |_| {},
            |store| {
                let wrapped = Arc::new(FlakyStore::new(store));
                flaky = Some(wrapped.clone());
                wrapped
            },
        )
        .await;
        (server, flaky.expect("store wrapper was not applied"))
    }

    /// Create a test server, letting `wrap` decorate the opened store.
    pub async fn with_store<F, W>(modifier: F, wrap: W) -> Self
    where
        F: FnOnce(&mut AppConfig),
        W: FnOnce(Arc<dyn PageStore>) -> Arc<dyn PageStore>,
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing(temp_dir.path().join("pages.db"));
        config.server.stock_dir = temp_dir.path().join("stock");
        config.server.static_dir = temp_dir.path().join("static");
        modifier(&mut config);

        std::fs::create_dir_all(&config.server.stock_dir)
            .expect("Failed to create stock directory");
        std::fs::write(config.server.stock_dir.join("about.md"), ABOUT_MD)
            .expect("Failed to write stock page");
        std::fs::create_dir_all(&config.server.static_dir)
            .expect("Failed to create static directory");
        std::fs::write(
            config.server.static_dir.join("style.css"),
            "body { margin: 0; }\n",
        )
        .expect("Failed to write stylesheet");

        SqliteStore::initialize(&config.store, SEED_SECRET)
            .await
            .expect("Failed to initialize store")
            .close()
            .await;

        let stock = StockPages::load(&config.server.stock_dir).expect("Failed to load stock pages");
        let store = txtpages_store::from_config(&config, stock.reserved_slugs())
            .await
            .expect("Failed to open store");
        let store = wrap(store);

        txtpages_server::metrics::register_metrics();

        let state = AppState::new(config, store, stock);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying store.
    pub fn store(&self) -> Arc<dyn PageStore> {
        self.state.store.clone()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(fields)))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&body_bytes).into_owned(),
        }
    }
}

/// Encode form fields the way a browser would.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Pull the edit code out of a page-created response.
#[allow(dead_code)]
pub fn edit_code(body: &str) -> String {
    let start = body
        .find("<b class=\"editcode\">")
        .map(|i| i + "<b class=\"editcode\">".len())
        .expect("no edit code in response");
    let end = body[start..].find("</b>").expect("unterminated edit code") + start;
    body[start..end].to_string()
}
