#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use leaflet_server::config::{Config, Mode, StorageConfig};
use leaflet_server::db;
use leaflet_server::state::AppState;
use leaflet_server::storage;

const PEER: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)), 0);

fn test_config(storage_root: std::path::PathBuf) -> Config {
    Config {
        mode: Mode::Development,
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        session_secret: "test-session-secret-at-least-32-chars!!".to_string(),
        csrf_secret: "test-csrf-secret-at-least-32-chars!!!!!".to_string(),
        session_max_age_secs: 60 * 60 * 24 * 7,
        session_secure: false,
        google: None,
        smtp: None,
        storage: StorageConfig::Local { root_path: storage_root },
        cors_origin: "http://localhost:5173".to_string(),
        app_url: "http://localhost:5173".to_string(),
        rate_limit_window_secs: 60,
        rate_limit_max: 100,
    }
}

/// A fresh, isolated app (in-memory SQLite, a scratch object-store
/// directory) plus the `TempDir` that backs it. The directory must
/// outlive the test, since `LocalFsStore` writes real files into it.
pub struct TestApp {
    pub router: Router,
    _storage_dir: tempfile::TempDir,
}

pub async fn spawn() -> TestApp {
    let (pool, backend) = db::create_test_pool().await;
    let storage_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(storage_dir.path().to_path_buf());
    let store = storage::build_store(&config.storage, b"test-object-key-secret".to_vec())
        .await
        .expect("local store always builds");
    let state = AppState::new(config, pool, backend, store);
    let router = leaflet_server::build_router(state);
    TestApp {
        router,
        _storage_dir: storage_dir,
    }
}

/// Cookie-jar-carrying client mirroring the teacher's `get`/`post_json`
/// harness helpers, adapted for the session+CSRF double-submit cookie
/// pair this API issues instead of a single signed session cookie.
pub struct Client {
    router: Router,
    cookies: Vec<(String, String)>,
    csrf_token: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub json: Value,
}

impl Client {
    pub fn new(app: &TestApp) -> Self {
        Client {
            router: app.router.clone(),
            cookies: Vec::new(),
            csrf_token: None,
        }
    }

    /// Drops the CSRF token while keeping the session cookie, simulating a
    /// request that can't read this origin's cookies.
    pub fn forget_csrf_token(&mut self) {
        self.csrf_token = None;
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn absorb_set_cookies(&mut self, response: &axum::response::Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(pair) = raw.split(';').next() else { continue };
            let Some((name, value)) = pair.split_once('=') else { continue };
            let (name, value) = (name.trim().to_string(), value.trim().to_string());
            if name == "csrf_token" {
                self.csrf_token = Some(value.clone());
            }
            self.cookies.retain(|(k, _)| k != &name);
            self.cookies.push((name, value));
        }
    }

    async fn send(&mut self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        if method != "GET" {
            if let Some(token) = &self.csrf_token {
                builder = builder.header("x-csrf-token", token.clone());
            }
        }
        let request = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(serde_json::to_vec(&json).unwrap())).unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };
        self.dispatch(request).await
    }

    async fn dispatch(&mut self, mut request: Request<Body>) -> TestResponse {
        request.extensions_mut().insert(ConnectInfo(PEER));
        let response = self.router.clone().oneshot(request).await.unwrap();
        self.absorb_set_cookies(&response);
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, json }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send("GET", path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> TestResponse {
        self.send("POST", path, Some(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: Value) -> TestResponse {
        self.send("PATCH", path, Some(body)).await
    }

    pub async fn put(&mut self, path: &str, body: Value) -> TestResponse {
        self.send("PUT", path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> TestResponse {
        self.send("DELETE", path, None).await
    }

    /// Like `patch`, but with one extra header — used for the
    /// `If-Unmodified-Since` optimistic-concurrency tests.
    pub async fn patch_with_header(
        &mut self,
        path: &str,
        body: Value,
        header_name: &str,
        header_value: &str,
    ) -> TestResponse {
        let mut builder = Request::builder().method("PATCH").uri(path);
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.header("x-csrf-token", token.clone());
        }
        builder = builder.header(header_name, header_value);
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.dispatch(request).await
    }

    /// Posts a single-file multipart body, the shape every
    /// `/api/upload/*` route expects.
    pub async fn upload_file(
        &mut self,
        path: &str,
        field_filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let boundary = "test-boundary-leaflet";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{field_filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let mut builder = Request::builder().method("POST").uri(path).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.header("x-csrf-token", token.clone());
        }
        let request = builder.body(Body::from(body)).unwrap();
        self.dispatch(request).await
    }

    /// Registers a fresh account and leaves the client authenticated,
    /// the way every test's setup begins.
    pub async fn register(&mut self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/auth/register",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }
}

pub fn data(resp: &TestResponse) -> &Value {
    &resp.json["data"]
}
