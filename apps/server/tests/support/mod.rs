//! Shared fixtures for the integration suite: an ephemeral `AppState` plus a
//! thin request builder over the assembled `Router` (spec.md §8, SPEC_FULL.md
//! §A.4 — driven with `tower::ServiceExt::oneshot`, no real socket).

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use base64::Engine;
use tower::ServiceExt;

use trellis_server::config::{Config, LogFormat};
use trellis_server::state::AppState;

pub const BASE_URL: &str = "http://example/";

/// The one principal every scenario authenticates as unless it's explicitly
/// testing anonymous/third-party access; admin status sidesteps ACL setup for
/// scenarios that aren't about WebAC itself.
pub const ADMIN_USER: &str = "urn:trellis:user:admin";

pub async fn test_router() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        base_url: BASE_URL.to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        storage_root: dir.path().to_path_buf(),
        extension_graphs: HashMap::new(),
        weak_etag: true,
        precondition_required: false,
        put_uncontained: false,
        patch_create: false,
        memento_header_dates: true,
        web_sub_hub: None,
        namespaces_path: dir.path().join("namespaces.json"),
        admin_users: vec![ADMIN_USER.to_string()],
        auth_realm: "trellis".to_string(),
        auth_scope: "read write".to_string(),
        webac_cache_size: 10_000,
        webac_cache_expire_seconds: 60,
        profile_fetch_timeout_seconds: 10,
        request_timeout_seconds: 30,
        log_format: LogFormat::Pretty,
    };
    let state = AppState::bootstrap(config).await.expect("bootstrap");
    (trellis_server::build_router(state), dir)
}

fn basic_auth(username: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:x"));
    format!("Basic {encoded}")
}

pub fn admin_header() -> String {
    basic_auth("admin")
}

pub fn user_header(username: &str) -> String {
    basic_auth(username)
}

pub struct Req {
    builder: axum::http::request::Builder,
    body: Body,
}

impl Req {
    pub fn new(method: &str, path: &str) -> Self {
        Self { builder: Request::builder().method(method).uri(path), body: Body::empty() }
    }

    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(name, value.into());
        self
    }

    pub fn as_admin(self) -> Self {
        self.header("authorization", admin_header())
    }

    pub fn as_user(self, username: &str) -> Self {
        self.header("authorization", user_header(username))
    }

    pub fn body(mut self, content_type: &str, body: impl Into<Body>) -> Self {
        self.builder = self.builder.header("content-type", content_type);
        self.body = body.into();
        self
    }

    pub async fn send(self, router: &Router) -> Response<Body> {
        let request = self.builder.body(self.body).expect("valid request");
        router.clone().oneshot(request).await.expect("router call")
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
