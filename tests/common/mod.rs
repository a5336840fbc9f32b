//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;
use voice_relay::{ApiServer, ApiServerBuilder, ReplyGenerator, SessionStore};

/// Generator that echoes the query and counts calls
#[derive(Default)]
pub struct EchoGenerator {
    calls: AtomicUsize,
}

impl EchoGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, text: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!("Rev: you said {text}")
    }

    fn mode(&self) -> &'static str {
        "echo"
    }
}

/// Generator that always panics
pub struct PanickingGenerator;

#[async_trait]
impl ReplyGenerator for PanickingGenerator {
    async fn generate(&self, _text: &str) -> String {
        panic!("secret stack detail")
    }

    fn mode(&self) -> &'static str {
        "panicking"
    }
}

/// Build a test API server around a generator and session store
pub fn build_test_server(generator: Arc<dyn ReplyGenerator>, sessions: SessionStore) -> ApiServer {
    ApiServerBuilder::new(generator, 0)
        .sessions(sessions)
        .model("test-model".to_string())
        .build()
}

/// POST a raw body and return status plus parsed JSON
pub async fn post_raw(
    app: axum::Router,
    uri: &str,
    body: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    (status, json)
}

/// POST a JSON value and return status plus parsed JSON
pub async fn post_json(
    app: axum::Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    post_raw(app, uri, &body.to_string()).await
}

/// GET a path and return status plus parsed JSON
pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&body).unwrap())
}
