//! Shared helpers for HTTP integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use keyward_auth_api::identity::ExternalIdentityVerifier;
use keyward_auth_api::notifier::ResetNotifier;
use keyward_auth_api::{build_router, AppState};
use keyward_auth_core::{AuthConfig, AuthError, RsaKeyPair};
use keyward_types::{AuthProvider, ExternalIdentity};
use tower::ServiceExt;

const SIGNING_PRIVATE_PEM: &str =
    include_str!("../../../../crates/keyward-auth-core/tests/fixtures/signing_private.pem");
const SIGNING_PUBLIC_PEM: &str =
    include_str!("../../../../crates/keyward-auth-core/tests/fixtures/signing_public.pem");

pub fn public_pem() -> &'static str {
    SIGNING_PUBLIC_PEM
}

/// Reset tokens handed to the notifier, in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, token)| token.clone())
    }

    pub fn last_email(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(email, _)| email.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn password_reset_requested(&self, email: &str, token: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
    }
}

/// Accepts credentials of the form `valid:<email>`
#[derive(Debug, Default)]
pub struct StubVerifier;

#[async_trait]
impl ExternalIdentityVerifier for StubVerifier {
    async fn verify(
        &self,
        provider: AuthProvider,
        credential: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        let email = credential
            .strip_prefix("valid:")
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(ExternalIdentity::new(provider, email, "Grace Hopper"))
    }
}

/// Full router over in-memory stores
pub fn build_test_app() -> (Router, Arc<RecordingNotifier>) {
    let keys = RsaKeyPair::from_pem(SIGNING_PRIVATE_PEM, SIGNING_PUBLIC_PEM).unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::in_memory(AuthConfig::new("keyward-test"), keys)
        .with_notifier(notifier.clone())
        .with_verifier(Arc::new(StubVerifier));
    (build_router(state), notifier)
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
