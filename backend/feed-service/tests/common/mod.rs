#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use chrono::Duration;
use crypto_core::TokenIssuer;
use feed_service::db::{InMemoryPostRepository, InMemoryUserRepository};
use feed_service::services::UploadStore;
use feed_service::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const BOUNDARY: &str = "----feedtestboundary7MA4YWxkTrZu0gW";
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_SECRET, Duration::days(7))
}

/// In-memory state whose uploads land in `dir`
pub fn test_state(dir: &std::path::Path, max_upload_bytes: usize) -> AppState {
    AppState::in_memory(token_issuer(), UploadStore::new(dir, max_upload_bytes))
}

/// In-memory state over a caller-held user repository
pub fn test_state_with_users(dir: &std::path::Path, users: InMemoryUserRepository) -> AppState {
    AppState::new(
        Arc::new(users),
        Arc::new(InMemoryPostRepository::new()),
        token_issuer(),
        UploadStore::new(dir, 5 * 1024 * 1024),
        None,
    )
}

macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_middleware::CorrelationIdMiddleware)
                .configure(|cfg| feed_service::configure_app(cfg, &$state)),
        )
        .await
    };
}
pub(crate) use init_app;

/// Call the app and decode the JSON body
pub async fn send<S, R, B, E>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = E>,
    B: MessageBody,
    E: std::fmt::Debug,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn signup_request(username: &str, email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "username": username, "email": email, "password": password }))
}

pub fn login_request(email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
}

pub fn bearer(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}

/// One part of a hand-built multipart body
pub enum Part<'a> {
    Text { name: &'a str, value: &'a str },
    File { name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8] },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File { name, filename, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}
