#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use church_school_api::auth::{sign_token, JwtKey};
use church_school_api::models::{Role, User};
use church_school_api::store::Store;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";

pub fn create_test_app() -> Router {
    church_school_api::app(Store::memory(), JwtKey::new(SECRET))
}

pub fn user(role: Role, stage: Option<&str>, level: Option<&str>) -> User {
    User {
        id: Uuid::new_v4(),
        role,
        stage: stage.map(Into::into),
        level: level.map(Into::into),
    }
}

pub fn token_for(user: &User) -> String {
    sign_token(user, &JwtKey::new(SECRET), Duration::hours(1)).unwrap()
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
