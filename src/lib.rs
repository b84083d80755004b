pub mod attendance;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod progress;
pub mod routes;
pub mod store;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtKey;
use crate::routes::AppState;
use crate::store::Store;

pub fn app(store: Store, jwt: JwtKey) -> Router {
    routes::router(AppState { store, jwt }).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
    )
}
