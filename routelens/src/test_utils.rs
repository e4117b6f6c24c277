//! Shared test helpers.

use axum_test::TestServer;
use sqlx::SqlitePool;

use crate::{AppState, Config, build_router, routing::RoutingGateway};

/// Build a test server over the full router with the given routing gateway.
///
/// The pool comes from `#[sqlx::test]`, which has already applied migrations.
pub async fn create_test_app(pool: SqlitePool, gateway: RoutingGateway) -> TestServer {
    let state = AppState::builder()
        .db(pool)
        .config(Config::default())
        .gateway(gateway)
        .build();

    TestServer::new(build_router(&state)).expect("Failed to create test server")
}
