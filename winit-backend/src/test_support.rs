//! Shared fixtures for in-process HTTP tests.

use crate::config::Config;
use crate::state::AppState;
use crate::store::StoreProbe;
use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;

/// Store whose probe outcome is fixed.
pub enum StaticStore {
    Reachable,
    Unreachable,
}

#[async_trait]
impl StoreProbe for StaticStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        match self {
            StaticStore::Reachable => Ok(()),
            StaticStore::Unreachable => Err(sqlx::Error::PoolTimedOut),
        }
    }
}

/// Serves `app` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_router(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = axum::Server::from_tcp(listener)
        .expect("server")
        .serve(app.into_make_service());
    tokio::spawn(server);
    format!("http://127.0.0.1:{}", addr.port())
}

pub fn state_with_store(store: StaticStore) -> Arc<AppState> {
    let cfg = Config {
        prometheus_url: "http://127.0.0.1:1".into(),
        timeout_secs: Some(2),
        ..Config::default()
    };
    Arc::new(AppState::with_store(&cfg, Arc::new(store)).expect("state"))
}

pub fn healthy_state(prometheus_url: &str) -> Arc<AppState> {
    let cfg = Config {
        prometheus_url: prometheus_url.into(),
        timeout_secs: Some(2),
        ..Config::default()
    };
    Arc::new(AppState::with_store(&cfg, Arc::new(StaticStore::Reachable)).expect("state"))
}
