use crate::config::Config;
use crate::store::{PgStore, StoreProbe};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct AppState {
    pub client: Client,
    // Validated upstream base, without a trailing slash
    pub prometheus_url: String,
    pub store: Arc<dyn StoreProbe>,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::connect_lazy(&cfg.database));
        Self::with_store(cfg, store)
    }

    pub fn with_store(cfg: &Config, store: Arc<dyn StoreProbe>) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(10));
        let mut builder = Client::builder().timeout(timeout);
        if let Some(secs) = cfg.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(max) = cfg.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max);
        }
        if let Some(secs) = cfg.tcp_keepalive_secs {
            builder = builder.tcp_keepalive(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        debug!("HTTP client created with timeout: {:?}", timeout);

        // Parse and validate the upstream URL at startup
        let parsed = Url::parse(&cfg.prometheus_url).map_err(|e| {
            anyhow::anyhow!("Invalid Prometheus URL '{}': {}", cfg.prometheus_url, e)
        })?;
        if parsed.cannot_be_a_base() {
            anyhow::bail!("Invalid Prometheus URL '{}': not a base URL", cfg.prometheus_url);
        }
        let prometheus_url = cfg.prometheus_url.trim_end_matches('/').to_string();
        info!("Relaying queries to '{}'", prometheus_url);

        Ok(AppState {
            client,
            prometheus_url,
            store,
        })
    }

    /// Full upstream URL for an `/api/v1/<endpoint>` call.
    pub fn upstream_endpoint(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{}", self.prometheus_url, endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticStore;

    #[test]
    fn appstate_trims_trailing_slash() {
        let cfg = Config {
            prometheus_url: "http://127.0.0.1:9090/".to_string(),
            timeout_secs: Some(1),
            ..Config::default()
        };
        let st = AppState::with_store(&cfg, Arc::new(StaticStore::Reachable)).expect("build state");
        assert_eq!(st.prometheus_url, "http://127.0.0.1:9090");
        assert_eq!(
            st.upstream_endpoint("query_range"),
            "http://127.0.0.1:9090/api/v1/query_range"
        );
    }

    #[test]
    fn appstate_keeps_base_path() {
        let cfg = Config {
            prometheus_url: "http://gateway/prometheus".to_string(),
            ..Config::default()
        };
        let st = AppState::with_store(&cfg, Arc::new(StaticStore::Reachable)).expect("build state");
        assert_eq!(
            st.upstream_endpoint("query"),
            "http://gateway/prometheus/api/v1/query"
        );
    }

    #[test]
    fn appstate_rejects_invalid_prometheus_url() {
        let cfg = Config {
            prometheus_url: "not-a-valid-url".to_string(),
            ..Config::default()
        };
        let result = AppState::with_store(&cfg, Arc::new(StaticStore::Reachable));
        assert!(result.is_err(), "should fail with invalid URL");
        if let Err(e) = result {
            let err_msg = e.to_string();
            assert!(
                err_msg.contains("Invalid Prometheus URL"),
                "error message should mention invalid URL: {}",
                err_msg
            );
        }
    }

    #[tokio::test]
    async fn appstate_from_config_builds_lazy_store() {
        let st = AppState::from_config(&Config::default()).expect("build state");
        assert_eq!(st.prometheus_url, crate::config::DEFAULT_PROMETHEUS_URL);
    }
}
