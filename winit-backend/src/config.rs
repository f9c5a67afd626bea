use crate::presenter::TimeWindow;
use anyhow::Context;
use serde::Deserialize;
use std::fmt::Display;
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

pub const DEFAULT_PROMETHEUS_URL: &str =
    "http://prometheus-operated.monitoring.svc.cluster.local:9090";

/// Env var naming an optional TOML file loaded before the environment overrides.
pub const CONFIG_PATH_VAR: &str = "WINIT_BACKEND_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Database {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    // Upper bound on pooled store connections. Defaults to 5.
    pub max_connections: Option<u32>,
    // How long a health probe waits for a pooled connection. Defaults to 5 seconds.
    pub acquire_timeout_secs: Option<u64>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            name: "winitdb".into(),
            user: "postgres".into(),
            password: "postgres".into(),
            max_connections: None,
            acquire_timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    // Base URL of the upstream Prometheus HTTP API.
    pub prometheus_url: String,
    pub database: Database,
    // Total timeout for one upstream request. Defaults to 10 seconds.
    pub timeout_secs: Option<u64>,
    // Connection timeout in seconds for reaching the upstream.
    // If not set, uses reqwest's default behavior (no specific connect timeout).
    pub connect_timeout_secs: Option<u64>,
    // Maximum number of idle upstream connections kept alive.
    pub pool_max_idle_per_host: Option<usize>,
    // TCP keepalive interval in seconds for upstream connections.
    pub tcp_keepalive_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            prometheus_url: DEFAULT_PROMETHEUS_URL.into(),
            database: Database::default(),
            timeout_secs: None,
            connect_timeout_secs: None,
            pool_max_idle_per_host: None,
            tcp_keepalive_secs: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let cfg_str =
            fs::read_to_string(path).with_context(|| format!("reading config file '{}'", path))?;
        Ok(toml::from_str(&cfg_str)?)
    }

    /// Builds the process configuration: defaults, then the optional file named
    /// by `WINIT_BACKEND_CONFIG`, then environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Overrides fields from environment-style lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("HOST") {
            self.host = v;
        }
        if let Some(v) = get("PORT") {
            self.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = get("PROMETHEUS_URL") {
            self.prometheus_url = v;
        }
        if let Some(v) = get("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = get("DB_PORT") {
            self.database.port = parse_var("DB_PORT", &v)?;
        }
        if let Some(v) = get("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = get("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = get("DB_PASSWORD") {
            self.database.password = v;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("resolving listen address {}:{}", self.host, self.port))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("no address for {}:{}", self.host, self.port))
    }
}

/// Settings for the polling dashboard binary. Environment only.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: String,
    pub window: TimeWindow,
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".into(),
            window: TimeWindow::default(),
            refresh_secs: 30,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut cfg = Self::default();
        if let Some(v) = get("DASHBOARD_API_URL") {
            cfg.api_url = v;
        }
        if let Some(v) = get("DASHBOARD_TIME_RANGE") {
            cfg.window = parse_var("DASHBOARD_TIME_RANGE", &v)?;
        }
        if let Some(v) = get("DASHBOARD_REFRESH_SECS") {
            cfg.refresh_secs = parse_var("DASHBOARD_REFRESH_SECS", &v)?;
            if cfg.refresh_secs == 0 {
                anyhow::bail!("DASHBOARD_REFRESH_SECS must be greater than zero");
            }
        }
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", key, raw, e))
}
