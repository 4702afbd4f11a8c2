use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:42069";
pub const DEFAULT_UPSTREAM_URL: &str = "http://httpbin.org";

/// Server configuration.
///
/// Loaded from an optional YAML file, then overridden by environment
/// variables:
///
/// ```yaml
/// server:
///   listen_addr: "0.0.0.0:8080"
/// upstream:
///   url: "http://localhost:3000"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// Where `/httpbin/stream/<n>` is relayed from. Plain HTTP only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
        }
    }
}

impl Config {
    /// Reads `HTTPWIRE_CONFIG` (a YAML file) if set, then applies the
    /// `LISTEN` and `UPSTREAM_URL` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("HTTPWIRE_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }
        if let Ok(url) = std::env::var("UPSTREAM_URL") {
            cfg.upstream.url = url;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(raw).context("invalid config")
    }

    pub fn upstream_url(&self) -> anyhow::Result<url::Url> {
        url::Url::parse(&self.upstream.url).context("invalid upstream url")
    }
}
