use projrec_engine::{DataSource, InMemoryStore, JsonFileStore, RankerConfig, DEFAULT_ALPHA, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ranking defaults
    #[serde(default)]
    pub engine: EngineConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5001))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Titles returned per request
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Collaborative weight in [0, 1]
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            alpha: default_alpha(),
        }
    }
}

impl EngineConfig {
    pub fn ranker(&self) -> RankerConfig {
        RankerConfig {
            top_n: self.top_n,
            alpha: self.alpha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Seeded once at startup, then served from memory
    Memory,
    /// Re-read from disk on every request
    JsonFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_kind")]
    pub kind: StoreKind,

    /// Snapshot file (`{"users": [...], "projects": [...]}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_store_kind() -> StoreKind {
    StoreKind::Memory
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            path: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let mut config = Self {
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            store: StoreConfig::default(),
        };

        // Allow the listen address to be overridden from the environment
        if let Some(addr) = std::env::var("PROJREC_LISTEN_ADDR")
            .ok()
            .and_then(|s| s.parse::<SocketAddr>().ok())
        {
            config.server.listen_addr = addr;
        }

        config
    }
}

impl ServiceConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.engine.ranker().validate().map_err(|e| e.to_string())?;
        if self.store.kind == StoreKind::JsonFile && self.store.path.is_none() {
            return Err("store.kind = \"json_file\" requires store.path".to_string());
        }
        Ok(())
    }

    /// Load from file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Construct the configured store client
    pub async fn open_store(&self) -> anyhow::Result<Arc<dyn DataSource>> {
        match self.store.kind {
            StoreKind::JsonFile => {
                let path = self
                    .store
                    .path
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("store.path is required for json_file stores"))?;
                Ok(Arc::new(JsonFileStore::new(path)))
            }
            StoreKind::Memory => {
                let store = match &self.store.path {
                    Some(path) => {
                        let snapshot = JsonFileStore::new(path).fetch().await?;
                        InMemoryStore::from_snapshot(snapshot)
                    }
                    None => {
                        warn!("No store.path configured, starting with an empty in-memory store");
                        InMemoryStore::new()
                    }
                };
                Ok(Arc::new(store))
            }
        }
    }
}
