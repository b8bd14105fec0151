use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration loaded from `~/.adjutant/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
    #[serde(default)]
    pub beads: BeadsConfig,
    #[serde(default)]
    pub websocket: WebsocketConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            security: SecurityConfig::default(),
            cache: CacheConfig::default(),
            projects: ProjectsConfig::default(),
            beads: BeadsConfig::default(),
            websocket: WebsocketConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `~/.adjutant/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(cfg)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(cfg)
    }

    /// Serialize config to TOML string, used by `adjutant init` to write a
    /// fresh config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".adjutant")
            .join("config.toml")
    }

    /// Expand a leading `~/` in any path-valued field against `home`.
    pub fn expand_home(&mut self, home: &str) {
        if self.cache.path.starts_with("~/") {
            self.cache.path = self.cache.path.replacen('~', home, 1);
        }
        if self.projects.state_dir.starts_with("~/") {
            self.projects.state_dir = self.projects.state_dir.replacen('~', home, 1);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_daemon_port")]
    pub port: u16,
    #[serde(default = "default_daemon_host")]
    pub host: String,
    #[serde(default = "default_workspace_root")]
    pub workspace_root: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: default_daemon_port(),
            host: default_daemon_host(),
            workspace_root: default_workspace_root(),
        }
    }
}

fn default_daemon_port() -> u16 {
    9876
}
fn default_daemon_host() -> String {
    "127.0.0.1".into()
}
fn default_workspace_root() -> String {
    dirs::home_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Required for all non-MCP HTTP/WS paths.
    #[serde(default)]
    pub api_key: Option<String>,
    /// URL prefixes that skip API-key enforcement.
    #[serde(default = "default_mcp_public_prefixes")]
    pub mcp_public_prefixes: Vec<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            mcp_public_prefixes: default_mcp_public_prefixes(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_mcp_public_prefixes() -> Vec<String> {
    vec!["/mcp".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { path: default_cache_path() }
    }
}

fn default_cache_path() -> String {
    "~/.adjutant/messages.db".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsConfig {
    #[serde(default = "default_projects_state_dir")]
    pub state_dir: String,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self { state_dir: default_projects_state_dir() }
    }
}

fn default_projects_state_dir() -> String {
    "~/.adjutant".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeadsConfig {
    #[serde(default = "default_bd_timeout_ms")]
    pub bd_timeout_ms: u64,
    #[serde(default = "default_prefix_map_refresh_ms")]
    pub prefix_map_refresh_ms: u64,
}

impl Default for BeadsConfig {
    fn default() -> Self {
        Self {
            bd_timeout_ms: default_bd_timeout_ms(),
            prefix_map_refresh_ms: default_prefix_map_refresh_ms(),
        }
    }
}

fn default_bd_timeout_ms() -> u64 {
    10_000
}
fn default_prefix_map_refresh_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsocketConfig {
    #[serde(default = "default_ws_replay_buffer_size")]
    pub replay_buffer_size: usize,
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self { replay_buffer_size: default_ws_replay_buffer_size() }
    }
}

fn default_ws_replay_buffer_size() -> usize {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_output_ring_lines")]
    pub output_ring_lines: usize,
    #[serde(default = "default_max_terminal_sessions")]
    pub max_terminal_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_ring_lines: default_session_output_ring_lines(),
            max_terminal_sessions: default_max_terminal_sessions(),
        }
    }
}

fn default_session_output_ring_lines() -> usize {
    1000
}
fn default_max_terminal_sessions() -> usize {
    10
}
