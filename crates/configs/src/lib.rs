use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 5000, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Redis,
    File,
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown backend kind `{other}` (expected redis, file or memory)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default = "default_op_timeout")]
    pub op_timeout_ms: u64,
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            redis_url: default_redis_url(),
            key_prefix: String::new(),
            file_path: default_file_path(),
            op_timeout_ms: default_op_timeout(),
            lock_timeout_ms: default_lock_timeout(),
        }
    }
}

fn default_redis_url() -> String { "redis://127.0.0.1:6379/0".into() }
fn default_file_path() -> String { "data/carts.json".into() }
fn default_op_timeout() -> u64 { 2000 }
fn default_lock_timeout() -> u64 { 1000 }

/// Fixture loading. Off unless explicitly enabled; seeding wipes the backend.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

fn default_log_format() -> String { "compact".into() }

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load_default() -> Result<AppConfig> {
    load_file_or_default(std::env::var("CONFIG_PATH").ok().as_deref())
}

/// An explicit path must exist. Only the implicit `config.toml` may be
/// missing, in which case defaults apply.
fn load_file_or_default(explicit: Option<&str>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_from_file(path).with_context(|| format!("loading CONFIG_PATH={path}"));
    }
    match load_from_file(DEFAULT_CONFIG_PATH) {
        Ok(cfg) => Ok(cfg),
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(io) if io.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
            _ => Err(e),
        },
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `CONFIG_PATH` or `config.toml`, apply environment overrides,
    /// then validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment variables win over values from the file.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = var("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(kind) = var("CART_BACKEND").and_then(|v| v.parse::<BackendKind>().ok()) {
            self.backend.kind = kind;
        }
        if let Some(url) = var("REDIS_URL") {
            self.backend.redis_url = url;
        }
        if let Some(prefix) = var("CART_KEY_PREFIX") {
            self.backend.key_prefix = prefix;
        }
        if let Some(path) = var("CART_DATA_FILE") {
            self.backend.file_path = path;
        }
        if let Some(flag) = var("CART_SEED_ON_STARTUP") {
            self.seed.on_startup = parse_flag(&flag);
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = format;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.backend.validate()?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            BackendKind::Redis => {
                let lower = self.redis_url.trim().to_lowercase();
                if lower.is_empty() {
                    return Err(anyhow!("backend.redis_url is empty; set it in config.toml or REDIS_URL"));
                }
                if !(lower.starts_with("redis://") || lower.starts_with("rediss://") || lower.starts_with("unix://")) {
                    return Err(anyhow!("backend.redis_url must start with redis://, rediss:// or unix://"));
                }
            }
            BackendKind::File => {
                if self.file_path.trim().is_empty() {
                    return Err(anyhow!("backend.file_path is empty; set it in config.toml or CART_DATA_FILE"));
                }
            }
            BackendKind::Memory => {}
        }
        if self.op_timeout_ms == 0 || self.lock_timeout_ms == 0 {
            return Err(anyhow!("backend timeouts must be positive milliseconds"));
        }
        Ok(())
    }
}
