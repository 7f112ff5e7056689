use anyhow::Result;
use serde::{Deserialize, Serialize};
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
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
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server starts.
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Public API surface settings: naming, CORS and route prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_base_prefix")]
    pub base_prefix: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Final prefix. Composed from `base_prefix` and `version` when left empty.
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            cors_origins: default_cors_origins(),
            base_prefix: default_base_prefix(),
            version: default_version(),
            prefix: String::new(),
            max_page_size: default_max_page_size(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_project_name() -> String { "Hopitalia Assurance API".into() }
fn default_cors_origins() -> Vec<String> { vec!["*".into()] }
fn default_base_prefix() -> String { "/api".into() }
fn default_version() -> String { "v1".into() }
fn default_max_page_size() -> u64 { 1000 }
fn default_max_upload_bytes() -> usize { 20 * 1024 * 1024 }

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file does not exist, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_and_validate_with(|key| std::env::var(key).ok())
    }

    /// Same as [`normalize_and_validate`](Self::normalize_and_validate) with an
    /// injectable environment lookup.
    pub fn normalize_and_validate_with<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.apply_env(&env);
        self.server.normalize()?;
        self.database.normalize_from(&env);
        self.database.validate()?;
        self.api.apply_env(&env);
        self.api.normalize()?;
        if let Some(fmt) = env("LOG_FORMAT") {
            self.logging.format = match fmt.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Compact,
            };
        }
        Ok(())
    }
}

impl ServerConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, env: &F) {
        if let Some(host) = env("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = env("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = env("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        self.normalize_from(&|key: &str| std::env::var(key).ok());
    }

    fn normalize_from<F: Fn(&str) -> Option<String>>(&mut self, env: &F) {
        if let Some(url) = env("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl ApiConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, env: &F) {
        if let Some(name) = env("PROJECT_NAME") {
            self.project_name = name;
        }
        if let Some(prefix) = env("API_PREFIX") {
            self.prefix = prefix;
        }
        if let Some(origins) = env("CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            let base = self.base_prefix.trim_end_matches('/');
            self.prefix = format!("{}/{}", base, self.version.trim_matches('/'));
        }
        self.prefix = self.prefix.trim().trim_end_matches('/').to_string();
        if !self.prefix.starts_with('/') {
            return Err(anyhow!("api.prefix must start with '/'"));
        }
        if self.max_page_size == 0 {
            return Err(anyhow!("api.max_page_size must be >= 1"));
        }
        Ok(())
    }

    /// True when any configured origin is the `*` wildcard.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
