use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub appwrite: AppwriteConfig,
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

/// Connection settings for the hosted backend.
///
/// Every id is fixed for the lifetime of the process; the facade reuses
/// them on each call.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppwriteConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub database_id: String,
    /// Row table holding posts. Older consoles call it a collection.
    #[serde(default, alias = "collection_id")]
    pub table_id: String,
    #[serde(default)]
    pub bucket_id: String,
    /// Server API key; browser-style sessions leave it unset.
    #[serde(default)]
    pub api_key: Option<String>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !std::path::Path::new(&path).exists() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(process_env)?;
        self.appwrite.validate()?;
        Ok(())
    }

    /// Fill gaps from `lookup` (normally the process environment) and
    /// normalize server settings.
    pub fn normalize_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize_with(&lookup)?;
        self.appwrite.normalize_with(&lookup);
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) -> Result<()> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = port.parse().map_err(|_| anyhow!("SERVER_PORT must be an integer, got {port}"))?;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
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

impl AppwriteConfig {
    /// Values missing from the TOML file are taken from the environment.
    pub fn normalize_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        fill(&mut self.endpoint, lookup("APPWRITE_URL"));
        fill(&mut self.project_id, lookup("APPWRITE_PROJECT_ID"));
        fill(&mut self.database_id, lookup("APPWRITE_DATABASE_ID"));
        fill(&mut self.table_id, lookup("APPWRITE_COLLECTION_ID").or_else(|| lookup("APPWRITE_TABLE_ID")));
        fill(&mut self.bucket_id, lookup("APPWRITE_BUCKET_ID"));
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            self.api_key = lookup("APPWRITE_API_KEY");
        }
        self.endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.endpoint.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("appwrite.endpoint must start with http:// or https://; set it in config.toml or APPWRITE_URL"));
        }
        for (name, value) in [
            ("project_id", &self.project_id),
            ("database_id", &self.database_id),
            ("table_id", &self.table_id),
            ("bucket_id", &self.bucket_id),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("appwrite.{name} is empty"));
            }
        }
        Ok(())
    }
}

fn fill(slot: &mut String, value: Option<String>) {
    if slot.trim().is_empty() {
        if let Some(v) = value {
            *slot = v;
        }
    }
}
