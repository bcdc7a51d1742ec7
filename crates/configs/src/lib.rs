use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub nearby: NearbyConfig,
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
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Gcs,
    File,
}

/// Location of the backing document.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub object: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_path() -> String {
    "data/toko.json".into()
}

fn default_endpoint() -> String {
    "https://storage.googleapis.com".into()
}

fn default_timeout() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: String::new(),
            object: String::new(),
            path: default_path(),
            access_token: None,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyConfig {
    #[serde(default = "default_radius")]
    pub radius_km: f64,
}

fn default_radius() -> f64 {
    3.0
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self { radius_km: default_radius() }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
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
    /// Read the TOML file (a missing file means all defaults), fill gaps from
    /// the process environment, then validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                _ => return Err(e),
            },
        };
        cfg.normalize_and_validate(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn normalize_and_validate<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize(&env)?;
        self.storage.normalize_from_env(&env);
        self.storage.validate()?;
        self.nearby.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = env("SERVER_HOST") {
            self.host = host;
        }
        // PORT is what container platforms inject
        if let Some(port) = env("PORT") {
            self.port = port.trim().parse::<u16>().map_err(|_| anyhow!("PORT is not a valid port: {port}"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Fill bucket/object/token from the environment when the TOML left them empty.
    pub fn normalize_from_env<F>(&mut self, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.bucket.trim().is_empty() {
            if let Some(bucket) = env("BUCKET_NAME") {
                self.bucket = bucket;
            }
        }
        if self.object.trim().is_empty() {
            if let Some(object) = env("FILE_NAME") {
                self.object = object;
            }
        }
        if self.access_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.access_token = env("GCS_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());
        }
        if let Some(backend) = env("STORAGE_BACKEND") {
            match backend.trim().to_ascii_lowercase().as_str() {
                "file" => self.backend = StorageBackend::File,
                "gcs" => self.backend = StorageBackend::Gcs,
                _ => {}
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.backend {
            StorageBackend::Gcs => {
                if self.bucket.trim().is_empty() {
                    return Err(anyhow!("storage.bucket is empty; set it in config.toml or BUCKET_NAME"));
                }
                if self.object.trim().is_empty() {
                    return Err(anyhow!("storage.object is empty; set it in config.toml or FILE_NAME"));
                }
                let lower = self.endpoint.to_lowercase();
                if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                    return Err(anyhow!("storage.endpoint must start with http:// or https://"));
                }
            }
            StorageBackend::File => {
                if self.path.trim().is_empty() {
                    return Err(anyhow!("storage.path is empty"));
                }
            }
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("storage.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl NearbyConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(anyhow!("nearby.radius_km must be a positive number"));
        }
        Ok(())
    }
}
