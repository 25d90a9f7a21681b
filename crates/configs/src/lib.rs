use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per collection.
    pub data_dir: String,
    /// Skip disk persistence entirely; collections live in memory only.
    #[serde(default)]
    pub ephemeral: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: "data".into(), ephemeral: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Seed the demo users and service requests on startup.
    #[serde(default = "default_seed")]
    pub seed: bool,
    /// Password assigned to seeded demo accounts.
    #[serde(default = "default_demo_password")]
    pub password: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { seed: default_seed(), password: default_demo_password() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// When set, logins are issued a signed session token.
    #[serde(default)]
    pub token_secret: Option<String>,
}

fn default_seed() -> bool { true }
fn default_demo_password() -> String { "demo1234".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "servicehub.toml".to_string());
    if !std::path::Path::new(&path).exists() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.storage.normalize_from_env();
        self.storage.validate()?;
        self.demo.normalize_from_env();
        self.demo.validate()?;
        self.auth.normalize_from_env();
        Ok(())
    }
}

impl StorageConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var("SERVICEHUB_DATA_DIR") {
            self.data_dir = dir;
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.ephemeral && self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir is empty; set it or enable storage.ephemeral"));
        }
        Ok(())
    }
}

impl DemoConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(seed) = std::env::var("SERVICEHUB_DEMO_SEED") {
            self.seed = matches!(seed.as_str(), "1" | "true" | "yes");
        }
    }

    fn validate(&self) -> Result<()> {
        if self.seed && self.password.len() < 6 {
            return Err(anyhow!("demo.password must be at least 6 characters"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(secret) = std::env::var("SERVICEHUB_AUTH_SECRET") {
            if !secret.trim().is_empty() {
                self.token_secret = Some(secret);
            }
        }
    }
}
