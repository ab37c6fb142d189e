use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const RAFIQ_DIR: &str = ".rafiq";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub image_model: String,
    pub exa_api_key: String,
    #[serde(skip)]
    pub workspace_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            exa_api_key: String::new(),
            workspace_dir: get_rafiq_dir().join("workspace"),
        }
    }
}

pub fn get_rafiq_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(RAFIQ_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_rafiq_dir().join("config.toml")
}

pub fn ensure_rafiq_dir() -> Result<PathBuf> {
    let rafiq_dir = get_rafiq_dir();

    if !rafiq_dir.exists() {
        std::fs::create_dir_all(&rafiq_dir).with_context(|| {
            format!(
                "Failed to create rafiq directory at {}",
                rafiq_dir.display()
            )
        })?;
    }

    Ok(rafiq_dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("Config file not found at {}", config_path.display())
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.workspace_dir = get_rafiq_dir().join("workspace");

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_rafiq_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}
