use anyhow::{Result, anyhow};

use crate::config::Config;
use crate::providers::{GeminiProvider, ImagenProvider, OpenAIProvider};
use crate::traits::{ImageProvider, Provider};

pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or("gemini");

    match provider_name.to_lowercase().as_str() {
        "gemini" => {
            let api_key = resolve_api_key_with_fallback(
                &["GEMINI_API_KEY", "GOOGLE_API_KEY", "RAFIQ_GEMINI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = GeminiProvider::new(api_key);
            provider = provider.with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "RAFIQ_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key);
            provider = provider.with_model(config.model.clone());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: gemini, openai",
            provider_name
        )),
    }
}

pub fn create_image_provider(config: &Config) -> Result<Box<dyn ImageProvider>> {
    let api_key = resolve_api_key_with_fallback(
        &["GEMINI_API_KEY", "GOOGLE_API_KEY", "RAFIQ_GEMINI_API_KEY"],
        &config.api_key,
    )?;
    let mut provider = ImagenProvider::new(api_key);
    provider = provider.with_model(config.image_model.clone());
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Ok(Box::new(provider))
}

pub fn resolve_exa_api_key(config: &Config) -> Result<String> {
    resolve_api_key_with_fallback(
        &["EXA_API_KEY", "RAFIQ_EXA_API_KEY"],
        &config.exa_api_key,
    )
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = resolve_api_key_from_env(var_name) {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!("No API key found"))
    }
}

fn resolve_api_key_from_env(var_name: &str) -> Result<String> {
    std::env::var(var_name).map_err(|_| anyhow!("Environment variable {} not set", var_name))
}
