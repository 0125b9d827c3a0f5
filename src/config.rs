use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "openai_api_key")]
    #[serde(default)]
    pub openai_key: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
    #[serde(default = "default_image_quality")]
    pub image_quality: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_font_file")]
    pub font_file: PathBuf,
    #[serde(default = "default_true")]
    pub search_system_fonts: bool,
    #[serde(default = "default_product_name")]
    pub product_name: String,
    #[serde(default)]
    pub product_link: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    #[serde(default = "default_true")]
    pub reveal_output_folder: bool,
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1792".to_string()
}

fn default_image_quality() -> String {
    "standard".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_font_file() -> PathBuf {
    PathBuf::from("arial.ttf")
}

fn default_product_name() -> String {
    "30 Day AI Mastery".to_string()
}

fn default_upload_url() -> String {
    "https://www.tiktok.com/upload?lang=en".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Parse a config document; absent fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("config.json is not valid JSON")
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let mut config = Self::from_json_str(&content)?;

        if config.openai_key.is_empty() {
            config.openai_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        }
        if config.openai_key.is_empty() {
            anyhow::bail!("config.json: openai_api_key missing (and OPENAI_API_KEY not set)");
        }

        Ok(config)
    }
}
