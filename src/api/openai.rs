use super::{ContentPlanner, ImageSynthesizer};
use crate::config::Config;
use crate::plan::{CALL_TO_ACTION, ContentPlan, SLIDE_COUNT};
use crate::{logi, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const IMAGE_GENERATIONS_URL: &str = "https://api.openai.com/v1/images/generations";
const RAW_SNIPPET_CHARS: usize = 800;

pub struct OpenAiClient {
    client: Client,
    cfg: Config,
}

impl OpenAiClient {
    pub fn new(cfg: Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, cfg })
    }

    pub fn with_client(client: Client, cfg: Config) -> Self {
        Self { client, cfg }
    }
}

fn planner_system_prompt(cfg: &Config) -> String {
    let link_rule = if cfg.product_link.is_empty() {
        String::new()
    } else {
        format!("- The post description must include this link: {}\n", cfg.product_link)
    };
    format!(
        "You write vertical (9:16) carousel posts promoting the digital product \"{product}\".\n\
         Reply with a single JSON object and nothing else, shaped as:\n\
         {{\"images\":[{{\"slide_number\":1,\"prompt\":\"\",\"on_screen_caption\":\"\"}}],\"post_description\":\"\",\"hashtags\":[]}}\n\
         Rules:\n\
         - Exactly {count} slides, numbered 1 to {count}, each from a different angle: struggle, realization, progression, workflow shift, product reveal.\n\
         - prompt: a realistic, grounded scene for an image generator describing only physical objects, lighting and setting, \
         with empty space in the lower half of the frame. Never describe words, signs or captions.\n\
         - on_screen_caption: the complete on-image text for the slide, one or two short conversational lines.\n\
         - The last caption ends with \"{cta}\" after at least one sentence.\n\
         - post_description: two short paragraphs about learning, building and automating.\n\
         {link_rule}\
         - hashtags: 8 to 14 varied tags on AI, productivity, building, the creator economy and learning.\n\
         - Use fresh wording every time.",
        product = cfg.product_name,
        count = SLIDE_COUNT,
        cta = CALL_TO_ACTION,
        link_rule = link_rule,
    )
}

fn raw_snippet(raw: &str) -> String {
    raw.chars().take(RAW_SNIPPET_CHARS).collect()
}

/// Logs the API `error` object, if present, and returns its message.
fn openai_error_message(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;
    let err = root.get("error")?;

    if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
        logw(format!("OpenAI error type: {}", typ));
    }
    if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
        logw(format!("OpenAI error code: {}", code));
    }
    let msg = err
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown error")
        .to_string();
    logw(format!("OpenAI error message: {}", msg));
    Some(msg)
}

fn extract_chat_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;
    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn extract_image_url(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;
    root.get("data")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

/// Turns a non-success or unparseable response into an error, logging the body.
fn response_failure(what: &str, status: reqwest::StatusCode, raw: &str) -> anyhow::Error {
    logw(format!("OpenAI {} HTTP {}", what, status.as_u16()));
    let msg = openai_error_message(raw);
    if msg.is_none() && !raw.is_empty() {
        tracing::debug!("OpenAI raw body: {}", raw_snippet(raw));
    }
    anyhow::anyhow!(
        "OpenAI {} failed (HTTP {}): {}",
        what,
        status.as_u16(),
        msg.unwrap_or_else(|| "unexpected response".to_string())
    )
}

#[async_trait]
impl ContentPlanner for OpenAiClient {
    async fn generate_plan(&self) -> Result<ContentPlan> {
        let body = json!({
            "model": self.cfg.chat_model,
            "messages": [
                {"role": "system", "content": planner_system_prompt(&self.cfg)},
                {"role": "user", "content": "GENERATE"},
            ],
            "response_format": {"type": "json_object"},
        });

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.cfg.openai_key)
            .json(&body)
            .timeout(Duration::from_secs(300))
            .send()
            .await
            .context("OpenAI chat request failed")?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(response_failure("chat", status, &raw));
        }

        let Some(content) = extract_chat_content(&raw) else {
            return Err(response_failure("chat", status, &raw));
        };

        let plan = ContentPlan::from_json(&content).inspect_err(|_| {
            logw(format!("Model reply was not a plan: {}", raw_snippet(&content)));
        })?;
        logi(format!("OpenAI plan received: {} slides", plan.slides.len()));
        Ok(plan)
    }
}

#[async_trait]
impl ImageSynthesizer for OpenAiClient {
    async fn synthesize(&self, prompt: &str, dest: &Path) -> Result<()> {
        let body = json!({
            "model": self.cfg.image_model,
            "prompt": prompt,
            "size": self.cfg.image_size,
            "quality": self.cfg.image_quality,
            "n": 1,
        });

        let resp = self
            .client
            .post(IMAGE_GENERATIONS_URL)
            .bearer_auth(&self.cfg.openai_key)
            .json(&body)
            .timeout(Duration::from_secs(300))
            .send()
            .await
            .context("OpenAI image request failed")?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(response_failure("image", status, &raw));
        }
        let Some(url) = extract_image_url(&raw) else {
            return Err(response_failure("image", status, &raw));
        };

        let download = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .context("Image download failed")?;
        if !download.status().is_success() {
            anyhow::bail!("Image download failed HTTP {}", download.status().as_u16());
        }
        let bytes = download.bytes().await.context("Image download read failed")?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
        fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        Ok(())
    }
}
