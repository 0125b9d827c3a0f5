//! Hosted collaborators: the content planner and the image synthesizer.

pub mod openai;

use crate::plan::ContentPlan;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ContentPlanner: Send + Sync {
    async fn generate_plan(&self) -> Result<ContentPlan>;
}

#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Generates an image for `prompt` and stores it at `dest`.
    async fn synthesize(&self, prompt: &str, dest: &Path) -> Result<()>;
}
