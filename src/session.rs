//! Interactive session: holds the last generated plan and runs one command
//! at a time against the planner, synthesizer, overlay and uploader.

use crate::api::{ContentPlanner, ImageSynthesizer};
use crate::init;
use crate::overlay::{CaptionOverlay, OverlayOutcome};
use crate::plan::{ContentPlan, SLIDE_COUNT};
use crate::sanitize::{sanitize_visual_prompt, textless_prompt};
use crate::upload::{UploadAutomator, collect_slide_images};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

const PREVIEW_PROMPT_CHARS: usize = 50;
const PREVIEW_DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate,
    Slide(u32),
    All,
    Post,
    Desc,
    Exit,
    Empty,
    InvalidSlide(String),
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let cmd = input.trim().to_uppercase();
        match cmd.as_str() {
            "" => Command::Empty,
            "GENERATE" => Command::Generate,
            "ALL" => Command::All,
            "POST" => Command::Post,
            "DESC" => Command::Desc,
            "EXIT" => Command::Exit,
            _ => match cmd.strip_prefix('#') {
                Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                    match digits.parse::<u32>() {
                        Ok(n) if (1..=SLIDE_COUNT).contains(&n) => Command::Slide(n),
                        _ => Command::InvalidSlide(cmd),
                    }
                }
                _ => Command::Unknown(cmd),
            },
        }
    }
}

pub const HELP: &str = "Commands:
  GENERATE - Create a new carousel plan (clears previous output files)
  #1-#5    - Generate the image for one slide
  ALL      - Generate images for all slides
  POST     - Hand the slides and caption over for posting
  DESC     - Show the post caption
  EXIT     - Quit";

/// A generated slide image and what happened to its caption.
#[derive(Debug)]
pub struct RenderedSlide {
    pub path: PathBuf,
    pub overlay: OverlayOutcome,
}

pub struct Session {
    planner: Arc<dyn ContentPlanner>,
    synthesizer: Arc<dyn ImageSynthesizer>,
    uploader: Arc<dyn UploadAutomator>,
    overlay: CaptionOverlay,
    output_dir: PathBuf,
    product_link: String,
    last_plan: Option<ContentPlan>,
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

impl Session {
    pub fn new(
        planner: Arc<dyn ContentPlanner>,
        synthesizer: Arc<dyn ImageSynthesizer>,
        uploader: Arc<dyn UploadAutomator>,
        overlay: CaptionOverlay,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            planner,
            synthesizer,
            uploader,
            overlay,
            output_dir: output_dir.into(),
            product_link: String::new(),
            last_plan: None,
        }
    }

    pub fn with_product_link(mut self, link: impl Into<String>) -> Self {
        self.product_link = link.into();
        self
    }

    pub fn last_plan(&self) -> Option<&ContentPlan> {
        self.last_plan.as_ref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn require_plan(&self) -> Result<&ContentPlan> {
        self.last_plan
            .as_ref()
            .context("No content generated yet. Type GENERATE first.")
    }

    /// Runs one command. Returns `false` when the session should end.
    /// Step failures are reported and the session carries on.
    pub async fn dispatch(&mut self, command: Command) -> bool {
        let result = match command {
            Command::Exit => return false,
            Command::Empty => Ok(()),
            Command::Generate => self.generate().await,
            Command::Slide(n) => self.render_slide(n).await.map(|_| ()),
            Command::All => {
                let done = self.render_all().await;
                logi(format!("Generated {} of {} slides.", done, SLIDE_COUNT));
                Ok(())
            }
            Command::Post => self.post().await,
            Command::Desc => match self.description() {
                Some(text) => {
                    println!("{text}");
                    Ok(())
                }
                None => Err(anyhow::anyhow!("No content generated yet. Type GENERATE first.")),
            },
            Command::InvalidSlide(_) => Err(anyhow::anyhow!(
                "Invalid slide number. Use #1 through #{}.",
                SLIDE_COUNT
            )),
            Command::Unknown(_) => Err(anyhow::anyhow!("Unknown command.")),
        };

        if let Err(e) = result {
            logw(format!("{e:#}"));
        }
        true
    }

    /// Asks the planner for a fresh plan. The previous plan survives a failure.
    pub async fn generate(&mut self) -> Result<()> {
        logi("Generating carousel plan...");
        let plan = self.planner.generate_plan().await?;

        match init::clean_workspace(&self.output_dir).await {
            Ok(removed) => logi(format!("Workspace cleaned ({} previous output entries removed).", removed)),
            Err(e) => logw(format!("Could not clean {}: {:#}", self.output_dir.display(), e)),
        }

        logok("Carousel plan ready.");
        for slide in &plan.slides {
            eprintln!(
                "  #{}: {} (Prompt: {})",
                slide.slide_number,
                slide.on_screen_caption,
                preview(&slide.prompt, PREVIEW_PROMPT_CHARS)
            );
        }
        eprintln!("  Description: {}", preview(&plan.post_description, PREVIEW_DESCRIPTION_CHARS));

        for warning in plan.lint(&self.product_link) {
            logw(format!("Plan check: {}", warning));
        }

        self.last_plan = Some(plan);
        Ok(())
    }

    /// Synthesizes slide `number` into the output folder and overlays its caption.
    pub async fn render_slide(&self, number: u32) -> Result<RenderedSlide> {
        let plan = self.require_plan()?;
        let slide = plan
            .slide(number)
            .with_context(|| format!("Slide #{} not found.", number))?;

        let clean = sanitize_visual_prompt(&slide.prompt, &slide.on_screen_caption);
        tracing::debug!("cleaned prompt for slide {}: {}", number, clean);
        let full_prompt = textless_prompt(&clean);

        if !self.output_dir.is_dir() {
            fs::create_dir_all(&self.output_dir)
                .await
                .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        }
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.output_dir.join(format!("slide_{}_{}.png", number, stamp));

        logi(format!("Generating image for slide #{}...", number));
        self.synthesizer
            .synthesize(&full_prompt, &path)
            .await
            .with_context(|| format!("Image generation failed for slide #{}", number))?;
        logok(format!("Raw image saved to: {}", path.display()));

        let overlay = self.overlay.clone();
        let target = path.clone();
        let caption = slide.on_screen_caption.clone();
        let outcome = tokio::task::spawn_blocking(move || overlay.overlay_file(&target, &caption))
            .await
            .context("caption overlay task panicked")?;

        match &outcome {
            OverlayOutcome::Applied(layout) => logok(format!(
                "Caption applied ({} line(s)): \"{}\"",
                layout.line_count(),
                slide.on_screen_caption
            )),
            OverlayOutcome::Skipped => logi("Slide has no caption; image left as generated."),
            OverlayOutcome::Failed(e) => logw(format!("Caption not applied, raw image kept: {}", e)),
        }

        Ok(RenderedSlide { path, overlay: outcome })
    }

    /// Renders slides 1..=5 in order; a failed slide does not stop the rest.
    pub async fn render_all(&self) -> usize {
        if let Err(e) = self.require_plan() {
            logw(format!("{e}"));
            return 0;
        }

        logi(format!("Generating all slides (1-{})...", SLIDE_COUNT));
        let mut done = 0;
        for number in 1..=SLIDE_COUNT {
            match self.render_slide(number).await {
                Ok(_) => done += 1,
                Err(e) => logw(format!("{e:#}")),
            }
        }
        done
    }

    /// Hands every slide image in the output folder to the uploader.
    pub async fn post(&self) -> Result<()> {
        let plan = self.require_plan()?;
        let images = collect_slide_images(&self.output_dir)?;
        if images.is_empty() {
            anyhow::bail!(
                "No images found in {}. Generate images first.",
                self.output_dir.display()
            );
        }

        logi(format!("Posting {} images...", images.len()));
        self.uploader.upload(&images, &plan.post_caption()).await?;
        logi("Job complete. Files will be cleared on next GENERATE.");
        Ok(())
    }

    pub fn description(&self) -> Option<String> {
        self.last_plan.as_ref().map(ContentPlan::post_caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(Command::parse("generate"), Command::Generate);
        assert_eq!(Command::parse("  All "), Command::All);
        assert_eq!(Command::parse("post"), Command::Post);
        assert_eq!(Command::parse("Desc"), Command::Desc);
        assert_eq!(Command::parse("exit"), Command::Exit);
        assert_eq!(Command::parse(""), Command::Empty);
    }

    #[test]
    fn parses_slide_numbers() {
        assert_eq!(Command::parse("#1"), Command::Slide(1));
        assert_eq!(Command::parse("#5"), Command::Slide(5));
        assert_eq!(Command::parse("#0"), Command::InvalidSlide("#0".to_string()));
        assert_eq!(Command::parse("#6"), Command::InvalidSlide("#6".to_string()));
        assert_eq!(
            Command::parse("#99999999999999999999"),
            Command::InvalidSlide("#99999999999999999999".to_string())
        );
        assert_eq!(Command::parse("#x"), Command::Unknown("#X".to_string()));
        assert_eq!(Command::parse("#"), Command::Unknown("#".to_string()));
        assert_eq!(Command::parse("hello"), Command::Unknown("HELLO".to_string()));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}
