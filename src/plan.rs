use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const SLIDE_COUNT: u32 = 5;
pub const CALL_TO_ACTION: &str = "Link in bio";
const HASHTAG_RANGE: std::ops::RangeInclusive<usize> = 8..=14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub slide_number: u32,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub on_screen_caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    #[serde(rename = "images")]
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub post_description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Drops a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

impl ContentPlan {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(strip_code_fence(text)).with_context(|| "Failed to parse content plan JSON")
    }

    pub fn slide(&self, number: u32) -> Option<&Slide> {
        self.slides.iter().find(|s| s.slide_number == number)
    }

    /// Hashtags joined by spaces, each with a leading `#`.
    pub fn hashtag_line(&self) -> String {
        self.hashtags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| if t.starts_with('#') { t.to_string() } else { format!("#{t}") })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text pasted under the post: description, blank line, hashtags.
    pub fn post_caption(&self) -> String {
        let desc = self.post_description.trim();
        let tags = self.hashtag_line();
        match (desc.is_empty(), tags.is_empty()) {
            (_, true) => desc.to_string(),
            (true, false) => tags,
            (false, false) => format!("{desc}\n\n{tags}"),
        }
    }

    /// Soft checks against the plan format. Nothing here blocks generation.
    pub fn lint(&self, product_link: &str) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.slides.len() != SLIDE_COUNT as usize {
            warnings.push(format!("expected {} slides, got {}", SLIDE_COUNT, self.slides.len()));
        }
        let mut numbers: Vec<u32> = self.slides.iter().map(|s| s.slide_number).collect();
        numbers.sort_unstable();
        if numbers != (1..=SLIDE_COUNT).collect::<Vec<_>>() {
            warnings.push(format!("slide numbers are {:?}, expected 1..={}", numbers, SLIDE_COUNT));
        }

        for slide in &self.slides {
            if slide.prompt.trim().is_empty() {
                warnings.push(format!("slide #{} has an empty prompt", slide.slide_number));
            }
            if slide.on_screen_caption.trim().is_empty() {
                warnings.push(format!("slide #{} has an empty caption", slide.slide_number));
            }
        }

        if let Some(last) = self.slide(SLIDE_COUNT) {
            let caption = last.on_screen_caption.trim().trim_end_matches(['.', '!']);
            let lower = caption.to_lowercase();
            let cta = CALL_TO_ACTION.to_lowercase();
            if !lower.ends_with(&cta) {
                warnings.push(format!("slide #{} caption does not end with \"{}\"", SLIDE_COUNT, CALL_TO_ACTION));
            } else if lower == cta {
                warnings.push(format!("slide #{} caption is only \"{}\"", SLIDE_COUNT, CALL_TO_ACTION));
            }
        }

        let tag_count = self.hashtags.iter().filter(|t| !t.trim().is_empty()).count();
        if !HASHTAG_RANGE.contains(&tag_count) {
            warnings.push(format!(
                "{} hashtags, expected {}-{}",
                tag_count,
                HASHTAG_RANGE.start(),
                HASHTAG_RANGE.end()
            ));
        }

        if !product_link.is_empty() && !self.post_description.contains(product_link) {
            warnings.push("post description is missing the product link".to_string());
        }

        warnings
    }
}
