//! Prompt cleanup before image generation.
//!
//! Removal is best-effort: it drops verbatim copies of the caption and a few
//! "render this text" phrasings, nothing smarter.

use regex::RegexBuilder;

const TEXT_CUE_PHRASES: &[&str] = &["text saying", "caption:", "words:"];

/// Strips the caption (case-insensitive) and text cues out of a visual prompt.
pub fn sanitize_visual_prompt(prompt: &str, caption: &str) -> String {
    let mut clean = prompt.to_string();

    if !caption.trim().is_empty() {
        match RegexBuilder::new(&regex::escape(caption.trim()))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => clean = re.replace_all(&clean, "").into_owned(),
            Err(e) => tracing::debug!("caption pattern rejected, leaving prompt as-is: {e}"),
        }

        for phrase in TEXT_CUE_PHRASES {
            clean = clean.replace(phrase, "");
        }
    }

    clean.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Wraps a cleaned visual prompt in the "no lettering" instruction.
pub fn textless_prompt(clean_visual_prompt: &str) -> String {
    format!(
        "I NEED A TEXTLESS IMAGE. {}. Do not render any text, numbers, or letters. Purely visual composition.",
        clean_visual_prompt.trim_end_matches('.')
    )
}
