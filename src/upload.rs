//! Upload hand-off. Posting happens in the platform's web UI; this side only
//! prepares the ordered files and the caption for the operator.

use crate::platform;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[async_trait]
pub trait UploadAutomator: Send + Sync {
    async fn upload(&self, images: &[PathBuf], caption: &str) -> Result<()>;
}

/// Line reader over the operator's terminal. The shell and the upload
/// confirmation share one buffer so typed-ahead input is never split between them.
pub type OperatorInput = Arc<Mutex<Lines<Box<dyn AsyncBufRead + Send + Unpin>>>>;

pub fn operator_input<R>(reader: R) -> OperatorInput
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let boxed: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
    Arc::new(Mutex::new(boxed.lines()))
}

pub fn stdin_input() -> OperatorInput {
    operator_input(BufReader::new(tokio::io::stdin()))
}

fn slide_name_regex() -> Result<&'static Regex> {
    static SLIDE_RE: OnceCell<Regex> = OnceCell::new();
    SLIDE_RE.get_or_try_init(|| Regex::new(r"slide_(\d+)").context("failed to compile slide name regex"))
}

/// Slide number from a `slide_<N>_...` file name.
pub fn slide_number_of(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let re = slide_name_regex().ok()?;
    re.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Image files in `dir`, slide-numbered ones first in slide order, the rest by name.
pub fn collect_slide_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let is_image = path.is_file()
            && path
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
                .unwrap_or(false);
        if is_image {
            images.push(path);
        }
    }

    images.sort_by(|a, b| {
        let ka = (slide_number_of(a).unwrap_or(u32::MAX), a.file_name());
        let kb = (slide_number_of(b).unwrap_or(u32::MAX), b.file_name());
        ka.cmp(&kb)
    });
    Ok(images)
}

/// Prints what to upload and waits for the operator to finish in the browser.
pub struct ManualUpload {
    pub upload_url: String,
    pub reveal_folder: Option<PathBuf>,
    pub input: OperatorInput,
}

#[async_trait]
impl UploadAutomator for ManualUpload {
    async fn upload(&self, images: &[PathBuf], caption: &str) -> Result<()> {
        logi(format!("Open the upload page: {}", self.upload_url));
        logi(format!("Add these {} images in order:", images.len()));
        for (i, image) in images.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, image.display());
        }
        logi("Post caption:");
        eprintln!("{caption}");

        if let Some(folder) = &self.reveal_folder {
            if let Err(e) = platform::reveal_in_file_manager(folder) {
                logw(format!("Could not open {}: {}", folder.display(), e));
            }
        }

        logi("Press Enter here once the post is published...");
        let confirmation = self
            .input
            .lock()
            .await
            .next_line()
            .await
            .context("Failed to read confirmation")?;
        if confirmation.is_none() {
            logw("Input closed before confirmation.");
        }
        logok("Upload hand-off complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slide_numbers() {
        assert_eq!(slide_number_of(Path::new("out/slide_3_20260101_120000.png")), Some(3));
        assert_eq!(slide_number_of(Path::new("slide_12_x.jpg")), Some(12));
        assert_eq!(slide_number_of(Path::new("cover.png")), None);
    }

    #[test]
    fn collects_images_in_slide_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "slide_10_a.png",
            "slide_2_a.JPG",
            "zeta.png",
            "slide_1_b.jpeg",
            "alpha.png",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("slide_0_dir.png")).unwrap();

        let names: Vec<String> = collect_slide_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["slide_1_b.jpeg", "slide_2_a.JPG", "slide_10_a.png", "alpha.png", "zeta.png"]
        );
    }

    #[tokio::test]
    async fn confirmation_takes_one_line_from_shared_input() {
        let input = operator_input(&b"\nGENERATE\n#2\n"[..]);
        let upload = ManualUpload {
            upload_url: "https://upload.example".to_string(),
            reveal_folder: None,
            input: input.clone(),
        };

        upload.upload(&[PathBuf::from("slide_1_x.png")], "caption").await.unwrap();

        let mut lines = input.lock().await;
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("GENERATE"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("#2"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn closed_input_still_completes() {
        let upload = ManualUpload {
            upload_url: "https://upload.example".to_string(),
            reveal_folder: None,
            input: operator_input(&b""[..]),
        };
        upload.upload(&[], "caption").await.unwrap();
    }

    #[test]
    fn missing_dir_has_no_images() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_slide_images(&dir.path().join("nope")).unwrap().is_empty());
    }
}
