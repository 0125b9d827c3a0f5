use anyhow::{Result, bail};
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

pub async fn ensure_directories(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir).await?;
        eprintln!("[INFO] Created directory: {}", output_dir.display());
    }
    Ok(())
}

/// Removes everything inside `dir`, keeping the directory itself.
/// Returns the number of entries removed. A missing directory counts as clean;
/// entries that cannot be listed or deleted are logged and skipped.
pub async fn clean_workspace(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("failed to list {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let result = if entry.file_type().is_dir() {
            fs::remove_dir(path).await
        } else {
            fs::remove_file(path).await
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("failed to delete {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clean_removes_files_and_subdirs_but_keeps_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("slide_1_x.png"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/inner.txt"), b"b").unwrap();

        let removed = clean_workspace(dir.path()).await.unwrap();
        assert_eq!(removed, 3);
        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn clean_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clean_workspace(&dir.path().join("absent")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clean_refuses_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("output");
        std::fs::write(&file, b"not a folder").unwrap();

        assert!(clean_workspace(&file).await.is_err());
        assert_eq!(std::fs::read(&file).unwrap(), b"not a folder");
    }

    #[tokio::test]
    async fn ensure_creates_nested_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/b/output");
        ensure_directories(&out).await.unwrap();
        assert!(out.is_dir());
    }
}
