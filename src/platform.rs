use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

fn file_manager() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Opens `path` in the desktop file manager without waiting for it.
pub fn reveal_in_file_manager(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("empty path");
    }
    let program = file_manager();
    Command::new(program)
        .arg(path)
        .spawn()
        .with_context(|| format!("failed to launch {program}"))?;
    Ok(())
}
