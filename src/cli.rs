use ai_carousel_posts::overlay::{CaptionOverlay, OverlayOutcome};
use std::path::PathBuf;

const USAGE: &str = "usage: caption-overlay <image> <caption> [--font <file.ttf>] [--no-system-fonts]";

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let mut positional = Vec::new();
    let mut font = PathBuf::from("arial.ttf");
    let mut search_system_fonts = true;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--font" => match args.next() {
                Some(path) => font = PathBuf::from(path),
                None => {
                    eprintln!("{USAGE}");
                    std::process::exit(2);
                }
            },
            "--no-system-fonts" => search_system_fonts = false,
            "-h" | "--help" => {
                println!("{USAGE}");
                return;
            }
            _ => positional.push(arg),
        }
    }

    let [image, caption] = positional.as_slice() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let overlay = CaptionOverlay::new(Some(font), search_system_fonts);
    let code = match overlay.overlay_file(&PathBuf::from(image), caption) {
        OverlayOutcome::Applied(layout) => {
            eprintln!(
                "[OK] {} line(s) at {}px, panel {}x{} at ({}, {})",
                layout.line_count(),
                layout.font_size,
                layout.panel.width,
                layout.panel.height,
                layout.panel.x,
                layout.panel.y
            );
            0
        }
        OverlayOutcome::Skipped => {
            eprintln!("[INFO] empty caption, image unchanged");
            0
        }
        OverlayOutcome::Failed(e) => {
            eprintln!("[WARN] {e}");
            1
        }
    };
    std::process::exit(code);
}
