use ai_carousel_posts::overlay::{
    CaptionOverlay, FALLBACK_FONT_SIZE, Face, LineLayout, OverlayOutcome, PANEL_COLOR, TEXT_COLOR,
    render_with_face,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::path::Path;

fn solid(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([40, 80, 120])))
}

fn write_png(path: &Path, w: u32, h: u32) {
    solid(w, h).save_with_format(path, ImageFormat::Png).unwrap();
}

fn block_height_matches(layout: &LineLayout) -> bool {
    let sum: u32 = layout.lines.iter().map(|l| l.height).sum();
    let n = layout.lines.len() as u32;
    layout.block.height == sum + 10 * (n - 1) && layout.panel.height == layout.block.height + 4
}

#[test]
fn dimensions_are_preserved() {
    let overlay = CaptionOverlay::builtin_only();
    for (w, h) in [(1024, 1792), (300, 200), (64, 64), (20, 900)] {
        let mut img = solid(w, h);
        let _ = overlay.render(&mut img, "Stop scrolling. Start building. Link in bio");
        assert_eq!((img.width(), img.height()), (w, h));
    }
}

#[test]
fn empty_caption_file_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide_1_x.png");
    write_png(&path, 120, 200);
    let before = std::fs::read(&path).unwrap();

    let outcome = CaptionOverlay::builtin_only().overlay_file(&path, "");
    assert!(matches!(outcome, OverlayOutcome::Skipped));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn block_height_for_one_two_and_four_lines() {
    let face = Face::builtin(FALLBACK_FONT_SIZE);
    let long_word = "a".repeat(30);
    let four = vec![long_word.as_str(); 4].join(" ");
    let cases = [
        ("Hello world", 1usize),
        ("one two three four five six seven eight nine ten", 2),
        (four.as_str(), 4),
    ];

    for (caption, expected_lines) in cases {
        let layout = LineLayout::compute(&face, caption, 400, 800).unwrap();
        assert_eq!(layout.line_count(), expected_lines, "caption {caption:?}");
        assert!(block_height_matches(&layout), "caption {caption:?}: {layout:?}");
        assert_eq!(layout.block.height, 20 * expected_lines as u32 + 10 * (expected_lines as u32 - 1));
    }
}

#[test]
fn panel_is_horizontally_centered() {
    let captions = [
        "Hi",
        "Link in bio",
        "Stop scrolling. Start building.",
        "I automated my morning workflow and it changed everything about how I work",
        "Thirty days. One new skill per day. Real projects you can ship. Link in bio",
        "odd",
    ];
    let overlay = CaptionOverlay::builtin_only();
    for width in [400u32, 401, 1024] {
        for caption in captions {
            let mut img = solid(width, 600);
            let layout = overlay.render(&mut img, caption).unwrap();
            let center = layout.panel.center_x();
            assert!(
                (center - width as f32 / 2.0).abs() <= 1.0,
                "caption {caption:?} width {width}: center {center}"
            );
        }
    }
}

#[test]
fn panel_is_vertically_anchored_at_three_quarters() {
    let overlay = CaptionOverlay::builtin_only();
    for height in [600u32, 601, 1792, 333] {
        let mut img = solid(400, height);
        let layout = overlay
            .render(&mut img, "one two three four five six seven eight nine ten")
            .unwrap();
        let mid = layout.panel.center_y();
        assert!(
            (mid - 0.75 * height as f32).abs() <= 1.0,
            "height {height}: midpoint {mid}"
        );
    }
}

#[test]
fn missing_font_still_draws_panel_and_text() {
    let overlay = CaptionOverlay::new(Some("/definitely/not/here/arial.ttf".into()), false);
    let mut img = solid(400, 400);
    let layout = overlay.render(&mut img, "Hello there").unwrap();

    assert_eq!(layout.font_size, FALLBACK_FONT_SIZE);
    assert!(layout.lines.iter().all(|l| l.height == 20));

    let p = layout.panel;
    assert_eq!(img.get_pixel(p.x as u32, p.y as u32), PANEL_COLOR);
    assert_eq!(img.get_pixel((p.right() - 1) as u32, (p.bottom() - 1) as u32), PANEL_COLOR);

    let b = layout.block;
    let inked = (b.y..b.bottom())
        .flat_map(|y| (b.x..b.right()).map(move |x| (x as u32, y as u32)))
        .filter(|&(x, y)| img.get_pixel(x, y) == TEXT_COLOR)
        .count();
    assert!(inked > 0);
}

#[test]
fn reference_scenario_1024_by_1792() {
    let caption = "Stop scrolling. Start building. Link in bio";
    let face = Face::builtin(51.0);
    let mut img = solid(1024, 1792);
    let layout = render_with_face(&mut img, caption, &face).unwrap();

    assert!((2..=3).contains(&layout.line_count()));
    assert!(layout.panel.width <= 1024);
    let expected_top = (0.75 * 1792.0) as i32 - (layout.block.height / 2) as i32;
    assert_eq!(layout.block.y, expected_top);
    assert_eq!(layout.panel.y, expected_top - 2);
    assert_eq!((img.width(), img.height()), (1024, 1792));
}

#[test]
fn file_overlay_keeps_format_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide_2_x.png");
    write_png(&path, 300, 500);

    let outcome = CaptionOverlay::builtin_only().overlay_file(&path, "Caption on disk");
    let OverlayOutcome::Applied(layout) = &outcome else {
        panic!("overlay not applied: {outcome:?}");
    };

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    let reloaded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((reloaded.width(), reloaded.height()), (300, 500));
    let p = layout.panel;
    assert_eq!(reloaded.get_pixel(p.x as u32, p.y as u32), PANEL_COLOR);
    // nothing but the slide itself left in the folder
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn jpeg_stays_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide_3_x.jpg");
    solid(200, 300).save_with_format(&path, ImageFormat::Jpeg).unwrap();

    let outcome = CaptionOverlay::builtin_only().overlay_file(&path, "Jpeg caption");
    assert!(outcome.is_applied(), "{outcome:?}");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
}

#[test]
fn undecodable_file_is_reported_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide_4_x.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
    let before = std::fs::read(&path).unwrap();

    let outcome = CaptionOverlay::builtin_only().overlay_file(&path, "Never drawn");
    assert!(outcome.is_failed());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = CaptionOverlay::builtin_only().overlay_file(&dir.path().join("gone.png"), "x");
    assert!(outcome.is_failed());
}

#[test]
fn second_overlay_draws_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slide_5_x.png");
    write_png(&path, 300, 500);
    let overlay = CaptionOverlay::builtin_only();

    assert!(overlay.overlay_file(&path, "First caption").is_applied());
    let once = std::fs::read(&path).unwrap();
    assert!(overlay.overlay_file(&path, "A different and much longer caption").is_applied());
    assert_ne!(std::fs::read(&path).unwrap(), once);
}

fn fixture_font() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}

fn ttf_overlay() -> CaptionOverlay {
    CaptionOverlay::new(Some(fixture_font()), false)
}

#[test]
fn ttf_face_is_sized_from_width() {
    let overlay = ttf_overlay();
    let face = overlay.face_for(1024);
    assert!(!face.is_builtin());
    assert_eq!(face.size(), 51.0);
    assert!(!overlay.face_for(300).is_builtin());
}

#[test]
fn ttf_reference_scenario_geometry() {
    let caption = "Stop scrolling. Start building. Link in bio";
    let mut img = solid(1024, 1792);
    let layout = ttf_overlay().render(&mut img, caption).unwrap();

    assert_eq!(layout.font_size, 51.0);
    assert!((2..=3).contains(&layout.line_count()), "{layout:?}");
    assert!(layout.lines.iter().all(|l| l.height > 0 && l.width <= 1024));
    assert!(block_height_matches(&layout), "{layout:?}");
    assert!((layout.panel.center_x() - 512.0).abs() <= 1.0, "{layout:?}");
    assert!((layout.panel.center_y() - 1344.0).abs() <= 1.0, "{layout:?}");
    assert_eq!((img.width(), img.height()), (1024, 1792));
}

#[test]
fn ttf_text_stays_inside_the_panel() {
    let mut img = solid(1024, 1792);
    let layout = ttf_overlay()
        .render(&mut img, "Stop scrolling. Start building. Link in bio")
        .unwrap();
    let p = layout.panel;

    let background_sum = 40 + 80 + 120;
    let leaked = img
        .pixels()
        .filter(|&(x, y, _)| {
            let (x, y) = (x as i32, y as i32);
            x < p.x || x >= p.right() || y < p.y || y >= p.bottom()
        })
        .filter(|(_, _, px)| {
            let sum: u32 = px.0[..3].iter().map(|&c| c as u32).sum();
            sum + 30 < background_sum
        })
        .count();
    assert_eq!(leaked, 0);

    let inked = (p.y..p.bottom())
        .flat_map(|y| (p.x..p.right()).map(move |x| (x as u32, y as u32)))
        .filter(|&(x, y)| img.get_pixel(x, y) == TEXT_COLOR)
        .count();
    assert!(inked > 0);
}

#[test]
fn ttf_multi_line_blocks_sum_line_heights() {
    let overlay = ttf_overlay();
    for (w, h) in [(400u32, 800u32), (640, 1136), (1024, 1792)] {
        let mut img = solid(w, h);
        let layout = overlay
            .render(
                &mut img,
                "I automated my morning workflow and it changed everything about how I work. Link in bio",
            )
            .unwrap();
        assert!(layout.line_count() >= 2, "{w}x{h}: {layout:?}");
        assert!(block_height_matches(&layout), "{w}x{h}: {layout:?}");
        assert!((layout.panel.center_x() - w as f32 / 2.0).abs() <= 1.0, "{w}x{h}: {layout:?}");
    }
}
