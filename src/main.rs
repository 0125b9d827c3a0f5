use ai_carousel_posts::api::openai::OpenAiClient;
use ai_carousel_posts::config::Config;
use ai_carousel_posts::init;
use ai_carousel_posts::overlay::CaptionOverlay;
use ai_carousel_posts::session::{Command, HELP, Session};
use ai_carousel_posts::upload::{ManualUpload, stdin_input};
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cfg = Config::load("config.json").await?;
    init::ensure_directories(&cfg.output_dir).await?;

    let input = stdin_input();
    let openai = Arc::new(OpenAiClient::new(cfg.clone())?);
    let uploader = Arc::new(ManualUpload {
        upload_url: cfg.upload_url.clone(),
        reveal_folder: cfg.reveal_output_folder.then(|| cfg.output_dir.clone()),
        input: input.clone(),
    });
    let mut session = Session::new(
        openai.clone(),
        openai,
        uploader,
        CaptionOverlay::from_config(&cfg),
        cfg.output_dir.clone(),
    )
    .with_product_link(cfg.product_link.clone());

    eprintln!("Carousel generator");
    eprintln!("{HELP}");

    loop {
        eprint!("\n> ");
        std::io::stderr().flush().ok();
        let Some(line) = input.lock().await.next_line().await? else {
            break;
        };
        if !session.dispatch(Command::parse(&line)).await {
            break;
        }
    }

    Ok(())
}
