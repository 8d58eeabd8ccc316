use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use nutrisnap::source::{CaptureMode, Prompt, TerminalPermissions, TerminalPicker};
use nutrisnap::{AcquireOutcome, Advisory, Screen, SnapConfig, SnapSession};

/// Snap a photo of your meal and get its nutrition facts.
///
/// There is no camera in a terminal: both "take photo" and "upload from
/// gallery" ask for the path of an image on disk.
#[derive(Parser, Debug)]
#[command(name = "nutrisnap")]
#[command(about = "Snap a meal, get its nutrition facts")]
#[command(version)]
struct Args {
    /// Analysis endpoint (overrides NUTRISNAP_API_URL)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Give up on an analysis request after this many seconds
    #[arg(long, value_name = "SECS", help = "Request timeout in seconds (default: none)")]
    timeout: Option<u64>,

    /// JPEG quality of the cropped photo
    #[arg(long, value_name = "0..1", help = "JPEG quality of the edited photo (default: 0.8)")]
    quality: Option<f32>,

    /// Send photos as they are, without cropping
    #[arg(long)]
    no_edit: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose {
        "nutrisnap=debug"
    } else {
        "nutrisnap=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    info!(endpoint = %config.endpoint, editing = config.picker.allows_editing, "starting");

    let prompt = Prompt::stdio();
    let session = SnapSession::builder()
        .with_config(config)
        .with_permissions(TerminalPermissions::new(prompt.clone()))
        .with_picker(TerminalPicker::new(prompt.clone()))
        .build()?;
    let advisories = session
        .advisories()
        .ok_or_else(|| anyhow!("advisory stream already taken"))?;

    run(session, prompt, advisories).await
}

/// Environment first, then flags.
fn build_config(args: &Args) -> Result<SnapConfig> {
    let mut config = SnapConfig::default()
        .with_env_overrides()
        .map_err(anyhow::Error::msg)?;

    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(secs) = args.timeout {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(quality) = args.quality {
        config.picker.quality = quality;
    }
    if args.no_edit {
        config.picker.allows_editing = false;
    }

    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

async fn run(
    session: SnapSession,
    prompt: Prompt,
    mut advisories: UnboundedReceiver<Advisory>,
) -> Result<()> {
    let mut states = session.subscribe();

    loop {
        let screen = Screen::from_state(&states.borrow_and_update());
        let analyzing = matches!(screen, Screen::Analyzing { .. });
        prompt.say(&format!("\n{}\n> ", screen)).await?;

        // While analyzing, a finished request redraws the screen without
        // waiting for input.
        let line = tokio::select! {
            line = prompt.next_line() => line?,
            changed = states.changed(), if analyzing => {
                changed?;
                show_advisories(&prompt, &mut advisories).await?;
                continue;
            }
        };
        let Some(line) = line else {
            break;
        };

        match (line.trim(), &screen) {
            ("q", _) => break,
            ("c", Screen::Capture) => start(&session, CaptureMode::Camera).await,
            ("g", Screen::Capture) => start(&session, CaptureMode::Gallery).await,
            ("b", Screen::Analyzing { .. } | Screen::Results(_)) => session.reset(),
            ("", _) => {}
            (other, _) => {
                prompt
                    .say(&format!("'{}' is not available on this screen\n", other))
                    .await?
            }
        }

        show_advisories(&prompt, &mut advisories).await?;
    }

    info!("bye");
    Ok(())
}

/// Pick a photo, then analyze it on a background task so `b` stays usable.
async fn start(session: &SnapSession, mode: CaptureMode) {
    match session.acquire(mode).await {
        AcquireOutcome::Started(ticket) => {
            let session = session.clone();
            tokio::spawn(async move {
                let outcome = session.analyze(ticket).await;
                debug!(?outcome, "analysis task finished");
            });
        }
        other => debug!(?other, %mode, "no analysis started"),
    }
}

async fn show_advisories(
    prompt: &Prompt,
    advisories: &mut UnboundedReceiver<Advisory>,
) -> Result<()> {
    while let Ok(advisory) = advisories.try_recv() {
        debug!(category = advisory.category, detail = %advisory.detail, "showing advisory");
        prompt.say(&format!("\n! {}\n", advisory.message())).await?;
        if let Some(suggestion) = &advisory.suggestion {
            prompt.say(&format!("  {}\n", suggestion)).await?;
        }
        if advisory.is_blocking() {
            prompt.ask("Press Enter to continue ").await?;
        }
    }
    Ok(())
}
