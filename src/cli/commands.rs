//! Subcommand handlers.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use ascii_stream::ascii::FrameSequence;
use ascii_stream::config::{default_path as get_config_path, Config};
use ascii_stream::pipeline::{
    validate_source, ConvertOptions, Converter, FfmpegExtractor, FrameExtractor, WorkingVideo,
};
use ascii_stream::player;
use ascii_stream::resolver::ResolverClient;
use ascii_stream::server::{self, AppState, ShareClient};
use ascii_stream::stream::{StreamStore, DEFAULT_FRAME_RATE, DEFAULT_TITLE};

use super::args::{ConfigAction, ConvertArgs, ServeArgs};

/// Run the sharing server until Ctrl+C.
pub async fn run_serve(args: ServeArgs, config: &Config) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let base_url = args.base_url.unwrap_or_else(|| config.server.base_url.clone());

    let store = StreamStore::new(config.stream_ttl());
    let reaper = store.spawn_reaper(config.reap_interval());
    let resolver =
        ResolverClient::with_timeout(config.resolver.base_url.clone(), config.resolver_timeout())?;

    let state = AppState::new(store, resolver, &base_url);
    let app = server::router(state, config.body_limit_bytes());

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    log::info!("Share links use {}", base_url);

    server::serve(listener, app, shutdown_signal())
        .await
        .context("serving HTTP")?;

    reaper.shutdown().await.context("stopping stream reaper")?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Received Ctrl+C, shutting down...");
}

/// Convert a local file or resolved URL, then write, share and/or play it.
pub async fn run_convert(args: ConvertArgs, config: &Config) -> Result<()> {
    let extractor = Arc::new(FfmpegExtractor::new());
    let converter = Converter::new(extractor.clone(), config.pipeline_config());

    // keeps a downloaded working copy alive until conversion is done
    let (source, _working, source_title) = match (&args.input, &args.url) {
        (_, Some(url)) => {
            let resolver = ResolverClient::with_timeout(
                config.resolver.base_url.clone(),
                config.resolver_timeout(),
            )?;
            println!("Resolving {}...", url);
            let resolved = resolver
                .resolve_with_retry(url)
                .await
                .context("resolving video URL")?;

            let working = WorkingVideo::new("mp4")?;
            println!("Downloading {}...", display_title(&resolved.title));
            resolver
                .download(&resolved.download_url, working.path())
                .await
                .context("downloading video")?;
            validate_source(working.path())?;

            (working.path().to_path_buf(), Some(working), resolved.title)
        }
        (Some(input), None) => {
            validate_source(input)?;
            (input.clone(), None, title_from_path(input))
        }
        (None, None) => bail!("either an input file or --url is required"),
    };

    let frame_rate = match args.fps {
        Some(fps) => fps,
        None => detect_frame_rate(extractor, &source).await?,
    };

    let title = args
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| Some(source_title).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let options = ConvertOptions {
        target_width: args.width.unwrap_or(config.pipeline.width),
        frame_rate,
        detail: args.detail.map(Into::into).unwrap_or(config.pipeline.detail),
        max_frames: args.max_frames,
        title,
    };

    let cancel_token = CancellationToken::new();
    let stop = Arc::new(AtomicBool::new(false));
    let signal_task = {
        let cancel_token = cancel_token.clone();
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived Ctrl+C, stopping...");
                stop.store(true, Ordering::SeqCst);
                cancel_token.cancel();
            }
        })
    };

    let result = converter
        .convert_with_cancel(&source, &options, &cancel_token, |done| {
            eprint!("\rConverted {} frames", done);
            let _ = io::stderr().flush();
        })
        .await;
    eprintln!();
    let sequence = result?;

    println!(
        "Converted {} frames at {} fps ({} detail, {} columns)",
        sequence.len(),
        sequence.frame_rate,
        options.detail,
        options.target_width
    );

    let out = args.out.clone().or_else(|| {
        (args.share.is_none() && !args.play).then(|| default_out_path(args.input.as_deref()))
    });
    if let Some(out) = out {
        write_frames(&out, &sequence)?;
        println!("Wrote {}", out.display());
    }

    if let Some(server_url) = &args.share {
        share_sequence(server_url, &sequence).await?;
    }

    if args.play {
        let stop = Arc::clone(&stop);
        tokio::task::spawn_blocking(move || player::play(&sequence, 0, &stop))
            .await?
            .context("playing frames")?;
    }

    signal_task.abort();
    Ok(())
}

async fn detect_frame_rate(extractor: Arc<FfmpegExtractor>, source: &Path) -> Result<f64> {
    let path = source.to_path_buf();
    let detected = tokio::task::spawn_blocking(move || extractor.detect_frame_rate(&path)).await?;

    Ok(match detected {
        Ok(Some(rate)) => {
            log::info!("Detected source frame rate {:.3} fps", rate);
            rate
        }
        Ok(None) => {
            log::warn!("Could not detect frame rate, assuming {} fps", DEFAULT_FRAME_RATE);
            DEFAULT_FRAME_RATE
        }
        Err(e) => {
            log::warn!("Frame rate detection failed ({}), assuming {} fps", e, DEFAULT_FRAME_RATE);
            DEFAULT_FRAME_RATE
        }
    })
}

/// Upload a frames file to a server.
pub async fn run_share(file: &Path, server_url: Option<String>, config: &Config) -> Result<()> {
    let sequence = read_frames(file)?;
    let server_url = server_url.unwrap_or_else(|| config.server.base_url.clone());
    share_sequence(&server_url, &sequence).await
}

async fn share_sequence(server_url: &str, sequence: &FrameSequence) -> Result<()> {
    let client = ShareClient::new(server_url)?;
    println!("Sharing {} frames with {}...", sequence.len(), client.base_url());

    let shared = client
        .share(sequence)
        .await
        .with_context(|| format!("sharing with {}", client.base_url()))?;

    println!();
    println!("Stream ready: {}", shared.stream_id);
    println!("  Terminal: {} | bash", shared.terminal_url);
    println!("  Web:      {}{}", client.base_url(), shared.web_url);
    Ok(())
}

/// Play a frames file in this terminal until done or Ctrl+C.
pub fn run_play(file: &Path, loops: usize) -> Result<()> {
    let sequence = read_frames(file)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    let shown = player::play(&sequence, loops, &stop).context("playing frames")?;
    println!();
    log::info!("Played {} frames", shown);
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config: &Config, path: Option<&Path>) -> Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!();
            print!("{}", config.to_toml()?);
            println!();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found, using defaults)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                bail!(
                    "Config file already exists: {}\nUse 'ascii-stream config show' to view current settings.",
                    config_path.display()
                );
            }

            Config::default().save(&config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

fn read_frames(file: &Path) -> Result<FrameSequence> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading frames file {}", file.display()))?;
    let sequence = FrameSequence::from_json(&json)
        .with_context(|| format!("parsing frames file {}", file.display()))?;
    if sequence.is_empty() {
        bail!("frames file {} has no frames", file.display());
    }
    Ok(sequence)
}

fn write_frames(file: &Path, sequence: &FrameSequence) -> Result<()> {
    let json = sequence.to_json()?;
    std::fs::write(file, json).with_context(|| format!("writing frames file {}", file.display()))
}

fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        "video"
    } else {
        title
    }
}

/// `<stem>.ascii.json` in the current directory.
fn default_out_path(input: Option<&Path>) -> PathBuf {
    let stem = input
        .map(title_from_path)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "video".to_string());
    PathBuf::from(format!("{}.ascii.json", stem))
}
