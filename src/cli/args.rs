//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::Detail;

/// Convert video to ASCII art and share it as a terminal stream
#[derive(Parser, Debug)]
#[command(name = "ascii-stream")]
#[command(version, about = "Convert video to ASCII art and share it as a terminal stream", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the stream sharing server
    Serve(ServeArgs),
    /// Convert a video file or URL to ASCII frames
    Convert(ConvertArgs),
    /// Share a frames file through a running server
    Share {
        /// Frames file written by `convert --out`
        file: PathBuf,

        /// Server URL (default: server.base_url from config)
        #[arg(long, short)]
        server: Option<String>,
    },
    /// Play a frames file in this terminal
    Play {
        /// Frames file written by `convert --out`
        file: PathBuf,

        /// Number of passes (0 = until Ctrl+C)
        #[arg(long, short, default_value = "0")]
        loops: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    /// Address to listen on (default: server.bind from config)
    #[arg(long, short)]
    pub bind: Option<String>,

    /// Public URL used in share links
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ConvertArgs {
    /// Input video file
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    pub input: Option<PathBuf>,

    /// Video page URL to resolve and download instead of a local file
    #[arg(long)]
    pub url: Option<String>,

    /// Output width in columns
    #[arg(long, short, value_parser = parse_width)]
    pub width: Option<u32>,

    /// Source frame rate (default: probed with ffprobe)
    #[arg(long, value_parser = parse_fps)]
    pub fps: Option<f64>,

    /// Glyph detail level
    #[arg(long, short)]
    pub detail: Option<Detail>,

    /// Maximum number of frames to convert
    #[arg(long, value_parser = parse_max_frames)]
    pub max_frames: Option<usize>,

    /// Title shown when the stream plays
    #[arg(long, short)]
    pub title: Option<String>,

    /// Write the frames file here
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Share the result through the server at this URL
    #[arg(long)]
    pub share: Option<String>,

    /// Play the result in this terminal when done
    #[arg(long)]
    pub play: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Parse and validate output width (1-1000 columns)
fn parse_width(s: &str) -> Result<u32, String> {
    let width: u32 = s.parse().map_err(|_| format!("'{}' is not a valid width", s))?;
    if !(1..=1000).contains(&width) {
        return Err(format!("Width must be between 1 and 1000, got {}", width));
    }
    Ok(width)
}

/// Parse and validate frame cap (at least 1)
fn parse_max_frames(s: &str) -> Result<usize, String> {
    let frames: usize = s.parse().map_err(|_| format!("'{}' is not a valid frame count", s))?;
    if frames == 0 {
        return Err("Max frames must be at least 1".to_string());
    }
    Ok(frames)
}

/// Parse and validate frame rate (positive, at most 240)
fn parse_fps(s: &str) -> Result<f64, String> {
    let fps: f64 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(fps > 0.0 && fps <= 240.0) {
        return Err(format!("Frame rate must be between 0 and 240, got {}", fps));
    }
    Ok(fps)
}
