mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;

use ascii_stream::config::Config;
use cli::{Args, Command};

/// Load .env file
///
/// Does not override existing environment variables; a missing .env is fine.
fn load_env() {
    let _ = dotenv::dotenv();
}

/// Log to stderr at `info` unless RUST_LOG says otherwise.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn runtime() -> Result<Runtime> {
    Runtime::new().context("creating tokio runtime")
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env();

    match args.command {
        Command::Serve(serve) => runtime()?.block_on(cli::run_serve(serve, &config)),
        Command::Convert(convert) => runtime()?.block_on(cli::run_convert(convert, &config)),
        Command::Share { file, server } => {
            runtime()?.block_on(cli::run_share(&file, server, &config))
        }
        Command::Play { file, loops } => cli::run_play(&file, loops),
        Command::Config { action } => {
            cli::handle_config_action(action, &config, args.config.as_deref())
        }
    }
}

fn main() {
    // Load .env file before anything else
    load_env();
    init_logging();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
