//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod init;
pub mod mode_list;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::chat::run_chat;
use crate::cli::init::run_init;
use crate::cli::mode_list::list_modes;
use crate::core::config::{default_config_path, Config, Overrides};

#[derive(Parser)]
#[command(name = "luna")]
#[command(version)]
#[command(about = "A terminal chat client for a local LM Studio model server")]
#[command(
    long_about = "Luna is a line-oriented terminal chat client. It starts a local LM Studio \
server, loads the persona's model and streams replies as they are generated.\n\n\
Commands typed at the >> prompt:\n\
  quit, exit, stop, qqq, goodbye    End the session (also <persona>:quit and friends)\n\
  mode:<name>                       Switch the temperature mode (see `luna modes`)\n\
  (empty line)                      Ask the model to continue its current thought\n\n\
Set RUST_LOG to control diagnostic output on stderr."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.toml (defaults to the platform configuration directory)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Persona to load
    #[arg(short = 'p', long, global = true)]
    pub persona: Option<String>,

    /// Verbose console output and debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Model identifier, overriding the persona's model-id file
    #[arg(short = 'm', long, global = true)]
    pub model: Option<String>,

    /// Do not start the server or load/unload the model
    #[arg(long, global = true)]
    pub no_server: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a chat session (default)
    Chat,
    /// Write a starter config.toml and the default persona assets
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// List the temperature modes
    Modes,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            persona: self.persona.clone(),
            debug: self.debug,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            no_server: self.no_server,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let config = Config::load_from_path(&config_path)?;
    let prefs = config.resolve(&args.overrides(), &config_dir);
    init_tracing(prefs.debug);
    tracing::debug!(config = %config_path.display(), "configuration loaded");

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(prefs).await,
        Commands::Init { force } => run_init(&config_path, &prefs, force),
        Commands::Modes => {
            list_modes(&prefs);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; otherwise the crate logs at debug or warn level. Logs go
/// to stderr so they never interleave with the streamed reply.
fn init_tracing(debug: bool) {
    let default_filter = if debug { "luna=debug" } else { "luna=warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
