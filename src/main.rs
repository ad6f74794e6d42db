//! # Synapsis CLI (`synapsis`)
//!
//! Starts the HTTP server, or performs a single save/ask from the command
//! line through the same pipeline the server uses.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `synapsis serve` | Start the HTTP server |
//! | `synapsis modes` | List configured modes |
//! | `synapsis save [CONTENT]` | Save content (stdin when omitted) and publish |
//! | `synapsis ask [CONTENT]` | Ask the AI, save the answer, and publish |
//!
//! ## Examples
//!
//! ```bash
//! synapsis --config ./config/synapsis.toml serve
//! echo "meeting notes" | synapsis save --filename meeting.md
//! synapsis ask --mode code "fn main() { println!(\"hi\") }"
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use synapsis::config::{self, Config};
use synapsis::models::{AskRequest, SaveRequest};
use synapsis::modes::ModeRegistry;
use synapsis::pipeline::Pipeline;
use synapsis::server;

const DEFAULT_CONFIG: &str = "./config/synapsis.toml";

/// Synapsis: save notes and AI answers as Markdown and mirror them to git.
#[derive(Parser)]
#[command(name = "synapsis", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/synapsis.toml`; built-in defaults are used
    /// when that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Requires the API key environment variable and, when configured,
    /// a valid mode file. The data directory is created if missing.
    Serve,

    /// List the configured modes.
    Modes,

    /// Save content as a file in the data directory, then publish.
    Save {
        /// Content to save. Read from stdin when omitted.
        content: Option<String>,

        /// File name; a timestamped name is generated when omitted.
        #[arg(long)]
        filename: Option<String>,

        /// Skip git commit/push.
        #[arg(long)]
        no_publish: bool,
    },

    /// Ask the AI using a mode, save the answer, then publish.
    Ask {
        /// Question or input. Read from stdin when omitted.
        content: Option<String>,

        /// Mode id; the configured default mode when omitted.
        #[arg(long)]
        mode: Option<String>,

        /// File name; `<mode>_<timestamp>.md` when omitted.
        #[arg(long)]
        filename: Option<String>,

        /// Skip git commit/push.
        #[arg(long)]
        no_publish: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Modes => {
            let registry = ModeRegistry::load(&cfg.modes.file)?;
            for mode in registry.modes() {
                let marker = if mode.id == registry.default_mode() { "*" } else { " " };
                println!(
                    "{} {:<12} {:<16} {:<16} {}",
                    marker, mode.id, mode.name, mode.save_dir, mode.description
                );
            }
        }
        Commands::Save {
            content,
            filename,
            no_publish,
        } => {
            let pipeline = Pipeline::from_config(&cfg, false, cfg.publish.enabled && !no_publish)?;
            let content = content_or_stdin(content)?;
            let resp = pipeline.save(SaveRequest { filename, content }).await?;
            println!("{}", resp.message);
            println!("  path: {}", resp.filepath);
            print_publish(resp.git_pushed, resp.git_error.as_deref());
        }
        Commands::Ask {
            content,
            mode,
            filename,
            no_publish,
        } => {
            let pipeline = Pipeline::from_config(&cfg, true, cfg.publish.enabled && !no_publish)?;
            let mode_id = match mode {
                Some(id) => id,
                None => pipeline.mode_registry()?.default_mode().to_string(),
            };
            let content = content_or_stdin(content)?;
            let resp = pipeline
                .ask(AskRequest {
                    content,
                    mode_id,
                    filename,
                })
                .await?;
            println!("{}\n", resp.ai_response);
            println!("{}", resp.message);
            println!("  path: {}", resp.filepath);
            print_publish(resp.git_pushed, resp.git_error.as_deref());
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; the default path is optional.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if path.exists() {
                config::load_config(path)
            } else {
                info!("no config file at {}; using defaults", DEFAULT_CONFIG);
                Ok(Config::minimal())
            }
        }
    }
}

fn content_or_stdin(content: Option<String>) -> Result<String> {
    match content {
        Some(c) => Ok(c),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_publish(pushed: bool, error: Option<&str>) {
    match (pushed, error) {
        (true, _) => println!("  git: pushed"),
        (false, Some(err)) => println!("  git: {}", err),
        (false, None) => println!("  git: skipped"),
    }
}
