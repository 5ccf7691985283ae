mod feedback;
mod samples;
mod session;
mod terminal;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mdstream::configuration::Settings;
use mdstream::handler::{register_default_handlers, HandlerRegistry};
use mdstream::StreamRenderer;
use tracing_subscriber::EnvFilter;

use crate::session::{Session, Theme};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the chat server (can also be set via MDSTREAM_SERVER__BASE_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// TOML settings file, layered under the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Context forwarded with every prompt
    #[arg(short, long, conflicts_with = "context_file")]
    context: Option<String>,

    /// Read the forwarded context from a file
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Send a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Stream the rendered HTML into this file instead of the terminal
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave code blocks unhighlighted
    #[arg(long)]
    no_highlight: bool,

    /// Use a light terminal theme
    #[arg(long)]
    light: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let settings = apply_overrides(settings, &cli)?;
    let formatted_context = load_context(&cli)?;

    let renderer = StreamRenderer::new(&settings)?;
    tracing::debug!(url = renderer.url(), "streaming chat endpoint");

    let mut registry = HandlerRegistry::new();
    register_default_handlers(&mut registry, renderer);

    let theme = if cli.light { Theme::Light } else { Theme::Dark };
    let mut session = Session::new(registry, formatted_context, cli.output.clone()).with_theme(theme);

    match &cli.prompt {
        Some(prompt) => session.headless(prompt).await,
        None => session.interactive().await,
    }
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Result<Settings> {
    if let Some(url) = &cli.url {
        settings.server.base_url = url.clone();
    }
    if cli.no_highlight {
        settings.render.highlight = false;
    }
    settings.validate().context("Invalid command line settings")?;
    Ok(settings)
}

fn load_context(cli: &Cli) -> Result<String> {
    if let Some(context) = &cli.context {
        return Ok(context.clone());
    }

    match &cli.context_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display())),
        None => Ok(String::new()),
    }
}
