//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Initialise logging.
//! 3. Load [`AppConfig`]: a `--config` path must load, the platform default
//!    falls back to defaults.
//! 4. Build the requested processor; a missing API key exits non-zero.
//! 5. Run it on a [`tokio`] runtime and print the result as JSON.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use insight_pipelines::config::{AppConfig, KNOWN_MODELS};
use insight_pipelines::pipeline::{FeedbackProcessor, InterviewProcessor};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "insight-pipelines")]
#[command(about = "Summarise interview transcripts and answer product feedback with an LLM")]
#[command(version)]
struct Cli {
    /// Model id (overrides `llm.default_model` from the config file)
    #[arg(long, global = true, env = "INSIGHT_MODEL")]
    model: Option<String>,

    /// Configuration file path (defaults to the platform config directory)
    #[arg(long, short = 'c', global = true, env = "INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse an interview transcript
    Interview {
        /// Transcript file; read from stdin when omitted
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
    /// Classify product feedback and draft a reply
    Feedback {
        /// Product name
        #[arg(long, short = 'p')]
        product: String,
        /// Feedback text
        #[arg(long, short = 't')]
        text: String,
    },
    /// List well-known OpenRouter model ids
    Models,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .init();

    // 2. Configuration
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let model = cli.model.as_deref();
    let output = match cli.command {
        Command::Models => {
            print_models(&config);
            return Ok(());
        }
        Command::Interview { file } => {
            let transcript = read_transcript(file.as_ref())?;
            let processor = InterviewProcessor::from_config(&config, model)?;
            let result = runtime()?.block_on(processor.process_interview(&transcript));
            serde_json::to_string_pretty(&result)?
        }
        Command::Feedback { product, text } => {
            let processor = FeedbackProcessor::from_config(&config, model)?;
            let result = runtime()?.block_on(processor.process_feedback(&product, &text));
            serde_json::to_string_pretty(&result)?
        }
    };

    println!("{output}");
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}

fn print_models(config: &AppConfig) {
    for model in KNOWN_MODELS {
        let marker = if *model == config.llm.default_model {
            " (default)"
        } else {
            ""
        };
        println!("{model}{marker}");
    }
}

fn read_transcript(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript {}", path.display())),
        None => {
            let mut transcript = String::new();
            std::io::stdin()
                .read_to_string(&mut transcript)
                .context("failed to read transcript from stdin")?;
            Ok(transcript)
        }
    }
}
