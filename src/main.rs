use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use briefing::api::{self, DEFAULT_TOPICS};
use briefing::cache::BriefingService;
use briefing::config::Config;
use briefing::generator::GeminiClient;
use briefing::pipeline::{Pipeline, PipelineOptions, RunOutcome};
use briefing::report;
use briefing::search::SerperClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Research and summarize the latest news on a topic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and print the report
    Run {
        /// Topic to research
        #[arg(short, long)]
        topic: String,

        /// Write the markdown report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve,
    /// List the default topics
    Topics,
}

fn build_pipeline(config: &Config) -> Result<Pipeline<SerperClient, GeminiClient>> {
    config.require_credentials()?;
    let search = SerperClient::new(config.search.clone()).context("Failed to build search client")?;
    let generator =
        GeminiClient::new(config.generator.clone()).context("Failed to build generator client")?;
    Ok(Pipeline::new(
        search,
        generator,
        PipelineOptions {
            enforce_source_contract: config.enforce_source_contract,
        },
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Topics => {
            for topic in DEFAULT_TOPICS {
                println!("{topic}");
            }
        }
        Command::Run { topic, output } => {
            let config = Config::from_env()?;
            let pipeline = build_pipeline(&config)?;

            let (text, filename) = match pipeline.run(&topic).await? {
                RunOutcome::Complete { briefing, .. } => (
                    report::render_markdown(&briefing),
                    report::download_filename(&briefing.topic),
                ),
                RunOutcome::Partial { topic, raw, error } => {
                    tracing::warn!("structured parsing failed: {error}");
                    (
                        report::render_partial(&topic, &raw, &error),
                        report::download_filename(&topic),
                    )
                }
            };

            match output {
                Some(path) => {
                    let path = if path.is_dir() { path.join(filename) } else { path };
                    tokio::fs::write(&path, text)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("report written to {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Command::Serve => {
            let config = Config::from_env()?;
            let service = Arc::new(BriefingService::new(build_pipeline(&config)?));
            let app = api::create_router(service);

            let listener = tokio::net::TcpListener::bind(config.server_addr)
                .await
                .with_context(|| format!("Failed to bind {}", config.server_addr))?;
            tracing::info!("listening on http://{}", config.server_addr);
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
