//! Prediction Market Creator CLI
//!
//! Meant to be run on a schedule; each `run` creates at most one market.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use prediction_minter::config;
use prediction_minter::error::truncate;
use prediction_minter::{Config, Pipeline, PredictionCache, RunReport, RunSummary};
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prediction-minter")]
#[command(about = "Creates prediction markets from trending crypto news")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create one market: fetch, propose, mint, register (default)
    Run,

    /// Propose a market and pick its image without minting or registering
    Preview,

    /// Show questions remembered in the dedup cache
    Recent {
        /// Maximum number of questions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match dispatch(cli.command.unwrap_or(Commands::Run)).await {
        Ok(code) => code,
        Err(e) => {
            error!("FATAL: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Recent { limit } => {
            // Reading the cache needs no secrets
            dotenvy::dotenv().ok();
            show_recent(&PredictionCache::new(config::cache_path()), limit);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Preview => {
            let config = Config::from_env()?;
            preview(&config).await
        }
        Commands::Run => {
            let config = Config::from_env()?;
            run(&config).await
        }
    }
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("  {}", title);
    println!("{}\n", "=".repeat(70));
}

async fn run(config: &Config) -> Result<ExitCode> {
    banner("PREDICTION MARKET CREATOR");

    let pipeline = Pipeline::from_config(config).await?;

    match pipeline.run().await {
        Ok(RunReport::NoContent) => {
            println!("{}", "No posts found. Exiting.".yellow());
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunReport::Completed(summary)) => {
            print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn preview(config: &Config) -> Result<ExitCode> {
    banner("PREVIEW (no market will be created)");

    let pipeline = Pipeline::from_config(config).await?;

    match pipeline.preview().await {
        Ok(None) => {
            println!("{}", "No posts found.".yellow());
            Ok(ExitCode::SUCCESS)
        }
        Ok(Some(preview)) => {
            let p = &preview.proposal;
            println!("Posts considered: {}", preview.posts_considered);
            println!("Question:  {}", p.question.bold());
            println!("Category:  {}", p.category);
            println!("Duration:  {} days", p.duration_days);
            if let Some(rules) = &p.resolution_criteria {
                println!("Rules:     {}", rules);
            }
            if let Some(score) = p.score {
                println!("Score:     {:.1}", score);
            }
            if let Some(reasoning) = &p.reasoning {
                println!("Reasoning: {}", reasoning);
            }
            for source in &p.sources {
                println!("Source:    {}", source);
            }
            println!("Image:     {}", display_image(&preview.image_url));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_summary(summary: &RunSummary) {
    banner("SUMMARY");

    println!("Question: {}", summary.proposal.question);
    println!("Market #: {}", summary.market.number);
    println!("Category: {}", summary.proposal.category);
    println!("Image:    {}", display_image(&summary.image_url));
    println!("TX:       {}", summary.market.tx_hash);
    println!("Explorer: {}", summary.market.explorer_url);

    if summary.registered {
        println!("Live App: {}", "✓ registered".green());
    } else {
        println!("Live App: {}", "✗ registration failed (market is on-chain only)".red());
    }
    if summary.registered && !summary.cached {
        println!("Cache:    {}", "⚠ question not saved".yellow());
    }

    println!("{}\n", "=".repeat(70));
}

fn display_image(url: &str) -> String {
    if url.is_empty() {
        "No image".to_string()
    } else {
        truncate(url, 50)
    }
}

fn show_recent(cache: &PredictionCache, limit: usize) {
    let recent = cache.load();

    banner(&format!("RECENT PREDICTIONS ({})", cache.path().display()));

    if recent.is_empty() {
        println!("No cached predictions.\n");
        return;
    }

    for (i, prediction) in recent.iter().rev().take(limit).enumerate() {
        println!("{}. {}", i + 1, prediction.question);
        println!("   {}", prediction.timestamp.dimmed());
    }

    if recent.len() > limit {
        println!("\n   ... and {} more", recent.len() - limit);
    }
    println!();
}
