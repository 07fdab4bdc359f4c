//! This module implements the CLI for deepstate-kml: command parsing, wiring
//! the configured stages together, and user-visible invocations.
//!
//! All pipeline logic lives in the library modules; this module is glue.
//!
//! - `run` polls forever, publishing every interval.
//! - `once` runs a single iteration and fails the process if it fails.
//! - `convert` turns a local GeoJSON file into KML without touching git.

use crate::config::Config;
use crate::convert::Converter;
use crate::fetch::HttpFetcher;
use crate::geojson::FeatureCollection;
use crate::git::GitCli;
use crate::load_config::load_or_default;
use crate::publish::{write_document, PublishOutcome, Publisher};
use crate::synchronise::{run_cycle, run_forever, Pipeline};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// CLI for deepstate-kml: mirror a GeoJSON front-line feed as KML in git.
#[derive(Parser)]
#[clap(
    name = "deepstate-kml",
    version,
    about = "Poll a GeoJSON feed, convert it to KML and commit the result to git"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, convert and publish every interval, forever
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Run a single fetch/convert/publish iteration
    Once {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Convert a local GeoJSON file to KML
    Convert {
        /// GeoJSON feature collection to read
        #[clap(long)]
        input: PathBuf,
        /// KML file to write
        #[clap(long)]
        output: PathBuf,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Wires the stages; a config file inside the repository is committed with the KML.
fn build_pipeline(
    config: &Config,
    config_path: Option<&Path>,
) -> Result<Pipeline<HttpFetcher, GitCli>> {
    let fetcher = HttpFetcher::new(&config.source).context("Failed to construct HTTP client")?;
    let converter = Converter::new(config.convert.clone());
    let mut publish = config.publish.clone();
    if let Some(path) = config_path {
        publish.track_config_file(path);
    }
    let vcs = GitCli::new(publish.repo_dir.clone());
    let publisher = Publisher::new(publish, vcs);
    Ok(Pipeline::new(fetcher, converter, publisher))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            config: config_path,
        } => {
            let config = load_or_default(config_path.as_deref())?;
            let pipeline = build_pipeline(&config, config_path.as_deref())?;
            tracing::info!(command = "run", "Starting polling loop");
            run_forever(&pipeline, config.schedule.interval()).await;
            Ok(())
        }
        Commands::Once {
            config: config_path,
        } => {
            let config = load_or_default(config_path.as_deref())?;
            let pipeline = build_pipeline(&config, config_path.as_deref())?;
            tracing::info!(command = "once", "Running single cycle");
            let report = run_cycle(&pipeline).await.map_err(|e| {
                tracing::error!(command = "once", category = e.category(), error = %e, "Cycle failed");
                anyhow::Error::new(e)
            })?;
            println!(
                "Wrote {} placemarks to {}",
                report.placemarks,
                report.output_path.display()
            );
            match report.outcome {
                PublishOutcome::Committed { message } => println!("Committed: {message}"),
                PublishOutcome::Unchanged => println!("No changes to commit"),
                PublishOutcome::VersionControlFailed { step, error } => {
                    println!("Version control {step} failed: {error}")
                }
            }
            Ok(())
        }
        Commands::Convert {
            input,
            output,
            config,
        } => {
            let config = load_or_default(config.as_deref())?;
            let body = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let collection: FeatureCollection = body
                .parse()
                .with_context(|| format!("Failed to parse {} as GeoJSON", input.display()))?;
            let document = Converter::new(config.convert).convert(&collection)?;
            write_document(&document, &output)?;
            tracing::info!(command = "convert", output = %output.display(), "Conversion complete");
            println!(
                "Wrote {} placemarks to {}",
                document.len(),
                output.display()
            );
            Ok(())
        }
    }
}
