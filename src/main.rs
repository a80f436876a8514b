// `BeerTally` - Rebuilds a group's running beer count from a chat export
//
// Copyright (C) 2025 Daniel Freiermuth
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use anyhow::{bail, Context};
use beertally::config::AnalysisConfig;
use beertally::core::table::write_json;
use beertally::core::{find_latest_export, load_chat_lines, Analysis};
use chrono::NaiveDateTime;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "beertally")]
#[command(author = "BeerTally Team")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Clean a chat tally, flag typos and outliers, and forecast milestones", long_about = None)]
struct Args {
    /// Path to the chat export to analyse
    #[arg(value_name = "FILE", conflicts_with = "dir")]
    file: Option<PathBuf>,

    /// Analyse the most recently modified export in this directory instead
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Long-term goal to forecast
    #[arg(long)]
    target: Option<i64>,

    /// Leave a message out of the trend fit (repeatable), e.g. 2025-06-14T17:43:00
    #[arg(long = "exclude", value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    exclusions: Vec<NaiveDateTime>,

    /// Write the forecast text here instead of stdout
    #[arg(long, value_name = "REPORT_FILE")]
    report: Option<PathBuf>,

    /// Write the cleaned table as JSON
    #[arg(long, value_name = "TABLE_FILE")]
    table: Option<PathBuf>,

    /// Write the effective config and exit
    #[arg(long)]
    init_config: bool,
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got {s:?}"))
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG environment variable to override (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "BeerTally starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) if args.init_config && !path.exists() => AnalysisConfig::default(),
        Some(path) => AnalysisConfig::load_from(path)?,
        None => AnalysisConfig::load()?,
    };
    if let Some(target) = args.target {
        config.target = target;
    }
    config.exclusions.extend(args.exclusions.iter().copied());

    if args.init_config {
        let path = args
            .config
            .clone()
            .or_else(AnalysisConfig::config_path)
            .context("Could not determine config directory")?;
        return config.save_to(&path);
    }

    let source = match (&args.file, &args.dir) {
        (Some(file), _) => file.clone(),
        (None, Some(dir)) => find_latest_export(dir, &config.export_prefix)?,
        (None, None) => bail!("Pass a chat export FILE or --dir <DIR>"),
    };

    let lines = load_chat_lines(&source)?;
    let analysis = Analysis::run(&lines, config);

    if let Some(path) = &args.table {
        write_json(path, &analysis.table())?;
    }

    let generated_on = chrono::Local::now().naive_local();
    let report = analysis
        .report(&source.display().to_string(), generated_on)
        .with_context(|| format!("Cannot forecast from {}", source.display()))?;

    match &args.report {
        Some(path) => {
            std::fs::write(path, report.to_string())
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!("Saved forecast to {}", path.display());
        }
        None => print!("{report}"),
    }

    Ok(())
}
