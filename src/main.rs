use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

mod catalog;
mod config;
mod engine;
mod export;
mod loader;
mod logging;
mod models;
mod report;
mod timestamp;

use crate::catalog::ModuleCatalog;
use crate::config::{validate_config, CompletionPolicy, ModuleGate, ScoringConfig, TimeUnit};

#[derive(Parser)]
#[command(name = "engagement-scores")]
#[command(about = "Per-user engagement scores from video-lecture playback logs", long_about = None)]
struct Cli {
    #[command(flatten)]
    scoring: ScoringArgs,

    /// Log per-user scoring figures
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScoringArgs {
    /// Completion filter gating rows into interaction scoring
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ENGAGEMENT_COMPLETION",
        default_value_t = CompletionPolicy::Duration
    )]
    completion: CompletionPolicy,

    /// How start_time and end_time cells are encoded
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ENGAGEMENT_TIME_UNIT",
        default_value_t = TimeUnit::Calendar
    )]
    time_unit: TimeUnit,

    /// Floor the session score at zero
    #[arg(long, global = true, env = "ENGAGEMENT_CLAMP_SESSION_SCORE")]
    clamp_session_score: bool,

    /// CSV of topic_title,video_count used for module coverage
    #[arg(long, global = true, env = "ENGAGEMENT_MODULE_CATALOG")]
    module_catalog: Option<PathBuf>,

    /// Whether module coverage only gets reported or also gates interaction scoring
    #[arg(
        long,
        global = true,
        value_enum,
        env = "ENGAGEMENT_MODULE_GATE",
        default_value_t = ModuleGate::Report
    )]
    module_gate: ModuleGate,
}

impl ScoringArgs {
    fn into_config(self) -> anyhow::Result<ScoringConfig> {
        let mut config = ScoringConfig::default()
            .with_completion(self.completion)
            .with_time_unit(self.time_unit);
        config.clamp_session_score = self.clamp_session_score;
        config.module_gate = self.module_gate;

        if let Some(path) = self.module_catalog {
            let catalog = ModuleCatalog::from_path(&path)?;
            info!(path = %path.display(), modules = catalog.len(), "loaded module catalog");
            config = config.with_catalog(catalog, self.module_gate);
        }

        if let Err(errors) = validate_config(&config) {
            anyhow::bail!("invalid scoring configuration:\n  {}", errors.join("\n  "));
        }

        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an upload without scoring it
    Check {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print per-user scores
    Score {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Write the score table as CSV
    Export {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = export::DEFAULT_FILE_NAME)]
        out: PathBuf,
    },
    /// Generate a markdown report of the upload and its scores
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        preview_rows: usize,
    },
}

fn load(csv: &Path, config: &ScoringConfig) -> anyhow::Result<loader::EventTable> {
    loader::load_events(csv, config.completion)
        .with_context(|| format!("failed to load {}", csv.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = cli.scoring.into_config()?;
    info!(
        completion = ?config.completion,
        time_unit = ?config.time_unit,
        "scoring configuration ready"
    );

    match cli.command {
        Commands::Check { csv } => {
            let table = load(&csv, &config)?;
            println!(
                "{} is valid: {} rows across {} users ({} skipped).",
                csv.display(),
                table.events.len(),
                table.user_count(),
                table.skipped_rows
            );
            println!("Columns: {}", table.columns.join(", "));
        }
        Commands::Score { csv, limit, format } => {
            let table = load(&csv, &config)?;
            let scores = engine::compute_scores(&table.events, &config);

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&scores)?);
                }
                OutputFormat::Table => {
                    if scores.is_empty() {
                        println!("No users found in this upload.");
                        return Ok(());
                    }

                    println!("Calculated scores:");
                    for score in scores.iter().take(limit) {
                        println!(
                            "- {} interaction {} offline {} session {} total {:.2}",
                            score.user_id,
                            score.interaction_score,
                            score.offline_score,
                            score.session_score,
                            score.total_score
                        );
                    }
                    if scores.len() > limit {
                        println!("({} more users not shown)", scores.len() - limit);
                    }
                }
            }
        }
        Commands::Export { csv, out } => {
            let table = load(&csv, &config)?;
            let scores = engine::compute_scores(&table.events, &config);
            export::export_scores(&out, &scores)?;
            println!(
                "Scores for {} users written to {} ({}).",
                scores.len(),
                out.display(),
                export::MEDIA_TYPE
            );
        }
        Commands::Report {
            csv,
            out,
            preview_rows,
        } => {
            let table = load(&csv, &config)?;
            let breakdowns = engine::score_users(&table.events, &config);
            let report = report::build_report(
                &csv.display().to_string(),
                &config,
                &table,
                &breakdowns,
                preview_rows,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
