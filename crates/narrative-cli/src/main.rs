//! Command-line interface for narrative-rs
//!
//! Loads narratives from a JSON file (or the built-in demo set), classifies
//! them under the chosen regime and prints the ranked opportunities.

mod demo;
mod render;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use narrative_core::{
    AlphaRanker, AnalysisContext, ClassifierConfig, Narrative, NarrativeClassifier, RankerConfig,
    RankingFilter, RegimeType,
};
use narrative_utils::{Config, LogFormat};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "narrative-cli")]
#[command(about = "Rank market narratives by alpha opportunity", long_about = None)]
struct Args {
    /// Active macro regime: expansion, recession, inflation, deflation, volatility or stability
    #[arg(short, long, default_value = "expansion")]
    regime: RegimeType,

    /// JSON array of narratives; the built-in demo set is used when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of opportunities to show
    #[arg(short = 'n', long, default_value_t = 5)]
    top: usize,

    /// Only show Formation and Acceleration narratives
    #[arg(long)]
    early_only: bool,

    /// Drop narratives scoring below this alpha
    #[arg(long)]
    min_score: Option<f64>,

    /// Print a per-component breakdown for each ranked narrative
    #[arg(long)]
    explain: bool,

    /// Classifier thresholds as JSON
    #[arg(long)]
    classifier_config: Option<PathBuf>,

    /// Ranker weights as JSON
    #[arg(long)]
    ranker_config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Overrides NARRATIVE_LOG_FORMAT
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_narratives(path: &Path) -> anyhow::Result<Vec<Narrative>> {
    let json = read_file(path)?;
    serde_json::from_str(&json)
        .with_context(|| format!("failed to parse narratives from {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(format) = args.log_format {
        config.log_format = format;
    }
    narrative_utils::init_tracing_with(config.log_format);

    info!(
        app = %config.app_name,
        environment = %config.environment,
        regime = %args.regime,
        "Starting narrative-cli"
    );

    let classifier_config = match &args.classifier_config {
        Some(path) => ClassifierConfig::from_json(&read_file(path)?)?,
        None => ClassifierConfig::default(),
    };
    let ranker_config = match &args.ranker_config {
        Some(path) => RankerConfig::from_json(&read_file(path)?)?,
        None => RankerConfig::default(),
    };

    let ctx = AnalysisContext::now().with_regime(args.regime);
    let narratives = match &args.input {
        Some(path) => load_narratives(path)?,
        None => demo::narratives(ctx.as_of())?,
    };

    let mut classifier = NarrativeClassifier::with_config(classifier_config)?;
    for narrative in narratives {
        classifier.add_narrative(narrative)?;
    }
    classifier.update_all(&ctx)?;
    let snapshot = classifier.snapshot();

    let ranker = AlphaRanker::new(ranker_config)?;
    let filter = RankingFilter {
        early_stage_only: args.early_only,
        min_alpha_score: args.min_score,
    };
    let mut ranked = ranker.rank_filtered(&snapshot, &filter, &ctx)?;
    ranked.truncate(args.top);

    let breakdowns = if args.explain {
        ranked
            .iter()
            .map(|entry| ranker.explain(entry.narrative, &ctx))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    match args.format {
        OutputFormat::Table => {
            println!("Regime: {}", args.regime);
            println!(
                "{}",
                render::ranking_table(&ranked, args.regime, ranker.config().flow_lookback)
            );
            for (entry, breakdown) in ranked.iter().zip(&breakdowns) {
                println!();
                println!("#{} {}", entry.rank, entry.narrative.name());
                println!("{}", render::breakdown_table(breakdown));
                println!("{}", breakdown.reasoning);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "regime": args.regime,
                "as_of": ctx.as_of(),
                "ranked": ranked,
                "explanations": breakdowns,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
