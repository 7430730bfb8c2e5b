//! Narrative lifecycle analysis and alpha ranking
//!
//! This crate classifies market narratives (themes such as "AI infrastructure"
//! or "energy transition") into lifecycle stages, aligns them with the active
//! macro regime, and ranks them by an alpha opportunity score. It includes:
//!
//! - Domain model for narratives, capital flows and attention samples
//! - Lifecycle stage detection from capital velocity, attention and age
//! - Regime alignment scoring across six macro regimes
//! - Weighted alpha scoring with per-component explanations
//! - A claim DAG with influence scoring and cross-tree asset interactions
//!
//! # Architecture
//!
//! Every alignment-dependent call takes an explicit [`AnalysisContext`]
//! carrying the regime and evaluation time, so a classification cycle and
//! the ranking that follows it observe the same regime:
//! - [`NarrativeClassifier`]: owns the narrative registry and assigns stages
//! - [`AlphaRanker`]: scores and orders narrative snapshots
//! - [`ClaimGraph`]: causal hierarchy of economic claims
//!
//! # Example
//!
//! ```rust,ignore
//! use narrative_core::{AlphaRanker, AnalysisContext, Narrative, NarrativeClassifier, RegimeType};
//!
//! let mut classifier = NarrativeClassifier::new();
//! classifier.add_narrative(Narrative::builder("ai", "AI Infrastructure").build()?)?;
//!
//! let ctx = AnalysisContext::now().with_regime(RegimeType::Expansion);
//! classifier.update_all(&ctx)?;
//!
//! let snapshot = classifier.snapshot();
//! let ranker = AlphaRanker::default();
//! for ranked in ranker.get_top_opportunities(&snapshot, 5, true, &ctx)? {
//!     println!("{} {} {:.1}", ranked.rank, ranked.narrative.name(), ranked.alpha_score);
//! }
//! ```

pub mod claims;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod ranker;

pub use claims::{
    CausalDirection, Claim, ClaimGraph, ClaimTier, ClaimTree, ClaimTrend, CrossTreeInteraction,
};
pub use classifier::{Classification, NarrativeClassifier, StageSignals};
pub use config::{ClassifierConfig, LifecycleScores, RankerConfig, ScoringWeights, StageThresholds};
pub use context::AnalysisContext;
pub use error::{NarrativeError, Result};
pub use models::{
    AttentionSample, CapitalFlow, LifecycleStage, Narrative, NarrativeBuilder, RegimeType,
};
pub use ranker::{
    AlphaRanker, ComponentInput, ComponentScore, RankedNarrative, RankingFilter, ScoreBreakdown,
    ScoreComponent, format_dollars,
};
