//! Alpha scoring and ranking of classified narratives
//!
//! The alpha score is a weighted sum of four components, each in [0, 100]:
//!
//! | component        | weight | source                                           |
//! |------------------|--------|--------------------------------------------------|
//! | lifecycle        | 0.40   | stage lookup table (Formation 100 ... Decay 0)   |
//! | capital flow     | 0.30   | recent net flow against `max_meaningful_flow`    |
//! | regime alignment | 0.20   | classifier alignment for the active regime       |
//! | flow momentum    | 0.10   | last window of net flow against the one before   |
//!
//! Narratives without flow history score the neutral midpoint on both flow
//! components rather than the floor.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, info};

use crate::config::RankerConfig;
use crate::context::AnalysisContext;
use crate::error::{NarrativeError, Result};
use crate::models::{CapitalFlow, LifecycleStage, Narrative, RegimeType};

/// Maximum drift between an explanation's contributions and the score
pub const EXPLAIN_EPSILON: f64 = 1e-9;

/// Component score used when there is no flow history to judge
pub const NEUTRAL_SCORE: f64 = 50.0;

const STRONG_ALIGNMENT: f64 = 70.0;
const WEAK_ALIGNMENT: f64 = 40.0;

/// The four alpha score components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    Lifecycle,
    CapitalFlow,
    RegimeAlignment,
    FlowMomentum,
}

impl ScoreComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreComponent::Lifecycle => "lifecycle",
            ScoreComponent::CapitalFlow => "capital_flow",
            ScoreComponent::RegimeAlignment => "regime_alignment",
            ScoreComponent::FlowMomentum => "flow_momentum",
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input a component score was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComponentInput {
    Stage(LifecycleStage),
    /// Recent net flow; `None` without flow history
    NetFlow(Option<f64>),
    Alignment { regime: RegimeType, score: f64 },
    /// Relative change between the two latest flow windows, in [-1, 1]
    MomentumChange(Option<f64>),
}

/// One line of a score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub component: ScoreComponent,
    pub input: ComponentInput,
    /// Component score in [0, 100]
    pub score: f64,
    pub weight: f64,
    /// `score * weight`
    pub contribution: f64,
}

/// Full explanation of a narrative's alpha score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub narrative_id: String,
    pub regime: RegimeType,
    pub alpha_score: f64,
    pub components: Vec<ComponentScore>,
    pub reasoning: String,
}

impl ScoreBreakdown {
    /// Unclamped sum of the weighted contributions
    pub fn contribution_total(&self) -> f64 {
        self.components.iter().map(|c| c.contribution).sum()
    }

    pub fn component(&self, component: ScoreComponent) -> Option<&ComponentScore> {
        self.components.iter().find(|c| c.component == component)
    }
}

/// A narrative with its position in a ranking
#[derive(Debug, Clone, Serialize)]
pub struct RankedNarrative<'a> {
    /// 1-based position in the returned list
    pub rank: usize,
    pub alpha_score: f64,
    pub narrative: &'a Narrative,
}

/// Optional filters applied after scoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingFilter {
    /// Keep only Formation and Acceleration narratives
    pub early_stage_only: bool,
    /// Drop narratives scoring below this threshold
    pub min_alpha_score: Option<f64>,
}

/// Scores and ranks narratives by alpha opportunity
#[derive(Debug, Clone, Default)]
pub struct AlphaRanker {
    config: RankerConfig,
}

impl AlphaRanker {
    /// Create a ranker; fails unless the weights sum to 1.0
    pub fn new(config: RankerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Alpha score in [0, 100]
    pub fn score(&self, narrative: &Narrative, ctx: &AnalysisContext) -> Result<f64> {
        let components = self.component_scores(narrative, ctx)?;
        let score = Self::total(&components);
        debug!(narrative_id = narrative.id(), score, "Scored narrative");
        Ok(score)
    }

    /// Score breakdown that reconciles with [`AlphaRanker::score`]
    pub fn explain(&self, narrative: &Narrative, ctx: &AnalysisContext) -> Result<ScoreBreakdown> {
        let regime = ctx.regime()?;
        let components = self.component_scores(narrative, ctx)?;
        let alpha_score = Self::total(&components);

        Ok(ScoreBreakdown {
            narrative_id: narrative.id().to_string(),
            regime,
            alpha_score,
            components: components.to_vec(),
            reasoning: self.reasoning(narrative, regime),
        })
    }

    /// Rank narratives by descending alpha score
    ///
    /// Ties go to the earlier lifecycle stage, then the larger recent net
    /// flow, then the lexicographically smaller id.
    pub fn rank_narratives<'a>(
        &self,
        narratives: &'a [Narrative],
        ctx: &AnalysisContext,
    ) -> Result<Vec<RankedNarrative<'a>>> {
        self.rank_filtered(narratives, &RankingFilter::default(), ctx)
    }

    /// Rank, then keep only narratives passing `filter`
    ///
    /// Ranks are renumbered over the surviving narratives.
    pub fn rank_filtered<'a>(
        &self,
        narratives: &'a [Narrative],
        filter: &RankingFilter,
        ctx: &AnalysisContext,
    ) -> Result<Vec<RankedNarrative<'a>>> {
        let regime = ctx.regime()?;

        let mut scored = narratives
            .iter()
            .map(|narrative| {
                Ok((
                    self.score(narrative, ctx)?,
                    narrative.recent_net_flow(self.config.flow_lookback),
                    narrative,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|(score_a, flow_a, a), (score_b, flow_b, b)| {
            score_b
                .total_cmp(score_a)
                .then_with(|| a.lifecycle_stage().cmp(&b.lifecycle_stage()))
                .then_with(|| flow_b.total_cmp(flow_a))
                .then_with(|| a.id().cmp(b.id()))
        });

        let ranked: Vec<RankedNarrative<'a>> = scored
            .into_iter()
            .filter(|(score, _, narrative)| {
                (!filter.early_stage_only || narrative.is_early_stage())
                    && filter.min_alpha_score.is_none_or(|min| *score >= min)
            })
            .enumerate()
            .map(|(i, (alpha_score, _, narrative))| RankedNarrative {
                rank: i + 1,
                alpha_score,
                narrative,
            })
            .collect();

        info!(
            total = narratives.len(),
            ranked = ranked.len(),
            %regime,
            "Ranked narratives"
        );
        Ok(ranked)
    }

    /// Best `top_n` opportunities, optionally restricted to early stages
    ///
    /// Returns fewer than `top_n` items when fewer survive the filter.
    pub fn get_top_opportunities<'a>(
        &self,
        narratives: &'a [Narrative],
        top_n: usize,
        early_stage_only: bool,
        ctx: &AnalysisContext,
    ) -> Result<Vec<RankedNarrative<'a>>> {
        let filter = RankingFilter {
            early_stage_only,
            min_alpha_score: None,
        };
        let mut ranked = self.rank_filtered(narratives, &filter, ctx)?;
        ranked.truncate(top_n);
        Ok(ranked)
    }

    /// Lifecycle component: explicit stage lookup
    pub fn lifecycle_score(&self, stage: LifecycleStage) -> f64 {
        self.config.lifecycle_scores.score(stage)
    }

    /// Capital flow component: recent net inflow against the reference ceiling
    pub fn capital_flow_score(&self, narrative: &Narrative) -> f64 {
        if narrative.capital_flows().is_empty() {
            return NEUTRAL_SCORE;
        }

        let net = narrative.recent_net_flow(self.config.flow_lookback);
        100.0 * (net / self.config.max_meaningful_flow).clamp(0.0, 1.0)
    }

    /// Regime component: the classifier's alignment for the active regime
    pub fn regime_alignment_score(
        &self,
        narrative: &Narrative,
        ctx: &AnalysisContext,
    ) -> Result<f64> {
        let regime = ctx.regime()?;
        narrative
            .regime_score(regime)
            .map(|score| score.clamp(0.0, 100.0))
            .ok_or_else(|| {
                NarrativeError::Precondition(format!(
                    "narrative '{}' has no {regime} alignment; classify it before ranking",
                    narrative.id()
                ))
            })
    }

    /// Momentum component: 50 is flat, 100 is a full acceleration of inflows
    pub fn flow_momentum_score(&self, narrative: &Narrative) -> f64 {
        self.momentum_change(narrative)
            .map_or(NEUTRAL_SCORE, |change| {
                (NEUTRAL_SCORE + NEUTRAL_SCORE * change).clamp(0.0, 100.0)
            })
    }

    /// Relative change in summed net flow between the latest window and the
    /// window before it, in [-1, 1]; `None` with fewer than two flows
    pub fn momentum_change(&self, narrative: &Narrative) -> Option<f64> {
        let flows = narrative.flows_chronological();
        let n = flows.len();
        if n < 2 {
            return None;
        }

        let k = self.config.momentum_window.min(n / 2);
        let windows = &flows[n - 2 * k..];
        let scale = windows.iter().map(|f| f.net_flow().abs()).fold(0.0, f64::max);
        if scale == 0.0 {
            return Some(0.0);
        }

        // Window sums over flows divided by `scale` cannot overflow
        let sum = |window: &[CapitalFlow]| -> f64 {
            window.iter().map(|f| f.net_flow() / scale).sum()
        };
        let recent = sum(&windows[k..]);
        let previous = sum(&windows[..k]);
        let magnitude = recent.abs() + previous.abs();

        if magnitude <= f64::EPSILON {
            Some(0.0)
        } else {
            Some(((recent - previous) / magnitude).clamp(-1.0, 1.0))
        }
    }

    fn component_scores(
        &self,
        narrative: &Narrative,
        ctx: &AnalysisContext,
    ) -> Result<[ComponentScore; 4]> {
        let regime = ctx.regime()?;
        let weights = &self.config.weights;
        let has_flows = !narrative.capital_flows().is_empty();
        let regime_score = self.regime_alignment_score(narrative, ctx)?;

        let line = |component, input, score: f64, weight: f64| ComponentScore {
            component,
            input,
            score,
            weight,
            contribution: score * weight,
        };

        Ok([
            line(
                ScoreComponent::Lifecycle,
                ComponentInput::Stage(narrative.lifecycle_stage()),
                self.lifecycle_score(narrative.lifecycle_stage()),
                weights.lifecycle,
            ),
            line(
                ScoreComponent::CapitalFlow,
                ComponentInput::NetFlow(
                    has_flows.then(|| narrative.recent_net_flow(self.config.flow_lookback)),
                ),
                self.capital_flow_score(narrative),
                weights.capital_flow,
            ),
            line(
                ScoreComponent::RegimeAlignment,
                ComponentInput::Alignment {
                    regime,
                    score: regime_score,
                },
                regime_score,
                weights.regime_alignment,
            ),
            line(
                ScoreComponent::FlowMomentum,
                ComponentInput::MomentumChange(self.momentum_change(narrative)),
                self.flow_momentum_score(narrative),
                weights.flow_momentum,
            ),
        ])
    }

    fn total(components: &[ComponentScore]) -> f64 {
        let total: f64 = components.iter().map(|c| c.contribution).sum();
        if total.is_nan() { 0.0 } else { total.clamp(0.0, 100.0) }
    }

    fn reasoning(&self, narrative: &Narrative, regime: RegimeType) -> String {
        let stage = narrative.lifecycle_stage();
        let mut reasons = Vec::new();

        if stage.is_early() {
            reasons.push(format!(
                "Early stage ({stage}) indicates high alpha potential before consensus pricing"
            ));
        } else {
            reasons.push(format!(
                "Late stage ({stage}) suggests limited alpha as consensus pricing may be established"
            ));
        }

        if narrative.capital_flows().is_empty() {
            reasons.push("No capital flow history yet".to_string());
        } else {
            let net = narrative.recent_net_flow(self.config.flow_lookback);
            match net.partial_cmp(&0.0) {
                Some(Ordering::Greater) => reasons.push(format!(
                    "Positive capital flows ({}) show conviction",
                    format_dollars(net)
                )),
                Some(Ordering::Less) => reasons.push(format!(
                    "Negative capital flows ({}) indicate weakness",
                    format_dollars(net)
                )),
                _ => reasons.push("Flat capital flows ($0) show no conviction".to_string()),
            }
        }

        if let Some(score) = narrative.regime_score(regime) {
            if score > STRONG_ALIGNMENT {
                reasons.push(format!(
                    "Strong regime alignment ({score:.1}%) with current {regime} regime"
                ));
            } else if score < WEAK_ALIGNMENT {
                reasons.push(format!(
                    "Weak regime alignment ({score:.1}%) with current {regime} regime"
                ));
            }
        }

        reasons.join("; ")
    }
}

/// Whole-dollar amount with thousands separators, e.g. `-$1,250,000`
pub fn format_dollars(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn ctx() -> AnalysisContext {
        AnalysisContext::new(t0() + Duration::days(1)).with_regime(RegimeType::Expansion)
    }

    fn narrative(id: &str, stage: LifecycleStage, alignment: f64, nets: &[f64]) -> Narrative {
        let flows = nets.iter().enumerate().map(|(i, net)| {
            CapitalFlow::new(
                id,
                t0() + Duration::hours(i as i64),
                net.max(0.0),
                (-net).max(0.0),
                *net,
                net.abs(),
            )
            .unwrap()
        });

        Narrative::builder(id, id)
            .created_at(t0())
            .lifecycle_stage(stage)
            .regime_alignment(RegimeType::Expansion, alignment)
            .capital_flows(flows)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_history_is_neutral() {
        let ranker = AlphaRanker::default();
        let n = narrative("new", LifecycleStage::Formation, 50.0, &[]);

        assert_eq!(ranker.capital_flow_score(&n), NEUTRAL_SCORE);
        assert_eq!(ranker.flow_momentum_score(&n), NEUTRAL_SCORE);
        assert_eq!(ranker.momentum_change(&n), None);

        // 40 + 15 + 10 + 5
        assert!((ranker.score(&n, &ctx()).unwrap() - 70.0).abs() < EXPLAIN_EPSILON);
    }

    #[test]
    fn test_capital_flow_score_saturates() {
        let ranker = AlphaRanker::default();
        let half = narrative("half", LifecycleStage::Maturity, 50.0, &[50_000_000.0]);
        let huge = narrative("huge", LifecycleStage::Maturity, 50.0, &[5e9]);
        let outflow = narrative("out", LifecycleStage::Maturity, 50.0, &[-5e6]);

        assert!((ranker.capital_flow_score(&half) - 50.0).abs() < 1e-12);
        assert_eq!(ranker.capital_flow_score(&huge), 100.0);
        assert_eq!(ranker.capital_flow_score(&outflow), 0.0);
    }

    #[test]
    fn test_accelerating_flows_have_high_momentum() {
        let ranker = AlphaRanker::default();
        let rising = narrative("rising", LifecycleStage::Formation, 50.0, &[100.0, 200.0, 300.0]);
        let reversing = narrative("reversing", LifecycleStage::Formation, 50.0, &[100.0, -100.0]);
        let flat = narrative("flat", LifecycleStage::Formation, 50.0, &[0.0, 0.0]);

        // 300 against 200: change of 0.2
        assert!((ranker.flow_momentum_score(&rising) - 60.0).abs() < 1e-9);
        assert!(ranker.flow_momentum_score(&rising) > NEUTRAL_SCORE);
        assert_eq!(ranker.flow_momentum_score(&reversing), 0.0);
        assert_eq!(ranker.flow_momentum_score(&flat), NEUTRAL_SCORE);
    }

    #[test]
    fn test_momentum_compares_equal_windows() {
        let ranker = AlphaRanker::default();
        // Windows of three: [3, 3, 3] against [1, 1, 1]
        let n = narrative(
            "n",
            LifecycleStage::Formation,
            50.0,
            &[9.0, 1.0, 1.0, 1.0, 3.0, 3.0, 3.0],
        );
        let change = ranker.momentum_change(&n).unwrap();
        assert!((change - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_alignment_is_precondition_error() {
        let ranker = AlphaRanker::default();
        let n = Narrative::builder("raw", "Raw").created_at(t0()).build().unwrap();

        let err = ranker.score(&n, &ctx()).unwrap_err();
        assert!(matches!(err, NarrativeError::Precondition(_)));
    }

    #[test]
    fn test_regime_required() {
        let ranker = AlphaRanker::default();
        let n = narrative("n", LifecycleStage::Formation, 50.0, &[]);
        let no_regime = AnalysisContext::new(t0());

        assert!(matches!(
            ranker.score(&n, &no_regime),
            Err(NarrativeError::Precondition(_))
        ));
        assert!(ranker.rank_narratives(&[n], &no_regime).is_err());
    }

    #[test]
    fn test_invalid_weights_rejected_at_construction() {
        let config = RankerConfig {
            weights: ScoringWeights {
                lifecycle: 0.5,
                capital_flow: 0.3,
                regime_alignment: 0.2,
                flow_momentum: 0.1,
            },
            ..RankerConfig::default()
        };
        assert!(matches!(AlphaRanker::new(config), Err(NarrativeError::Config(_))));
    }

    #[test]
    fn test_score_bounds() {
        let ranker = AlphaRanker::default();
        let best = narrative("best", LifecycleStage::Formation, 100.0, &[1e9, 1e10]);
        let worst = narrative("worst", LifecycleStage::Decay, 0.0, &[1e9, -1e10]);

        let high = ranker.score(&best, &ctx()).unwrap();
        let low = ranker.score(&worst, &ctx()).unwrap();
        assert!((0.0..=100.0).contains(&high));
        assert!((0.0..=100.0).contains(&low));
        assert_eq!(low, 0.0);
    }

    #[test]
    fn test_overflowing_flow_sums_stay_bounded() {
        let ranker = AlphaRanker::default();
        for nets in [
            &[1e308, 1e308, 1e308, 1e308][..],
            &[-1e308, -1e308, 1e308, 1e308],
            &[1e308, 1e308, -1e308, -1e308],
        ] {
            let n = narrative("huge", LifecycleStage::Acceleration, 50.0, nets);
            let score = ranker.score(&n, &ctx()).unwrap();
            assert!((0.0..=100.0).contains(&score), "{nets:?} scored {score}");

            let change = ranker.momentum_change(&n).unwrap();
            assert!((-1.0..=1.0).contains(&change));
        }

        let steady = narrative("steady", LifecycleStage::Acceleration, 50.0, &[1e308; 4]);
        assert_eq!(ranker.momentum_change(&steady), Some(0.0));
        assert_eq!(ranker.capital_flow_score(&steady), 100.0);
    }

    #[test]
    fn test_formation_outranks_saturation() {
        let ranker = AlphaRanker::default();
        let narratives = vec![
            narrative("late", LifecycleStage::Saturation, 60.0, &[10.0, 20.0]),
            narrative("early", LifecycleStage::Formation, 60.0, &[10.0, 20.0]),
        ];

        let ranked = ranker.rank_narratives(&narratives, &ctx()).unwrap();
        assert_eq!(ranked[0].narrative.id(), "early");
        assert!(ranked[0].alpha_score > ranked[1].alpha_score);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_tie_break_on_stage() {
        let ranker = AlphaRanker::default();
        // 0.4 * 100 + 0.2 * 40 == 0.4 * 80 + 0.2 * 80
        let narratives = vec![
            narrative("b-accel", LifecycleStage::Acceleration, 80.0, &[]),
            narrative("a-form", LifecycleStage::Formation, 40.0, &[]),
        ];

        let ranked = ranker.rank_narratives(&narratives, &ctx()).unwrap();
        assert_eq!(ranked[0].alpha_score, ranked[1].alpha_score);
        assert_eq!(ranked[0].narrative.id(), "a-form");
    }

    #[test]
    fn test_tie_break_on_net_flow_then_id() {
        let ranker = AlphaRanker::default();
        // Both saturate the capital flow component; single flows are momentum-neutral
        let narratives = vec![
            narrative("a-smaller", LifecycleStage::Maturity, 50.0, &[120_000_000.0]),
            narrative("z-larger", LifecycleStage::Maturity, 50.0, &[150_000_000.0]),
            narrative("m-twin", LifecycleStage::Maturity, 50.0, &[120_000_000.0]),
        ];

        let ranked = ranker.rank_narratives(&narratives, &ctx()).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.narrative.id()).collect();
        assert_eq!(ids, vec!["z-larger", "a-smaller", "m-twin"]);

        // Reproducible regardless of input order
        let reversed: Vec<Narrative> = narratives.iter().rev().cloned().collect();
        let again = ranker.rank_narratives(&reversed, &ctx()).unwrap();
        let again_ids: Vec<&str> = again.iter().map(|r| r.narrative.id()).collect();
        assert_eq!(ids, again_ids);
    }

    #[test]
    fn test_top_opportunities() {
        let ranker = AlphaRanker::default();
        let narratives = vec![
            narrative("formation", LifecycleStage::Formation, 50.0, &[]),
            narrative("acceleration", LifecycleStage::Acceleration, 50.0, &[]),
            narrative("maturity", LifecycleStage::Maturity, 100.0, &[]),
            narrative("decay", LifecycleStage::Decay, 100.0, &[]),
        ];

        let top = ranker.get_top_opportunities(&narratives, 2, false, &ctx()).unwrap();
        assert_eq!(top.len(), 2);

        let early = ranker.get_top_opportunities(&narratives, 10, true, &ctx()).unwrap();
        assert_eq!(early.len(), 2);
        assert!(early.iter().all(|r| r.narrative.is_early_stage()));
        assert_eq!(early[1].rank, 2);

        let none = ranker.get_top_opportunities(&narratives, 0, false, &ctx()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_min_alpha_filter() {
        let ranker = AlphaRanker::default();
        let narratives = vec![
            narrative("strong", LifecycleStage::Formation, 100.0, &[]),
            narrative("weak", LifecycleStage::Decay, 0.0, &[]),
        ];
        let filter = RankingFilter {
            early_stage_only: false,
            min_alpha_score: Some(50.0),
        };

        let ranked = ranker.rank_filtered(&narratives, &filter, &ctx()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].narrative.id(), "strong");
    }

    #[test]
    fn test_explain_reconciles_with_score() {
        let ranker = AlphaRanker::default();
        let n = narrative(
            "ai",
            LifecycleStage::Acceleration,
            73.0,
            &[1_200_000.0, 3_400_000.0, 2_100_000.0, 5_600_000.0],
        );

        let score = ranker.score(&n, &ctx()).unwrap();
        let breakdown = ranker.explain(&n, &ctx()).unwrap();
        assert_eq!(breakdown.components.len(), 4);
        assert!((breakdown.contribution_total() - score).abs() < EXPLAIN_EPSILON);
        assert!((breakdown.alpha_score - score).abs() < EXPLAIN_EPSILON);

        let weight_sum: f64 = breakdown.components.iter().map(|c| c.weight).sum();
        assert!((weight_sum - 1.0).abs() < EXPLAIN_EPSILON);

        let lifecycle = breakdown.component(ScoreComponent::Lifecycle).unwrap();
        assert_eq!(lifecycle.input, ComponentInput::Stage(LifecycleStage::Acceleration));
        assert_eq!(lifecycle.score, 80.0);
    }

    #[test]
    fn test_reasoning() {
        let ranker = AlphaRanker::default();
        let n = narrative("ai", LifecycleStage::Formation, 80.0, &[1_250_000.0]);
        let reasoning = ranker.explain(&n, &ctx()).unwrap().reasoning;
        assert_eq!(
            reasoning,
            "Early stage (formation) indicates high alpha potential before consensus pricing; \
             Positive capital flows ($1,250,000) show conviction; \
             Strong regime alignment (80.0%) with current expansion regime"
        );

        let late = narrative("old", LifecycleStage::Decay, 20.0, &[-3_000.0]);
        let reasoning = ranker.explain(&late, &ctx()).unwrap().reasoning;
        assert!(reasoning.starts_with("Late stage (decay)"));
        assert!(reasoning.contains("Negative capital flows (-$3,000) indicate weakness"));
        assert!(reasoning.contains("Weak regime alignment (20.0%)"));
    }

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(0.0), "$0");
        assert_eq!(format_dollars(999.4), "$999");
        assert_eq!(format_dollars(1_000.0), "$1,000");
        assert_eq!(format_dollars(12_345_678.0), "$12,345,678");
        assert_eq!(format_dollars(-20_000_000.0), "-$20,000,000");
    }
}
