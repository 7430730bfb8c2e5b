//! Lifecycle stage and regime alignment classification
//!
//! [`NarrativeClassifier`] keeps the registry of tracked narratives and
//! recomputes each one's lifecycle stage and per-regime alignment from its
//! capital flows, attention history and age. Classification is a pure
//! function of those inputs: nothing is locked in between calls, and a
//! narrative whose history changes can move back to an earlier stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::context::AnalysisContext;
use crate::error::{NarrativeError, Result};
use crate::models::{AttentionSample, CapitalFlow, LifecycleStage, Narrative, RegimeType};

/// Inputs to stage banding, derived from a narrative's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSignals {
    /// Recent mean net flow versus the all-time mean, scaled by mean |net flow|
    pub capital_velocity: f64,
    /// Current attention minus the mean of the preceding readings
    pub attention_velocity: f64,
    /// Hours between creation and the evaluation instant
    pub time_active_hours: f64,
    /// Sum of net flow over the lookback window
    pub recent_net_flow: f64,
    pub flow_count: usize,
}

/// Result of classifying one narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub narrative_id: String,
    pub stage: LifecycleStage,
    pub regime_alignment: BTreeMap<RegimeType, f64>,
    pub signals: StageSignals,
}

/// Tag affinity of one regime
struct RegimeAffinity {
    regime: RegimeType,
    tags: &'static [&'static str],
    matched: f64,
    unmatched: f64,
}

const REGIME_AFFINITIES: [RegimeAffinity; 6] = [
    RegimeAffinity {
        regime: RegimeType::Expansion,
        tags: &["growth", "tech", "innovation", "expansion"],
        matched: 80.0,
        unmatched: 40.0,
    },
    RegimeAffinity {
        regime: RegimeType::Recession,
        tags: &["defensive", "value", "quality", "safe-haven"],
        matched: 80.0,
        unmatched: 30.0,
    },
    RegimeAffinity {
        regime: RegimeType::Inflation,
        tags: &["commodities", "real-estate", "pricing-power", "inflation"],
        matched: 80.0,
        unmatched: 40.0,
    },
    RegimeAffinity {
        regime: RegimeType::Deflation,
        tags: &["bonds", "cash", "treasuries", "quality", "deflation"],
        matched: 70.0,
        unmatched: 30.0,
    },
    RegimeAffinity {
        regime: RegimeType::Volatility,
        tags: &["hedge", "options", "volatility", "protection"],
        matched: 90.0,
        unmatched: 30.0,
    },
    RegimeAffinity {
        regime: RegimeType::Stability,
        tags: &["momentum", "trend", "growth", "stability"],
        matched: 70.0,
        unmatched: 50.0,
    },
];

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Largest absolute net flow, used to keep sums of huge flows finite
fn flow_scale(flows: &[CapitalFlow]) -> f64 {
    flows.iter().map(|f| f.net_flow().abs()).fold(0.0, f64::max)
}

fn capital_velocity(flows: &[CapitalFlow], window: usize) -> f64 {
    let n = flows.len();
    let scale = flow_scale(flows);
    if n < 2 || scale == 0.0 {
        return 0.0;
    }

    // Flows divided by `scale` keep the sums finite; the ratio is unchanged
    let scaled = |f: &CapitalFlow| f.net_flow() / scale;
    let recent_len = window.clamp(1, n - 1);
    let baseline = mean(flows.iter().map(scaled));
    let recent = mean(flows[n - recent_len..].iter().map(scaled));
    let magnitude = mean(flows.iter().map(|f| scaled(f).abs())).max(1.0 / scale);

    (recent - baseline) / magnitude
}

/// Latest attention reading minus the mean of up to `window` prior readings
///
/// `current` is the narrative's current attention scalar. When it differs
/// from the last recorded sample it is treated as a newer, unrecorded
/// reading. A lone reading has no trend and yields 0.
fn attention_velocity(samples: &[AttentionSample], current: f64, window: usize) -> f64 {
    let mut readings: Vec<f64> = samples.iter().map(|s| s.attention).collect();
    if readings.last() != Some(&current) {
        readings.push(current);
    }

    let Some((latest, earlier)) = readings.split_last() else {
        return 0.0;
    };
    if earlier.is_empty() {
        return 0.0;
    }

    let start = earlier.len().saturating_sub(window);
    latest - mean(earlier[start..].iter().copied())
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
}

fn not_found(id: &str) -> NarrativeError {
    NarrativeError::NotFound(format!("narrative '{id}'"))
}

/// Classifier and registry of tracked narratives
#[derive(Debug, Default)]
pub struct NarrativeClassifier {
    config: ClassifierConfig,
    narratives: BTreeMap<String, Narrative>,
}

impl NarrativeClassifier {
    /// Create a classifier with the default calibration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with a custom calibration
    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            narratives: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Register a new narrative
    pub fn add_narrative(&mut self, narrative: Narrative) -> Result<()> {
        if self.narratives.contains_key(narrative.id()) {
            return Err(NarrativeError::Conflict(format!(
                "narrative '{}'",
                narrative.id()
            )));
        }

        info!(narrative_id = narrative.id(), "Registered narrative");
        self.narratives.insert(narrative.id().to_string(), narrative);
        Ok(())
    }

    pub fn get_narrative(&self, id: &str) -> Option<&Narrative> {
        self.narratives.get(id)
    }

    /// Registered narratives in id order
    pub fn narratives(&self) -> impl Iterator<Item = &Narrative> {
        self.narratives.values()
    }

    /// Owned copies of every registered narrative, for handing to the ranker
    pub fn snapshot(&self) -> Vec<Narrative> {
        self.narratives.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.narratives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.narratives.is_empty()
    }

    /// Append a flow observation to a registered narrative
    pub fn add_capital_flow(&mut self, id: &str, flow: CapitalFlow) -> Result<()> {
        self.narratives
            .get_mut(id)
            .ok_or_else(|| not_found(id))?
            .add_capital_flow(flow)
    }

    /// Append an attention reading to a registered narrative
    pub fn record_attention(&mut self, id: &str, sample: AttentionSample) -> Result<()> {
        self.narratives
            .get_mut(id)
            .ok_or_else(|| not_found(id))?
            .record_attention(sample)
    }

    /// Recompute stage and alignment of a registered narrative in place
    pub fn update_narrative(&mut self, id: &str, ctx: &AnalysisContext) -> Result<&Narrative> {
        let narrative = self.narratives.get(id).ok_or_else(|| not_found(id))?;
        let classification = self.classify(narrative, ctx)?;

        let narrative = self.narratives.get_mut(id).ok_or_else(|| not_found(id))?;
        narrative.apply_classification(
            classification.stage,
            &classification.regime_alignment,
            ctx.as_of(),
        );
        Ok(narrative)
    }

    /// Reclassify every registered narrative; returns how many were updated
    pub fn update_all(&mut self, ctx: &AnalysisContext) -> Result<usize> {
        let regime = ctx.regime()?;

        let ids: Vec<String> = self.narratives.keys().cloned().collect();
        for id in &ids {
            self.update_narrative(id, ctx)?;
        }

        info!(count = ids.len(), %regime, "Classified narratives");
        Ok(ids.len())
    }

    /// Classify a narrative without mutating it
    pub fn classify(
        &self,
        narrative: &Narrative,
        ctx: &AnalysisContext,
    ) -> Result<Classification> {
        ctx.regime()?;

        let signals = self.stage_signals(narrative, ctx.as_of());
        let stage = self.detect_lifecycle_stage(&signals);
        let regime_alignment = self.regime_alignment(narrative, stage, signals.recent_net_flow);

        debug!(
            narrative_id = narrative.id(),
            %stage,
            capital_velocity = signals.capital_velocity,
            attention_velocity = signals.attention_velocity,
            time_active_hours = signals.time_active_hours,
            "Classified narrative"
        );

        Ok(Classification {
            narrative_id: narrative.id().to_string(),
            stage,
            regime_alignment,
            signals,
        })
    }

    /// Derive stage signals from a narrative's history at `as_of`
    pub fn stage_signals(&self, narrative: &Narrative, as_of: DateTime<Utc>) -> StageSignals {
        let flows = narrative.flows_chronological();
        let samples = narrative.attention_chronological();
        let recent_start = flows.len().saturating_sub(self.config.flow_lookback);

        StageSignals {
            capital_velocity: capital_velocity(&flows, self.config.velocity_window),
            attention_velocity: attention_velocity(
                &samples,
                narrative.attention_score(),
                self.config.attention_window,
            ),
            time_active_hours: hours_between(narrative.created_at(), as_of),
            recent_net_flow: flows[recent_start..].iter().map(CapitalFlow::net_flow).sum(),
            flow_count: flows.len(),
        }
    }

    /// Band stage signals into a lifecycle stage
    ///
    /// Rules are checked in order and the first match wins:
    /// 1. net outflow with no recovery in velocity: Decay
    /// 2. young, low capital, non-negative velocities: Formation
    /// 3. any other narrative younger than the formation window: Acceleration
    /// 4. strong capital velocity with non-falling attention: Acceleration
    /// 5. declining capital velocity: Saturation
    /// 6. old or heavily capitalised with flat velocity: Maturity
    /// 7. anything else: Acceleration
    ///
    /// Saturation and Maturity are only reachable once a narrative has
    /// outlived the formation window.
    pub fn detect_lifecycle_stage(&self, signals: &StageSignals) -> LifecycleStage {
        let t = &self.config.thresholds;
        let cv = signals.capital_velocity;
        let av = signals.attention_velocity;
        let net = signals.recent_net_flow;
        let age = signals.time_active_hours;
        let young = age < t.formation_max_age_hours;

        if net < 0.0 && cv <= 0.0 {
            LifecycleStage::Decay
        } else if young && cv >= 0.0 && av >= 0.0 && net < t.formation_max_net_flow {
            LifecycleStage::Formation
        } else if young
            || (cv >= t.acceleration_min_capital_velocity
                && av >= t.acceleration_min_attention_velocity)
        {
            LifecycleStage::Acceleration
        } else if cv < -t.plateau_velocity_band {
            LifecycleStage::Saturation
        } else if age >= t.maturity_min_age_hours || net >= t.maturity_min_net_flow {
            LifecycleStage::Maturity
        } else {
            LifecycleStage::Acceleration
        }
    }

    /// Alignment of a narrative with every regime, each in [0, 100]
    ///
    /// Scores are independent of each other and of the active regime.
    pub fn regime_alignment(
        &self,
        narrative: &Narrative,
        stage: LifecycleStage,
        recent_net_flow: f64,
    ) -> BTreeMap<RegimeType, f64> {
        let tags: BTreeSet<String> = narrative
            .tags()
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .collect();
        let tilt = (recent_net_flow / self.config.max_meaningful_flow).clamp(-1.0, 1.0)
            * self.config.regime_flow_adjustment;

        REGIME_AFFINITIES
            .iter()
            .map(|affinity| {
                let mut score = if affinity.tags.iter().any(|tag| tags.contains(*tag)) {
                    affinity.matched
                } else {
                    affinity.unmatched
                };

                match affinity.regime {
                    RegimeType::Expansion => score += tilt,
                    RegimeType::Recession => score -= tilt,
                    RegimeType::Volatility if stage == LifecycleStage::Formation => {
                        score += self.config.formation_volatility_bonus;
                    }
                    _ => {}
                }

                (affinity.regime, score.clamp(0.0, 100.0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn ctx_at(hours: i64) -> AnalysisContext {
        AnalysisContext::new(t0() + Duration::hours(hours)).with_regime(RegimeType::Expansion)
    }

    fn flows(id: &str, nets: &[f64]) -> Vec<CapitalFlow> {
        nets.iter()
            .enumerate()
            .map(|(i, net)| {
                CapitalFlow::new(
                    id,
                    t0() + Duration::hours(i as i64),
                    net.max(0.0),
                    (-net).max(0.0),
                    *net,
                    net.abs() * 2.0,
                )
                .unwrap()
            })
            .collect()
    }

    fn narrative(id: &str, nets: &[f64]) -> Narrative {
        Narrative::builder(id, id)
            .created_at(t0())
            .capital_flows(flows(id, nets))
            .build()
            .unwrap()
    }

    fn stage_at(narrative: &Narrative, hours: i64) -> LifecycleStage {
        NarrativeClassifier::new()
            .classify(narrative, &ctx_at(hours))
            .unwrap()
            .stage
    }

    #[test]
    fn test_new_narrative_is_formation() {
        let n = narrative("fresh", &[]);
        let classification = NarrativeClassifier::new().classify(&n, &ctx_at(0)).unwrap();

        assert_eq!(classification.stage, LifecycleStage::Formation);
        assert_eq!(classification.signals.capital_velocity, 0.0);
        assert_eq!(classification.signals.attention_velocity, 0.0);
        assert_eq!(classification.regime_alignment.len(), RegimeType::ALL.len());
        // Formation bonus on top of the unmatched Volatility base
        assert_eq!(classification.regime_alignment[&RegimeType::Volatility], 40.0);
    }

    #[test]
    fn test_increasing_young_flows_are_early_stage() {
        let n = narrative("rising", &[100.0, 200.0, 300.0]);
        let classification = NarrativeClassifier::new().classify(&n, &ctx_at(3)).unwrap();

        assert!((classification.signals.capital_velocity - 0.25).abs() < 1e-12);
        assert_eq!(classification.signals.recent_net_flow, 600.0);
        assert_eq!(classification.stage, LifecycleStage::Formation);
    }

    #[test]
    fn test_large_young_inflow_accelerates() {
        let n = narrative("hot", &[1_000_000.0, 2_000_000.0, 3_000_000.0]);
        assert_eq!(stage_at(&n, 3), LifecycleStage::Acceleration);
    }

    #[test]
    fn test_rising_flows_after_formation_window_accelerate() {
        let n = narrative("growing", &[1.0, 2.0, 4.0, 8.0]);
        assert_eq!(stage_at(&n, 240), LifecycleStage::Acceleration);
    }

    #[test]
    fn test_declining_inflows_saturate() {
        let n = narrative("crowded", &[10.0, 8.0, 6.0, 4.0, 2.0]);
        let classifier = NarrativeClassifier::new();
        let signals = classifier.stage_signals(&n, t0() + Duration::days(60));
        assert!((signals.capital_velocity + 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(classifier.detect_lifecycle_stage(&signals), LifecycleStage::Saturation);
    }

    #[test]
    fn test_flat_old_narrative_matures() {
        let n = narrative("steady", &[5.0, 5.0, 5.0]);
        assert_eq!(stage_at(&n, 24 * 60), LifecycleStage::Maturity);

        let idle = narrative("idle", &[]);
        assert_eq!(stage_at(&idle, 24 * 60), LifecycleStage::Maturity);
    }

    #[test]
    fn test_sustained_outflow_decays() {
        let n = narrative("fading", &[-5.0, -5.0, -5.0]);
        assert_eq!(stage_at(&n, 2), LifecycleStage::Decay);
        assert_eq!(stage_at(&n, 24 * 60), LifecycleStage::Decay);
    }

    #[test]
    fn test_stage_can_move_backwards() {
        let n = Narrative::builder("reborn", "Reborn")
            .created_at(t0())
            .lifecycle_stage(LifecycleStage::Saturation)
            .build()
            .unwrap();

        let mut classifier = NarrativeClassifier::new();
        classifier.add_narrative(n).unwrap();
        let updated = classifier.update_narrative("reborn", &ctx_at(1)).unwrap();
        assert_eq!(updated.lifecycle_stage(), LifecycleStage::Formation);
    }

    #[test]
    fn test_attention_velocity() {
        let mut n = narrative("buzz", &[]);
        for (i, attention) in [0.2, 0.2, 0.2, 0.8].iter().enumerate() {
            n.record_attention(AttentionSample::new(
                t0() + Duration::minutes(i as i64),
                *attention,
                0.0,
            ))
            .unwrap();
        }

        let signals = NarrativeClassifier::new().stage_signals(&n, t0());
        assert!((signals.attention_velocity - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_current_attention_is_newest_reading() {
        let history = |current: f64| {
            Narrative::builder("buzz", "Buzz")
                .created_at(t0())
                .attention_sample(AttentionSample::new(t0(), 0.2, 0.0))
                .attention_sample(AttentionSample::new(t0() + Duration::minutes(1), 0.2, 0.0))
                .attention_score(current)
                .build()
                .unwrap()
        };
        let classifier = NarrativeClassifier::new();

        let rising = classifier.stage_signals(&history(0.8), t0());
        assert!((rising.attention_velocity - 0.6).abs() < 1e-12);

        let fading = classifier.stage_signals(&history(0.0), t0());
        assert!((fading.attention_velocity + 0.2).abs() < 1e-12);

        // A lone scalar has nothing to trend against
        let lone = Narrative::builder("lone", "Lone")
            .created_at(t0())
            .attention_score(0.9)
            .build()
            .unwrap();
        assert_eq!(classifier.stage_signals(&lone, t0()).attention_velocity, 0.0);
    }

    #[test]
    fn test_young_narratives_never_reach_late_stages() {
        // Rising flows well above the formation ceiling
        let rising = narrative("rising", &[10e6, 11e6, 12e6]);
        let classification = NarrativeClassifier::new().classify(&rising, &ctx_at(3)).unwrap();
        assert!(classification.signals.capital_velocity > 0.0);
        assert!(classification.signals.capital_velocity < 0.2);
        assert_eq!(classification.stage, LifecycleStage::Acceleration);

        // Cooling but still positive inflows
        let cooling = narrative("cooling", &[10.0, 8.0, 6.0]);
        assert!(stage_at(&cooling, 3).is_early());

        // The same histories are late-stage once the narrative is old
        assert_eq!(stage_at(&rising, 24 * 40), LifecycleStage::Maturity);
        assert_eq!(stage_at(&cooling, 24 * 40), LifecycleStage::Saturation);
    }

    #[test]
    fn test_extreme_flows_keep_signals_finite() {
        let classifier = NarrativeClassifier::new();
        // Each flow is finite but their sums overflow
        for nets in [&[8e307, 8e307, 8e307][..], &[8e307, -8e307, 8e307, 8e307]] {
            let n = narrative("huge", nets);
            let signals = classifier.stage_signals(&n, t0() + Duration::hours(3));
            assert!(signals.capital_velocity.is_finite());
            assert!(signals.attention_velocity.is_finite());
        }

        let flat = narrative("flat", &[8e307, 8e307, 8e307]);
        let signals = classifier.stage_signals(&flat, t0() + Duration::hours(3));
        assert_eq!(signals.capital_velocity, 0.0);
        assert_eq!(classifier.detect_lifecycle_stage(&signals), LifecycleStage::Acceleration);
    }

    #[test]
    fn test_out_of_order_flows_are_resorted() {
        let ordered = narrative("ordered", &[100.0, 200.0, 300.0]);

        let mut shuffled_flows = flows("shuffled", &[100.0, 200.0, 300.0]);
        shuffled_flows.reverse();
        let shuffled = Narrative::builder("shuffled", "shuffled")
            .created_at(t0())
            .capital_flows(shuffled_flows)
            .build()
            .unwrap();

        let classifier = NarrativeClassifier::new();
        let a = classifier.classify(&ordered, &ctx_at(3)).unwrap();
        let b = classifier.classify(&shuffled, &ctx_at(3)).unwrap();
        assert_eq!(a.stage, b.stage);
        assert_eq!(a.signals, b.signals);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut classifier = NarrativeClassifier::new();
        classifier.add_narrative(narrative("ai", &[100.0, 200.0, 300.0])).unwrap();

        let first = classifier.update_narrative("ai", &ctx_at(5)).unwrap().clone();
        let second = classifier.update_narrative("ai", &ctx_at(5)).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.updated_at(), t0() + Duration::hours(5));
    }

    #[test]
    fn test_regime_required_for_classification() {
        let mut classifier = NarrativeClassifier::new();
        classifier.add_narrative(narrative("ai", &[])).unwrap();

        let ctx = AnalysisContext::new(t0());
        let err = classifier.update_narrative("ai", &ctx).unwrap_err();
        assert!(matches!(err, NarrativeError::Precondition(_)));
        assert!(classifier.get_narrative("ai").unwrap().regime_alignment().is_empty());
        assert!(classifier.update_all(&ctx).is_err());
    }

    #[test]
    fn test_registry_errors() {
        let mut classifier = NarrativeClassifier::new();
        classifier.add_narrative(narrative("ai", &[])).unwrap();

        let err = classifier.add_narrative(narrative("ai", &[1.0])).unwrap_err();
        assert!(matches!(err, NarrativeError::Conflict(_)));
        assert_eq!(classifier.get_narrative("ai").unwrap().capital_flows().len(), 0);

        let err = classifier.update_narrative("missing", &ctx_at(0)).unwrap_err();
        assert!(matches!(err, NarrativeError::NotFound(_)));

        let foreign = flows("other", &[1.0]).remove(0);
        assert!(matches!(
            classifier.add_capital_flow("ai", foreign),
            Err(NarrativeError::Validation(_))
        ));
        assert!(matches!(
            classifier.record_attention("missing", AttentionSample::new(t0(), 0.1, 0.0)),
            Err(NarrativeError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_all() {
        let mut classifier = NarrativeClassifier::new();
        classifier.add_narrative(narrative("a", &[1.0, 2.0])).unwrap();
        classifier.add_narrative(narrative("b", &[-1.0, -2.0])).unwrap();

        assert_eq!(classifier.update_all(&ctx_at(1)).unwrap(), 2);
        let snapshot = classifier.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|n| n.regime_alignment().len() == 6));
        assert_eq!(snapshot[1].lifecycle_stage(), LifecycleStage::Decay);
    }

    #[test]
    fn test_alignment_independent_of_active_regime() {
        let n = narrative("ai", &[100.0, 200.0]);
        let classifier = NarrativeClassifier::new();
        let as_of = t0() + Duration::hours(2);

        let expansion = classifier
            .classify(&n, &AnalysisContext::new(as_of).with_regime(RegimeType::Expansion))
            .unwrap();
        let recession = classifier
            .classify(&n, &AnalysisContext::new(as_of).with_regime(RegimeType::Recession))
            .unwrap();
        assert_eq!(expansion.regime_alignment, recession.regime_alignment);
    }

    #[test]
    fn test_tag_affinity_and_flow_tilt() {
        let n = Narrative::builder("growth", "Growth")
            .created_at(t0())
            .tags(["Growth", "DEFENSIVE"])
            .build()
            .unwrap();
        let classifier = NarrativeClassifier::new();

        let neutral = classifier.regime_alignment(&n, LifecycleStage::Maturity, 0.0);
        assert_eq!(neutral[&RegimeType::Expansion], 80.0);
        assert_eq!(neutral[&RegimeType::Recession], 80.0);
        assert_eq!(neutral[&RegimeType::Stability], 70.0);
        assert_eq!(neutral[&RegimeType::Inflation], 40.0);
        assert_eq!(neutral[&RegimeType::Volatility], 30.0);

        // Half the meaningful flow tilts five points toward Expansion
        let inflow = classifier.regime_alignment(&n, LifecycleStage::Maturity, 50_000_000.0);
        assert_eq!(inflow[&RegimeType::Expansion], 85.0);
        assert_eq!(inflow[&RegimeType::Recession], 75.0);

        // Tilt saturates at the configured adjustment
        let outflow = classifier.regime_alignment(&n, LifecycleStage::Maturity, -1e12);
        assert_eq!(outflow[&RegimeType::Expansion], 70.0);
        assert_eq!(outflow[&RegimeType::Recession], 90.0);
    }

    #[test]
    fn test_alignment_is_clamped() {
        let config = ClassifierConfig::builder()
            .regime_flow_adjustment(50.0)
            .formation_volatility_bonus(50.0)
            .build()
            .unwrap();
        let classifier = NarrativeClassifier::with_config(config).unwrap();
        let n = Narrative::builder("hedge", "Hedge")
            .created_at(t0())
            .tags(["hedge", "tech"])
            .build()
            .unwrap();

        let alignment = classifier.regime_alignment(&n, LifecycleStage::Formation, 1e12);
        assert_eq!(alignment[&RegimeType::Volatility], 100.0);
        assert_eq!(alignment[&RegimeType::Expansion], 100.0);
        assert_eq!(alignment[&RegimeType::Recession], 0.0);
    }
}
