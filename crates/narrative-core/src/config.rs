//! Calibration parameters for classification and ranking
//!
//! None of these values has a principled derivation; they are illustrative
//! defaults kept in one place so deployments can override them from JSON.

use crate::error::{NarrativeError, Result};
use crate::models::LifecycleStage;
use serde::{Deserialize, Serialize};

/// Allowed deviation of the weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Reference ceiling for a "meaningful" net flow, in currency units
pub const MAX_MEANINGFUL_FLOW: f64 = 100_000_000.0;

fn require(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(NarrativeError::Config(message.into()))
    }
}

/// Cutoffs that band stage signals into lifecycle stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    /// Narratives younger than this can still be in Formation
    pub formation_max_age_hours: f64,
    /// Recent net flow below which capital is still "low"
    pub formation_max_net_flow: f64,
    /// Capital velocity needed for Acceleration
    pub acceleration_min_capital_velocity: f64,
    /// Attention velocity needed for Acceleration
    pub acceleration_min_attention_velocity: f64,
    /// Capital velocity within +/- this band counts as flat
    pub plateau_velocity_band: f64,
    /// Narratives older than this are established
    pub maturity_min_age_hours: f64,
    /// Recent net flow above which capital is "high"
    pub maturity_min_net_flow: f64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            formation_max_age_hours: 72.0,
            formation_max_net_flow: 5_000_000.0,
            acceleration_min_capital_velocity: 0.2,
            acceleration_min_attention_velocity: 0.0,
            plateau_velocity_band: 0.1,
            maturity_min_age_hours: 720.0, // 30 days
            maturity_min_net_flow: 10_000_000.0,
        }
    }
}

impl StageThresholds {
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.formation_max_age_hours,
            self.formation_max_net_flow,
            self.acceleration_min_capital_velocity,
            self.acceleration_min_attention_velocity,
            self.plateau_velocity_band,
            self.maturity_min_age_hours,
            self.maturity_min_net_flow,
        ];
        require(
            values.iter().all(|v| v.is_finite()),
            "stage thresholds must be finite",
        )?;
        require(
            self.plateau_velocity_band >= 0.0,
            "plateau_velocity_band must not be negative",
        )?;
        require(
            self.formation_max_age_hours >= 0.0
                && self.formation_max_age_hours <= self.maturity_min_age_hours,
            "formation_max_age_hours must be between 0 and maturity_min_age_hours",
        )
    }
}

/// Configuration for the lifecycle and regime classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub thresholds: StageThresholds,
    /// Number of most recent flows compared against the full history
    pub velocity_window: usize,
    /// Number of prior attention samples the latest one is compared to
    pub attention_window: usize,
    /// Number of most recent flows summed into the recent net flow
    pub flow_lookback: usize,
    /// Net flow that saturates the regime flow tilt
    pub max_meaningful_flow: f64,
    /// Maximum points the flow tilt adds to Expansion / removes from Recession
    pub regime_flow_adjustment: f64,
    /// Points added to Volatility alignment for Formation narratives
    pub formation_volatility_bonus: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thresholds: StageThresholds::default(),
            velocity_window: 3,
            attention_window: 3,
            flow_lookback: 24,
            max_meaningful_flow: MAX_MEANINGFUL_FLOW,
            regime_flow_adjustment: 10.0,
            formation_volatility_bonus: 10.0,
        }
    }
}

impl ClassifierConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder::default()
    }

    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        require(self.velocity_window > 0, "velocity_window must be greater than 0")?;
        require(self.attention_window > 0, "attention_window must be greater than 0")?;
        require(self.flow_lookback > 0, "flow_lookback must be greater than 0")?;
        require(
            self.max_meaningful_flow.is_finite() && self.max_meaningful_flow > 0.0,
            "max_meaningful_flow must be positive",
        )?;
        require(
            self.regime_flow_adjustment.is_finite() && self.regime_flow_adjustment >= 0.0,
            "regime_flow_adjustment must not be negative",
        )?;
        require(
            self.formation_volatility_bonus.is_finite() && self.formation_volatility_bonus >= 0.0,
            "formation_volatility_bonus must not be negative",
        )
    }
}

/// Builder for ClassifierConfig
#[derive(Debug, Default)]
pub struct ClassifierConfigBuilder {
    thresholds: Option<StageThresholds>,
    velocity_window: Option<usize>,
    attention_window: Option<usize>,
    flow_lookback: Option<usize>,
    max_meaningful_flow: Option<f64>,
    regime_flow_adjustment: Option<f64>,
    formation_volatility_bonus: Option<f64>,
}

impl ClassifierConfigBuilder {
    pub fn thresholds(mut self, thresholds: StageThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn velocity_window(mut self, window: usize) -> Self {
        self.velocity_window = Some(window);
        self
    }

    pub fn attention_window(mut self, window: usize) -> Self {
        self.attention_window = Some(window);
        self
    }

    pub fn flow_lookback(mut self, lookback: usize) -> Self {
        self.flow_lookback = Some(lookback);
        self
    }

    pub fn max_meaningful_flow(mut self, flow: f64) -> Self {
        self.max_meaningful_flow = Some(flow);
        self
    }

    pub fn regime_flow_adjustment(mut self, points: f64) -> Self {
        self.regime_flow_adjustment = Some(points);
        self
    }

    pub fn formation_volatility_bonus(mut self, points: f64) -> Self {
        self.formation_volatility_bonus = Some(points);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClassifierConfig> {
        let defaults = ClassifierConfig::default();

        let config = ClassifierConfig {
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
            velocity_window: self.velocity_window.unwrap_or(defaults.velocity_window),
            attention_window: self.attention_window.unwrap_or(defaults.attention_window),
            flow_lookback: self.flow_lookback.unwrap_or(defaults.flow_lookback),
            max_meaningful_flow: self.max_meaningful_flow.unwrap_or(defaults.max_meaningful_flow),
            regime_flow_adjustment: self
                .regime_flow_adjustment
                .unwrap_or(defaults.regime_flow_adjustment),
            formation_volatility_bonus: self
                .formation_volatility_bonus
                .unwrap_or(defaults.formation_volatility_bonus),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Weights of the four alpha score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub lifecycle: f64,
    pub capital_flow: f64,
    pub regime_alignment: f64,
    pub flow_momentum: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            lifecycle: 0.40,
            capital_flow: 0.30,
            regime_alignment: 0.20,
            flow_momentum: 0.10,
        }
    }
}

impl ScoringWeights {
    /// Create validated weights
    pub fn new(
        lifecycle: f64,
        capital_flow: f64,
        regime_alignment: f64,
        flow_momentum: f64,
    ) -> Result<Self> {
        let weights = Self {
            lifecycle,
            capital_flow,
            regime_alignment,
            flow_momentum,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn sum(&self) -> f64 {
        self.lifecycle + self.capital_flow + self.regime_alignment + self.flow_momentum
    }

    /// Each weight must lie in [0, 1] and together they must sum to 1.0
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.lifecycle,
            self.capital_flow,
            self.regime_alignment,
            self.flow_momentum,
        ];
        require(
            all.iter().all(|w| w.is_finite() && (0.0..=1.0).contains(w)),
            "each scoring weight must be within [0, 1]",
        )?;
        let sum = self.sum();
        require(
            (sum - 1.0).abs() <= WEIGHT_TOLERANCE,
            format!("scoring weights must sum to 1.0, got {sum}"),
        )
    }
}

/// Explicit stage-to-score lookup for the lifecycle component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleScores {
    pub formation: f64,
    pub acceleration: f64,
    pub maturity: f64,
    pub saturation: f64,
    pub decay: f64,
}

impl Default for LifecycleScores {
    fn default() -> Self {
        Self {
            formation: 100.0,
            acceleration: 80.0,
            maturity: 40.0,
            saturation: 10.0,
            decay: 0.0,
        }
    }
}

impl LifecycleScores {
    pub fn score(&self, stage: LifecycleStage) -> f64 {
        match stage {
            LifecycleStage::Formation => self.formation,
            LifecycleStage::Acceleration => self.acceleration,
            LifecycleStage::Maturity => self.maturity,
            LifecycleStage::Saturation => self.saturation,
            LifecycleStage::Decay => self.decay,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(
            LifecycleStage::ALL
                .iter()
                .all(|stage| (0.0..=100.0).contains(&self.score(*stage))),
            "lifecycle scores must be within [0, 100]",
        )
    }
}

/// Configuration for the alpha ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub weights: ScoringWeights,
    pub lifecycle_scores: LifecycleScores,
    /// Net flow at which the capital flow component saturates at 100
    pub max_meaningful_flow: f64,
    /// Number of most recent flows summed into the recent net flow
    pub flow_lookback: usize,
    /// Size of each of the two windows compared for flow momentum
    pub momentum_window: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            lifecycle_scores: LifecycleScores::default(),
            max_meaningful_flow: MAX_MEANINGFUL_FLOW,
            flow_lookback: 24,
            momentum_window: 3,
        }
    }
}

impl RankerConfig {
    /// Create a new configuration builder
    pub fn builder() -> RankerConfigBuilder {
        RankerConfigBuilder::default()
    }

    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.lifecycle_scores.validate()?;
        require(
            self.max_meaningful_flow.is_finite() && self.max_meaningful_flow > 0.0,
            "max_meaningful_flow must be positive",
        )?;
        require(self.flow_lookback > 0, "flow_lookback must be greater than 0")?;
        require(self.momentum_window > 0, "momentum_window must be greater than 0")
    }
}

/// Builder for RankerConfig
#[derive(Debug, Default)]
pub struct RankerConfigBuilder {
    weights: Option<ScoringWeights>,
    lifecycle_scores: Option<LifecycleScores>,
    max_meaningful_flow: Option<f64>,
    flow_lookback: Option<usize>,
    momentum_window: Option<usize>,
}

impl RankerConfigBuilder {
    pub fn weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn lifecycle_scores(mut self, scores: LifecycleScores) -> Self {
        self.lifecycle_scores = Some(scores);
        self
    }

    pub fn max_meaningful_flow(mut self, flow: f64) -> Self {
        self.max_meaningful_flow = Some(flow);
        self
    }

    pub fn flow_lookback(mut self, lookback: usize) -> Self {
        self.flow_lookback = Some(lookback);
        self
    }

    pub fn momentum_window(mut self, window: usize) -> Self {
        self.momentum_window = Some(window);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RankerConfig> {
        let defaults = RankerConfig::default();

        let config = RankerConfig {
            weights: self.weights.unwrap_or(defaults.weights),
            lifecycle_scores: self.lifecycle_scores.unwrap_or(defaults.lifecycle_scores),
            max_meaningful_flow: self.max_meaningful_flow.unwrap_or(defaults.max_meaningful_flow),
            flow_lookback: self.flow_lookback.unwrap_or(defaults.flow_lookback),
            momentum_window: self.momentum_window.unwrap_or(defaults.momentum_window),
        };

        config.validate()?;
        Ok(config)
    }
}
