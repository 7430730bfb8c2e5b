//! Core domain model for narrative tracking
//!
//! A [`Narrative`] is a tracked market theme. It exclusively owns its
//! [`CapitalFlow`] history and its attention samples; the classifier writes
//! its [`LifecycleStage`] and per-[`RegimeType`] alignment, the ranker only
//! reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{NarrativeError, Result};

/// Macroeconomic regime a narrative can be aligned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeType {
    /// Economic growth, rising markets
    Expansion,
    /// Economic contraction, risk-off
    Recession,
    /// Rising prices, monetary tightening
    Inflation,
    /// Falling prices, deleveraging
    Deflation,
    /// High uncertainty, regime transition
    Volatility,
    /// Low volatility, established trends
    Stability,
}

impl RegimeType {
    /// Every regime, in declaration order
    pub const ALL: [RegimeType; 6] = [
        RegimeType::Expansion,
        RegimeType::Recession,
        RegimeType::Inflation,
        RegimeType::Deflation,
        RegimeType::Volatility,
        RegimeType::Stability,
    ];

    /// Lower-case regime name
    pub fn as_str(&self) -> &'static str {
        match self {
            RegimeType::Expansion => "expansion",
            RegimeType::Recession => "recession",
            RegimeType::Inflation => "inflation",
            RegimeType::Deflation => "deflation",
            RegimeType::Volatility => "volatility",
            RegimeType::Stability => "stability",
        }
    }
}

impl fmt::Display for RegimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegimeType {
    type Err = NarrativeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "expansion" => Ok(RegimeType::Expansion),
            "recession" => Ok(RegimeType::Recession),
            "inflation" => Ok(RegimeType::Inflation),
            "deflation" => Ok(RegimeType::Deflation),
            "volatility" => Ok(RegimeType::Volatility),
            "stability" => Ok(RegimeType::Stability),
            _ => Err(NarrativeError::InvalidRegime(s.to_string())),
        }
    }
}

/// Narrative lifecycle stage
///
/// Variants are declared from most to least alpha potential and the derived
/// `Ord` follows that order. It is only used to break ranking ties; it does
/// not constrain which stage a narrative may move to next.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    /// Early stage, pre-consensus
    #[default]
    Formation,
    /// Growing momentum, capital influx
    Acceleration,
    /// Peak attention, maximum capital
    Maturity,
    /// Consensus pricing, diminishing returns
    Saturation,
    /// Narrative breakdown, capital outflow
    Decay,
}

impl LifecycleStage {
    /// Every stage, from most to least alpha potential
    pub const ALL: [LifecycleStage; 5] = [
        LifecycleStage::Formation,
        LifecycleStage::Acceleration,
        LifecycleStage::Maturity,
        LifecycleStage::Saturation,
        LifecycleStage::Decay,
    ];

    /// Lower-case stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStage::Formation => "formation",
            LifecycleStage::Acceleration => "acceleration",
            LifecycleStage::Maturity => "maturity",
            LifecycleStage::Saturation => "saturation",
            LifecycleStage::Decay => "decay",
        }
    }

    /// Formation and Acceleration are the early, alpha-bearing stages
    pub fn is_early(&self) -> bool {
        matches!(self, LifecycleStage::Formation | LifecycleStage::Acceleration)
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStage {
    type Err = NarrativeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "formation" => Ok(LifecycleStage::Formation),
            "acceleration" => Ok(LifecycleStage::Acceleration),
            "maturity" => Ok(LifecycleStage::Maturity),
            "saturation" => Ok(LifecycleStage::Saturation),
            "decay" => Ok(LifecycleStage::Decay),
            _ => Err(NarrativeError::Validation(format!(
                "unknown lifecycle stage '{s}'"
            ))),
        }
    }
}

fn non_negative(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(NarrativeError::Validation(format!(
            "{field} must be a finite non-negative number, got {value}"
        )))
    }
}

fn finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NarrativeError::Validation(format!(
            "{field} must be finite, got {value}"
        )))
    }
}

/// One observation of money moving in or out of a narrative
///
/// `net_flow` is recorded as supplied. It is not required to equal
/// `inflow - outflow`; upstream connectors may fold adjustments into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CapitalFlowRecord")]
pub struct CapitalFlow {
    narrative_id: String,
    timestamp: DateTime<Utc>,
    inflow: f64,
    outflow: f64,
    net_flow: f64,
    volume: f64,
    sources: BTreeSet<String>,
}

impl CapitalFlow {
    /// Create a validated capital flow observation
    pub fn new(
        narrative_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        inflow: f64,
        outflow: f64,
        net_flow: f64,
        volume: f64,
    ) -> Result<Self> {
        Ok(Self {
            narrative_id: narrative_id.into(),
            timestamp,
            inflow: non_negative("inflow", inflow)?,
            outflow: non_negative("outflow", outflow)?,
            net_flow: finite("net_flow", net_flow)?,
            volume: non_negative("volume", volume)?,
            sources: BTreeSet::new(),
        })
    }

    /// Attach provenance tags (retail, institutional, etf, ...)
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn narrative_id(&self) -> &str {
        &self.narrative_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn inflow(&self) -> f64 {
        self.inflow
    }

    pub fn outflow(&self) -> f64 {
        self.outflow
    }

    pub fn net_flow(&self) -> f64 {
        self.net_flow
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn sources(&self) -> &BTreeSet<String> {
        &self.sources
    }

    /// Net flow per unit of traded volume, 0 when nothing traded
    pub fn net_to_volume(&self) -> f64 {
        if self.volume == 0.0 {
            0.0
        } else {
            self.net_flow / self.volume
        }
    }
}

#[derive(Debug, Deserialize)]
struct CapitalFlowRecord {
    narrative_id: String,
    timestamp: DateTime<Utc>,
    inflow: f64,
    outflow: f64,
    net_flow: f64,
    volume: f64,
    #[serde(default)]
    sources: BTreeSet<String>,
}

impl TryFrom<CapitalFlowRecord> for CapitalFlow {
    type Error = NarrativeError;

    fn try_from(record: CapitalFlowRecord) -> Result<Self> {
        Ok(CapitalFlow::new(
            record.narrative_id,
            record.timestamp,
            record.inflow,
            record.outflow,
            record.net_flow,
            record.volume,
        )?
        .with_sources(record.sources))
    }
}

/// Point-in-time attention and sentiment reading for a narrative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionSample {
    pub timestamp: DateTime<Utc>,
    /// Relative attention intensity, nominally 0 to 1
    pub attention: f64,
    /// Sentiment, nominally -1 to 1
    #[serde(default)]
    pub sentiment: f64,
}

impl AttentionSample {
    pub fn new(timestamp: DateTime<Utc>, attention: f64, sentiment: f64) -> Self {
        Self {
            timestamp,
            attention,
            sentiment,
        }
    }
}

/// A tracked financial market narrative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NarrativeRecord")]
pub struct Narrative {
    id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    lifecycle_stage: LifecycleStage,
    regime_alignment: BTreeMap<RegimeType, f64>,
    tags: BTreeSet<String>,
    related_assets: Vec<String>,
    capital_flows: Vec<CapitalFlow>,
    sentiment_score: f64,
    attention_score: f64,
    attention_history: Vec<AttentionSample>,
}

impl Narrative {
    /// Start building a narrative with the given id and display name
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> NarrativeBuilder {
        NarrativeBuilder::new(id, name)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn lifecycle_stage(&self) -> LifecycleStage {
        self.lifecycle_stage
    }

    /// Alignment score per regime; empty until the narrative is classified
    pub fn regime_alignment(&self) -> &BTreeMap<RegimeType, f64> {
        &self.regime_alignment
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn related_assets(&self) -> &[String] {
        &self.related_assets
    }

    /// Flow history in insertion order
    pub fn capital_flows(&self) -> &[CapitalFlow] {
        &self.capital_flows
    }

    /// Current sentiment, -1 (bearish) to 1 (bullish)
    ///
    /// Carried for presentation only. Sentiment is directional: a narrative
    /// can accelerate on bearish conviction, so stage banding reads attention
    /// intensity and leaves sentiment out.
    pub fn sentiment_score(&self) -> f64 {
        self.sentiment_score
    }

    /// Current attention; the newest reading in the attention velocity
    pub fn attention_score(&self) -> f64 {
        self.attention_score
    }

    pub fn attention_history(&self) -> &[AttentionSample] {
        &self.attention_history
    }

    /// Append a flow observation
    ///
    /// Fails if the flow is attributed to a different narrative.
    pub fn add_capital_flow(&mut self, flow: CapitalFlow) -> Result<()> {
        if flow.narrative_id != self.id {
            return Err(NarrativeError::Validation(format!(
                "capital flow for '{}' cannot be added to narrative '{}'",
                flow.narrative_id, self.id
            )));
        }

        self.touch(flow.timestamp);
        self.capital_flows.push(flow);
        Ok(())
    }

    /// Append an attention reading
    ///
    /// The reading becomes the current attention and sentiment unless an
    /// older-than-latest sample is being backfilled.
    pub fn record_attention(&mut self, sample: AttentionSample) -> Result<()> {
        finite("attention", sample.attention)?;
        finite("sentiment", sample.sentiment)?;

        let is_latest = self
            .attention_history
            .iter()
            .all(|existing| existing.timestamp <= sample.timestamp);
        if is_latest {
            self.attention_score = sample.attention;
            self.sentiment_score = sample.sentiment;
        }
        self.touch(sample.timestamp);
        self.attention_history.push(sample);
        Ok(())
    }

    /// Flows ordered by timestamp
    ///
    /// Borrows the stored history when it is already ordered and only
    /// re-sorts a copy when insertion order was violated.
    pub fn flows_chronological(&self) -> Cow<'_, [CapitalFlow]> {
        if self
            .capital_flows
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
        {
            Cow::Borrowed(&self.capital_flows)
        } else {
            let mut sorted = self.capital_flows.clone();
            sorted.sort_by_key(|flow| flow.timestamp);
            Cow::Owned(sorted)
        }
    }

    /// Attention samples ordered by timestamp
    pub fn attention_chronological(&self) -> Cow<'_, [AttentionSample]> {
        if self
            .attention_history
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
        {
            Cow::Borrowed(&self.attention_history)
        } else {
            let mut sorted = self.attention_history.clone();
            sorted.sort_by_key(|sample| sample.timestamp);
            Cow::Owned(sorted)
        }
    }

    /// Sum of net flow over the most recent `lookback` observations
    pub fn recent_net_flow(&self, lookback: usize) -> f64 {
        let flows = self.flows_chronological();
        let start = flows.len().saturating_sub(lookback);
        flows[start..].iter().map(CapitalFlow::net_flow).sum()
    }

    pub fn is_early_stage(&self) -> bool {
        self.lifecycle_stage.is_early()
    }

    /// Alignment score for a regime, if the narrative has been classified
    pub fn regime_score(&self, regime: RegimeType) -> Option<f64> {
        self.regime_alignment.get(&regime).copied()
    }

    /// Overwrite the classification state
    pub(crate) fn apply_classification(
        &mut self,
        stage: LifecycleStage,
        alignment: &BTreeMap<RegimeType, f64>,
        at: DateTime<Utc>,
    ) {
        self.lifecycle_stage = stage;
        self.regime_alignment = alignment
            .iter()
            .map(|(regime, score)| (*regime, score.clamp(0.0, 100.0)))
            .collect();
        self.touch(at);
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

/// Builder for [`Narrative`]
#[derive(Debug)]
pub struct NarrativeBuilder {
    id: String,
    name: String,
    description: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    lifecycle_stage: LifecycleStage,
    regime_alignment: BTreeMap<RegimeType, f64>,
    tags: BTreeSet<String>,
    related_assets: Vec<String>,
    capital_flows: Vec<CapitalFlow>,
    attention_history: Vec<AttentionSample>,
    sentiment_score: Option<f64>,
    attention_score: Option<f64>,
}

impl NarrativeBuilder {
    fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            created_at: None,
            updated_at: None,
            lifecycle_stage: LifecycleStage::default(),
            regime_alignment: BTreeMap::new(),
            tags: BTreeSet::new(),
            related_assets: Vec::new(),
            capital_flows: Vec::new(),
            attention_history: Vec::new(),
            sentiment_score: None,
            attention_score: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Creation time; defaults to now
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Last update time; defaults to the creation time
    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Initial stage guess from the ingestion side
    pub fn lifecycle_stage(mut self, stage: LifecycleStage) -> Self {
        self.lifecycle_stage = stage;
        self
    }

    /// Pre-computed alignment for one regime, clamped to [0, 100]
    pub fn regime_alignment(mut self, regime: RegimeType, score: f64) -> Self {
        self.regime_alignment.insert(regime, score);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn related_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_assets
            .extend(assets.into_iter().map(Into::into));
        self
    }

    pub fn capital_flow(mut self, flow: CapitalFlow) -> Self {
        self.capital_flows.push(flow);
        self
    }

    pub fn capital_flows(mut self, flows: impl IntoIterator<Item = CapitalFlow>) -> Self {
        self.capital_flows.extend(flows);
        self
    }

    pub fn attention_sample(mut self, sample: AttentionSample) -> Self {
        self.attention_history.push(sample);
        self
    }

    /// Current sentiment; overrides the latest attention sample's value
    pub fn sentiment_score(mut self, score: f64) -> Self {
        self.sentiment_score = Some(score);
        self
    }

    /// Current attention; overrides the latest attention sample's value
    pub fn attention_score(mut self, score: f64) -> Self {
        self.attention_score = Some(score);
        self
    }

    /// Build and validate the narrative
    pub fn build(self) -> Result<Narrative> {
        if self.id.trim().is_empty() {
            return Err(NarrativeError::Validation(
                "narrative id must not be empty".to_string(),
            ));
        }

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let updated_at = self.updated_at.unwrap_or(created_at);
        if updated_at < created_at {
            return Err(NarrativeError::Validation(format!(
                "narrative '{}' updated_at precedes created_at",
                self.id
            )));
        }

        for (regime, score) in &self.regime_alignment {
            finite(&format!("{regime} alignment"), *score)?;
        }

        let mut narrative = Narrative {
            id: self.id,
            name: self.name,
            description: self.description,
            created_at,
            updated_at,
            lifecycle_stage: self.lifecycle_stage,
            regime_alignment: self
                .regime_alignment
                .into_iter()
                .map(|(regime, score)| (regime, score.clamp(0.0, 100.0)))
                .collect(),
            tags: self.tags,
            related_assets: self.related_assets,
            capital_flows: Vec::new(),
            sentiment_score: 0.0,
            attention_score: 0.0,
            attention_history: Vec::new(),
        };

        for flow in self.capital_flows {
            narrative.add_capital_flow(flow)?;
        }
        for sample in self.attention_history {
            narrative.record_attention(sample)?;
        }
        if let Some(score) = self.sentiment_score {
            narrative.sentiment_score = finite("sentiment_score", score)?;
        }
        if let Some(score) = self.attention_score {
            narrative.attention_score = finite("attention_score", score)?;
        }

        Ok(narrative)
    }
}

/// Wire shape of a narrative seed record
#[derive(Debug, Deserialize)]
struct NarrativeRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    lifecycle_stage: LifecycleStage,
    #[serde(default)]
    regime_alignment: BTreeMap<RegimeType, f64>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    related_assets: Vec<String>,
    #[serde(default)]
    capital_flows: Vec<CapitalFlow>,
    #[serde(default)]
    sentiment_score: Option<f64>,
    #[serde(default)]
    attention_score: Option<f64>,
    #[serde(default)]
    attention_history: Vec<AttentionSample>,
}

impl TryFrom<NarrativeRecord> for Narrative {
    type Error = NarrativeError;

    fn try_from(record: NarrativeRecord) -> Result<Self> {
        let mut builder = Narrative::builder(record.id, record.name)
            .description(record.description)
            .created_at(record.created_at)
            .lifecycle_stage(record.lifecycle_stage)
            .tags(record.tags)
            .related_assets(record.related_assets)
            .capital_flows(record.capital_flows);

        if let Some(at) = record.updated_at {
            builder = builder.updated_at(at);
        }
        for (regime, score) in record.regime_alignment {
            builder = builder.regime_alignment(regime, score);
        }
        for sample in record.attention_history {
            builder = builder.attention_sample(sample);
        }
        if let Some(score) = record.sentiment_score {
            builder = builder.sentiment_score(score);
        }
        if let Some(score) = record.attention_score {
            builder = builder.attention_score(score);
        }

        builder.build()
    }
}
