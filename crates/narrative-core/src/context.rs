//! Explicit analysis context shared by classification and ranking
//!
//! The active regime and the evaluation instant travel with every call
//! instead of living inside the classifier or the ranker, so both stages of
//! a cycle see the same regime by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NarrativeError, Result};
use crate::models::RegimeType;

/// Regime and evaluation time for one analysis cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisContext {
    regime: Option<RegimeType>,
    as_of: DateTime<Utc>,
}

impl AnalysisContext {
    /// Context evaluated at `as_of` with no regime set yet
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            regime: None,
            as_of,
        }
    }

    /// Context evaluated now with no regime set yet
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn with_regime(mut self, regime: RegimeType) -> Self {
        self.regime = Some(regime);
        self
    }

    /// Set the regime from its name
    ///
    /// An unrecognized name leaves the current regime untouched.
    pub fn set_regime(&mut self, regime: &str) -> Result<()> {
        let parsed = regime.parse::<RegimeType>()?;
        tracing::debug!(regime = %parsed, "Current regime set");
        self.regime = Some(parsed);
        Ok(())
    }

    /// The active regime, required by every alignment-dependent operation
    pub fn regime(&self) -> Result<RegimeType> {
        self.regime.ok_or_else(|| {
            NarrativeError::Precondition(
                "regime must be set before alignment-dependent operations".to_string(),
            )
        })
    }

    pub fn has_regime(&self) -> bool {
        self.regime.is_some()
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }
}
