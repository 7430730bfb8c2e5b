//! Hierarchical claims: a DAG of economic propositions
//!
//! Each claim is a one-sentence economic proposition; an edge from parent to
//! child means the child follows causally from the parent. Influence is a
//! blend of how close a claim sits to a root and how many claims descend
//! from it. Claims whose subtrees hang off different roots yet reference the
//! same asset mark points where independent macro forces meet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{NarrativeError, Result};

/// Ordinal influence tier, assigned from depth
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ClaimTier {
    /// Root-level macro drivers
    #[serde(rename = "tier_1")]
    Tier1,
    /// First and second order consequences
    #[serde(rename = "tier_2")]
    Tier2,
    /// Downstream, observable effects
    #[default]
    #[serde(rename = "tier_3")]
    Tier3,
}

impl ClaimTier {
    fn from_depth(depth: usize) -> Self {
        match depth {
            0 => ClaimTier::Tier1,
            1 | 2 => ClaimTier::Tier2,
            _ => ClaimTier::Tier3,
        }
    }
}

/// Whether the causal link to a claim's parent is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CausalDirection {
    #[default]
    Established,
    Disputed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimTrend {
    Rising,
    #[default]
    Stable,
    Fading,
}

/// A single economic proposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    id: String,
    pub text: String,
    /// Rates, FX, Equities, ...
    pub asset_classes: Vec<String>,
    /// Tickers and pairs such as NVDA or EUR/USD
    pub related_assets: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// How long the claim has been active
    pub persistence_days: u32,
    /// structural, transient, cyclical, ...
    pub expected_duration: String,
    pub trend: ClaimTrend,

    parent_ids: Vec<String>,
    child_ids: Vec<String>,
    causal_direction: CausalDirection,
    tier: ClaimTier,
    influence_score: f64,
    descendant_count: usize,
    depth: usize,
}

impl Claim {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            asset_classes: Vec::new(),
            related_assets: Vec::new(),
            created_at: None,
            persistence_days: 0,
            expected_duration: String::new(),
            trend: ClaimTrend::default(),
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
            causal_direction: CausalDirection::default(),
            tier: ClaimTier::default(),
            influence_score: 0.0,
            descendant_count: 0,
            depth: 0,
        }
    }

    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_assets.extend(assets.into_iter().map(Into::into));
        self
    }

    pub fn with_asset_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }

    pub fn child_ids(&self) -> &[String] {
        &self.child_ids
    }

    /// Direction of the most recently added link from a parent
    pub fn causal_direction(&self) -> CausalDirection {
        self.causal_direction
    }

    pub fn tier(&self) -> ClaimTier {
        self.tier
    }

    /// Influence on a 0-100 scale, set by [`ClaimGraph::compute_influence`]
    pub fn influence_score(&self) -> f64 {
        self.influence_score
    }

    pub fn descendant_count(&self) -> usize {
        self.descendant_count
    }

    /// Distance from the nearest root; 0 for roots
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

/// Two independent root claims acting on the same asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTreeInteraction {
    pub asset: String,
    pub claim_a_id: String,
    pub claim_a_root_id: String,
    pub claim_a_text: String,
    pub claim_b_id: String,
    pub claim_b_root_id: String,
    pub claim_b_text: String,
    pub description: String,
}

/// Nested view of a claim and everything below it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimTree {
    #[serde(flatten)]
    pub claim: Claim,
    pub children: Vec<ClaimTree>,
}

/// DAG of claims keyed by id
#[derive(Debug, Clone, Default)]
pub struct ClaimGraph {
    claims: BTreeMap<String, Claim>,
}

impl ClaimGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_claim(&mut self, claim: Claim) -> Result<()> {
        if self.claims.contains_key(&claim.id) {
            return Err(NarrativeError::Conflict(format!("claim '{}'", claim.id)));
        }
        self.claims.insert(claim.id.clone(), claim);
        Ok(())
    }

    /// Add a causal edge from `parent_id` to `child_id`
    ///
    /// Repeating an existing edge only updates its direction. Edges that
    /// would close a cycle are rejected.
    pub fn add_edge(
        &mut self,
        parent_id: &str,
        child_id: &str,
        direction: CausalDirection,
    ) -> Result<()> {
        for id in [parent_id, child_id] {
            if !self.claims.contains_key(id) {
                return Err(NarrativeError::NotFound(format!("claim '{id}'")));
            }
        }
        if parent_id == child_id || self.subtree_ids(child_id).contains(parent_id) {
            return Err(NarrativeError::Validation(format!(
                "edge {parent_id} -> {child_id} would create a cycle"
            )));
        }

        if let Some(parent) = self.claims.get_mut(parent_id) {
            if !parent.child_ids.iter().any(|id| id == child_id) {
                parent.child_ids.push(child_id.to_string());
            }
        }
        if let Some(child) = self.claims.get_mut(child_id) {
            if !child.parent_ids.iter().any(|id| id == parent_id) {
                child.parent_ids.push(parent_id.to_string());
            }
            child.causal_direction = direction;
        }
        Ok(())
    }

    pub fn get_claim(&self, id: &str) -> Option<&Claim> {
        self.claims.get(id)
    }

    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claims without parents, in id order
    pub fn roots(&self) -> Vec<&Claim> {
        self.claims.values().filter(|c| c.is_root()).collect()
    }

    pub fn children(&self, id: &str) -> Vec<&Claim> {
        self.claims.get(id).map_or_else(Vec::new, |claim| {
            claim
                .child_ids
                .iter()
                .filter_map(|cid| self.claims.get(cid))
                .collect()
        })
    }

    pub fn parents(&self, id: &str) -> Vec<&Claim> {
        self.claims.get(id).map_or_else(Vec::new, |claim| {
            claim
                .parent_ids
                .iter()
                .filter_map(|pid| self.claims.get(pid))
                .collect()
        })
    }

    /// Ids of every descendant of a claim, excluding the claim itself
    pub fn subtree_ids(&self, id: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let Some(claim) = self.claims.get(id) else {
            return visited;
        };

        let mut queue: VecDeque<&str> = claim.child_ids.iter().map(String::as_str).collect();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(node) = self.claims.get(current) {
                queue.extend(
                    node.child_ids
                        .iter()
                        .map(String::as_str)
                        .filter(|cid| !visited.contains(*cid)),
                );
            }
        }
        visited
    }

    /// Recompute depth, descendant count, influence and tier of every claim
    ///
    /// `influence = (0.5 / (1 + depth) + 0.5 * descendants / max_descendants) * 100`,
    /// rounded to one decimal.
    pub fn compute_influence(&mut self) {
        if self.claims.is_empty() {
            return;
        }

        let mut depths: BTreeMap<String, usize> = BTreeMap::new();
        let mut queue: VecDeque<(String, usize)> = self
            .roots()
            .into_iter()
            .map(|root| (root.id.clone(), 0))
            .collect();
        while let Some((id, depth)) = queue.pop_front() {
            if depths.contains_key(&id) {
                continue;
            }
            if let Some(node) = self.claims.get(&id) {
                queue.extend(
                    node.child_ids
                        .iter()
                        .filter(|cid| !depths.contains_key(*cid))
                        .map(|cid| (cid.clone(), depth + 1)),
                );
            }
            depths.insert(id, depth);
        }

        let descendants: BTreeMap<String, usize> = self
            .claims
            .keys()
            .map(|id| (id.clone(), self.subtree_ids(id).len()))
            .collect();
        let max_descendants = descendants.values().copied().max().unwrap_or(0).max(1);

        for (id, claim) in &mut self.claims {
            claim.depth = depths.get(id).copied().unwrap_or(0);
            claim.descendant_count = descendants.get(id).copied().unwrap_or(0);

            let depth_score = 1.0 / (1.0 + claim.depth as f64);
            let breadth_score = claim.descendant_count as f64 / max_descendants as f64;
            claim.influence_score =
                ((0.5 * depth_score + 0.5 * breadth_score) * 1000.0).round() / 10.0;
            claim.tier = ClaimTier::from_depth(claim.depth);
        }

        tracing::debug!(claims = self.claims.len(), "Computed claim influence");
    }

    /// Assets referenced from the subtrees of more than one root
    ///
    /// One interaction is reported per asset and pair of roots, using the
    /// first claim under each root that references the asset.
    pub fn find_cross_tree_interactions(&self) -> Vec<CrossTreeInteraction> {
        // asset -> (root id, first referencing claim id) in root order
        let mut asset_map: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();

        for root in self.roots() {
            let subtree = self.subtree_ids(&root.id);
            let members = std::iter::once(root.id.as_str())
                .chain(subtree.iter().map(String::as_str));

            for cid in members {
                let Some(claim) = self.claims.get(cid) else {
                    continue;
                };
                for asset in &claim.related_assets {
                    let entries = asset_map.entry(asset.as_str()).or_default();
                    if !entries.iter().any(|(rid, _)| *rid == root.id) {
                        entries.push((root.id.as_str(), claim.id.as_str()));
                    }
                }
            }
        }

        let mut interactions = Vec::new();
        for (asset, entries) in &asset_map {
            for (i, (root_a, claim_a)) in entries.iter().enumerate() {
                for (root_b, claim_b) in &entries[i + 1..] {
                    let (Some(ra), Some(rb), Some(ca), Some(cb)) = (
                        self.claims.get(*root_a),
                        self.claims.get(*root_b),
                        self.claims.get(*claim_a),
                        self.claims.get(*claim_b),
                    ) else {
                        continue;
                    };

                    interactions.push(CrossTreeInteraction {
                        asset: (*asset).to_string(),
                        claim_a_id: ca.id.clone(),
                        claim_a_root_id: ra.id.clone(),
                        claim_a_text: ca.text.clone(),
                        claim_b_id: cb.id.clone(),
                        claim_b_root_id: rb.id.clone(),
                        claim_b_text: cb.text.clone(),
                        description: format!(
                            "\"{}\" and \"{}\" both affect {asset} through different channels.",
                            ra.text, rb.text
                        ),
                    });
                }
            }
        }
        interactions
    }

    /// Nested view of a claim's subtree
    pub fn tree(&self, root_id: &str) -> Option<ClaimTree> {
        let claim = self.claims.get(root_id)?;
        Some(ClaimTree {
            claim: claim.clone(),
            children: claim
                .child_ids
                .iter()
                .filter_map(|cid| self.tree(cid))
                .collect(),
        })
    }
}
