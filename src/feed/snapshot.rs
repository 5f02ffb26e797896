//! In-memory play data, loadable from a JSON export of the four tables.
//!
//! Used for offline runs and tests. Lookups follow the same single-row rule
//! as the hosted store: no match is `SituationNotFound`, more than one is a
//! malformed row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{
    ChartQuery, CoachKey, CoachProbs, Distribution, DistributionKey, ExpectedPoints, PlayType,
    YardlineProbs,
};
use super::PlayData;
use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CoachProbsRow {
    pub team: String,
    pub year: i32,
    pub down: i32,
    pub distance: i32,
    pub yardline: i32,
    pub is_defense: bool,
    #[serde(flatten)]
    pub probs: CoachProbs,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayCdfRow {
    pub team: String,
    pub year: i32,
    pub down: i32,
    pub distance: i32,
    pub yardline_bin: String,
    pub is_defense: bool,
    pub play_type: PlayType,
    #[serde(flatten)]
    pub distribution: Distribution,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PuntRow {
    pub yardline: i32,
    #[serde(deserialize_with = "super::types::whole_yards")]
    pub data: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldGoalRow {
    pub yardline: i32,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExpectedPointsRow {
    pub team: String,
    pub year: i32,
    pub is_defense: bool,
    pub down: i32,
    #[serde(flatten)]
    pub points: ExpectedPoints,
}

/// Table contents, named after the hosted tables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub coach_decision_probs: Vec<CoachProbsRow>,
    #[serde(default)]
    pub play_cdf: Vec<PlayCdfRow>,
    #[serde(default)]
    pub punts: Vec<PuntRow>,
    #[serde(default)]
    pub fg_probs: Vec<FieldGoalRow>,
    #[serde(default)]
    pub expected_points: Vec<ExpectedPointsRow>,
}

pub struct SnapshotStore {
    snapshot: Snapshot,
}

/// Exactly one row, or the matching error.
fn single<'a, T>(
    table: &'static str,
    mut matches: impl Iterator<Item = &'a T>,
    describe: impl Fn() -> String,
) -> Result<&'a T, SimError> {
    let first = matches
        .next()
        .ok_or_else(|| SimError::SituationNotFound(format!("{table}: {}", describe())))?;
    if matches.next().is_some() {
        return Err(SimError::malformed(table, format!("multiple rows for {}", describe())));
    }
    Ok(first)
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot JSON: {}", path.display()))?;
        tracing::info!(
            coach_rows = snapshot.coach_decision_probs.len(),
            cdf_rows = snapshot.play_cdf.len(),
            punt_rows = snapshot.punts.len(),
            fg_rows = snapshot.fg_probs.len(),
            ep_rows = snapshot.expected_points.len(),
            "loaded play data snapshot"
        );
        Ok(Self::new(snapshot))
    }
}

#[async_trait]
impl PlayData for SnapshotStore {
    async fn coach_probs(&self, key: &CoachKey) -> Result<CoachProbs, SimError> {
        let rows = self.snapshot.coach_decision_probs.iter().filter(|r| {
            r.team == key.team
                && r.year == key.year
                && r.down == key.down
                && r.distance == key.distance
                && r.yardline == key.yardline
                && r.is_defense == key.is_defense
        });
        let row = single("coach_decision_probs", rows, || {
            format!("{} {} {}&{} at {}", key.team, key.year, key.down, key.distance, key.yardline)
        })?;
        Ok(row.probs.clone())
    }

    async fn play_distribution(&self, key: &DistributionKey) -> Result<Distribution, SimError> {
        let rows = self.snapshot.play_cdf.iter().filter(|r| {
            r.team == key.team
                && r.year == key.year
                && r.down == key.down
                && r.distance == key.distance
                && r.yardline_bin == key.yardline_bin
                && r.is_defense == key.is_defense
                && r.play_type == key.play_type
        });
        let row = single("play_cdf", rows, || key.to_string())?;
        row.distribution
            .validate()
            .map_err(|reason| SimError::malformed("play_cdf", reason))?;
        Ok(row.distribution.clone())
    }

    async fn punt_outcomes(&self, yardline: i32) -> Result<Vec<i32>, SimError> {
        let rows = self.snapshot.punts.iter().filter(|r| r.yardline == yardline);
        let row = single("punts", rows, || format!("yardline {yardline}"))?;
        Ok(row.data.clone())
    }

    async fn field_goal_prob(&self, yardline: i32) -> Result<f64, SimError> {
        let rows = self.snapshot.fg_probs.iter().filter(|r| r.yardline == yardline);
        let row = single("fg_probs", rows, || format!("yardline {yardline}"))?;
        Ok(row.probability)
    }

    async fn coach_probs_by_yardline(&self, query: &ChartQuery) -> Result<Vec<YardlineProbs>, SimError> {
        let mut rows: Vec<YardlineProbs> = self
            .snapshot
            .coach_decision_probs
            .iter()
            .filter(|r| {
                r.team == query.team
                    && r.year == query.year
                    && r.is_defense == query.is_defense
                    && r.down == query.down
                    && r.distance == query.distance
            })
            .map(|r| YardlineProbs { yardline: r.yardline, probs: r.probs.clone() })
            .collect();
        rows.sort_by_key(|r| r.yardline);
        Ok(rows)
    }

    async fn expected_points(&self, query: &ChartQuery) -> Result<Vec<ExpectedPoints>, SimError> {
        let mut rows: Vec<ExpectedPoints> = self
            .snapshot
            .expected_points
            .iter()
            .filter(|r| {
                r.team == query.team
                    && r.year == query.year
                    && r.is_defense == query.is_defense
                    && r.down == query.down
                    && r.points.distance <= query.distance
            })
            .map(|r| r.points.clone())
            .collect();
        rows.sort_by_key(|r| r.yardline);
        Ok(rows)
    }
}
