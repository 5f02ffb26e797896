pub mod backend;
pub mod snapshot;
pub mod supabase;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::state::PlayChoice;
use crate::error::SimError;
use types::{
    ChartQuery, CoachKey, CoachProbs, Distribution, DistributionKey, ExpectedPoints, Situation,
    YardlineProbs,
};

/// Historical play data the drive machine samples from.
///
/// Implementations must be read-only: the same key always yields the same row.
#[async_trait]
pub trait PlayData: Send + Sync {
    async fn coach_probs(&self, key: &CoachKey) -> Result<CoachProbs, SimError>;
    async fn play_distribution(&self, key: &DistributionKey) -> Result<Distribution, SimError>;
    /// Every recorded punt result from this yardline.
    async fn punt_outcomes(&self, yardline: i32) -> Result<Vec<i32>, SimError>;
    async fn field_goal_prob(&self, yardline: i32) -> Result<f64, SimError>;

    /// Tendency rows at `query.distance` for every yardline, ordered by
    /// yardline. May be empty.
    async fn coach_probs_by_yardline(&self, query: &ChartQuery) -> Result<Vec<YardlineProbs>, SimError>;
    /// Expected-points rows with `distance <= query.distance`, ordered by
    /// yardline. May be empty.
    async fn expected_points(&self, query: &ChartQuery) -> Result<Vec<ExpectedPoints>, SimError>;
}

/// Recommends a play for the `"AI"` coach.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, situation: &Situation) -> Result<PlayChoice>;
}
