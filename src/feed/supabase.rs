use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::types::{
    ChartQuery, CoachKey, CoachProbs, Distribution, DistributionKey, ExpectedPoints, YardlineProbs,
};
use super::PlayData;
use crate::error::SimError;

/// Play data served by a Supabase (PostgREST) project.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct PuntData {
    #[serde(deserialize_with = "super::types::whole_yards")]
    data: Vec<i32>,
}

#[derive(Deserialize)]
struct FieldGoalProb {
    probability: f64,
}

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

fn lte(value: impl ToString) -> String {
    format!("lte.{}", value.to_string())
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: String, request_timeout: Duration) -> Result<Self, SimError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Select `columns` from `table` with PostgREST `filters`, optionally
    /// ordered by one column.
    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &'static str,
        columns: &str,
        filters: &[(&str, String)],
        order: Option<&str>,
    ) -> Result<Vec<T>, SimError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let mut query: Vec<(&str, String)> = vec![("select", columns.to_string())];
        query.extend(filters.iter().cloned());
        if let Some(column) = order {
            query.push(("order", column.to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(table, %status, body = %body, "data store query failed");
            return Err(SimError::StoreStatus { table, status: status.as_u16(), body });
        }

        let rows: Vec<serde_json::Value> = resp.json().await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| SimError::malformed(table, e.to_string())))
            .collect()
    }

    /// Like `select_rows` with equality filters, but exactly one row must match.
    async fn select_single<T: DeserializeOwned>(
        &self,
        table: &'static str,
        columns: &str,
        filters: &[(&str, String)],
    ) -> Result<T, SimError> {
        let describe = || {
            filters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let mut rows = self.select_rows::<T>(table, columns, filters, None).await?.into_iter();
        let Some(row) = rows.next() else {
            tracing::warn!(table, filters = %describe(), "no row for situation");
            return Err(SimError::SituationNotFound(format!("{table}: {}", describe())));
        };
        if rows.next().is_some() {
            return Err(SimError::malformed(table, format!("multiple rows for {}", describe())));
        }
        Ok(row)
    }
}

#[async_trait]
impl PlayData for SupabaseStore {
    async fn coach_probs(&self, key: &CoachKey) -> Result<CoachProbs, SimError> {
        self.select_single(
            "coach_decision_probs",
            "run_prob,pass_prob,kick_prob,punt_prob",
            &[
                ("team", eq(&key.team)),
                ("year", eq(key.year)),
                ("down", eq(key.down)),
                ("distance", eq(key.distance)),
                ("yardline", eq(key.yardline)),
                ("is_defense", eq(key.is_defense)),
            ],
        )
        .await
    }

    async fn play_distribution(&self, key: &DistributionKey) -> Result<Distribution, SimError> {
        let dist: Distribution = self
            .select_single(
                "play_cdf",
                "values,cdf",
                &[
                    ("team", eq(&key.team)),
                    ("year", eq(key.year)),
                    ("down", eq(key.down)),
                    ("distance", eq(key.distance)),
                    ("yardline_bin", eq(&key.yardline_bin)),
                    ("is_defense", eq(key.is_defense)),
                    ("play_type", eq(key.play_type.as_str())),
                ],
            )
            .await?;
        dist.validate().map_err(|reason| SimError::malformed("play_cdf", reason))?;
        Ok(dist)
    }

    async fn punt_outcomes(&self, yardline: i32) -> Result<Vec<i32>, SimError> {
        let row: PuntData = self
            .select_single("punts", "data", &[("yardline", eq(yardline))])
            .await?;
        Ok(row.data)
    }

    async fn field_goal_prob(&self, yardline: i32) -> Result<f64, SimError> {
        let row: FieldGoalProb = self
            .select_single("fg_probs", "probability", &[("yardline", eq(yardline))])
            .await?;
        Ok(row.probability)
    }

    async fn coach_probs_by_yardline(&self, query: &ChartQuery) -> Result<Vec<YardlineProbs>, SimError> {
        self.select_rows(
            "coach_decision_probs",
            "yardline,run_prob,pass_prob,kick_prob,punt_prob",
            &[
                ("team", eq(&query.team)),
                ("year", eq(query.year)),
                ("is_defense", eq(query.is_defense)),
                ("down", eq(query.down)),
                ("distance", eq(query.distance)),
            ],
            Some("yardline"),
        )
        .await
    }

    async fn expected_points(&self, query: &ChartQuery) -> Result<Vec<ExpectedPoints>, SimError> {
        self.select_rows(
            "expected_points",
            "yardline,distance,ep,opt_choice",
            &[
                ("team", eq(&query.team)),
                ("year", eq(query.year)),
                ("is_defense", eq(query.is_defense)),
                ("down", eq(query.down)),
                ("distance", lte(query.distance)),
            ],
            Some("yardline"),
        )
        .await
    }
}
