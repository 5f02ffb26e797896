//! Client for the external strategy service (`/predict`, `/simulate`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::types::Situation;
use super::Predictor;
use crate::engine::state::PlayChoice;

/// Bulk simulation failures, each with a distinct status for the client.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend server is not online. Please start the API server.")]
    Unreachable(#[source] reqwest::Error),

    #[error("Backend server returned an invalid response format.")]
    InvalidFormat,

    #[error("{detail}")]
    Upstream { status: u16, detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub team1: String,
    pub team2: String,
    pub year1: i32,
    pub year2: i32,
    pub num_games: u32,
    pub num_plays: u32,
}

/// Bulk simulation result. Fields the service adds beyond these are passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub win_probability: f64,
    pub team1_scores: Vec<f64>,
    pub team2_scores: Vec<f64>,
    #[serde(default)]
    pub avg_score_team1: Option<f64>,
    #[serde(default)]
    pub avg_score_team2: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SimulationSummary {
    /// Fill in averages the service left out (or reported as zero).
    pub fn fill_averages(&mut self) {
        fn mean(scores: &[f64]) -> f64 {
            if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            }
        }
        if self.avg_score_team1.is_none_or(|v| v == 0.0) {
            self.avg_score_team1 = Some(mean(&self.team1_scores));
        }
        if self.avg_score_team2.is_none_or(|v| v == 0.0) {
            self.avg_score_team2 = Some(mean(&self.team2_scores));
        }
    }
}

#[derive(Deserialize)]
struct PredictResponse {
    action: i64,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

fn is_json(resp: &Response) -> bool {
    resp.headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

pub struct StrategyBackend {
    client: Client,
    base_url: String,
    predict_timeout: Duration,
    simulate_timeout: Duration,
}

impl StrategyBackend {
    pub fn new(base_url: &str, predict_timeout: Duration, simulate_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .build()
            .context("failed to build strategy backend client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            predict_timeout,
            simulate_timeout,
        })
    }

    /// Run a bulk head-to-head simulation on the strategy service.
    pub async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationSummary, BackendError> {
        let url = format!("{}/simulate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .timeout(self.simulate_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to connect to strategy backend");
                BackendError::Unreachable(e)
            })?;

        if !is_json(&resp) {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(body = %body, "non-JSON response from strategy backend");
            return Err(BackendError::InvalidFormat);
        }

        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<ErrorDetail>()
                .await
                .ok()
                .and_then(|e| e.detail)
                .unwrap_or_else(|| "API request failed".to_string());
            return Err(BackendError::Upstream { status: status.as_u16(), detail });
        }

        let mut summary: SimulationSummary = resp.json().await.map_err(|e| {
            tracing::error!(error = %e, "unexpected simulation response shape");
            BackendError::InvalidFormat
        })?;
        summary.fill_averages();
        Ok(summary)
    }
}

#[async_trait]
impl Predictor for StrategyBackend {
    async fn predict(&self, situation: &Situation) -> Result<PlayChoice> {
        tracing::debug!(?situation, "requesting strategy prediction");
        let url = format!("{}/predict", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .timeout(self.predict_timeout)
            .json(situation)
            .send()
            .await
            .context("prediction request failed")?;

        if !is_json(&resp) {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("non-JSON prediction response: {}", body);
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("prediction failed ({}): {}", status, body);
        }

        let parsed: PredictResponse = resp.json().await.context("failed to parse prediction response")?;
        tracing::debug!(action = parsed.action, "received strategy prediction");
        PlayChoice::from_action(parsed.action)
            .with_context(|| format!("prediction returned unknown action {}", parsed.action))
    }
}
