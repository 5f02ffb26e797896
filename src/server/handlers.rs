use axum::extract::State;
use axum::Json;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiResult;
use super::AppState;
use crate::engine::chart::{self, ChartPoint};
use crate::engine::state::{GameState, PlayChoice, UiMode};
use crate::feed::backend::{SimulationRequest, SimulationSummary};
use crate::feed::types::{ChartQuery, ExpectedPoints};

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub state: GameState,
    pub choice: PlayChoice,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

pub async fn advance_action(
    State(app): State<AppState>,
    Json(request): Json<AdvanceRequest>,
) -> ApiResult<Json<(GameState, UiMode)>> {
    let mut rng = StdRng::from_entropy();
    let next = app.machine.advance(request.state, request.choice, &mut rng).await?;
    Ok(Json(next))
}

pub async fn simulate_action(
    State(app): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> ApiResult<Json<SimulationSummary>> {
    tracing::info!(
        team1 = %request.team1,
        team2 = %request.team2,
        num_games = request.num_games,
        "bulk simulation requested"
    );
    let summary = app.backend.simulate(&request).await?;
    Ok(Json(summary))
}

pub async fn decisions_action(
    State(app): State<AppState>,
    Json(query): Json<ChartQuery>,
) -> ApiResult<Json<DataResponse<ChartPoint>>> {
    let data = chart::decision_chart(app.data.as_ref(), &query).await?;
    Ok(Json(DataResponse { data }))
}

pub async fn expected_points_action(
    State(app): State<AppState>,
    Json(query): Json<ChartQuery>,
) -> ApiResult<Json<DataResponse<ExpectedPoints>>> {
    let data = chart::expected_points(app.data.as_ref(), &query).await?;
    Ok(Json(DataResponse { data }))
}

pub async fn health_action() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
