//! Dashboard API route handlers.
//!
//! All endpoints return JSON and translate directly to engine calls or
//! queries — caller identity travels in the request body, and the engine
//! keeps sole authority over validation and authorization.

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::{SettlementEngine, SettlementReport};
use crate::types::{AccountId, Amount, Outcome, PoolError, Stake, StakeId};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub engine: Arc<SettlementEngine>,
    pub pool_name: String,
    pub started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(engine: Arc<SettlementEngine>, pool_name: impl Into<String>) -> Self {
        Self {
            engine,
            pool_name: pool_name.into(),
            started_at: Utc::now(),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceStakeRequest {
    pub staker: String,
    pub outcome: Outcome,
    pub amount: Amount,
}

#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    pub caller: String,
    pub outcome: Outcome,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub caller: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub pool: String,
    pub outcome: String,
    pub settled: bool,
    pub balance: Amount,
    pub stake_count: usize,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeTotal {
    pub outcome: Outcome,
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeResponse {
    pub id: StakeId,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawResponse {
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Engine error carried out to an HTTP response.
pub struct ApiError(pub PoolError);

impl From<PoolError> for ApiError {
    fn from(e: PoolError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PoolError::Unauthorized(_) => StatusCode::FORBIDDEN,
            PoolError::InvalidAmount | PoolError::InvalidOutcome(_) | PoolError::Overflow(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PoolError::AlreadySettled(_) => StatusCode::CONFLICT,
            PoolError::TransferFailure(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let outcome = state.engine.announced_outcome().await;
    Json(StatusResponse {
        pool: state.pool_name.clone(),
        outcome: outcome.to_string(),
        settled: outcome.is_concrete(),
        balance: state.engine.balance().await,
        stake_count: state.engine.stake_count().await,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

pub async fn get_totals(State(state): State<AppState>) -> Json<Vec<OutcomeTotal>> {
    let mut totals = Vec::with_capacity(Outcome::CONCRETE.len());
    for outcome in Outcome::CONCRETE {
        totals.push(OutcomeTotal {
            outcome: *outcome,
            total: state.engine.total_for(*outcome).await,
        });
    }
    Json(totals)
}

pub async fn get_stakes(State(state): State<AppState>) -> Json<Vec<Stake>> {
    Json(state.engine.stakes().await)
}

pub async fn place_stake(
    State(state): State<AppState>,
    Json(req): Json<PlaceStakeRequest>,
) -> Result<(StatusCode, Json<StakeResponse>), ApiError> {
    let id = state
        .engine
        .place_stake(AccountId::new(req.staker), req.outcome, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(StakeResponse { id })))
}

pub async fn announce(
    State(state): State<AppState>,
    Json(req): Json<AnnounceRequest>,
) -> Result<Json<SettlementReport>, ApiError> {
    let report = state
        .engine
        .announce_outcome(&AccountId::new(req.caller), req.outcome)
        .await?;
    Ok(Json(report))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let amount = state
        .engine
        .withdraw_remainder(&AccountId::new(req.caller))
        .await?;
    Ok(Json(WithdrawResponse { amount }))
}
