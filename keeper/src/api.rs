//! # Ingestion API
//!
//! Builds the axum router the reward-collection side talks to. All
//! endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path       | Description                                   |
//! |--------|------------|-----------------------------------------------|
//! | GET    | `/health`  | Liveness probe                                |
//! | GET    | `/ledger`  | Every ledger entry with its decoded bucket    |
//! | POST   | `/rewards` | Credit a collected reward                     |
//! | POST   | `/flush`   | Run one flush cycle now and return the report |

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use reward_tracker::{DispositionPolicy, FlushReport, OutcomeStatus, RewardTracker, SignedWad, TokenId};

use crate::metrics::SharedMetrics;
use crate::scheduler::flush_and_record;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Reported version string.
    pub version: String,
    /// The tracker credits are booked into.
    pub tracker: Arc<RewardTracker>,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ledger", get(ledger_handler))
        .route("/rewards", post(credit_handler))
        .route("/flush", post(flush_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /rewards`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreditRequest {
    /// Token the reward was paid in.
    pub token: TokenId,
    /// What to do with the accumulated balance.
    pub policy: DispositionPolicy,
    /// Reward amount as an integer wei string at 18-decimal scale, e.g.
    /// `"1500000000000000000"` for 1.5 tokens. Fractional strings are rejected.
    pub amount_wei: SignedWad,
}

/// Response of `POST /rewards`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreditResponse {
    /// Bucket balance after the credit, in wei.
    pub balance_wei: SignedWad,
    /// Same balance in whole-token units, for humans.
    pub balance: String,
}

/// One row of `GET /ledger`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerEntryView {
    pub key: String,
    pub token: Option<TokenId>,
    pub policy: Option<DispositionPolicy>,
    pub balance_wei: SignedWad,
    pub balance: String,
}

/// One row of the `POST /flush` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutcomeView {
    pub key: String,
    pub amount_wei: SignedWad,
    pub dispatched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `POST /flush`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlushResponse {
    pub dispatched: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub outcomes: Vec<OutcomeView>,
}

impl From<&FlushReport> for FlushResponse {
    fn from(report: &FlushReport) -> Self {
        Self {
            dispatched: report.succeeded(),
            failed: report.failed(),
            elapsed_ms: report.elapsed().as_millis() as u64,
            outcomes: report
                .outcomes
                .iter()
                .map(|o| OutcomeView {
                    key: o.key.to_string(),
                    amount_wei: o.amount,
                    dispatched: o.is_dispatched(),
                    error: match &o.status {
                        OutcomeStatus::Dispatched => None,
                        OutcomeStatus::Failed(e) => Some(e.to_string()),
                    },
                })
                .collect(),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the keeper is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": state.version })),
    )
}

/// `GET /ledger` — dumps every entry, including drained and negative ones.
///
/// Entries are sorted by key so repeated calls are diffable.
async fn ledger_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut entries = state.tracker.entries();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let views: Vec<LedgerEntryView> = entries
        .into_iter()
        .map(|(key, balance)| {
            let decoded = key.decode().ok();
            LedgerEntryView {
                key: key.to_string(),
                token: decoded.as_ref().map(|d| d.token.clone()),
                policy: decoded.map(|d| d.policy),
                balance_wei: balance,
                balance: balance.to_string(),
            }
        })
        .collect();

    Json(views)
}

/// `POST /rewards` — credits one collected reward.
///
/// Only positive amounts are accepted here; corrections go through the
/// tracker's debit path, not the ingestion API.
async fn credit_handler(
    State(state): State<AppState>,
    Json(req): Json<CreditRequest>,
) -> axum::response::Response {
    if !req.amount_wei.is_positive() {
        return error_response(StatusCode::BAD_REQUEST, "amount_wei must be positive");
    }

    match state.tracker.credit(&req.policy, &req.token, req.amount_wei) {
        Ok(balance) => {
            state.metrics.credits_total.inc();
            (
                StatusCode::OK,
                Json(CreditResponse {
                    balance_wei: balance,
                    balance: balance.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(token = %req.token, policy = %req.policy, error = %e, "credit rejected");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}

/// `POST /flush` — runs a flush cycle immediately.
///
/// Waits for any in-progress scheduled flush to finish first.
async fn flush_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = flush_and_record(&state.tracker, &state.metrics).await;
    Json(FlushResponse::from(&report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
