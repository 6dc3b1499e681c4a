//! Call dispatch API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use guichet_core::{CallEvent, TicketClass};

use super::tickets::{TicketErrorResponse, TicketResponse};
use crate::state::AppState;

/// Maximum allowed limit for the recent-calls query
const MAX_LIMIT: i64 = 100;

/// Default limit for the recent-calls query
const DEFAULT_LIMIT: i64 = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for calling the next ticket
#[derive(Debug, Deserialize)]
pub struct CallNextBody {
    /// Counter making the call, 1..=dispatch.counters
    pub counter: u32,
}

/// Response for a call attempt. `ticket` is null when every queue is empty.
#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub ticket: Option<TicketResponse>,
}

#[derive(Debug, Serialize)]
pub struct CallEventResponse {
    pub id: i64,
    pub ticket_id: i64,
    pub code: String,
    pub class: TicketClass,
    pub counter: u32,
    pub called_at: String,
}

impl From<CallEvent> for CallEventResponse {
    fn from(call: CallEvent) -> Self {
        Self {
            id: call.id,
            ticket_id: call.ticket_id,
            code: call.code,
            class: call.class,
            counter: call.counter,
            called_at: call.called_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentCallsResponse {
    pub calls: Vec<CallEventResponse>,
}

/// Query parameters for listing recent calls
#[derive(Debug, Deserialize)]
pub struct RecentCallsParams {
    pub limit: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Call the next ticket for a counter
pub async fn call_next(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CallNextBody>,
) -> Result<Json<CallResponse>, impl IntoResponse> {
    let counters = state.config().dispatch.counters;
    if body.counter == 0 || body.counter > counters {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(TicketErrorResponse {
                error: format!(
                    "counter must be between 1 and {}, got {}",
                    counters, body.counter
                ),
            }),
        ));
    }

    match state.dispatcher().call_next(body.counter) {
        Ok(ticket) => Ok(Json(CallResponse {
            ticket: ticket.map(TicketResponse::from),
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// List recent calls, most recent first
pub async fn recent_calls(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentCallsParams>,
) -> Result<Json<RecentCallsResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    match state.ticket_store().recent_calls(limit) {
        Ok(calls) => Ok(Json(RecentCallsResponse {
            calls: calls.into_iter().map(CallEventResponse::from).collect(),
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
