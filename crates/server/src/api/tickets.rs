//! Ticket API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use guichet_core::{
    metrics::{TICKETS_DISCARDED, TICKETS_SERVED},
    Ticket, TicketClass, TicketError,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for issuing a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    /// Ticket class: "SP" (urgent), "SE" (special) or "SG" (general)
    pub class: TicketClass,
}

/// Response for ticket operations
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub code: String,
    pub class: TicketClass,
    pub issued_at: String,
    pub status: String,
    pub called_at: Option<String>,
    pub served_at: Option<String>,
    pub counter: Option<u32>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            code: ticket.code,
            class: ticket.class,
            issued_at: ticket.issued_at.to_rfc3339(),
            status: ticket.status.as_str().to_string(),
            called_at: ticket.called_at.map(|t| t.to_rfc3339()),
            served_at: ticket.served_at.map(|t| t.to_rfc3339()),
            counter: ticket.counter,
        }
    }
}

/// Response for the finish operation
#[derive(Debug, Serialize)]
pub struct FinishResponse {
    /// True when this request performed the transition, false when the
    /// ticket was already past `called`.
    pub finished: bool,
}

/// Response for the discard operation
#[derive(Debug, Serialize)]
pub struct DiscardResponse {
    pub discarded: bool,
}

/// Queue depth per class
#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub sp: i64,
    pub se: i64,
    pub sg: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Issue a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<TicketResponse>), impl IntoResponse> {
    match state.issuer().issue(body.class) {
        Ok(ticket) => Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket)))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TicketResponse>, impl IntoResponse> {
    match state.ticket_store().get(id) {
        Ok(Some(ticket)) => Ok(Json(TicketResponse::from(ticket))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(TicketErrorResponse {
                error: format!("ticket not found: {}", id),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Mark a called ticket as served. Idempotent: repeat requests report
/// `finished: false` instead of failing.
pub async fn finish_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<FinishResponse>, impl IntoResponse> {
    match ensure_exists(state.ticket_store().get(id), id) {
        Ok(()) => {}
        Err(resp) => return Err(resp),
    }

    match state.ticket_store().mark_served(id) {
        Ok(finished) => {
            if finished {
                TICKETS_SERVED.inc();
            }
            Ok(Json(FinishResponse { finished }))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Drop a still-queued ticket from its queue.
pub async fn discard_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DiscardResponse>, impl IntoResponse> {
    match ensure_exists(state.ticket_store().get(id), id) {
        Ok(()) => {}
        Err(resp) => return Err(resp),
    }

    match state.ticket_store().mark_discarded(id) {
        Ok(discarded) => {
            if discarded {
                TICKETS_DISCARDED.inc();
            }
            Ok(Json(DiscardResponse { discarded }))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Current queued count per class
pub async fn queue_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QueueStatusResponse>, impl IntoResponse> {
    let count = |class| state.ticket_store().count_queued(class);

    match (
        count(TicketClass::Sp),
        count(TicketClass::Se),
        count(TicketClass::Sg),
    ) {
        (Ok(sp), Ok(se), Ok(sg)) => Ok(Json(QueueStatusResponse { sp, se, sg })),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

fn ensure_exists(
    lookup: Result<Option<Ticket>, TicketError>,
    id: i64,
) -> Result<(), (StatusCode, Json<TicketErrorResponse>)> {
    match lookup {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(TicketErrorResponse {
                error: format!("ticket not found: {}", id),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
