//! Report API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use guichet_core::{DailyReport, MonthlyReport};

use super::tickets::TicketErrorResponse;
use crate::state::AppState;

/// Query parameters for the daily report
#[derive(Debug, Deserialize)]
pub struct DailyReportParams {
    /// Report date as YYYY-MM-DD; defaults to today (UTC)
    pub date: Option<String>,
}

/// Query parameters for the monthly report
#[derive(Debug, Deserialize)]
pub struct MonthlyReportParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn daily_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DailyReportParams>,
) -> Result<Json<DailyReport>, impl IntoResponse> {
    let date = match params.date {
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(TicketErrorResponse {
                        error: format!("invalid date, expected YYYY-MM-DD: {}", raw),
                    }),
                ))
            }
        },
        None => Utc::now().date_naive(),
    };

    match state.reporter().daily(date) {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

pub async fn monthly_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthlyReportParams>,
) -> Result<Json<MonthlyReport>, impl IntoResponse> {
    let now = Utc::now();
    let year = params.year.unwrap_or_else(|| now.year());
    let month = params.month.unwrap_or_else(|| now.month());

    if !(1..=12).contains(&month) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(TicketErrorResponse {
                error: format!("invalid month: {}", month),
            }),
        ));
    }

    match state.reporter().monthly(year, month) {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TicketErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
