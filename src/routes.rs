use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    alerts,
    attendance::{self, AttendanceInput},
    error::AppError,
    models::{AlertRecord, AttendanceRecord},
    state::AppState,
};

#[derive(Serialize)]
pub struct RecordedResponse {
    status: &'static str,
    frequencia: f64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ClearedResponse {
    status: &'static str,
    removidos: u64,
    message: &'static str,
}

pub async fn record_attendance_handler(
    State(state): State<AppState>,
    payload: Result<Json<AttendanceInput>, JsonRejection>,
) -> Result<Json<RecordedResponse>, AppError> {
    let Json(input) = payload?;
    let recorded = attendance::record_attendance(state.store.as_ref(), &input).await?;

    Ok(Json(RecordedResponse {
        status: "success",
        frequencia: recorded.record.attendance_percent,
    }))
}

pub async fn list_attendance_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    Ok(Json(state.store.list_attendance().await?))
}

pub async fn list_alerts_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<AlertRecord>>, AppError> {
    Ok(Json(state.store.list_alerts().await?))
}

pub async fn append_alert_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Json(document) = payload?;
    alerts::append(state.store.as_ref(), document).await?;

    Ok(Json(StatusResponse { status: "success" }))
}

pub async fn clear_alerts_handler(
    State(state): State<AppState>,
) -> Result<Json<ClearedResponse>, AppError> {
    let removidos = alerts::clear_system_alerts(state.store.as_ref()).await?;

    Ok(Json(ClearedResponse {
        status: "ok",
        removidos,
        message: "Alertas removidos com sucesso.",
    }))
}
