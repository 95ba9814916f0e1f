/*
 * Responsibility
 * - GET /health (疎通用)
 * - 認証を要求しないことの確認にも使う (principal middleware は素通し)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
