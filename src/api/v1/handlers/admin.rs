/*
 * Responsibility
 * - Admin role でゲートされた handler
 * - 認可は role-membership チェックのみ (policy 評価はしない)
 */
use axum::{Json, http::StatusCode};
use serde_json::json;

use crate::api::v1::extractors::Identity;
use crate::error::AppError;

pub async fn admin_ping(
    Identity(mut identity): Identity,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if identity.is_not_admin() {
        return Err(AppError::Forbidden);
    }

    Ok((StatusCode::OK, Json(json!({"pong": true}))))
}
