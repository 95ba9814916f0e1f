/*
 * Responsibility
 * - service-to-service 呼び出し用の endpoint
 * - API key でゲートし、実 principal の代わりに internal context を使う
 *   (background job 等が人間の identity 無しで動くパターンの実例)
 */
use axum::{Json, extract::State};
use tracing::warn;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::Identity;
use crate::error::AppError;
use crate::services::identity::RequestIdentity;
use crate::state::AppState;

pub async fn internal_echo(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<MeResponse>, AppError> {
    // INTERNAL_API_KEY 未設定なら endpoint ごと無効
    let Some(expected) = state.config.internal_api_key.as_deref() else {
        return Err(AppError::not_found("internal endpoint"));
    };

    if identity.api_key().as_deref() != Some(expected) {
        warn!(operation = "internal_echo", "missing or wrong api key");
        return Err(AppError::Unauthorized);
    }

    // 認証された machine caller には合成 identity を払い出す
    let mut internal = RequestIdentity::detached();
    internal.set_internal_context(&state.config.internal_domain);

    Ok(Json(MeResponse {
        user_id: internal.user_id()?,
        email: internal.email_opt(),
        is_admin: internal.is_admin(),
    }))
}
