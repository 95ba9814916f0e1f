/*
 * Responsibility
 * - /me (strict) と /whoami (safe) の handler
 * - strict は user_id が解決できなければ 401、safe は null を返して 200
 */
use axum::Json;

use crate::api::v1::dto::me::{MeResponse, WhoamiResponse};
use crate::api::v1::extractors::Identity;
use crate::error::AppError;

pub async fn me(Identity(mut identity): Identity) -> Result<Json<MeResponse>, AppError> {
    let user_id = identity.user_id()?;

    Ok(Json(MeResponse {
        user_id,
        email: identity.email_opt(),
        is_admin: identity.is_admin(),
    }))
}

/// Safe variant: machine-to-machine calls with no human principal land here
/// and get nulls instead of a 401.
pub async fn whoami(Identity(mut identity): Identity) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        user_id: identity.user_id_opt(),
        email: identity.email_opt(),
        is_admin: identity.is_admin(),
        api_key_present: identity.api_key().is_some(),
    })
}
