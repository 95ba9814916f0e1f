/*
 * Responsibility
 * - Handler から見える request identity accessor の extractor
 * - request parts (headers + extensions の principal) から
 *   1 リクエスト 1 インスタンスの RequestIdentity を組み立てる
 * - 失敗しない (principal が無くても accessor はできる。
 *   absence の扱いは accessor の safe/strict getter が決める)
 */
use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::services::identity::{HttpRequestContext, RequestIdentity, SecurityPrincipal};
use crate::state::AppState;

/// Request-scoped identity accessor, one per extraction.
///
/// 例：
/// ```ignore
/// async fn me(Identity(mut identity): Identity) -> Result<Json<MeResponse>, AppError> {
///     let user_id = identity.user_id()?;
///     ...
/// }
/// ```
pub struct Identity(pub RequestIdentity);

impl FromRequestParts<AppState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<SecurityPrincipal>().cloned();
        let ctx = HttpRequestContext::new(parts.headers.clone(), principal);
        let accessor = RequestIdentity::new(ctx)
            .with_api_key_header(state.config.api_key_header.clone());
        Ok(Self(accessor))
    }
}
