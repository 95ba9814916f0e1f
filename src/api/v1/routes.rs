/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /me, /whoami, /admin, /internal を束ねる
 * - principal 抽出 middleware を v1 全体に適用する
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    admin::admin_ping, health::health, internal::internal_echo, me::me, me::whoami,
};

pub fn routes() -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/whoami", get(whoami))
        .route("/admin/ping", get(admin_ping))
        .route("/internal/echo", post(internal_echo));

    // principal は v1 のどの handler からも見えるように route 群へまとめて掛ける
    middleware::auth::principal::apply(router)
}
