/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - pub fn apply(...) 系をここから辿れるようにする
 */
pub mod auth;
pub mod cors;
pub mod http;
