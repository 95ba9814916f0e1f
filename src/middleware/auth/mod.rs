/*
 * Responsibility
 * - 認証系 middleware の公開インターフェース (re-export)
 */
pub mod principal;
