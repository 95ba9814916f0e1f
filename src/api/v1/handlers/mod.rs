/*
 * Responsibility
 * - v1 handlers の公開インターフェース (re-export)
 */
pub mod admin;
pub mod health;
pub mod internal;
pub mod me;
