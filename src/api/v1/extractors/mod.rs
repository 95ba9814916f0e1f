/*
 * Responsibility
 * - extractors の公開インターフェース (re-export)
 */
mod identity;

pub use identity::Identity;
