/*
 * Responsibility
 * - v1 DTO の公開インターフェース (re-export)
 */
pub mod me;
