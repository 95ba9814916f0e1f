/*
 * Responsibility
 * - identity 解決の失敗型 (strict getter 専用)
 * - safe getter は None/false を返すのでここを通らない
 */
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A strict getter was used but the fact could not be resolved
    /// (no principal, not authenticated, or claim/header genuinely absent).
    #[error("unauthorized")]
    Unauthorized,
}
