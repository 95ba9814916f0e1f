/*
 * Responsibility
 * - API バージョンの束ね (現状 v1 のみ)
 */
pub mod v1;
