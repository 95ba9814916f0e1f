/*
 * Responsibility
 * - identity facts の response DTO
 * - strict (/me) と safe (/whoami) で null の意味が違うので型を分ける
 */
use serde::Serialize;

/// Strict view: the request must carry a resolvable user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    /// Email は strict でも optional (認証済みでも email claim を
    /// 持たないトークンは正当)。
    pub email: Option<String>,
    pub is_admin: bool,
}

/// Safe view: every fact may be absent, and absence is not an error.
#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
    pub api_key_present: bool,
}
