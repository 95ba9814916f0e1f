/*
 * Responsibility
 * - 「現在のリクエスト」への読み取りハンドル (RequestContext trait)
 * - accessor はこの trait 経由でしか request を見ない
 *   (HTTP 以外の呼び出し元やテストが差し替えられるように seam を切る)
 * - axum の request parts を包む HttpRequestContext 実装
 */
use axum::http::HeaderMap;

use crate::services::identity::principal::SecurityPrincipal;

/// Read-only view of the current request, as the identity accessor sees it.
///
/// - `header_values` は header key が存在しない場合に `None` を返す。
///   「key はあるが値が空」と「key 自体が無い」を呼び出し側で区別できるようにする。
/// - `principal` は呼び出し時点のスナップショットを返す。認証 middleware が
///   pipeline の後段で principal を載せるケースがあるため、accessor は毎回
///   読み直す (キャッシュ済みの field を除く)。
pub trait RequestContext: Send {
    /// Ordered values for a header, or `None` when the header is not present.
    fn header_values(&self, name: &str) -> Option<Vec<String>>;

    /// Snapshot of the security principal, if one is attached.
    fn principal(&self) -> Option<SecurityPrincipal>;
}

/// Context backed by already-extracted axum request parts.
#[derive(Debug, Clone)]
pub struct HttpRequestContext {
    headers: HeaderMap,
    principal: Option<SecurityPrincipal>,
}

impl HttpRequestContext {
    pub fn new(headers: HeaderMap, principal: Option<SecurityPrincipal>) -> Self {
        Self { headers, principal }
    }
}

impl RequestContext for HttpRequestContext {
    fn header_values(&self, name: &str) -> Option<Vec<String>> {
        if !self.headers.contains_key(name) {
            return None;
        }
        // 非 UTF-8 の値は落とす (claims/token は ASCII 前提)
        Some(
            self.headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_owned)
                .collect(),
        )
    }

    fn principal(&self) -> Option<SecurityPrincipal> {
        self.principal.clone()
    }
}
