//! Bearer トークン → SecurityPrincipal を extensions に入れる
//!
//! ここでは token の payload を claims として materialize するだけで、
//! 署名検証はしない (検証は上流の auth middleware / gateway の責務)。
//! token が無い・壊れている場合は anonymous のまま通し、
//! 判断は accessor の safe/strict getter に委ねる。

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::services::identity::SecurityPrincipal;
use crate::state::AppState;

/// `/api/v1/*` に principal 抽出を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::principal::apply(v1);
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.layer(middleware::from_fn(principal_middleware))
}

async fn principal_middleware(mut req: Request<Body>, next: Next) -> Response {
    if let Some(principal) = principal_from_headers(&req) {
        // middleware → extractor への受け渡し
        req.extensions_mut().insert(principal);
    }
    next.run(req).await
}

fn principal_from_headers(req: &Request<Body>) -> Option<SecurityPrincipal> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let token = auth.trim().strip_prefix("Bearer ")?.trim();
    match principal_from_token(token) {
        Some(principal) => Some(principal),
        None => {
            tracing::warn!("malformed bearer token; proceeding anonymously");
            None
        }
    }
}

/// JWT 形式の token の payload segment を decode して principal を組み立てる。
fn principal_from_token(token: &str) -> Option<SecurityPrincipal> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    let _signature = segments.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&bytes).ok()?;

    let mut principal = SecurityPrincipal::authenticated();
    for (claim_type, value) in &claims {
        let claim_type = claim_type.as_str();
        match value {
            serde_json::Value::String(s) => {
                principal = principal.with_claim(claim_type, s.as_str());
            }
            serde_json::Value::Number(n) => {
                principal = principal.with_claim(claim_type, n.to_string());
            }
            serde_json::Value::Bool(b) => {
                principal = principal.with_claim(claim_type, b.to_string());
            }
            // 配列 claim (roles, emails など) は要素ごとに 1 claim
            serde_json::Value::Array(items) => {
                for item in items {
                    if let Some(s) = item.as_str() {
                        principal = principal.with_claim(claim_type, s);
                        if claim_type == "roles" {
                            principal = principal.with_role(s);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Some(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::claims::SUBJECT;

    fn token_with_payload(payload: &str) -> String {
        let segment = URL_SAFE_NO_PAD.encode(payload);
        format!("e30.{segment}.sig")
    }

    #[test]
    fn builds_principal_from_payload_claims() {
        let token =
            token_with_payload(r#"{"sub":"u1","emails":["a@b.com"],"roles":["Admin","User"]}"#);
        let principal = principal_from_token(&token).unwrap();

        assert!(principal.is_authenticated());
        assert!(principal.is_in_role("Admin"));
        assert!(principal.is_in_role("User"));
        assert!(!principal.is_in_role("Auditor"));
        assert!(
            principal
                .claims()
                .iter()
                .any(|c| c.claim_type == SUBJECT && c.value == "u1")
        );
    }

    #[test]
    fn rejects_non_jwt_shapes() {
        assert!(principal_from_token("opaque-token").is_none());
        assert!(principal_from_token("a.b").is_none());
        assert!(principal_from_token(&format!("x.{}.y", URL_SAFE_NO_PAD.encode("[1]"))).is_none());
    }
}
