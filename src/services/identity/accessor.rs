/*
 * Responsibility
 * - 現在のリクエストから identity facts (id/email/jwt/api key/role) を解決する
 * - リクエスト単位の memo 化 (3 状態: 未解決 / 値あり / 値なし)
 * - 内部呼び出し (service-to-service, background job) 用の bypass identity
 *
 * Notes
 * - インスタンスは 1 リクエスト (または 1 unit of work) に 1 つ。共有しない。
 * - safe getter は None を返し、strict getter だけが Unauthorized で失敗する。
 */
use axum::http::header;
use tracing::warn;
use uuid::Uuid;

use crate::services::identity::claims::{self, EMAIL_LOOKUP, USER_ID_LOOKUP};
use crate::services::identity::context::RequestContext;
use crate::services::identity::error::IdentityError;
use crate::services::identity::principal::SecurityPrincipal;

/// Role name checked by `is_admin`.
pub const ADMIN_ROLE: &str = "Admin";

/// Header carrying the API key unless overridden via config.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Per-field cache state.
///
/// `Absent` は「確認したが本当に無かった」。`Unresolved` と区別することで、
/// 認証 middleware が後段で principal を載せるケースを negative cache しない。
#[derive(Debug, Clone, PartialEq, Eq)]
enum Memo<T> {
    Unresolved,
    Present(T),
    Absent,
}

impl<T: Clone> Memo<T> {
    fn is_resolved(&self) -> bool {
        !matches!(self, Memo::Unresolved)
    }

    fn value(&self) -> Option<T> {
        match self {
            Memo::Present(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Memo<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Memo::Present(v),
            None => Memo::Absent,
        }
    }
}

/// Request-scoped identity accessor.
///
/// 取得系は `&mut self` (解決結果を memo 化するため)。一度 `Present` で解決した
/// field はインスタンスの寿命の間変わらない。
pub struct RequestIdentity {
    ctx: Option<Box<dyn RequestContext>>,
    api_key_header: String,
    user_id: Memo<String>,
    email: Memo<String>,
    jwt: Memo<String>,
    admin: Option<bool>,
}

impl RequestIdentity {
    /// Accessor over a live request context.
    pub fn new(ctx: impl RequestContext + 'static) -> Self {
        Self {
            ctx: Some(Box::new(ctx)),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            user_id: Memo::Unresolved,
            email: Memo::Unresolved,
            jwt: Memo::Unresolved,
            admin: None,
        }
    }

    /// Accessor with no request context, for background jobs and other
    /// unit-of-work callers. Combine with [`set_internal_context`].
    ///
    /// [`set_internal_context`]: RequestIdentity::set_internal_context
    pub fn detached() -> Self {
        Self {
            ctx: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            user_id: Memo::Unresolved,
            email: Memo::Unresolved,
            jwt: Memo::Unresolved,
            admin: None,
        }
    }

    pub fn with_api_key_header(mut self, name: impl Into<String>) -> Self {
        self.api_key_header = name.into();
        self
    }

    /// Install the synthetic internal/system identity, bypassing claim lookup.
    ///
    /// - user id は nil UUID の正準表現
    /// - email は `internal@{domain}`
    /// - admin は true
    ///
    /// 以降このインスタンスは、実 principal が後から attach されても
    /// これらの値を返し続ける。`domain` の検証はしない。
    pub fn set_internal_context(&mut self, domain: &str) {
        self.user_id = Memo::Present(Uuid::nil().to_string());
        self.email = Memo::Present(format!("internal@{domain}"));
        self.admin = Some(true);
    }

    /// Resolved user id, or `None` when unavailable.
    ///
    /// principal が無い / 未認証の間は memo 化しない (後段の middleware が
    /// principal を載せたら解決できるように)。認証済みで claim が無い場合は
    /// 安定した miss なので `Absent` として memo 化する。
    pub fn user_id_opt(&mut self) -> Option<String> {
        if self.user_id.is_resolved() {
            return self.user_id.value();
        }
        let principal = self.ctx.as_ref()?.principal()?;
        if !principal.is_authenticated() {
            return None;
        }
        self.user_id = claims::first_claim_value(principal.claims(), &USER_ID_LOOKUP).into();
        self.user_id.value()
    }

    /// Strict variant of [`user_id_opt`]; fails with `Unauthorized`.
    ///
    /// [`user_id_opt`]: RequestIdentity::user_id_opt
    pub fn user_id(&mut self) -> Result<String, IdentityError> {
        match self.user_id_opt() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => {
                warn!(operation = "user_id", "no resolvable user id on this request");
                Err(IdentityError::Unauthorized)
            }
        }
    }

    /// Resolved email, or `None` when unavailable.
    ///
    /// Lookup は標準 email claim → legacy `emails` の順 (固定方針)。
    /// cache 規律は [`user_id_opt`] と同じ。
    ///
    /// [`user_id_opt`]: RequestIdentity::user_id_opt
    pub fn email_opt(&mut self) -> Option<String> {
        if self.email.is_resolved() {
            return self.email.value();
        }
        let principal = self.ctx.as_ref()?.principal()?;
        if !principal.is_authenticated() {
            return None;
        }
        self.email = claims::first_claim_value(principal.claims(), &EMAIL_LOOKUP).into();
        self.email.value()
    }

    pub fn email(&mut self) -> Result<String, IdentityError> {
        match self.email_opt() {
            Some(email) if !email.is_empty() => Ok(email),
            _ => {
                warn!(operation = "email", "no resolvable email on this request");
                Err(IdentityError::Unauthorized)
            }
        }
    }

    /// Bearer token from the `Authorization` header, or `None`.
    ///
    /// Cache 方針 (方針のゆらぎがあった箇所なので明示):
    /// - request context 自体が無い → memo 化しない (context は後から生まれ得る)
    /// - header key が無い / 値ゼロ個 → 安定した miss として `Absent` を memo 化
    /// - header はあるが token が取れない (空・scheme のみ・解析不能) → `Absent` を memo 化
    pub fn jwt_opt(&mut self) -> Option<String> {
        if self.jwt.is_resolved() {
            return self.jwt.value();
        }
        let ctx = self.ctx.as_ref()?;
        let resolved = match ctx.header_values(header::AUTHORIZATION.as_str()) {
            Some(values) if !values.is_empty() => parse_authorization(&values[0]),
            _ => None,
        };
        self.jwt = resolved.into();
        self.jwt.value()
    }

    pub fn jwt(&mut self) -> Result<String, IdentityError> {
        match self.jwt_opt() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => {
                warn!(operation = "jwt", "no resolvable bearer token on this request");
                Err(IdentityError::Unauthorized)
            }
        }
    }

    /// First non-empty value of the configured API-key header. Not cached.
    pub fn api_key(&self) -> Option<String> {
        let values = self.ctx.as_ref()?.header_values(&self.api_key_header)?;
        values.into_iter().next().filter(|v| !v.is_empty())
    }

    /// Role membership; false when no principal is attached.
    pub fn has_role(&self, role: &str) -> bool {
        self.principal_snapshot()
            .is_some_and(|p| p.is_in_role(role))
    }

    /// True iff the principal is in every listed role (empty list is vacuously
    /// true). False when no principal is attached, even for an empty list.
    pub fn has_roles(&self, roles: &[&str]) -> bool {
        self.principal_snapshot()
            .is_some_and(|p| roles.iter().all(|role| p.is_in_role(role)))
    }

    /// Snapshot check for the `Admin` role, memoized regardless of outcome.
    ///
    /// id/email と違い「未認証なら再試行」の特別扱いはしない。
    pub fn is_admin(&mut self) -> bool {
        if let Some(admin) = self.admin {
            return admin;
        }
        let admin = self.has_role(ADMIN_ROLE);
        self.admin = Some(admin);
        admin
    }

    pub fn is_not_admin(&mut self) -> bool {
        !self.is_admin()
    }

    fn principal_snapshot(&self) -> Option<SecurityPrincipal> {
        self.ctx.as_ref().and_then(|ctx| ctx.principal())
    }
}

/// Tolerant `Authorization` header value parse.
///
/// - 前後の空白は無視
/// - `Bearer` (大文字小文字不問) + 空白 → 残り全部 (trim 済み) が token
/// - scheme だけで token が無い → None
/// - その他の形式は汎用の `scheme parameter` 解析にフォールバックし、
///   非空の parameter が取れればそれを token とみなす
fn parse_authorization(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (scheme, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest.trim()),
        // 単一 token ("Bearer" だけ、または scheme の無い文字列) は解析不能
        None => return None,
    };
    if scheme.eq_ignore_ascii_case("Bearer") {
        return (!rest.is_empty()).then(|| rest.to_string());
    }
    // Generic `scheme parameter` form (e.g. a non-Bearer scheme).
    (!rest.is_empty()).then(|| rest.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderMap, HeaderName, HeaderValue};

    use super::*;
    use crate::services::identity::claims::{
        EMAILS, EMAIL_ADDRESS, OBJECT_IDENTIFIER, SUBJECT,
    };
    use crate::services::identity::context::HttpRequestContext;
    use crate::services::identity::principal::SecurityPrincipal;

    /// Context double with swappable headers/principal, to simulate auth
    /// middleware populating (or mutating) the request after the accessor
    /// was created.
    #[derive(Clone, Default)]
    struct TestContext {
        headers: Arc<Mutex<HeaderMap>>,
        principal: Arc<Mutex<Option<SecurityPrincipal>>>,
    }

    impl RequestContext for TestContext {
        fn header_values(&self, name: &str) -> Option<Vec<String>> {
            let headers = self.headers.lock().unwrap();
            if !headers.contains_key(name) {
                return None;
            }
            Some(
                headers
                    .get_all(name)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .map(str::to_owned)
                    .collect(),
            )
        }

        fn principal(&self) -> Option<SecurityPrincipal> {
            self.principal.lock().unwrap().clone()
        }
    }

    fn accessor_with(
        headers: HeaderMap,
        principal: Option<SecurityPrincipal>,
    ) -> (RequestIdentity, TestContext) {
        let ctx = TestContext {
            headers: Arc::new(Mutex::new(headers)),
            principal: Arc::new(Mutex::new(principal)),
        };
        (RequestIdentity::new(ctx.clone()), ctx)
    }

    fn auth_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn no_principal_yields_nulls_and_unauthorized() {
        let (mut id, _) = accessor_with(HeaderMap::new(), None);

        assert_eq!(id.user_id_opt(), None);
        assert_eq!(id.email_opt(), None);
        assert_eq!(id.jwt_opt(), None);
        assert_eq!(id.api_key(), None);
        assert_eq!(id.user_id(), Err(IdentityError::Unauthorized));
        assert_eq!(id.email(), Err(IdentityError::Unauthorized));
        assert_eq!(id.jwt(), Err(IdentityError::Unauthorized));
        assert!(!id.has_role(ADMIN_ROLE));
        assert!(!id.has_roles(&["User"]));
        assert!(!id.is_admin());
        assert!(id.is_not_admin());
    }

    #[test]
    fn user_id_fallback_order() {
        let principal = SecurityPrincipal::authenticated()
            .with_claim(SUBJECT, "sub-value")
            .with_claim(OBJECT_IDENTIFIER, "oid-value");
        let (mut id, _) = accessor_with(HeaderMap::new(), Some(principal));
        assert_eq!(id.user_id_opt(), Some("oid-value".to_string()));
    }

    #[test]
    fn user_id_falls_back_to_sub() {
        let principal = SecurityPrincipal::authenticated().with_claim(SUBJECT, "u1");
        let (mut id, _) = accessor_with(HeaderMap::new(), Some(principal));
        assert_eq!(id.user_id_opt(), Some("u1".to_string()));
        assert_eq!(id.user_id(), Ok("u1".to_string()));
    }

    #[test]
    fn user_id_is_memoized_against_principal_mutation() {
        let principal = SecurityPrincipal::authenticated().with_claim(SUBJECT, "u1");
        let (mut id, ctx) = accessor_with(HeaderMap::new(), Some(principal));
        assert_eq!(id.user_id_opt(), Some("u1".to_string()));

        *ctx.principal.lock().unwrap() =
            Some(SecurityPrincipal::authenticated().with_claim(SUBJECT, "u2"));
        assert_eq!(id.user_id_opt(), Some("u1".to_string()));
    }

    #[test]
    fn unauthenticated_miss_is_not_cached() {
        let (mut id, ctx) = accessor_with(HeaderMap::new(), None);
        assert_eq!(id.user_id_opt(), None);

        // Auth middleware runs later in the pipeline and attaches the principal.
        *ctx.principal.lock().unwrap() =
            Some(SecurityPrincipal::authenticated().with_claim(SUBJECT, "late"));
        assert_eq!(id.user_id_opt(), Some("late".to_string()));
    }

    #[test]
    fn authenticated_claimless_miss_is_cached() {
        let (mut id, ctx) = accessor_with(HeaderMap::new(), Some(SecurityPrincipal::authenticated()));
        assert_eq!(id.user_id_opt(), None);

        // Stable miss: a claim appearing afterwards must not change the answer.
        *ctx.principal.lock().unwrap() =
            Some(SecurityPrincipal::authenticated().with_claim(SUBJECT, "too-late"));
        assert_eq!(id.user_id_opt(), None);
        assert_eq!(id.user_id(), Err(IdentityError::Unauthorized));
    }

    #[test]
    fn email_standard_claim_wins_over_legacy() {
        let principal = SecurityPrincipal::authenticated()
            .with_claim(EMAILS, "legacy@b.com")
            .with_claim(EMAIL_ADDRESS, "std@b.com");
        let (mut id, _) = accessor_with(HeaderMap::new(), Some(principal));
        assert_eq!(id.email_opt(), Some("std@b.com".to_string()));
    }

    #[test]
    fn email_falls_back_to_legacy_emails_claim() {
        let principal = SecurityPrincipal::authenticated().with_claim(EMAILS, "a@b.com");
        let (mut id, _) = accessor_with(HeaderMap::new(), Some(principal));
        assert_eq!(id.email_opt(), Some("a@b.com".to_string()));
        assert_eq!(id.email(), Ok("a@b.com".to_string()));
    }

    #[test]
    fn bearer_parse_is_case_and_whitespace_tolerant() {
        let (mut id, _) = accessor_with(auth_header("bEaReR   abc123"), None);
        assert_eq!(id.jwt_opt(), Some("abc123".to_string()));
        assert_eq!(id.jwt(), Ok("abc123".to_string()));
    }

    #[test]
    fn bearer_without_token_is_a_cached_miss() {
        let (mut id, _) = accessor_with(auth_header("Bearer"), None);
        assert_eq!(id.jwt_opt(), None);
        assert_eq!(id.jwt(), Err(IdentityError::Unauthorized));
    }

    #[test]
    fn empty_authorization_value_is_a_cached_miss() {
        let (mut id, _) = accessor_with(auth_header("   "), None);
        assert_eq!(id.jwt_opt(), None);
    }

    #[test]
    fn non_bearer_scheme_parameter_is_accepted() {
        let (mut id, _) = accessor_with(auth_header("Token xyz"), None);
        assert_eq!(id.jwt_opt(), Some("xyz".to_string()));
    }

    #[test]
    fn schemeless_garbage_is_a_cached_miss() {
        let (mut id, _) = accessor_with(auth_header("garbage"), None);
        assert_eq!(id.jwt_opt(), None);
    }

    #[test]
    fn missing_authorization_header_is_a_cached_miss() {
        // Policy: the header key being absent on a live request is a genuine
        // miss. Only the absence of the request context itself is transient.
        let (mut id, ctx) = accessor_with(HeaderMap::new(), None);
        assert_eq!(id.jwt_opt(), None);

        // Even if the header appears later, the first answer sticks for this
        // accessor instance.
        ctx.headers
            .lock()
            .unwrap()
            .insert("authorization", HeaderValue::from_static("Bearer late"));
        assert_eq!(id.jwt_opt(), None);
    }

    #[test]
    fn detached_accessor_never_caches_jwt_miss() {
        let mut id = RequestIdentity::detached();
        assert_eq!(id.jwt_opt(), None);
        assert_eq!(id.api_key(), None);
        assert_eq!(id.user_id(), Err(IdentityError::Unauthorized));
    }

    #[test]
    fn api_key_reads_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("secret-1"),
        );
        let (id, ctx) = accessor_with(headers, None);
        assert_eq!(id.api_key(), Some("secret-1".to_string()));

        // Renamed header via config.
        let id = RequestIdentity::new(ctx).with_api_key_header("x-service-key");
        assert_eq!(id.api_key(), None);
    }

    #[test]
    fn empty_api_key_value_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static(""),
        );
        let (id, _) = accessor_with(headers, None);
        assert_eq!(id.api_key(), None);
    }

    #[test]
    fn has_roles_empty_list_is_vacuously_true_with_principal() {
        let (id, _) = accessor_with(HeaderMap::new(), Some(SecurityPrincipal::anonymous()));
        assert!(id.has_roles(&[]));

        let (id, _) = accessor_with(HeaderMap::new(), Some(SecurityPrincipal::authenticated()));
        assert!(id.has_roles(&[]));

        let (id, _) = accessor_with(HeaderMap::new(), None);
        assert!(!id.has_roles(&[]));
    }

    #[test]
    fn has_roles_requires_every_role() {
        let principal = SecurityPrincipal::authenticated()
            .with_role("Admin")
            .with_role("User");
        let (id, _) = accessor_with(HeaderMap::new(), Some(principal));
        assert!(id.has_roles(&["Admin", "User"]));
        assert!(!id.has_roles(&["Admin", "Auditor"]));
    }

    #[test]
    fn is_admin_is_memoized_across_principal_mutation() {
        let principal = SecurityPrincipal::authenticated().with_role(ADMIN_ROLE);
        let (mut id, ctx) = accessor_with(HeaderMap::new(), Some(principal));
        assert!(id.is_admin());

        *ctx.principal.lock().unwrap() = Some(SecurityPrincipal::authenticated());
        assert!(id.is_admin());
        assert!(!id.is_not_admin());
    }

    #[test]
    fn non_admin_result_is_cached_immediately() {
        let (mut id, ctx) = accessor_with(HeaderMap::new(), None);
        assert!(!id.is_admin());

        *ctx.principal.lock().unwrap() =
            Some(SecurityPrincipal::authenticated().with_role(ADMIN_ROLE));
        assert!(!id.is_admin());
    }

    #[test]
    fn internal_context_overrides_everything() {
        let principal = SecurityPrincipal::authenticated()
            .with_claim(SUBJECT, "real-user")
            .with_claim(EMAIL_ADDRESS, "real@user.com");
        let (mut id, _) = accessor_with(HeaderMap::new(), Some(principal));

        id.set_internal_context("example.com");
        assert_eq!(
            id.user_id(),
            Ok("00000000-0000-0000-0000-000000000000".to_string())
        );
        assert_eq!(id.email(), Ok("internal@example.com".to_string()));
        assert!(id.is_admin());
    }

    #[test]
    fn internal_context_on_detached_accessor() {
        let mut id = RequestIdentity::detached();
        id.set_internal_context("svc.local");
        assert_eq!(id.email_opt(), Some("internal@svc.local".to_string()));
        assert_eq!(id.user_id_opt(), Some(Uuid::nil().to_string()));
        assert!(id.is_admin());
    }

    #[test]
    fn http_request_context_distinguishes_missing_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer t"));
        let ctx = HttpRequestContext::new(headers, None);
        assert_eq!(
            ctx.header_values("authorization"),
            Some(vec!["Bearer t".to_string()])
        );
        assert_eq!(ctx.header_values("x-api-key"), None);
    }
}
