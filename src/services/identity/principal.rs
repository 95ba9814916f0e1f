/*
 * Responsibility
 * - リクエストに紐づく認証済み主体 (SecurityPrincipal) の型
 * - middleware (またはテスト) が組み立てて request extensions に格納する
 * - claims は順序を保持し、role membership は predicate として公開する
 */
use std::collections::BTreeSet;

use crate::services::identity::claims::Claim;

/// The security principal attached to a request.
///
/// - `authenticated` が false のまま claims を持つこともある
///   (認証 middleware がまだ走っていない、または検証に失敗したケース)
/// - claims の順序はトークン上の出現順をそのまま保持する
#[derive(Debug, Clone, Default)]
pub struct SecurityPrincipal {
    authenticated: bool,
    claims: Vec<Claim>,
    roles: BTreeSet<String>,
}

impl SecurityPrincipal {
    /// An unauthenticated principal with no claims.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated principal; add claims/roles with the builder methods.
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Ordered claim list.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Role membership predicate (exact match).
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
