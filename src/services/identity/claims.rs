/*
 * Responsibility
 * - Claim 型 (type/value ペア) の定義
 * - 互換性のために固定された claim type 文字列の定義
 * - 優先順位付き claim lookup (最初の非空値を返す純関数)
 */

/// Azure AD object identifier claim (long form).
pub const OBJECT_IDENTIFIER: &str =
    "http://schemas.microsoft.com/identity/claims/objectidentifier";

/// Short form emitted by some token variants.
pub const OBJECT_IDENTIFIER_SHORT: &str = "oid";

/// WS-* name identifier claim (ClaimTypes.NameIdentifier).
pub const NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// OIDC subject.
pub const SUBJECT: &str = "sub";

/// WS-* email claim (ClaimTypes.Email).
pub const EMAIL_ADDRESS: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";

/// Legacy B2C-style email collection claim.
pub const EMAILS: &str = "emails";

/// Lookup order for the user id: object identifier first, `sub` last.
pub const USER_ID_LOOKUP: [&str; 4] = [
    OBJECT_IDENTIFIER,
    OBJECT_IDENTIFIER_SHORT,
    NAME_IDENTIFIER,
    SUBJECT,
];

/// Lookup order for the email: standard claim first, legacy `emails` fallback.
pub const EMAIL_LOOKUP: [&str; 2] = [EMAIL_ADDRESS, EMAILS];

/// A single typed fact about a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Evaluate the lookup keys in priority order against the ordered claim list
/// and return the first non-empty value.
///
/// 空文字の claim は「無い」扱いでスキップし、次の候補 type へフォールバックする。
pub fn first_claim_value(claims: &[Claim], lookup: &[&str]) -> Option<String> {
    lookup.iter().find_map(|claim_type| {
        claims
            .iter()
            .find(|c| c.claim_type == *claim_type && !c.value.is_empty())
            .map(|c| c.value.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_earlier_lookup_key() {
        let claims = vec![
            Claim::new(SUBJECT, "sub-1"),
            Claim::new(OBJECT_IDENTIFIER, "oid-1"),
        ];
        assert_eq!(
            first_claim_value(&claims, &USER_ID_LOOKUP),
            Some("oid-1".to_string())
        );
    }

    #[test]
    fn falls_back_to_sub_when_nothing_else_present() {
        let claims = vec![Claim::new(SUBJECT, "u1")];
        assert_eq!(
            first_claim_value(&claims, &USER_ID_LOOKUP),
            Some("u1".to_string())
        );
    }

    #[test]
    fn empty_value_does_not_satisfy_a_lookup_key() {
        let claims = vec![
            Claim::new(EMAIL_ADDRESS, ""),
            Claim::new(EMAILS, "a@b.com"),
        ];
        assert_eq!(
            first_claim_value(&claims, &EMAIL_LOOKUP),
            Some("a@b.com".to_string())
        );
    }

    #[test]
    fn no_match_yields_none() {
        let claims = vec![Claim::new("upn", "x@y.z")];
        assert_eq!(first_claim_value(&claims, &EMAIL_LOOKUP), None);
    }

    #[test]
    fn first_of_duplicate_claims_wins() {
        let claims = vec![
            Claim::new(SUBJECT, "first"),
            Claim::new(SUBJECT, "second"),
        ];
        assert_eq!(
            first_claim_value(&claims, &[SUBJECT]),
            Some("first".to_string())
        );
    }
}
