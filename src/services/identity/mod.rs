/*
 * Responsibility
 * - identity service の公開インターフェース (re-export)
 * - accessor / principal / context / claims / error を束ねる
 */
pub mod accessor;
pub mod claims;
pub mod context;
pub mod error;
pub mod principal;

pub use accessor::{ADMIN_ROLE, DEFAULT_API_KEY_HEADER, RequestIdentity};
pub use claims::Claim;
pub use context::{HttpRequestContext, RequestContext};
pub use error::IdentityError;
pub use principal::SecurityPrincipal;
