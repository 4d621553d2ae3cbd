// Access decisions: combine a route classification with the resolved
// session. Total, side-effect free, no I/O.
use url::form_urlencoded;

use crate::routing::{AccessClass, Classification};
use crate::session::Session;

/// Outcome of the access decision for a single request.
/// Produced once per request, consumed once by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Proceed; session is passed through for personalization where present
    Allow(Option<Session>),
    /// Send the caller to the sign-in page, preserving the original path
    RedirectTo(String),
    /// Refuse the request outright
    Reject(String),
}

/// Reason attached to tenant-mismatch rejections
pub const FORBIDDEN: &str = "forbidden";

pub fn decide(
    classification: &Classification,
    session: Option<Session>,
    original: &str,
    sign_in_path: &str,
) -> Decision {
    match classification.class {
        AccessClass::Public => Decision::Allow(session),
        AccessClass::Authenticated => match session {
            Some(session) => Decision::Allow(Some(session)),
            None => Decision::RedirectTo(sign_in_target(sign_in_path, original)),
        },
        AccessClass::TenantScoped => match session {
            None => Decision::RedirectTo(sign_in_target(sign_in_path, original)),
            Some(session) => match classification.tenant.as_deref() {
                Some(tenant) if session.belongs_to(tenant) => Decision::Allow(Some(session)),
                // No resolvable tenant, or the caller is not a member
                _ => Decision::Reject(FORBIDDEN.to_string()),
            },
        },
    }
}

/// Build the sign-in redirect target with the original path as `return_to`
pub fn sign_in_target(sign_in_path: &str, original: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("return_to", original)
        .finish();
    format!("{sign_in_path}?{query}")
}
