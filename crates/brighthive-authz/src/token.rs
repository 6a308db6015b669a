//! Token utilities.

use brighthive_common::claims::ClaimSet;
use http::{header::AUTHORIZATION, HeaderMap};

/// A verified access token, both in encoded and decoded format.
#[derive(Clone, Debug)]
pub struct VerifiedToken {
    /// The access token in JWT format
    pub token: String,

    /// The decoded/verified token claims
    pub claims: ClaimSet,
}

/// Extract the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
