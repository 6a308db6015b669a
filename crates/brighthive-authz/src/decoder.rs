//! Access token decoding and validation.

use brighthive_common::claims::ClaimSet;
use jsonwebtoken::{errors::ErrorKind, Header, Validation};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{keys::KeySet, DecodeError};

/// Decode and validate a compact-serialized access token.
///
/// The token is accepted when:
/// - a key from `keys` verifies its signature,
/// - its claims are well-formed,
/// - it was issued by the issuer of `keys`,
/// - `now` (Unix seconds) lies within `[iat, exp)`,
/// - `audience` is listed in its `aud` claim.
///
/// Decoding has no side effects. Decoding the same token twice gives equal claim sets.
pub fn decode(
    token: &str,
    keys: &KeySet,
    audience: &str,
    now: i64,
) -> Result<ClaimSet, DecodeError> {
    let result = try_decode(token, keys, audience, now);

    if let Err(err) = &result {
        debug!(?err, issuer = keys.issuer(), audience, "access token rejected");
    }

    result
}

fn try_decode(
    token: &str,
    keys: &KeySet,
    audience: &str,
    now: i64,
) -> Result<ClaimSet, DecodeError> {
    let header = jsonwebtoken::decode_header(token).map_err(|_| DecodeError::MalformedClaims)?;
    let payload = verify_signature(token, &header, keys)?;

    let claims = ClaimSet::from_payload(payload).map_err(|err| {
        debug!(%err, "claims rejected");
        DecodeError::MalformedClaims
    })?;

    if claims.issuer() != keys.issuer() {
        return Err(DecodeError::UntrustedIssuer);
    }

    if now < claims.issued_at() {
        return Err(DecodeError::NotYetValid);
    }

    if now >= claims.expires_at() {
        return Err(DecodeError::Expired);
    }

    if !claims.has_audience(audience) {
        return Err(DecodeError::AudienceMismatch);
    }

    Ok(claims)
}

/// Verify the token with each candidate key, returning the raw payload.
fn verify_signature(
    token: &str,
    header: &Header,
    keys: &KeySet,
) -> Result<Map<String, Value>, DecodeError> {
    // Temporal and audience claims are checked against the caller's clock afterwards
    let mut validation = Validation::new(header.alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    for key in keys.candidates(header) {
        match jsonwebtoken::decode::<Map<String, Value>>(token, key.decoding_key(), &validation) {
            Ok(token_data) => return Ok(token_data.claims),
            Err(err) => match err.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => return Err(DecodeError::MalformedClaims),
                _ => {
                    trace!(kid = key.kid(), ?err, "key did not verify token");
                }
            },
        }
    }

    Err(DecodeError::InvalidSignature)
}
