use crate::builder::{AUDIENCE_ENV, ISSUER_CERT_ENV};

/// Reasons an access token is rejected.
///
/// All of these are fatal to the request presenting the token. None of them can be fixed by
/// retrying with the same token.
#[derive(thiserror::Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// No trusted key verifies the token signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token is used at or after its expiration time.
    #[error("token expired")]
    Expired,

    /// The token is used before its issued-at time.
    #[error("token not yet valid")]
    NotYetValid,

    /// This service is not among the token's audience.
    #[error("audience mismatch")]
    AudienceMismatch,

    /// The token is structurally broken, or its claims have the wrong shape.
    #[error("malformed claims")]
    MalformedClaims,

    /// The token was issued by someone else than the trusted issuer.
    #[error("untrusted issuer")]
    UntrustedIssuer,
}

/// Errors that can happen either during configuration or while verifying a token.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The presented access token was rejected.
    ///
    /// The message deliberately does not say why. The [DecodeError] is available as the
    /// error source for internal logging.
    #[error("unauthorized")]
    Unauthorized(#[source] DecodeError),

    /// No bearer token was presented.
    #[error("unauthorized")]
    MissingBearerToken,

    /// A problem with trusted key material.
    #[error("key material error: {0}")]
    KeyMaterial(&'static str),

    /// Incomplete or invalid configuration.
    #[error("configuration error: {0}")]
    Config(&'static str),

    /// Automatic environment inference did not work.
    #[error("environment not inferrable: {AUDIENCE_ENV} is not set")]
    EnvironmentNotInferrable,

    /// Reading the issuer certificate failed.
    #[error("issuer certificate ({ISSUER_CERT_ENV}) not readable: {0}")]
    IssuerCertificate(anyhow::Error),
}

impl Error {
    /// The specific reason a token was rejected, if that is what happened.
    pub fn decode_error(&self) -> Option<DecodeError> {
        match self {
            Self::Unauthorized(err) => Some(*err),
            _ => None,
        }
    }
}

pub(crate) fn issuer_certificate(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::IssuerCertificate(anyhow::Error::from(err))
}
