//! Trusted key material.

use jsonwebtoken::{Algorithm, DecodingKey, Header};

use crate::Error;

/// A key that may verify access token signatures.
#[derive(Clone)]
pub struct TrustedKey {
    kid: Option<String>,
    algorithm: Algorithm,
    key: DecodingKey,
}

impl TrustedKey {
    /// A key verifying signatures made with `algorithm`.
    pub fn new(algorithm: Algorithm, key: DecodingKey) -> Self {
        Self {
            kid: None,
            algorithm,
            key,
        }
    }

    /// A shared HS256 secret.
    pub fn hmac_secret(secret: &[u8]) -> Self {
        Self::new(Algorithm::HS256, DecodingKey::from_secret(secret))
    }

    /// The ES256 public key of an issuer, taken from its PEM-encoded X.509 certificate.
    pub fn from_certificate_pem(cert: &[u8]) -> Result<Self, Error> {
        let pem = pem::parse(cert).map_err(|_| Error::KeyMaterial("invalid issuer certificate"))?;

        let (_, x509_cert) = x509_parser::parse_x509_certificate(pem.contents())
            .map_err(|_| Error::KeyMaterial("invalid issuer certificate"))?;

        let public_key = x509_cert.public_key();

        // Assume that EC P-256 is always used
        Ok(Self::new(
            Algorithm::ES256,
            DecodingKey::from_ec_der(&public_key.subject_public_key.data),
        ))
    }

    /// Identify the key, so tokens carrying a matching `kid` header select it.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// The key id, if any.
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// The signature algorithm this key verifies.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl std::fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// The keys trusted to sign tokens for one issuer.
///
/// A set rather than a single key, so a rotation can overlap old and new keys.
#[derive(Clone, Debug)]
pub struct KeySet {
    issuer: String,
    keys: Vec<TrustedKey>,
}

impl KeySet {
    /// An empty key set for the named issuer.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            keys: vec![],
        }
    }

    /// Add a key to the set.
    pub fn with_key(mut self, key: TrustedKey) -> Self {
        self.keys.push(key);
        self
    }

    /// The name tokens must carry in their `iss` claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The trusted keys.
    pub fn keys(&self) -> &[TrustedKey] {
        &self.keys
    }

    /// The number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys that may have signed a token with the given header.
    ///
    /// When the header names a `kid` known to this set, only keys with that id are candidates.
    /// Candidates always match the header algorithm.
    pub(crate) fn candidates<'k>(
        &'k self,
        header: &'k Header,
    ) -> impl Iterator<Item = &'k TrustedKey> + 'k {
        let kid = header
            .kid
            .as_deref()
            .filter(|kid| self.keys.iter().any(|key| key.kid() == Some(kid)));

        self.keys.iter().filter(move |key| {
            key.algorithm == header.alg && kid.is_none_or(|kid| key.kid() == Some(kid))
        })
    }
}
