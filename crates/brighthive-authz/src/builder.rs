use std::{borrow::Cow, num::NonZeroUsize, sync::Arc};

use arc_swap::ArcSwap;

use crate::{
    cache::DecisionCache,
    error,
    keys::{KeySet, TrustedKey},
    Authorizer, AuthorizerState, Error,
};

/// Environment variable naming this service, as listed in token audiences.
pub const AUDIENCE_ENV: &str = "BRIGHTHIVE_AUDIENCE";

/// Environment variable overriding the trusted issuer name.
pub const ISSUER_ENV: &str = "BRIGHTHIVE_ISSUER";

/// Environment variable overriding [ISSUER_CERT_PATH].
pub const ISSUER_CERT_ENV: &str = "BRIGHTHIVE_ISSUER_CERT";

/// Default location of the issuer certificate.
pub const ISSUER_CERT_PATH: &str = "/etc/brighthive/authserver.crt";

/// The issuer of Brighthive access tokens.
pub const DEFAULT_ISSUER: &str = "brighthive-authserver";

/// Default number of cached decisions.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// A builder for configuring an [Authorizer].
pub struct AuthorizerBuilder {
    audience: Option<String>,
    issuer: Cow<'static, str>,
    keys: Vec<TrustedKey>,
    cache_capacity: Option<usize>,
}

impl AuthorizerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            audience: None,
            issuer: Cow::Borrowed(DEFAULT_ISSUER),
            keys: vec![],
            cache_capacity: Some(DEFAULT_CACHE_CAPACITY),
        }
    }

    /// Infer the configuration from the environment the service runs in.
    ///
    /// Reads the audience from [AUDIENCE_ENV], optionally the issuer from [ISSUER_ENV],
    /// and trusts the public key of the issuer certificate found at [ISSUER_CERT_ENV]
    /// or [ISSUER_CERT_PATH].
    pub fn from_environment(mut self) -> Result<Self, Error> {
        let audience = std::env::var(AUDIENCE_ENV).map_err(|_| Error::EnvironmentNotInferrable)?;

        if let Ok(issuer) = std::env::var(ISSUER_ENV) {
            self.issuer = issuer.into();
        }

        let cert_path =
            std::env::var(ISSUER_CERT_ENV).unwrap_or_else(|_| ISSUER_CERT_PATH.to_string());
        let cert = std::fs::read(&cert_path).map_err(error::issuer_certificate)?;

        self.keys.push(TrustedKey::from_certificate_pem(&cert)?);
        self.audience = Some(audience);

        Ok(self)
    }

    /// The name of this service, as listed in the audience of tokens it accepts.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Override the trusted issuer (default is `brighthive-authserver`).
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into().into();
        self
    }

    /// Trust a signing key.
    pub fn with_key(mut self, key: TrustedKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Trust the public key of a PEM-encoded issuer certificate.
    pub fn with_issuer_certificate_pem(mut self, cert: &[u8]) -> Result<Self, Error> {
        self.keys.push(TrustedKey::from_certificate_pem(cert)?);
        Ok(self)
    }

    /// Set the maximum number of cached decisions.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Evaluate every authorization request, caching nothing.
    pub fn without_cache(mut self) -> Self {
        self.cache_capacity = None;
        self
    }

    /// Build the authorizer.
    pub fn build(self) -> Result<Authorizer, Error> {
        let audience = self
            .audience
            .ok_or_else(|| Error::Config("audience not provided"))?;

        if self.keys.is_empty() {
            return Err(Error::KeyMaterial("no trusted keys"));
        }

        let cache = match self.cache_capacity {
            Some(capacity) => Some(DecisionCache::new(
                NonZeroUsize::new(capacity)
                    .ok_or_else(|| Error::Config("cache capacity must be non-zero"))?,
            )),
            None => None,
        };

        let keys = self
            .keys
            .into_iter()
            .fold(KeySet::new(self.issuer), KeySet::with_key);

        Ok(Authorizer {
            state: Arc::new(AuthorizerState {
                audience,
                keys: ArcSwap::new(Arc::new(keys)),
                cache,
            }),
        })
    }
}
