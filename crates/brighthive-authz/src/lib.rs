//! `brighthive-authz` verifies Brighthive access tokens and answers authorization questions
//! against their claims.
//!
//! ```no_run
//! # use brighthive_authz::*;
//! # fn handle(headers: &http::HeaderMap) -> Result<bool, Error> {
//! let authorizer = Authorizer::builder().from_environment()?.build()?;
//!
//! let token = authorizer.verify_request(headers)?;
//! let ctx = authorizer.resolve(&token, Some("organization-uuid"), None);
//! let permission = "data:view".parse().unwrap();
//! let decision = authorizer.authorize(&ctx, "data-resource-uuid", &permission);
//!
//! Ok(decision.allow)
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use arc_swap::ArcSwap;
use brighthive_common::{
    context::{self, AuthorizationContext},
    decision::{self, Decision},
    permission::Permission,
    role::Role,
};
use cache::{DecisionCache, DecisionKey};
use http::HeaderMap;
use keys::KeySet;
use token::VerifiedToken;
use tracing::info;

pub use builder::AuthorizerBuilder;
pub use error::{DecodeError, Error};

mod builder;
mod error;

pub mod cache;
pub mod decoder;
pub mod keys;

/// Token utilities.
pub mod token;

pub use builder::{
    AUDIENCE_ENV, DEFAULT_CACHE_CAPACITY, DEFAULT_ISSUER, ISSUER_CERT_ENV, ISSUER_CERT_PATH,
    ISSUER_ENV,
};

/// The authorizer handle.
///
/// Cloning is cheap, clones share key material and the decision cache.
#[derive(Clone)]
pub struct Authorizer {
    state: Arc<AuthorizerState>,
}

struct AuthorizerState {
    audience: String,
    keys: ArcSwap<KeySet>,
    cache: Option<DecisionCache>,
}

impl Authorizer {
    /// Construct a new builder.
    pub fn builder() -> AuthorizerBuilder {
        AuthorizerBuilder::new()
    }

    /// The name of this service in token audiences.
    pub fn audience(&self) -> &str {
        &self.state.audience
    }

    /// The currently trusted key set.
    pub fn keys(&self) -> Arc<KeySet> {
        self.state.keys.load_full()
    }

    /// Replace the trusted key set.
    ///
    /// Verifications in progress finish with the key set they started with.
    pub fn replace_keys(&self, keys: KeySet) {
        info!(issuer = keys.issuer(), keys = keys.len(), "replacing trusted keys");
        self.state.keys.store(Arc::new(keys));
    }

    /// Verify an access token at the current time.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, Error> {
        self.verify_at(token, now())
    }

    /// Verify an access token at the given time (Unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedToken, Error> {
        let claims = decoder::decode(token, &self.state.keys.load(), &self.state.audience, now)
            .map_err(Error::Unauthorized)?;

        Ok(VerifiedToken {
            token: token.to_string(),
            claims,
        })
    }

    /// Verify the bearer token of a request at the current time.
    pub fn verify_request(&self, headers: &HeaderMap) -> Result<VerifiedToken, Error> {
        let token = token::bearer_token(headers).ok_or(Error::MissingBearerToken)?;
        self.verify(token)
    }

    /// Resolve the context of a request scoped to an organization and/or collaboration.
    pub fn resolve<'c>(
        &self,
        token: &'c VerifiedToken,
        organization_id: Option<&str>,
        collaboration_id: Option<&str>,
    ) -> AuthorizationContext<'c> {
        context::resolve(&token.claims, organization_id, collaboration_id)
    }

    /// Authorize `permission` on a data resource at the current time.
    pub fn authorize(
        &self,
        ctx: &AuthorizationContext<'_>,
        resource_id: &str,
        permission: &Permission,
    ) -> Decision {
        self.authorize_at(ctx, resource_id, permission, now())
    }

    /// Authorize `permission` on a data resource at the given time (Unix seconds).
    ///
    /// The time only matters to the decision cache, which never serves a decision past the
    /// expiry of the token it was made for.
    pub fn authorize_at(
        &self,
        ctx: &AuthorizationContext<'_>,
        resource_id: &str,
        permission: &Permission,
        now: i64,
    ) -> Decision {
        let Some(cache) = &self.state.cache else {
            return decision::authorize(ctx, resource_id, permission);
        };

        let key = DecisionKey {
            fingerprint: ctx.fingerprint(),
            resource_id: resource_id.to_string(),
            permission: permission.clone(),
        };

        cache.get_or_compute(key, ctx.claims().expires_at(), now, || {
            decision::authorize(ctx, resource_id, permission)
        })
    }

    /// Authorize that the role resolved for the request scope is at least `required`.
    pub fn authorize_role(&self, ctx: &AuthorizationContext<'_>, required: Role) -> Decision {
        decision::authorize_role(ctx, required)
    }

    /// Drop every cached decision.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.state.cache {
            cache.invalidate_all();
        }
    }

    /// The number of cached decisions.
    pub fn cached_decisions(&self) -> usize {
        self.state.cache.as_ref().map(DecisionCache::len).unwrap_or(0)
    }
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
