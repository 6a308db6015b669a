//! Claims carried by the Brighthive access token JWT.
//!
//! Standard claims (`iss`, `aud`, `iat`, `exp`) are mandatory.
//! The Brighthive-specific claims are parsed leniently when absent and strictly when present:
//! a claim that exists but has the wrong shape is an error, never a silent default.

use std::collections::{BTreeMap, BTreeSet};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{permission::Permission, role::Role};

/// Claim names, bit-exact as they appear in the token payload.
pub mod names {
    /// The service that issued the token.
    pub const ISSUER: &str = "iss";
    /// The list of services the token is intended for.
    pub const AUDIENCE: &str = "aud";
    /// Issued at, in Unix seconds.
    pub const ISSUED_AT: &str = "iat";
    /// Expiration time, in Unix seconds.
    pub const EXPIRES_AT: &str = "exp";
    /// Reference to the opaque access token the JWT was minted for.
    pub const ACCESS_TOKEN: &str = "brighthive-access-token";
    /// Optional super admin flag.
    pub const SUPER_ADMIN: &str = "brighthive-super-admin";
    /// Organization id to role mapping.
    pub const ORG_ROLE: &str = "brighthive-org-role";
    /// Collaboration id to role mapping.
    pub const COLLABORATION_ROLE: &str = "brighthive-collaboration-role";
    /// Data resource id to resource claim mapping.
    pub const DATA_RESOURCE_CLAIMS: &str = "brighthive-data-resource-claims";
}

/// Errors found while interpreting a token payload.
#[derive(thiserror::Error, Debug)]
pub enum ClaimsError {
    /// The payload is not a JSON object.
    #[error("token payload is not an object")]
    NotAnObject,

    /// A mandatory claim is absent.
    #[error("missing claim `{0}`")]
    Missing(&'static str),

    /// A claim is present but has the wrong shape.
    #[error("malformed claim `{claim}`: {detail}")]
    Shape {
        /// The name of the claim.
        claim: &'static str,
        /// What was wrong with it.
        detail: String,
    },

    /// The claims are individually well-formed but inconsistent.
    #[error("invalid claims: {0}")]
    Invariant(&'static str),
}

/// The role and permissions granted on one data resource.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ResourceClaim {
    /// The role held on the resource.
    pub role: Role,

    /// The permissions held on the resource.
    pub permissions: BTreeSet<Permission>,
}

impl ResourceClaim {
    /// Whether the exact permission is granted.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// The decoded claims of a Brighthive access token.
///
/// A `ClaimSet` always satisfies `exp > iat > 0` and has a non-empty audience.
#[derive(Clone, PartialEq, Eq, Serialize, Debug)]
pub struct ClaimSet {
    #[serde(rename = "iss")]
    issuer: String,

    #[serde(rename = "aud")]
    audience: BTreeSet<String>,

    #[serde(rename = "iat")]
    issued_at: i64,

    #[serde(rename = "exp")]
    expires_at: i64,

    #[serde(rename = "brighthive-access-token")]
    access_token: String,

    #[serde(rename = "brighthive-super-admin")]
    super_admin: bool,

    #[serde(rename = "brighthive-org-role")]
    org_roles: BTreeMap<String, Role>,

    #[serde(rename = "brighthive-collaboration-role")]
    collaboration_roles: BTreeMap<String, Role>,

    #[serde(rename = "brighthive-data-resource-claims")]
    resource_claims: BTreeMap<String, ResourceClaim>,
}

impl ClaimSet {
    /// Interpret a token payload.
    ///
    /// Unknown claims are ignored. Fractional `iat` is rounded up and fractional `exp`
    /// rounded down to whole seconds.
    pub fn from_payload(mut payload: Map<String, Value>) -> Result<Self, ClaimsError> {
        let claims = Self {
            issuer: required(&mut payload, names::ISSUER)?,
            audience: required(&mut payload, names::AUDIENCE)?,
            issued_at: numeric_date(&mut payload, names::ISSUED_AT, f64::ceil)?,
            expires_at: numeric_date(&mut payload, names::EXPIRES_AT, f64::floor)?,
            access_token: required(&mut payload, names::ACCESS_TOKEN)?,
            super_admin: optional(&mut payload, names::SUPER_ADMIN)?.unwrap_or(false),
            org_roles: optional(&mut payload, names::ORG_ROLE)?.unwrap_or_default(),
            collaboration_roles: optional(&mut payload, names::COLLABORATION_ROLE)?
                .unwrap_or_default(),
            resource_claims: optional(&mut payload, names::DATA_RESOURCE_CLAIMS)?
                .unwrap_or_default(),
        };

        if claims.audience.is_empty() {
            return Err(ClaimsError::Invariant("audience is empty"));
        }
        if claims.issued_at <= 0 {
            return Err(ClaimsError::Invariant("issued-at is not positive"));
        }
        if claims.expires_at <= claims.issued_at {
            return Err(ClaimsError::Invariant("expiry is not after issued-at"));
        }

        Ok(claims)
    }

    /// The issuer of the token.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The intended recipients of the token.
    pub fn audience(&self) -> &BTreeSet<String> {
        &self.audience
    }

    /// Whether `name` is among the intended recipients.
    pub fn has_audience(&self, name: &str) -> bool {
        self.audience.contains(name)
    }

    /// Issued at, Unix seconds.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// Expiration time, Unix seconds. The token is valid strictly before this instant.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// The opaque access token reference.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Whether the subject is a Brighthive super admin.
    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    /// Roles per organization id.
    pub fn org_roles(&self) -> &BTreeMap<String, Role> {
        &self.org_roles
    }

    /// Roles per collaboration id.
    pub fn collaboration_roles(&self) -> &BTreeMap<String, Role> {
        &self.collaboration_roles
    }

    /// Resource claims per data resource id.
    pub fn resource_claims(&self) -> &BTreeMap<String, ResourceClaim> {
        &self.resource_claims
    }

    /// Compute the fingerprint of this claim set.
    ///
    /// Equal claim sets have equal fingerprints.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FingerprintHasher(Sha256::new());

        hasher.str(&self.issuer);
        hasher.len(self.audience.len());
        for aud in &self.audience {
            hasher.str(aud);
        }
        hasher.int(self.issued_at);
        hasher.int(self.expires_at);
        hasher.str(&self.access_token);
        hasher.int(self.super_admin as i64);

        for roles in [&self.org_roles, &self.collaboration_roles] {
            hasher.len(roles.len());
            for (id, role) in roles {
                hasher.str(id);
                hasher.str(role.label());
            }
        }

        hasher.len(self.resource_claims.len());
        for (id, claim) in &self.resource_claims {
            hasher.str(id);
            hasher.str(claim.role.label());
            hasher.len(claim.permissions.len());
            for permission in &claim.permissions {
                hasher.str(permission.as_str());
            }
        }

        Fingerprint(hasher.0.finalize().into())
    }
}

impl TryFrom<Value> for ClaimSet {
    type Error = ClaimsError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(payload) => Self::from_payload(payload),
            _ => Err(ClaimsError::NotAnObject),
        }
    }
}

/// A SHA-256 digest identifying a [ClaimSet].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest.
    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hexhex::hex(&self.0))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hexhex::hex(&self.0))
    }
}

/// Length-prefixed feeding, so adjacent fields cannot run into each other.
struct FingerprintHasher(Sha256);

impl FingerprintHasher {
    fn len(&mut self, len: usize) {
        self.0.update((len as u64).to_be_bytes());
    }

    fn int(&mut self, value: i64) {
        self.0.update(value.to_be_bytes());
    }

    fn str(&mut self, value: &str) {
        self.len(value.len());
        self.0.update(value.as_bytes());
    }
}

fn required<T: DeserializeOwned>(
    payload: &mut Map<String, Value>,
    claim: &'static str,
) -> Result<T, ClaimsError> {
    optional(payload, claim)?.ok_or(ClaimsError::Missing(claim))
}

/// A JWT NumericDate: integer or fractional Unix seconds, rounded with `round`.
fn numeric_date(
    payload: &mut Map<String, Value>,
    claim: &'static str,
    round: fn(f64) -> f64,
) -> Result<i64, ClaimsError> {
    let number: serde_json::Number = required(payload, claim)?;
    if let Some(seconds) = number.as_i64() {
        return Ok(seconds);
    }

    match number.as_f64().map(round) {
        Some(seconds) if seconds >= i64::MIN as f64 && seconds < i64::MAX as f64 => {
            Ok(seconds as i64)
        }
        _ => Err(ClaimsError::Shape {
            claim,
            detail: format!("timestamp {number} out of range"),
        }),
    }
}

fn optional<T: DeserializeOwned>(
    payload: &mut Map<String, Value>,
    claim: &'static str,
) -> Result<Option<T>, ClaimsError> {
    let Some(value) = payload.remove(claim) else {
        return Ok(None);
    };

    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| ClaimsError::Shape {
            claim,
            detail: err.to_string(),
        })
}
