//! Role resolution.
//!
//! Resolution turns a [ClaimSet] plus the organization and collaboration the current request
//! is scoped to into an [AuthorizationContext], which all authorization decisions of the
//! request are evaluated against.

use tracing::trace;

use crate::{
    claims::{ClaimSet, Fingerprint, ResourceClaim},
    role::Role,
};

/// A read-only view of a [ClaimSet], resolved for one request.
///
/// The context borrows the claim set it was resolved from and is meant to live no longer than
/// the request that created it.
#[derive(Clone, Debug)]
pub struct AuthorizationContext<'c> {
    claims: &'c ClaimSet,
    super_admin: bool,
    role: Option<Role>,
    fingerprint: Fingerprint,
}

/// Resolve the effective role of the token subject in the given scopes.
///
/// - A super admin is an admin everywhere, no scoped lookup is performed.
/// - An id missing from its role mapping contributes no role. This is not an error.
/// - When both the organization and the collaboration grant a role, the most privileged
///   of the two applies.
pub fn resolve<'c>(
    claims: &'c ClaimSet,
    organization_id: Option<&str>,
    collaboration_id: Option<&str>,
) -> AuthorizationContext<'c> {
    let super_admin = claims.is_super_admin();

    let role = if super_admin {
        Some(Role::Admin)
    } else {
        let org_role = organization_id.and_then(|id| claims.org_roles().get(id).copied());
        let collaboration_role =
            collaboration_id.and_then(|id| claims.collaboration_roles().get(id).copied());

        trace!(?org_role, ?collaboration_role, "resolved scoped roles");

        org_role.max(collaboration_role)
    };

    AuthorizationContext {
        claims,
        super_admin,
        role,
        fingerprint: claims.fingerprint(),
    }
}

impl<'c> AuthorizationContext<'c> {
    /// Whether the subject is a super admin.
    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    /// The effective role in the resolved scope, if any.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// The claim set this context was resolved from.
    pub fn claims(&self) -> &'c ClaimSet {
        self.claims
    }

    /// The fingerprint of the underlying claim set.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Look up the claim on a data resource.
    pub fn resource(&self, resource_id: &str) -> Option<&'c ResourceClaim> {
        self.claims.resource_claims().get(resource_id)
    }
}
