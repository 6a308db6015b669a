//! Authorization decisions.
//!
//! Denials are ordinary outcomes: every function here returns a [Decision], and never fails.

use tracing::debug;

use crate::{context::AuthorizationContext, permission::Permission, role::Role};

/// The reason behind a [Decision].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Reason {
    /// Allowed: the subject is a super admin.
    SuperAdmin,

    /// Allowed: the subject holds the required role and permission.
    Granted,

    /// Denied: the token carries no claim for the resource.
    UnknownResource,

    /// Denied: the role held is below the one required.
    RoleTooLow,

    /// Denied: the permission is not granted on the resource.
    InsufficientPermission,

    /// Denied: the subject holds no role in the requested scope.
    NoRole,
}

impl Reason {
    /// Whether the reason implies access is allowed.
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Granted)
    }
}

/// The outcome of an authorization query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Decision {
    /// Whether access is allowed.
    pub allow: bool,

    /// Why access was allowed or denied.
    pub reason: Reason,
}

impl From<Reason> for Decision {
    fn from(reason: Reason) -> Self {
        Self {
            allow: reason.is_allow(),
            reason,
        }
    }
}

/// Evaluate `permission` on the data resource `resource_id`.
///
/// A super admin is allowed everything, including resources the token says nothing about.
/// Anyone else needs a claim on the resource whose role satisfies [Permission::min_role],
/// and which lists the exact permission.
///
/// The scoped role in [AuthorizationContext::role] plays no part here: an organization or
/// collaboration admin has no implicit access to resources. Use [authorize_role] for
/// scope-level checks.
pub fn authorize(
    ctx: &AuthorizationContext<'_>,
    resource_id: &str,
    permission: &Permission,
) -> Decision {
    let reason = if ctx.is_super_admin() {
        Reason::SuperAdmin
    } else {
        match ctx.resource(resource_id) {
            None => Reason::UnknownResource,
            Some(claim) if claim.role < permission.min_role() => Reason::RoleTooLow,
            Some(claim) if !claim.has_permission(permission) => Reason::InsufficientPermission,
            Some(_) => Reason::Granted,
        }
    };

    debug!(resource_id, %permission, ?reason, "resource authorization");

    reason.into()
}

/// Evaluate whether the role resolved for the request scope is at least `required`.
pub fn authorize_role(ctx: &AuthorizationContext<'_>, required: Role) -> Decision {
    let reason = if ctx.is_super_admin() {
        Reason::SuperAdmin
    } else {
        match ctx.role() {
            None => Reason::NoRole,
            Some(role) if role < required => Reason::RoleTooLow,
            Some(_) => Reason::Granted,
        }
    };

    debug!(%required, ?reason, "scope authorization");

    reason.into()
}
