//! Brighthive roles.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::FromStrVisitor;

/// A role granted to the token subject, either within an organization, a collaboration
/// or on a single data resource.
///
/// Roles are totally ordered by privilege: `Admin > User > ThirdParty`.
/// The ordering is policy, it is not carried by the token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Role {
    /// An external party with the least privilege.
    ThirdParty,

    /// A regular member.
    User,

    /// An administrator.
    Admin,
}

impl Role {
    /// The canonical (lowercase) label of the role.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ThirdParty => "third-party",
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Roles are matched case-insensitively.
///
/// Organization and collaboration roles are issued in lowercase (`"admin"`),
/// while data resource claims capitalize them (`"Admin"`).
impl FromStr for Role {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else if s.eq_ignore_ascii_case("user") {
            Ok(Self::User)
        } else if s.eq_ignore_ascii_case("third-party") {
            Ok(Self::ThirdParty)
        } else {
            Err("expected one of \"admin\", \"user\" or \"third-party\"")
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(FromStrVisitor::new("role"))
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

#[test]
fn privilege_order() {
    assert!(Role::Admin > Role::User);
    assert!(Role::User > Role::ThirdParty);
    assert_eq!(Role::Admin, Role::User.max(Role::Admin));
}

#[test]
fn parse_any_case() {
    assert_eq!(Ok(Role::Admin), "Admin".parse());
    assert_eq!(Ok(Role::ThirdParty), "Third-Party".parse());
    assert_eq!(Ok(Role::User), "user".parse());
    assert!("owner".parse::<Role>().is_err());
    assert!("third_party".parse::<Role>().is_err());
}
