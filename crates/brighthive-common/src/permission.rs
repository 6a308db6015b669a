//! Data resource permissions.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{role::Role, FromStrVisitor};

/// View the data of a resource.
pub const DATA_VIEW: &str = "data:view";
/// Download the data of a resource.
pub const DATA_DOWNLOAD: &str = "data:download";
/// Edit the data of a resource.
pub const DATA_EDIT: &str = "data:edit";
/// View the data dictionary of a resource.
pub const DATA_DICT_VIEW: &str = "data-dict:view";
/// Download the data dictionary of a resource.
pub const DATA_DICT_DOWNLOAD: &str = "data-dict:download";
/// Edit the data dictionary of a resource.
pub const DATA_DICT_EDIT: &str = "data-dict:edit";

/// A permission on a single data resource.
///
/// Permissions are opaque non-empty strings. The known vocabulary is written as
/// `<domain>:<action>`, e.g. `data:view` and `data-dict:edit`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
    qualified: String,
    separator: Option<usize>,
}

impl Permission {
    /// The domain the permission applies to, e.g. `data` or `data-dict`.
    ///
    /// The whole string when it has no `:`.
    pub fn domain(&self) -> &str {
        match self.separator {
            Some(separator) => &self.qualified[..separator],
            None => &self.qualified,
        }
    }

    /// The action the permission allows, e.g. `view` or `edit`.
    pub fn action(&self) -> Option<&str> {
        self.separator.map(|separator| &self.qualified[separator + 1..])
    }

    /// The full permission string.
    pub fn as_str(&self) -> &str {
        &self.qualified
    }

    /// The minimum role a resource claim must carry for this permission to take effect.
    ///
    /// Actions outside the known vocabulary, and permissions without an action,
    /// require [Role::Admin].
    pub fn min_role(&self) -> Role {
        match self.action() {
            Some("view") => Role::ThirdParty,
            Some("download" | "edit") => Role::User,
            _ => Role::Admin,
        }
    }
}

impl FromStr for Permission {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty permission");
        }

        Ok(Self {
            qualified: s.to_string(),
            separator: s.find(':'),
        })
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified)
    }
}

impl std::fmt::Debug for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.qualified)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(FromStrVisitor::new("permission"))
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.qualified)
    }
}
