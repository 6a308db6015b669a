//! `brighthive-common` defines the claim types and authorization algorithms shared by services
//! that accept Brighthive access tokens.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{fmt::Display, marker::PhantomData, str::FromStr};

use serde::de::{Error, Visitor};

pub mod claims;
pub mod context;
pub mod decision;
pub mod permission;
pub mod role;

#[derive(Default)]
struct FromStrVisitor<T> {
    expecting: &'static str,
    phantom: PhantomData<T>,
}

impl<T> FromStrVisitor<T> {
    pub fn new(expecting: &'static str) -> Self {
        Self {
            expecting,
            phantom: PhantomData,
        }
    }
}

impl<T: FromStr> Visitor<'_> for FromStrVisitor<T>
where
    T::Err: Display,
{
    type Value = T;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.expecting)
    }

    fn visit_str<E: Error>(self, str: &str) -> Result<Self::Value, E> {
        T::from_str(str).map_err(|msg| E::custom(msg))
    }
}
