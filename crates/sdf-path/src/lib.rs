#![deny(warnings)]

//! Immutable absolute paths identifying prims and properties (§3.1).
//!
//! A [`Path`] is one of two kinds: a [`PrimPath`] (`/A/B/C`) or a
//! [`PropertyPath`] (a prim path plus a property name and optional field,
//! `/A/B/C.prop` or `/A/B/C.prop.field`). Both are immutable once built;
//! mutation-shaped operations (`parent`, `child`, `remap`) return new values.

mod error;
mod path;
mod prim_path;
mod property_path;
mod segment;

pub use error::PathError;
pub use path::{property, remap_path_string, strip_angle_wrapper, Path};
pub use prim_path::PrimPath;
pub use property_path::PropertyPath;
pub use segment::PrimComponent;

use std::str::FromStr;

impl FromStr for PrimPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use crate::{Path, PrimPath};

    impl Serialize for PrimPath {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for PrimPath {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Self::parse(&s).map_err(D::Error::custom)
        }
    }

    impl Serialize for Path {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Path {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Self::parse(&s).map_err(D::Error::custom)
        }
    }
}
