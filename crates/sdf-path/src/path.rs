use std::fmt::{self, Display, Formatter};

use crate::error::PathError;
use crate::prim_path::PrimPath;
use crate::property_path::PropertyPath;

/// Either a prim path or a property path (§3.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Path {
    Prim(PrimPath),
    Property(PropertyPath),
}

impl Path {
    pub fn parse(s: &str) -> Result<Self, PathError> {
        match s.find('.') {
            None => Ok(Self::Prim(PrimPath::parse(s)?)),
            Some(dot) => {
                let prim_path = PrimPath::parse(&s[..dot])?;
                let rest = &s[dot + 1..];
                let (prop_name, field) = match rest.split_once('.') {
                    Some((name, field)) => (name, Some(field.to_owned())),
                    None => (rest, None),
                };
                Ok(Self::Property(PropertyPath::new(prim_path, prop_name, field)?))
            }
        }
    }

    pub fn as_prim(&self) -> Option<&PrimPath> {
        match self {
            Self::Prim(p) => Some(p),
            Self::Property(_) => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyPath> {
        match self {
            Self::Prim(_) => None,
            Self::Property(p) => Some(p),
        }
    }

    /// The prim path this path is rooted under: itself for a prim path, or
    /// the containing prim for a property path.
    pub fn prim_path(&self) -> &PrimPath {
        match self {
            Self::Prim(p) => p,
            Self::Property(p) => &p.prim_path,
        }
    }

    /// Rewrite any prim path equal to or rooted at `src_root` to be rooted
    /// at `dst_root`, preserving a property suffix (§4.1.1). Total on valid
    /// inputs; never produces a non-absolute result.
    pub fn remap(&self, src_root: &PrimPath, dst_root: &PrimPath) -> Self {
        match self {
            Self::Prim(p) => Self::Prim(p.remap(src_root, dst_root)),
            Self::Property(p) => Self::Property(p.remap(src_root, dst_root)),
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prim(p) => write!(f, "{p}"),
            Self::Property(p) => write!(f, "{p}"),
        }
    }
}

/// Build a property path from a prim path, a property name, and an optional
/// field (§4 `path.property(primPath, propName, field?)`).
pub fn property(prim_path: PrimPath, prop_name: &str, field: Option<&str>) -> Result<PropertyPath, PathError> {
    PropertyPath::new(prim_path, prop_name, field.map(str::to_owned))
}

/// Remap a raw path-shaped string the way embedded `sdfpath`/`reference`
/// values are remapped during grafting (§4.1.1): a leading `.` (a relative
/// property suffix) passes through unchanged; a string that fails to parse
/// as an absolute [`Path`] is left unchanged (§4.6 "malformed values ...
/// left unchanged"); otherwise the parsed path is remapped and re-unparsed.
pub fn remap_path_string(s: &str, src_root: &PrimPath, dst_root: &PrimPath) -> String {
    if s.starts_with('.') {
        return s.to_owned();
    }
    match Path::parse(s) {
        Ok(path) => path.remap(src_root, dst_root).to_string(),
        Err(_) => s.to_owned(),
    }
}

/// Strip `<...>` wrapping from an internal-arc target string (§4.2).
pub fn strip_angle_wrapper(s: &str) -> &str {
    s.strip_prefix('<').and_then(|s| s.strip_suffix('>')).unwrap_or(s)
}
