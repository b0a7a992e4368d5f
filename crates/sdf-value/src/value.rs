use indexmap::IndexMap;
use ordered_float::NotNan;
use sdf_path::PrimPath;

/// An unresolved reference to another prim, optionally an external asset
/// (§3.2 "reference"). `target_path`, when present, is a path-string,
/// possibly wrapped in `<...>` by a text reader (unwrapped by the arc
/// extractor, not here).
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub asset_path: String,
    pub target_path: Option<String>,
}

/// The tagged value sum used throughout metadata and property opinions
/// (§3.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(NotNan<f64>),
    String(String),

    /// A qualified scalar naming an enum-like token, e.g. `"x"` as an axis.
    Token(String),
    /// An unresolved asset path string, e.g. `@model.usd@` unwrapped of its
    /// `@...@` delimiters. `origin` remembers the identifier of the layer
    /// that authored it, used for relative resolution (§3.2).
    Asset { path: String, origin: Option<String> },
    /// A path-string, possibly with a property suffix (`/A/B.prop`).
    SdfPath(String),
    Reference { reference: Reference, origin: Option<String> },

    Vec2f([f32; 2]),
    Vec3f([f32; 3]),
    Vec4f([f32; 4]),
    Matrix4d([[f64; 4]; 4]),

    Tuple(Vec<Value>),
    Array { element_type: String, values: Vec<Value> },
    Dict(IndexMap<String, Value>),
}

impl Value {
    pub fn float(v: f64) -> Self {
        Self::Float(NotNan::new(v).unwrap_or_else(|_| NotNan::new(0.0).unwrap()))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Token(s) | Self::SdfPath(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array { values, .. } => Some(values),
            _ => None,
        }
    }

    /// `true` when `self == Bool(false)` — used for the `active` metadata
    /// post-pass (SPEC_FULL §4.10).
    pub fn is_false(&self) -> bool {
        matches!(self, Self::Bool(false))
    }

    /// Rewrite every embedded prim-path / property-path string so that a
    /// `src_root`-rooted prefix becomes rooted at `dst_root` (§4.1.1).
    /// Recurses into tuples, arrays, and dicts. Relative property
    /// suffixes (leading `.`) and unrelated absolute paths pass through
    /// unchanged, as does anything that fails to parse as a path
    /// (§4.6 "malformed values ... left unchanged").
    pub fn remap_paths(&self, src_root: &PrimPath, dst_root: &PrimPath) -> Self {
        match self {
            Self::SdfPath(s) => Self::SdfPath(sdf_path::remap_path_string(s, src_root, dst_root)),
            Self::Reference { reference, origin } => {
                let target_path = reference.target_path.as_ref().map(|t| {
                    let unwrapped = sdf_path::strip_angle_wrapper(t);
                    sdf_path::remap_path_string(unwrapped, src_root, dst_root)
                });
                Self::Reference {
                    reference: Reference { asset_path: reference.asset_path.clone(), target_path },
                    origin: origin.clone(),
                }
            }
            Self::Tuple(items) => {
                Self::Tuple(items.iter().map(|v| v.remap_paths(src_root, dst_root)).collect())
            }
            Self::Array { element_type, values } => Self::Array {
                element_type: element_type.clone(),
                values: values.iter().map(|v| v.remap_paths(src_root, dst_root)).collect(),
            },
            Self::Dict(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.remap_paths(src_root, dst_root)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
