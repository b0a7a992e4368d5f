use indexmap::IndexMap;
use ordered_float::NotNan;
use sdf_path::{PrimPath, PropertyPath};
use sdf_value::Value;

/// A prim's specifier (§3.4): whether it defines, overrides, or describes an
/// abstract class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    Def,
    Over,
    Class,
}

impl Specifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Over => "over",
            Self::Class => "class",
        }
    }
}

/// A single authored attribute or relationship (§3.3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySpec {
    pub path: Option<PropertyPath>,
    pub type_name: Option<String>,
    pub variability: Option<String>,
    pub default_value: Option<Value>,
    pub time_samples: IndexMap<NotNan<f64>, Value>,
    pub metadata: IndexMap<String, Value>,
}

impl PropertySpec {
    pub fn new(path: PropertyPath) -> Self {
        Self { path: Some(path), ..Default::default() }
    }
}

/// `{ name, variants }` — a family of alternative opinion bundles under a
/// prim (§3.5). Each variant prim's `path` equals the parent prim's path;
/// its opinions apply to the parent when selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantSetSpec {
    pub name: String,
    pub variants: IndexMap<String, PrimSpec>,
}

impl VariantSetSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), variants: IndexMap::new() }
    }
}

/// A node in the scene hierarchy (§3.4). Children and properties preserve
/// authored insertion order (§3.7).
#[derive(Debug, Clone, PartialEq)]
pub struct PrimSpec {
    pub path: PrimPath,
    pub specifier: Option<Specifier>,
    pub type_name: Option<String>,
    pub metadata: IndexMap<String, Value>,
    pub children: IndexMap<String, PrimSpec>,
    pub properties: IndexMap<String, PropertySpec>,
    pub variant_sets: IndexMap<String, VariantSetSpec>,
}

impl PrimSpec {
    /// An un-authored placeholder at `path`, created as scaffolding by
    /// [`crate::Layer::ensure_prim`] or by the composer when grafting a new
    /// child (§4.1 "insert an empty placeholder under the correct path,
    /// then recurse").
    pub fn placeholder(path: PrimPath) -> Self {
        Self {
            path,
            specifier: None,
            type_name: None,
            metadata: IndexMap::new(),
            children: IndexMap::new(),
            properties: IndexMap::new(),
            variant_sets: IndexMap::new(),
        }
    }

    pub fn new(path: PrimPath, specifier: Specifier) -> Self {
        Self { specifier: Some(specifier), ..Self::placeholder(path) }
    }
}
