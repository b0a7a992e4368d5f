use std::fmt::{self, Display, Formatter};

use once_cell::sync::Lazy;
use regex::Regex;

/// `[A-Za-z_][A-Za-z0-9_]*`, optionally namespaced with `:`.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(:[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && IDENT_RE.is_match(s)
}

/// A single step in a prim path: a name, plus an optional variant selection
/// of the form `{set=variant}` authored on that step.
///
/// The variant selection is carried structurally so `Display` can round-trip
/// it, but composition itself (§4.3.1) drives variant selection from the
/// `variants` metadata dict, not from path syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimComponent {
    pub name: String,
    pub variant_selection: Option<(String, String)>,
}

impl PrimComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant_selection: None,
        }
    }

    pub fn with_variant(name: impl Into<String>, set: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant_selection: Some((set.into(), variant.into())),
        }
    }
}

impl Display for PrimComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((set, variant)) = &self.variant_selection {
            write!(f, "{{{set}={variant}}}")?;
        }
        Ok(())
    }
}
