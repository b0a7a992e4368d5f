use std::fmt::{self, Display, Formatter};

use snafu::ensure;

use crate::error::{
    EmptyIdentifierSnafu, InvalidIdentifierSnafu, NotAbsoluteSnafu, PathError,
    UnterminatedVariantSelectionSnafu,
};
use crate::segment::{is_valid_identifier, PrimComponent};

/// An absolute path identifying a prim: `/`, `/A`, `/A/B`, ...
///
/// Immutable once constructed. The root path has zero components and
/// unparses to `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PrimPath {
    pub(crate) components: Vec<PrimComponent>,
}

impl PrimPath {
    /// The absolute root path `/`.
    pub fn root() -> Self {
        Self { components: Vec::new() }
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[PrimComponent] {
        &self.components
    }

    pub fn name(&self) -> Option<&str> {
        self.components.last().map(|c| c.name.as_str())
    }

    /// The path one level up, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            None
        } else {
            let mut components = self.components.clone();
            components.pop();
            Some(Self { components })
        }
    }

    /// Append a child name, producing a new absolute path.
    pub fn child(&self, name: &str) -> Result<Self, PathError> {
        ensure!(is_valid_identifier(name), InvalidIdentifierSnafu { ident: name.to_owned(), path: format!("{self}/{name}") });
        let mut components = self.components.clone();
        components.push(PrimComponent::new(name));
        Ok(Self { components })
    }

    /// `true` if `self` is equal to or rooted under `root`.
    pub fn is_rooted_at(&self, root: &Self) -> bool {
        if root.is_root() {
            return true;
        }
        self.components.len() >= root.components.len()
            && self.components[..root.components.len()] == root.components[..]
    }

    /// Rewrite `self` so the `src_root` prefix becomes `dst_root`, preserving
    /// whatever components follow. Paths that are neither equal to nor
    /// rooted at `src_root` pass through unchanged (§4.1.1).
    pub fn remap(&self, src_root: &Self, dst_root: &Self) -> Self {
        if !self.is_rooted_at(src_root) {
            return self.clone();
        }
        let suffix = &self.components[src_root.components.len()..];
        let mut components = dst_root.components.clone();
        components.extend_from_slice(suffix);
        Self { components }
    }

    pub fn parse(s: &str) -> Result<Self, PathError> {
        ensure!(s.starts_with('/'), NotAbsoluteSnafu { path: s.to_owned() });
        if s == "/" {
            return Ok(Self::root());
        }
        let body = &s[1..];
        let mut components = Vec::new();
        for raw in body.split('/') {
            ensure!(!raw.is_empty(), EmptyIdentifierSnafu { path: s.to_owned() });
            components.push(parse_component(raw, s)?);
        }
        Ok(Self { components })
    }
}

fn parse_component(raw: &str, whole_path: &str) -> Result<PrimComponent, PathError> {
    if let Some(brace) = raw.find('{') {
        ensure!(raw.ends_with('}'), UnterminatedVariantSelectionSnafu { path: whole_path.to_owned() });
        let name = &raw[..brace];
        let inner = &raw[brace + 1..raw.len() - 1];
        let (set, variant) = inner.split_once('=').ok_or_else(|| {
            UnterminatedVariantSelectionSnafu { path: whole_path.to_owned() }.build()
        })?;
        ensure!(is_valid_identifier(name), InvalidIdentifierSnafu { ident: name.to_owned(), path: whole_path.to_owned() });
        Ok(PrimComponent::with_variant(name, set, variant))
    } else {
        ensure!(is_valid_identifier(raw), InvalidIdentifierSnafu { ident: raw.to_owned(), path: whole_path.to_owned() });
        Ok(PrimComponent::new(raw))
    }
}

impl Display for PrimPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}
