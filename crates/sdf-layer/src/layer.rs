use indexmap::IndexMap;
use sdf_path::PrimPath;
use sdf_value::Value;

use crate::spec::{PrimSpec, Specifier};

/// `{ identifier, layer-metadata, root prim spec at "/" }` (§3.6).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub identifier: String,
    pub metadata: IndexMap<String, Value>,
    pub root: PrimSpec,
}

impl Layer {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            metadata: IndexMap::new(),
            root: PrimSpec::placeholder(PrimPath::root()),
        }
    }

    pub fn get_prim(&self, path: &PrimPath) -> Option<&PrimSpec> {
        let mut current = &self.root;
        for component in path.components() {
            current = current.children.get(&component.name)?;
        }
        Some(current)
    }

    pub fn get_prim_mut(&mut self, path: &PrimPath) -> Option<&mut PrimSpec> {
        let mut current = &mut self.root;
        for component in path.components() {
            current = current.children.get_mut(&component.name)?;
        }
        Some(current)
    }

    /// Create placeholders down to `path` if necessary and return it,
    /// stamping `specifier` on the leaf if it doesn't already carry one
    /// (`/` is never assigned a specifier, §4.1 "Root is never assigned
    /// specifier/type").
    pub fn ensure_prim(&mut self, path: &PrimPath, specifier: Specifier) -> &mut PrimSpec {
        let mut current = &mut self.root;
        for component in path.components() {
            current = current
                .children
                .entry(component.name.clone())
                .or_insert_with(|| PrimSpec::placeholder(current_child_path(&current.path, &component.name)));
        }
        if !path.is_root() && current.specifier.is_none() {
            current.specifier = Some(specifier);
        }
        current
    }
}

fn current_child_path(parent: &PrimPath, name: &str) -> PrimPath {
    parent.child(name).unwrap_or_else(|_| parent.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf_path::PrimPath;

    #[test]
    fn ensure_prim_creates_placeholders_down_the_tree() {
        let mut layer = Layer::new("test.usda");
        let path = PrimPath::parse("/World/Character").unwrap();
        layer.ensure_prim(&path, Specifier::Def);

        assert!(layer.get_prim(&PrimPath::parse("/World").unwrap()).is_some());
        let prim = layer.get_prim(&path).unwrap();
        assert_eq!(prim.specifier, Some(Specifier::Def));
        assert_eq!(prim.path, path);
    }

    #[test]
    fn ensure_prim_does_not_overwrite_existing_specifier() {
        let mut layer = Layer::new("test.usda");
        let path = PrimPath::parse("/A").unwrap();
        layer.ensure_prim(&path, Specifier::Def);
        layer.ensure_prim(&path, Specifier::Over);
        assert_eq!(layer.get_prim(&path).unwrap().specifier, Some(Specifier::Def));
    }

    #[test]
    fn root_is_never_assigned_a_specifier() {
        let mut layer = Layer::new("test.usda");
        layer.ensure_prim(&PrimPath::root(), Specifier::Def);
        assert_eq!(layer.root.specifier, None);
    }

    #[test]
    fn get_prim_returns_none_for_missing_path() {
        let layer = Layer::new("test.usda");
        assert!(layer.get_prim(&PrimPath::parse("/Nope").unwrap()).is_none());
    }
}
