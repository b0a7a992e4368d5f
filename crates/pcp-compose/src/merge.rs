use indexmap::IndexMap;
use sdf_layer::{Layer, PrimSpec, PropertySpec, VariantSetSpec};
use sdf_path::PrimPath;

/// `src` is stronger than `dst` (§4.1). Merges in place.
pub fn merge_prim_spec(dst: &mut PrimSpec, src: &PrimSpec) {
    let is_root = dst.path.is_root();

    if !is_root {
        if src.type_name.is_some() {
            dst.type_name = src.type_name.clone();
        }
        if src.specifier.is_some() {
            dst.specifier = src.specifier;
        }
    }

    for (key, value) in &src.metadata {
        dst.metadata.insert(key.clone(), value.clone());
    }

    for (key, src_prop) in &src.properties {
        dst.properties
            .entry(key.clone())
            .and_modify(|dst_prop| merge_property_strong(dst_prop, src_prop))
            .or_insert_with(|| src_prop.clone());
    }

    for (set_name, src_set) in &src.variant_sets {
        let dst_set = dst.variant_sets.entry(set_name.clone()).or_insert_with(|| VariantSetSpec::new(set_name.clone()));
        for (variant_name, src_variant) in &src_set.variants {
            // Strongest wins per variant body (§9 Open Question: this departs from
            // Pcp's per-field variant merging, intentionally).
            dst_set.variants.insert(variant_name.clone(), src_variant.clone());
        }
    }

    for (child_name, src_child) in &src.children {
        let dst_child = dst.children.entry(child_name.clone()).or_insert_with(|| {
            let child_path = dst.path.child(child_name).unwrap_or_else(|_| dst.path.clone());
            PrimSpec::placeholder(child_path)
        });
        merge_prim_spec(dst_child, src_child);
    }
}

/// `src` is stronger than `dst` (§4.1).
pub fn merge_property_strong(dst: &mut PropertySpec, src: &PropertySpec) {
    if dst.path.is_none() {
        dst.path = src.path.clone();
    }
    if src.type_name.is_some() {
        dst.type_name = src.type_name.clone();
    }
    if src.variability.is_some() {
        dst.variability = src.variability.clone();
    }
    if src.default_value.is_some() {
        dst.default_value = src.default_value.clone();
    }
    for (time, value) in &src.time_samples {
        dst.time_samples.insert(*time, value.clone());
    }
    for (key, value) in &src.metadata {
        dst.metadata.insert(key.clone(), value.clone());
    }
}

/// `dstStrong` wins; grafts `srcWeak` in as weaker opinions (§4.1, used for
/// referenced/inherited subtrees).
pub fn merge_prim_spec_weak(dst_strong: &mut PrimSpec, src_weak: &PrimSpec) {
    let is_root = dst_strong.path.is_root();

    if !is_root {
        let type_name_is_unfilled =
            dst_strong.type_name.is_none() || dst_strong.type_name.as_deref() == Some("unknown");
        if type_name_is_unfilled {
            if let Some(type_name) = &src_weak.type_name {
                dst_strong.type_name = Some(type_name.clone());
            }
        }
        if dst_strong.specifier.is_none() {
            dst_strong.specifier = src_weak.specifier;
        }
    }

    for (key, value) in &src_weak.metadata {
        dst_strong.metadata.entry(key.clone()).or_insert_with(|| value.clone());
    }

    for (key, weak_prop) in &src_weak.properties {
        dst_strong
            .properties
            .entry(key.clone())
            .and_modify(|dst_prop| merge_property_weak(dst_prop, weak_prop))
            .or_insert_with(|| weak_prop.clone());
    }

    for (set_name, weak_set) in &src_weak.variant_sets {
        let dst_set = dst_strong.variant_sets.entry(set_name.clone()).or_insert_with(|| VariantSetSpec::new(set_name.clone()));
        for (variant_name, weak_variant) in &weak_set.variants {
            dst_set.variants.entry(variant_name.clone()).or_insert_with(|| weak_variant.clone());
        }
    }

    for (child_name, weak_child) in &src_weak.children {
        let dst_child = dst_strong.children.entry(child_name.clone()).or_insert_with(|| {
            let child_path = dst_strong.path.child(child_name).unwrap_or_else(|_| dst_strong.path.clone());
            PrimSpec::placeholder(child_path)
        });
        merge_prim_spec_weak(dst_child, weak_child);
    }
}

fn merge_property_weak(dst: &mut PropertySpec, weak: &PropertySpec) {
    if dst.path.is_none() {
        dst.path = weak.path.clone();
    }
    if dst.type_name.is_none() {
        dst.type_name = weak.type_name.clone();
    }
    if dst.variability.is_none() {
        dst.variability = weak.variability.clone();
    }
    if dst.default_value.is_none() {
        dst.default_value = weak.default_value.clone();
    }
    for (time, value) in &weak.time_samples {
        dst.time_samples.entry(*time).or_insert_with(|| value.clone());
    }
    for (key, value) in &weak.metadata {
        dst.metadata.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

/// Weak→strong merge of a layer stack into a fresh composed layer (§4.1
/// `composeLayerStack`). `layers` is ordered weakest-first; `identifier`
/// must be the caller's choice of canonical identifier for the result
/// (the root layer's identifier, per §4.5 — never a synthetic placeholder).
pub fn compose_layer_stack(layers: &[Layer], identifier: &str) -> Layer {
    let mut composed = Layer::new(identifier.to_owned());
    for layer in layers {
        merge_prim_spec(&mut composed.root, &layer.root);
        for (key, value) in &layer.metadata {
            composed.metadata.insert(key.clone(), value.clone());
        }
    }
    composed
}

/// Deep-clone `prim`, rebasing every internal path from `src_root` to
/// `dst_root` and remapping every embedded path-shaped [`sdf_value::Value`]
/// the same way (§4.1.1).
pub fn clone_with_remap(prim: &PrimSpec, src_root: &PrimPath, dst_root: &PrimPath) -> PrimSpec {
    let path = prim.path.remap(src_root, dst_root);
    let mut out = PrimSpec::placeholder(path);
    out.specifier = prim.specifier;
    out.type_name = prim.type_name.clone();

    for (key, value) in &prim.metadata {
        out.metadata.insert(key.clone(), value.remap_paths(src_root, dst_root));
    }
    for (name, child) in &prim.children {
        out.children.insert(name.clone(), clone_with_remap(child, src_root, dst_root));
    }
    for (key, prop) in &prim.properties {
        out.properties.insert(key.clone(), clone_property_with_remap(prop, src_root, dst_root));
    }
    for (set_name, set) in &prim.variant_sets {
        let mut new_set = VariantSetSpec::new(set_name.clone());
        for (variant_name, variant_prim) in &set.variants {
            new_set.variants.insert(variant_name.clone(), clone_with_remap(variant_prim, src_root, dst_root));
        }
        out.variant_sets.insert(set_name.clone(), new_set);
    }
    out
}

fn clone_property_with_remap(prop: &PropertySpec, src_root: &PrimPath, dst_root: &PrimPath) -> PropertySpec {
    PropertySpec {
        path: prop.path.as_ref().map(|p| p.remap(src_root, dst_root)),
        type_name: prop.type_name.clone(),
        variability: prop.variability.clone(),
        default_value: prop.default_value.as_ref().map(|v| v.remap_paths(src_root, dst_root)),
        time_samples: prop.time_samples.iter().map(|(t, v)| (*t, v.remap_paths(src_root, dst_root))).collect(),
        metadata: prop.metadata.iter().map(|(k, v)| (k.clone(), v.remap_paths(src_root, dst_root))).collect::<IndexMap<_, _>>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf_layer::Specifier;
    use sdf_value::Value;

    fn prim(path: &str, specifier: Specifier) -> PrimSpec {
        PrimSpec::new(PrimPath::parse(path).unwrap(), specifier)
    }

    #[test]
    fn strong_wins_on_conflicting_metadata_key() {
        let mut dst = prim("/A", Specifier::Def);
        dst.metadata.insert("radius".to_owned(), Value::float(1.0));
        let mut src = prim("/A", Specifier::Def);
        src.metadata.insert("radius".to_owned(), Value::float(2.0));

        merge_prim_spec(&mut dst, &src);
        assert_eq!(dst.metadata.get("radius"), Some(&Value::float(2.0)));
    }

    #[test]
    fn disjoint_layers_compose_the_same_regardless_of_order() {
        let mut a = Layer::new("a.usda");
        a.root.children.insert("A".to_owned(), prim("/A", Specifier::Def));
        let mut b = Layer::new("b.usda");
        b.root.children.insert("B".to_owned(), prim("/B", Specifier::Def));

        let ab = compose_layer_stack(&[a.clone(), b.clone()], "out");
        let ba = compose_layer_stack(&[b, a], "out");
        assert_eq!(ab.root.children.get("A"), ba.root.children.get("A"));
        assert_eq!(ab.root.children.get("B"), ba.root.children.get("B"));
    }

    #[test]
    fn weak_merge_never_overwrites_strong_opinion() {
        let mut strong = prim("/A", Specifier::Def);
        strong.type_name = Some("Sphere".to_owned());
        let mut weak = prim("/A", Specifier::Over);
        weak.type_name = Some("Cube".to_owned());

        merge_prim_spec_weak(&mut strong, &weak);
        assert_eq!(strong.type_name.as_deref(), Some("Sphere"));
        assert_eq!(strong.specifier, Some(Specifier::Def));
    }

    #[test]
    fn clone_with_remap_rebases_children_and_values() {
        let mut a = prim("/A", Specifier::Def);
        a.metadata.insert("target".to_owned(), Value::SdfPath("/A/B".to_owned()));
        let mut child = prim("/A/B", Specifier::Def);
        child.metadata.insert("other".to_owned(), Value::SdfPath("/Elsewhere".to_owned()));
        a.children.insert("B".to_owned(), child);

        let src_root = PrimPath::parse("/A").unwrap();
        let dst_root = PrimPath::parse("/World/Character").unwrap();
        let cloned = clone_with_remap(&a, &src_root, &dst_root);

        assert_eq!(cloned.path, dst_root);
        assert_eq!(cloned.metadata.get("target"), Some(&Value::SdfPath("/World/Character/B".to_owned())));
        let cloned_child = cloned.children.get("B").unwrap();
        assert_eq!(cloned_child.path, PrimPath::parse("/World/Character/B").unwrap());
        assert_eq!(cloned_child.metadata.get("other"), Some(&Value::SdfPath("/Elsewhere".to_owned())));
    }
}
