use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use indexmap::IndexMap;
use pcp_diagnostic::{CompositionWarning, WarningSink};
use pcp_resolve::{Resolver, ResolverError};
use sdf_layer::{Layer, PrimSpec};
use sdf_path::PrimPath;
use sdf_value::Value;
use thiserror::Error;

use crate::extract::{extract_external_arcs, extract_internal_arcs, extract_sublayers, ArcKind, ExternalArc};
use crate::merge::{clone_with_remap, compose_layer_stack, merge_prim_spec, merge_prim_spec_weak};
use crate::options::StageOptions;
use crate::parse::{LayerParser, ParseError};

#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Coarse authoring strength used to approximate the inherits "strength
/// flip" (§4.3.1 step 3, §9 Open Question — the reference heuristic
/// compares base-layer index; we track a coarse level instead since we
/// don't retain the original per-layer stack once composed).
const LOCAL_STRENGTH: u8 = 2;
const GRAFTED_STRENGTH: u8 = 1;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ArcStrength {
    AlwaysWeak,
    FlipIfSourceStronger,
}

struct ExpanderState<'a> {
    resolver: &'a dyn Resolver,
    parser: &'a dyn LayerParser,
    options: &'a StageOptions,
    warnings: WarningSink,
    /// Fully expanded layers, keyed by canonical identifier (§4.3.1 step 5,
    /// §8 property 7/8 "bounded fetches" — a loaded+expanded layer is never
    /// re-fetched or re-expanded).
    loaded: IndexMap<String, Layer>,
    /// Layer identifiers currently mid-expansion, scoped to this whole
    /// composition call, not per-prim (§4.3.3, §9 "the latter misses
    /// cycles through siblings").
    in_progress: HashSet<String>,
    /// Dedup key (`kind|assetPath|targetPath|fromIdentifier`) → expanded,
    /// remapped prototype subtree, attached under `/__usdjs_prototypes`
    /// once the outermost expansion finishes (§4.3.2).
    prototypes: IndexMap<String, PrimSpec>,
    prototype_counter: usize,
    /// `(prim path, kind, assetPath, targetPath, fromIdentifier)` guard
    /// against re-processing the same external arc on the same prim
    /// (§4.3.1 step 5 "guard against repeated expansion").
    applied_external_arcs: HashSet<(String, &'static str, String, Option<String>, String)>,
    strength_levels: IndexMap<String, u8>,
}

impl<'a> ExpanderState<'a> {
    fn new(resolver: &'a dyn Resolver, parser: &'a dyn LayerParser, options: &'a StageOptions) -> Self {
        Self {
            resolver,
            parser,
            options,
            warnings: WarningSink::new(),
            loaded: IndexMap::new(),
            in_progress: HashSet::new(),
            prototypes: IndexMap::new(),
            prototype_counter: 0,
            applied_external_arcs: HashSet::new(),
            strength_levels: IndexMap::new(),
        }
    }

    fn mark_local_strength(&mut self, root: &PrimSpec) {
        mark_strength(root, LOCAL_STRENGTH, &mut self.strength_levels);
    }

    /// Runs the full seven-phase pipeline on `composed` in place
    /// (§4.3.1). Boxed because loaded external layers recurse back into
    /// this same driver (§4.3.1 step 5 "recursively run the full Arc
    /// Expander on the loaded layer").
    fn expand_layer<'b>(
        &'b mut self,
        composed: &'b mut Layer,
        identifier: &'b str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExpansionError>> + 'b>> {
        Box::pin(async move {
            self.mark_local_strength(&composed.root);
            let mut variant_applied = HashSet::new();

            run_variant_fixpoint(&mut composed.root, &mut variant_applied, self.options.max_fixpoint_iterations);
            self.apply_internal_arc_field("references", ArcStrength::AlwaysWeak, &mut composed.root);
            self.apply_internal_arc_field("inherits", ArcStrength::FlipIfSourceStronger, &mut composed.root);
            self.apply_internal_arc_field("specializes", ArcStrength::AlwaysWeak, &mut composed.root);
            run_variant_fixpoint(&mut composed.root, &mut variant_applied, self.options.max_fixpoint_iterations);

            self.expand_external_arcs_at(&mut composed.root, identifier).await?;

            for _ in 0..self.options.max_fixpoint_iterations {
                let mut changed = run_variant_fixpoint_once(&mut composed.root, &mut variant_applied);
                self.apply_internal_arc_field("references", ArcStrength::AlwaysWeak, &mut composed.root);
                self.apply_internal_arc_field("inherits", ArcStrength::FlipIfSourceStronger, &mut composed.root);
                self.apply_internal_arc_field("specializes", ArcStrength::AlwaysWeak, &mut composed.root);
                changed |= run_variant_fixpoint_once(&mut composed.root, &mut variant_applied);
                if !changed {
                    break;
                }
            }

            self.expand_external_arcs_at(&mut composed.root, identifier).await?;
            Ok(())
        })
    }

    fn apply_internal_arc_field(&mut self, field: &str, strength: ArcStrength, root: &mut PrimSpec) {
        let snapshot = root.clone();
        apply_internal_arc_field_at(root, &snapshot, field, strength, &self.strength_levels, &mut self.warnings);
    }

    fn expand_external_arcs_at<'b>(
        &'b mut self,
        current: &'b mut PrimSpec,
        from_identifier: &'b str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExpansionError>> + 'b>> {
        Box::pin(async move {
            let mut accumulator = PrimSpec::placeholder(current.path.clone());
            let instanceable = current.metadata.get("instanceable").and_then(Value::as_bool) == Some(true);

            for kind in [ArcKind::Reference, ArcKind::Payload] {
                let arcs = extract_external_arcs(&current.metadata, kind.field_name(), kind, from_identifier);
                let mut rewritten_reference: Option<PrimPath> = None;
                for arc in arcs {
                    let key = (
                        current.path.to_string(),
                        kind.as_str(),
                        arc.asset_path.clone(),
                        arc.target_path.clone(),
                        arc.from_identifier.clone(),
                    );
                    if !self.applied_external_arcs.insert(key) {
                        continue;
                    }

                    if kind == ArcKind::Reference && instanceable {
                        if let Some(prototype_path) = self.materialize_prototype(&arc).await? {
                            rewritten_reference = Some(prototype_path);
                        }
                        continue;
                    }

                    if let Some(grafted) = self.load_source_prim(&arc, &current.path).await? {
                        mark_strength_if_absent(&grafted, GRAFTED_STRENGTH, &mut self.strength_levels);
                        merge_prim_spec(&mut accumulator, &grafted);
                    }
                }
                if let Some(prototype_path) = rewritten_reference {
                    current.metadata.insert("references".to_owned(), Value::SdfPath(prototype_path.to_string()));
                }
            }

            merge_prim_spec_weak(current, &accumulator);

            for child in current.children.values_mut() {
                self.expand_external_arcs_at(child, from_identifier).await?;
            }
            Ok(())
        })
    }

    /// Loads (or reuses) the layer named by `arc`, fully expands it, and
    /// returns the source prim it names, clone-with-remapped to `target`
    /// (§4.3.1 step 5).
    async fn load_source_prim(&mut self, arc: &ExternalArc, target_path: &PrimPath) -> Result<Option<PrimSpec>, ExpansionError> {
        let expanded_identifier = self.load_and_expand(&arc.asset_path, &arc.from_identifier).await?;
        let Some(expanded_identifier) = expanded_identifier else {
            return Ok(None);
        };
        let layer = self.loaded.get(&expanded_identifier).expect("just loaded");
        let Some(source) = select_source_prim(layer, arc.target_path.as_deref()) else {
            self.warnings.push(CompositionWarning::NoDefaultPrim {
                referring_prim: target_path.clone(),
                layer_identifier: expanded_identifier,
            });
            return Ok(None);
        };
        Ok(Some(clone_with_remap(source, &source.path, target_path)))
    }

    async fn materialize_prototype(&mut self, arc: &ExternalArc) -> Result<Option<PrimPath>, ExpansionError> {
        let key = format!(
            "{}|{}|{}|{}",
            ArcKind::Reference.as_str(),
            arc.asset_path,
            arc.target_path.as_deref().unwrap_or(""),
            arc.from_identifier
        );
        if let Some(existing) = self.prototypes.get(&key) {
            return Ok(Some(existing.path.clone()));
        }

        let expanded_identifier = self.load_and_expand(&arc.asset_path, &arc.from_identifier).await?;
        let Some(expanded_identifier) = expanded_identifier else { return Ok(None) };
        let layer = self.loaded.get(&expanded_identifier).expect("just loaded");
        let Some(source) = select_source_prim(layer, arc.target_path.as_deref()) else {
            return Ok(None);
        };

        self.prototype_counter += 1;
        let prototype_path = PrimPath::parse(&format!("/__usdjs_prototypes/p{}", self.prototype_counter))
            .expect("constructed prototype path is always valid");
        let prototype = clone_with_remap(source, &source.path, &prototype_path);
        self.prototypes.insert(key, prototype);
        Ok(Some(prototype_path))
    }

    /// Resolves, loads, and fully expands `asset_path`, returning its
    /// canonical identifier — `None` if resolution fails (propagates any
    /// hard I/O error) or a cycle is detected (§4.3.3 "re-entry returns
    /// silently without merging").
    async fn load_and_expand(&mut self, asset_path: &str, from_identifier: &str) -> Result<Option<String>, ExpansionError> {
        let resolved = match self.resolver.read_text(asset_path, from_identifier).await {
            Ok(resolved) => resolved,
            Err(err) => return Err(err.into()),
        };

        if self.loaded.contains_key(&resolved.identifier) {
            return Ok(Some(resolved.identifier));
        }
        if self.in_progress.contains(&resolved.identifier) {
            self.warnings.push(CompositionWarning::CycleDetected { layer_identifier: resolved.identifier });
            return Ok(None);
        }

        self.in_progress.insert(resolved.identifier.clone());
        let base = self.parser.parse(&resolved.identifier, &resolved.text)?;
        let mut composed = self.compose_with_sublayers(base, &resolved.identifier).await?;
        self.expand_layer(&mut composed, &resolved.identifier).await?;
        self.in_progress.remove(&resolved.identifier);

        self.loaded.insert(resolved.identifier.clone(), composed);
        Ok(Some(resolved.identifier))
    }

    /// Recursively loads and parses `layer`'s own `subLayers`, then
    /// composes `[sublayers..., layer]` weak→strong under `identifier`
    /// (§4.3.1 step 5 "recursively compose them weak→strong under the
    /// loaded layer's identifier").
    fn compose_with_sublayers<'b>(
        &'b mut self,
        layer: Layer,
        identifier: &'b str,
    ) -> Pin<Box<dyn Future<Output = Result<Layer, ExpansionError>> + 'b>> {
        Box::pin(async move {
            let sublayer_assets = extract_sublayers(&layer.metadata);
            if sublayer_assets.is_empty() {
                return Ok(layer);
            }
            let mut stack = Vec::with_capacity(sublayer_assets.len() + 1);
            for asset_path in &sublayer_assets {
                let resolved = self.resolver.read_text(asset_path, identifier).await?;
                if !self.in_progress.insert(resolved.identifier.clone()) {
                    self.warnings.push(CompositionWarning::CycleDetected { layer_identifier: resolved.identifier });
                    continue;
                }
                let parsed = self.parser.parse(&resolved.identifier, &resolved.text)?;
                let composed = self.compose_with_sublayers(parsed, &resolved.identifier).await?;
                self.in_progress.remove(&resolved.identifier);
                stack.push(composed);
            }
            stack.push(layer);
            Ok(compose_layer_stack(&stack, identifier))
        })
    }
}

fn mark_strength(prim: &PrimSpec, level: u8, levels: &mut IndexMap<String, u8>) {
    levels.insert(prim.path.to_string(), level);
    for child in prim.children.values() {
        mark_strength(child, level, levels);
    }
}

/// Marks a subtree pulled in via an external arc with [`GRAFTED_STRENGTH`],
/// without clobbering a path that already carries a recorded level (a
/// locally-authored prim overridden by a same-path graft keeps its higher
/// [`LOCAL_STRENGTH`], §4.3.1 step 3).
fn mark_strength_if_absent(prim: &PrimSpec, level: u8, levels: &mut IndexMap<String, u8>) {
    levels.entry(prim.path.to_string()).or_insert(level);
    for child in prim.children.values() {
        mark_strength_if_absent(child, level, levels);
    }
}

fn select_source_prim<'a>(layer: &'a Layer, target_path: Option<&str>) -> Option<&'a PrimSpec> {
    if let Some(target) = target_path {
        let path = PrimPath::parse(target).ok()?;
        return layer.get_prim(&path);
    }
    if let Some(Value::String(name) | Value::Token(name)) = layer.metadata.get("defaultPrim") {
        if let Some(prim) = layer.root.children.get(name) {
            return Some(prim);
        }
    }
    layer.root.children.values().next()
}

/// Folds every target named under `field` into a single accumulator, in
/// the order [`extract_internal_arcs`] returns (so a `prepend` list's
/// first-authored item still ends up strongest among the arcs themselves,
/// §4.3.3), then grafts that accumulator into `current` once — weakly
/// unless the inherits strength-flip heuristic fires (§4.3.1 step 3).
fn apply_internal_arc_field_at(
    current: &mut PrimSpec,
    snapshot: &PrimSpec,
    field: &str,
    strength: ArcStrength,
    strength_levels: &IndexMap<String, u8>,
    warnings: &mut WarningSink,
) {
    let targets = extract_internal_arcs(&current.metadata, field);
    if !targets.is_empty() {
        let mut accumulator = PrimSpec::placeholder(current.path.clone());
        let mut flip = false;
        for target_path in &targets {
            let Some(source) = lookup(snapshot, target_path) else {
                warnings.push(CompositionWarning::MissingArcTarget {
                    referring_prim: current.path.clone(),
                    target: target_path.to_string(),
                });
                continue;
            };
            let remapped = clone_with_remap(source, target_path, &current.path);
            merge_prim_spec(&mut accumulator, &remapped);
            if strength == ArcStrength::FlipIfSourceStronger
                && strength_levels.get(&target_path.to_string()).copied().unwrap_or(0)
                    > strength_levels.get(&current.path.to_string()).copied().unwrap_or(0)
            {
                flip = true;
            }
        }
        if flip {
            merge_prim_spec(current, &accumulator);
        } else {
            merge_prim_spec_weak(current, &accumulator);
        }
    }
    for child in current.children.values_mut() {
        apply_internal_arc_field_at(child, snapshot, field, strength, strength_levels, warnings);
    }
}

fn lookup<'a>(root: &'a PrimSpec, path: &PrimPath) -> Option<&'a PrimSpec> {
    let mut current = root;
    for component in path.components() {
        current = current.children.get(&component.name)?;
    }
    Some(current)
}

fn run_variant_fixpoint(root: &mut PrimSpec, applied: &mut HashSet<(String, String, String)>, max_iterations: usize) {
    for _ in 0..max_iterations {
        if !run_variant_fixpoint_once(root, applied) {
            break;
        }
    }
}

fn run_variant_fixpoint_once(root: &mut PrimSpec, applied: &mut HashSet<(String, String, String)>) -> bool {
    let mut changed = false;
    apply_variant_selections_at(root, applied, &mut changed);
    changed
}

fn apply_variant_selections_at(prim: &mut PrimSpec, applied: &mut HashSet<(String, String, String)>, changed: &mut bool) {
    if let Some(Value::Dict(selections)) = prim.metadata.get("variants").cloned() {
        for (set_name, variant_value) in &selections {
            let Some(variant_name) = variant_value.as_str() else { continue };
            let key = (prim.path.to_string(), set_name.clone(), variant_name.to_owned());
            if applied.contains(&key) {
                continue;
            }
            let variant_prim = prim
                .variant_sets
                .get(set_name)
                .and_then(|set| set.variants.get(variant_name))
                .cloned();
            if let Some(variant_prim) = variant_prim {
                merge_prim_spec(prim, &variant_prim);
                applied.insert(key);
                *changed = true;
            }
        }
    }
    for child in prim.children.values_mut() {
        apply_variant_selections_at(child, applied, changed);
    }
}

/// Excludes any prim whose composed `active` metadata is `false` from
/// traversal by dropping it from its parent's children (SPEC_FULL §4.10).
/// Children remain stored on a clone if the caller kept one; the
/// non-destructive mutation model (§3.8) only promises the *view* returned
/// by traversal changes, not that authored data vanished from other
/// layers' copies.
pub fn apply_active_passthrough(prim: &mut PrimSpec) {
    let inactive: Vec<String> = prim
        .children
        .iter()
        .filter(|(_, child)| child.metadata.get("active").is_some_and(Value::is_false))
        .map(|(name, _)| name.clone())
        .collect();
    for name in inactive {
        prim.children.shift_remove(&name);
    }
    for child in prim.children.values_mut() {
        apply_active_passthrough(child);
    }
}

/// Runs the full arc-expansion pipeline on `composed` in place (§4.3).
pub async fn expand_layer(
    composed: &mut Layer,
    root_identifier: &str,
    resolver: &dyn Resolver,
    parser: &dyn LayerParser,
    options: &StageOptions,
) -> Result<WarningSink, ExpansionError> {
    let mut state = ExpanderState::new(resolver, parser, options);
    state.in_progress.insert(root_identifier.to_owned());
    state.expand_layer(composed, root_identifier).await?;
    state.in_progress.remove(root_identifier);

    if !state.prototypes.is_empty() {
        let prototypes_root = composed
            .root
            .children
            .entry("__usdjs_prototypes".to_owned())
            .or_insert_with(|| PrimSpec::placeholder(PrimPath::parse("/__usdjs_prototypes").unwrap()));
        for (_, prototype) in state.prototypes.drain(..) {
            let name = prototype.path.name().unwrap_or_default().to_owned();
            prototypes_root.children.insert(name, prototype);
        }
    }

    apply_active_passthrough(&mut composed.root);
    Ok(state.warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use crate::test_support::FixtureParser;
    use pcp_resolve::test_support::FakeResolver;
    use sdf_layer::{PropertySpec, Specifier};

    fn sphere(path: &str, radius: f64) -> PrimSpec {
        let mut prim = PrimSpec::new(PrimPath::parse(path).unwrap(), Specifier::Def);
        prim.type_name = Some("Sphere".to_owned());
        let mut prop = PropertySpec::new(sdf_path::property(PrimPath::parse(path).unwrap(), "radius", None).unwrap());
        prop.default_value = Some(Value::float(radius));
        prim.properties.insert("radius".to_owned(), prop);
        prim
    }

    #[tokio::test]
    async fn scenario_s2_variant_selection_overrides_local_opinion() {
        let mut layer = Layer::new("scene.usda");
        let mut sphere_prim = sphere("/World/Sphere", 1.0);
        sphere_prim
            .metadata
            .insert("variants".to_owned(), Value::Dict([("size".to_owned(), Value::Token("small".to_owned()))].into_iter().collect()));
        let mut variant_set = sdf_layer::VariantSetSpec::new("size");
        variant_set.variants.insert("small".to_owned(), sphere("/World/Sphere", 2.0));
        variant_set.variants.insert("large".to_owned(), sphere("/World/Sphere", 10.0));
        sphere_prim.variant_sets.insert("size".to_owned(), variant_set);
        let world = layer.ensure_prim(&PrimPath::parse("/World").unwrap(), Specifier::Def);
        world.children.insert("Sphere".to_owned(), sphere_prim);

        let resolver = FakeResolver::new();
        let parser = FixtureParser::new();
        let options = StageOptions::default();
        let warnings = expand_layer(&mut layer, "scene.usda", &resolver, &parser, &options).await.unwrap();
        assert!(warnings.is_empty());

        let prim = layer.get_prim(&PrimPath::parse("/World/Sphere").unwrap()).unwrap();
        let radius = prim.properties.get("radius").unwrap().default_value.as_ref().unwrap();
        assert_eq!(radius, &Value::float(2.0));
    }

    #[tokio::test]
    async fn scenario_s3_internal_reference_prepend_order() {
        let mut layer = Layer::new("scene.usda");
        layer.root.children.insert("A".to_owned(), sphere("/A", 1.0));
        layer.root.children.insert("C".to_owned(), sphere("/C", 9.0));
        let mut b = PrimSpec::new(PrimPath::parse("/B").unwrap(), Specifier::Def);
        let list_op = Value::Dict(
            [
                ("op".to_owned(), Value::Token("prepend".to_owned())),
                (
                    "value".to_owned(),
                    Value::Array {
                        element_type: "sdfpath".to_owned(),
                        values: vec![Value::SdfPath("/A".to_owned()), Value::SdfPath("/C".to_owned())],
                    },
                ),
            ]
            .into_iter()
            .collect(),
        );
        b.metadata.insert("references".to_owned(), list_op);
        layer.root.children.insert("B".to_owned(), b);

        let resolver = FakeResolver::new();
        let parser = FixtureParser::new();
        let options = StageOptions::default();
        expand_layer(&mut layer, "scene.usda", &resolver, &parser, &options).await.unwrap();

        let prim = layer.get_prim(&PrimPath::parse("/B").unwrap()).unwrap();
        let radius = prim.properties.get("radius").unwrap().default_value.as_ref().unwrap();
        assert_eq!(radius, &Value::float(1.0));
    }

    #[tokio::test]
    async fn scenario_s6_cycle_is_broken_and_terminates() {
        let mut a = Layer::new("/A.usda");
        let mut x = PrimSpec::new(PrimPath::parse("/X").unwrap(), Specifier::Def);
        x.metadata.insert(
            "references".to_owned(),
            Value::Asset { path: "/B.usda".to_owned(), origin: None },
        );
        a.root.children.insert("X".to_owned(), x);

        let mut b = Layer::new("/B.usda");
        let mut y = PrimSpec::new(PrimPath::parse("/Y").unwrap(), Specifier::Def);
        y.metadata.insert(
            "references".to_owned(),
            Value::Asset { path: "/A.usda".to_owned(), origin: None },
        );
        b.root.children.insert("Y".to_owned(), y);
        b.metadata.insert("defaultPrim".to_owned(), Value::Token("Y".to_owned()));

        // Resolved text is only used to pick the right fixture out of `FixtureParser`;
        // it's embedded as readable layer-ish text for anyone stepping through the test.
        let resolver = FakeResolver::new()
            .with_asset("/B.usda", indoc::indoc! {r#"
                def "Y" {
                    references = @/A.usda@
                }
            "#})
            .with_asset("/A.usda", indoc::indoc! {r#"
                def "X" {
                    references = @/B.usda@
                }
            "#});
        let parser = FixtureParser::new();
        parser.register("/B.usda", b);
        let options = StageOptions::default();

        let result = expand_layer(&mut a, "/A.usda", &resolver, &parser, &options).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn scenario_s6_sublayer_cycle_is_broken_and_terminates() {
        let mut root = Layer::new("root.usda");
        root.metadata.insert(
            "subLayers".to_owned(),
            Value::Array { element_type: "asset".to_owned(), values: vec![Value::Asset { path: "layout.usda".to_owned(), origin: None }] },
        );

        let mut layout = Layer::new("layout.usda");
        layout.metadata.insert(
            "subLayers".to_owned(),
            Value::Array { element_type: "asset".to_owned(), values: vec![Value::Asset { path: "root.usda".to_owned(), origin: None }] },
        );

        let mut x = PrimSpec::new(PrimPath::parse("/X").unwrap(), Specifier::Def);
        x.metadata.insert("references".to_owned(), Value::Asset { path: "layout.usda".to_owned(), origin: None });
        root.root.children.insert("X".to_owned(), x);

        let resolver = FakeResolver::new().with_asset("layout.usda", "layout").with_asset("root.usda", "root");
        let parser = FixtureParser::new();
        parser.register("layout.usda", layout);
        let options = StageOptions::default();

        let result = expand_layer(&mut root, "root.usda", &resolver, &parser, &options).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn scenario_s1_sublayer_reference_and_payload_all_contribute() {
        let mut layout = Layer::new("layout.usda");
        layout.root.children.insert("FromSublayer".to_owned(), sphere("/FromSublayer", 5.0));

        let mut root = Layer::new("root.usda");
        root.metadata.insert(
            "subLayers".to_owned(),
            Value::Array { element_type: "asset".to_owned(), values: vec![Value::Asset { path: "layout.usda".to_owned(), origin: None }] },
        );
        let mut from_payload = PrimSpec::new(PrimPath::parse("/FromPayload").unwrap(), Specifier::Def);
        from_payload.metadata.insert("payload".to_owned(), Value::Asset { path: "payload.usda".to_owned(), origin: None });
        root.root.children.insert("FromPayload".to_owned(), from_payload);

        let mut from_reference = PrimSpec::new(PrimPath::parse("/FromReference").unwrap(), Specifier::Def);
        from_reference.metadata.insert("references".to_owned(), Value::Asset { path: "ref.usda".to_owned(), origin: None });
        root.root.children.insert("FromReference".to_owned(), from_reference);

        let mut payload_layer = Layer::new("payload.usda");
        payload_layer.root.children.insert("Model".to_owned(), sphere("/Model", 3.0));
        payload_layer.metadata.insert("defaultPrim".to_owned(), Value::Token("Model".to_owned()));

        let mut ref_layer = Layer::new("ref.usda");
        ref_layer.root.children.insert("Model2".to_owned(), sphere("/Model2", 7.0));
        ref_layer.metadata.insert("defaultPrim".to_owned(), Value::Token("Model2".to_owned()));

        let resolver = FakeResolver::new()
            .with_asset("layout.usda", "layout")
            .with_asset("payload.usda", "payload")
            .with_asset("ref.usda", "ref");
        let parser = FixtureParser::new();
        parser.register("layout.usda", layout);
        parser.register("payload.usda", payload_layer);
        parser.register("ref.usda", ref_layer);

        let stage = Stage::open_with_resolver(root, &resolver, &parser).await.unwrap();
        let options = StageOptions::default();
        let (composed, warnings) = stage.compose_prim_index_with_resolver(&resolver, &parser, &options).await.unwrap();
        assert!(warnings.is_empty());

        let radius_at = |path: &str| -> Value {
            composed.get_prim(&PrimPath::parse(path).unwrap()).unwrap().properties.get("radius").unwrap().default_value.clone().unwrap()
        };
        assert_eq!(radius_at("/FromSublayer"), Value::float(5.0));
        assert_eq!(radius_at("/FromPayload"), Value::float(3.0));
        assert_eq!(radius_at("/FromReference"), Value::float(7.0));
    }

    #[tokio::test]
    async fn scenario_s4_instanceable_references_dedup_to_one_prototype() {
        let mut geo = Layer::new("geo.usda");
        geo.root.children.insert("Geo".to_owned(), sphere("/Geo", 9.0));
        geo.metadata.insert("defaultPrim".to_owned(), Value::Token("Geo".to_owned()));

        let mut root = Layer::new("root.usda");
        for i in 0..5 {
            let path = format!("/Instance{i}");
            let mut prim = PrimSpec::new(PrimPath::parse(&path).unwrap(), Specifier::Def);
            prim.metadata.insert("instanceable".to_owned(), Value::Bool(true));
            prim.metadata.insert("references".to_owned(), Value::Asset { path: "geo.usda".to_owned(), origin: None });
            root.root.children.insert(format!("Instance{i}"), prim);
        }

        let resolver = FakeResolver::new().with_asset("geo.usda", "geo");
        let parser = FixtureParser::new();
        parser.register("geo.usda", geo);
        let options = StageOptions::default();

        let warnings = expand_layer(&mut root, "root.usda", &resolver, &parser, &options).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(resolver.read_count("geo.usda"), 1);

        let prototypes = &root.get_prim(&PrimPath::parse("/__usdjs_prototypes").unwrap()).unwrap().children;
        assert_eq!(prototypes.len(), 1);
        let prototype_path = prototypes.keys().next().unwrap();
        let expected = Value::SdfPath(format!("/__usdjs_prototypes/{prototype_path}"));
        for i in 0..5 {
            let prim = root.get_prim(&PrimPath::parse(&format!("/Instance{i}")).unwrap()).unwrap();
            assert_eq!(prim.metadata.get("references"), Some(&expected));
        }
        let prototype = prototypes.values().next().unwrap();
        assert_eq!(prototype.properties.get("radius").unwrap().default_value, Some(Value::float(9.0)));
    }

    #[tokio::test]
    async fn scenario_s5_relative_asset_resolves_against_composed_identifier_not_a_placeholder() {
        let mut layout = Layer::new("/a/b/layout.usda");
        let mut from_layout = PrimSpec::new(PrimPath::parse("/FromLayout").unwrap(), Specifier::Def);
        from_layout.metadata.insert("references".to_owned(), Value::Asset { path: "further.usda".to_owned(), origin: None });
        layout.root.children.insert("FromLayout".to_owned(), from_layout);

        let mut root = Layer::new("/a/b/root.usda");
        root.metadata.insert(
            "subLayers".to_owned(),
            Value::Array { element_type: "asset".to_owned(), values: vec![Value::Asset { path: "./layout.usda".to_owned(), origin: None }] },
        );

        let mut further = Layer::new("/a/b/further.usda");
        further.root.children.insert("Thing".to_owned(), sphere("/Thing", 4.0));
        further.metadata.insert("defaultPrim".to_owned(), Value::Token("Thing".to_owned()));

        let resolver = FakeResolver::new()
            .with_asset("/a/b/layout.usda", "layout")
            .with_asset("/a/b/further.usda", "further");
        let parser = FixtureParser::new();
        parser.register("/a/b/layout.usda", layout);
        parser.register("/a/b/further.usda", further);

        let stage = Stage::open_with_resolver(root, &resolver, &parser).await.unwrap();
        let options = StageOptions::default();
        let (composed, warnings) = stage.compose_prim_index_with_resolver(&resolver, &parser, &options).await.unwrap();
        assert!(warnings.is_empty());

        // The relative reference resolves against the composed layer's own
        // identifier, never a synthetic placeholder — it lands at
        // "/a/b/further.usda", not e.g. "further.usda" or "<composed>".
        assert_eq!(resolver.read_count("/a/b/further.usda"), 1);
        let prim = composed.get_prim(&PrimPath::parse("/FromLayout").unwrap()).unwrap();
        assert_eq!(prim.properties.get("radius").unwrap().default_value, Some(Value::float(4.0)));
    }
}
