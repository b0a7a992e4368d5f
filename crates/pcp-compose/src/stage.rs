use pcp_diagnostic::WarningSink;
use pcp_resolve::Resolver;
use sdf_layer::Layer;

use crate::expand::{expand_layer, ExpansionError};
use crate::merge::compose_layer_stack;
use crate::options::StageOptions;
use crate::parse::LayerParser;

/// User-facing assembly point (§4.5): open a root layer, gather its
/// sublayers, and run composition.
pub struct Stage {
    pub root_identifier: String,
    /// Weakest-first; `root` is the last (strongest) entry.
    pub layer_stack: Vec<Layer>,
}

impl Stage {
    /// Builds a stage from an already-parsed root layer and its already
    /// loaded sublayers, weakest-first (§4.5 "Stage.open{Text}").
    pub fn from_layers(root: Layer, sublayers: Vec<Layer>) -> Self {
        let root_identifier = root.identifier.clone();
        let mut layer_stack = sublayers;
        layer_stack.push(root);
        Self { root_identifier, layer_stack }
    }

    /// Reads the root layer's own `subLayers` metadata and fetches each via
    /// `resolver`/`parser`, weakest-first, attaching them to `layer_stack`
    /// (§4.5 "Stage.openWithResolver").
    pub async fn open_with_resolver(
        root: Layer,
        resolver: &dyn Resolver,
        parser: &dyn LayerParser,
    ) -> Result<Self, ExpansionError> {
        let root_identifier = root.identifier.clone();
        let asset_paths = crate::extract::extract_sublayers(&root.metadata);
        let mut layer_stack = Vec::with_capacity(asset_paths.len());
        for asset_path in &asset_paths {
            let resolved = resolver.read_text(asset_path, &root_identifier).await?;
            let layer = parser.parse(&resolved.identifier, &resolved.text)?;
            layer_stack.push(layer);
        }
        layer_stack.push(root);
        Ok(Self { root_identifier, layer_stack })
    }

    /// Stacks the layer stack weak→strong into a single composed layer,
    /// without expanding any arcs (§4.5 `composePrimIndex`). The result's
    /// identifier is always the root layer's, never a synthetic
    /// placeholder, because downstream arc expansion resolves relative
    /// assets against it (§4.5, §8 property 9).
    pub fn compose_prim_index(&self) -> Layer {
        compose_layer_stack(&self.layer_stack, &self.root_identifier)
    }

    /// Runs the full §4.3 pipeline: stacks the layer stack, then expands
    /// sublayers/variants/inherits/specializes/references/payloads to a
    /// fixpoint (§4.5 `composePrimIndexWithResolver`).
    pub async fn compose_prim_index_with_resolver(
        &self,
        resolver: &dyn Resolver,
        parser: &dyn LayerParser,
        options: &StageOptions,
    ) -> Result<(Layer, WarningSink), ExpansionError> {
        let mut composed = self.compose_prim_index();
        let warnings = expand_layer(&mut composed, &self.root_identifier, resolver, parser, options).await?;
        Ok((composed, warnings))
    }
}
