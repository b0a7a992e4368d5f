#![deny(warnings)]

//! Diagnostics produced during composition (§7): [`CompositionWarning`] is
//! non-fatal and collected, never panicking; [`CompositionError`] is an
//! internal invariant violation and halts composition.

use sdf_path::PrimPath;
use thiserror::Error;

/// Non-fatal: missing `defaultPrim`, a detected cycle, a missing arc
/// target, or an unrecognized metadata shape. The engine logs these (via
/// `tracing::warn!`, see [`CompositionWarning::emit`]) and continues,
/// producing a best-effort composed layer. Tests rely on resulting state,
/// not on this channel (§7).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionWarning {
    #[error("layer {layer_identifier:?} has no defaultPrim and no children; arc on {referring_prim} contributes nothing")]
    NoDefaultPrim { referring_prim: PrimPath, layer_identifier: String },

    #[error("cycle detected expanding layer {layer_identifier:?} (re-entered while already in progress)")]
    CycleDetected { layer_identifier: String },

    #[error("arc target {target:?} on {referring_prim} could not be resolved")]
    MissingArcTarget { referring_prim: PrimPath, target: String },

    #[error("unrecognized metadata shape for key {key:?} on {prim}")]
    UnknownMetadataShape { prim: PrimPath, key: String },
}

impl CompositionWarning {
    /// Log at `tracing::warn!` in addition to being appended to the
    /// caller's warning sink (SPEC_FULL §4.7).
    pub fn emit(self) -> Self {
        tracing::warn!(warning = %self, "composition warning");
        self
    }
}

/// A bug: halts composition (§7).
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

/// Accumulates [`CompositionWarning`]s for a single composition call,
/// returned alongside the composed layer (§7).
#[derive(Debug, Default, Clone)]
pub struct WarningSink {
    warnings: Vec<CompositionWarning>,
}

impl WarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: CompositionWarning) {
        self.warnings.push(warning.emit());
    }

    pub fn into_vec(self) -> Vec<CompositionWarning> {
        self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
