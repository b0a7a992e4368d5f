#![deny(warnings)]

//! Layer-stack composition: the Arc Extractor, Composer, Arc Expander, and
//! Stage façade (§2, §4.1–§4.5).

pub mod extract;
pub mod expand;
pub mod merge;
pub mod options;
pub mod parse;
pub mod stage;

#[cfg(test)]
mod test_support;

pub use expand::{apply_active_passthrough, expand_layer, ExpansionError};
pub use extract::{ArcKind, ExternalArc};
pub use merge::{clone_with_remap, compose_layer_stack, merge_prim_spec, merge_prim_spec_weak, merge_property_strong};
pub use options::StageOptions;
pub use parse::{LayerParser, ParseError};
pub use stage::Stage;
