#![deny(warnings)]

//! In-memory tree of prim specs, property specs, variant sets, and layer
//! metadata, keyed by path (§3.3–3.6).

mod layer;
mod spec;

pub use layer::Layer;
pub use spec::{PrimSpec, PropertySpec, Specifier, VariantSetSpec};
