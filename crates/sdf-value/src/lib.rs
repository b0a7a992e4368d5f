#![deny(warnings)]

//! The tagged value domain used in layer metadata and property opinions
//! (§3.2). [`Value`] is an open sum — a plain tagged enum, not a trait
//! object — matching the way the composition engine needs to pattern-match
//! on shape during arc extraction and remap.

mod value;

pub use value::{Reference, Value};

pub type Dict = indexmap::IndexMap<String, Value>;
