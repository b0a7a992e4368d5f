use std::collections::HashMap;
use std::sync::Mutex;

use sdf_layer::Layer;

use crate::parse::{LayerParser, ParseError};

/// A [`LayerParser`] that ignores the resolved text and looks the [`Layer`]
/// up by canonical identifier instead — lets tests build fixtures directly
/// as [`Layer`] values rather than writing a throwaway text grammar.
#[derive(Default)]
pub struct FixtureParser {
    layers: Mutex<HashMap<String, Layer>>,
}

impl FixtureParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, identifier: impl Into<String>, layer: Layer) {
        self.layers.lock().unwrap().insert(identifier.into(), layer);
    }
}

impl LayerParser for FixtureParser {
    fn parse(&self, identifier: &str, _text: &str) -> Result<Layer, ParseError> {
        self.layers
            .lock()
            .unwrap()
            .get(identifier)
            .cloned()
            .ok_or_else(|| ParseError { identifier: identifier.to_owned(), message: "no fixture registered".to_owned() })
    }
}
