use sdf_layer::Layer;
use thiserror::Error;

/// Raised by a [`LayerParser`] on malformed resolved text (§7 "ParseError —
/// malformed input, produced by readers before the engine runs"). The
/// decoding itself stays an external collaborator (§1); this only carries
/// its failure back through the engine.
#[derive(Debug, Error)]
#[error("failed to parse layer {identifier:?}: {message}")]
pub struct ParseError {
    pub identifier: String,
    pub message: String,
}

/// Turns the text a [`pcp_resolve::Resolver`] returns into a [`Layer`]
/// (§6). The engine never decodes `#usda`/binary bytes itself — callers
/// plug in whichever reader they have; this is the seam it's injected
/// through, mirroring how [`pcp_resolve::Resolver`] is injected for I/O.
pub trait LayerParser: Send + Sync {
    fn parse(&self, identifier: &str, text: &str) -> Result<Layer, ParseError>;
}
