use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::resolver::{resolve_identifier, ResolvedAsset, Resolver, ResolverError};

/// An in-memory [`Resolver`] keyed by canonical identifier, for tests
/// (SPEC_FULL §8 "test tooling"). Counts reads per identifier so tests can
/// assert the "bounded fetches" and "instanceable dedup" properties (§8.7,
/// §8.8) without instrumenting the engine itself.
#[derive(Debug, Default)]
pub struct FakeResolver {
    assets: HashMap<String, String>,
    read_counts: Mutex<HashMap<String, usize>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, identifier: impl Into<String>, text: impl Into<String>) -> Self {
        self.assets.insert(identifier.into(), text.into());
        self
    }

    pub fn read_count(&self, identifier: &str) -> usize {
        self.read_counts.lock().unwrap().get(identifier).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.read_counts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn read_text(&self, asset_path: &str, from_identifier: &str) -> Result<ResolvedAsset, ResolverError> {
        let identifier = resolve_identifier(asset_path, from_identifier);
        tracing::trace!(asset_path, from_identifier, %identifier, "resolver read");
        *self.read_counts.lock().unwrap().entry(identifier.clone()).or_insert(0) += 1;
        match self.assets.get(&identifier) {
            Some(text) => Ok(ResolvedAsset { identifier, text: text.clone() }),
            None => Err(ResolverError::NotFound { asset_path: asset_path.to_owned(), from_identifier: from_identifier.to_owned() }),
        }
    }
}
