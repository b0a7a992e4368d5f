use async_trait::async_trait;
use thiserror::Error;

/// The bytes (as text) and canonical identifier of an asset read through a
/// [`Resolver`] (§4.4). The same asset resolved under the same base must
/// always yield the same `identifier`, so callers can cache on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub identifier: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("asset {asset_path:?} (resolved from {from_identifier:?}) not found")]
    NotFound { asset_path: String, from_identifier: String },

    #[error("io error reading asset {asset_path:?}: {source}")]
    Io { asset_path: String, #[source] source: std::io::Error },
}

/// The injected capability mapping `(assetPath, fromIdentifier)` pairs to
/// canonical identifiers and bytes (§4.4). Every suspension point in the
/// engine is a call to [`Resolver::read_text`] — the only place
/// `composePrimIndexWithResolver` awaits (§5).
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn read_text(&self, asset_path: &str, from_identifier: &str) -> Result<ResolvedAsset, ResolverError>;
}

/// `true` if `s` starts with `/` or a `scheme://` prefix (§4.4).
pub fn is_absolute_asset_path(s: &str) -> bool {
    s.starts_with('/') || has_url_scheme(s)
}

pub fn has_url_scheme(s: &str) -> bool {
    match s.find("://") {
        Some(idx) => idx > 0 && s[..idx].chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        None => false,
    }
}

/// Resolve `asset_path` relative to `from_identifier` per §4.4's three
/// cases. Pure and synchronous — only [`Resolver::read_text`] itself
/// performs I/O and suspends.
pub fn resolve_identifier(asset_path: &str, from_identifier: &str) -> String {
    if is_absolute_asset_path(asset_path) {
        return asset_path.to_owned();
    }
    if has_url_scheme(from_identifier) {
        return resolve_url_relative(asset_path, from_identifier);
    }
    resolve_path_relative(asset_path, from_identifier)
}

fn resolve_url_relative(asset_path: &str, from_identifier: &str) -> String {
    let scheme_end = from_identifier.find("://").unwrap() + 3;
    let dir = match from_identifier[scheme_end..].rfind('/') {
        Some(idx) => &from_identifier[..scheme_end + idx + 1],
        None => from_identifier,
    };
    let joined = format!("{dir}{asset_path}");
    normalize_joined(&joined)
}

fn resolve_path_relative(asset_path: &str, from_identifier: &str) -> String {
    let dir = match from_identifier.rfind('/') {
        Some(idx) => &from_identifier[..=idx],
        None => "",
    };
    let joined = format!("{dir}{asset_path}");
    normalize_joined(&joined)
}

/// Normalize `.` and `..` components without collapsing a leading `/`
/// (§4.4).
fn normalize_joined(joined: &str) -> String {
    let leading_slash = joined.starts_with('/');
    let mut scheme_prefix = String::new();
    let rest = if let Some(idx) = joined.find("://") {
        let end = idx + 3;
        scheme_prefix = joined[..end].to_owned();
        &joined[end..]
    } else {
        joined
    };

    let mut stack: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.last().is_some_and(|s| *s != "..") {
                    stack.pop();
                } else if scheme_prefix.is_empty() && !leading_slash {
                    stack.push("..");
                }
            }
            other => stack.push(other),
        }
    }

    let body = stack.join("/");
    if !scheme_prefix.is_empty() {
        format!("{scheme_prefix}{body}")
    } else if leading_slash {
        format!("/{body}")
    } else {
        body
    }
}
