use indexmap::IndexMap;
use sdf_path::{strip_angle_wrapper, PrimPath};
use sdf_value::Value;

/// Whether an [`ExternalArc`] came from a `references` or `payload`
/// metadata field (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcKind {
    Reference,
    Payload,
}

impl ArcKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Payload => "payload",
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Self::Reference => "references",
            Self::Payload => "payload",
        }
    }
}

/// A normalized external arc, ready for the Resolver (§4.2, §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalArc {
    pub kind: ArcKind,
    pub asset_path: String,
    pub target_path: Option<String>,
    pub from_identifier: String,
}

/// Flatten a metadata value into its ordered list of raw arc items,
/// recursively unwrapping the list-op representation `{ op, value }`
/// (§4.2, §4.3.3). The returned order is already weak-to-strong fold
/// order: a `prepend` list is reversed so its first (highest-priority)
/// item ends up last, and therefore strongest once folded via
/// [`crate::merge::merge_prim_spec`]; an `append` list keeps its authored
/// (forward) order; `delete` drops its items.
pub fn extract_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array { values, .. } => values.iter().flat_map(extract_items).collect(),
        Value::Dict(dict) if dict.contains_key("op") => {
            let op = dict.get("op").and_then(Value::as_str).unwrap_or("");
            let inner = dict.get("value").map(extract_items).unwrap_or_default();
            match op {
                "prepend" => {
                    let mut items = inner;
                    items.reverse();
                    items
                }
                "delete" => Vec::new(),
                // "append", "add", "orderedItems" and unrecognized operators keep
                // authored (forward) order.
                _ => inner,
            }
        }
        Value::Asset { .. } | Value::Reference { .. } | Value::SdfPath(_) => vec![value.clone()],
        _ => Vec::new(),
    }
}

fn classify_external(item: &Value, kind: ArcKind, from_identifier: &str) -> Option<ExternalArc> {
    match item {
        Value::Asset { path, origin } if !path.is_empty() => Some(ExternalArc {
            kind,
            asset_path: path.clone(),
            target_path: None,
            from_identifier: origin.clone().unwrap_or_else(|| from_identifier.to_owned()),
        }),
        Value::Reference { reference, origin } if !reference.asset_path.is_empty() => Some(ExternalArc {
            kind,
            asset_path: reference.asset_path.clone(),
            target_path: reference.target_path.as_deref().map(strip_angle_wrapper).map(str::to_owned),
            from_identifier: origin.clone().unwrap_or_else(|| from_identifier.to_owned()),
        }),
        _ => None,
    }
}

fn classify_internal(item: &Value) -> Option<PrimPath> {
    match item {
        Value::SdfPath(s) => PrimPath::parse(strip_angle_wrapper(s)).ok(),
        Value::Reference { reference, .. } if reference.asset_path.is_empty() => reference
            .target_path
            .as_deref()
            .map(strip_angle_wrapper)
            .filter(|t| t.starts_with('/'))
            .and_then(|t| PrimPath::parse(t).ok()),
        _ => None,
    }
}

/// External arcs authored under `field` (e.g. `"references"`, `"payload"`,
/// in weak-to-strong fold order. Non-external items (internal `sdfpath`s,
/// empty-asset-path references) are skipped, preserving relative order
/// among the external items (§4.2).
pub fn extract_external_arcs(
    metadata: &IndexMap<String, Value>,
    field: &str,
    kind: ArcKind,
    from_identifier: &str,
) -> Vec<ExternalArc> {
    let Some(value) = metadata.get(field) else { return Vec::new() };
    extract_items(value)
        .iter()
        .filter_map(|item| classify_external(item, kind, from_identifier))
        .collect()
}

/// Internal-arc prim paths authored under `field` (e.g. `"references"`,
/// `"inherits"`, `"specializes"`), in weak-to-strong fold order (§4.2).
pub fn extract_internal_arcs(metadata: &IndexMap<String, Value>, field: &str) -> Vec<PrimPath> {
    let Some(value) = metadata.get(field) else { return Vec::new() };
    extract_items(value).iter().filter_map(classify_internal).collect()
}

/// `subLayers` asset strings, weakest-first, in plain authored order
/// (§4.2, §4.5) — unlike `references`/`payload`, sublayer ordering is not
/// subject to the prepend/append list-op convention in this spec.
pub fn extract_sublayers(metadata: &IndexMap<String, Value>) -> Vec<String> {
    let Some(value) = metadata.get("subLayers") else { return Vec::new() };
    fn flatten(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Array { values, .. } => values.iter().for_each(|v| flatten(v, out)),
            Value::Asset { path, .. } if !path.is_empty() => out.push(path.clone()),
            Value::String(s) | Value::Token(s) => out.push(s.clone()),
            _ => {}
        }
    }
    let mut out = Vec::new();
    flatten(value, &mut out);
    out
}
