//! Flattening of namespaced claims into display values, and matching of
//! received claims against what was requested.
use ciborium::Value as CborValue;

use crate::definitions::device_response::NamespacedClaims;
use crate::definitions::{ClaimValue, Claims, ReceivedDocument, RequestedDocument};

const PORTRAIT: &str = "portrait";
const SIGNATURE: &str = "signature_usual_mark";
const PSEUDONYM: &str = "user_pseudonym";

const YES: &str = "yes";
const NO: &str = "no";

/// Flatten namespaced claims into a single map.
///
/// Namespaces and claims are visited in the order listed. A key present in
/// more than one namespace keeps the value from the namespace listed last, at
/// the position where it was first seen.
pub fn flatten(namespaces: &NamespacedClaims) -> Claims {
    let mut flat = Claims::new();
    for (_namespace, claims) in namespaces {
        for (key, value) in claims {
            flat.insert(key.clone(), render_claim(key, value));
        }
    }
    flat
}

/// Render one claim value. Byte strings under a handful of well-known keys get
/// dedicated treatment, all other values become text.
pub fn render_claim(key: &str, value: &CborValue) -> ClaimValue {
    match (key, value) {
        (PORTRAIT, CborValue::Bytes(bytes)) => ClaimValue::Image(bytes.clone()),
        (SIGNATURE, CborValue::Bytes(bytes)) => ClaimValue::Bytes(bytes.clone()),
        (PSEUDONYM, CborValue::Bytes(bytes)) => {
            ClaimValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => ClaimValue::Text(render_text(value)),
    }
}

/// Render a value as text. Maps and arrays become one `path: value` line per
/// leaf, where the path is built from nested keys and `[index]` segments.
pub fn render_text(value: &CborValue) -> String {
    match value {
        CborValue::Map(_) | CborValue::Array(_) => {
            let mut lines = Vec::new();
            walk("", value, &mut lines);
            lines.join("\n")
        }
        _ => render_scalar(value),
    }
}

fn render_scalar(value: &CborValue) -> String {
    match value {
        CborValue::Text(text) => text.clone(),
        CborValue::Integer(i) => i128::from(*i).to_string(),
        CborValue::Float(f) => f.to_string(),
        CborValue::Bool(true) => YES.to_string(),
        CborValue::Bool(false) => NO.to_string(),
        CborValue::Null => String::new(),
        CborValue::Bytes(bytes) => base64::encode(bytes),
        // full-date (1004), tdate (0) and friends render as their content
        CborValue::Tag(_, inner) => render_text(inner),
        other => format!("{other:?}"),
    }
}

fn walk(prefix: &str, value: &CborValue, lines: &mut Vec<String>) {
    match value {
        CborValue::Map(entries) => {
            for (key, value) in entries {
                let key = render_scalar(key);
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                walk(&path, value, lines);
            }
        }
        CborValue::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                walk(&format!("{prefix}[{index}]"), value, lines);
            }
        }
        CborValue::Tag(_, inner) if matches!(**inner, CborValue::Map(_) | CborValue::Array(_)) => {
            walk(prefix, inner, lines)
        }
        leaf if prefix.is_empty() => lines.push(render_scalar(leaf)),
        leaf => lines.push(format!("{prefix}: {}", render_scalar(leaf))),
    }
}

/// Match the requested documents against what the holder returned.
///
/// For every requested document the available document of the same type is
/// looked up, and only the requested claims it actually contains are kept, in
/// the order they were requested. Requested documents the holder did not return are left out.
pub fn reconcile(
    requested: &[RequestedDocument],
    available: &[ReceivedDocument],
) -> Vec<ReceivedDocument> {
    requested
        .iter()
        .filter_map(|request| {
            let document = available
                .iter()
                .find(|d| d.document_type == request.document_type)?;
            let claims = request
                .claims
                .iter()
                .filter_map(|claim| {
                    document
                        .claims
                        .get(&claim.label)
                        .map(|value| (claim.label.clone(), value.clone()))
                })
                .collect();
            Some(ReceivedDocument {
                claims,
                ..document.clone()
            })
        })
        .collect()
}
