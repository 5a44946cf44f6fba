//! Label catalog
//!
//! The catalog fixes the display order of class labels and seeds the color
//! assignment. It is published either as a bare list or wrapped as
//! `{"labels": [...]}`.

use serde_json::Value;

/// Read a label catalog document. Non-string entries are skipped; any other
/// shape yields an empty catalog.
pub fn parse_label_catalog(document: &Value) -> Vec<String> {
    let list = match document {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("labels") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    list.iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Catalog order, followed by any `extras` the catalog doesn't already name.
pub fn merge_labels<I, S>(catalog: &[String], extras: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged = catalog.to_vec();
    for extra in extras {
        let extra = extra.as_ref();
        if !merged.iter().any(|l| l == extra) {
            merged.push(extra.to_string());
        }
    }
    merged
}
