/*!
 * Document model and flattening for locale bundles.
 *
 * A document is one JSON file of localized strings, possibly nested. The
 * engine works on a flattened view of each document where every leaf value
 * is addressed by a dot-joined path, which makes change detection and
 * deletion mirroring a matter of map algebra instead of tree walking.
 */

use std::collections::BTreeMap;

use serde_json::Value;

// @module: Document model and dotted-path flattening

/// One localized document: string keys mapped to JSON values, possibly nested
pub type Document = serde_json::Map<String, Value>;

/// All documents of one language, keyed by relative document name ("app/menu.json")
pub type DocumentSet = BTreeMap<String, Document>;

/// Translated trees for every target language, keyed by language code
pub type TranslationSet = BTreeMap<String, DocumentSet>;

/// Flattened view of a document: dotted leaf path mapped to its value
pub type FlatMap = BTreeMap<String, Value>;

/// Separator used when joining nested keys into a flat path
pub const PATH_SEPARATOR: char = '.';

/// Join a path prefix and a key into one dotted path
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, key)
    }
}

/// Flatten a document into a map of dotted leaf paths to values.
///
/// Only non-empty mappings are descended into. Arrays, scalars, null and
/// empty mappings are all leaves, so an array is addressed and replaced as
/// one unit rather than per index.
pub fn flatten(document: &Document) -> FlatMap {
    let mut flat = FlatMap::new();
    for (key, value) in document {
        flatten_value(key.clone(), value, &mut flat);
    }
    flat
}

fn flatten_value(path: String, value: &Value, flat: &mut FlatMap) {
    match value {
        Value::Object(children) if !children.is_empty() => {
            for (key, child) in children {
                flatten_value(join_path(&path, key), child, flat);
            }
        }
        leaf => {
            flat.insert(path, leaf.clone());
        }
    }
}

/// Rebuild a nested document from a flattened view.
///
/// Inverse of `flatten`: splitting each path on the separator, materializing
/// intermediate mappings and assigning the value at the terminal key, so
/// `unflatten(&flatten(&d)) == d` for any document.
pub fn unflatten(flat: &FlatMap) -> Document {
    let mut document = Document::new();
    for (path, value) in flat {
        insert_path(&mut document, path, value.clone());
    }
    document
}

/// Insert a value at a dotted path, creating intermediate mappings as needed.
///
/// A scalar sitting where an intermediate mapping is required gets replaced
/// by that mapping; the deeper entry wins.
pub fn insert_path(document: &mut Document, path: &str, value: Value) {
    let keys: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = document;
    for key in parents {
        let slot = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        if !slot.is_object() {
            *slot = Value::Object(Document::new());
        }
        current = match slot {
            Value::Object(children) => children,
            // Unreachable after the reset above
            _ => return,
        };
    }
    current.insert((*last).to_string(), value);
}

/// Remove the leaf at a dotted path, pruning mappings emptied by the removal.
///
/// Returns true when a leaf was actually removed. The path must address a
/// leaf in the flattened sense: if the terminal key holds a non-empty
/// mapping, or an intermediate key is not a mapping, the path does not
/// exist in the flat view and the call is a no-op.
pub fn remove_path(document: &mut Document, path: &str) -> bool {
    let keys: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    remove_in(document, &keys)
}

fn remove_in(map: &mut Document, keys: &[&str]) -> bool {
    let Some((first, rest)) = keys.split_first() else {
        return false;
    };

    if rest.is_empty() {
        return match map.get(*first) {
            Some(Value::Object(children)) if !children.is_empty() => false,
            Some(_) => {
                map.shift_remove(*first);
                true
            }
            None => false,
        };
    }

    let removed = match map.get_mut(*first) {
        Some(Value::Object(children)) => remove_in(children, rest),
        _ => false,
    };
    if removed {
        // Prune the intermediate mapping if the removal emptied it
        if matches!(map.get(*first), Some(Value::Object(children)) if children.is_empty()) {
            map.shift_remove(*first);
        }
    }
    removed
}

/// Count the leaf values in a document without building the flat view
pub fn count_leaves(document: &Document) -> usize {
    document.values().map(count_leaves_in_value).sum()
}

fn count_leaves_in_value(value: &Value) -> usize {
    match value {
        Value::Object(children) if !children.is_empty() => {
            children.values().map(count_leaves_in_value).sum()
        }
        _ => 1,
    }
}
