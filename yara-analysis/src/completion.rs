//! Code completion from the static module schema
//!
//! The schema is a nested name-to-kind mapping of the YARA module surface
//! (`pe`, `elf`, `cuckoo`, ...), embedded at build time and loaded once.
//! Completion walks it along the dotted path of the symbol under the
//! cursor: `cuckoo.` lists the cuckoo namespaces, `cuckoo.network.` lists
//! the network methods, and any path segment the schema does not know
//! yields an empty list, never an error.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::CapabilityError;
use crate::textpos::resolve_symbol;
use yara_proto::{CompletionItem, CompletionItemKind, Position};

static MODULE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../data/modules.json"))
        .expect("embedded module schema is valid JSON")
});

pub fn provide_code_completion(
    document: &str,
    position: Position,
) -> Result<Vec<CompletionItem>, CapabilityError> {
    let Some(token) = resolve_symbol(document, position) else {
        return Ok(Vec::new());
    };
    Ok(completions_for_path(&token, &MODULE_SCHEMA))
}

/// Walk the schema one dotted segment at a time. A trailing empty segment
/// (the cursor right after the trigger `.`) lists everything at the level
/// reached so far.
fn completions_for_path(token: &str, schema: &Value) -> Vec<CompletionItem> {
    let mut node = schema;
    for segment in token.split('.') {
        if segment.is_empty() {
            continue;
        }
        match node.get(segment) {
            Some(child) => node = child,
            None => return Vec::new(),
        }
    }

    let Some(entries) = node.as_object() else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|(label, kind)| CompletionItem::new(label, item_kind(kind)))
        .collect()
}

/// Kind strings are matched case-insensitively; nested mappings and
/// unrecognized strings fall back to Class.
fn item_kind(value: &Value) -> CompletionItemKind {
    match value.as_str() {
        Some(kind) if kind.eq_ignore_ascii_case("method") => CompletionItemKind::Method,
        Some(kind) if kind.eq_ignore_ascii_case("property") => CompletionItemKind::Property,
        Some(kind) if kind.eq_ignore_ascii_case("enum") => CompletionItemKind::Enum,
        _ => CompletionItemKind::Class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CODE_COMPLETION;

    #[test]
    fn module_dot_lists_its_namespaces() {
        let result = provide_code_completion(CODE_COMPLETION, Position::new(5, 14)).unwrap();
        let labels: Vec<&str> = result.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, ["filesystem", "network", "registry", "sync"]);
        for item in &result {
            assert_eq!(item.kind, CompletionItemKind::Class);
        }
    }

    #[test]
    fn nested_path_lists_leaf_kinds() {
        let document = "rule R {\n    condition:\n        cuckoo.network.\n}\n";
        let result = provide_code_completion(document, Position::new(2, 22)).unwrap();
        assert!(result
            .iter()
            .any(|item| item.label == "http_request" && item.kind == CompletionItemKind::Method));
        assert_eq!(result.len(), 8);
    }

    #[test]
    fn kinds_translate_from_schema_strings() {
        let document = "rule R {\n    condition:\n        pe.\n}\n";
        let result = provide_code_completion(document, Position::new(2, 10)).unwrap();
        let kind_of = |label: &str| {
            result
                .iter()
                .find(|item| item.label == label)
                .map(|item| item.kind)
        };
        assert_eq!(kind_of("machine"), Some(CompletionItemKind::Property));
        assert_eq!(kind_of("MACHINE_AMD64"), Some(CompletionItemKind::Enum));
        assert_eq!(kind_of("is_dll"), Some(CompletionItemKind::Method));
    }

    #[test]
    fn unknown_path_is_empty_not_an_error() {
        let document = "rule R {\n    condition:\n        nosuch.module.\n}\n";
        assert!(provide_code_completion(document, Position::new(2, 13))
            .unwrap()
            .is_empty());
        let deep = "rule R {\n    condition:\n        cuckoo.missing.\n}\n";
        assert!(provide_code_completion(deep, Position::new(2, 13))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn position_past_the_line_end_is_empty() {
        assert!(
            provide_code_completion(CODE_COMPLETION, Position::new(5, 25))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn leaf_segments_offer_nothing_further() {
        let document = "rule R {\n    condition:\n        time.now\n}\n";
        assert!(provide_code_completion(document, Position::new(2, 13))
            .unwrap()
            .is_empty());
    }
}
