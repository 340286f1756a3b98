//! Data model for the protocol messages the server produces and consumes
//!
//! Positions are zero-based; the `character` value is a gap index between
//! characters. Ranges are end-exclusive, like an editor selection.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Implements the wire format for protocol enums that serialize as bare
/// integers (severity levels, item kinds, and so on).
macro_rules! wire_int_enum {
    ($name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant = $value),+
        }

        impl From<$name> for i64 {
            fn from(kind: $name) -> i64 {
                kind as i64
            }
        }

        impl TryFrom<i64> for $name {
            type Error = i64;

            fn try_from(value: i64) -> Result<Self, i64> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(other),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i64(*self as i64)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = i64::deserialize(deserializer)?;
                $name::try_from(value).map_err(|v| {
                    de::Error::custom(format!(
                        "invalid {} value: {}",
                        stringify!($name),
                        v
                    ))
                })
            }
        }
    };
}

wire_int_enum!(DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Info = 3,
    Hint = 4,
});

wire_int_enum!(CompletionItemKind {
    Method = 2,
    Class = 7,
    Property = 10,
    Enum = 13,
});

wire_int_enum!(MessageType {
    Error = 1,
    Warning = 2,
    Info = 3,
    Log = 4,
});

wire_int_enum!(TextSyncKind {
    None = 0,
    Full = 1,
    Incremental = 2,
});

wire_int_enum!(CompletionTriggerKind {
    Invoked = 1,
    TriggerCharacter = 2,
    Incomplete = 3,
});

/// A zero-based (line, character) position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A span between two positions; the end position is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range. Start must not come after end.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "range start must not exceed end");
        Self { start, end }
    }
}

/// A range scoped to a specific document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub range: Range,
    pub uri: String,
}

impl Location {
    pub fn new(range: Range, uri: impl Into<String>) -> Self {
        Self {
            range,
            uri: uri.into(),
        }
    }
}

/// Diagnostic codes may be numeric or symbolic depending on the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticCode {
    Number(i64),
    Name(String),
}

/// A compiler error or warning scoped to one resource.
///
/// Diagnostics are created fresh for each publish cycle and discarded after
/// being sent; they are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,
    pub source: String,
    #[serde(default)]
    pub related_information: Vec<serde_json::Value>,
}

impl Diagnostic {
    pub fn new(range: Range, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            message: message.into(),
            code: None,
            source: "yara".to_string(),
            related_information: Vec::new(),
        }
    }
}

/// A single completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

/// How hover content should be rendered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkupKind {
    #[serde(rename = "markdown")]
    Markdown,
    #[serde(rename = "plaintext")]
    Plaintext,
}

/// A string value interpreted according to its markup kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupContent {
    pub kind: MarkupKind,
    pub value: String,
}

/// A single text replacement inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// Edits across one or more documents, keyed by URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceEdit {
    pub changes: std::collections::HashMap<String, Vec<TextEdit>>,
}

/// Hover information at a document position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    pub contents: MarkupContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl Hover {
    pub fn new(kind: MarkupKind, value: impl Into<String>, range: Option<Range>) -> Self {
        Self {
            contents: MarkupContent {
                kind,
                value: value.into(),
            },
            range,
        }
    }
}
