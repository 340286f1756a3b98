//! Protocol layer for the YARA language server
//!
//! This crate defines the subset of the Language Server Protocol the server
//! speaks: the data model types and their wire-format serialization, the
//! JSON-RPC envelope with its error-code registry, the Content-Length
//! message framing over arbitrary byte streams, and file URI helpers.
//!
//! Serialization is explicit per type (serde derives where the wire shape
//! matches the struct, hand-written impls for the integer-valued protocol
//! enums) so that every value crossing the stream has a single, checked
//! encoding.

pub mod framing;
pub mod rpc;
pub mod types;
pub mod uri;

pub use framing::{read_message, write_message, FramingError};
pub use rpc::{ErrorCode, Message, JSONRPC_VERSION};
pub use types::{
    CompletionItem, CompletionItemKind, CompletionTriggerKind, Diagnostic, DiagnosticSeverity,
    Hover, Location, MarkupContent, MarkupKind, MessageType, Position, Range, TextEdit,
    TextSyncKind, WorkspaceEdit,
};
