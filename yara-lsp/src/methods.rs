//! The protocol method table
//!
//! Wire method names are parsed into a typed enum once, at the top of the
//! dispatch loop, so the rest of the server matches on variants instead of
//! strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    // requests
    Initialize,
    Shutdown,
    Completion,
    Definition,
    Hover,
    References,
    Rename,
    ExecuteCommand,
    // notifications
    Initialized,
    Exit,
    DidChangeConfiguration,
    DidOpen,
    DidChange,
    DidClose,
    DidSave,
}

impl Method {
    pub fn from_wire(name: &str) -> Option<Self> {
        let method = match name {
            "initialize" => Method::Initialize,
            "shutdown" => Method::Shutdown,
            "textDocument/completion" => Method::Completion,
            "textDocument/definition" => Method::Definition,
            "textDocument/hover" => Method::Hover,
            "textDocument/references" => Method::References,
            "textDocument/rename" => Method::Rename,
            "workspace/executeCommand" => Method::ExecuteCommand,
            "initialized" => Method::Initialized,
            "exit" => Method::Exit,
            "workspace/didChangeConfiguration" => Method::DidChangeConfiguration,
            "textDocument/didOpen" => Method::DidOpen,
            "textDocument/didChange" => Method::DidChange,
            "textDocument/didClose" => Method::DidClose,
            "textDocument/didSave" => Method::DidSave,
            _ => return None,
        };
        Some(method)
    }

    pub fn is_request(self) -> bool {
        matches!(
            self,
            Method::Initialize
                | Method::Shutdown
                | Method::Completion
                | Method::Definition
                | Method::Hover
                | Method::References
                | Method::Rename
                | Method::ExecuteCommand
        )
    }
}
