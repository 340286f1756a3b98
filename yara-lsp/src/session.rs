//! Per-connection session state
//!
//! Exactly one task owns a [`Session`], so none of this needs locking.
//! The session dies with the connection; nothing here outlives it.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};

use yara_proto::uri::parse_uri;

/// Lifecycle of one client connection.
///
/// `initialize` moves Uninitialized to Initializing, the `initialized`
/// notification moves Initializing to Active, `shutdown` moves Active to
/// ShuttingDown, and `exit` terminates. Feature requests are only served
/// while Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Active,
    ShuttingDown,
    Terminated,
}

/// How a connection ended. Exit after a shutdown request is the clean
/// path; everything else (exit without shutdown, disconnect, framing
/// failure) is abnormal and maps to exit code 1 in stdio mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    Abnormal,
}

pub struct Session {
    pub state: SessionState,
    pub workspace_root: Option<PathBuf>,
    /// The `settings.yara` object from the most recent
    /// `workspace/didChangeConfiguration`, replaced wholesale.
    pub config: Map<String, Value>,
    /// Unsaved buffer contents keyed by document URI. Populated by
    /// didOpen/didChange, drained by didClose/didSave.
    pub dirty_files: HashMap<String, String>,
    /// The missing-compiler warning is surfaced once per session.
    pub compiler_warned: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            workspace_root: None,
            config: Map::new(),
            dirty_files: HashMap::new(),
            compiler_warned: false,
        }
    }

    pub fn compile_on_save(&self) -> bool {
        self.config
            .get("compile_on_save")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Fetch a document's current text. An unsaved buffer always wins over
    /// whatever is on disk.
    pub async fn get_document(&self, uri: &str) -> Option<String> {
        if let Some(text) = self.dirty_files.get(uri) {
            return Some(text.clone());
        }
        let path = parse_uri(uri)?;
        tokio::fs::read_to_string(path).await.ok()
    }
}
