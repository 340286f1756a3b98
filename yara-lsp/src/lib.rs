//! Language server for YARA rule files
//!
//! The server speaks a JSON-RPC subset of the Language Server Protocol
//! over Content-Length framed streams, either a TCP socket or stdio. Each
//! connection runs through a session lifecycle (initialize handshake,
//! active feature serving, shutdown/exit) with all mutable state owned by
//! the connection's task. Feature semantics live in `yara-analysis`; this
//! crate is the wire loop, the dispatcher, and the workspace commands.

pub mod commands;
pub mod methods;
pub mod server;
pub mod session;

pub use server::YaraLanguageServer;
pub use session::{ExitStatus, Session, SessionState};
