//! The language server dispatch loop
//!
//! One [`YaraLanguageServer`] is shared by every connection; all mutable
//! per-client state lives in the connection task's [`Session`]. A message
//! is dispatched completely, side-effect notifications included, before
//! the next one is read, so responses always come back in request order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::commands;
use crate::methods::Method;
use crate::session::{ExitStatus, Session, SessionState};
use yara_analysis::{
    provide_code_completion, provide_definition, provide_diagnostic, provide_hover,
    provide_reference, provide_rename, CapabilityError, RuleCompiler,
};
use yara_proto::framing::{read_message, write_message, FramingError};
use yara_proto::rpc::{self, ErrorCode, Message};
use yara_proto::uri::parse_uri;
use yara_proto::{CompletionTriggerKind, Diagnostic, MessageType, Position, TextSyncKind};

pub struct YaraLanguageServer {
    compiler: Option<Arc<dyn RuleCompiler>>,
    clients: AtomicUsize,
}

impl Default for YaraLanguageServer {
    fn default() -> Self {
        Self::new()
    }
}

impl YaraLanguageServer {
    /// A server without a compiler collaborator. Everything works except
    /// diagnostics and the compile commands, which degrade with a warning.
    pub fn new() -> Self {
        Self {
            compiler: None,
            clients: AtomicUsize::new(0),
        }
    }

    pub fn with_compiler(compiler: Arc<dyn RuleCompiler>) -> Self {
        Self {
            compiler: Some(compiler),
            clients: AtomicUsize::new(0),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    /// Serve one client until it exits, disconnects, or breaks framing.
    pub async fn handle_client<R, W>(&self, reader: &mut R, writer: &mut W) -> ExitStatus
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.clients.fetch_add(1, Ordering::SeqCst);
        info!("client connected");
        let mut session = Session::new();

        let status = loop {
            let value = match read_message(reader).await {
                Ok(value) => value,
                Err(FramingError::Eof) => {
                    warn!("client closed the stream");
                    break ExitStatus::Abnormal;
                }
                // the stream can no longer be trusted to be message-aligned
                // after a bad payload; answer with ParseError, then close
                Err(err @ FramingError::Parse(_)) => {
                    warn!(error = %err, "invalid payload, closing connection");
                    let reply = json!({
                        "jsonrpc": rpc::JSONRPC_VERSION,
                        "id": Value::Null,
                        "error": {
                            "code": ErrorCode::ParseError.code(),
                            "message": "invalid JSON payload",
                        },
                    });
                    if let Err(err) = write_message(writer, &reply).await {
                        warn!(error = %err, "write failed");
                    }
                    break ExitStatus::Abnormal;
                }
                Err(err) => {
                    warn!(error = %err, "framing failure, closing connection");
                    break ExitStatus::Abnormal;
                }
            };

            let Some(message) = Message::from_value(value) else {
                debug!("ignoring message without a jsonrpc envelope");
                continue;
            };

            let outcome = if message.is_request() {
                self.dispatch_request(&mut session, &message, writer)
                    .await
                    .map(|()| None)
            } else {
                self.dispatch_notification(&mut session, &message, writer)
                    .await
            };
            match outcome {
                Ok(None) => {}
                Ok(Some(status)) => break status,
                Err(err) => {
                    warn!(error = %err, "write failed, closing connection");
                    break ExitStatus::Abnormal;
                }
            }
        };

        self.clients.fetch_sub(1, Ordering::SeqCst);
        info!("client disconnected");
        status
    }

    async fn dispatch_request<W>(
        &self,
        session: &mut Session,
        message: &Message,
        writer: &mut W,
    ) -> Result<(), FramingError>
    where
        W: AsyncWrite + Unpin,
    {
        let id = message.id.unwrap_or_default();
        let name = message.method.as_deref().unwrap_or_default();
        let method = Method::from_wire(name);
        info!(method = name, "client request");

        match session.state {
            SessionState::Uninitialized | SessionState::Initializing
                if method != Some(Method::Initialize) =>
            {
                let reply = rpc::error_response(
                    id,
                    ErrorCode::ServerNotInitialized,
                    "server has not been initialized",
                );
                return write_message(writer, &reply).await;
            }
            SessionState::ShuttingDown | SessionState::Terminated => {
                let reply =
                    rpc::error_response(id, ErrorCode::InvalidRequest, "server is shutting down");
                return write_message(writer, &reply).await;
            }
            _ => {}
        }

        match method {
            Some(Method::Initialize) => {
                if session.state != SessionState::Uninitialized {
                    let reply = rpc::error_response(
                        id,
                        ErrorCode::InvalidRequest,
                        "server is already initialized",
                    );
                    return write_message(writer, &reply).await;
                }
                session.workspace_root = message
                    .params
                    .get("rootUri")
                    .and_then(Value::as_str)
                    .and_then(parse_uri);
                if let Some(root) = &session.workspace_root {
                    info!(workspace = %root.display(), "client workspace folder");
                }
                let capabilities = self.negotiate_capabilities(
                    message.params.get("capabilities").unwrap_or(&Value::Null),
                );
                session.state = SessionState::Initializing;
                let reply = rpc::response(id, json!({ "capabilities": capabilities }));
                write_message(writer, &reply).await
            }
            Some(Method::Shutdown) => {
                info!("client requested shutdown");
                session.state = SessionState::ShuttingDown;
                write_message(writer, &rpc::response(id, Value::Null)).await
            }
            Some(Method::ExecuteCommand) => {
                let result =
                    commands::execute_command(self.compiler.as_deref(), session, &message.params, writer)
                        .await?;
                write_message(writer, &rpc::response(id, result)).await
            }
            Some(method) if method.is_request() => {
                match self.run_feature(session, method, &message.params).await {
                    Ok(result) => write_message(writer, &rpc::response(id, result)).await,
                    Err(err) => {
                        // recoverable: tell the user, answer with an empty
                        // result, keep the connection alive
                        warn!(error = %err, "feature handler failed");
                        show_message(writer, MessageType::Error, &err.to_string()).await?;
                        write_message(writer, &rpc::response(id, empty_result(method))).await
                    }
                }
            }
            _ => {
                let reply = rpc::error_response(
                    id,
                    ErrorCode::MethodNotFound,
                    &format!("method not found: {}", name),
                );
                write_message(writer, &reply).await
            }
        }
    }

    async fn run_feature(
        &self,
        session: &Session,
        method: Method,
        params: &Value,
    ) -> Result<Value, CapabilityError> {
        let uri = params
            .get("textDocument")
            .and_then(|doc| doc.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| feature_error(method, "missing document URI".to_string()))?;
        let position = parse_position(params)
            .ok_or_else(|| feature_error(method, "missing document position".to_string()))?;
        let document = session
            .get_document(uri)
            .await
            .ok_or_else(|| feature_error(method, format!("cannot read document {}", uri)))?;

        let result = match method {
            Method::Completion => {
                if let Some(trigger) = completion_trigger(params) {
                    debug!(trigger = ?trigger, "completion trigger");
                }
                to_result(method, provide_code_completion(&document, position)?)
            }
            Method::Definition => to_result(method, provide_definition(&document, position, uri)?),
            Method::References => to_result(method, provide_reference(&document, position, uri)?),
            Method::Hover => match provide_hover(&document, position, uri)? {
                Some(hover) => to_result(method, hover),
                None => Ok(Value::Null),
            },
            Method::Rename => {
                let new_name = params
                    .get("newName")
                    .and_then(Value::as_str)
                    .ok_or_else(|| feature_error(method, "missing new name".to_string()))?;
                to_result(method, provide_rename(&document, position, uri, new_name)?)
            }
            _ => Err(feature_error(method, "unsupported request".to_string())),
        }?;
        Ok(result)
    }

    async fn dispatch_notification<W>(
        &self,
        session: &mut Session,
        message: &Message,
        writer: &mut W,
    ) -> Result<Option<ExitStatus>, FramingError>
    where
        W: AsyncWrite + Unpin,
    {
        let name = message.method.as_deref().unwrap_or_default();
        let method = Method::from_wire(name);
        let params = &message.params;
        info!(method = name, "client notification");

        match method {
            Some(Method::Exit) => {
                let status = if session.state == SessionState::ShuttingDown {
                    ExitStatus::Clean
                } else {
                    ExitStatus::Abnormal
                };
                session.state = SessionState::Terminated;
                info!("client requested exit");
                return Ok(Some(status));
            }
            Some(Method::Initialized) if session.state == SessionState::Initializing => {
                session.state = SessionState::Active;
                info!("client is ready");
                show_message(writer, MessageType::Info, "Successfully connected").await?;
            }
            Some(_) if session.state != SessionState::Active => {
                debug!(method = name, "ignoring notification before the session is active");
            }
            Some(Method::DidChangeConfiguration) => {
                session.config = params
                    .get("settings")
                    .and_then(|settings| settings.get("yara"))
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                let config = Value::Object(session.config.clone());
                debug!(config = %config, "workspace configuration changed");
            }
            Some(Method::DidOpen) => {
                let document = params.get("textDocument");
                let uri = document.and_then(|doc| doc.get("uri")).and_then(Value::as_str);
                let text = document.and_then(|doc| doc.get("text")).and_then(Value::as_str);
                let (Some(uri), Some(text)) = (uri, text) else {
                    return malformed(writer, name).await.map(|()| None);
                };
                session.dirty_files.insert(uri.to_string(), text.to_string());
                if session.compile_on_save() {
                    self.publish_compile_diagnostics(session, uri, text, writer)
                        .await?;
                }
            }
            Some(Method::DidChange) => {
                // full-content sync, the last change always carries the
                // whole document
                let uri = params
                    .get("textDocument")
                    .and_then(|doc| doc.get("uri"))
                    .and_then(Value::as_str);
                let text = params
                    .get("contentChanges")
                    .and_then(Value::as_array)
                    .and_then(|changes| changes.last())
                    .and_then(|change| change.get("text"))
                    .and_then(Value::as_str);
                let (Some(uri), Some(text)) = (uri, text) else {
                    return malformed(writer, name).await.map(|()| None);
                };
                session.dirty_files.insert(uri.to_string(), text.to_string());
            }
            Some(Method::DidClose) => {
                if let Some(uri) = params
                    .get("textDocument")
                    .and_then(|doc| doc.get("uri"))
                    .and_then(Value::as_str)
                {
                    session.dirty_files.remove(uri);
                }
            }
            Some(Method::DidSave) => {
                let Some(uri) = params
                    .get("textDocument")
                    .and_then(|doc| doc.get("uri"))
                    .and_then(Value::as_str)
                else {
                    return malformed(writer, name).await.map(|()| None);
                };
                // the buffer just hit the disk, the dirty copy is stale
                let uri = uri.to_string();
                session.dirty_files.remove(&uri);
                if session.compile_on_save() {
                    match session.get_document(&uri).await {
                        Some(text) => {
                            self.publish_compile_diagnostics(session, &uri, &text, writer)
                                .await?;
                        }
                        None => {
                            show_message(
                                writer,
                                MessageType::Error,
                                &format!("cannot read document {}", uri),
                            )
                            .await?;
                        }
                    }
                }
            }
            Some(_) => {
                debug!(method = name, "ignoring request method sent as a notification");
            }
            None => {
                debug!(method = name, "ignoring unknown notification");
            }
        }
        Ok(None)
    }

    /// Compile one document and publish its diagnostics, or surface the
    /// one-per-session warning when no compiler is available.
    pub(crate) async fn publish_compile_diagnostics<W>(
        &self,
        session: &mut Session,
        uri: &str,
        document: &str,
        writer: &mut W,
    ) -> Result<(), FramingError>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(compiler) = self.compiler.as_deref() else {
            if !session.compiler_warned {
                session.compiler_warned = true;
                show_message(
                    writer,
                    MessageType::Warning,
                    "no YARA compiler is available, diagnostics are disabled",
                )
                .await?;
            }
            return Ok(());
        };
        match provide_diagnostic(compiler, document) {
            Ok(diagnostics) => publish_diagnostics(writer, uri, &diagnostics).await,
            Err(err) => {
                warn!(error = %err, uri, "compilation failed");
                show_message(writer, MessageType::Error, &err.to_string()).await
            }
        }
    }

    /// Advertise a capability only when the client registered interest in
    /// it dynamically. The compile commands are offered only when a
    /// compiler collaborator exists.
    fn negotiate_capabilities(&self, client: &Value) -> Map<String, Value> {
        let doc_options = client.get("textDocument");
        let ws_options = client.get("workspace");
        let mut server_options = Map::new();
        if dynamic_registration(doc_options, "completion") {
            server_options.insert(
                "completionProvider".to_string(),
                json!({ "resolveProvider": false, "triggerCharacters": ["."] }),
            );
        }
        if dynamic_registration(doc_options, "definition") {
            server_options.insert("definitionProvider".to_string(), Value::Bool(true));
        }
        if dynamic_registration(doc_options, "hover") {
            server_options.insert("hoverProvider".to_string(), Value::Bool(true));
        }
        if dynamic_registration(ws_options, "executeCommand") {
            let commands: Vec<&str> = if self.compiler.is_some() {
                vec![commands::COMPILE_RULE, commands::COMPILE_ALL_RULES]
            } else {
                Vec::new()
            };
            server_options.insert(
                "executeCommandProvider".to_string(),
                json!({ "commands": commands }),
            );
        }
        if dynamic_registration(doc_options, "formatting") {
            server_options.insert("documentFormattingProvider".to_string(), Value::Bool(true));
        }
        if dynamic_registration(doc_options, "references") {
            server_options.insert("referencesProvider".to_string(), Value::Bool(true));
        }
        if dynamic_registration(doc_options, "rename") {
            server_options.insert("renameProvider".to_string(), Value::Bool(true));
        }
        if dynamic_registration(doc_options, "synchronization") {
            server_options.insert("textDocumentSync".to_string(), json!(TextSyncKind::Full));
        }
        server_options
    }
}

fn dynamic_registration(section: Option<&Value>, feature: &str) -> bool {
    section
        .and_then(|options| options.get(feature))
        .and_then(|feature| feature.get("dynamicRegistration"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// The client's completion trigger, when the request carried one.
fn completion_trigger(params: &Value) -> Option<CompletionTriggerKind> {
    params
        .get("context")
        .and_then(|context| context.get("triggerKind"))
        .cloned()
        .and_then(|kind| serde_json::from_value(kind).ok())
}

fn parse_position(params: &Value) -> Option<Position> {
    params
        .get("position")
        .cloned()
        .and_then(|position| serde_json::from_value(position).ok())
}

fn feature_error(method: Method, message: String) -> CapabilityError {
    match method {
        Method::Completion => CapabilityError::Completion(message),
        Method::Definition => CapabilityError::Definition(message),
        Method::Hover => CapabilityError::Hover(message),
        Method::References => CapabilityError::Reference(message),
        Method::Rename => CapabilityError::Rename(message),
        _ => CapabilityError::Diagnostic(message),
    }
}

fn to_result<T: serde::Serialize>(method: Method, value: T) -> Result<Value, CapabilityError> {
    serde_json::to_value(value).map_err(|err| feature_error(method, err.to_string()))
}

/// The result shape a client expects when a handler fails recoverably.
fn empty_result(method: Method) -> Value {
    match method {
        Method::Hover => Value::Null,
        Method::Rename => json!({ "changes": {} }),
        _ => json!([]),
    }
}

async fn malformed<W>(writer: &mut W, method: &str) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    warn!(method, "malformed notification parameters");
    show_message(
        writer,
        MessageType::Error,
        &format!("malformed '{}' notification", method),
    )
    .await
}

pub(crate) async fn show_message<W>(
    writer: &mut W,
    kind: MessageType,
    text: &str,
) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let params = json!({ "type": kind, "message": text });
    write_message(writer, &rpc::notification("window/showMessage", params)).await
}

pub(crate) async fn publish_diagnostics<W>(
    writer: &mut W,
    uri: &str,
    diagnostics: &[Diagnostic],
) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let params = json!({ "uri": uri, "diagnostics": diagnostics });
    write_message(
        writer,
        &rpc::notification("textDocument/publishDiagnostics", params),
    )
    .await
}
