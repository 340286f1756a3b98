//! `workspace/executeCommand` handlers
//!
//! Both commands compile rule files through the [`RuleCompiler`]
//! collaborator and publish the results as `textDocument/publishDiagnostics`
//! notifications. Unsaved buffer contents win over whatever is on disk.

use serde_json::Value;
use tokio::io::AsyncWrite;
use tracing::{info, warn};

use crate::server::{publish_diagnostics, show_message};
use crate::session::Session;
use yara_analysis::{provide_diagnostic, RuleCompiler};
use yara_proto::framing::FramingError;
use yara_proto::uri::create_file_uri;
use yara_proto::MessageType;

pub const COMPILE_RULE: &str = "yara.CompileRule";
pub const COMPILE_ALL_RULES: &str = "yara.CompileAllRules";

const RULE_EXTENSIONS: [&str; 2] = ["yar", "yara"];

/// Dispatch one `workspace/executeCommand` request. Always produces a
/// request result; failures surface as `window/showMessage` notifications.
pub async fn execute_command<W>(
    compiler: Option<&dyn RuleCompiler>,
    session: &mut Session,
    params: &Value,
    writer: &mut W,
) -> Result<Value, FramingError>
where
    W: AsyncWrite + Unpin,
{
    let command = params.get("command").and_then(Value::as_str).unwrap_or_default();
    let arguments = params
        .get("arguments")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let Some(compiler) = compiler else {
        if !session.compiler_warned {
            session.compiler_warned = true;
            show_message(
                writer,
                MessageType::Warning,
                "no YARA compiler is available, diagnostics are disabled",
            )
            .await?;
        }
        return Ok(Value::Null);
    };

    match command {
        COMPILE_RULE => {
            info!("compiling rule per user's request");
            compile_rule(compiler, session, &arguments, writer).await?;
        }
        COMPILE_ALL_RULES => {
            info!("compiling all rules in workspace per user's request");
            compile_all_rules(compiler, session, writer).await?;
        }
        unknown => {
            warn!(command = unknown, "unknown command");
            show_message(
                writer,
                MessageType::Warning,
                &format!("unknown command: {}", unknown),
            )
            .await?;
        }
    }
    Ok(Value::Null)
}

/// Compile the document named by the first argument, or every open buffer
/// when the client did not name one.
async fn compile_rule<W>(
    compiler: &dyn RuleCompiler,
    session: &Session,
    arguments: &[Value],
    writer: &mut W,
) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    if let Some(uri) = arguments.first().and_then(Value::as_str) {
        match session.get_document(uri).await {
            Some(text) => return compile_one(compiler, uri, &text, writer).await,
            None => {
                return show_message(
                    writer,
                    MessageType::Error,
                    &format!("cannot read document {}", uri),
                )
                .await;
            }
        }
    }
    for (uri, text) in &session.dirty_files {
        compile_one(compiler, uri, text, writer).await?;
    }
    Ok(())
}

/// Walk the workspace root for rule files and compile each one.
async fn compile_all_rules<W>(
    compiler: &dyn RuleCompiler,
    session: &Session,
    writer: &mut W,
) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let Some(root) = &session.workspace_root else {
        return show_message(
            writer,
            MessageType::Warning,
            "no workspace folder to compile",
        )
        .await;
    };
    for entry in ignore::Walk::new(root).flatten() {
        let path = entry.path();
        let is_rule_file = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| RULE_EXTENSIONS.contains(&extension));
        if !is_rule_file {
            continue;
        }
        let Some(uri) = create_file_uri(path) else {
            continue;
        };
        match session.get_document(&uri).await {
            Some(text) => compile_one(compiler, &uri, &text, writer).await?,
            None => {
                warn!(path = %path.display(), "skipping unreadable rule file");
            }
        }
    }
    Ok(())
}

async fn compile_one<W>(
    compiler: &dyn RuleCompiler,
    uri: &str,
    text: &str,
    writer: &mut W,
) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    match provide_diagnostic(compiler, text) {
        // an empty publish clears any stale diagnostics for the file
        Ok(diagnostics) => publish_diagnostics(writer, uri, &diagnostics).await,
        Err(err) => {
            warn!(error = %err, uri, "compilation failed");
            show_message(writer, MessageType::Error, &err.to_string()).await
        }
    }
}
