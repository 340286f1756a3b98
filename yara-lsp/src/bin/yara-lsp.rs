//! Language server binary
//!
//! Usage:
//!   yara-lsp [--host <addr>] [--port <port>]   - Serve clients over TCP
//!   yara-lsp --stdio                           - Serve a single client over stdio
//!
//! Logs go to stderr so stdout stays clean for the protocol stream.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{value_parser, Arg, ArgAction, Command};
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use yara_lsp::{ExitStatus, YaraLanguageServer};

fn main() -> ExitCode {
    let matches = Command::new("yara-lsp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A language server for YARA rule files")
        .arg(
            Arg::new("host")
                .long("host")
                .help("Interface to listen on")
                .default_value("127.0.0.1"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("Port to listen on")
                .value_parser(value_parser!(u16))
                .default_value("8471"),
        )
        .arg(
            Arg::new("stdio")
                .long("stdio")
                .help("Serve a single client over stdin/stdout instead of TCP")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    if matches.get_flag("stdio") {
        return runtime.block_on(serve_stdio());
    }
    let host = matches
        .get_one::<String>("host")
        .map(String::as_str)
        .unwrap_or("127.0.0.1");
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8471);
    runtime.block_on(serve_tcp(host, port))
}

async fn serve_stdio() -> ExitCode {
    let server = YaraLanguageServer::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    match server.handle_client(&mut reader, &mut writer).await {
        ExitStatus::Clean => ExitCode::SUCCESS,
        ExitStatus::Abnormal => ExitCode::FAILURE,
    }
}

async fn serve_tcp(host: &str, port: u16) -> ExitCode {
    let listener = match TcpListener::bind((host, port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(host, port, error = %err, "cannot bind listener");
            return ExitCode::FAILURE;
        }
    };
    info!(host, port, "listening for clients");

    let server = Arc::new(YaraLanguageServer::new());
    let mut next_client = 0u64;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "failed to accept connection");
                continue;
            }
        };
        next_client += 1;
        let server = Arc::clone(&server);
        let span = info_span!("client", id = next_client, %peer);
        tokio::spawn(
            async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut reader = BufReader::new(read_half);
                let status = server.handle_client(&mut reader, &mut write_half).await;
                if status == ExitStatus::Abnormal {
                    warn!("connection ended abnormally");
                }
            }
            .instrument(span),
        );
    }
}
