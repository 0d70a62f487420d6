//! Server startup: tracing setup and the `serve_stdio!` entry point
//!
//! stdout carries the MCP protocol, so every log line goes to stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines, selected with `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines without ANSI colors
    Text,
    /// One JSON object per line, for log aggregation
    Json,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value. Anything other than `json` means text.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Initialize tracing for an MCP server
///
/// `RUST_LOG` filters as usual; `<crate_name>=info` is always added so the
/// server's own events show up without any configuration.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?,
    }

    Ok(())
}

/// Generate a `main` that serves an MCP server over stdio
///
/// The generated `main`:
///
/// - initializes tracing through [`init_tracing`]
/// - evaluates `$server` after tracing is up, so construction can log
/// - serves over the stdio transport until the client disconnects
///
/// # Arguments
///
/// * `$server` - Expression producing the server. It may use `?`, since
///   `main` returns `anyhow::Result`.
/// * `$crate_name` - Crate name used for the default log directive, as a
///   string literal (e.g., "postgres_mcp")
///
/// # Example
///
/// ```rust,ignore
/// use clap::Parser;
///
/// mcp_common::serve_stdio!(MyServer::new(MyConfig::parse()), "my_mcp");
/// ```
///
/// The calling crate needs `tokio`, `rmcp`, `tracing` and `anyhow` as
/// dependencies.
#[macro_export]
macro_rules! serve_stdio {
    ($server:expr, $crate_name:expr) => {
        #[tokio::main]
        async fn main() -> anyhow::Result<()> {
            use rmcp::ServiceExt;

            $crate::init_tracing($crate_name)?;

            tracing::info!(concat!("Starting ", $crate_name, " MCP Server"));

            let server = $server;
            let service = server.serve(rmcp::transport::stdio()).await?;

            tracing::info!("Server running, waiting for requests...");

            service.waiting().await?;

            tracing::info!("Server shutting down");
            Ok(())
        }
    };
}
