use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use rmcp::{ServiceExt, transport::stdio};
use clap::Parser;
use playdocs_rs::export::ExportService;
use playdocs_rs::http::{self, AppState};
use playdocs_rs::server::DocsServer;
use playdocs_rs::slug::{DEFAULT_EXPORT_FILE, SlugResolver};
use playdocs_rs::source::ContentDir;

#[cfg(feature = "trace")]
use tracing_subscriber::{EnvFilter};

#[derive(Parser)]
struct Cli {
    /// Directory holding the .md/.mdx documentation pages
    #[clap(long, env = "PLAYDOCS_CONTENT_DIR", default_value = "content")]
    content_dir: PathBuf,
    /// Path prefix the docs site is served under
    #[clap(long, env = "PLAYDOCS_BASE_PATH", default_value = "/docs")]
    base_path: String,
    /// Serve the HTTP exports on this address instead of MCP over stdio (optional)
    #[clap(long, env = "PLAYDOCS_LISTEN")]
    listen: Option<String>,
    /// Log file; stdout is reserved for the MCP transport
    #[clap(long, default_value = "playdocs.log")]
    log_file: PathBuf,
}

/// You can inspect the server using the Model Context Protocol Inspector.
/// npx @modelcontextprotocol/inspector cargo run -- --content-dir content

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    #[cfg(feature = "trace")]
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_writer(std::fs::File::create(&args.log_file)?)
        .with_ansi(false)
        .init();

    tracing::info!("Indexing documentation in {:?}", args.content_dir);
    let source = ContentDir::scan(&args.content_dir)
        .with_context(|| format!("Failed to index {:?}", args.content_dir))?;

    let resolver = SlugResolver::new(&args.base_path, DEFAULT_EXPORT_FILE);
    let export = ExportService::new(source, resolver.base_path());

    if let Some(addr) = &args.listen {
        let state = Arc::new(AppState { export, resolver });
        return http::serve(state, addr).await;
    }

    tracing::info!("Starting MCP server");
    let service = DocsServer::new(Arc::new(export), resolver)
        .serve(stdio()).await.inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}
