//! Plain-text export routes.
//!
//! With the default configuration:
//!
//! - `GET /docs/llms.txt` table of contents, or one page with `?slug=a/b`
//! - `GET /docs/a/b/llms.txt` one page
//! - `GET /docs/llms-full.txt` the whole corpus, never cached

use anyhow::Context;
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::export::{ExportService, PAGE_NOT_FOUND, PageText};
use crate::slug::SlugResolver;
use crate::source::ContentProvider;

/// File name of the full corpus export
pub const FULL_EXPORT_FILE: &str = "llms-full.txt";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub struct AppState<P> {
    pub export: ExportService<P>,
    pub resolver: SlugResolver,
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    slug: Option<String>,
}

/// Build the export router
pub fn router<P>(state: Arc<AppState<P>>) -> Router
where
    P: ContentProvider + 'static,
{
    let base = state.resolver.base_path().to_string();
    let export_file = state.resolver.export_file().to_string();

    Router::new()
        .route(&format!("{}/{}", base, FULL_EXPORT_FILE), get(full_export::<P>))
        .route(&format!("{}/{}", base, export_file), get(page_export::<P>))
        .route(&format!("{}/{{*rest}}", base), get(page_export::<P>))
        .fallback(not_found)
        .with_state(state)
}

/// Serve the export router on `addr` until the process stops
pub async fn serve<P>(state: Arc<AppState<P>>, addr: &str) -> anyhow::Result<()>
where
    P: ContentProvider + 'static,
{
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving documentation exports on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn page_export<P: ContentProvider>(
    State(state): State<Arc<AppState<P>>>,
    Query(params): Query<ExportParams>,
    uri: Uri,
) -> Response {
    let has_slug = params.slug.as_deref().is_some_and(|s| !s.trim().is_empty());
    // catch-all paths only export when they name the export file
    if !has_slug && !is_export_path(uri.path(), state.resolver.export_file()) {
        return not_found().await;
    }

    let slug = state.resolver.resolve(uri.path(), params.slug.as_deref());
    tracing::debug!("Export request {} resolved to '{}'", uri, slug);

    if slug.is_empty() {
        // an explicit root index page is still served as the table of contents
        return text(StatusCode::OK, state.export.get_table_of_contents());
    }

    match state.export.get_page(&slug).await {
        Ok(PageText::Found(body)) => text(StatusCode::OK, body),
        Ok(PageText::NotFound) => text(StatusCode::NOT_FOUND, PAGE_NOT_FOUND.to_string()),
        Err(e) => {
            tracing::error!("Failed to export '{}': {:#}", slug, e);
            text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load page".to_string())
        }
    }
}

async fn full_export<P: ContentProvider>(State(state): State<Arc<AppState<P>>>) -> Response {
    match state.export.get_full_corpus().await {
        Ok(corpus) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, TEXT_PLAIN),
                (header::CACHE_CONTROL, "no-store"),
            ],
            corpus,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to export documentation: {:#}", e);
            text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export documentation".to_string(),
            )
        }
    }
}

async fn not_found() -> Response {
    text(StatusCode::NOT_FOUND, "Not found".to_string())
}

fn text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}

fn is_export_path(path: &str, export_file: &str) -> bool {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|last| last == export_file)
}
