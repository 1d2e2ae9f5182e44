use crate::resolver::{ContentResolver, Resolved};
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Shared state handed to the fallback page handler
struct AppState {
    resolver: ContentResolver,
}

/// Serve the mirror: static asset roots plus resolver-backed pages.
///
/// The basic site's css/ takes priority over the scraped css/; images and
/// fonts come straight from the scraped content. Everything else is resolved
/// to page content. Runs until the process is terminated.
pub async fn run(port: u16, content_dir: &Path, public_dir: &Path) -> Result<()> {
    let resolver = ContentResolver::new(content_dir, public_dir)?;
    let state = Arc::new(AppState { resolver });

    let app = Router::new()
        .nest_service("/images", ServeDir::new(content_dir.join("images")))
        .nest_service(
            "/css",
            ServeDir::new(public_dir.join("css")).fallback(ServeDir::new(content_dir.join("css"))),
        )
        .nest_service("/js", ServeDir::new(public_dir.join("js")))
        .nest_service("/fonts", ServeDir::new(content_dir.join("fonts")))
        .fallback(serve_page)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding to port {port}"))?;
    ::log::info!("Serving mirror on http://0.0.0.0:{}", port);
    ::log::info!("Scraped content from: {}", content_dir.display());
    ::log::info!("Basic site from: {}", public_dir.display());

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_page(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let path = uri.path();

    // CMS paths and the script store are never served
    if path.starts_with("/scripts/")
        || path.starts_with("/wp-content/")
        || path.starts_with("/wp-includes/")
    {
        return (StatusCode::NOT_FOUND, "Resource not available").into_response();
    }

    match state.resolver.resolve(path) {
        Resolved::Basic(html) | Resolved::Scraped(html) => Html(html).into_response(),
        Resolved::NotFound => {
            ::log::warn!("No content for: {}", path);
            (StatusCode::NOT_FOUND, "Page not found").into_response()
        }
    }
}
