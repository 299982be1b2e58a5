//! SPA fallback serving over the embedded web app bundle.
//!
//! Any path that resolves inside the bundle is served byte-for-byte
//! with a guessed content type. Everything else gets the root document
//! so client-side routing can take over — a miss is never a 404 here;
//! genuine API not-founds are handled before this fallback runs.

use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

/// Compiled web app, embedded at build time.
#[derive(RustEmbed)]
#[folder = "ui/"]
struct Assets;

const ROOT_DOCUMENT: &str = "index.html";

/// Router fallback handler.
pub async fn serve_spa(uri: Uri) -> Response {
    serve_path(uri.path())
}

/// Resolve a request path against the bundle, falling back to the root
/// document on any miss.
pub fn serve_path(path: &str) -> Response {
    let trimmed = path.trim_start_matches('/');
    match Assets::get(trimmed) {
        Some(file) => file_response(file),
        None => match Assets::get(ROOT_DOCUMENT) {
            Some(file) => file_response(file),
            None => {
                tracing::warn!(path, "ui bundle is missing its root document");
                (StatusCode::NOT_FOUND, "ui bundle is missing its root document")
                    .into_response()
            }
        },
    }
}

fn file_response(file: rust_embed::EmbeddedFile) -> Response {
    let mime = file.metadata.mimetype().to_string();
    ([(header::CONTENT_TYPE, mime)], file.data.into_owned()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_asset_is_served_directly() {
        let resp = serve_path("/assets/index.js");
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.contains("javascript"));
    }

    #[test]
    fn unknown_path_falls_back_to_root_document() {
        let resp = serve_path("/overview/sources/some-client-route");
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.contains("html"));
    }

    #[test]
    fn root_path_resolves_to_root_document() {
        let resp = serve_path("/");
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
