//! Static file handler.

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;

use crate::http::request::NormalizedRequest;
use crate::http::response::ResponseBuilder;
use crate::routing::{Handler, HandlerContext, HandlerResult};

/// Serves one file from disk. A missing file is a handler fault.
#[derive(Debug, Clone)]
pub struct StaticFile {
    path: PathBuf,
    mime_type: String,
}

impl StaticFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mime_type = mime_for(&path).to_string();
        Self { path, mime_type }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl Handler for StaticFile {
    fn call(&self, _request: NormalizedRequest, _ctx: HandlerContext) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            let contents = tokio::fs::read(&self.path).await?;
            tracing::trace!(path = %self.path.display(), bytes = contents.len(), "Serving static file");
            Ok(ResponseBuilder::new()
                .send(contents)
                .mime_type(self.mime_type.as_str())
                .build())
        })
    }
}

/// MIME type by file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "ico" => "image/x-icon",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => "application/octet-stream",
    }
}
