use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;

pub const VIEWER_HEADER: &str = "X-Viewer-Id";

/// Identity of the caller, if it sent one. Authentication happens upstream.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<String>);

impl Viewer {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn require(&self) -> Result<&str, ApiError> {
        self.id()
            .ok_or_else(|| ApiError::Unauthorized("You have to identify as a viewer".to_string()))
    }
}

pub async fn viewer_identity(mut request: Request, next: Next) -> Response {
    let viewer = Viewer(extract_viewer_id(&request));
    request.extensions_mut().insert(viewer);

    next.run(request).await
}

fn extract_viewer_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(VIEWER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
