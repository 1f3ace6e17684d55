//! Private file serving.
//!
//! `{mount}/private-files/{id}/{name}` is decoded to an attachment id, run
//! through the access gate, then either streamed or redirected to login.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{
        StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{debug, error};
use warden_core::access::{AccessDecision, AccessGate, RequestContext, ServingContext};
use warden_core::attachment::Attachment;
use warden_core::url_codec::PRIVATE_FILES_SEGMENT;

use crate::{AppState, error::ApiError, middleware::Requester};

/// Creates the file-serving routes under `mount` (`""` for the site root).
pub fn routes(mount: &str) -> Router<AppState> {
    let base = format!("{mount}/{PRIVATE_FILES_SEGMENT}");
    Router::new()
        .route(&format!("{base}/"), get(serve_private_file))
        .route(&format!("{base}/{{*rest}}"), get(serve_private_file))
}

/// GET `{mount}/private-files/{*rest}`
async fn serve_private_file(
    State(state): State<AppState>,
    requester: Requester,
    uri: Uri,
) -> Response {
    // Legacy links carry the id in the query string.
    let request_path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());

    let attachment = match state.codec.decode(&request_path) {
        Ok(reference) => match state.store.get(reference.id).await {
            Ok(found) => found,
            Err(e) => return ApiError::from(e).into_response(),
        },
        Err(e) => {
            debug!(path = %request_path, error = %e, "undecodable private file path");
            None
        }
    };

    let ctx = RequestContext::front_end(requester.is_authenticated());
    match AccessGate::decide_for(attachment.as_ref(), &ctx, ServingContext::FileFetch) {
        AccessDecision::Serve => match attachment {
            Some(attachment) => stream(&state, &attachment).await,
            None => ApiError::not_found().into_response(),
        },
        AccessDecision::Redirect => state.identity.require_authentication(&request_path),
        AccessDecision::NotFound => ApiError::not_found().into_response(),
    }
}

/// Stream the primary file with its type and on-disk size.
async fn stream(state: &AppState, attachment: &Attachment) -> Response {
    let path = &attachment.attached_path;
    let (stat, body) = match state.storage.open(path).await {
        Ok(opened) => opened,
        Err(e) => {
            error!(attachment_id = %attachment.id, path = %path, error = %e, "attachment file unavailable");
            return ApiError::new(StatusCode::NOT_FOUND, "file_not_found", "File not found")
                .into_response();
        }
    };

    let cache = if attachment.is_private {
        "private, no-store"
    } else {
        "public, max-age=3600"
    };

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, attachment.mime_type.clone()),
            (CONTENT_LENGTH, stat.size.to_string()),
            (CACHE_CONTROL, cache.to_string()),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
