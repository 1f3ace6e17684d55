//! Attachment lookup, listing and visibility routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use warden_core::access::{RequestContext, VisibilityFilter};
use warden_core::attachment::{Attachment, AttachmentId, Visibility};
use warden_core::query::AttachmentQuery;
use warden_core::storage::WriteCredentials;
use warden_core::url_codec::UrlCodec;
use warden_shared::AppError;
use warden_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiError, middleware::AuthUser, middleware::Requester};

/// Creates the public attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attachments", get(list_attachments))
        .route("/attachments/{id}", get(get_attachment))
        .route("/attachments/by-name/{name}", get(get_attachment_by_name))
}

/// Creates the routes that require authentication.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/attachments/{id}/visibility", put(set_visibility))
        .route("/admin/attachments", get(admin_list_attachments))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// `public` or `private`.
    pub visibility: Option<String>,
    /// 1-indexed page.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl ListParams {
    fn filter(&self) -> Result<Option<VisibilityFilter>, ApiError> {
        self.visibility
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| AppError::Validation(e).into())
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

/// Request body for changing visibility.
#[derive(Debug, Deserialize)]
pub struct SetVisibilityRequest {
    /// Target partition.
    pub is_private: bool,
    /// Storage write key, when the server requires one.
    #[serde(default)]
    pub write_key: Option<String>,
}

/// Response for an attachment. The storage path is never exposed.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: AttachmentId,
    /// Lookup name.
    pub slug: String,
    /// URL to fetch the file from.
    pub url: String,
    /// MIME type.
    pub mime_type: String,
    /// Whether the attachment is private.
    pub is_private: bool,
    /// Names of the derived renditions.
    pub variants: Vec<String>,
}

impl AttachmentResponse {
    fn new(attachment: &Attachment, codec: &UrlCodec) -> Self {
        Self {
            id: attachment.id,
            slug: attachment.slug.clone(),
            url: codec.encode(attachment).into_string(),
            mime_type: attachment.mime_type.clone(),
            is_private: attachment.is_private,
            variants: attachment.variants.iter().map(|v| v.name.clone()).collect(),
        }
    }
}

/// Response for a visibility change.
#[derive(Debug, Serialize)]
pub struct SetVisibilityResponse {
    /// Attachment after the change.
    pub attachment: AttachmentResponse,
    /// Whether files moved.
    pub relocated: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/attachments`
/// Front-end listing. Private attachments are excluded unless an
/// authenticated caller asks for `?visibility=private`.
async fn list_attachments(
    State(state): State<AppState>,
    requester: Requester,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<AttachmentResponse>>, ApiError> {
    let ctx = RequestContext::front_end(requester.is_authenticated()).with_filter(params.filter()?);
    list(&state, &ctx, params.page()).await
}

/// GET `/admin/attachments`
async fn admin_list_attachments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<AttachmentResponse>>, ApiError> {
    let ctx = RequestContext::admin(true).with_filter(params.filter()?);
    list(&state, &ctx, params.page()).await
}

async fn list(
    state: &AppState,
    ctx: &RequestContext,
    page: PageRequest,
) -> Result<Json<PageResponse<AttachmentResponse>>, ApiError> {
    let attachments = state.queries.list(page, ctx).await?;
    Ok(Json(
        attachments.map(|a| AttachmentResponse::new(&a, &state.codec)),
    ))
}

/// GET `/attachments/{id}`
async fn get_attachment(
    State(state): State<AppState>,
    requester: Requester,
    Path(id): Path<i64>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    find_one(&state, &requester, &AttachmentQuery::by_id(AttachmentId(id))).await
}

/// GET `/attachments/by-name/{name}`
async fn get_attachment_by_name(
    State(state): State<AppState>,
    requester: Requester,
    Path(name): Path<String>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    find_one(&state, &requester, &AttachmentQuery::by_name(name)).await
}

async fn find_one(
    state: &AppState,
    requester: &Requester,
    query: &AttachmentQuery,
) -> Result<Json<AttachmentResponse>, ApiError> {
    let ctx = RequestContext::front_end(requester.is_authenticated());
    let attachment = state
        .queries
        .find_one(query, &ctx)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(AttachmentResponse::new(&attachment, &state.codec)))
}

/// PUT `/attachments/{id}/visibility`
/// Move the attachment's files into the requested partition.
async fn set_visibility(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<SetVisibilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.can_edit() {
        return Err(AppError::Forbidden("Editor role required".to_string()).into());
    }

    let id = AttachmentId(id);
    let target = Visibility::from_private(payload.is_private);
    let credentials = payload.write_key.map(WriteCredentials::new);

    let outcome = state
        .visibility
        .set_visibility(id, target, credentials.as_ref())
        .await?;

    info!(
        attachment_id = %id,
        user_id = %auth.user_id(),
        %target,
        relocated = outcome.relocated(),
        "attachment visibility set"
    );

    let relocated = outcome.relocated();
    Ok((
        StatusCode::OK,
        Json(SetVisibilityResponse {
            attachment: AttachmentResponse::new(outcome.attachment(), &state.codec),
            relocated,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{TestApp, json_body};
    use warden_core::attachment::AttachmentStore;

    #[tokio::test]
    async fn test_default_listing_hides_private() {
        let app = TestApp::new();
        app.seed_private_image();
        app.seed_public_image();

        let body = json_body(app.get("/api/v1/attachments", None).await).await;

        let ids: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![7]);
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["url"], "https://example.com/uploads/2024/photo.jpg");
    }

    #[tokio::test]
    async fn test_private_toggle_needs_login() {
        let app = TestApp::new();
        app.seed_private_image();
        app.seed_public_image();
        let token = app.token("subscriber");

        let anonymous = json_body(app.get("/api/v1/attachments?visibility=private", None).await).await;
        assert_eq!(anonymous["data"][0]["id"], 7);

        let authed =
            json_body(app.get("/api/v1/attachments?visibility=private", Some(&token)).await).await;
        assert_eq!(authed["data"].as_array().unwrap().len(), 1);
        assert_eq!(authed["data"][0]["id"], 42);
        assert_eq!(
            authed["data"][0]["url"],
            "https://example.com/uploads/private-files/42/img.jpg"
        );
        assert!(authed["data"][0].get("attached_path").is_none());
    }

    #[tokio::test]
    async fn test_invalid_visibility_filter() {
        let app = TestApp::new();
        let response = app.get("/api/v1/attachments?visibility=everything", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_private_detail_is_not_found_for_anonymous() {
        let app = TestApp::new();
        app.seed_private_image();
        let token = app.token("subscriber");

        for uri in ["/api/v1/attachments/42", "/api/v1/attachments/by-name/img"] {
            let anonymous = app.get(uri, None).await;
            assert_eq!(anonymous.status(), StatusCode::NOT_FOUND, "{uri}");

            let authed = app.get(uri, Some(&token)).await;
            assert_eq!(authed.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_listing_requires_auth() {
        let app = TestApp::new();
        app.seed_private_image();

        let anonymous = app.get("/api/v1/admin/attachments", None).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let token = app.token("admin");
        let body = json_body(
            app.get("/api/v1/admin/attachments?visibility=private", Some(&token))
                .await,
        )
        .await;
        assert_eq!(body["data"][0]["id"], 42);
    }

    #[tokio::test]
    async fn test_make_private_then_public() {
        let app = TestApp::new();
        app.seed_public_image();
        let token = app.token("editor");

        let response = app
            .put_json("/api/v1/attachments/7/visibility", Some(&token), r#"{"is_private":true}"#)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["relocated"], true);
        assert_eq!(body["attachment"]["is_private"], true);
        assert_eq!(
            body["attachment"]["url"],
            "https://example.com/uploads/private-files/7/photo.jpg"
        );
        assert!(app.on_disk("private-files-abc123/2024/photo.jpg"));
        assert!(app.on_disk("private-files-abc123/2024/photo-150x150.jpg"));
        assert!(!app.on_disk("2024/photo.jpg"));

        let again = json_body(
            app.put_json("/api/v1/attachments/7/visibility", Some(&token), r#"{"is_private":true}"#)
                .await,
        )
        .await;
        assert_eq!(again["relocated"], false);

        let back = json_body(
            app.put_json("/api/v1/attachments/7/visibility", Some(&token), r#"{"is_private":false}"#)
                .await,
        )
        .await;
        assert_eq!(back["attachment"]["is_private"], false);
        assert!(app.on_disk("2024/photo.jpg"));
    }

    #[tokio::test]
    async fn test_visibility_change_needs_editor() {
        let app = TestApp::new();
        app.seed_public_image();

        let anonymous = app
            .put_json("/api/v1/attachments/7/visibility", None, r#"{"is_private":true}"#)
            .await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let token = app.token("subscriber");
        let subscriber = app
            .put_json("/api/v1/attachments/7/visibility", Some(&token), r#"{"is_private":true}"#)
            .await;
        assert_eq!(subscriber.status(), StatusCode::FORBIDDEN);
        assert!(app.on_disk("2024/photo.jpg"));
    }

    #[tokio::test]
    async fn test_missing_write_key_changes_nothing() {
        let app = TestApp::with_write_key("s3cret");
        app.seed_public_image();
        let token = app.token("editor");

        let response = app
            .put_json("/api/v1/attachments/7/visibility", Some(&token), r#"{"is_private":true}"#)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "no_write_access");

        let stored = app.store.get(AttachmentId(7)).await.unwrap().unwrap();
        assert!(!stored.is_private);
        assert_eq!(stored.attached_path, "2024/photo.jpg");

        let granted = app
            .put_json(
                "/api/v1/attachments/7/visibility",
                Some(&token),
                r#"{"is_private":true,"write_key":"s3cret"}"#,
            )
            .await;
        assert_eq!(granted.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_attachment_visibility() {
        let app = TestApp::new();
        let token = app.token("admin");
        let response = app
            .put_json("/api/v1/attachments/404/visibility", Some(&token), r#"{"is_private":true}"#)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let response = app.get("/api/v1/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }
}
