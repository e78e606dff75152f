//! services/api/src/web/users.rs
//!
//! Profile endpoints: self-service updates, résumé upload and public profiles.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use job_board_core::domain::{ProfilePatch, Resume};
use job_board_core::ports::{DatabaseService, FileStorageService};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::middleware::AuthUser;
use crate::web::response::UserResponse;
use crate::web::state::AppState;

const RESUME_FIELD: &str = "resume";
const PDF_REQUIRED: &str = "Please upload a PDF file";

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadResponse {
    pub success: bool,
    pub message: String,
    pub resume_url: String,
}

fn is_pdf(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"))
}

/// Pulls the `resume` part out of the form, if it is a PDF.
async fn read_resume(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        if !is_pdf(field.file_name(), field.content_type()) {
            return Err(ApiError::Validation(PDF_REQUIRED.to_string()));
        }
        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        if data.is_empty() {
            break;
        }
        return Ok((file_name, data));
    }
    Err(ApiError::Validation(PDF_REQUIRED.to_string()))
}

/// Uploads the file and points the user at it. The replaced file is only
/// removed once the new reference is saved; if saving fails the new upload
/// is removed instead.
async fn store_resume(
    db: &dyn DatabaseService,
    files: &dyn FileStorageService,
    user_id: Uuid,
    file_name: &str,
    data: Bytes,
) -> Result<Resume, ApiError> {
    let resume = files.upload(file_name, data).await?;

    let previous = match db.replace_resume(user_id, &resume).await {
        Ok((_, previous)) => previous,
        Err(e) => {
            if let Err(cleanup) = files.delete(&resume.public_id).await {
                warn!("Failed to remove orphaned upload {}: {}", resume.public_id, cleanup);
            }
            return Err(e.into());
        }
    };

    if let Some(previous) = previous {
        if let Err(e) = files.delete(&previous.public_id).await {
            warn!("Failed to delete previous résumé {}: {}", previous.public_id, e);
        }
    }
    Ok(resume)
}

/// PUT /api/users/profile - Merge fields into the caller's profile
#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.db.update_profile(auth.id, &patch).await?;
    Ok(Json(UserResponse::new(user)))
}

/// POST /api/users/upload-resume - Upload the caller's résumé (PDF)
#[utoipa::path(
    post,
    path = "/api/users/upload-resume",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data", description = "A PDF in the `resume` field."),
    responses(
        (status = 200, description = "Résumé stored", body = ResumeUploadResponse),
        (status = 400, description = "No PDF provided", body = ErrorBody),
        (status = 403, description = "Not a job seeker", body = ErrorBody)
    )
)]
pub async fn upload_resume(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResumeUploadResponse>, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::Validation(PDF_REQUIRED.to_string()))?;
    let (file_name, data) = read_resume(multipart).await?;

    let resume = store_resume(
        state.db.as_ref(),
        state.file_storage.as_ref(),
        auth.id,
        &file_name,
        data,
    )
    .await?;
    info!("Stored résumé for user {}", auth.id);

    Ok(Json(ResumeUploadResponse {
        success: true,
        message: "Resume uploaded successfully".to_string(),
        resume_url: resume.url,
    }))
}

/// GET /api/users/profile/{id} - A user's public profile
#[utoipa::path(
    get,
    path = "/api/users/profile/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_public_profile(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.db.get_user_by_id(user_id).await?;
    Ok(Json(UserResponse::new(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{LocalFileStorage, MemoryDbAdapter};
    use job_board_core::domain::{NewUser, Role};
    use job_board_core::ports::PortError;
    use std::path::Path;

    fn stored_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn temp_storage() -> LocalFileStorage {
        let dir = std::env::temp_dir().join(format!("resume-test-{}", Uuid::new_v4()));
        LocalFileStorage::new(dir, "http://localhost:5000")
    }

    #[tokio::test]
    async fn failed_save_removes_the_new_upload() {
        let db = MemoryDbAdapter::new();
        let files = temp_storage();

        let err = store_resume(&db, &files, Uuid::new_v4(), "cv.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));
        assert!(stored_files(files.root()).is_empty());
    }

    #[tokio::test]
    async fn replaced_resume_is_removed_after_the_save() {
        let db = MemoryDbAdapter::new();
        let files = temp_storage();
        let seeker = db
            .create_user(NewUser::new(
                "Sam".to_string(),
                "sam@example.com".to_string(),
                "hash".to_string(),
                Role::JobSeeker,
            ))
            .await
            .unwrap();

        let first = store_resume(&db, &files, seeker.id, "one.pdf", Bytes::from_static(b"%PDF-1"))
            .await
            .unwrap();
        let second = store_resume(&db, &files, seeker.id, "two.pdf", Bytes::from_static(b"%PDF-2"))
            .await
            .unwrap();

        assert_ne!(first.public_id, second.public_id);
        assert_eq!(stored_files(files.root()), vec![second.public_id.clone()]);
        let reloaded = db.get_user_by_id(seeker.id).await.unwrap();
        assert_eq!(reloaded.resume(), Some(&second));
    }

    #[test]
    fn pdf_detection_uses_type_or_extension() {
        assert!(is_pdf(Some("cv.PDF"), None));
        assert!(is_pdf(Some("cv"), Some("application/pdf")));
        assert!(!is_pdf(Some("cv.docx"), Some("application/msword")));
        assert!(!is_pdf(None, None));
    }
}
