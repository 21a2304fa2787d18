use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::models::WorkspaceResponse;
use crate::services::{UploadedFile, Workspace};
use crate::state::AppState;
use crate::utils::error::ApiError;

fn summary(workspace: &Workspace) -> WorkspaceResponse {
    WorkspaceResponse {
        workspace_id: workspace.id,
        file_names: workspace.file_names.clone(),
        chunk_count: workspace.chunks.len(),
    }
}

/// An oversized body surfaces as 413, anything else as a malformed request.
fn multipart_error(context: String, e: MultipartError) -> ApiError {
    let message = format!("{}: {}", context, e.body_text());
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

/// Upload one or more regulation PDFs and build a workspace from them.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<WorkspaceResponse>), ApiError> {
    info!("Document upload request received");

    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read field".to_string(), e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" | "file" => {
                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::BadRequest("filename required".to_string()))?;
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(format!("Failed to read '{}'", name), e))?
                    .to_vec();

                files.push(UploadedFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let workspace = state.ingest.ingest(files).await?;
    Ok((StatusCode::CREATED, Json(summary(&workspace))))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkspaceResponse>, ApiError> {
    let workspace = state.workspaces.get(&id)?;
    Ok(Json(summary(&workspace)))
}

/// Drop a workspace and its chunks.
pub async fn delete_workspace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.workspaces.remove(&id)?;
    info!("Workspace {} reset", id);
    Ok(StatusCode::NO_CONTENT)
}
