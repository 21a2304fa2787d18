use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lexcheck_core::{assemble_corpus, LopdfDecoder, TextChunker, TextExtractor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::utils::error::ApiError;

const PDF_MIME: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF";

/// Chunked regulation text from one upload, ready for analysis.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: Uuid,
    pub file_names: Vec<String>,
    pub chunks: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// In-memory workspaces keyed by id.
#[derive(Default)]
pub struct WorkspaceStore {
    workspaces: DashMap<Uuid, Arc<Workspace>>,
}

impl WorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, workspace: Workspace) -> Arc<Workspace> {
        let workspace = Arc::new(workspace);
        self.workspaces.insert(workspace.id, Arc::clone(&workspace));
        workspace
    }

    pub fn get(&self, id: &Uuid) -> Result<Arc<Workspace>, ApiError> {
        self.workspaces
            .get(id)
            .map(|w| Arc::clone(w.value()))
            .ok_or_else(|| ApiError::NotFound(format!("Workspace {} not found", id)))
    }

    pub fn remove(&self, id: &Uuid) -> Result<(), ApiError> {
        self.workspaces
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("Workspace {} not found", id)))
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    fn looks_like_pdf(&self) -> bool {
        match self.content_type.as_deref() {
            Some(PDF_MIME) => true,
            None | Some("application/octet-stream") => {
                self.name.to_lowercase().ends_with(".pdf") && self.bytes.starts_with(PDF_MAGIC)
            }
            Some(_) => false,
        }
    }
}

/// Validates uploads, extracts their text and stores the chunked corpus.
pub struct IngestService {
    extractor: TextExtractor<LopdfDecoder>,
    chunker: TextChunker,
    max_upload_bytes: usize,
    timeout: Duration,
    store: Arc<WorkspaceStore>,
}

impl IngestService {
    pub fn new(
        extractor: TextExtractor<LopdfDecoder>,
        chunker: TextChunker,
        max_upload_bytes: usize,
        timeout: Duration,
        store: Arc<WorkspaceStore>,
    ) -> Self {
        Self {
            extractor,
            chunker,
            max_upload_bytes,
            timeout,
            store,
        }
    }

    pub fn validate(&self, files: &[UploadedFile]) -> Result<(), ApiError> {
        if files.is_empty() {
            return Err(ApiError::BadRequest("At least one PDF file is required".to_string()));
        }
        for file in files {
            if !file.looks_like_pdf() {
                return Err(ApiError::BadRequest(format!(
                    "'{}' is not a PDF file",
                    file.name
                )));
            }
            if file.bytes.len() > self.max_upload_bytes {
                return Err(ApiError::PayloadTooLarge(format!(
                    "'{}' exceeds the {} MB limit",
                    file.name,
                    self.max_upload_bytes / (1024 * 1024)
                )));
            }
        }
        Ok(())
    }

    pub async fn ingest(&self, files: Vec<UploadedFile>) -> Result<Arc<Workspace>, ApiError> {
        self.validate(&files)?;

        let file_names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        info!("Ingesting {} files: {}", file_names.len(), file_names.join(", "));

        let batch = files.into_iter().map(|f| (f.name, f.bytes));
        let documents = tokio::time::timeout(self.timeout, self.extractor.extract_batch(batch))
            .await
            .map_err(|_| {
                warn!("Extraction exceeded {:?}", self.timeout);
                ApiError::Timeout("Text extraction took too long".to_string())
            })??;

        let chunks = assemble_corpus(&documents, &self.chunker)?;
        info!("Corpus ready: {} chunks", chunks.len());

        Ok(self.store.insert(Workspace {
            id: Uuid::new_v4(),
            file_names,
            chunks,
            created_at: Utc::now(),
        }))
    }
}
