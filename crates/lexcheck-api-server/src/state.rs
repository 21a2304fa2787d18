use anyhow::Result;
use axum::extract::FromRef;
use lexcheck_core::{LopdfDecoder, TextChunker, TextExtractor};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::services::{
    AnalysisService, AssistantService, FormGuideService, HistoryStore, IngestService,
    LlmProvider, WorkspaceStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub llm: Arc<dyn LlmProvider>,
    pub workspaces: Arc<WorkspaceStore>,
    pub ingest: Arc<IngestService>,
    pub analysis: Arc<AnalysisService>,
    pub form_guide: Arc<FormGuideService>,
    pub assistant: Arc<AssistantService>,
    pub history: Arc<HistoryStore>,
}

impl AppState {
    pub async fn new(settings: Settings, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        let chunker = TextChunker::new(settings.chunking.size, settings.chunking.overlap)?;
        let extractor = TextExtractor::with_layout(LopdfDecoder, settings.layout);

        let workspaces = Arc::new(WorkspaceStore::new());
        let ingest = Arc::new(IngestService::new(
            extractor,
            chunker,
            settings.max_upload_bytes(),
            Duration::from_secs(settings.server.extraction_timeout_seconds),
            workspaces.clone(),
        ));

        let history = Arc::new(
            HistoryStore::load(settings.history.path.clone(), settings.history.max_entries).await,
        );

        let analysis = Arc::new(AnalysisService::new(
            llm.clone(),
            history.clone(),
            settings.prompts.analysis_system_prompt.clone(),
        ));
        let form_guide = Arc::new(FormGuideService::new(
            llm.clone(),
            settings.prompts.form_guide_prompt.clone(),
        ));
        let assistant = Arc::new(AssistantService::new(
            llm.clone(),
            settings.assistant.model,
            settings.prompts.assistant_system_prompt.clone(),
            settings.assistant.max_sessions,
        ));

        Ok(Self {
            settings: Arc::new(settings),
            llm,
            workspaces,
            ingest,
            analysis,
            form_guide,
            assistant,
            history,
        })
    }
}

impl FromRef<AppState> for Arc<HistoryStore> {
    fn from_ref(state: &AppState) -> Self {
        state.history.clone()
    }
}

impl FromRef<AppState> for Arc<WorkspaceStore> {
    fn from_ref(state: &AppState) -> Self {
        state.workspaces.clone()
    }
}
