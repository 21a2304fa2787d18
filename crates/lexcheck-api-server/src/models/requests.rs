use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{group_by_article, AnalysisResult, ClauseGroup};
use super::gemini::GeminiModel;
use super::history::SearchHistoryItem;

#[derive(Debug, Serialize)]
pub struct WorkspaceResponse {
    pub workspace_id: Uuid,
    pub file_names: Vec<String>,
    pub chunk_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    pub model: Option<GeminiModel>,
}

/// Regulation lists of a result grouped by article heading.
#[derive(Debug, Serialize)]
pub struct GroupedRegulations {
    pub core: Vec<ClauseGroup>,
    pub related: Vec<ClauseGroup>,
    pub reference: Vec<ClauseGroup>,
}

impl From<&AnalysisResult> for GroupedRegulations {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            core: group_by_article(&result.core_regulations),
            related: group_by_article(&result.related_regulations),
            reference: group_by_article(&result.reference_regulations),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub history_id: Uuid,
    pub model: GeminiModel,
    pub grouped_regulations: GroupedRegulations,
    pub result: AnalysisResult,
}

impl AnalyzeResponse {
    pub fn new(item: SearchHistoryItem, model: GeminiModel) -> Self {
        Self {
            history_id: item.id,
            model,
            grouped_regulations: GroupedRegulations::from(&item.result),
            result: item.result,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormGuideRequest {
    pub form_name: String,
    pub related_law: String,
    pub query: String,
    pub template: String,
    pub model: Option<GeminiModel>,
}

#[derive(Debug, Serialize)]
pub struct FormGuideResponse {
    pub guide: String,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub history_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyApiKeyResponse {
    pub valid: bool,
}
