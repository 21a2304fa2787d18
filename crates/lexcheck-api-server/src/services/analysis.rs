use lexcheck_core::join_for_prompt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::history::HistoryStore;
use super::llm::{GenerateRequest, LlmProvider};
use super::workspace::Workspace;
use crate::models::{response_schema, AnalysisResult, GeminiModel, SearchHistoryItem};
use crate::utils::error::ApiError;

/// Runs the compliance analysis of an incident against a workspace corpus.
pub struct AnalysisService {
    llm: Arc<dyn LlmProvider>,
    history: Arc<HistoryStore>,
    system_prompt: String,
}

impl AnalysisService {
    pub fn new(llm: Arc<dyn LlmProvider>, history: Arc<HistoryStore>, system_prompt: String) -> Self {
        Self {
            llm,
            history,
            system_prompt,
        }
    }

    pub fn build_prompt(chunks: &[String], query: &str) -> String {
        format!(
            "Regulation text:\n{}\n\n---\n\nIncident:\n{}",
            join_for_prompt(chunks),
            query.trim()
        )
    }

    pub async fn analyze(
        &self,
        workspace: &Workspace,
        query: &str,
        model: GeminiModel,
        api_key: &str,
    ) -> Result<SearchHistoryItem, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::BadRequest("Describe the incident to analyse".to_string()));
        }

        let request = GenerateRequest {
            system_instruction: Some(self.system_prompt.clone()),
            response_schema: Some(response_schema()),
            ..GenerateRequest::text(model, Self::build_prompt(&workspace.chunks, query))
        };

        info!(
            "Analysing workspace {} ({} chunks) with {}",
            workspace.id,
            workspace.chunks.len(),
            model
        );
        let raw = self.llm.generate(api_key, request).await?;
        debug!("Model answered with {} bytes", raw.len());

        let result = parse_result(&raw)?;
        let item = SearchHistoryItem::new(query.trim(), result, &workspace.file_names);
        self.history.record(item.clone()).await?;

        Ok(item)
    }
}

/// Parse the model's JSON answer, tolerating a Markdown code fence.
pub fn parse_result(raw: &str) -> Result<AnalysisResult, ApiError> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| {
        warn!("Unparseable analysis answer: {}", e);
        ApiError::UpstreamError(format!("The model returned malformed JSON: {}", e))
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
