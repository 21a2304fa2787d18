use std::sync::Arc;
use tracing::info;

use super::llm::{GenerateRequest, LlmProvider};
use crate::models::{FormGuideRequest, GeminiModel};
use crate::utils::error::ApiError;

/// Drafts a filled-in statutory form from its template and the incident.
pub struct FormGuideService {
    llm: Arc<dyn LlmProvider>,
    prompt_template: String,
}

impl FormGuideService {
    pub fn new(llm: Arc<dyn LlmProvider>, prompt_template: String) -> Self {
        Self {
            llm,
            prompt_template,
        }
    }

    pub fn render_prompt(&self, request: &FormGuideRequest) -> String {
        self.prompt_template
            .replace("{form_name}", &request.form_name)
            .replace("{related_law}", &request.related_law)
            .replace("{query}", &request.query)
            .replace("{template}", &request.template)
    }

    pub async fn guide(
        &self,
        request: &FormGuideRequest,
        model: GeminiModel,
        api_key: &str,
    ) -> Result<String, ApiError> {
        if request.template.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "A template is required to fill in '{}'",
                request.form_name
            )));
        }

        info!("Drafting form '{}' with {}", request.form_name, model);
        let answer = self
            .llm
            .generate(api_key, GenerateRequest::text(model, self.render_prompt(request)))
            .await?;

        Ok(answer.trim().to_string())
    }
}
