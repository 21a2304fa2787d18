use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::AnalysisResult;

/// One completed analysis, as stored in the search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryItem {
    pub id: Uuid,
    pub query: String,
    pub result: AnalysisResult,
    pub timestamp: DateTime<Utc>,
    /// Uploaded file names joined with `, `.
    pub file_name: String,
}

impl SearchHistoryItem {
    pub fn new(query: impl Into<String>, result: AnalysisResult, file_names: &[String]) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            result,
            timestamp: Utc::now(),
            file_name: file_names.join(", "),
        }
    }
}
