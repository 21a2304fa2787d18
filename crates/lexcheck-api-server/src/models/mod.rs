pub mod analysis;
pub mod gemini;
pub mod history;
pub mod requests;

pub use analysis::{response_schema, AnalysisResult, ClauseAnalysis};
pub use gemini::{GeminiModel, ModelOption, ModelsResponse};
pub use history::SearchHistoryItem;
pub use requests::*;
