pub mod analysis;
pub mod assistant;
pub mod form_guide;
pub mod gemini;
pub mod history;
pub mod llm;
pub mod workspace;

pub use analysis::AnalysisService;
pub use assistant::AssistantService;
pub use form_guide::FormGuideService;
pub use gemini::GeminiClient;
pub use history::HistoryStore;
pub use llm::{LlmError, LlmProvider};
pub use workspace::{IngestService, UploadedFile, Workspace, WorkspaceStore};
