use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::llm::{ChatTurn, GenerateRequest, LlmProvider};
use crate::models::{AnalysisResult, GeminiModel};
use crate::utils::error::ApiError;

struct AssistantSession {
    system_instruction: String,
    turns: Vec<ChatTurn>,
}

struct SessionSlot {
    /// Creation order, used to evict the oldest session.
    seq: u64,
    session: Arc<Mutex<AssistantSession>>,
}

/// Follow-up chat about one analysed incident.
pub struct AssistantService {
    llm: Arc<dyn LlmProvider>,
    sessions: DashMap<Uuid, SessionSlot>,
    next_seq: AtomicU64,
    model: GeminiModel,
    system_prompt: String,
    max_sessions: usize,
}

impl AssistantService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        model: GeminiModel,
        system_prompt: String,
        max_sessions: usize,
    ) -> Self {
        Self {
            llm,
            sessions: DashMap::new(),
            next_seq: AtomicU64::new(0),
            model,
            system_prompt,
            max_sessions,
        }
    }

    pub fn system_instruction(&self, result: &AnalysisResult) -> String {
        let clauses = result
            .core_regulations
            .iter()
            .map(|c| format!("- {}", c.clause_text))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\nIncident: {}\n\nCore regulations:\n{}",
            self.system_prompt, result.accident_summary, clauses
        )
    }

    pub fn start(&self, result: &AnalysisResult) -> Uuid {
        let session = AssistantSession {
            system_instruction: self.system_instruction(result),
            turns: Vec::new(),
        };

        self.evict_oldest();
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionSlot {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                session: Arc::new(Mutex::new(session)),
            },
        );
        info!("Assistant session {} started ({} active)", id, self.sessions.len());
        id
    }

    pub async fn send(&self, id: &Uuid, message: &str, api_key: &str) -> Result<String, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::BadRequest("Message must not be empty".to_string()));
        }

        let session = self
            .sessions
            .get(id)
            .map(|s| Arc::clone(&s.session))
            .ok_or_else(|| ApiError::NotFound(format!("Assistant session {} not found", id)))?;

        let mut session = session.lock().await;
        session.turns.push(ChatTurn::user(message.trim()));

        let request = GenerateRequest {
            model: self.model,
            system_instruction: Some(session.system_instruction.clone()),
            turns: session.turns.clone(),
            response_schema: None,
        };

        match self.llm.generate(api_key, request).await {
            Ok(reply) => {
                session.turns.push(ChatTurn::model(reply.clone()));
                debug!("Session {} now has {} turns", id, session.turns.len());
                Ok(reply)
            }
            Err(e) => {
                session.turns.pop();
                Err(e.into())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict_oldest(&self) {
        while self.sessions.len() >= self.max_sessions.max(1) {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|e| e.value().seq)
                .map(|e| *e.key());
            match oldest {
                Some(id) => {
                    debug!("Evicting assistant session {}", id);
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }
    }
}
