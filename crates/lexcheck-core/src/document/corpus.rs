use serde::{Deserialize, Serialize};

use super::chunker::TextChunker;
use crate::error::CorpusError;

/// Separator placed between chunks when they are embedded in one prompt.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Extracted text of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

pub fn document_header(name: &str) -> String {
    format!("--- START OF {} ---\n", name)
}

/// Chunk every document in order and flatten the result, marking the first
/// chunk of each document with its source name.
///
/// A document that yields no chunks fails the whole batch.
pub fn assemble_corpus(
    documents: &[SourceDocument],
    chunker: &TextChunker,
) -> Result<Vec<String>, CorpusError> {
    let mut corpus = Vec::new();

    for document in documents {
        let mut chunks = chunker.chunk(&document.text);
        let Some(first) = chunks.first_mut() else {
            return Err(CorpusError::EmptyDocument {
                name: document.name.clone(),
            });
        };
        first.insert_str(0, &document_header(&document.name));
        corpus.extend(chunks);
    }

    if corpus.is_empty() {
        return Err(CorpusError::EmptyCorpus);
    }

    Ok(corpus)
}

pub fn join_for_prompt(chunks: &[String]) -> String {
    chunks.join(CHUNK_SEPARATOR)
}
