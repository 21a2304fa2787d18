use thiserror::Error;

/// Failures while turning PDF bytes into text.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read document: {source}")]
    Read {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to decode PDF: {0}")]
    Decode(String),

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Invalid chunker configuration: chunk_size={chunk_size}, overlap={overlap} (overlap must be smaller than a non-zero chunk size)")]
    InvalidConfig { chunk_size: usize, overlap: usize },
}

/// Failures while assembling the chunk corpus for a batch of documents.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("No text could be extracted from '{name}'")]
    EmptyDocument { name: String },

    #[error("No text could be extracted from any document")]
    EmptyCorpus,

    #[error("Failed to extract '{name}': {source}")]
    Extract {
        name: String,
        #[source]
        source: ExtractError,
    },
}
