//! Reading-order text extraction from PDF files and paragraph-aware chunking
//! of the extracted text for token-limited model prompts.

pub mod document;
pub mod error;

pub use document::{
    assemble_corpus, join_for_prompt, DecodedDocument, DecodedPage, GlyphItem, LayoutConfig,
    LopdfDecoder, PdfDecoder, SourceDocument, TextChunker, TextExtractor, CHUNK_SEPARATOR,
};
pub use error::{ChunkError, CorpusError, ExtractError};
