pub mod chunker;
pub mod corpus;
pub mod decoder;
pub mod extractor;
pub mod glyph;
pub mod layout;
pub mod lopdf_decoder;

pub use chunker::TextChunker;
pub use corpus::{assemble_corpus, join_for_prompt, SourceDocument, CHUNK_SEPARATOR};
pub use decoder::{DecodedDocument, DecodedPage, PdfDecoder};
pub use extractor::TextExtractor;
pub use glyph::GlyphItem;
pub use layout::LayoutConfig;
pub use lopdf_decoder::LopdfDecoder;
