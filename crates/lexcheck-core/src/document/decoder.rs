use crate::error::ExtractError;

use super::glyph::GlyphItem;

/// One decoded page: its height in page units and every positioned text run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPage {
    pub height: f64,
    pub items: Vec<GlyphItem>,
}

/// A document opened by a [`PdfDecoder`]. Pages are numbered from 1.
pub trait DecodedDocument {
    fn page_count(&self) -> usize;

    fn page(&self, number: usize) -> Result<DecodedPage, ExtractError>;
}

/// Capability for turning raw PDF bytes into positioned glyph runs.
pub trait PdfDecoder: Send + Sync {
    type Document: DecodedDocument;

    fn open_document(&self, bytes: &[u8]) -> Result<Self::Document, ExtractError>;
}
