use futures::future::try_join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::corpus::SourceDocument;
use super::decoder::{DecodedDocument, PdfDecoder};
use super::layout::{compose_page, normalize_newlines, LayoutConfig};
use crate::error::{CorpusError, ExtractError};

/// Turns PDF documents into reading-order body text.
///
/// Decoding is CPU-bound, so async entry points run it on the blocking pool.
pub struct TextExtractor<D> {
    decoder: Arc<D>,
    layout: LayoutConfig,
}

impl<D> Clone for TextExtractor<D> {
    fn clone(&self) -> Self {
        Self {
            decoder: Arc::clone(&self.decoder),
            layout: self.layout,
        }
    }
}

impl<D: PdfDecoder + 'static> TextExtractor<D> {
    pub fn new(decoder: D) -> Self {
        Self::with_layout(decoder, LayoutConfig::default())
    }

    pub fn with_layout(decoder: D, layout: LayoutConfig) -> Self {
        Self {
            decoder: Arc::new(decoder),
            layout,
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Extract text synchronously from an in-memory PDF.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        extract_text(self.decoder.as_ref(), &self.layout, bytes)
    }

    /// Read a PDF from disk and extract its text.
    pub async fn extract_file(&self, path: impl AsRef<Path>) -> Result<String, ExtractError> {
        let path = path.as_ref();
        debug!("Reading {:?}", path);
        let bytes = tokio::fs::read(path).await?;
        self.extract_owned(bytes).await
    }

    /// Extract text on the blocking pool.
    pub async fn extract_owned(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        let decoder = Arc::clone(&self.decoder);
        let layout = self.layout;
        tokio::task::spawn_blocking(move || extract_text(decoder.as_ref(), &layout, &bytes))
            .await
            .map_err(|e| ExtractError::TaskFailed(e.to_string()))?
    }

    /// Extract every file concurrently.
    ///
    /// Output order follows input order. The first failure fails the whole
    /// batch and no partial result is returned.
    pub async fn extract_batch<I>(&self, files: I) -> Result<Vec<SourceDocument>, CorpusError>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let tasks = files.into_iter().map(|(name, bytes)| async move {
            match self.extract_owned(bytes).await {
                Ok(text) => {
                    debug!("Extracted {} chars from '{}'", text.len(), name);
                    Ok(SourceDocument { name, text })
                }
                Err(source) => Err(CorpusError::Extract { name, source }),
            }
        });

        let documents = try_join_all(tasks).await?;
        info!("Extracted text from {} documents", documents.len());
        Ok(documents)
    }
}

fn extract_text<D: PdfDecoder>(
    decoder: &D,
    layout: &LayoutConfig,
    bytes: &[u8],
) -> Result<String, ExtractError> {
    let document = decoder.open_document(bytes)?;
    let mut text = String::new();

    for number in 1..=document.page_count() {
        let page = document.page(number)?;
        text.push_str(&compose_page(page.items, page.height, layout));
        text.push_str("\n\n");
    }

    Ok(normalize_newlines(&text))
}
