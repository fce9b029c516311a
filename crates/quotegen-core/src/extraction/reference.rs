//! Flattened reference text.

use crate::pdf::{PdfExtractor, PdfProcessor, Result};

use super::patterns::collapse_whitespace;

/// Whitespace-normalized text of a whole reference document.
///
/// Built once per extraction pass; every whitespace run is a single space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceText(String);

impl ReferenceText {
    /// Normalize already-flattened text.
    pub fn new(raw: &str) -> Self {
        Self(collapse_whitespace(raw))
    }

    /// Concatenate page texts in order.
    ///
    /// Pages are separated by a line break so the last word of one page never
    /// fuses with the first word of the next.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for page in pages {
            joined.push_str(page.as_ref());
            joined.push('\n');
        }
        Self::new(&joined)
    }

    /// Load a PDF and flatten all of its pages.
    pub fn from_pdf(data: &[u8]) -> Result<Self> {
        let mut extractor = PdfExtractor::new();
        extractor.load(data)?;
        Ok(Self::from_pages(extractor.page_texts()?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for ReferenceText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
