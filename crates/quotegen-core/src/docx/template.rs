//! Quotation template loading.

use std::path::Path;

use tracing::debug;

use crate::error::TemplateError;

use super::image::max_drawing_id;
use super::model::Document;
use super::package::{DOCUMENT_PART, DocxPackage};
use super::render::IMAGE_PLACEHOLDER;

/// A parsed template, ready to be rendered any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    package: DocxPackage,
    document: Document,
    max_drawing_id: u32,
}

impl Template {
    /// Parse a template from DOCX bytes.
    pub fn load(data: &[u8]) -> Result<Self, TemplateError> {
        let package = DocxPackage::from_bytes(data)?;
        let xml = package.read_xml(DOCUMENT_PART)?;
        let max_drawing_id = max_drawing_id(&xml.root);
        let document = Document::from_xml(xml)?;

        debug!(
            "Loaded template: {} parts, {} body blocks",
            package.part_names().count(),
            document.body.len()
        );

        Ok(Self {
            package,
            document,
            max_drawing_id,
        })
    }

    /// Read and parse a template file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::load(&data)?)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn package(&self) -> &DocxPackage {
        &self.package
    }

    /// Highest drawing id already used by the template.
    pub fn max_drawing_id(&self) -> u32 {
        self.max_drawing_id
    }

    /// Whether any paragraph carries the signature placeholder.
    pub fn has_image_placeholder(&self) -> bool {
        let mut found = false;
        self.document.visit_paragraphs(&mut |p| {
            found |= p.text().contains(IMAGE_PLACEHOLDER);
        });
        found
    }
}
