//! DOCX container: the ordered list of ZIP parts.

use std::io::{Cursor, Read};

use zip::{CompressionMethod, ZipArchive};

use crate::error::{PackageError, TemplateError};
use crate::package::pack_with;

use super::xml::{self, XmlDocument};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const MEDIA_DIR: &str = "word/media/";

/// Parts of a DOCX file, in their original archive order.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Read every part of a DOCX file.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TemplateError> {
        let mut archive =
            ZipArchive::new(Cursor::new(data)).map_err(|e| TemplateError::Archive(e.to_string()))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| TemplateError::Archive(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| TemplateError::Archive(format!("{}: {}", name, e)))?;
            parts.push((name, bytes));
        }

        Ok(Self { parts })
    }

    /// Write the package back. Media stays stored, XML is deflated, the way
    /// Word lays out its own files.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        pack_with(&self.parts, |name| {
            if name.starts_with(MEDIA_DIR) {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            }
        })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Replace a part in place, or append it.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// Parse an XML part.
    pub fn read_xml(&self, name: &str) -> Result<XmlDocument, TemplateError> {
        let data = self
            .part(name)
            .ok_or_else(|| TemplateError::MissingPart(name.to_string()))?;
        let text = std::str::from_utf8(data).map_err(|e| TemplateError::Xml {
            part: name.to_string(),
            reason: e.to_string(),
        })?;
        // Some producers write a BOM
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        xml::parse(text).map_err(|reason| TemplateError::Xml {
            part: name.to_string(),
            reason,
        })
    }

    /// Serialize and store an XML part.
    pub fn write_xml(&mut self, name: &str, doc: &XmlDocument) -> Result<(), TemplateError> {
        let bytes = xml::write(doc).map_err(|reason| TemplateError::Xml {
            part: name.to_string(),
            reason,
        })?;
        self.set_part(name, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::pack;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<u8> {
        pack(&[
            (CONTENT_TYPES_PART.to_string(), b"<Types/>".to_vec()),
            (DOCUMENT_PART.to_string(), "\u{feff}<w:document/>".as_bytes().to_vec()),
        ])
        .unwrap()
    }

    #[test]
    fn test_read_parts_in_order() {
        let package = DocxPackage::from_bytes(&sample()).unwrap();
        let names: Vec<&str> = package.part_names().collect();
        assert_eq!(names, vec![CONTENT_TYPES_PART, DOCUMENT_PART]);
    }

    #[test]
    fn test_read_xml_strips_bom() {
        let package = DocxPackage::from_bytes(&sample()).unwrap();
        assert_eq!(package.read_xml(DOCUMENT_PART).unwrap().root.name, "w:document");
    }

    #[test]
    fn test_missing_part() {
        let package = DocxPackage::from_bytes(&sample()).unwrap();
        assert!(matches!(
            package.read_xml(DOCUMENT_RELS_PART),
            Err(TemplateError::MissingPart(_))
        ));
    }

    #[test]
    fn test_set_part_replaces_then_appends() {
        let mut package = DocxPackage::from_bytes(&sample()).unwrap();
        package.set_part(CONTENT_TYPES_PART, b"<Types></Types>".to_vec());
        package.set_part("word/media/firma1.png", vec![1, 2, 3]);

        let reread = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(reread.part(CONTENT_TYPES_PART), Some(&b"<Types></Types>"[..]));
        assert_eq!(reread.part("word/media/firma1.png"), Some(&[1u8, 2, 3][..]));
        assert_eq!(reread.part_names().count(), 3);
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            DocxPackage::from_bytes(b"plain text"),
            Err(TemplateError::Archive(_))
        ));
    }
}
