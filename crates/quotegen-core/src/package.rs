//! Output archive packaging.
//!
//! The quotation archive is a deflate-compressed ZIP whose member names are
//! fixed literals; entries are written in insertion order.

use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PackageError;

/// Member name of the rendered quotation.
pub const DOCUMENT_ENTRY: &str = "Formato de Cotización.docx";
/// Member name of the original reference (TDR) file.
pub const REFERENCE_ENTRY: &str = "6. Copia de Terminos de Referencia.pdf";
/// Member name of the signature image, when included.
pub const SIGNATURE_ENTRY: &str = "Firma.png";

/// Result type for packaging operations.
pub type Result<T> = std::result::Result<T, PackageError>;

/// Write entries into a deflate-compressed archive.
pub fn pack(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    pack_with(entries, |_| CompressionMethod::Deflated)
}

/// Write entries choosing the compression method per entry name.
pub fn pack_with(
    entries: &[(String, Vec<u8>)],
    method_for: impl Fn(&str) -> CompressionMethod,
) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, data) in entries {
        let options = SimpleFileOptions::default().compression_method(method_for(name));
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!("Packed {} entries into {} bytes", entries.len(), bytes.len());
    Ok(bytes)
}

/// Read every file entry back, in archive order.
pub fn unpack(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        // Declared sizes are untrusted; let the buffer grow with what is actually read
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        entries.push((name, bytes));
    }

    Ok(entries)
}

/// The artifacts of one quotation, in archive order.
#[derive(Debug, Clone)]
pub struct QuotationArchive {
    pub document: Vec<u8>,
    pub reference: Vec<u8>,
    /// PNG-encoded signature; only packed when present.
    pub signature: Option<Vec<u8>>,
}

impl QuotationArchive {
    /// Entries under their fixed names.
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries = vec![
            (DOCUMENT_ENTRY.to_string(), self.document.clone()),
            (REFERENCE_ENTRY.to_string(), self.reference.clone()),
        ];
        if let Some(signature) = &self.signature {
            entries.push((SIGNATURE_ENTRY.to_string(), signature.clone()));
        }
        entries
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        pack(&self.entries())
    }
}
