//! Core library for Peruvian public-procurement quotation generation.
//!
//! This crate provides:
//! - Reference (TDR) PDF text extraction
//! - Field extraction from the reference text (service, payment terms, days)
//! - CCI derivation from bank and account number
//! - DOCX template rendering with nested-table placeholder substitution
//!   and signature embedding
//! - Output archive packaging

pub mod docx;
pub mod error;
pub mod extraction;
pub mod models;
pub mod package;
pub mod pdf;
pub mod pipeline;
pub mod resolver;

pub use docx::{DocumentRenderer, RenderReport, RenderedDocument, SignatureImage, Template};
pub use error::{PackageError, PdfError, QuoteError, Result, TemplateError};
pub use extraction::{Bank, ExtractedField, ExtractedFields, ReferenceText, extract_fields, generate_cci};
pub use models::{FormFields, QuotationRequest, QuoteConfig};
pub use package::{QuotationArchive, pack, unpack};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::{GeneratedQuotation, QuotationGenerator, QuotationInput};
pub use resolver::{TokenMap, resolve};
