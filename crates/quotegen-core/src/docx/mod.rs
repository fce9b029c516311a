//! DOCX template handling.
//!
//! A template is read as a ZIP of parts; `word/document.xml` is parsed into a
//! typed paragraph/table tree, rendered, and written back alongside every
//! other part unchanged.

pub mod format;
pub mod image;
pub mod model;
pub mod package;
mod render;
mod template;
pub mod xml;

pub use format::RunFormat;
pub use self::image::SignatureImage;
pub use model::{Block, Cell, Document, Paragraph, Run, Table};
pub use package::DocxPackage;
pub use render::{DocumentRenderer, IMAGE_PLACEHOLDER, RenderReport, RenderedDocument, render};
pub use template::Template;
