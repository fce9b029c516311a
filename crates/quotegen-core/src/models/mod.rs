//! Data models: configuration and quotation input.

pub mod config;
pub mod quotation;

pub use config::{PackageConfig, QuoteConfig, RenderConfig, TemplateConfig};
pub use quotation::{FormFields, QuotationRequest};
