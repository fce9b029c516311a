//! Configuration structures for quotation generation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::QuoteError;

/// Main configuration for quotegen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Template location.
    pub template: TemplateConfig,

    /// Document rendering options.
    pub render: RenderConfig,

    /// Output archive options.
    pub package: PackageConfig,
}

/// Template configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Path to the quotation template (.docx).
    pub path: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/FormatoCotizacion.docx"),
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Font family applied to every rewritten run.
    pub font_family: String,

    /// Font size in points applied to every rewritten run.
    pub font_size_pt: f32,

    /// Height of the embedded signature, in centimetres.
    pub signature_height_cm: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size_pt: 11.0,
            signature_height_cm: 1.91,
        }
    }
}

/// Output archive configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Also store the signature (as PNG) in the archive.
    pub include_signature: bool,
}

impl QuoteConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| QuoteError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| QuoteError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
