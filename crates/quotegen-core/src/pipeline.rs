//! End-to-end quotation generation.
//!
//! reference PDF -> extracted fields -> token map -> rendered DOCX -> archive.
//! The generator holds no per-call state; one instance can serve any number
//! of requests.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::docx::{DocumentRenderer, RenderReport, SignatureImage, Template};
use crate::extraction::{ExtractedFields, ReferenceText, extract_fields};
use crate::models::config::QuoteConfig;
use crate::models::quotation::FormFields;
use crate::package::QuotationArchive;
use crate::resolver::{TokenMap, resolve};
use crate::Result;

/// Everything one generation needs.
#[derive(Debug, Clone, Copy)]
pub struct QuotationInput<'a> {
    /// Reference (TDR) PDF bytes, also copied verbatim into the archive.
    pub reference: &'a [u8],
    /// Signature image bytes, any format the image crate decodes.
    pub signature: &'a [u8],
    pub form: &'a FormFields,
}

/// The result of one generation.
#[derive(Debug, Clone)]
pub struct GeneratedQuotation {
    /// ZIP archive bytes.
    pub archive: Vec<u8>,
    pub fields: ExtractedFields,
    pub tokens: TokenMap,
    pub report: RenderReport,
}

/// Summary suitable for logs and `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary<'a> {
    pub archive_size: usize,
    pub fields: &'a ExtractedFields,
    pub missing_fields: Vec<&'static str>,
    pub report: &'a RenderReport,
}

impl GeneratedQuotation {
    pub fn summary(&self) -> GenerationSummary<'_> {
        GenerationSummary {
            archive_size: self.archive.len(),
            fields: &self.fields,
            missing_fields: self.fields.missing(),
            report: &self.report,
        }
    }
}

/// Generates quotation archives from one template.
#[derive(Debug, Clone)]
pub struct QuotationGenerator {
    template: Template,
    renderer: DocumentRenderer,
    include_signature: bool,
}

impl QuotationGenerator {
    /// Build a generator around an already loaded template.
    pub fn new(template: Template, config: &QuoteConfig) -> Self {
        Self {
            template,
            renderer: DocumentRenderer::new(config.render.clone()),
            include_signature: config.package.include_signature,
        }
    }

    /// Load the template named by the configuration.
    pub fn from_config(config: &QuoteConfig) -> Result<Self> {
        info!("Loading template from {:?}", config.template.path);
        let template = Template::from_file(&config.template.path)?;
        if !template.has_image_placeholder() {
            warn!("Template has no signature placeholder");
        }
        Ok(Self::new(template, config))
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Run the whole pipeline. Any failure aborts; no partial archive is returned.
    pub fn generate(&self, input: &QuotationInput<'_>) -> Result<GeneratedQuotation> {
        let text = ReferenceText::from_pdf(input.reference)?;
        debug!("Reference text: {} chars", text.len());
        self.generate_from_text(&text, input)
    }

    /// Same as [`generate`](Self::generate) with the reference text already extracted.
    pub fn generate_from_text(
        &self,
        text: &ReferenceText,
        input: &QuotationInput<'_>,
    ) -> Result<GeneratedQuotation> {
        let fields = extract_fields(text);
        let missing = fields.missing();
        if !missing.is_empty() {
            warn!("Fields not found in reference: {}", missing.join(", "));
        }

        let tokens = resolve(input.form, &fields);
        let signature = SignatureImage::decode(input.signature)?;
        let rendered = self
            .renderer
            .render_with_image(&self.template, &tokens, &signature)?;

        let archive = QuotationArchive {
            document: rendered.bytes,
            reference: input.reference.to_vec(),
            signature: if self.include_signature {
                Some(signature.to_png()?)
            } else {
                None
            },
        };
        let archive = archive.pack()?;

        info!(
            "Generated quotation archive ({} bytes, {} paragraphs rewritten)",
            archive.len(),
            rendered.report.paragraphs_rewritten
        );

        Ok(GeneratedQuotation {
            archive,
            fields,
            tokens,
            report: rendered.report,
        })
    }
}
