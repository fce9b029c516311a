//! Placeholder substitution over the whole document tree.
//!
//! Every paragraph, at any table depth, is rewritten to a single run: the
//! text of all its runs joined, tokens replaced literally, formatted like the
//! paragraph's first run but in the house font. A paragraph containing the
//! image placeholder is instead emptied and given an inline picture.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{QuoteError, TemplateError};
use crate::models::config::RenderConfig;
use crate::resolver::TokenMap;

use super::format::RunFormat;
use super::image::{EmbeddedMedia, SignatureImage, add_media, inline_drawing};
use super::model::{Block, Inline, Paragraph, Run, Table};
use super::package::{DOCUMENT_PART, DocxPackage};
use super::template::Template;

/// Marks the paragraph that receives the signature image.
pub const IMAGE_PLACEHOLDER: &str = "{{firma}}";

lazy_static! {
    static ref LEFTOVER_TOKEN: Regex = Regex::new(r"\{\{([^{}]+)\}\}").unwrap();
}

/// What a render pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub paragraphs_rewritten: usize,
    pub tables_visited: usize,
    /// Deepest table nesting seen; 1 for a top-level table.
    pub max_table_depth: usize,
    pub signatures_embedded: usize,
    /// Placeholders still present after substitution, left as literal text.
    pub unresolved_tokens: Vec<String>,
    pub warnings: Vec<String>,
}

/// A rendered DOCX file.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Renders templates with a fixed house style.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    config: RenderConfig,
}

impl DocumentRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render with raw signature bytes.
    pub fn render(
        &self,
        template: &Template,
        tokens: &TokenMap,
        signature: &[u8],
    ) -> crate::Result<RenderedDocument> {
        let signature = SignatureImage::decode(signature)?;
        self.render_with_image(template, tokens, &signature)
    }

    /// Render with an already decoded signature.
    pub fn render_with_image(
        &self,
        template: &Template,
        tokens: &TokenMap,
        signature: &SignatureImage,
    ) -> crate::Result<RenderedDocument> {
        let mut document = template.document().clone();
        let mut package = template.package().clone();

        let mut pass = RenderPass {
            tokens,
            config: &self.config,
            signature,
            package: &mut package,
            media: None,
            next_drawing_id: template.max_drawing_id() + 1,
            report: RenderReport::default(),
        };
        pass.render_blocks(&mut document.body, 0)?;
        let mut report = pass.report;

        if report.signatures_embedded == 0 {
            warn!("Template has no {} paragraph; signature not embedded", IMAGE_PLACEHOLDER);
            report
                .warnings
                .push(format!("no {} placeholder found; signature not embedded", IMAGE_PLACEHOLDER));
        }
        if !report.unresolved_tokens.is_empty() {
            debug!("Unresolved tokens left as text: {:?}", report.unresolved_tokens);
        }

        package.write_xml(DOCUMENT_PART, &document.to_xml())?;
        let bytes = package.to_bytes().map_err(QuoteError::Package)?;

        debug!(
            "Rendered {} paragraphs across {} tables (depth {})",
            report.paragraphs_rewritten, report.tables_visited, report.max_table_depth
        );
        Ok(RenderedDocument { bytes, report })
    }
}

/// Render with the default house style.
pub fn render(template: &Template, tokens: &TokenMap, signature: &[u8]) -> crate::Result<RenderedDocument> {
    DocumentRenderer::default().render(template, tokens, signature)
}

struct RenderPass<'a> {
    tokens: &'a TokenMap,
    config: &'a RenderConfig,
    signature: &'a SignatureImage,
    package: &'a mut DocxPackage,
    /// Added on first use, shared by every placeholder paragraph.
    media: Option<EmbeddedMedia>,
    next_drawing_id: u32,
    report: RenderReport,
}

impl RenderPass<'_> {
    fn render_blocks(&mut self, blocks: &mut [Block], depth: usize) -> Result<(), TemplateError> {
        for block in blocks {
            match block {
                Block::Paragraph(paragraph) => self.render_paragraph(paragraph)?,
                Block::Table(table) => self.render_table(table, depth + 1)?,
                Block::Other(_) => {}
            }
        }
        Ok(())
    }

    // Cells are finished, nested tables included, before the next cell starts
    fn render_table(&mut self, table: &mut Table, depth: usize) -> Result<(), TemplateError> {
        self.report.tables_visited += 1;
        self.report.max_table_depth = self.report.max_table_depth.max(depth);

        for row in table.rows_mut() {
            for cell in row.cells_mut() {
                self.render_blocks(&mut cell.blocks, depth)?;
            }
        }
        Ok(())
    }

    fn render_paragraph(&mut self, paragraph: &mut Paragraph) -> Result<(), TemplateError> {
        let text = paragraph.text();

        if text.contains(IMAGE_PLACEHOLDER) {
            let run = self.signature_run()?;
            paragraph.clear_content();
            paragraph.content.push(Inline::Run(run));
            self.report.signatures_embedded += 1;
            return Ok(());
        }

        let format = paragraph
            .runs()
            .next()
            .map(|run| RunFormat::from_properties(run.properties.as_ref()))
            .unwrap_or_else(RunFormat::plain)
            .with_house_font(&self.config.font_family, self.config.font_size_pt);

        let substituted = self.tokens.apply(&text);
        if let Some(bad) = substituted.chars().find(|&c| !is_xml_char(c)) {
            return Err(self.invalid_character(&text, bad));
        }
        for caps in LEFTOVER_TOKEN.captures_iter(&substituted) {
            let name = caps[1].to_string();
            if !self.report.unresolved_tokens.contains(&name) {
                self.report.unresolved_tokens.push(name);
            }
        }

        paragraph.replace_runs(Run::with_text(format.to_properties(), &substituted));
        self.report.paragraphs_rewritten += 1;
        Ok(())
    }

    /// Name the token that brought `bad` in, or the paragraph if none did.
    fn invalid_character(&self, text: &str, bad: char) -> TemplateError {
        let context = self
            .tokens
            .iter()
            .find(|(name, value)| value.contains(bad) && text.contains(&TokenMap::placeholder(name)))
            .map(|(name, _)| format!("value for {}", TokenMap::placeholder(name)))
            .unwrap_or_else(|| format!("paragraph {:?}", text));
        TemplateError::InvalidCharacter {
            context,
            code: bad as u32,
        }
    }

    fn signature_run(&mut self) -> Result<Run, TemplateError> {
        let media = match &self.media {
            Some(media) => media.clone(),
            None => {
                let media = add_media(self.package, self.signature)?;
                self.media = Some(media.clone());
                media
            }
        };

        let extent = self.signature.extent_for_height(self.config.signature_height_cm);
        let drawing = inline_drawing(&media, self.next_drawing_id, extent)?;
        self.next_drawing_id += 1;
        Ok(Run::with_drawing(drawing))
    }
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures;
    use crate::docx::model::{Document, Inline};
    use crate::docx::package::{CONTENT_TYPES_PART, DOCUMENT_RELS_PART};
    use pretty_assertions::assert_eq;

    fn tokens() -> TokenMap {
        [
            ("nombres", "ANA PEREZ"),
            ("dni", "45678912"),
            ("oferta", "2500.00"),
            ("servicio", "Servicio de limpieza"),
        ]
        .into_iter()
        .collect()
    }

    fn render_body(body: &str) -> (Document, DocxPackage, RenderReport) {
        let template = Template::load(&fixtures::docx(body)).unwrap();
        let rendered = render(&template, &tokens(), &fixtures::png(40, 20)).unwrap();
        let package = DocxPackage::from_bytes(&rendered.bytes).unwrap();
        let document = Document::from_xml(package.read_xml(DOCUMENT_PART).unwrap()).unwrap();
        (document, package, rendered.report)
    }

    fn paragraphs(document: &Document) -> Vec<Paragraph> {
        let mut found = Vec::new();
        document.visit_paragraphs(&mut |p| found.push(p.clone()));
        found
    }

    const SIGNATURE: &str = "<w:p><w:r><w:t>{{firma}}</w:t></w:r></w:p>";

    #[test]
    fn test_single_run_substitution() {
        let (document, _, report) = render_body(&format!(
            "<w:p><w:r><w:t>Yo, {{{{nombres}}}}, con DNI {{{{dni}}}}</w:t></w:r></w:p>{}",
            SIGNATURE
        ));
        assert_eq!(document.paragraph_texts()[0], "Yo, ANA PEREZ, con DNI 45678912");
        assert_eq!(report.paragraphs_rewritten, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_token_split_across_runs() {
        let (document, _, _) = render_body(&format!(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Monto: {{{{ofe</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>rta}}}} soles</w:t></w:r></w:p>{}",
            SIGNATURE
        ));
        let first = &paragraphs(&document)[0];
        assert_eq!(first.run_count(), 1);
        assert_eq!(first.text(), "Monto: 2500.00 soles");

        // First run's bold wins; the second run's italic is gone
        let format = RunFormat::from_properties(first.runs().next().unwrap().properties.as_ref());
        assert_eq!(format.bold, Some(true));
        assert_eq!(format.italic, None);
        assert_eq!(format.font_family.as_deref(), Some("Arial"));
        assert_eq!(format.size_half_points, Some(22));
    }

    #[test]
    fn test_formatting_copied_from_first_run() {
        let (document, _, _) = render_body(&format!(
            "<w:p><w:r><w:rPr><w:rFonts w:ascii=\"Calibri\"/><w:i/><w:color w:val=\"1F3864\"/><w:sz w:val=\"32\"/><w:u w:val=\"single\"/></w:rPr><w:t>{{{{servicio}}}}</w:t></w:r></w:p>{}",
            SIGNATURE
        ));
        let first = &paragraphs(&document)[0];
        let format = RunFormat::from_properties(first.runs().next().unwrap().properties.as_ref());
        assert_eq!(
            format,
            RunFormat {
                bold: None,
                italic: Some(true),
                underline: Some("single".to_string()),
                color: Some("1F3864".to_string()),
                font_family: Some("Arial".to_string()),
                size_half_points: Some(22),
            }
        );
    }

    #[test]
    fn test_empty_paragraph_gets_plain_run() {
        let (document, _, _) = render_body(&format!("<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr></w:p>{}", SIGNATURE));
        let first = &paragraphs(&document)[0];
        assert!(first.properties.is_some());
        assert_eq!(first.run_count(), 1);
        let format = RunFormat::from_properties(first.runs().next().unwrap().properties.as_ref());
        assert_eq!(format.bold, Some(false));
        assert_eq!(format.underline.as_deref(), Some("none"));
    }

    #[test]
    fn test_nested_tables_three_levels() {
        let body = format!(
            "<w:tbl><w:tr>\
               <w:tc><w:p><w:r><w:t>{{{{dni}}}}</w:t></w:r></w:p>\
                 <w:tbl><w:tr><w:tc><w:p><w:r><w:t>n2 {{{{nom</w:t></w:r><w:r><w:t>bres}}}}</w:t></w:r></w:p>\
                   <w:tbl><w:tr><w:tc><w:p><w:r><w:t>n3 {{{{oferta}}}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
                 <w:p/></w:tc></w:tr></w:tbl>\
               <w:p/></w:tc>\
               <w:tc>{}</w:tc>\
             </w:tr></w:tbl>",
            SIGNATURE
        );
        let (document, _, report) = render_body(&body);

        let texts = document.paragraph_texts();
        assert_eq!(texts[0], "45678912");
        assert_eq!(texts[1], "n2 ANA PEREZ");
        assert_eq!(texts[2], "n3 2500.00");
        assert_eq!(report.tables_visited, 3);
        assert_eq!(report.max_table_depth, 3);
        assert_eq!(report.signatures_embedded, 1);
        for p in paragraphs(&document) {
            assert_eq!(p.run_count(), 1);
        }
    }

    #[test]
    fn test_signature_is_embedded() {
        let (document, package, report) = render_body(
            "<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:t>Firma: {{fir</w:t></w:r><w:r><w:t>ma}}</w:t></w:r></w:p>",
        );
        assert_eq!(report.signatures_embedded, 1);

        let p = &paragraphs(&document)[0];
        assert!(p.properties.is_some());
        assert_eq!(p.content.len(), 1);
        let Inline::Run(run) = &p.content[0] else {
            panic!("expected a run");
        };
        assert!(run.has_drawing());
        assert_eq!(p.text(), "");

        assert!(package.has_part("word/media/firma1.png"));
        let rels = package.read_xml(DOCUMENT_RELS_PART).unwrap();
        assert!(rels.root.elements().any(|r| r.attr("Target") == Some("media/firma1.png")));
        let types = package.read_xml(CONTENT_TYPES_PART).unwrap();
        assert!(types.root.elements().any(|t| t.attr("Extension") == Some("png")));

        let mut extent = None;
        run.content[0].as_element().unwrap().walk(&mut |el| {
            if el.name == "wp:extent" {
                extent = Some((el.attr("cx").unwrap().to_string(), el.attr("cy").unwrap().to_string()));
            }
        });
        assert_eq!(extent, Some(("1375200".to_string(), "687600".to_string())));
    }

    #[test]
    fn test_missing_placeholder_is_a_warning() {
        let (_, package, report) = render_body("<w:p><w:r><w:t>{{dni}}</w:t></w:r></w:p>");
        assert_eq!(report.signatures_embedded, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(!package.part_names().any(|n| n.starts_with("word/media/")));
    }

    #[test]
    fn test_two_placeholders_share_one_media_part() {
        let (_, package, report) = render_body(&format!("{}{}", SIGNATURE, SIGNATURE));
        assert_eq!(report.signatures_embedded, 2);
        let media: Vec<&str> = package
            .part_names()
            .filter(|n| n.starts_with("word/media/"))
            .collect();
        assert_eq!(media, vec!["word/media/firma1.png"]);
    }

    #[test]
    fn test_unmatched_tokens_stay_literal() {
        let (document, _, report) = render_body(&format!(
            "<w:p><w:r><w:t>{{{{dni}}}} {{{{desconocido}}}} {{{{dni}}</w:t></w:r></w:p>{}",
            SIGNATURE
        ));
        assert_eq!(document.paragraph_texts()[0], "45678912 {{desconocido}} {{dni}");
        assert_eq!(report.unresolved_tokens, vec!["desconocido".to_string()]);
    }

    #[test]
    fn test_control_character_in_value_is_an_error() {
        let template = Template::load(&fixtures::docx(&format!(
            "<w:p><w:r><w:t>Yo, {{{{nombres}}}}</w:t></w:r></w:p>{}",
            SIGNATURE
        )))
        .unwrap();
        let tokens: TokenMap = [("nombres", "ANA\u{1}PEREZ")].into_iter().collect();

        let err = render(&template, &tokens, &fixtures::png(4, 4)).unwrap_err();
        let QuoteError::Template(TemplateError::InvalidCharacter { context, code }) = err else {
            panic!("expected an invalid character error, got {:?}", err);
        };
        assert_eq!(context, "value for {{nombres}}");
        assert_eq!(code, 1);
    }

    #[test]
    fn test_xml_char_ranges() {
        for c in ['a', '\t', '\n', '\r', 'ñ', '\u{E000}', '\u{1F58B}'] {
            assert!(is_xml_char(c), "{:?}", c);
        }
        for c in ['\u{0}', '\u{1}', '\u{B}', '\u{1F}', '\u{FFFE}', '\u{FFFF}'] {
            assert!(!is_xml_char(c), "{:?}", c);
        }
    }

    #[test]
    fn test_undecodable_signature_is_an_error() {
        let template = Template::load(&fixtures::docx(SIGNATURE)).unwrap();
        let err = render(&template, &tokens(), b"not an image").unwrap_err();
        assert!(matches!(err, QuoteError::Image(_)));
    }

    #[test]
    fn test_custom_house_style() {
        let template = Template::load(&fixtures::docx(&format!(
            "<w:p><w:r><w:t>{{{{dni}}}}</w:t></w:r></w:p>{}",
            SIGNATURE
        )))
        .unwrap();
        let renderer = DocumentRenderer::new(RenderConfig {
            font_family: "Times New Roman".to_string(),
            font_size_pt: 12.0,
            signature_height_cm: 2.0,
        });
        let rendered = renderer
            .render(&template, &tokens(), &fixtures::png(10, 10))
            .unwrap();

        let package = DocxPackage::from_bytes(&rendered.bytes).unwrap();
        let document = Document::from_xml(package.read_xml(DOCUMENT_PART).unwrap()).unwrap();
        let first = &paragraphs(&document)[0];
        let format = RunFormat::from_properties(first.runs().next().unwrap().properties.as_ref());
        assert_eq!(format.font_family.as_deref(), Some("Times New Roman"));
        assert_eq!(format.size_half_points, Some(24));
    }

    #[test]
    fn test_template_is_reusable() {
        let template = Template::load(&fixtures::docx(SIGNATURE)).unwrap();
        let first = render(&template, &tokens(), &fixtures::png(4, 4)).unwrap();
        let second = render(&template, &tokens(), &fixtures::png(4, 4)).unwrap();
        assert_eq!(first.report, second.report);
        assert!(template.has_image_placeholder());
    }
}
