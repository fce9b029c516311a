//! Rule-based field extraction from reference (TDR) documents.

pub mod cci;
pub mod patterns;
mod reference;

pub use cci::{Bank, clean_account, generate_cci};
pub use patterns::{
    Capture, EXECUTION_DAYS, ExtractionPattern, PAYMENT_TERMS, PatternSpec, PostProcess,
    SERVICE_DESCRIPTION, collapse_whitespace,
};
pub use reference::ReferenceText;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A successful pattern match.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Apply a pattern once, returning the post-processed capture if any.
pub fn find(text: &ReferenceText, pattern: &ExtractionPattern) -> Option<ExtractionMatch<String>> {
    let caps = pattern.regex().captures(text.as_str())?;
    let full_match = caps.get(0)?;
    let captured = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    Some(
        ExtractionMatch::new(pattern.post().apply(captured), full_match.as_str())
            .with_position(full_match.start(), full_match.end()),
    )
}

/// Apply a pattern once; on no match return the pattern's fallback literal.
pub fn extract(text: &ReferenceText, pattern: &ExtractionPattern) -> String {
    extract_field(text, pattern).value
}

fn extract_field(text: &ReferenceText, pattern: &ExtractionPattern) -> ExtractedField {
    match find(text, pattern) {
        Some(m) => {
            debug!("Extracted {} at {:?}: {:?}", pattern.field(), m.position, m.value);
            ExtractedField::found(m.value)
        }
        None => {
            warn!(
                "No match for {}, using fallback {:?}",
                pattern.field(),
                pattern.fallback()
            );
            ExtractedField::fallback(pattern.fallback())
        }
    }
}

/// A single extracted value and whether it came from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: String,
    pub found: bool,
}

impl ExtractedField {
    pub fn found(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            found: true,
        }
    }

    pub fn fallback(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            found: false,
        }
    }
}

/// Fields recovered from the reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Service description ("OBJETO DE LA CONTRATACION").
    pub servicio: ExtractedField,
    /// Payment timing clause, uppercased.
    pub armada: ExtractedField,
    /// Execution term in calendar days. Non-numeric when not found.
    pub dias: ExtractedField,
}

impl ExtractedFields {
    /// Names of the fields that fell back to their sentinel.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.servicio.found {
            missing.push(SERVICE_DESCRIPTION.field());
        }
        if !self.armada.found {
            missing.push(PAYMENT_TERMS.field());
        }
        if !self.dias.found {
            missing.push(EXECUTION_DAYS.field());
        }
        missing
    }

    /// Execution days as a number, `None` when the sentinel was used.
    pub fn days(&self) -> Option<u32> {
        if !self.dias.found {
            return None;
        }
        self.dias.value.parse().ok()
    }
}

/// Run every reference pattern against the text.
pub fn extract_fields(text: &ReferenceText) -> ExtractedFields {
    ExtractedFields {
        servicio: extract_field(text, &SERVICE_DESCRIPTION),
        armada: extract_field(text, &PAYMENT_TERMS),
        dias: extract_field(text, &EXECUTION_DAYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference(text: &str) -> ReferenceText {
        ReferenceText::new(text)
    }

    #[test]
    fn test_extract_service_description() {
        let text = reference(
            "1. ENTIDAD Municipalidad 2. OBJETO DE LA CONTRATACION Servicio de limpieza 3. FINALIDAD PUBLICA Mantener",
        );
        assert_eq!(extract(&text, &SERVICE_DESCRIPTION), "Servicio de limpieza");
    }

    #[test]
    fn test_extract_service_description_across_lines_and_case() {
        let text = reference(
            "2.  Objeto de la\ncontratacion\n  Contratación del servicio\n de   apoyo   administrativo\n3. Finalidad Publica",
        );
        assert_eq!(
            extract(&text, &SERVICE_DESCRIPTION),
            "Contratación del servicio de apoyo administrativo"
        );
    }

    #[test]
    fn test_extract_service_takes_first_section_only() {
        let text = reference(
            "2. OBJETO DE LA CONTRATACION A 3. FINALIDAD PUBLICA x 2. OBJETO DE LA CONTRATACION B 3. FINALIDAD PUBLICA",
        );
        assert_eq!(extract(&text, &SERVICE_DESCRIPTION), "A");
    }

    #[test]
    fn test_extract_payment_terms_uppercased() {
        let text = reference(
            "El pago se realizará en una (01) armada luego de la emisión de la conformidad del servicio, previa presentación",
        );
        assert_eq!(extract(&text, &PAYMENT_TERMS), "UNA (01) ARMADA");
    }

    #[test]
    fn test_extract_execution_days() {
        let text = reference("El plazo de ejecución del servicio es de hasta 45 días calendario");
        assert_eq!(extract(&text, &EXECUTION_DAYS), "45");
    }

    #[test]
    fn test_fallbacks_when_nothing_matches() {
        let text = reference("Documento sin las secciones esperadas");
        let fields = extract_fields(&text);

        assert_eq!(fields.servicio, ExtractedField::fallback("Servicio no encontrado"));
        assert_eq!(fields.armada, ExtractedField::fallback("FORMA DE PAGO NO ENCONTRADA"));
        assert_eq!(fields.dias, ExtractedField::fallback("DÍAS NO ENCONTRADOS"));
        assert_eq!(fields.missing(), vec!["servicio", "armada", "dias"]);
        assert_eq!(fields.days(), None);
    }

    #[test]
    fn test_extract_fields_full_reference() {
        let text = ReferenceText::from_pages([
            "TÉRMINOS DE REFERENCIA\n2. OBJETO DE LA CONTRATACION\nServicio de digitación",
            "3. FINALIDAD PUBLICA\nEl plazo de ejecución del servicio es de hasta 30 días calendario.\n\
             El pago se realizará en dos armadas luego de la emisión de la conformidad del servicio, por parte del área usuaria",
        ]);
        let fields = extract_fields(&text);

        assert_eq!(fields.servicio.value, "Servicio de digitación");
        assert_eq!(fields.armada.value, "DOS ARMADAS");
        assert_eq!(fields.dias.value, "30");
        assert_eq!(fields.days(), Some(30));
        assert!(fields.missing().is_empty());
    }

    #[test]
    fn test_extract_fields_from_two_page_pdf() {
        let data = crate::pdf::fixtures::pdf(&[
            &[
                "TERMINOS DE REFERENCIA",
                "2. OBJETO DE LA CONTRATACION",
                "Contratación del servicio de",
            ],
            &[
                "apoyo administrativo",
                "3. FINALIDAD PUBLICA",
                "El plazo de ejecución del servicio es de hasta 60 días calendario",
            ],
        ]);
        let fields = extract_fields(&ReferenceText::from_pdf(&data).unwrap());

        assert_eq!(
            fields.servicio,
            ExtractedField::found("Contratación del servicio de apoyo administrativo")
        );
        assert_eq!(fields.days(), Some(60));
        assert_eq!(fields.missing(), vec!["armada"]);
    }

    #[test]
    fn test_find_reports_position() {
        let text = reference("xx El plazo de ejecución del servicio es de hasta 7 días calendario");
        let m = find(&text, &EXECUTION_DAYS).unwrap();
        assert_eq!(m.value, "7");
        assert_eq!(m.position.map(|(start, _)| start), Some(3));
    }
}
