//! Fixed anchor patterns for reference (TDR) field extraction.
//!
//! Anchors are written as regex fragments so that any amount of whitespace
//! between anchor words still matches, the way the reference documents are
//! laid out after text extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// What the text between two anchors must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Any text, matched non-greedily.
    Text,
    /// A run of ASCII digits.
    Digits,
}

impl Capture {
    fn regex_fragment(self) -> &'static str {
        match self {
            Capture::Text => "(.*?)",
            Capture::Digits => "([0-9]+)",
        }
    }
}

/// Normalization applied to a successful capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Keep the captured text as-is.
    Raw,
    /// Collapse whitespace runs to single spaces.
    Collapse,
    /// Collapse whitespace and uppercase.
    CollapseUppercase,
}

impl PostProcess {
    pub fn apply(self, captured: &str) -> String {
        match self {
            PostProcess::Raw => captured.to_string(),
            PostProcess::Collapse => collapse_whitespace(captured),
            PostProcess::CollapseUppercase => collapse_whitespace(captured).to_uppercase(),
        }
    }
}

/// Declarative description of a field: two anchors, the capture between
/// them and the literal used when nothing matches.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub field: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub capture: Capture,
    pub case_insensitive: bool,
    pub fallback: &'static str,
    pub post: PostProcess,
}

/// A compiled [`PatternSpec`].
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    spec: PatternSpec,
    regex: Regex,
}

impl ExtractionPattern {
    /// Compile the anchors of a spec into a single regex.
    pub fn compile(spec: PatternSpec) -> Result<Self, regex::Error> {
        let flags = if spec.case_insensitive { "(?si)" } else { "(?s)" };
        let source = format!(
            r"{}{}\s*{}\s*{}",
            flags,
            spec.start,
            spec.capture.regex_fragment(),
            spec.end
        );
        Ok(Self {
            spec,
            regex: Regex::new(&source)?,
        })
    }

    pub fn field(&self) -> &'static str {
        self.spec.field
    }

    pub fn fallback(&self) -> &'static str {
        self.spec.fallback
    }

    pub fn post(&self) -> PostProcess {
        self.spec.post
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

pub const SERVICE_DESCRIPTION_SPEC: PatternSpec = PatternSpec {
    field: "servicio",
    start: r"2\.\s*OBJETO\s*DE\s*LA\s*CONTRATACION",
    end: r"3\.\s*FINALIDAD\s*PUBLICA",
    capture: Capture::Text,
    case_insensitive: true,
    fallback: "Servicio no encontrado",
    post: PostProcess::Collapse,
};

pub const PAYMENT_TERMS_SPEC: PatternSpec = PatternSpec {
    field: "armada",
    start: "El pago se realizará en",
    end: "luego de la emisión de la conformidad del servicio,",
    capture: Capture::Text,
    case_insensitive: true,
    fallback: "FORMA DE PAGO NO ENCONTRADA",
    post: PostProcess::CollapseUppercase,
};

pub const EXECUTION_DAYS_SPEC: PatternSpec = PatternSpec {
    field: "dias",
    start: "El plazo de ejecución del servicio es de hasta",
    end: "días calendario",
    capture: Capture::Digits,
    case_insensitive: true,
    fallback: "DÍAS NO ENCONTRADOS",
    post: PostProcess::Raw,
};

lazy_static! {
    /// "2. OBJETO DE LA CONTRATACION" ... "3. FINALIDAD PUBLICA"
    pub static ref SERVICE_DESCRIPTION: ExtractionPattern =
        ExtractionPattern::compile(SERVICE_DESCRIPTION_SPEC).unwrap();

    /// "El pago se realizará en" ... "luego de la emisión de la conformidad del servicio,"
    pub static ref PAYMENT_TERMS: ExtractionPattern =
        ExtractionPattern::compile(PAYMENT_TERMS_SPEC).unwrap();

    /// "El plazo de ejecución del servicio es de hasta" N "días calendario"
    pub static ref EXECUTION_DAYS: ExtractionPattern =
        ExtractionPattern::compile(EXECUTION_DAYS_SPEC).unwrap();
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_digits_capture_rejects_words() {
        assert!(EXECUTION_DAYS
            .regex()
            .captures("El plazo de ejecución del servicio es de hasta treinta días calendario")
            .is_none());
    }

    #[test]
    fn test_digits_capture_is_ascii_only() {
        // Arabic-Indic digits are \d in Unicode mode but not a day count
        assert!(EXECUTION_DAYS
            .regex()
            .captures("El plazo de ejecución del servicio es de hasta \u{0663}\u{0660} días calendario")
            .is_none());
        let caps = EXECUTION_DAYS
            .regex()
            .captures("El plazo de ejecución del servicio es de hasta 45 días calendario")
            .unwrap();
        assert_eq!(&caps[1], "45");
    }

    #[test]
    fn test_case_sensitive_spec_compiles_without_flag() {
        let spec = PatternSpec {
            case_insensitive: false,
            ..SERVICE_DESCRIPTION_SPEC
        };
        let pattern = ExtractionPattern::compile(spec).unwrap();
        assert!(pattern
            .regex()
            .captures("2. objeto de la contratacion x 3. finalidad publica")
            .is_none());
    }
}
