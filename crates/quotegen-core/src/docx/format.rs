//! Character formatting read from and written to `w:rPr`.

use super::xml::XmlElement;

/// The subset of run properties the renderer carries over.
///
/// `None` means "not set on the run" (inherit from the style).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunFormat {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Raw `w:u/@w:val` ("single", "double", "none", ...).
    pub underline: Option<String>,
    /// Hex RGB, e.g. `1F3864`. Theme and `auto` colors are not carried.
    pub color: Option<String>,
    pub font_family: Option<String>,
    /// Size in half-points, as stored in `w:sz`.
    pub size_half_points: Option<u32>,
}

impl RunFormat {
    /// Explicitly plain: not bold, not italic, not underlined.
    pub fn plain() -> Self {
        Self {
            bold: Some(false),
            italic: Some(false),
            underline: Some("none".to_string()),
            ..Default::default()
        }
    }

    /// Read formatting from a run's `w:rPr`.
    pub fn from_properties(rpr: Option<&XmlElement>) -> Self {
        let Some(rpr) = rpr else {
            return Self::default();
        };

        Self {
            bold: rpr.child("w:b").map(toggle_value),
            italic: rpr.child("w:i").map(toggle_value),
            underline: rpr
                .child("w:u")
                .map(|u| u.attr("w:val").unwrap_or("single").to_string()),
            color: rpr
                .child("w:color")
                .and_then(|c| c.attr("w:val"))
                .filter(|v| is_hex_rgb(v))
                .map(str::to_ascii_uppercase),
            font_family: rpr
                .child("w:rFonts")
                .and_then(|f| f.attr("w:ascii"))
                .map(str::to_string),
            size_half_points: rpr
                .child("w:sz")
                .and_then(|s| s.attr("w:val"))
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Keep character styling, replace the font with the house style.
    pub fn with_house_font(mut self, family: &str, size_pt: f32) -> Self {
        self.font_family = Some(family.to_string());
        self.size_half_points = Some((size_pt * 2.0).round() as u32);
        self
    }

    /// Build a `w:rPr`, elements in schema order.
    pub fn to_properties(&self) -> Option<XmlElement> {
        let mut rpr = XmlElement::new("w:rPr");

        if let Some(family) = &self.font_family {
            rpr = rpr.with_child(
                XmlElement::new("w:rFonts")
                    .with_attr("w:ascii", family.as_str())
                    .with_attr("w:hAnsi", family.as_str()),
            );
        }
        if let Some(bold) = self.bold {
            rpr = rpr.with_child(toggle_element("w:b", bold));
        }
        if let Some(italic) = self.italic {
            rpr = rpr.with_child(toggle_element("w:i", italic));
        }
        if let Some(color) = &self.color {
            rpr = rpr.with_child(XmlElement::new("w:color").with_attr("w:val", color.as_str()));
        }
        if let Some(size) = self.size_half_points {
            rpr = rpr.with_child(XmlElement::new("w:sz").with_attr("w:val", size.to_string()));
        }
        if let Some(underline) = &self.underline {
            rpr = rpr.with_child(XmlElement::new("w:u").with_attr("w:val", underline.as_str()));
        }

        if rpr.children.is_empty() {
            None
        } else {
            Some(rpr)
        }
    }
}

// ST_OnOff: absent val means on
fn toggle_value(el: &XmlElement) -> bool {
    !matches!(el.attr("w:val"), Some("0") | Some("false") | Some("off"))
}

fn toggle_element(name: &str, on: bool) -> XmlElement {
    let el = XmlElement::new(name);
    if on { el } else { el.with_attr("w:val", "0") }
}

fn is_hex_rgb(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::parse_fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_properties() {
        let rpr = parse_fragment(
            r#"<w:rPr><w:rFonts w:ascii="Calibri"/><w:b/><w:i w:val="0"/><w:color w:val="ff0000"/><w:sz w:val="28"/><w:u w:val="double"/></w:rPr>"#,
        )
        .unwrap();
        let format = RunFormat::from_properties(Some(&rpr));

        assert_eq!(
            format,
            RunFormat {
                bold: Some(true),
                italic: Some(false),
                underline: Some("double".to_string()),
                color: Some("FF0000".to_string()),
                font_family: Some("Calibri".to_string()),
                size_half_points: Some(28),
            }
        );
    }

    #[test]
    fn test_auto_color_is_ignored() {
        let rpr = parse_fragment(r#"<w:rPr><w:color w:val="auto"/></w:rPr>"#).unwrap();
        assert_eq!(RunFormat::from_properties(Some(&rpr)).color, None);
    }

    #[test]
    fn test_house_font_round_trip() {
        let format = RunFormat {
            bold: Some(true),
            ..Default::default()
        }
        .with_house_font("Arial", 11.0);
        let rpr = format.to_properties().unwrap();

        let names: Vec<&str> = rpr.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:rFonts", "w:b", "w:sz"]);
        assert_eq!(rpr.child("w:sz").and_then(|s| s.attr("w:val")), Some("22"));
        assert_eq!(RunFormat::from_properties(Some(&rpr)), format);
    }

    #[test]
    fn test_plain_writes_explicit_off() {
        let rpr = RunFormat::plain().to_properties().unwrap();
        assert_eq!(rpr.child("w:b").and_then(|b| b.attr("w:val")), Some("0"));
        assert_eq!(rpr.child("w:u").and_then(|u| u.attr("w:val")), Some("none"));
    }

    #[test]
    fn test_empty_format_has_no_properties() {
        assert_eq!(RunFormat::default().to_properties(), None);
    }
}
