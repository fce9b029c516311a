//! Inline picture embedding: media part, relationship, content type and the
//! `w:drawing` element that points at them.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::error::TemplateError;

use super::package::{CONTENT_TYPES_PART, DOCUMENT_RELS_PART, DocxPackage, MEDIA_DIR};
use super::xml::{self, XmlDocument, XmlElement};

/// English Metric Units per centimetre.
pub const EMU_PER_CM: f64 = 360_000.0;

const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// A decoded signature image.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    data: Vec<u8>,
    format: ImageFormat,
    image: DynamicImage,
}

impl SignatureImage {
    /// Decode image bytes. Formats Word cannot display are re-encoded as PNG.
    pub fn decode(data: &[u8]) -> Result<Self, image::ImageError> {
        let format = image::guess_format(data)?;
        let image = image::load_from_memory_with_format(data, format)?;

        let (data, format) = if is_word_native(format) {
            (data.to_vec(), format)
        } else {
            debug!("Re-encoding {:?} signature as PNG", format);
            (encode_png(&image)?, ImageFormat::Png)
        };

        Ok(Self {
            data,
            format,
            image,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Bytes as they will be stored in the package.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("png")
    }

    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Drawing extent in EMU for a fixed height; width follows the pixel aspect ratio.
    pub fn extent_for_height(&self, height_cm: f32) -> (u64, u64) {
        let cy = (f64::from(height_cm) * EMU_PER_CM).round() as u64;
        let (width, height) = self.dimensions();
        let cx = if height == 0 {
            cy
        } else {
            (cy as f64 * f64::from(width) / f64::from(height)).round() as u64
        };
        (cx, cy)
    }

    /// PNG encoding of the image.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        if self.format == ImageFormat::Png {
            return Ok(self.data.clone());
        }
        encode_png(&self.image)
    }
}

fn is_word_native(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::Tiff
    )
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// A media part registered in the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedMedia {
    pub relationship_id: String,
    /// Part name, e.g. `word/media/firma1.png`.
    pub part_name: String,
}

impl EmbeddedMedia {
    pub fn file_name(&self) -> &str {
        self.part_name.rsplit('/').next().unwrap_or(&self.part_name)
    }
}

/// Store the image under `word/media/`, relate it to the main document and
/// register its content type.
pub fn add_media(package: &mut DocxPackage, image: &SignatureImage) -> Result<EmbeddedMedia, TemplateError> {
    let extension = image.extension();
    let part_name = (1..)
        .map(|n| format!("{}firma{}.{}", MEDIA_DIR, n, extension))
        .find(|name| !package.has_part(name))
        .unwrap_or_else(|| format!("{}firma.{}", MEDIA_DIR, extension));

    let relationship_id = add_relationship(package, &part_name)?;
    register_content_type(package, extension, image.content_type())?;
    package.set_part(&part_name, image.data().to_vec());

    debug!("Embedded {} as {}", part_name, relationship_id);
    Ok(EmbeddedMedia {
        relationship_id,
        part_name,
    })
}

fn add_relationship(package: &mut DocxPackage, part_name: &str) -> Result<String, TemplateError> {
    let mut rels = if package.has_part(DOCUMENT_RELS_PART) {
        package.read_xml(DOCUMENT_RELS_PART)?
    } else {
        XmlDocument {
            prolog: Vec::new(),
            root: XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS),
        }
    };

    let next = rels
        .root
        .elements()
        .filter_map(|rel| rel.attr("Id"))
        .filter_map(|id| id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    let id = format!("rId{}", next);

    // Relationship targets are relative to word/
    let target = part_name.strip_prefix("word/").unwrap_or(part_name);
    rels.root.children.push(xml::XmlNode::Element(
        XmlElement::new("Relationship")
            .with_attr("Id", id.as_str())
            .with_attr("Type", IMAGE_RELATIONSHIP)
            .with_attr("Target", target),
    ));

    package.write_xml(DOCUMENT_RELS_PART, &rels)?;
    Ok(id)
}

fn register_content_type(
    package: &mut DocxPackage,
    extension: &str,
    content_type: &str,
) -> Result<(), TemplateError> {
    let mut types = package.read_xml(CONTENT_TYPES_PART)?;

    let known = types.root.elements().any(|el| {
        el.name == "Default"
            && el
                .attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    });
    if known {
        return Ok(());
    }

    // Defaults precede Overrides in the schema
    let position = types
        .root
        .children
        .iter()
        .position(|node| node.as_element().is_some_and(|el| el.name == "Override"))
        .unwrap_or(types.root.children.len());
    types.root.children.insert(
        position,
        xml::XmlNode::Element(
            XmlElement::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type),
        ),
    );

    package.write_xml(CONTENT_TYPES_PART, &types)
}

/// Highest `wp:docPr/@id` in a part; drawing ids must be unique per document.
pub fn max_drawing_id(root: &XmlElement) -> u32 {
    let mut max = 0;
    root.walk(&mut |el| {
        if el.name == "wp:docPr" {
            if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                max = max.max(id);
            }
        }
    });
    max
}

/// An inline `w:drawing` showing `media` at the given extent.
pub fn inline_drawing(
    media: &EmbeddedMedia,
    drawing_id: u32,
    (cx, cy): (u64, u64),
) -> Result<XmlElement, TemplateError> {
    let name = media.file_name();
    let source = format!(
        r#"<w:drawing xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
        cx = cx,
        cy = cy,
        id = drawing_id,
        name = name,
        rid = media.relationship_id,
    );

    xml::parse_fragment(&source).map_err(|reason| TemplateError::Xml {
        part: "w:drawing".to_string(),
        reason,
    })
}
