//! Minimal owned XML tree for OOXML parts.
//!
//! Parts are read into [`XmlElement`] trees with quick-xml and written back
//! verbatim apart from the nodes the renderer touches. Qualified names are
//! kept as written (`w:p`, `w:r`, ...); WordprocessingML always uses the
//! conventional prefixes.

use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An element with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|el| el.name == name)
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Concatenated text of this element's direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Visit this element and every descendant element, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Nodes before the root element (comments, processing instructions).
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

/// Parse an XML part into an owned tree.
pub fn parse(xml: &str) -> Result<XmlDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut prolog = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;

        let node = match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
                continue;
            }
            Event::End(_) => {
                let finished = stack
                    .pop()
                    .ok_or_else(|| "unbalanced closing tag".to_string())?;
                XmlNode::Element(finished)
            }
            Event::Empty(start) => XmlNode::Element(element_from_start(&start)?),
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(|e| e.to_string())?;
                XmlNode::Text(unescaped.into_owned())
            }
            Event::CData(data) => {
                XmlNode::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
            }
            Event::Comment(comment) => {
                XmlNode::Comment(String::from_utf8_lossy(&comment.into_inner()).into_owned())
            }
            Event::PI(pi) => {
                XmlNode::ProcessingInstruction(String::from_utf8_lossy(&pi.into_inner()).into_owned())
            }
            Event::Decl(_) | Event::DocType(_) => continue,
            Event::Eof => break,
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => match node {
                XmlNode::Element(el) => {
                    if root.is_some() {
                        return Err("multiple root elements".to_string());
                    }
                    root = Some(el);
                }
                // Whitespace between prolog and root carries no meaning
                XmlNode::Text(t) if t.trim().is_empty() => {}
                other => prolog.push(other),
            },
        }
    }

    if !stack.is_empty() {
        return Err(format!("unclosed element <{}>", stack[stack.len() - 1].name));
    }

    let root = root.ok_or_else(|| "document has no root element".to_string())?;
    Ok(XmlDocument { prolog, root })
}

/// Parse a fragment with a single root element.
pub fn parse_fragment(xml: &str) -> Result<XmlElement, String> {
    parse(xml).map(|doc| doc.root)
}

fn element_from_start(start: &BytesStart) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

/// Serialize a part with a standalone UTF-8 declaration.
pub fn write(doc: &XmlDocument) -> Result<Vec<u8>, String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(|e| e.to_string())?;
    writer
        .write_event(Event::Text(BytesText::from_escaped("\r\n")))
        .map_err(|e| e.to_string())?;

    for node in &doc.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &doc.root)?;

    Ok(writer.into_inner().into_inner())
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &XmlNode) -> Result<(), String> {
    let event = match node {
        XmlNode::Element(el) => return write_element(writer, el),
        XmlNode::Text(text) => Event::Text(BytesText::new(text)),
        XmlNode::CData(data) => Event::CData(BytesCData::new(data.as_str())),
        XmlNode::Comment(comment) => Event::Comment(BytesText::from_escaped(comment.as_str())),
        XmlNode::ProcessingInstruction(pi) => Event::PI(BytesPI::new(pi.as_str())),
    };
    writer.write_event(event).map_err(|e| e.to_string())
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, element: &XmlElement) -> Result<(), String> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| e.to_string());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| e.to_string())?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_attributes_and_text() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:p w:rsidR="00A1"><w:r><w:t xml:space="preserve"> A &amp; B </w:t></w:r></w:p>"#,
        )
        .unwrap();

        assert_eq!(doc.root.name, "w:p");
        assert_eq!(doc.root.attr("w:rsidR"), Some("00A1"));
        let t = doc.root.child("w:r").and_then(|r| r.child("w:t")).unwrap();
        assert_eq!(t.text(), " A & B ");
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_write_escapes_text_and_attributes() {
        let mut root = XmlElement::new("w:t").with_attr("w:val", "a\"b");
        root.children.push(XmlNode::Text("x < y & z".to_string()));
        let bytes = write(&XmlDocument {
            prolog: Vec::new(),
            root,
        })
        .unwrap();
        let xml = String::from_utf8(bytes).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("x &lt; y &amp; z"));
        assert!(xml.contains("w:val=\"a&quot;b\""));
    }

    #[test]
    fn test_round_trip_is_stable() {
        let source = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t>Hola</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;
        let first = parse(source).unwrap();
        let written = String::from_utf8(write(&first).unwrap()).unwrap();
        let second = parse(&written).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_rejects_unclosed() {
        assert!(parse("<w:p><w:r></w:p>").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_walk_visits_descendants() {
        let root = parse_fragment("<a><b><c/></b><c/></a>").unwrap();
        let mut count = 0;
        root.walk(&mut |el| {
            if el.name == "c" {
                count += 1;
            }
        });
        assert_eq!(count, 2);
    }
}
