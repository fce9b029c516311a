//! Typed view of `word/document.xml`.
//!
//! The body is split into [`Block`]s: paragraphs, tables (whose cells own
//! their own blocks, so tables nest to any depth) and everything else, which
//! is carried through untouched.

use crate::error::TemplateError;

use super::xml::{XmlDocument, XmlElement, XmlNode};

pub const DOCUMENT: &str = "w:document";
pub const BODY: &str = "w:body";
pub const PARAGRAPH: &str = "w:p";
pub const PARAGRAPH_PROPERTIES: &str = "w:pPr";
pub const RUN: &str = "w:r";
pub const RUN_PROPERTIES: &str = "w:rPr";
pub const TEXT: &str = "w:t";
pub const TABLE: &str = "w:tbl";
pub const ROW: &str = "w:tr";
pub const CELL: &str = "w:tc";
pub const CELL_PROPERTIES: &str = "w:tcPr";

/// The main document part.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    prolog: Vec<XmlNode>,
    /// `w:document` with an empty `w:body`; the body lives in `body`.
    shell: XmlElement,
    pub body: Vec<Block>,
}

/// A body-level or cell-level block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Other(XmlNode),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<XmlElement>,
    pub content: Vec<Inline>,
}

/// Direct child of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Other(XmlNode),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<XmlElement>,
    pub content: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<TableItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableItem {
    Row(Row),
    Other(XmlNode),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RowItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowItem {
    Cell(Cell),
    Other(XmlNode),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub attributes: Vec<(String, String)>,
    pub properties: Option<XmlElement>,
    pub blocks: Vec<Block>,
}

impl Document {
    /// Build the typed view from a parsed `word/document.xml`.
    pub fn from_xml(doc: XmlDocument) -> Result<Self, TemplateError> {
        let XmlDocument { prolog, mut root } = doc;
        if root.name != DOCUMENT {
            return Err(TemplateError::Structure(format!(
                "expected <{}> root, found <{}>",
                DOCUMENT, root.name
            )));
        }

        let body = root
            .child_mut(BODY)
            .ok_or_else(|| TemplateError::Structure("document has no <w:body>".to_string()))?;
        let nodes = std::mem::take(&mut body.children);
        let body = blocks_from_nodes(nodes)?;

        Ok(Self {
            prolog,
            shell: root,
            body,
        })
    }

    /// Reassemble the XML part.
    pub fn to_xml(&self) -> XmlDocument {
        let mut root = self.shell.clone();
        if let Some(body) = root.child_mut(BODY) {
            body.children = blocks_to_nodes(&self.body);
        }
        XmlDocument {
            prolog: self.prolog.clone(),
            root,
        }
    }

    /// Visit every paragraph, including those in nested tables, in document order.
    pub fn visit_paragraphs<'a>(&'a self, visit: &mut impl FnMut(&'a Paragraph)) {
        visit_blocks(&self.body, visit);
    }

    /// All paragraph texts in document order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        self.visit_paragraphs(&mut |p| texts.push(p.text()));
        texts
    }
}

fn visit_blocks<'a>(blocks: &'a [Block], visit: &mut impl FnMut(&'a Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => visit(p),
            Block::Table(table) => {
                for cell in table.cells() {
                    visit_blocks(&cell.blocks, visit);
                }
            }
            Block::Other(_) => {}
        }
    }
}

fn blocks_from_nodes(nodes: Vec<XmlNode>) -> Result<Vec<Block>, TemplateError> {
    nodes
        .into_iter()
        .map(|node| match node {
            XmlNode::Element(el) if el.name == PARAGRAPH => Ok(Block::Paragraph(Paragraph::from_element(el))),
            XmlNode::Element(el) if el.name == TABLE => Table::from_element(el).map(Block::Table),
            other => Ok(Block::Other(other)),
        })
        .collect()
}

fn blocks_to_nodes(blocks: &[Block]) -> Vec<XmlNode> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(p) => XmlNode::Element(p.to_element()),
            Block::Table(t) => XmlNode::Element(t.to_element()),
            Block::Other(node) => node.clone(),
        })
        .collect()
}

impl Paragraph {
    fn from_element(el: XmlElement) -> Self {
        let mut paragraph = Paragraph {
            attributes: el.attributes,
            ..Default::default()
        };

        for node in el.children {
            match node {
                XmlNode::Element(child) if child.name == PARAGRAPH_PROPERTIES => {
                    paragraph.properties = Some(child)
                }
                XmlNode::Element(child) if child.name == RUN => {
                    paragraph.content.push(Inline::Run(Run::from_element(child)))
                }
                other => paragraph.content.push(Inline::Other(other)),
            }
        }
        paragraph
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement::new(PARAGRAPH);
        el.attributes = self.attributes.clone();
        if let Some(props) = &self.properties {
            el.children.push(XmlNode::Element(props.clone()));
        }
        for inline in &self.content {
            el.children.push(match inline {
                Inline::Run(run) => XmlNode::Element(run.to_element()),
                Inline::Other(node) => node.clone(),
            });
        }
        el
    }

    /// Direct runs, in order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Other(_) => None,
        })
    }

    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Full text of the paragraph's direct runs.
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Drop all content, keeping paragraph properties.
    pub fn clear_content(&mut self) {
        self.content.clear();
    }

    /// Replace every direct run with `run`, appended after the remaining content.
    pub fn replace_runs(&mut self, run: Run) {
        self.content.retain(|inline| !matches!(inline, Inline::Run(_)));
        self.content.push(Inline::Run(run));
    }
}

impl Run {
    fn from_element(el: XmlElement) -> Self {
        let mut run = Run {
            attributes: el.attributes,
            ..Default::default()
        };
        for node in el.children {
            match node {
                XmlNode::Element(child) if child.name == RUN_PROPERTIES => run.properties = Some(child),
                other => run.content.push(other),
            }
        }
        run
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement::new(RUN);
        el.attributes = self.attributes.clone();
        if let Some(props) = &self.properties {
            el.children.push(XmlNode::Element(props.clone()));
        }
        el.children.extend(self.content.iter().cloned());
        el
    }

    /// Visible text: `w:t` content, tabs as `\t`, breaks as `\n`,
    /// non-breaking hyphens as `-`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in self.content.iter().filter_map(XmlNode::as_element) {
            match child.name.as_str() {
                TEXT => text.push_str(&child.text()),
                "w:tab" | "w:ptab" => text.push('\t'),
                "w:br" | "w:cr" => text.push('\n'),
                "w:noBreakHyphen" => text.push('-'),
                _ => {}
            }
        }
        text
    }

    /// A run holding `text`, with tabs and line breaks as their own elements.
    pub fn with_text(properties: Option<XmlElement>, text: &str) -> Self {
        let mut content = Vec::new();
        let mut segment = String::new();

        let flush = |segment: &mut String, content: &mut Vec<XmlNode>| {
            if segment.is_empty() {
                return;
            }
            let mut t = XmlElement::new(TEXT).with_attr("xml:space", "preserve");
            t.children.push(XmlNode::Text(std::mem::take(segment)));
            content.push(XmlNode::Element(t));
        };

        for ch in text.chars() {
            match ch {
                '\t' => {
                    flush(&mut segment, &mut content);
                    content.push(XmlNode::Element(XmlElement::new("w:tab")));
                }
                '\n' => {
                    flush(&mut segment, &mut content);
                    content.push(XmlNode::Element(XmlElement::new("w:br")));
                }
                _ => segment.push(ch),
            }
        }
        flush(&mut segment, &mut content);

        Self {
            attributes: Vec::new(),
            properties,
            content,
        }
    }

    /// A run wrapping a single drawing element.
    pub fn with_drawing(drawing: XmlElement) -> Self {
        Self {
            attributes: Vec::new(),
            properties: None,
            content: vec![XmlNode::Element(drawing)],
        }
    }

    pub fn has_drawing(&self) -> bool {
        self.content
            .iter()
            .filter_map(XmlNode::as_element)
            .any(|el| el.name == "w:drawing")
    }
}

impl Table {
    fn from_element(el: XmlElement) -> Result<Self, TemplateError> {
        let mut table = Table {
            attributes: el.attributes,
            children: Vec::new(),
        };
        for node in el.children {
            table.children.push(match node {
                XmlNode::Element(child) if child.name == ROW => TableItem::Row(Row::from_element(child)?),
                other => TableItem::Other(other),
            });
        }
        Ok(table)
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement::new(TABLE);
        el.attributes = self.attributes.clone();
        for item in &self.children {
            el.children.push(match item {
                TableItem::Row(row) => XmlNode::Element(row.to_element()),
                TableItem::Other(node) => node.clone(),
            });
        }
        el
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.children.iter().filter_map(|item| match item {
            TableItem::Row(row) => Some(row),
            TableItem::Other(_) => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.children.iter_mut().filter_map(|item| match item {
            TableItem::Row(row) => Some(row),
            TableItem::Other(_) => None,
        })
    }

    /// Every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows().flat_map(Row::cells)
    }
}

impl Row {
    fn from_element(el: XmlElement) -> Result<Self, TemplateError> {
        let mut row = Row {
            attributes: el.attributes,
            children: Vec::new(),
        };
        for node in el.children {
            row.children.push(match node {
                XmlNode::Element(child) if child.name == CELL => RowItem::Cell(Cell::from_element(child)?),
                other => RowItem::Other(other),
            });
        }
        Ok(row)
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement::new(ROW);
        el.attributes = self.attributes.clone();
        for item in &self.children {
            el.children.push(match item {
                RowItem::Cell(cell) => XmlNode::Element(cell.to_element()),
                RowItem::Other(node) => node.clone(),
            });
        }
        el
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.children.iter().filter_map(|item| match item {
            RowItem::Cell(cell) => Some(cell),
            RowItem::Other(_) => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.children.iter_mut().filter_map(|item| match item {
            RowItem::Cell(cell) => Some(cell),
            RowItem::Other(_) => None,
        })
    }
}

impl Cell {
    fn from_element(el: XmlElement) -> Result<Self, TemplateError> {
        let mut properties = None;
        let mut rest = Vec::new();
        for node in el.children {
            match node {
                XmlNode::Element(child) if child.name == CELL_PROPERTIES => properties = Some(child),
                other => rest.push(other),
            }
        }

        let blocks = blocks_from_nodes(rest)?;
        // Every w:tc must end in a paragraph; a cell without one is not a valid template
        if !blocks.iter().any(|b| matches!(b, Block::Paragraph(_))) {
            return Err(TemplateError::Structure(
                "table cell contains no paragraph".to_string(),
            ));
        }

        Ok(Self {
            attributes: el.attributes,
            properties,
            blocks,
        })
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement::new(CELL);
        el.attributes = self.attributes.clone();
        if let Some(props) = &self.properties {
            el.children.push(XmlNode::Element(props.clone()));
        }
        el.children.extend(blocks_to_nodes(&self.blocks));
        el
    }
}
