//! Minimal XML element tree for the portal's positional payloads.
//!
//! The timetable, period, and calendar grids address their children by
//! document position rather than by element name, so serde derive cannot
//! decode them; this tree keeps name, text, and child order intact.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One XML element: name, text content, and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name.
    pub name: String,
    /// Concatenated text content, `None` when the element carries no text.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: String) -> Self {
        Self {
            name,
            text: None,
            children: Vec::new(),
        }
    }

    fn append_text(&mut self, value: &str) {
        match self.text.as_mut() {
            Some(existing) => existing.push_str(value),
            None => self.text = Some(String::from(value)),
        }
    }

    /// Parses an XML document into its root element.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not well-formed or has no root
    /// element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            match reader.read_event().context("invalid XML")? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    stack.push(Self::new(name));
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let node = Self::new(name);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Event::Text(e) => {
                    let value = e.unescape().context("invalid text content")?;
                    if let Some(node) = stack.last_mut() {
                        node.append_text(&value);
                    }
                }
                Event::CData(e) => {
                    let value = String::from_utf8_lossy(&e).into_owned();
                    if let Some(node) = stack.last_mut() {
                        node.append_text(&value);
                    }
                }
                Event::End(_) => {
                    let node = stack.pop().context("unbalanced XML end tag")?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.context("document has no root element")
    }

    /// Returns the first direct child with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns the text of the first direct child with the given name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|child| child.text.as_deref())
    }
}
