//! XML to nested-map normalization.
//!
//! Produces the same shape webhook consumers see from loosely-typed
//! receivers: attributes under `"@attributes"`, mixed text under `"#text"`,
//! and repeated sibling tags promoted to lists.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

/// Reserved key for element attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Reserved key for text content of an element that also has children.
pub const TEXT_KEY: &str = "#text";

/// One normalized XML element: a scalar leaf, a repeated-tag sequence, or a
/// map of child tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XmlNode {
    Text(String),
    List(Vec<XmlNode>),
    Map(XmlTree),
}

/// Mapping from tag (or reserved key) to its normalized value.
pub type XmlTree = BTreeMap<String, XmlNode>;

/// In-flight state for one open element.
struct Frame {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<(String, XmlNode)>,
}

impl Frame {
    fn open(reader: &Reader<&[u8]>, start: &BytesStart) -> Result<Self> {
        let tag = reader.decoder().decode(start.name().as_ref())?.into_owned();
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
            attributes.insert(key, attr.unescape_value()?.into_owned());
        }
        Ok(Self {
            tag,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Collapse the closed element into its normalized node.
    fn close(self) -> XmlNode {
        let text = self.text.trim();

        // Text-only leaf collapses to a scalar, dropping any attributes.
        if !text.is_empty() && self.children.is_empty() {
            return XmlNode::Text(text.to_string());
        }

        let mut map = XmlTree::new();
        if !self.attributes.is_empty() {
            let attrs = self
                .attributes
                .into_iter()
                .map(|(k, v)| (k, XmlNode::Text(v)))
                .collect();
            map.insert(ATTRIBUTES_KEY.to_string(), XmlNode::Map(attrs));
        }
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), XmlNode::Text(text.to_string()));
        }
        for (tag, node) in self.children {
            insert_child(&mut map, tag, node);
        }
        XmlNode::Map(map)
    }
}

/// Insert a child under its tag, promoting repeats to a list.
fn insert_child(map: &mut XmlTree, tag: String, node: XmlNode) {
    match map.remove(&tag) {
        None => {
            map.insert(tag, node);
        }
        Some(XmlNode::List(mut items)) => {
            items.push(node);
            map.insert(tag, XmlNode::List(items));
        }
        Some(existing) => {
            map.insert(tag, XmlNode::List(vec![existing, node]));
        }
    }
}

/// Normalize an XML document into a single-entry map keyed by the root tag.
///
/// Malformed input (mismatched or unclosed tags, content after the root,
/// multiple roots) is an error; the dispatcher attaches the raw text so the
/// payload is never silently dropped.
pub fn normalize(xml: &str) -> Result<XmlTree> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, XmlNode)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if root.is_some() {
                    bail!("unexpected element after document root");
                }
                stack.push(Frame::open(&reader, &start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    bail!("unexpected element after document root");
                }
                let frame = Frame::open(&reader, &start)?;
                let tag = frame.tag.clone();
                attach(&mut stack, &mut root, tag, frame.close());
            }
            Event::End(_) => {
                // quick-xml has already checked the end tag matches.
                let frame = match stack.pop() {
                    Some(frame) => frame,
                    None => bail!("unmatched closing tag"),
                };
                let tag = frame.tag.clone();
                let node = frame.close();
                attach(&mut stack, &mut root, tag, node);
            }
            Event::Text(text) => {
                let value = text.unescape()?;
                match stack.last_mut() {
                    // Only text before the first child counts; tail text
                    // between siblings is dropped.
                    Some(frame) if frame.children.is_empty() => frame.text.push_str(&value),
                    Some(_) => {}
                    None if value.trim().is_empty() => {}
                    None => bail!("text content outside of document root"),
                }
            }
            Event::CData(data) => {
                let value = String::from_utf8(data.into_inner().into_owned())?;
                match stack.last_mut() {
                    Some(frame) if frame.children.is_empty() => frame.text.push_str(&value),
                    Some(_) => {}
                    None => bail!("CDATA outside of document root"),
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if !stack.is_empty() {
        bail!("unclosed element '{}'", stack[stack.len() - 1].tag);
    }
    match root {
        Some((tag, node)) => {
            let mut tree = XmlTree::new();
            tree.insert(tag, node);
            Ok(tree)
        }
        None => bail!("document has no root element"),
    }
}

/// Hand a finished node to its parent frame, or record it as the root.
fn attach(
    stack: &mut Vec<Frame>,
    root: &mut Option<(String, XmlNode)>,
    tag: String,
    node: XmlNode,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((tag, node)),
        None => *root = Some((tag, node)),
    }
}
