// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The XML encoding. Every value is an element, named after its field or, without a field, after
//! its kind. Structured content mirrors the reversible JSON encoding, so XML is always
//! reversible. The top level values are the children of a `<UaDocument>` root.
//!
//! Values are built up as a small element tree which is written out by `quick-xml` when the
//! encoder finishes, and the decoder parses the whole input into the same tree up front.

use std::io::Write;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::types::{
    builtin_kind::BuiltInKind,
    encoding::DecodingOptions,
    error::{EncodingError, EncodingResult},
    status_codes::StatusCode,
};

mod decoder;
mod encoder;

pub use self::{decoder::XmlDecoder, encoder::XmlEncoder};

pub(crate) const DOCUMENT_ELEMENT: &str = "UaDocument";
const NULL_ATTRIBUTE: &str = "Null";
/// Most elements one level of value nesting takes, e.g. a matrix in a variant field is
/// `<Field><Matrix><Elements><NodeId><Identifier>`
const ELEMENTS_PER_LEVEL: usize = 4;

/// An element with its attributes, text and child elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new<T: Into<String>>(name: T) -> XmlNode {
        XmlNode {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text<T: Into<String>, S: Into<String>>(name: T, text: S) -> XmlNode {
        XmlNode {
            name: name.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// An element standing for a null string, byte string or array
    pub fn null<T: Into<String>>(name: T) -> XmlNode {
        XmlNode {
            name: name.into(),
            attributes: vec![(NULL_ATTRIBUTE.to_string(), "true".to_string())],
            ..Default::default()
        }
    }

    pub fn is_null(&self) -> bool {
        self.attributes
            .iter()
            .any(|(k, v)| k == NULL_ATTRIBUTE && v == "true")
    }

    pub fn with_child(mut self, child: XmlNode) -> XmlNode {
        self.children.push(child);
        self
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            return writer.write_event(Event::Empty(start));
        }
        writer.write_event(Event::Start(start))?;
        if let Some(ref text) = self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }

    /// Writes the element as XML text, without a declaration
    pub fn to_xml(&self) -> EncodingResult<String> {
        let mut writer = Writer::new(Vec::new());
        self.write(&mut writer).map_err(|err| {
            error!("Cannot write XML element {}, {}", self.name, err);
            StatusCode::BadEncodingError
        })?;
        String::from_utf8(writer.into_inner()).map_err(|_| StatusCode::BadEncodingError.into())
    }
}

/// Writes a complete document with a declaration
pub(crate) fn write_document(root: &XmlNode) -> EncodingResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .and_then(|_| root.write(&mut writer))
        .map_err(|err| {
            error!("Cannot write XML document, {}", err);
            EncodingError::from(StatusCode::BadEncodingError)
        })?;
    Ok(writer.into_inner())
}

fn read_error(err: quick_xml::Error) -> EncodingError {
    match err {
        quick_xml::Error::UnexpectedEof(_) => {
            error!("XML input ends inside an element");
            EncodingError::UnexpectedEof
        }
        err => {
            error!("Cannot parse XML input, {}", err);
            StatusCode::BadDecodingError.into()
        }
    }
}

fn utf8(bytes: &[u8]) -> EncodingResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| {
            error!("XML name is not valid UTF-8");
            StatusCode::BadDecodingError.into()
        })
}

fn node_from_start(start: &BytesStart) -> EncodingResult<XmlNode> {
    let mut node = XmlNode::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| {
            error!("Invalid XML attribute, {}", err);
            EncodingError::from(StatusCode::BadDecodingError)
        })?;
        let key = utf8(attribute.key.as_ref())?;
        let value = attribute.unescape_value().map_err(read_error)?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

/// Most nested elements a document may have under the decoding options, counting the root
pub(crate) fn max_element_depth(options: &DecodingOptions) -> usize {
    options.max_depth() * ELEMENTS_PER_LEVEL + 2
}

/// Parses the root element of a document. `None` if the input holds no element at all. Elements
/// nested deeper than the options allow fail before the tree is built.
pub(crate) fn parse_document(
    data: &[u8],
    options: &DecodingOptions,
) -> EncodingResult<Option<XmlNode>> {
    let max_depth = max_element_depth(options);
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root = None;

    fn attach(stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>, node: XmlNode) -> EncodingResult<()> {
        match stack.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                Ok(())
            }
            None if root.is_none() => {
                *root = Some(node);
                Ok(())
            }
            None => {
                error!("XML document has more than one root element");
                Err(StatusCode::BadDecodingError.into())
            }
        }
    }

    loop {
        match reader.read_event_into(&mut buf).map_err(read_error)? {
            Event::Start(start) => {
                if stack.len() >= max_depth {
                    warn!(
                        "XML decoding aborted, elements are nested deeper than {}",
                        max_depth
                    );
                    return Err(StatusCode::BadDecodingError.into());
                }
                stack.push(node_from_start(&start)?);
            }
            Event::Empty(start) => {
                let node = node_from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let mut node = stack.pop().ok_or_else(|| {
                    error!("Unbalanced XML end element");
                    EncodingError::from(StatusCode::BadDecodingError)
                })?;
                // Whitespace between child elements is layout, not content
                if !node.children.is_empty()
                    && node.text.as_deref().map_or(false, |t| t.trim().is_empty())
                {
                    node.text = None;
                }
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(read_error)?;
                if let Some(node) = stack.last_mut() {
                    node.text.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(data) => {
                let text = utf8(&data.into_inner())?;
                if let Some(node) = stack.last_mut() {
                    node.text.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    if !stack.is_empty() {
        error!("XML input ends inside element {}", stack[stack.len() - 1].name);
        return Err(EncodingError::UnexpectedEof);
    }
    Ok(root)
}

pub(crate) fn float_to_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

pub(crate) fn float_from_text(kind: BuiltInKind, text: &str) -> EncodingResult<f64> {
    match text.trim() {
        "NaN" => Ok(f64::NAN),
        "INF" | "Infinity" => Ok(f64::INFINITY),
        "-INF" | "-Infinity" => Ok(f64::NEG_INFINITY),
        text => text.parse::<f64>().map_err(|_| {
            error!("Cannot read {} from {}", kind, text);
            EncodingError::type_mismatch(kind, text)
        }),
    }
}

/// The name of the element that holds an array of the kind
pub(crate) fn list_name(kind: BuiltInKind) -> String {
    format!("ListOf{}", kind.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_tree_round_trip() {
        let root = XmlNode::new(DOCUMENT_ELEMENT)
            .with_child(XmlNode::with_text("Name", " a < b & c "))
            .with_child(XmlNode::null("Missing"))
            .with_child(XmlNode::new("Empty"))
            .with_child(XmlNode::new("Outer").with_child(XmlNode::with_text("Int32", "5")));
        let bytes = write_document(&root).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("<Missing Null=\"true\"/>"));
        assert_eq!(parse_document(&bytes, &DecodingOptions::test()).unwrap(), Some(root));
    }

    #[test]
    fn xml_layout_whitespace_ignored() {
        let xml = "<UaDocument>\n  <Outer>\n    <Int32>5</Int32>\n  </Outer>\n  <String>  x  </String>\n</UaDocument>";
        let root = parse_document(xml.as_bytes(), &DecodingOptions::test()).unwrap().unwrap();
        let outer = root.child("Outer").unwrap();
        assert_eq!(outer.text, None);
        assert_eq!(outer.child("Int32").unwrap().text(), "5");
        assert_eq!(root.child("String").unwrap().text(), "  x  ");
    }

    #[test]
    fn xml_truncated_document() {
        assert!(matches!(
            parse_document(b"<UaDocument><Int32>5</Int32><String>abc", &DecodingOptions::test()),
            Err(EncodingError::UnexpectedEof)
        ));
        assert_eq!(parse_document(b"", &DecodingOptions::test()).unwrap(), None);
    }

    #[test]
    fn xml_nesting_limit() {
        let options = DecodingOptions::test();
        let nested = |depth: usize| {
            let mut xml = String::new();
            for _ in 0..depth {
                xml.push_str("<a>");
            }
            for _ in 0..depth {
                xml.push_str("</a>");
            }
            xml
        };
        let limit = max_element_depth(&options);
        assert!(parse_document(nested(limit).as_bytes(), &options).is_ok());
        let err = parse_document(nested(limit + 1).as_bytes(), &options).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadDecodingError);
        // Far past the limit fails the same way rather than exhausting the stack
        let err = parse_document(nested(500_000).as_bytes(), &options).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadDecodingError);
    }
}
