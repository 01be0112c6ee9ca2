// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::{collections::VecDeque, str::FromStr};

use crate::{
    catalogue::{TypeCatalogue, TypeDescription},
    codec::{binary::BinaryStreamEncoder, transcode::transcode_fields, ContentType, Decoder},
    types::{
        array::Array,
        builtin_kind::BuiltInKind,
        byte_string::ByteString,
        data_value::DataValue,
        date_time::DateTime,
        diagnostic_info::DiagnosticInfo,
        encoding::{DecodingOptions, EncodingOptions},
        error::{EncodingError, EncodingResult},
        expanded_node_id::ExpandedNodeId,
        extension_object::{ExtensionObject, ExtensionObjectBody},
        guid::Guid,
        localized_text::LocalizedText,
        matrix::Matrix,
        node_id::NodeId,
        qualified_name::QualifiedName,
        status_codes::StatusCode,
        string::{UAString, XmlElement},
        variant::Variant,
    },
};

use super::*;

enum Scope {
    /// Children are found by name
    Structure(VecDeque<XmlNode>),
    /// Children are taken in order
    Array(VecDeque<XmlNode>),
}

/// Reads values from the elements of an XML document.
pub struct XmlDecoder {
    options: DecodingOptions,
    /// Top level elements not read yet
    values: VecDeque<XmlNode>,
    stack: Vec<Scope>,
}

fn mismatch(kind: BuiltInKind, node: &XmlNode) -> EncodingError {
    error!("Cannot read {} from element {}", kind, node.name);
    EncodingError::type_mismatch(kind, format!("element {}", node.name))
}

fn parse_text<T: FromStr>(kind: BuiltInKind, node: &XmlNode) -> EncodingResult<T> {
    node.text().trim().parse::<T>().map_err(|_| {
        error!("Cannot read {} from text {}", kind, node.text());
        EncodingError::type_mismatch(kind, node.text())
    })
}

fn child_text<T: FromStr>(kind: BuiltInKind, node: &XmlNode, name: &str) -> EncodingResult<Option<T>> {
    node.child(name).map(|c| parse_text(kind, c)).transpose()
}

fn string_from_node(node: &XmlNode) -> UAString {
    if node.is_null() {
        UAString::null()
    } else {
        UAString::from(node.text())
    }
}

fn status_code_from_node(node: &XmlNode) -> EncodingResult<StatusCode> {
    Ok(child_text::<u32>(BuiltInKind::StatusCode, node, "Code")?
        .map_or(StatusCode::Good, StatusCode::from_bits_truncate))
}

impl XmlDecoder {
    /// Parses the whole document up front
    pub fn new(data: &[u8], options: DecodingOptions) -> EncodingResult<XmlDecoder> {
        let values = match parse_document(data, &options)? {
            None => VecDeque::new(),
            Some(root) if root.name == DOCUMENT_ELEMENT => root.children.into(),
            Some(root) => {
                debug!("Document root is {}, reading it as the only value", root.name);
                VecDeque::from(vec![root])
            }
        };
        Ok(XmlDecoder {
            options,
            values,
            stack: Vec::new(),
        })
    }

    /// Takes the element of the next value. Inside a structure it is the child named after the
    /// field, `None` if there is no such child.
    fn next_node(&mut self, field: Option<&str>) -> EncodingResult<Option<XmlNode>> {
        match self.stack.last_mut() {
            None => self
                .values
                .pop_front()
                .map(Some)
                .ok_or(EncodingError::UnexpectedEof),
            Some(Scope::Structure(children)) => Ok(match field {
                Some(field) => children
                    .iter()
                    .position(|c| c.name == field)
                    .and_then(|i| children.remove(i)),
                None => children.pop_front(),
            }),
            Some(Scope::Array(children)) => match children.pop_front() {
                Some(node) => Ok(Some(node)),
                None => {
                    error!("Read past the end of an XML array");
                    Err(EncodingError::UnexpectedEof)
                }
            },
        }
    }

    fn enter(&self) -> EncodingResult<()> {
        if self.stack.len() >= self.options.max_depth() {
            warn!("Decoding aborted due maximum nesting depth being reached");
            Err(StatusCode::BadDecodingError.into())
        } else {
            Ok(())
        }
    }

    fn check_array_length(&self, len: usize) -> EncodingResult<()> {
        if len > self.options.max_array_length {
            error!(
                "Array length {} exceeds decoding limit {}",
                len, self.options.max_array_length
            );
            Err(StatusCode::BadEncodingLimitsExceeded.into())
        } else {
            Ok(())
        }
    }

    fn check_length(&self, len: usize, limit: usize) -> EncodingResult<()> {
        if len > limit {
            error!("String length {} exceeds decoding limit {}", len, limit);
            Err(StatusCode::BadDecodingError.into())
        } else {
            Ok(())
        }
    }

    /// Reads an element that is known to hold the kind. A null element is the null value.
    fn node_to_scalar(&self, kind: BuiltInKind, node: &XmlNode) -> EncodingResult<Variant> {
        if node.is_null() {
            return Ok(Variant::default_for(kind));
        }
        let value = match kind {
            BuiltInKind::Boolean => match node.text().trim() {
                "true" | "1" => Variant::Boolean(true),
                "false" | "0" => Variant::Boolean(false),
                _ => return Err(mismatch(kind, node)),
            },
            BuiltInKind::SByte => Variant::SByte(parse_text(kind, node)?),
            BuiltInKind::Byte => Variant::Byte(parse_text(kind, node)?),
            BuiltInKind::Int16 => Variant::Int16(parse_text(kind, node)?),
            BuiltInKind::UInt16 => Variant::UInt16(parse_text(kind, node)?),
            BuiltInKind::Int32 => Variant::Int32(parse_text(kind, node)?),
            BuiltInKind::UInt32 => Variant::UInt32(parse_text(kind, node)?),
            BuiltInKind::Int64 => Variant::Int64(parse_text(kind, node)?),
            BuiltInKind::UInt64 => Variant::UInt64(parse_text(kind, node)?),
            BuiltInKind::Float => Variant::Float(float_from_text(kind, node.text())? as f32),
            BuiltInKind::Double => Variant::Double(float_from_text(kind, node.text())?),
            BuiltInKind::String => {
                self.check_length(node.text().len(), self.options.max_string_length)?;
                Variant::String(string_from_node(node))
            }
            BuiltInKind::DateTime => {
                Variant::from(DateTime::parse_iso8601(node.text().trim())?)
            }
            BuiltInKind::Guid => Variant::from(Guid::from_str(node.text().trim())?),
            BuiltInKind::ByteString => {
                let value = ByteString::from_base64(node.text().trim())?;
                self.check_length(value.value.as_ref().map_or(0, Vec::len), self.options.max_byte_string_length)?;
                Variant::ByteString(value)
            }
            BuiltInKind::XmlElement => {
                self.check_length(node.text().len(), self.options.max_string_length)?;
                Variant::XmlElement(XmlElement::from(string_from_node(node)))
            }
            BuiltInKind::NodeId => Variant::from(match node.child("Identifier") {
                Some(id) => NodeId::from_str(id.text().trim())?,
                None => NodeId::null(),
            }),
            BuiltInKind::ExpandedNodeId => Variant::from(match node.child("Identifier") {
                Some(id) => ExpandedNodeId::from_str(id.text().trim())?,
                None => ExpandedNodeId::null(),
            }),
            BuiltInKind::StatusCode => Variant::StatusCode(status_code_from_node(node)?),
            BuiltInKind::QualifiedName => Variant::from(QualifiedName {
                namespace_index: child_text(BuiltInKind::UInt16, node, "NamespaceIndex")?
                    .unwrap_or(0),
                name: node.child("Name").map_or_else(UAString::null, string_from_node),
            }),
            BuiltInKind::LocalizedText => Variant::from(LocalizedText {
                locale: node.child("Locale").map_or_else(UAString::null, string_from_node),
                text: node.child("Text").map_or_else(UAString::null, string_from_node),
            }),
            BuiltInKind::ExtensionObject => Variant::from(self.node_to_extension_object(node)?),
            BuiltInKind::DataValue => Variant::from(self.node_to_data_value(node)?),
            BuiltInKind::Variant => Variant::Variant(Box::new(self.node_to_variant(node)?)),
            BuiltInKind::DiagnosticInfo => Variant::from(self.node_to_diagnostic_info(node)?),
            BuiltInKind::Null | BuiltInKind::Encodeable => return Err(mismatch(kind, node)),
        };
        Ok(value)
    }

    /// Elements of a `Variant` array are variants, anything else is a plain value
    fn node_to_element(&self, kind: BuiltInKind, node: &XmlNode) -> EncodingResult<Variant> {
        if kind == BuiltInKind::Variant {
            self.node_to_variant(node)
        } else {
            self.node_to_scalar(kind, node)
        }
    }

    fn node_to_elements(&self, kind: BuiltInKind, node: &XmlNode) -> EncodingResult<Vec<Variant>> {
        self.check_array_length(node.children.len())?;
        node.children
            .iter()
            .map(|c| self.node_to_element(kind, c))
            .collect()
    }

    /// Reads `<Dimensions>` and `<Elements>`. Without a kind, the kind is taken from the name
    /// of the first element.
    fn node_to_matrix(&self, kind: Option<BuiltInKind>, node: &XmlNode) -> EncodingResult<Matrix> {
        let dimensions = match node.child("Dimensions") {
            Some(dimensions) => dimensions
                .children
                .iter()
                .map(|d| parse_text::<u32>(BuiltInKind::Int32, d))
                .collect::<EncodingResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        let elements = node.child("Elements");
        let kind = match (kind, elements.and_then(|e| e.children.first())) {
            (Some(kind), _) => kind,
            (None, Some(first)) => BuiltInKind::from_str(&first.name)?,
            (None, None) => BuiltInKind::Variant,
        };
        let values = match elements {
            Some(elements) => self.node_to_elements(kind, elements)?,
            None => Vec::new(),
        };
        Matrix::from_variants(kind, values, dimensions)
    }

    /// A variant element holds one child named after the kind of its value, or nothing when
    /// it is empty
    fn node_to_variant(&self, node: &XmlNode) -> EncodingResult<Variant> {
        let _depth_lock = self.options.depth_lock()?;
        let child = match node.children.first() {
            None => return Ok(Variant::Empty),
            Some(child) => child,
        };
        if child.name == "Matrix" {
            Ok(Variant::from(self.node_to_matrix(None, child)?))
        } else if let Some(kind) = child.name.strip_prefix("ListOf") {
            let kind = BuiltInKind::from_str(kind)?;
            let values = self.node_to_elements(kind, child)?;
            Ok(Variant::from(Array::new(kind, values)?))
        } else {
            let kind = BuiltInKind::from_str(&child.name)?;
            if kind == BuiltInKind::Null {
                Ok(Variant::Empty)
            } else {
                self.node_to_scalar(kind, child)
            }
        }
    }

    fn node_to_data_value(&self, node: &XmlNode) -> EncodingResult<DataValue> {
        let date_time = |name: &str| -> EncodingResult<Option<DateTime>> {
            node.child(name)
                .map(|c| DateTime::parse_iso8601(c.text().trim()))
                .transpose()
        };
        Ok(DataValue {
            value: node
                .child("Value")
                .map(|c| self.node_to_variant(c))
                .transpose()?,
            status: node
                .child("StatusCode")
                .map(status_code_from_node)
                .transpose()?,
            source_timestamp: date_time("SourceTimestamp")?,
            source_picoseconds: child_text(BuiltInKind::UInt16, node, "SourcePicoseconds")?,
            server_timestamp: date_time("ServerTimestamp")?,
            server_picoseconds: child_text(BuiltInKind::UInt16, node, "ServerPicoseconds")?,
        })
    }

    fn node_to_diagnostic_info(&self, node: &XmlNode) -> EncodingResult<DiagnosticInfo> {
        let _depth_lock = self.options.depth_lock()?;
        Ok(DiagnosticInfo {
            symbolic_id: child_text(BuiltInKind::Int32, node, "SymbolicId")?,
            namespace_uri: child_text(BuiltInKind::Int32, node, "NamespaceUri")?,
            locale: child_text(BuiltInKind::Int32, node, "Locale")?,
            localized_text: child_text(BuiltInKind::Int32, node, "LocalizedText")?,
            additional_info: node.child("AdditionalInfo").map(string_from_node),
            inner_status_code: node
                .child("InnerStatusCode")
                .map(status_code_from_node)
                .transpose()?,
            inner_diagnostic_info: match node.child("InnerDiagnosticInfo") {
                Some(c) => Some(Box::new(self.node_to_diagnostic_info(c)?)),
                None => None,
            },
        })
    }

    /// A structure body of a known type is turned back into its binary encoding. Other bodies
    /// are kept in the encoding they arrived in.
    fn node_to_extension_object(&self, node: &XmlNode) -> EncodingResult<ExtensionObject> {
        let _depth_lock = self.options.depth_lock()?;
        let type_id = match node.child("TypeId").and_then(|t| t.child("Identifier")) {
            Some(id) => NodeId::from_str(id.text().trim())?,
            None => return Ok(ExtensionObject::null()),
        };
        let body = match node.child("Body").and_then(|b| b.children.first()) {
            None => ExtensionObjectBody::None,
            Some(body) if body.name == "ByteString" => {
                ExtensionObjectBody::Binary(ByteString::from_base64(body.text().trim())?)
            }
            Some(body) if body.name == "XmlElement" => {
                ExtensionObjectBody::Xml(XmlElement::from(string_from_node(body)))
            }
            Some(body) if body.name == "Json" => ExtensionObjectBody::Json(body.text().to_string()),
            Some(body) => {
                let description = TypeCatalogue::global().by_type_id(&type_id);
                match description {
                    Some(description) => {
                        let bytes = self.node_to_structure_bytes(&description, body)?;
                        return Ok(ExtensionObject {
                            node_id: description.encoding_id.clone(),
                            body: ExtensionObjectBody::Binary(bytes.into()),
                        });
                    }
                    None => {
                        debug!("Type {} is not in the catalogue, keeping its XML body", type_id);
                        ExtensionObjectBody::Xml(XmlElement::from(UAString::from(body.to_xml()?)))
                    }
                }
            }
        };
        Ok(ExtensionObject {
            node_id: type_id,
            body,
        })
    }

    /// Reads the fields of a structure from its element and writes them in the binary encoding
    fn node_to_structure_bytes(
        &self,
        description: &TypeDescription,
        node: &XmlNode,
    ) -> EncodingResult<Vec<u8>> {
        let mut decoder = XmlDecoder {
            options: self.options.clone(),
            values: VecDeque::new(),
            stack: vec![Scope::Structure(node.children.iter().cloned().collect())],
        };
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions {
            max_depth: self.options.max_depth(),
            max_array_length: self.options.max_array_length,
        });
        transcode_fields(description, &mut decoder, &mut encoder)?;
        Ok(encoder.into_bytes())
    }
}

impl Decoder for XmlDecoder {
    fn content_type(&self) -> ContentType {
        ContentType::Xml
    }

    fn read_scalar(&mut self, field: Option<&str>, kind: BuiltInKind) -> EncodingResult<Variant> {
        match self.next_node(field)? {
            None => Ok(Variant::default_for(kind)),
            Some(node) => self.node_to_scalar(kind, &node),
        }
    }

    fn read_variant(&mut self, field: Option<&str>) -> EncodingResult<Variant> {
        if self.at_end() {
            return Ok(Variant::Empty);
        }
        match self.next_node(field)? {
            None => Ok(Variant::Empty),
            Some(node) => self.node_to_variant(&node),
        }
    }

    fn read_array(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Vec<Variant>>> {
        match self.next_node(field)? {
            None => Ok(None),
            Some(node) if node.is_null() => Ok(None),
            Some(node) => self.node_to_elements(kind, &node).map(Some),
        }
    }

    fn read_matrix(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Matrix>> {
        match self.next_node(field)? {
            None => Ok(None),
            Some(node) if node.is_null() => Ok(None),
            Some(node) => self.node_to_matrix(Some(kind), &node).map(Some),
        }
    }

    fn push_structure(&mut self, field: Option<&str>, _type_name: &str) -> EncodingResult<bool> {
        self.enter()?;
        match self.next_node(field)? {
            None => Ok(false),
            Some(node) if node.is_null() => Ok(false),
            Some(node) => {
                self.stack.push(Scope::Structure(node.children.into()));
                Ok(true)
            }
        }
    }

    fn pop_structure(&mut self) -> EncodingResult<()> {
        match self.stack.pop() {
            Some(Scope::Structure(_)) => Ok(()),
            _ => {
                error!("pop_structure does not match an open structure");
                Err(StatusCode::BadDecodingError.into())
            }
        }
    }

    fn push_array(
        &mut self,
        field: Option<&str>,
        _type_name: &str,
    ) -> EncodingResult<Option<usize>> {
        self.enter()?;
        match self.next_node(field)? {
            None => Ok(None),
            Some(node) if node.is_null() => Ok(None),
            Some(node) => {
                self.check_array_length(node.children.len())?;
                let len = node.children.len();
                self.stack.push(Scope::Array(node.children.into()));
                Ok(Some(len))
            }
        }
    }

    fn pop_array(&mut self) -> EncodingResult<()> {
        match self.stack.pop() {
            Some(Scope::Array(_)) => Ok(()),
            _ => {
                error!("pop_array does not match an open array");
                Err(StatusCode::BadDecodingError.into())
            }
        }
    }

    fn at_end(&self) -> bool {
        self.stack.is_empty() && self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(xml: &str) -> XmlDecoder {
        XmlDecoder::new(xml.as_bytes(), DecodingOptions::test()).unwrap()
    }

    #[test]
    fn xml_read_fields_by_name() {
        let mut d = decoder(
            "<UaDocument><Item><B>2</B><A>1</A><S Null=\"true\"/></Item></UaDocument>",
        );
        assert!(d.push_structure(Some("Item"), "Item").unwrap());
        assert_eq!(d.read_int32(Some("A")).unwrap(), 1);
        assert_eq!(d.read_int32(Some("B")).unwrap(), 2);
        assert_eq!(d.read_int32(Some("C")).unwrap(), 0);
        assert!(d.read_string(Some("S")).unwrap().is_null());
        d.pop_structure().unwrap();
        assert!(d.at_end());
        assert_eq!(d.read_variant(None).unwrap(), Variant::Empty);
        assert!(matches!(
            d.read_int32(None),
            Err(EncodingError::UnexpectedEof)
        ));
    }

    #[test]
    fn xml_read_variants() {
        let mut d = decoder(
            "<UaDocument>\
             <Value><Double>INF</Double></Value>\
             <Value><ListOfString><String>a</String><String Null=\"true\"/></ListOfString></Value>\
             <Value/>\
             </UaDocument>",
        );
        assert_eq!(d.read_variant(None).unwrap(), Variant::Double(f64::INFINITY));
        assert_eq!(
            d.read_variant(None).unwrap(),
            Variant::from(Array::new(BuiltInKind::String, vec![Variant::from("a"), Variant::String(UAString::null())]).unwrap())
        );
        assert_eq!(d.read_variant(None).unwrap(), Variant::Empty);
    }

    #[test]
    fn xml_type_mismatch() {
        let mut d = decoder("<UaDocument><Int32>abc</Int32><Value><Bogus>1</Bogus></Value></UaDocument>");
        assert!(matches!(
            d.read_int32(None),
            Err(EncodingError::TypeMismatch { .. })
        ));
        assert!(d.read_variant(None).is_err());
    }

    #[test]
    fn xml_deeply_nested_document() {
        let depth = 500_000;
        let xml = format!(
            "<UaDocument>{}{}</UaDocument>",
            "<a>".repeat(depth),
            "</a>".repeat(depth)
        );
        let result = XmlDecoder::new(xml.as_bytes(), DecodingOptions::test());
        assert!(matches!(result, Err(EncodingError::Status(StatusCode::BadDecodingError))));
    }

    #[test]
    fn xml_invalid_matrix_shape() {
        let mut d = decoder(
            "<UaDocument><M><Dimensions><Int32>2</Int32><Int32>2</Int32></Dimensions>\
             <Elements><Int32>1</Int32><Int32>2</Int32><Int32>3</Int32></Elements></M></UaDocument>",
        );
        assert!(matches!(
            d.read_matrix(Some("M"), BuiltInKind::Int32),
            Err(EncodingError::InvalidShape { .. })
        ));
    }
}
