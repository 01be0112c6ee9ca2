// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use crate::{
    catalogue::{TypeCatalogue, TypeDescription},
    codec::{binary::BinaryStreamDecoder, transcode::transcode_fields, ContentType, Encoder},
    types::{
        array::values_are_of_kind,
        builtin_kind::BuiltInKind,
        constants,
        data_value::DataValue,
        diagnostic_info::DiagnosticInfo,
        encoding::{DecodingOptions, EncodingOptions},
        error::EncodingResult,
        extension_object::{ExtensionObject, ExtensionObjectBody},
        matrix::Matrix,
        status_codes::StatusCode,
        string::UAString,
        variant::Variant,
    },
};

use super::*;

/// Writes values as elements of one XML document.
pub struct XmlEncoder {
    options: EncodingOptions,
    /// Open elements, the first is the document root
    stack: Vec<XmlNode>,
    /// Nesting that belongs to an enclosing value, when encoding the body of an extension object
    base_depth: usize,
}

impl XmlEncoder {
    pub fn new(options: EncodingOptions) -> XmlEncoder {
        XmlEncoder {
            options,
            stack: vec![XmlNode::new(DOCUMENT_ELEMENT)],
            base_depth: 0,
        }
    }

    fn depth(&self) -> usize {
        self.base_depth + self.stack.len() - 1
    }

    fn put(&mut self, node: XmlNode) -> EncodingResult<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                Ok(())
            }
            None => {
                error!("XML document has no open element");
                Err(StatusCode::BadEncodingError.into())
            }
        }
    }

    fn close(&mut self) -> EncodingResult<()> {
        if self.stack.len() <= 1 {
            error!("Scope closed without a matching push");
            return Err(StatusCode::BadEncodingError.into());
        }
        match self.stack.pop() {
            Some(node) => self.put(node),
            None => Err(StatusCode::BadEncodingError.into()),
        }
    }

    fn string_node(name: &str, value: &UAString) -> XmlNode {
        match value.value() {
            Some(v) => XmlNode::with_text(name, v.as_str()),
            None => XmlNode::null(name),
        }
    }

    fn status_code_node(name: &str, value: StatusCode) -> XmlNode {
        XmlNode::new(name).with_child(XmlNode::with_text("Code", value.bits().to_string()))
    }

    /// The element of a scalar of its own kind
    fn value_to_node(&self, name: &str, value: &Variant, depth: usize) -> EncodingResult<XmlNode> {
        self.options.check_depth(depth)?;
        let node = match value {
            Variant::Empty => XmlNode::new(name),
            Variant::Boolean(v) => XmlNode::with_text(name, v.to_string()),
            Variant::SByte(v) => XmlNode::with_text(name, v.to_string()),
            Variant::Byte(v) => XmlNode::with_text(name, v.to_string()),
            Variant::Int16(v) => XmlNode::with_text(name, v.to_string()),
            Variant::UInt16(v) => XmlNode::with_text(name, v.to_string()),
            Variant::Int32(v) => XmlNode::with_text(name, v.to_string()),
            Variant::UInt32(v) => XmlNode::with_text(name, v.to_string()),
            Variant::Int64(v) => XmlNode::with_text(name, v.to_string()),
            Variant::UInt64(v) => XmlNode::with_text(name, v.to_string()),
            Variant::Float(v) => {
                let text = if v.is_finite() {
                    v.to_string()
                } else {
                    float_to_text(*v as f64)
                };
                XmlNode::with_text(name, text)
            }
            Variant::Double(v) => XmlNode::with_text(name, float_to_text(*v)),
            Variant::String(v) => Self::string_node(name, v),
            Variant::DateTime(v) => XmlNode::with_text(name, v.to_iso8601()),
            Variant::Guid(v) => XmlNode::with_text(name, v.to_string()),
            Variant::ByteString(v) => {
                if v.is_null() {
                    XmlNode::null(name)
                } else {
                    XmlNode::with_text(name, v.as_base64())
                }
            }
            Variant::XmlElement(v) => Self::string_node(name, v.as_ua_string()),
            Variant::NodeId(v) => XmlNode::new(name)
                .with_child(XmlNode::with_text("Identifier", v.to_string())),
            Variant::ExpandedNodeId(v) => XmlNode::new(name)
                .with_child(XmlNode::with_text("Identifier", v.to_string())),
            Variant::StatusCode(v) => Self::status_code_node(name, *v),
            Variant::QualifiedName(v) => {
                let mut node = XmlNode::new(name).with_child(XmlNode::with_text(
                    "NamespaceIndex",
                    v.namespace_index.to_string(),
                ));
                if !v.name.is_null() {
                    node.children.push(Self::string_node("Name", &v.name));
                }
                node
            }
            Variant::LocalizedText(v) => {
                let mut node = XmlNode::new(name);
                if !v.locale.is_null() {
                    node.children.push(Self::string_node("Locale", &v.locale));
                }
                if !v.text.is_null() {
                    node.children.push(Self::string_node("Text", &v.text));
                }
                node
            }
            Variant::ExtensionObject(v) => self.extension_object_to_node(name, v, depth)?,
            Variant::DataValue(v) => self.data_value_to_node(name, v, depth)?,
            Variant::Variant(v) => self.variant_to_node(name, v, depth + 1)?,
            Variant::DiagnosticInfo(v) => self.diagnostic_info_to_node(name, v, depth)?,
            Variant::Array(array) => {
                self.array_to_node(name, array.value_type, &array.values, depth + 1)?
            }
            Variant::Matrix(matrix) => self.matrix_to_node(name, matrix, depth + 1)?,
        };
        Ok(node)
    }

    /// Elements of a `Variant` array are variants, anything else is a plain value
    fn element_to_node(
        &self,
        kind: BuiltInKind,
        value: &Variant,
        depth: usize,
    ) -> EncodingResult<XmlNode> {
        if kind == BuiltInKind::Variant {
            self.variant_to_node(kind.name(), value, depth)
        } else {
            self.value_to_node(kind.name(), value, depth)
        }
    }

    fn array_to_node(
        &self,
        name: &str,
        kind: BuiltInKind,
        values: &[Variant],
        depth: usize,
    ) -> EncodingResult<XmlNode> {
        self.options.check_array_length(values.len())?;
        let mut node = XmlNode::new(name);
        for value in values {
            node.children.push(self.element_to_node(kind, value, depth)?);
        }
        Ok(node)
    }

    /// `<Dimensions>` holding one `<Int32>` per dimension, then `<Elements>`
    fn matrix_to_node(&self, name: &str, matrix: &Matrix, depth: usize) -> EncodingResult<XmlNode> {
        self.options.check_array_length(matrix.len())?;
        let mut dimensions = XmlNode::new("Dimensions");
        for dimension in matrix.dimensions() {
            dimensions
                .children
                .push(XmlNode::with_text("Int32", dimension.to_string()));
        }
        let elements = self.array_to_node("Elements", matrix.kind(), &matrix.to_variants(), depth)?;
        Ok(XmlNode::new(name).with_child(dimensions).with_child(elements))
    }

    /// A variant is an element holding one child named after the kind of the value. An empty
    /// variant has no child.
    fn variant_to_node(&self, name: &str, value: &Variant, depth: usize) -> EncodingResult<XmlNode> {
        self.options.check_depth(depth)?;
        let node = XmlNode::new(name);
        let child = match value {
            Variant::Empty => return Ok(node),
            Variant::Array(array) => self.array_to_node(
                &list_name(array.value_type),
                array.value_type,
                &array.values,
                depth + 1,
            )?,
            Variant::Matrix(matrix) => self.matrix_to_node("Matrix", matrix, depth + 1)?,
            Variant::Variant(inner) => self.variant_to_node("Variant", inner, depth + 1)?,
            value => self.value_to_node(value.kind().name(), value, depth)?,
        };
        Ok(node.with_child(child))
    }

    fn data_value_to_node(
        &self,
        name: &str,
        value: &DataValue,
        depth: usize,
    ) -> EncodingResult<XmlNode> {
        let mut node = XmlNode::new(name);
        if let Some(ref v) = value.value {
            node.children.push(self.variant_to_node("Value", v, depth + 1)?);
        }
        if let Some(v) = value.status {
            node.children.push(Self::status_code_node("StatusCode", v));
        }
        if let Some(ref v) = value.source_timestamp {
            node.children
                .push(XmlNode::with_text("SourceTimestamp", v.to_iso8601()));
        }
        if let Some(v) = value.source_picoseconds {
            node.children
                .push(XmlNode::with_text("SourcePicoseconds", v.to_string()));
        }
        if let Some(ref v) = value.server_timestamp {
            node.children
                .push(XmlNode::with_text("ServerTimestamp", v.to_iso8601()));
        }
        if let Some(v) = value.server_picoseconds {
            node.children
                .push(XmlNode::with_text("ServerPicoseconds", v.to_string()));
        }
        Ok(node)
    }

    fn diagnostic_info_to_node(
        &self,
        name: &str,
        value: &DiagnosticInfo,
        depth: usize,
    ) -> EncodingResult<XmlNode> {
        self.options.check_depth(depth)?;
        let mut node = XmlNode::new(name);
        let indexes = [
            ("SymbolicId", value.symbolic_id),
            ("NamespaceUri", value.namespace_uri),
            ("Locale", value.locale),
            ("LocalizedText", value.localized_text),
        ];
        for (key, index) in indexes.iter() {
            if let Some(index) = index {
                node.children.push(XmlNode::with_text(*key, index.to_string()));
            }
        }
        if let Some(ref v) = value.additional_info {
            node.children.push(Self::string_node("AdditionalInfo", v));
        }
        if let Some(v) = value.inner_status_code {
            node.children.push(Self::status_code_node("InnerStatusCode", v));
        }
        if let Some(ref v) = value.inner_diagnostic_info {
            node.children
                .push(self.diagnostic_info_to_node("InnerDiagnosticInfo", v, depth + 1)?);
        }
        Ok(node)
    }

    /// `<TypeId>` then `<Body>`. A known binary body is written as the structure, named after
    /// its type. Other bodies are forwarded in an element named after their encoding.
    fn extension_object_to_node(
        &self,
        name: &str,
        value: &ExtensionObject,
        depth: usize,
    ) -> EncodingResult<XmlNode> {
        let node = XmlNode::new(name);
        if value.is_null() {
            return Ok(node);
        }
        let type_id = |id: &dyn std::fmt::Display| {
            XmlNode::new("TypeId").with_child(XmlNode::with_text("Identifier", id.to_string()))
        };
        let body = match value.body {
            ExtensionObjectBody::None => None,
            ExtensionObjectBody::Binary(ref body) => {
                let description = TypeCatalogue::global().by_type_id(&value.node_id);
                if let Some(description) = description {
                    let body_bytes = body.value.as_deref().unwrap_or(&[]);
                    let structure = self.structure_to_node(&description, body_bytes, depth + 1)?;
                    return Ok(node
                        .with_child(type_id(&description.data_type_id))
                        .with_child(XmlNode::new("Body").with_child(structure)));
                }
                debug!(
                    "Type {} is not in the catalogue, forwarding its binary body",
                    value.node_id
                );
                Some(XmlNode::with_text("ByteString", body.as_base64()))
            }
            ExtensionObjectBody::Xml(ref body) => {
                Some(Self::string_node("XmlElement", body.as_ua_string()))
            }
            ExtensionObjectBody::Json(ref body) => Some(XmlNode::with_text("Json", body.as_str())),
        };
        let mut node = node.with_child(type_id(&value.node_id));
        if let Some(body) = body {
            node.children.push(XmlNode::new("Body").with_child(body));
        }
        Ok(node)
    }

    /// Reads the binary body of a structure field by field and writes it as an element
    fn structure_to_node(
        &self,
        description: &TypeDescription,
        body: &[u8],
        depth: usize,
    ) -> EncodingResult<XmlNode> {
        self.options.check_depth(depth)?;
        let decoding_options = DecodingOptions::with_limits(
            constants::MAX_STRING_LENGTH,
            constants::MAX_BYTE_STRING_LENGTH,
            self.options.max_array_length,
            self.options.max_depth.saturating_sub(depth),
        );
        let mut decoder = BinaryStreamDecoder::new(body, decoding_options);
        let mut encoder = XmlEncoder {
            options: self.options.clone(),
            stack: vec![XmlNode::new(description.name)],
            base_depth: depth,
        };
        transcode_fields(description, &mut decoder, &mut encoder)?;
        match encoder.stack.pop() {
            Some(node) if encoder.stack.is_empty() => Ok(node),
            _ => {
                error!("Structure {} left scopes open", description.name);
                Err(StatusCode::BadEncodingError.into())
            }
        }
    }
}

impl Encoder for XmlEncoder {
    fn content_type(&self) -> ContentType {
        ContentType::Xml
    }

    fn write_scalar(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()> {
        match value {
            Variant::Array(array) => {
                self.write_array(field, array.value_type, Some(array.values.as_slice()))
            }
            Variant::Matrix(matrix) => self.write_matrix(field, matrix),
            value => {
                let name = field.unwrap_or_else(|| value.kind().name());
                let node = self.value_to_node(name, value, self.depth())?;
                self.put(node)
            }
        }
    }

    fn write_variant(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()> {
        let name = field.unwrap_or("Variant");
        let node = self.variant_to_node(name, value, self.depth())?;
        self.put(node)
    }

    fn write_array(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
        values: Option<&[Variant]>,
    ) -> EncodingResult<()> {
        let name = field.map_or_else(|| list_name(kind), str::to_string);
        let node = match values {
            None => XmlNode::null(name),
            Some(values) => {
                values_are_of_kind(values, kind)?;
                self.array_to_node(&name, kind, values, self.depth() + 1)?
            }
        };
        self.put(node)
    }

    fn write_matrix(&mut self, field: Option<&str>, value: &Matrix) -> EncodingResult<()> {
        let node = self.matrix_to_node(field.unwrap_or("Matrix"), value, self.depth() + 1)?;
        self.put(node)
    }

    fn push_structure(&mut self, field: Option<&str>, type_name: &str) -> EncodingResult<()> {
        self.options.check_depth(self.depth() + 1)?;
        self.stack.push(XmlNode::new(field.unwrap_or(type_name)));
        Ok(())
    }

    fn pop_structure(&mut self) -> EncodingResult<()> {
        self.close()
    }

    fn push_array(
        &mut self,
        field: Option<&str>,
        type_name: &str,
        len: usize,
    ) -> EncodingResult<()> {
        self.options.check_array_length(len)?;
        self.options.check_depth(self.depth() + 1)?;
        let name = field.map_or_else(|| format!("ListOf{}", type_name), str::to_string);
        self.stack.push(XmlNode::new(name));
        Ok(())
    }

    fn pop_array(&mut self) -> EncodingResult<()> {
        self.close()
    }

    fn write_null_array(&mut self, field: Option<&str>) -> EncodingResult<()> {
        self.put(XmlNode::null(field.unwrap_or("Null")))
    }

    fn finish(self: Box<Self>) -> EncodingResult<Vec<u8>> {
        if self.stack.len() != 1 {
            error!(
                "Encoder finished with {} scopes still open",
                self.stack.len().saturating_sub(1)
            );
            return Err(StatusCode::BadEncodingError.into());
        }
        write_document(&self.stack[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{localized_text::LocalizedText, node_id::NodeId};

    fn encode<F>(f: F) -> String
    where
        F: FnOnce(&mut dyn Encoder) -> EncodingResult<()>,
    {
        let mut encoder = Box::new(XmlEncoder::new(EncodingOptions::default()));
        f(encoder.as_mut()).unwrap();
        String::from_utf8(encoder.finish().unwrap()).unwrap()
    }

    #[test]
    fn xml_element_names() {
        let xml = encode(|e| {
            e.write_int32(Some("Count"), 5)?;
            e.write_int32(None, 6)?;
            e.write_variant(Some("Value"), &Variant::from(7i32))?;
            e.write_string_array(None, None)?;
            e.write_uint16_array(Some("Sizes"), Some(&[1, 2]))
        });
        assert!(xml.contains("<UaDocument><Count>5</Count><Int32>6</Int32>"));
        assert!(xml.contains("<Value><Int32>7</Int32></Value>"));
        assert!(xml.contains("<ListOfString Null=\"true\"/>"));
        assert!(xml.contains("<Sizes><UInt16>1</UInt16><UInt16>2</UInt16></Sizes></UaDocument>"));
    }

    #[test]
    fn xml_structured_values() {
        let xml = encode(|e| {
            e.write_node_id(Some("Id"), &NodeId::new(2, "pump"))?;
            e.write_localized_text(Some("Text"), &LocalizedText::new("en", "Pump"))?;
            e.write_variant(
                Some("Matrix"),
                &Variant::from(Matrix::new(vec![1u8, 2], vec![1u32, 2]).unwrap()),
            )
        });
        assert!(xml.contains("<Id><Identifier>ns=2;s=pump</Identifier></Id>"));
        assert!(xml.contains("<Text><Locale>en</Locale><Text>Pump</Text></Text>"));
        assert!(xml.contains(
            "<Matrix><Matrix><Dimensions><Int32>1</Int32><Int32>2</Int32></Dimensions><Elements><Byte>1</Byte><Byte>2</Byte></Elements></Matrix></Matrix>"
        ));
    }

    #[test]
    fn xml_unbalanced_scopes() {
        let mut encoder = Box::new(XmlEncoder::new(EncodingOptions::default()));
        assert!(encoder.pop_structure().is_err());
        encoder.push_array(None, "Argument", 0).unwrap();
        assert!(encoder.finish().is_err());
    }
}
