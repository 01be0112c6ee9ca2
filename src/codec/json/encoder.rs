// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use serde_json::{Map, Value};

use crate::{
    catalogue::{TypeCatalogue, TypeDescription},
    codec::{
        binary::BinaryStreamDecoder, transcode::transcode_fields, ContentType, Encoder,
    },
    types::{
        array::values_are_of_kind,
        builtin_kind::BuiltInKind,
        constants,
        data_value::DataValue,
        diagnostic_info::DiagnosticInfo,
        encoding::{DecodingOptions, EncodingOptions},
        error::EncodingResult,
        extension_object::{ExtensionObject, ExtensionObjectBody},
        localized_text::LocalizedText,
        matrix::Matrix,
        qualified_name::QualifiedName,
        status_codes::StatusCode,
        variant::Variant,
    },
};

use super::*;

enum Scope {
    Structure {
        field: Option<String>,
        fields: Map<String, Value>,
    },
    Array {
        field: Option<String>,
        values: Vec<Value>,
    },
}

/// Writes values as JSON. Every top level value becomes one document, documents are separated
/// by a newline.
pub struct JsonEncoder {
    options: JsonOptions,
    encoding_options: EncodingOptions,
    stack: Vec<Scope>,
    /// Nesting that belongs to an enclosing value, when encoding the body of an extension object
    base_depth: usize,
    output: Vec<u8>,
}

impl JsonEncoder {
    pub fn new(options: JsonOptions, encoding_options: EncodingOptions) -> JsonEncoder {
        JsonEncoder {
            options,
            encoding_options,
            stack: Vec::new(),
            base_depth: 0,
            output: Vec::new(),
        }
    }

    pub fn options(&self) -> JsonOptions {
        self.options
    }

    fn depth(&self) -> usize {
        self.base_depth + self.stack.len()
    }

    /// Places a value into the enclosing scope, or writes it as a document
    fn put(&mut self, field: Option<&str>, value: Value) -> EncodingResult<()> {
        match self.stack.last_mut() {
            None => self.write_document(field, value),
            Some(Scope::Structure { fields, .. }) => match field {
                Some(_) if value.is_null() => Ok(()),
                Some(field) => {
                    fields.insert(field.to_string(), value);
                    Ok(())
                }
                None => {
                    error!("A value inside a structure must have a field name");
                    Err(StatusCode::BadEncodingError.into())
                }
            },
            Some(Scope::Array { values, .. }) => {
                values.push(value);
                Ok(())
            }
        }
    }

    fn write_document(&mut self, field: Option<&str>, value: Value) -> EncodingResult<()> {
        let document = match field {
            Some(field) if !self.options.reference => {
                let mut map = Map::new();
                map.insert(field.to_string(), value);
                Value::Object(map)
            }
            _ => value,
        };
        serde_json::to_writer(&mut self.output, &document).map_err(|err| {
            error!("Cannot write JSON document, {}", err);
            StatusCode::BadEncodingError
        })?;
        self.output.push(b'\n');
        Ok(())
    }

    /// The value of a scalar of its own kind. Arrays and matrices are their elements.
    fn value_to_json(&self, value: &Variant, depth: usize) -> EncodingResult<Value> {
        self.encoding_options.check_depth(depth)?;
        let reversible = self.options.reversible;
        let value = match value {
            Variant::Empty => Value::Null,
            Variant::Boolean(v) => Value::Bool(*v),
            Variant::SByte(v) => Value::from(*v),
            Variant::Byte(v) => Value::from(*v),
            Variant::Int16(v) => Value::from(*v),
            Variant::UInt16(v) => Value::from(*v),
            Variant::Int32(v) => Value::from(*v),
            Variant::UInt32(v) => Value::from(*v),
            Variant::Int64(v) => int64_to_json(*v as i128, reversible),
            Variant::UInt64(v) => int64_to_json(*v as i128, reversible),
            Variant::Float(v) => float_to_json(*v as f64),
            Variant::Double(v) => float_to_json(*v),
            Variant::String(v) => string_to_json(v),
            Variant::DateTime(v) => Value::String(v.to_iso8601()),
            Variant::Guid(v) => Value::String(v.to_string()),
            Variant::ByteString(v) => byte_string_to_json(v),
            Variant::XmlElement(v) => string_to_json(v.as_ua_string()),
            Variant::NodeId(v) => node_id_to_json(v),
            Variant::ExpandedNodeId(v) => expanded_node_id_to_json(v),
            Variant::StatusCode(v) => status_code_to_json(*v, reversible),
            Variant::QualifiedName(v) => self.qualified_name_to_json(v),
            Variant::LocalizedText(v) => self.localized_text_to_json(v),
            Variant::ExtensionObject(v) => self.extension_object_to_json(v, depth)?,
            Variant::DataValue(v) => self.data_value_to_json(v, depth)?,
            Variant::Variant(v) => self.variant_to_json(v, depth + 1)?,
            Variant::DiagnosticInfo(v) => self.diagnostic_info_to_json(v, depth)?,
            Variant::Array(array) => Value::Array(
                array
                    .values
                    .iter()
                    .map(|v| self.element_to_json(array.value_type, v, depth + 1))
                    .collect::<EncodingResult<Vec<_>>>()?,
            ),
            Variant::Matrix(matrix) => {
                let values = self.elements_to_json(matrix, depth + 1)?;
                nest(values, matrix.dimensions())
            }
        };
        Ok(value)
    }

    /// Elements of a `Variant` array are variants, anything else is a plain value
    fn element_to_json(
        &self,
        kind: BuiltInKind,
        value: &Variant,
        depth: usize,
    ) -> EncodingResult<Value> {
        if kind == BuiltInKind::Variant {
            self.variant_to_json(value, depth)
        } else {
            self.value_to_json(value, depth)
        }
    }

    fn elements_to_json(&self, matrix: &Matrix, depth: usize) -> EncodingResult<Vec<Value>> {
        matrix
            .to_variants()
            .iter()
            .map(|v| self.element_to_json(matrix.kind(), v, depth))
            .collect()
    }

    /// A reversible variant is `{"Type", "Body", "Dimensions"?}`, otherwise it is the bare value
    fn variant_to_json(&self, value: &Variant, depth: usize) -> EncodingResult<Value> {
        self.encoding_options.check_depth(depth)?;
        if value.is_empty() {
            return Ok(Value::Null);
        }
        if !self.options.reversible {
            return self.value_to_json(value, depth);
        }
        let mut map = Map::new();
        map.insert("Type".to_string(), Value::from(value.kind().type_id()));
        match value {
            Variant::Matrix(matrix) => {
                let values = self.elements_to_json(matrix, depth + 1)?;
                map.insert("Body".to_string(), nest(values, matrix.dimensions()));
                map.insert(
                    "Dimensions".to_string(),
                    Value::from(matrix.dimensions().to_vec()),
                );
            }
            value => {
                map.insert("Body".to_string(), self.value_to_json(value, depth)?);
            }
        }
        Ok(Value::Object(map))
    }

    fn qualified_name_to_json(&self, value: &QualifiedName) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        let mut map = Map::new();
        map.insert("Name".to_string(), string_to_json(&value.name));
        if value.namespace_index > 0 {
            let key = if self.options.reversible { "Uri" } else { "Index" };
            map.insert(key.to_string(), Value::from(value.namespace_index));
        }
        Value::Object(map)
    }

    fn localized_text_to_json(&self, value: &LocalizedText) -> Value {
        if !self.options.reversible {
            return string_to_json(&value.text);
        }
        if value.is_null() {
            return Value::Null;
        }
        let mut map = Map::new();
        if !value.locale.is_null() {
            map.insert("Locale".to_string(), string_to_json(&value.locale));
        }
        if !value.text.is_null() {
            map.insert("Text".to_string(), string_to_json(&value.text));
        }
        Value::Object(map)
    }

    /// Status codes inside a data value or diagnostic info keep their presence, so Good is
    /// written as a code rather than as null
    fn present_status_code_to_json(&self, value: StatusCode) -> Value {
        match status_code_to_json(value, self.options.reversible) {
            Value::Null => Value::from(0u32),
            v => v,
        }
    }

    fn data_value_to_json(&self, value: &DataValue, depth: usize) -> EncodingResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let mut map = Map::new();
        if let Some(ref v) = value.value {
            map.insert("Value".to_string(), self.variant_to_json(v, depth + 1)?);
        }
        if let Some(status) = value.status {
            map.insert(
                "StatusCode".to_string(),
                self.present_status_code_to_json(status),
            );
        }
        if let Some(ref v) = value.source_timestamp {
            map.insert("SourceTimestamp".to_string(), Value::String(v.to_iso8601()));
        }
        if let Some(v) = value.source_picoseconds {
            map.insert("SourcePicoseconds".to_string(), Value::from(v));
        }
        if let Some(ref v) = value.server_timestamp {
            map.insert("ServerTimestamp".to_string(), Value::String(v.to_iso8601()));
        }
        if let Some(v) = value.server_picoseconds {
            map.insert("ServerPicoseconds".to_string(), Value::from(v));
        }
        Ok(Value::Object(map))
    }

    fn diagnostic_info_to_json(
        &self,
        value: &DiagnosticInfo,
        depth: usize,
    ) -> EncodingResult<Value> {
        self.encoding_options.check_depth(depth)?;
        if value.is_null() {
            return Ok(Value::Null);
        }
        let mut map = Map::new();
        let indexes = [
            ("SymbolicId", value.symbolic_id),
            ("NamespaceUri", value.namespace_uri),
            ("Locale", value.locale),
            ("LocalizedText", value.localized_text),
        ];
        for (key, index) in indexes.iter() {
            if let Some(index) = index {
                map.insert(key.to_string(), Value::from(*index));
            }
        }
        if let Some(ref v) = value.additional_info {
            map.insert("AdditionalInfo".to_string(), string_to_json(v));
        }
        if let Some(v) = value.inner_status_code {
            map.insert(
                "InnerStatusCode".to_string(),
                self.present_status_code_to_json(v),
            );
        }
        if let Some(ref v) = value.inner_diagnostic_info {
            map.insert(
                "InnerDiagnosticInfo".to_string(),
                self.diagnostic_info_to_json(v, depth + 1)?,
            );
        }
        Ok(Value::Object(map))
    }

    /// A known binary body is written as the structure itself. Anything else is forwarded with
    /// its encoding.
    fn extension_object_to_json(
        &self,
        value: &ExtensionObject,
        depth: usize,
    ) -> EncodingResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if let ExtensionObjectBody::Binary(ref body) = value.body {
            let description = TypeCatalogue::global().by_type_id(&value.node_id);
            if let Some(description) = description {
                let body_bytes = body.value.as_deref().unwrap_or(&[]);
                let body = self.structure_to_json(&description, body_bytes, depth + 1)?;
                if !self.options.reversible {
                    return Ok(body);
                }
                let mut map = Map::new();
                map.insert(
                    "TypeId".to_string(),
                    node_id_to_json(&description.data_type_id),
                );
                map.insert("Body".to_string(), body);
                return Ok(Value::Object(map));
            }
            debug!(
                "Type {} is not in the catalogue, forwarding its binary body",
                value.node_id
            );
        }
        let mut map = Map::new();
        map.insert("TypeId".to_string(), node_id_to_json(&value.node_id));
        match value.body {
            ExtensionObjectBody::None => {}
            ExtensionObjectBody::Binary(ref body) => {
                map.insert("Encoding".to_string(), Value::from(1));
                map.insert("Body".to_string(), byte_string_to_json(body));
            }
            ExtensionObjectBody::Xml(ref body) => {
                map.insert("Encoding".to_string(), Value::from(2));
                map.insert("Body".to_string(), string_to_json(body.as_ua_string()));
            }
            ExtensionObjectBody::Json(ref body) => {
                let body = serde_json::from_str::<Value>(body)
                    .unwrap_or_else(|_| Value::String(body.clone()));
                map.insert("Body".to_string(), body);
            }
        }
        Ok(Value::Object(map))
    }

    /// Reads the binary body of a structure field by field and writes it as a JSON object
    fn structure_to_json(
        &self,
        description: &TypeDescription,
        body: &[u8],
        depth: usize,
    ) -> EncodingResult<Value> {
        self.encoding_options.check_depth(depth)?;
        let decoding_options = DecodingOptions::with_limits(
            constants::MAX_STRING_LENGTH,
            constants::MAX_BYTE_STRING_LENGTH,
            self.encoding_options.max_array_length,
            self.encoding_options.max_depth.saturating_sub(depth),
        );
        let mut decoder = BinaryStreamDecoder::new(body, decoding_options);
        let mut encoder = JsonEncoder {
            options: self.options,
            encoding_options: self.encoding_options.clone(),
            stack: vec![Scope::Structure {
                field: None,
                fields: Map::new(),
            }],
            base_depth: depth,
            output: Vec::new(),
        };
        transcode_fields(description, &mut decoder, &mut encoder)?;
        match encoder.stack.pop() {
            Some(Scope::Structure { fields, .. }) if encoder.stack.is_empty() => {
                Ok(Value::Object(fields))
            }
            _ => {
                error!("Structure {} left scopes open", description.name);
                Err(StatusCode::BadEncodingError.into())
            }
        }
    }
}

impl Encoder for JsonEncoder {
    fn content_type(&self) -> ContentType {
        self.options.content_type()
    }

    fn write_scalar(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()> {
        match value {
            Variant::Array(array) => {
                self.write_array(field, array.value_type, Some(array.values.as_slice()))
            }
            Variant::Matrix(matrix) => self.write_matrix(field, matrix),
            value => {
                let value = self.value_to_json(value, self.depth())?;
                self.put(field, value)
            }
        }
    }

    fn write_variant(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()> {
        let value = self.variant_to_json(value, self.depth())?;
        self.put(field, value)
    }

    fn write_array(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
        values: Option<&[Variant]>,
    ) -> EncodingResult<()> {
        let value = match values {
            None => Value::Null,
            Some(values) => {
                self.encoding_options.check_array_length(values.len())?;
                values_are_of_kind(values, kind)?;
                let depth = self.depth() + 1;
                Value::Array(
                    values
                        .iter()
                        .map(|v| self.element_to_json(kind, v, depth))
                        .collect::<EncodingResult<Vec<_>>>()?,
                )
            }
        };
        self.put(field, value)
    }

    fn write_matrix(&mut self, field: Option<&str>, value: &Matrix) -> EncodingResult<()> {
        self.encoding_options.check_array_length(value.len())?;
        let values = self.elements_to_json(value, self.depth() + 1)?;
        let body = nest(values, value.dimensions());
        let value = if self.options.reversible {
            let mut map = Map::new();
            map.insert("Body".to_string(), body);
            map.insert(
                "Dimensions".to_string(),
                Value::from(value.dimensions().to_vec()),
            );
            Value::Object(map)
        } else {
            body
        };
        self.put(field, value)
    }

    fn push_structure(&mut self, field: Option<&str>, _type_name: &str) -> EncodingResult<()> {
        self.encoding_options.check_depth(self.depth() + 1)?;
        self.stack.push(Scope::Structure {
            field: field.map(str::to_string),
            fields: Map::new(),
        });
        Ok(())
    }

    fn pop_structure(&mut self) -> EncodingResult<()> {
        match self.stack.pop() {
            Some(Scope::Structure { field, fields }) => {
                self.put(field.as_deref(), Value::Object(fields))
            }
            _ => {
                error!("pop_structure does not match an open structure");
                Err(StatusCode::BadEncodingError.into())
            }
        }
    }

    fn push_array(
        &mut self,
        field: Option<&str>,
        _type_name: &str,
        len: usize,
    ) -> EncodingResult<()> {
        self.encoding_options.check_array_length(len)?;
        self.encoding_options.check_depth(self.depth() + 1)?;
        self.stack.push(Scope::Array {
            field: field.map(str::to_string),
            values: Vec::with_capacity(len),
        });
        Ok(())
    }

    fn pop_array(&mut self) -> EncodingResult<()> {
        match self.stack.pop() {
            Some(Scope::Array { field, values }) => self.put(field.as_deref(), Value::Array(values)),
            _ => {
                error!("pop_array does not match an open array");
                Err(StatusCode::BadEncodingError.into())
            }
        }
    }

    fn write_null_array(&mut self, field: Option<&str>) -> EncodingResult<()> {
        self.put(field, Value::Null)
    }

    fn finish(self: Box<Self>) -> EncodingResult<Vec<u8>> {
        if !self.stack.is_empty() {
            error!("Encoder finished with {} scopes still open", self.stack.len());
            return Err(StatusCode::BadEncodingError.into());
        }
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{date_time::DateTime, node_id::NodeId, string::UAString};

    fn encode_with<F>(options: JsonOptions, f: F) -> Value
    where
        F: FnOnce(&mut dyn Encoder) -> EncodingResult<()>,
    {
        let mut encoder = Box::new(JsonEncoder::new(options, EncodingOptions::default()));
        f(encoder.as_mut()).unwrap();
        let output = encoder.finish().unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    const REVERSIBLE: JsonOptions = JsonOptions {
        reversible: true,
        reference: false,
    };

    const NON_REVERSIBLE_REFERENCE: JsonOptions = JsonOptions {
        reversible: false,
        reference: true,
    };

    #[test]
    fn json_document_wrapping() {
        let value = encode_with(REVERSIBLE, |e| e.write_int32(Some("Count"), 5));
        assert_eq!(value, json!({"Count": 5}));
        let value = encode_with(NON_REVERSIBLE_REFERENCE, |e| e.write_int32(Some("Count"), 5));
        assert_eq!(value, json!(5));
    }

    #[test]
    fn json_int64_dialects() {
        let value = encode_with(REVERSIBLE, |e| e.write_int64(None, 42));
        assert_eq!(value, json!("42"));
        let value = encode_with(NON_REVERSIBLE_REFERENCE, |e| e.write_int64(None, 42));
        assert_eq!(value, json!(42));
        let value = encode_with(NON_REVERSIBLE_REFERENCE, |e| {
            e.write_uint64(None, 123456789123456789)
        });
        assert_eq!(value, json!("123456789123456789"));
    }

    #[test]
    fn json_variant_dialects() {
        let variant = Variant::from(vec![1i32, 2, 3]);
        let value = encode_with(REVERSIBLE, |e| e.write_variant(None, &variant));
        assert_eq!(value, json!({"Type": 6, "Body": [1, 2, 3]}));
        let value = encode_with(NON_REVERSIBLE_REFERENCE, |e| e.write_variant(None, &variant));
        assert_eq!(value, json!([1, 2, 3]));

        let matrix = Variant::from(Matrix::new(vec![1i32, 2, 3, 4], vec![2u32, 2]).unwrap());
        let value = encode_with(REVERSIBLE, |e| e.write_variant(None, &matrix));
        assert_eq!(
            value,
            json!({"Type": 6, "Body": [[1, 2], [3, 4]], "Dimensions": [2, 2]})
        );
    }

    #[test]
    fn json_special_floats() {
        let value = encode_with(REVERSIBLE, |e| {
            e.write_double_array(None, Some(&[f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.5]))
        });
        assert_eq!(value, json!(["NaN", "Infinity", "-Infinity", 1.5]));
    }

    #[test]
    fn json_structure_omits_nulls() {
        let value = encode_with(REVERSIBLE, |e| {
            e.push_structure(Some("Item"), "Item")?;
            e.write_string(Some("Name"), &UAString::from("pump"))?;
            e.write_string(Some("Missing"), &UAString::null())?;
            e.write_node_id(Some("Id"), &NodeId::new(1, "pump"))?;
            e.write_date_time(Some("Time"), DateTime::ymd_hms(2024, 1, 2, 3, 4, 5))?;
            e.write_status_code(Some("Status"), StatusCode::Good)?;
            e.pop_structure()
        });
        assert_eq!(
            value,
            json!({"Item": {
                "Name": "pump",
                "Id": {"IdType": 1, "Id": "pump", "Namespace": 1},
                "Time": "2024-01-02T03:04:05Z"
            }})
        );
    }

    #[test]
    fn json_localized_text_dialects() {
        let text = LocalizedText::new("de", "Pumpe");
        let value = encode_with(REVERSIBLE, |e| e.write_localized_text(None, &text));
        assert_eq!(value, json!({"Locale": "de", "Text": "Pumpe"}));
        let value = encode_with(NON_REVERSIBLE_REFERENCE, |e| {
            e.write_localized_text(None, &text)
        });
        assert_eq!(value, json!("Pumpe"));
    }

    #[test]
    fn json_status_code_dialects() {
        let value = encode_with(NON_REVERSIBLE_REFERENCE, |e| {
            e.write_status_code(None, StatusCode::BadTypeMismatch)
        });
        assert_eq!(
            value,
            json!({"Code": StatusCode::BadTypeMismatch.bits(), "Symbol": "BadTypeMismatch"})
        );
    }

    #[test]
    fn json_unbalanced_scopes() {
        let mut encoder = Box::new(JsonEncoder::new(REVERSIBLE, EncodingOptions::default()));
        encoder.push_structure(None, "A").unwrap();
        assert!(encoder.pop_array().is_err());
        let mut encoder = Box::new(JsonEncoder::new(REVERSIBLE, EncodingOptions::default()));
        encoder.push_structure(None, "A").unwrap();
        assert!(encoder.finish().is_err());
    }
}
