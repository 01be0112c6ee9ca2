// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::{
    catalogue::{TypeCatalogue, TypeDescription},
    codec::{binary::BinaryStreamEncoder, transcode::transcode_fields, ContentType, Decoder},
    types::{
        array::Array,
        builtin_kind::BuiltInKind,
        data_value::DataValue,
        date_time::DateTime,
        diagnostic_info::DiagnosticInfo,
        encoding::{DecodingOptions, EncodingOptions},
        error::{EncodingError, EncodingResult},
        extension_object::{ExtensionObject, ExtensionObjectBody},
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
    Structure(Map<String, Value>),
    Array(std::vec::IntoIter<Value>),
}

/// Reads values from a stream of JSON documents. Both dialects and both document forms are
/// accepted, whatever the options say.
pub struct JsonDecoder {
    options: JsonOptions,
    decoding_options: DecodingOptions,
    documents: VecDeque<Value>,
    stack: Vec<Scope>,
}

impl JsonDecoder {
    /// Parses every document in the data up front
    pub fn new(
        data: &[u8],
        options: JsonOptions,
        decoding_options: DecodingOptions,
    ) -> EncodingResult<JsonDecoder> {
        let mut documents = VecDeque::new();
        for document in serde_json::Deserializer::from_slice(data).into_iter::<Value>() {
            match document {
                Ok(document) => documents.push_back(document),
                Err(err) if err.is_eof() => {
                    error!("JSON input ends inside a document, {}", err);
                    return Err(EncodingError::UnexpectedEof);
                }
                Err(err) => {
                    error!("Cannot parse JSON input, {}", err);
                    return Err(StatusCode::BadDecodingError.into());
                }
            }
        }
        trace!("Parsed {} JSON documents", documents.len());
        Ok(JsonDecoder {
            options,
            decoding_options,
            documents,
            stack: Vec::new(),
        })
    }

    pub fn options(&self) -> JsonOptions {
        self.options
    }

    /// Takes the next value. At top level this is the next document, unwrapped when it is an
    /// object holding just the field. `keys` are the keys of the object form of the value being
    /// read. `None` means the field is absent from its structure.
    fn next_value(&mut self, field: Option<&str>, keys: &[&str]) -> EncodingResult<Option<Value>> {
        match self.stack.last_mut() {
            None => {
                let document = self
                    .documents
                    .pop_front()
                    .ok_or(EncodingError::UnexpectedEof)?;
                Ok(Some(unwrap_document(document, field, keys)))
            }
            Some(Scope::Structure(fields)) => Ok(field.and_then(|field| fields.remove(field))),
            Some(Scope::Array(values)) => match values.next() {
                Some(value) => Ok(Some(value)),
                None => {
                    error!("Read past the end of a JSON array");
                    Err(EncodingError::UnexpectedEof)
                }
            },
        }
    }

    fn enter(&self) -> EncodingResult<()> {
        if self.stack.len() >= self.decoding_options.max_depth() {
            warn!("Decoding aborted due maximum nesting depth being reached");
            Err(StatusCode::BadDecodingError.into())
        } else {
            Ok(())
        }
    }

    fn check_array_length(&self, len: usize) -> EncodingResult<()> {
        if len > self.decoding_options.max_array_length {
            error!(
                "Array length {} exceeds decoding limit {}",
                len, self.decoding_options.max_array_length
            );
            Err(StatusCode::BadEncodingLimitsExceeded.into())
        } else {
            Ok(())
        }
    }

    fn check_string_length(&self, value: &str, limit: usize) -> EncodingResult<()> {
        if value.len() > limit {
            error!(
                "String length {} exceeds decoding limit {}",
                value.len(),
                limit
            );
            Err(StatusCode::BadDecodingError.into())
        } else {
            Ok(())
        }
    }

    /// Reads a value that is known to be of the kind. Null is the null value of the kind.
    pub(super) fn json_to_scalar(&self, kind: BuiltInKind, value: &Value) -> EncodingResult<Variant> {
        macro_rules! integer {
            ($ty:ty) => {
                <$ty>::try_from(integer_from_json(kind, value)?)
                    .map(Variant::from)
                    .map_err(|_| {
                        error!("Value {} is out of range for {}", value, kind);
                        EncodingError::type_mismatch(kind, value.to_string())
                    })
            };
        }

        if value.is_null() {
            return Ok(Variant::default_for(kind));
        }
        match kind {
            BuiltInKind::Boolean => match value {
                Value::Bool(v) => Ok(Variant::Boolean(*v)),
                _ => Err(mismatch(kind, value)),
            },
            BuiltInKind::SByte => integer!(i8),
            BuiltInKind::Byte => integer!(u8),
            BuiltInKind::Int16 => integer!(i16),
            BuiltInKind::UInt16 => integer!(u16),
            BuiltInKind::Int32 => integer!(i32),
            BuiltInKind::UInt32 => integer!(u32),
            BuiltInKind::Int64 => integer!(i64),
            BuiltInKind::UInt64 => integer!(u64),
            BuiltInKind::Float => Ok(Variant::Float(float_from_json(kind, value)? as f32)),
            BuiltInKind::Double => Ok(Variant::Double(float_from_json(kind, value)?)),
            BuiltInKind::String => {
                let v = string_from_json(kind, value)?;
                self.check_string_length(v.as_ref(), self.decoding_options.max_string_length)?;
                Ok(Variant::String(v))
            }
            BuiltInKind::DateTime => match value {
                Value::String(s) => Ok(Variant::from(DateTime::parse_iso8601(s)?)),
                _ => Err(mismatch(kind, value)),
            },
            BuiltInKind::Guid => Ok(Variant::from(guid_from_json(value)?)),
            BuiltInKind::ByteString => {
                if let Value::String(s) = value {
                    // base64 is 4 characters for every 3 bytes
                    let limit = self.decoding_options.max_byte_string_length / 3 * 4 + 4;
                    self.check_string_length(s, limit)?;
                }
                Ok(Variant::ByteString(byte_string_from_json(value)?))
            }
            BuiltInKind::XmlElement => {
                let v = string_from_json(kind, value)?;
                self.check_string_length(v.as_ref(), self.decoding_options.max_string_length)?;
                Ok(Variant::XmlElement(XmlElement::from(v)))
            }
            BuiltInKind::NodeId => Ok(Variant::from(node_id_from_json(value)?)),
            BuiltInKind::ExpandedNodeId => Ok(Variant::from(expanded_node_id_from_json(value)?)),
            BuiltInKind::StatusCode => Ok(Variant::StatusCode(status_code_from_json(value)?)),
            BuiltInKind::QualifiedName => {
                Ok(Variant::from(qualified_name_from_json(value)?))
            }
            BuiltInKind::LocalizedText => {
                Ok(Variant::from(localized_text_from_json(value)?))
            }
            BuiltInKind::ExtensionObject => {
                Ok(Variant::from(self.json_to_extension_object(value)?))
            }
            BuiltInKind::DataValue => Ok(Variant::from(self.json_to_data_value(value)?)),
            BuiltInKind::Variant => Ok(Variant::Variant(Box::new(self.json_to_variant(value)?))),
            BuiltInKind::DiagnosticInfo => {
                Ok(Variant::from(self.json_to_diagnostic_info(value)?))
            }
            BuiltInKind::Null | BuiltInKind::Encodeable => Err(mismatch(kind, value)),
        }
    }

    /// Elements of a `Variant` array are variants, anything else is a plain value
    fn json_to_element(&self, kind: BuiltInKind, value: &Value) -> EncodingResult<Variant> {
        if kind == BuiltInKind::Variant {
            self.json_to_variant(value)
        } else {
            self.json_to_scalar(kind, value)
        }
    }

    fn json_to_elements(&self, kind: BuiltInKind, values: &[Value]) -> EncodingResult<Vec<Variant>> {
        values
            .iter()
            .map(|v| self.json_to_element(kind, v))
            .collect()
    }

    /// Reads a variant. A reversible variant carries its kind, anything else has its kind
    /// inferred from the JSON type.
    pub(super) fn json_to_variant(&self, value: &Value) -> EncodingResult<Variant> {
        let _depth_lock = self.decoding_options.depth_lock()?;
        match value {
            Value::Null => Ok(Variant::Empty),
            Value::Object(map) if is_reversible_variant(map) => self.reversible_variant(map),
            Value::Object(_) => Ok(Variant::from(self.json_to_extension_object(value)?)),
            Value::Bool(v) => Ok(Variant::Boolean(*v)),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Variant::Int64(v))
                } else if let Some(v) = n.as_u64() {
                    Ok(Variant::UInt64(v))
                } else {
                    Ok(Variant::Double(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => {
                self.check_string_length(s, self.decoding_options.max_string_length)?;
                Ok(Variant::from(s.as_str()))
            }
            Value::Array(values) => {
                self.check_array_length(values.len())?;
                if !values.is_empty() && values.iter().all(Value::is_array) {
                    let dimensions = infer_dimensions(value);
                    let values = flatten(value.clone(), &dimensions)?;
                    self.check_array_length(values.len())?;
                    let values = self.json_to_elements(BuiltInKind::Variant, &values)?;
                    let kind = uniform_kind(&values);
                    Ok(Variant::from(Matrix::from_variants(kind, values, dimensions)?))
                } else {
                    let values = self.json_to_elements(BuiltInKind::Variant, values)?;
                    let kind = uniform_kind(&values);
                    Ok(Variant::from(Array::new(kind, values)?))
                }
            }
        }
    }

    fn reversible_variant(&self, map: &Map<String, Value>) -> EncodingResult<Variant> {
        let type_id = match map.get("Type") {
            Some(v) => u8::try_from(integer_from_json(BuiltInKind::Byte, v)?)
                .map_err(|_| mismatch(BuiltInKind::Byte, v))?,
            None => 0,
        };
        let kind = BuiltInKind::from_type_id(type_id)?;
        if kind == BuiltInKind::Null {
            return Ok(Variant::Empty);
        }
        let body = map.get("Body").unwrap_or(&Value::Null);
        match (map.get("Dimensions"), body) {
            (Some(dimensions), body) if !dimensions.is_null() => {
                let dimensions = dimensions_from_json(dimensions)?;
                let values = flatten(body.clone(), &dimensions)?;
                self.check_array_length(values.len())?;
                let values = self.json_to_elements(kind, &values)?;
                Ok(Variant::from(Matrix::from_variants(kind, values, dimensions)?))
            }
            (_, Value::Array(values)) => {
                self.check_array_length(values.len())?;
                let values = self.json_to_elements(kind, values)?;
                Ok(Variant::from(Array::new(kind, values)?))
            }
            (_, body) => self.json_to_scalar(kind, body),
        }
    }

    fn json_to_data_value(&self, value: &Value) -> EncodingResult<DataValue> {
        let map = match value {
            Value::Null => return Ok(DataValue::null()),
            Value::Object(map) => map,
            _ => return Err(mismatch(BuiltInKind::DataValue, value)),
        };
        let date_time = |key: &str| -> EncodingResult<Option<DateTime>> {
            match map.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => DateTime::parse_iso8601(s).map(Some),
                Some(v) => Err(mismatch(BuiltInKind::DateTime, v)),
            }
        };
        let picoseconds = |key: &str| -> EncodingResult<Option<u16>> {
            match map.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => u16::try_from(integer_from_json(BuiltInKind::UInt16, v)?)
                    .map(Some)
                    .map_err(|_| mismatch(BuiltInKind::UInt16, v)),
            }
        };
        Ok(DataValue {
            value: map
                .get("Value")
                .map(|v| self.json_to_variant(v))
                .transpose()?,
            status: map
                .get("StatusCode")
                .map(status_code_from_json)
                .transpose()?,
            source_timestamp: date_time("SourceTimestamp")?,
            source_picoseconds: picoseconds("SourcePicoseconds")?,
            server_timestamp: date_time("ServerTimestamp")?,
            server_picoseconds: picoseconds("ServerPicoseconds")?,
        })
    }

    fn json_to_diagnostic_info(&self, value: &Value) -> EncodingResult<DiagnosticInfo> {
        let _depth_lock = self.decoding_options.depth_lock()?;
        let map = match value {
            Value::Null => return Ok(DiagnosticInfo::null()),
            Value::Object(map) => map,
            _ => return Err(mismatch(BuiltInKind::DiagnosticInfo, value)),
        };
        let index = |key: &str| -> EncodingResult<Option<i32>> {
            match map.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => i32::try_from(integer_from_json(BuiltInKind::Int32, v)?)
                    .map(Some)
                    .map_err(|_| mismatch(BuiltInKind::Int32, v)),
            }
        };
        Ok(DiagnosticInfo {
            symbolic_id: index("SymbolicId")?,
            namespace_uri: index("NamespaceUri")?,
            locale: index("Locale")?,
            localized_text: index("LocalizedText")?,
            additional_info: map
                .get("AdditionalInfo")
                .map(|v| string_from_json(BuiltInKind::String, v))
                .transpose()?,
            inner_status_code: map
                .get("InnerStatusCode")
                .map(status_code_from_json)
                .transpose()?,
            inner_diagnostic_info: match map.get("InnerDiagnosticInfo") {
                None | Some(Value::Null) => None,
                Some(v) => Some(Box::new(self.json_to_diagnostic_info(v)?)),
            },
        })
    }

    /// A known type with an object body is turned back into its binary encoding. Bodies of
    /// other types are kept in the encoding they arrived in.
    fn json_to_extension_object(&self, value: &Value) -> EncodingResult<ExtensionObject> {
        let _depth_lock = self.decoding_options.depth_lock()?;
        let map = match value {
            Value::Null => return Ok(ExtensionObject::null()),
            Value::Object(map) => map,
            _ => return Err(mismatch(BuiltInKind::ExtensionObject, value)),
        };
        let type_id = match map.get("TypeId") {
            None | Some(Value::Null) => {
                warn!("Extension object without a type id is kept as a JSON body");
                return Ok(ExtensionObject {
                    node_id: NodeId::null(),
                    body: ExtensionObjectBody::Json(value.to_string()),
                });
            }
            Some(type_id) => node_id_from_json(type_id)?,
        };
        let encoding = match map.get("Encoding") {
            None | Some(Value::Null) => 0,
            Some(v) => integer_from_json(BuiltInKind::Byte, v)?,
        };
        let body = map.get("Body").unwrap_or(&Value::Null);
        let body = match encoding {
            1 => ExtensionObjectBody::Binary(byte_string_from_json(body)?),
            2 => ExtensionObjectBody::Xml(XmlElement::from(string_from_json(
                BuiltInKind::XmlElement,
                body,
            )?)),
            0 => {
                let description = TypeCatalogue::global().by_type_id(&type_id);
                match (description, body) {
                    (_, Value::Null) => ExtensionObjectBody::None,
                    (Some(description), Value::Object(fields)) => {
                        let bytes = self.json_to_structure_bytes(&description, fields.clone())?;
                        return Ok(ExtensionObject {
                            node_id: description.encoding_id.clone(),
                            body: ExtensionObjectBody::Binary(bytes.into()),
                        });
                    }
                    (_, Value::String(s)) => ExtensionObjectBody::Json(s.clone()),
                    (_, body) => ExtensionObjectBody::Json(body.to_string()),
                }
            }
            encoding => {
                error!("Invalid extension object encoding {}", encoding);
                return Err(StatusCode::BadDecodingError.into());
            }
        };
        Ok(ExtensionObject {
            node_id: type_id,
            body,
        })
    }

    /// Reads the fields of a structure from a JSON object and writes them in the binary encoding
    fn json_to_structure_bytes(
        &self,
        description: &TypeDescription,
        fields: Map<String, Value>,
    ) -> EncodingResult<Vec<u8>> {
        let mut decoder = JsonDecoder {
            options: self.options,
            decoding_options: self.decoding_options.clone(),
            documents: VecDeque::new(),
            stack: vec![Scope::Structure(fields)],
        };
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions {
            max_depth: self.decoding_options.max_depth(),
            max_array_length: self.decoding_options.max_array_length,
        });
        transcode_fields(description, &mut decoder, &mut encoder)?;
        Ok(encoder.into_bytes())
    }

    fn read_values(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Vec<Variant>>> {
        match self.next_value(field, &[])? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(values)) => {
                self.check_array_length(values.len())?;
                self.json_to_elements(kind, &values).map(Some)
            }
            Some(value) => Err(mismatch(kind, &value)),
        }
    }
}

/// Unwraps `{"<field>": value}`, the form a named top level value takes in the standard dialect.
/// When the field is also one of `keys` the document may be the bare value of the reference
/// dialect, and it is only unwrapped if what it holds has the object form itself.
fn unwrap_document(document: Value, field: Option<&str>, keys: &[&str]) -> Value {
    match (field, document) {
        (Some(field), Value::Object(mut map)) if map.len() == 1 && map.contains_key(field) => {
            if keys.contains(&field) && !map.get(field).map_or(false, |v| is_object_of(v, keys)) {
                return Value::Object(map);
            }
            map.remove(field).unwrap_or(Value::Null)
        }
        (_, document) => document,
    }
}

fn is_object_of(value: &Value, keys: &[&str]) -> bool {
    match value {
        Value::Object(map) => map.keys().all(|k| keys.contains(&k.as_str())),
        _ => false,
    }
}

const MATRIX_KEYS: &[&str] = &["Body", "Dimensions"];

/// The keys of the object form of a kind, empty when the kind is never written as an object
fn object_keys(kind: BuiltInKind) -> &'static [&'static str] {
    match kind {
        BuiltInKind::NodeId => &["IdType", "Id", "Namespace"],
        BuiltInKind::ExpandedNodeId => &["IdType", "Id", "Namespace", "ServerUri"],
        BuiltInKind::StatusCode => &["Code", "Symbol"],
        BuiltInKind::QualifiedName => &["Name", "Uri", "Index"],
        BuiltInKind::LocalizedText => &["Locale", "Text"],
        BuiltInKind::ExtensionObject => &["TypeId", "Encoding", "Body"],
        BuiltInKind::DataValue => &[
            "Value",
            "StatusCode",
            "SourceTimestamp",
            "SourcePicoseconds",
            "ServerTimestamp",
            "ServerPicoseconds",
        ],
        BuiltInKind::Variant => &["Type", "Body", "Dimensions"],
        BuiltInKind::DiagnosticInfo => &[
            "SymbolicId",
            "NamespaceUri",
            "Locale",
            "LocalizedText",
            "AdditionalInfo",
            "InnerStatusCode",
            "InnerDiagnosticInfo",
        ],
        _ => &[],
    }
}

/// An object is taken as a reversible variant when it has a numeric `Type` and nothing but the
/// variant keys
fn is_reversible_variant(map: &Map<String, Value>) -> bool {
    matches!(map.get("Type"), Some(Value::Number(_)))
        && map
            .keys()
            .all(|k| matches!(k.as_str(), "Type" | "Body" | "Dimensions"))
}

/// The kind shared by every value when they are all scalars of one kind, otherwise `Variant`
pub(super) fn uniform_kind(values: &[Variant]) -> BuiltInKind {
    let is_plain = |v: &Variant| {
        !matches!(
            v,
            Variant::Empty | Variant::Variant(_) | Variant::Array(_) | Variant::Matrix(_)
        )
    };
    match values.first() {
        Some(first) if values.iter().all(|v| is_plain(v) && v.kind() == first.kind()) => {
            first.kind()
        }
        _ => BuiltInKind::Variant,
    }
}

fn qualified_name_from_json(value: &Value) -> EncodingResult<QualifiedName> {
    match value {
        Value::Null => Ok(QualifiedName::null()),
        Value::String(s) => Ok(QualifiedName::from(s.as_str())),
        Value::Object(map) => {
            let namespace_index = match map.get("Uri").or_else(|| map.get("Index")) {
                None | Some(Value::Null) => 0,
                Some(Value::String(uri)) if uri.parse::<u16>().is_err() => {
                    debug!("Namespace uri {} cannot be mapped to an index", uri);
                    0
                }
                Some(v) => u16::try_from(integer_from_json(BuiltInKind::UInt16, v)?)
                    .map_err(|_| mismatch(BuiltInKind::UInt16, v))?,
            };
            Ok(QualifiedName {
                namespace_index,
                name: match map.get("Name") {
                    None => UAString::null(),
                    Some(v) => string_from_json(BuiltInKind::String, v)?,
                },
            })
        }
        _ => Err(mismatch(BuiltInKind::QualifiedName, value)),
    }
}

fn localized_text_from_json(value: &Value) -> EncodingResult<LocalizedText> {
    match value {
        Value::Null => Ok(LocalizedText::null()),
        Value::String(s) => Ok(LocalizedText::from(s.as_str())),
        Value::Object(map) => {
            let text = |key: &str| -> EncodingResult<UAString> {
                match map.get(key) {
                    None => Ok(UAString::null()),
                    Some(v) => string_from_json(BuiltInKind::String, v),
                }
            };
            Ok(LocalizedText {
                locale: text("Locale")?,
                text: text("Text")?,
            })
        }
        _ => Err(mismatch(BuiltInKind::LocalizedText, value)),
    }
}

impl Decoder for JsonDecoder {
    fn content_type(&self) -> ContentType {
        self.options.content_type()
    }

    fn read_scalar(&mut self, field: Option<&str>, kind: BuiltInKind) -> EncodingResult<Variant> {
        match self.next_value(field, object_keys(kind))? {
            None => Ok(Variant::default_for(kind)),
            Some(value) => self.json_to_scalar(kind, &value),
        }
    }

    fn read_variant(&mut self, field: Option<&str>) -> EncodingResult<Variant> {
        if self.at_end() {
            return Ok(Variant::Empty);
        }
        match self.next_value(field, object_keys(BuiltInKind::Variant))? {
            None => Ok(Variant::Empty),
            Some(value) => self.json_to_variant(&value),
        }
    }

    fn read_array(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Vec<Variant>>> {
        self.read_values(field, kind)
    }

    fn read_matrix(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Matrix>> {
        let (body, dimensions) = match self.next_value(field, MATRIX_KEYS)? {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(mut map)) => {
                let dimensions = match map.remove("Dimensions") {
                    Some(dimensions) => dimensions_from_json(&dimensions)?,
                    None => {
                        error!("Matrix object has no dimensions");
                        return Err(EncodingError::type_mismatch(kind, "object"));
                    }
                };
                (map.remove("Body").unwrap_or(Value::Null), dimensions)
            }
            Some(value @ Value::Array(_)) => {
                let dimensions = infer_dimensions(&value);
                (value, dimensions)
            }
            Some(value) => return Err(mismatch(kind, &value)),
        };
        let values = flatten(body, &dimensions)?;
        self.check_array_length(values.len())?;
        let values = self.json_to_elements(kind, &values)?;
        Matrix::from_variants(kind, values, dimensions).map(Some)
    }

    fn push_structure(&mut self, field: Option<&str>, type_name: &str) -> EncodingResult<bool> {
        self.enter()?;
        // Only a top level document can be mistaken for a named one
        let keys: Vec<&str> = if self.stack.is_empty() {
            TypeCatalogue::global()
                .by_name(type_name)
                .map(|d| d.fields.iter().map(|f| f.name).collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        match self.next_value(field, &keys)? {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Object(map)) => {
                self.stack.push(Scope::Structure(map));
                Ok(true)
            }
            Some(value) => Err(mismatch(BuiltInKind::Encodeable, &value)),
        }
    }

    fn pop_structure(&mut self) -> EncodingResult<()> {
        match self.stack.pop() {
            Some(Scope::Structure(fields)) => {
                if !fields.is_empty() {
                    trace!("Ignoring unread fields {:?}", fields.keys().collect::<Vec<_>>());
                }
                Ok(())
            }
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
        match self.next_value(field, &[])? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(values)) => {
                self.check_array_length(values.len())?;
                let len = values.len();
                self.stack.push(Scope::Array(values.into_iter()));
                Ok(Some(len))
            }
            Some(value) => Err(mismatch(BuiltInKind::Encodeable, &value)),
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
        self.stack.is_empty() && self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(json: &str) -> JsonDecoder {
        JsonDecoder::new(
            json.as_bytes(),
            JsonOptions::default(),
            DecodingOptions::test(),
        )
        .unwrap()
    }

    #[test]
    fn json_documents_unwrapped() {
        let mut d = decoder("{\"Count\":5}\n6\n{\"Other\":7}\n");
        assert_eq!(d.read_int32(Some("Count")).unwrap(), 5);
        assert_eq!(d.read_int32(Some("Count")).unwrap(), 6);
        assert!(d.read_int32(Some("Count")).is_err());
        assert!(d.at_end());
        assert!(matches!(
            d.read_int32(None),
            Err(EncodingError::UnexpectedEof)
        ));
    }

    #[test]
    fn json_truncated_document() {
        let result = JsonDecoder::new(
            b"{\"Count\": [1, 2",
            JsonOptions::default(),
            DecodingOptions::test(),
        );
        assert!(matches!(result, Err(EncodingError::UnexpectedEof)));
    }

    #[test]
    fn json_integer_coercion() {
        let mut d = decoder("\"99\"\n123456789123456789\n70000\n");
        assert_eq!(d.read_uint64(None).unwrap(), 99);
        assert_eq!(d.read_uint64(None).unwrap(), 123456789123456789);
        assert!(matches!(
            d.read_uint16(None),
            Err(EncodingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn json_inferred_variants() {
        let mut d = decoder("true\n-4\n18446744073709551615\n1.5\n\"a\"\n[1,2]\n[[1,2],[3,4]]\n[1,\"a\"]\n");
        assert_eq!(d.read_variant(None).unwrap(), Variant::Boolean(true));
        assert_eq!(d.read_variant(None).unwrap(), Variant::Int64(-4));
        assert_eq!(d.read_variant(None).unwrap(), Variant::UInt64(u64::MAX));
        assert_eq!(d.read_variant(None).unwrap(), Variant::Double(1.5));
        assert_eq!(d.read_variant(None).unwrap(), Variant::from("a"));
        assert_eq!(d.read_variant(None).unwrap(), Variant::from(vec![1i64, 2]));
        assert_eq!(
            d.read_variant(None).unwrap(),
            Variant::from(Matrix::new(vec![1i64, 2, 3, 4], vec![2u32, 2]).unwrap())
        );
        let mixed = d.read_variant(None).unwrap();
        assert_eq!(mixed.kind(), BuiltInKind::Variant);
        assert!(mixed.is_array());
        assert_eq!(d.read_variant(None).unwrap(), Variant::Empty);
    }

    #[test]
    fn json_ragged_matrix() {
        let mut d = decoder("{\"Type\":6,\"Body\":[[1,2],[3]],\"Dimensions\":[2,2]}");
        assert!(matches!(
            d.read_variant(None),
            Err(EncodingError::InvalidShape { .. })
        ));
    }

    #[test]
    fn json_missing_fields_default() {
        let mut d = decoder("{\"Name\":\"pump\"}");
        assert!(d.push_structure(None, "Item").unwrap());
        assert_eq!(d.read_string(Some("Name")).unwrap(), UAString::from("pump"));
        assert_eq!(d.read_int32(Some("Count")).unwrap(), 0);
        assert!(d.read_string(Some("Missing")).unwrap().is_null());
        assert_eq!(d.read_int32_array(Some("Values")).unwrap(), None);
        d.pop_structure().unwrap();
        assert!(d.at_end());
    }

    #[test]
    fn json_unknown_extension_object() {
        let mut d = decoder("{\"TypeId\":{\"Id\":99999,\"Namespace\":4},\"Body\":{\"A\":1}}");
        let eo = d.read_extension_object(None).unwrap();
        assert_eq!(eo.node_id, NodeId::new(4, 99999u32));
        match eo.body {
            ExtensionObjectBody::Json(body) => {
                let body: Value = serde_json::from_str(&body).unwrap();
                assert_eq!(body, serde_json::json!({"A": 1}));
            }
            body => panic!("Unexpected body {:?}", body),
        }
    }

    #[test]
    fn json_depth_limit() {
        let nested = (0..20).fold("1".to_string(), |inner, _| {
            format!("{{\"Type\":24,\"Body\":{}}}", inner)
        });
        let mut d = decoder(&nested);
        assert!(d.read_variant(None).is_err());
    }
}
