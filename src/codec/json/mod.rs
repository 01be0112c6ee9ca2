// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The OPC UA JSON encodings.
//!
//! Two independent options pick the dialect. The reversible dialect tags every variant with its
//! kind so it reads back exactly, the non-reversible one writes bare values and the decoder
//! infers their kind. The reference dialect writes every top level value as a bare document
//! while the standard one wraps a named value as `{"<field>": value}`. Decoders accept either
//! form of both options.

use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::{
    codec::ContentType,
    types::{
        builtin_kind::BuiltInKind,
        byte_string::ByteString,
        error::{EncodingError, EncodingResult},
        expanded_node_id::ExpandedNodeId,
        guid::Guid,
        node_id::{IdType, Identifier, NodeId},
        status_codes::StatusCode,
        string::UAString,
    },
};

mod decoder;
mod encoder;
mod variant;

pub use self::{
    decoder::JsonDecoder,
    encoder::JsonEncoder,
    variant::{decode_variant, decode_variant_str},
};

/// Integers beyond this magnitude lose precision as a JSON number
pub(crate) const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Selects the JSON dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonOptions {
    /// Tag values with their kind so they can be read back exactly
    pub reversible: bool,
    /// Write top level values without wrapping them in an object
    pub reference: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            reversible: true,
            reference: false,
        }
    }
}

impl JsonOptions {
    pub fn content_type(&self) -> ContentType {
        match (self.reversible, self.reference) {
            (true, false) => ContentType::Json,
            (true, true) => ContentType::JsonReference,
            (false, false) => ContentType::NonReversibleJson,
            (false, true) => ContentType::NonReversibleJsonReference,
        }
    }
}

/// A short description of a JSON value for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn mismatch(kind: BuiltInKind, value: &Value) -> EncodingError {
    error!("Cannot read {} from a JSON {}", kind, json_type_name(value));
    EncodingError::type_mismatch(kind, json_type_name(value))
}

pub(crate) fn float_to_json(value: f64) -> Value {
    if value.is_nan() {
        Value::String("NaN".to_string())
    } else if value == f64::INFINITY {
        Value::String("Infinity".to_string())
    } else if value == f64::NEG_INFINITY {
        Value::String("-Infinity".to_string())
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

pub(crate) fn float_from_json(kind: BuiltInKind, value: &Value) -> EncodingResult<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(kind, value)),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" | "INF" => Ok(f64::INFINITY),
            "-Infinity" | "-INF" => Ok(f64::NEG_INFINITY),
            s => s.trim().parse::<f64>().map_err(|_| mismatch(kind, value)),
        },
        _ => Err(mismatch(kind, value)),
    }
}

/// Reads an integer from a number or from a string of digits
pub(crate) fn integer_from_json(kind: BuiltInKind, value: &Value) -> EncodingResult<i128> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(v as i128)
            } else if let Some(v) = n.as_u64() {
                Ok(v as i128)
            } else {
                match n.as_f64() {
                    Some(v) if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER as f64 => {
                        Ok(v as i128)
                    }
                    _ => Err(mismatch(kind, value)),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| mismatch(kind, value)),
        _ => Err(mismatch(kind, value)),
    }
}

/// A 64 bit integer is a number when it is safe as one, or always a string when `as_string`
pub(crate) fn int64_to_json(value: i128, as_string: bool) -> Value {
    if !as_string && value.abs() <= MAX_SAFE_INTEGER as i128 {
        Value::Number(Number::from(value as i64))
    } else {
        Value::String(value.to_string())
    }
}

pub(crate) fn string_to_json(value: &UAString) -> Value {
    match value.value() {
        Some(v) => Value::String(v.clone()),
        None => Value::Null,
    }
}

pub(crate) fn string_from_json(kind: BuiltInKind, value: &Value) -> EncodingResult<UAString> {
    match value {
        Value::Null => Ok(UAString::null()),
        Value::String(s) => Ok(UAString::from(s.as_str())),
        _ => Err(mismatch(kind, value)),
    }
}

pub(crate) fn identifier_to_json(identifier: &Identifier, map: &mut Map<String, Value>) {
    match identifier {
        Identifier::Numeric(v) => {
            map.insert("Id".to_string(), Value::from(*v));
        }
        identifier => {
            map.insert(
                "IdType".to_string(),
                Value::from(identifier.id_type() as u8),
            );
            map.insert("Id".to_string(), Value::String(identifier.value_text()));
        }
    }
}

/// `{"IdType"?, "Id", "Namespace"?}`, null for the null node id
pub(crate) fn node_id_to_json(node_id: &NodeId) -> Value {
    if node_id.is_null() {
        return Value::Null;
    }
    let mut map = Map::new();
    identifier_to_json(&node_id.identifier, &mut map);
    if node_id.namespace > 0 {
        map.insert("Namespace".to_string(), Value::from(node_id.namespace));
    }
    Value::Object(map)
}

fn identifier_from_json(map: &Map<String, Value>) -> EncodingResult<Identifier> {
    let id_type = match map.get("IdType") {
        None | Some(Value::Null) => IdType::Numeric,
        Some(v) => {
            let id_type = integer_from_json(BuiltInKind::Byte, v)?;
            IdType::from_u8(u8::try_from(id_type).map_err(|_| mismatch(BuiltInKind::Byte, v))?)?
        }
    };
    let id = match map.get("Id") {
        None | Some(Value::Null) => {
            return match id_type {
                IdType::Numeric => Ok(Identifier::Numeric(0)),
                _ => Err(EncodingError::InvalidIdentifier(
                    "missing identifier".to_string(),
                )),
            }
        }
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => return Err(mismatch(BuiltInKind::NodeId, v)),
    };
    Identifier::parse(id_type, &id)
}

fn namespace_index_from_json(value: Option<&Value>) -> EncodingResult<u16> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v) => {
            let namespace = integer_from_json(BuiltInKind::UInt16, v)?;
            u16::try_from(namespace).map_err(|_| mismatch(BuiltInKind::UInt16, v))
        }
    }
}

pub(crate) fn node_id_from_json(value: &Value) -> EncodingResult<NodeId> {
    match value {
        Value::Null => Ok(NodeId::null()),
        Value::String(s) => NodeId::from_str(s),
        Value::Object(map) => Ok(NodeId {
            namespace: namespace_index_from_json(map.get("Namespace"))?,
            identifier: identifier_from_json(map)?,
        }),
        _ => Err(mismatch(BuiltInKind::NodeId, value)),
    }
}

/// Like a node id, with the namespace written as a uri when there is one and the server index
/// as `ServerUri`. A uri replaces the namespace index, which reads back as 0. An empty uri is
/// still a uri and is kept.
pub(crate) fn expanded_node_id_to_json(value: &ExpandedNodeId) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let mut map = Map::new();
    identifier_to_json(&value.node_id.identifier, &mut map);
    if let Some(uri) = value.namespace_uri.value() {
        map.insert("Namespace".to_string(), Value::String(uri.clone()));
    } else if value.node_id.namespace > 0 {
        map.insert("Namespace".to_string(), Value::from(value.node_id.namespace));
    }
    if value.server_index > 0 {
        map.insert("ServerUri".to_string(), Value::from(value.server_index));
    }
    Value::Object(map)
}

pub(crate) fn expanded_node_id_from_json(value: &Value) -> EncodingResult<ExpandedNodeId> {
    match value {
        Value::Null => Ok(ExpandedNodeId::null()),
        Value::String(s) => ExpandedNodeId::from_str(s),
        Value::Object(map) => {
            let (namespace, namespace_uri) = match map.get("Namespace") {
                Some(Value::String(uri)) => (0, UAString::from(uri.as_str())),
                v => (namespace_index_from_json(v)?, UAString::null()),
            };
            let server_index = match map.get("ServerUri") {
                None | Some(Value::Null) => 0,
                Some(v) => u32::try_from(integer_from_json(BuiltInKind::UInt32, v)?)
                    .map_err(|_| mismatch(BuiltInKind::UInt32, v))?,
            };
            Ok(ExpandedNodeId {
                node_id: NodeId {
                    namespace,
                    identifier: identifier_from_json(map)?,
                },
                namespace_uri,
                server_index,
            })
        }
        _ => Err(mismatch(BuiltInKind::ExpandedNodeId, value)),
    }
}

/// Good is null. Otherwise the code, or `{"Code", "Symbol"}` when not reversible.
pub(crate) fn status_code_to_json(value: StatusCode, reversible: bool) -> Value {
    if value.bits() == 0 {
        Value::Null
    } else if reversible {
        Value::from(value.bits())
    } else {
        let mut map = Map::new();
        map.insert("Code".to_string(), Value::from(value.bits()));
        map.insert("Symbol".to_string(), Value::String(value.name().to_string()));
        Value::Object(map)
    }
}

pub(crate) fn status_code_from_json(value: &Value) -> EncodingResult<StatusCode> {
    let code = |v: &Value| -> EncodingResult<StatusCode> {
        let code = integer_from_json(BuiltInKind::StatusCode, v)?;
        u32::try_from(code)
            .map(StatusCode::from_bits_truncate)
            .map_err(|_| mismatch(BuiltInKind::StatusCode, v))
    };
    match value {
        Value::Null => Ok(StatusCode::Good),
        Value::Number(_) => code(value),
        Value::String(s) => StatusCode::from_name(s).map_or_else(|| code(value), Ok),
        Value::Object(map) => match (map.get("Code"), map.get("Symbol")) {
            (Some(v), _) => code(v),
            (None, Some(Value::String(s))) => StatusCode::from_name(s)
                .ok_or_else(|| mismatch(BuiltInKind::StatusCode, value)),
            _ => Ok(StatusCode::Good),
        },
        _ => Err(mismatch(BuiltInKind::StatusCode, value)),
    }
}

pub(crate) fn guid_from_json(value: &Value) -> EncodingResult<Guid> {
    match value {
        Value::Null => Ok(Guid::null()),
        Value::String(s) => Guid::from_str(s),
        _ => Err(mismatch(BuiltInKind::Guid, value)),
    }
}

pub(crate) fn byte_string_to_json(value: &ByteString) -> Value {
    if value.is_null() {
        Value::Null
    } else {
        Value::String(value.as_base64())
    }
}

pub(crate) fn byte_string_from_json(value: &Value) -> EncodingResult<ByteString> {
    match value {
        Value::Null => Ok(ByteString::null()),
        Value::String(s) => ByteString::from_base64(s),
        _ => Err(mismatch(BuiltInKind::ByteString, value)),
    }
}

/// Turns the flat row major elements of a matrix into nested arrays
pub(crate) fn nest(values: Vec<Value>, dimensions: &[u32]) -> Value {
    if dimensions.len() <= 1 {
        return Value::Array(values);
    }
    let stride: usize = dimensions[1..].iter().map(|d| *d as usize).product();
    if stride == 0 {
        return Value::Array(Vec::new());
    }
    let rows = values
        .chunks(stride)
        .map(|chunk| nest(chunk.to_vec(), &dimensions[1..]))
        .collect();
    Value::Array(rows)
}

/// The dimensions of nested arrays, following the first element at each level
pub(crate) fn infer_dimensions(value: &Value) -> Vec<u32> {
    let mut dimensions = Vec::new();
    let mut current = value;
    while let Value::Array(values) = current {
        dimensions.push(values.len() as u32);
        match values.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    dimensions
}

/// Collects the elements of nested arrays in row major order, checking every level has the
/// length of its dimension
pub(crate) fn flatten(value: Value, dimensions: &[u32]) -> EncodingResult<Vec<Value>> {
    fn collect(value: Value, dimensions: &[u32], out: &mut Vec<Value>) -> bool {
        match dimensions.split_first() {
            None => {
                out.push(value);
                true
            }
            Some((dimension, rest)) => match value {
                Value::Array(values) if values.len() == *dimension as usize => {
                    values.into_iter().all(|v| collect(v, rest, out))
                }
                _ => false,
            },
        }
    }
    let mut out = Vec::new();
    if collect(value, dimensions, &mut out) {
        Ok(out)
    } else {
        error!("Nested arrays do not match dimensions {:?}", dimensions);
        Err(EncodingError::InvalidShape {
            len: out.len(),
            dimensions: dimensions.to_vec(),
        })
    }
}

pub(crate) fn dimensions_from_json(value: &Value) -> EncodingResult<Vec<u32>> {
    match value {
        Value::Array(values) => values
            .iter()
            .map(|v| {
                let d = integer_from_json(BuiltInKind::UInt32, v)?;
                u32::try_from(d).map_err(|_| mismatch(BuiltInKind::UInt32, v))
            })
            .collect(),
        _ => Err(mismatch(BuiltInKind::UInt32, value)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nest_and_flatten() {
        let values: Vec<Value> = (1..=12).map(Value::from).collect();
        let nested = nest(values.clone(), &[2, 3, 2]);
        assert_eq!(
            nested,
            json!([[[1, 2], [3, 4], [5, 6]], [[7, 8], [9, 10], [11, 12]]])
        );
        assert_eq!(infer_dimensions(&nested), vec![2, 3, 2]);
        assert_eq!(flatten(nested, &[2, 3, 2]).unwrap(), values);

        let ragged = json!([[1, 2], [3]]);
        assert!(matches!(
            flatten(ragged, &[2, 2]),
            Err(EncodingError::InvalidShape { .. })
        ));
    }

    #[test]
    fn node_id_json_forms() {
        assert_eq!(node_id_to_json(&NodeId::new(0, 5u32)), json!({"Id": 5}));
        assert_eq!(
            node_id_to_json(&NodeId::new(2, "Pump")),
            json!({"IdType": 1, "Id": "Pump", "Namespace": 2})
        );
        assert_eq!(node_id_to_json(&NodeId::null()), Value::Null);
        assert_eq!(
            node_id_from_json(&json!({"IdType": 1, "Id": "Pump", "Namespace": 2})).unwrap(),
            NodeId::new(2, "Pump")
        );
        assert_eq!(
            node_id_from_json(&json!("ns=3;i=12")).unwrap(),
            NodeId::new(3, 12u32)
        );
        assert!(matches!(
            node_id_from_json(&json!({"IdType": 0, "Id": "abc"})),
            Err(EncodingError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn status_code_json_forms() {
        assert_eq!(status_code_to_json(StatusCode::Good, true), Value::Null);
        assert_eq!(status_code_to_json(StatusCode::Good, false), Value::Null);
        let bad = StatusCode::BadNodeIdUnknown;
        assert_eq!(status_code_to_json(bad, true), json!(bad.bits()));
        assert_eq!(
            status_code_to_json(bad, false),
            json!({"Code": bad.bits(), "Symbol": "BadNodeIdUnknown"})
        );
        assert_eq!(
            status_code_from_json(&status_code_to_json(bad, false)).unwrap(),
            bad
        );
        assert_eq!(
            status_code_from_json(&json!({"Symbol": "BadNodeIdUnknown"})).unwrap(),
            bad
        );
    }

    #[test]
    fn integers_from_numbers_and_strings() {
        assert_eq!(
            integer_from_json(BuiltInKind::UInt64, &json!("99")).unwrap(),
            99
        );
        assert_eq!(
            integer_from_json(BuiltInKind::UInt64, &json!("123456789123456789")).unwrap(),
            123456789123456789
        );
        assert!(integer_from_json(BuiltInKind::Int32, &json!("nine")).is_err());
        assert_eq!(int64_to_json(MAX_SAFE_INTEGER as i128, false), json!(MAX_SAFE_INTEGER));
        assert_eq!(
            int64_to_json(MAX_SAFE_INTEGER as i128 + 1, false),
            json!("9007199254740992")
        );
        assert_eq!(int64_to_json(5, true), json!("5"));
    }
}
