// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Reads variants from loosely formed JSON, as typed in by a user or sent by a client that
//! knows the data type of a node but not the OPC UA JSON encoding.
//!
//! The hint is the kind the value should have. Without one, or with a `Null` or `Variant` hint,
//! the kind is inferred the way the non-reversible decoder infers it. Either way an object
//! holding a type and a body, e.g. `{"Type":"Int32","Body":5}` or
//! `{"DataType":"Int32","Value":5}`, carries its own kind. Keys and type names are matched
//! without regard to case.

use serde_json::{Map, Value};

use crate::types::{
    array::Array,
    builtin_kind::BuiltInKind,
    encoding::DecodingOptions,
    error::EncodingResult,
    matrix::Matrix,
    variant::Variant,
};

use super::{decoder::uniform_kind, *};

/// Reads a variant from a JSON value, converting it to the kind of the hint. An array becomes
/// an array of the hinted kind and nested arrays become a matrix.
pub fn decode_variant(value: &Value, hint: Option<BuiltInKind>) -> EncodingResult<Variant> {
    let decoder = JsonDecoder::new(&[], JsonOptions::default(), DecodingOptions::default())?;
    LooseReader { decoder: &decoder }.variant(value, hint)
}

/// Reads a variant from text. The text is JSON, or failing that a list of values separated by
/// commas, optionally in brackets, where each value may be quoted with single or double quotes.
pub fn decode_variant_str(text: &str, hint: Option<BuiltInKind>) -> EncodingResult<Variant> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Variant::Empty);
    }
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => {
            trace!("Text is not JSON, reading it as a list of values");
            loose_list(text)
        }
    };
    decode_variant(&value, hint)
}

struct LooseReader<'a> {
    decoder: &'a JsonDecoder,
}

impl<'a> LooseReader<'a> {
    fn variant(&self, value: &Value, hint: Option<BuiltInKind>) -> EncodingResult<Variant> {
        if let Value::Object(map) = value {
            if let Some((kind, body)) = typed_body(map)? {
                return self.variant(body, Some(kind));
            }
        }
        match hint {
            None | Some(BuiltInKind::Null) | Some(BuiltInKind::Variant) => match value {
                Value::Array(values) if values.is_empty() => Ok(Variant::Empty),
                Value::Array(values) if !values.iter().all(Value::is_array) => {
                    // Elements may be typed objects of their own
                    let values = values
                        .iter()
                        .map(|v| self.variant(v, None))
                        .collect::<EncodingResult<Vec<_>>>()?;
                    let kind = uniform_kind(&values);
                    Ok(Variant::from(Array::new(kind, values)?))
                }
                value => self.decoder.json_to_variant(value),
            },
            Some(kind) => match value {
                Value::Array(values) if !values.is_empty() && values.iter().all(Value::is_array) => {
                    let dimensions = infer_dimensions(value);
                    let values = flatten(value.clone(), &dimensions)?
                        .iter()
                        .map(|v| self.scalar(kind, v))
                        .collect::<EncodingResult<Vec<_>>>()?;
                    Ok(Variant::from(Matrix::from_variants(kind, values, dimensions)?))
                }
                Value::Array(values) => {
                    let values = values
                        .iter()
                        .map(|v| self.scalar(kind, v))
                        .collect::<EncodingResult<Vec<_>>>()?;
                    Ok(Variant::from(Array::new(kind, values)?))
                }
                value => self.scalar(kind, value),
            },
        }
    }

    /// Reads one value of the kind, accepting the JSON types a user would write for it
    fn scalar(&self, kind: BuiltInKind, value: &Value) -> EncodingResult<Variant> {
        match (kind, value) {
            (BuiltInKind::String | BuiltInKind::XmlElement, Value::Number(_) | Value::Bool(_)) => {
                self.decoder
                    .json_to_scalar(kind, &Value::String(value.to_string()))
            }
            (BuiltInKind::Boolean, Value::String(s)) => match s.trim() {
                s if s.eq_ignore_ascii_case("true") || s == "1" => Ok(Variant::Boolean(true)),
                s if s.eq_ignore_ascii_case("false") || s == "0" => Ok(Variant::Boolean(false)),
                _ => Err(mismatch(kind, value)),
            },
            (BuiltInKind::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Variant::Boolean(false)),
                Some(1) => Ok(Variant::Boolean(true)),
                _ => Err(mismatch(kind, value)),
            },
            _ => self.decoder.json_to_scalar(kind, value),
        }
    }
}

/// The kind and body of an object made of a type and a body and nothing else
fn typed_body(map: &Map<String, Value>) -> EncodingResult<Option<(BuiltInKind, &Value)>> {
    let key = |names: &[&str]| {
        map.iter()
            .find(|(k, _)| names.iter().any(|n| k.eq_ignore_ascii_case(n)))
            .map(|(_, v)| v)
    };
    let (kind, body) = match (key(&["Type", "DataType"]), key(&["Body", "Value"])) {
        (Some(kind), Some(body)) if map.len() == 2 => (kind, body),
        _ => return Ok(None),
    };
    let kind = match kind {
        Value::String(name) => BuiltInKind::from_str(name.trim())?,
        Value::Number(_) => {
            let type_id = u8::try_from(integer_from_json(BuiltInKind::Byte, kind)?)
                .map_err(|_| mismatch(BuiltInKind::Byte, kind))?;
            BuiltInKind::from_type_id(type_id)?
        }
        _ => return Ok(None),
    };
    Ok(Some((kind, body)))
}

/// Splits text on the commas outside of quotes. Quoted items are strings, the rest are read as
/// JSON where they can be and as strings where they can't.
fn loose_list(text: &str) -> Value {
    let (inner, bracketed) = match text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        Some(inner) => (inner, true),
        None => (text, false),
    };
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    let mut escaped = false;
    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == ',' => items.push(std::mem::take(&mut current)),
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }
    items.push(current);

    let mut values: Vec<Value> = items.iter().map(|item| loose_item(item.trim())).collect();
    if bracketed {
        if values.len() == 1 && inner.trim().is_empty() {
            values.clear();
        }
        Value::Array(values)
    } else if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

fn loose_item(item: &str) -> Value {
    for q in ['"', '\''] {
        if item.len() >= 2 && item.starts_with(q) && item.ends_with(q) {
            let inner = &item[1..item.len() - 1];
            return Value::String(inner.replace(&format!("\\{}", q), &q.to_string()));
        }
    }
    serde_json::from_str(item).unwrap_or_else(|_| Value::String(item.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn int32_hint() {
        let expected_array = Variant::from(vec![-123i32, -124, -125]);
        let cases: &[(&str, Variant)] = &[
            ("-123", Variant::Int32(-123)),
            ("\"-123\"", Variant::Int32(-123)),
            ("  '-123'", Variant::Int32(-123)),
            ("[-123, -124, -125]", expected_array.clone()),
            ("-123, -124, -125", expected_array.clone()),
            ("\"-123\",'-124',\"-125\"", expected_array.clone()),
            (" [\"-123\",'-124',\"-125\"] ", expected_array.clone()),
            ("{\"Type\":\"Int32\",\"Body\":-123}", Variant::Int32(-123)),
            ("{\"dataType\":\"Int32\",\"value\":[-123,-124,-125]}", expected_array),
        ];
        for (text, expected) in cases {
            let variant = decode_variant_str(text, Some(BuiltInKind::Int32)).unwrap();
            assert_eq!(&variant, expected, "decoding {}", text);
        }
        assert_eq!(
            decode_variant_str("[]", Some(BuiltInKind::Int32)).unwrap(),
            Variant::from(Array::new(BuiltInKind::Int32, Vec::new()).unwrap())
        );
        assert!(decode_variant_str("abc", Some(BuiltInKind::Int32)).is_err());
        assert!(decode_variant_str("3000000000", Some(BuiltInKind::Int32)).is_err());
    }

    #[test]
    fn no_hint_infers_int64() {
        for hint in [None, Some(BuiltInKind::Null), Some(BuiltInKind::Variant)] {
            assert_eq!(decode_variant(&json!(-123), hint).unwrap(), Variant::Int64(-123));
            assert_eq!(
                decode_variant(&json!([-123, -124, -125]), hint).unwrap(),
                Variant::from(vec![-123i64, -124, -125])
            );
            assert_eq!(decode_variant(&json!([]), hint).unwrap(), Variant::Empty);
        }
        assert_eq!(
            decode_variant_str("hello", None).unwrap(),
            Variant::from("hello")
        );
        assert_eq!(decode_variant_str("  ", None).unwrap(), Variant::Empty);
    }

    #[test]
    fn typed_objects_carry_their_kind() {
        let cases = [
            json!({"Type": "Int32", "Body": -123}),
            json!({"TYPE": "INT32", "BODY": -123}),
            json!({"type": "int32", "body": -123}),
            json!({"DataType": "Int32", "Value": -123}),
            json!({"Type": 6, "Body": -123}),
        ];
        for value in cases.iter() {
            for hint in [None, Some(BuiltInKind::Variant)] {
                assert_eq!(
                    decode_variant(value, hint).unwrap(),
                    Variant::Int32(-123),
                    "decoding {}",
                    value
                );
            }
        }
        assert_eq!(
            decode_variant(&json!({"Type": "Int32", "Body": []}), None).unwrap(),
            Variant::from(Array::new(BuiltInKind::Int32, Vec::new()).unwrap())
        );
        assert!(matches!(
            decode_variant(&json!({"Type": "Pump", "Body": 1}), None),
            Err(EncodingError::UnknownType(_))
        ));
    }

    #[test]
    fn nested_arrays_are_matrices() {
        let rows = json!([[[123, -124, 125], [123, -124, 125]], [[123, -124, 125], [123, -124, 125]]]);
        let elements: Vec<i32> = (0..4).flat_map(|_| vec![123, -124, 125]).collect();
        let expected = Variant::from(Matrix::new(elements, vec![2u32, 2, 3]).unwrap());
        assert_eq!(
            decode_variant(&rows, Some(BuiltInKind::Int32)).unwrap(),
            expected
        );
        let typed = json!({"dataType": "Int32", "value": rows});
        assert_eq!(decode_variant(&typed, None).unwrap(), expected);
        assert!(matches!(
            decode_variant(&json!([[1, 2], [3]]), Some(BuiltInKind::Int32)),
            Err(EncodingError::InvalidShape { .. })
        ));
    }

    #[test]
    fn other_hints() {
        assert_eq!(
            decode_variant_str("true", Some(BuiltInKind::Boolean)).unwrap(),
            Variant::Boolean(true)
        );
        assert_eq!(
            decode_variant_str("'False'", Some(BuiltInKind::Boolean)).unwrap(),
            Variant::Boolean(false)
        );
        assert_eq!(
            decode_variant_str("123", Some(BuiltInKind::String)).unwrap(),
            Variant::from("123")
        );
        assert_eq!(
            decode_variant_str("'a, b', \"c\"", Some(BuiltInKind::String)).unwrap(),
            Variant::from(&["a, b", "c"][..])
        );
        assert_eq!(
            decode_variant_str("1.5, 2", Some(BuiltInKind::Double)).unwrap(),
            Variant::from(vec![1.5f64, 2.0])
        );
        assert_eq!(
            decode_variant_str("\"-123\"", Some(BuiltInKind::Int64)).unwrap(),
            Variant::Int64(-123)
        );
    }
}
