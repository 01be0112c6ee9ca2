// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `ExtensionObject`.

use std::io::{Read, Write};

use crate::{
    catalogue::TypeCatalogue,
    codec::{binary::BinaryStreamDecoder, binary::BinaryStreamEncoder, Decodeable, Encodeable},
    types::{
        builtin_kind::BuiltInKind,
        byte_string::ByteString,
        encoding::*,
        error::{EncodingError, EncodingResult},
        node_id::NodeId,
        status_codes::StatusCode,
        string::{UAString, XmlElement},
    },
};

/// The body of an extension object. The encoding byte written on the wire is derived from it,
/// so an object without a body is always written with the `None` encoding.
#[derive(PartialEq, Debug, Clone)]
pub enum ExtensionObjectBody {
    /// For an extension object with nothing encoded with it
    None,
    /// For an extension object with data encoded in a ByteString
    Binary(ByteString),
    /// For an extension object with data encoded in an XML string
    Xml(XmlElement),
    /// For an extension object with data encoded as JSON text
    Json(String),
}

impl ExtensionObjectBody {
    fn encoding_byte(&self) -> u8 {
        match self {
            ExtensionObjectBody::None => 0x0,
            ExtensionObjectBody::Binary(_) => 0x1,
            ExtensionObjectBody::Xml(_) => 0x2,
            ExtensionObjectBody::Json(_) => 0x3,
        }
    }
}

/// An extension object holds a serialized object identified by its node id. Objects of types in
/// the type catalogue are held in their binary form with the binary encoding id as node id.
#[derive(PartialEq, Debug, Clone)]
pub struct ExtensionObject {
    pub node_id: NodeId,
    pub body: ExtensionObjectBody,
}

impl Default for ExtensionObject {
    fn default() -> Self {
        Self::null()
    }
}

impl BinaryEncoder<ExtensionObject> for ExtensionObject {
    fn byte_len(&self) -> usize {
        let mut size = self.node_id.byte_len();
        // Encoding mask + data
        size += 1 + match self.body {
            ExtensionObjectBody::None => 0,
            ExtensionObjectBody::Binary(ref value) => value.byte_len(),
            ExtensionObjectBody::Xml(ref value) => value.byte_len(),
            ExtensionObjectBody::Json(ref value) => 4 + value.len(),
        };
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size = 0;
        size += self.node_id.encode(stream)?;
        size += write_u8(stream, self.body.encoding_byte())?;
        size += match self.body {
            ExtensionObjectBody::None => 0,
            ExtensionObjectBody::Binary(ref value) => value.encode(stream)?,
            ExtensionObjectBody::Xml(ref value) => value.encode(stream)?,
            ExtensionObjectBody::Json(ref value) => {
                write_length_prefixed(stream, Some(value.as_bytes()))?
            }
        };
        debug_assert_eq!(size, self.byte_len());
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        // Extension object is depth checked to prevent deep recursion
        let _depth_lock = decoding_options.depth_lock()?;
        let node_id = NodeId::decode(stream, decoding_options)?;
        let encoding_type = u8::decode(stream, decoding_options)?;
        let body = match encoding_type {
            0x0 => ExtensionObjectBody::None,
            0x1 => ExtensionObjectBody::Binary(ByteString::decode(stream, decoding_options)?),
            0x2 => ExtensionObjectBody::Xml(XmlElement::decode(stream, decoding_options)?),
            0x3 => {
                let text = UAString::decode(stream, decoding_options)?;
                ExtensionObjectBody::Json(text.value().clone().unwrap_or_default())
            }
            _ => {
                error!("Invalid encoding type {} in stream", encoding_type);
                return Err(StatusCode::BadDecodingError.into());
            }
        };
        Ok(ExtensionObject { node_id, body })
    }
}

impl ExtensionObject {
    /// Creates a null extension object, i.e. one with no value or payload
    pub fn null() -> ExtensionObject {
        ExtensionObject {
            node_id: NodeId::null(),
            body: ExtensionObjectBody::None,
        }
    }

    /// Tests for null node id and no body.
    pub fn is_null(&self) -> bool {
        self.node_id.is_null() && self.is_empty()
    }

    /// Tests for empty body.
    pub fn is_empty(&self) -> bool {
        matches!(self.body, ExtensionObjectBody::None)
    }

    /// Returns a copy of the extension object with a different body
    pub fn with_body(&self, body: ExtensionObjectBody) -> ExtensionObject {
        ExtensionObject {
            node_id: self.node_id.clone(),
            body,
        }
    }

    /// Creates an extension object holding the binary encoding of a structured value. The type
    /// must be registered in the type catalogue so that its encoding id is known.
    pub fn from_encodeable<T>(value: &T) -> EncodingResult<ExtensionObject>
    where
        T: Encodeable,
    {
        let description = TypeCatalogue::global().resolve(value.type_name())?;
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions::default());
        value.encode(&mut encoder)?;
        Ok(ExtensionObject {
            node_id: description.encoding_id.clone(),
            body: ExtensionObjectBody::Binary(ByteString::from(encoder.into_bytes())),
        })
    }

    /// Decodes the binary body of the extension object as the structured type. The node id
    /// must be the binary encoding id of the type.
    pub fn decode_inner<T>(&self, decoding_options: &DecodingOptions) -> EncodingResult<T>
    where
        T: Decodeable,
    {
        let description = TypeCatalogue::global().resolve(T::TYPE_NAME)?;
        if self.node_id != description.encoding_id && self.node_id != description.data_type_id {
            error!(
                "Extension object holds {} which is not a {}",
                self.node_id,
                T::TYPE_NAME
            );
            return Err(EncodingError::type_mismatch(
                BuiltInKind::Encodeable,
                self.node_id.to_string(),
            ));
        }
        match self.body {
            ExtensionObjectBody::Binary(ref byte_string) => {
                let value = byte_string.value.as_deref().unwrap_or(&[]);
                let mut decoder = BinaryStreamDecoder::new(value, decoding_options.clone());
                T::decode(&mut decoder)
            }
            _ => {
                error!("decode_inner called on an extension object without a binary body");
                Err(StatusCode::BadDecodingError.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn extension_object_json_body() {
        let eo = ExtensionObject {
            node_id: NodeId::new(3, "Pump"),
            body: ExtensionObjectBody::Json(r#"{"Speed":5}"#.to_string()),
        };
        let buf = eo.encode_to_vec();
        assert_eq!(buf.len(), eo.byte_len());
        let decoded =
            ExtensionObject::decode(&mut Cursor::new(buf), &DecodingOptions::test()).unwrap();
        assert_eq!(decoded, eo);
    }

    #[test]
    fn extension_object_bad_encoding_byte() {
        let mut buf = NodeId::new(0, 1u32).encode_to_vec();
        buf.push(0x7);
        assert!(ExtensionObject::decode(&mut Cursor::new(buf), &DecodingOptions::test()).is_err());
    }

    #[test]
    fn extension_object_with_body() {
        let eo = ExtensionObject::null();
        assert!(eo.is_null());
        let eo2 = eo.with_body(ExtensionObjectBody::Xml(XmlElement::from("<A/>")));
        assert!(!eo2.is_empty());
        assert!(eo.is_empty());
    }
}
