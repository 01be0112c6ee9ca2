// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `ByteString`.

use std::{
    convert::TryFrom,
    fmt,
    io::{Read, Write},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{
    builtin_kind::BuiltInKind,
    encoding::{read_length_prefixed, write_length_prefixed, BinaryEncoder, DecodingOptions},
    error::{EncodingError, EncodingResult},
    Guid,
};

/// A sequence of octets.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ByteString {
    pub value: Option<Vec<u8>>,
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.value.is_some() {
            serializer.serialize_str(&self.as_base64())
        } else {
            serializer.serialize_none()
        }
    }
}

struct ByteStringVisitor;

impl<'de> serde::de::Visitor<'de> for ByteStringVisitor {
    type Value = ByteString;
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a base64 encoded string value or null")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Self::Value::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Self::Value::from_base64(v).map_err(|_| de::Error::custom("Cannot decode base64 bytestring"))
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<ByteString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(ByteStringVisitor)
    }
}

impl BinaryEncoder<ByteString> for ByteString {
    fn byte_len(&self) -> usize {
        // Length plus the actual length of bytes (if not null)
        4 + self.value.as_ref().map_or(0, |v| v.len())
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        // Byte strings are encoded as bytes preceded by an Int32 length. A -1 indicates a null byte string
        write_length_prefixed(stream, self.value.as_deref())
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let value = read_length_prefixed(
            stream,
            decoding_options.max_byte_string_length,
            "ByteString",
        )?;
        Ok(ByteString { value })
    }
}

impl<'a, T> From<&'a T> for ByteString
where
    T: AsRef<[u8]> + ?Sized,
{
    fn from(value: &'a T) -> Self {
        Self::from(value.as_ref().to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        // Empty bytes will be treated as Some([])
        ByteString { value: Some(value) }
    }
}

impl From<Guid> for ByteString {
    fn from(value: Guid) -> Self {
        ByteString::from(value.as_bytes().to_vec())
    }
}

impl TryFrom<&ByteString> for Guid {
    type Error = EncodingError;

    fn try_from(value: &ByteString) -> Result<Self, Self::Error> {
        let bytes = value.as_ref();
        if bytes.len() != 16 {
            Err(EncodingError::InvalidIdentifier(format!(
                "a guid needs 16 bytes, not {}",
                bytes.len()
            )))
        } else {
            let mut guid = [0u8; 16];
            guid.copy_from_slice(bytes);
            Ok(Guid::from_bytes(guid))
        }
    }
}

impl Into<String> for ByteString {
    fn into(self) -> String {
        self.as_base64()
    }
}

impl ByteString {
    /// Create a null string (not the same as an empty string)
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    /// Test if the string is null
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    // Test if the bytestring has an empty value (not the same as null)
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(false, |v| v.is_empty())
    }

    /// Test if the string is null or empty
    pub fn is_null_or_empty(&self) -> bool {
        self.is_null() || self.is_empty()
    }

    /// Creates a byte string from a Base64 encoded string
    pub fn from_base64(data: &str) -> EncodingResult<ByteString> {
        STANDARD.decode(data).map(Self::from).map_err(|err| {
            error!("Cannot decode base64 text, {}", err);
            EncodingError::type_mismatch(BuiltInKind::ByteString, data)
        })
    }

    /// Encodes the bytestring as a Base64 encoded string
    pub fn as_base64(&self) -> String {
        STANDARD.encode(self.as_ref())
    }
}

#[test]
fn bytestring_null() {
    let v = ByteString::null();
    assert!(v.is_null());
    assert!(!v.is_empty());
}

#[test]
fn bytestring_empty() {
    let v = ByteString::from(&[]);
    assert!(!v.is_null());
    assert!(v.is_null_or_empty());
    assert!(v.is_empty());
}

#[test]
fn bytestring_bytes() {
    let a = [0x1u8, 0x2u8, 0x3u8, 0x4u8];
    let v = ByteString::from(&a);
    assert!(!v.is_null());
    assert!(!v.is_empty());
    assert_eq!(v.value.as_ref().unwrap(), &a);
}

#[test]
fn bytestring_base64() {
    let v = ByteString::from(b"hello");
    assert_eq!(v.as_base64(), "aGVsbG8=");
    assert_eq!(ByteString::from_base64("aGVsbG8=").unwrap(), v);
    assert!(ByteString::from_base64("!!").is_err());
}

#[test]
fn bytestring_guid() {
    let g = Guid::new();
    let b = ByteString::from(g.clone());
    assert_eq!(Guid::try_from(&b).unwrap(), g);
    assert!(Guid::try_from(&ByteString::from(&[1u8, 2u8])).is_err());
}
