// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `UAString` and `XmlElement`.

use std::{
    fmt,
    io::{Read, Write},
};

use crate::types::{
    encoding::{read_length_prefixed, write_length_prefixed, BinaryEncoder, DecodingOptions},
    error::EncodingResult,
    status_codes::StatusCode,
};

/// To avoid naming conflict hell, the OPC UA String type is typed `UAString` so it does not collide
/// with the Rust `String`.
///
/// A string contains UTF-8 encoded characters or a null value. A null value is distinct from
/// being an empty string so internally, the code maintains that distinction by holding the value
/// as an `Option<String>`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
pub struct UAString {
    value: Option<String>,
}

impl fmt::Display for UAString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(ref value) => write!(f, "{}", value),
            None => write!(f, "[null]"),
        }
    }
}

impl BinaryEncoder<UAString> for UAString {
    fn byte_len(&self) -> usize {
        // Length plus the actual string length in bytes for a non-null string.
        4 + self.value.as_ref().map_or(0, |v| v.len())
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        // Strings are encoded as UTF8 chars preceded by an Int32 length. A -1 indicates a null string
        write_length_prefixed(stream, self.value.as_ref().map(|v| v.as_bytes()))
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        match read_length_prefixed(stream, decoding_options.max_string_length, "String")? {
            None => Ok(UAString::null()),
            Some(buf) => {
                let value = String::from_utf8(buf).map_err(|err| {
                    trace!("Decoded string was not valid UTF-8 - {}", err);
                    StatusCode::BadDecodingError
                })?;
                Ok(UAString::from(value))
            }
        }
    }
}

impl From<UAString> for String {
    fn from(value: UAString) -> Self {
        value.value.unwrap_or_default()
    }
}

impl AsRef<str> for UAString {
    fn as_ref(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl<'a> From<&'a str> for UAString {
    fn from(value: &'a str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<&String> for UAString {
    fn from(value: &String) -> Self {
        Self::from(value.clone())
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        UAString { value: Some(value) }
    }
}

impl From<Option<String>> for UAString {
    fn from(value: Option<String>) -> Self {
        UAString { value }
    }
}

impl PartialEq<str> for UAString {
    fn eq(&self, other: &str) -> bool {
        match self.value {
            None => false,
            Some(ref v) => v.eq(other),
        }
    }
}

impl UAString {
    pub fn value(&self) -> &Option<String> {
        &self.value
    }

    /// Returns true if the string is null or empty, false otherwise
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, |v| v.is_empty())
    }

    /// Returns the length of the string in bytes or -1 for null.
    pub fn len(&self) -> isize {
        self.value.as_ref().map_or(-1, |v| v.len() as isize)
    }

    /// Create a null string (not the same as an empty string).
    pub fn null() -> UAString {
        UAString { value: None }
    }

    /// Test if the string is null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

/// An XML element. It is held as text and has the same binary layout as a string, but it is a
/// distinct built-in kind so it is a distinct type.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, Serialize, Deserialize)]
pub struct XmlElement(UAString);

impl XmlElement {
    pub fn null() -> XmlElement {
        XmlElement(UAString::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_ua_string(&self) -> &UAString {
        &self.0
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for XmlElement {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl From<UAString> for XmlElement {
    fn from(value: UAString) -> Self {
        XmlElement(value)
    }
}

impl<'a> From<&'a str> for XmlElement {
    fn from(value: &'a str) -> Self {
        XmlElement(UAString::from(value))
    }
}

impl From<String> for XmlElement {
    fn from(value: String) -> Self {
        XmlElement(UAString::from(value))
    }
}

impl BinaryEncoder<XmlElement> for XmlElement {
    fn byte_len(&self) -> usize {
        self.0.byte_len()
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        self.0.encode(stream)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        Ok(XmlElement(UAString::decode(stream, decoding_options)?))
    }
}

#[test]
fn string_null() {
    let s = UAString::null();
    assert!(s.is_null());
    assert!(s.is_empty());
    assert_eq!(s.len(), -1);
}

#[test]
fn string_empty() {
    let s = UAString::from("");
    assert!(!s.is_null());
    assert!(s.is_empty());
    assert_eq!(s.len(), 0);
}

#[test]
fn string_value() {
    let v = "Mary had a little lamb";
    let s = UAString::from(v);
    assert!(!s.is_null());
    assert!(!s.is_empty());
    assert_eq!(s.as_ref(), v);
}

#[test]
fn string_eq() {
    let s = UAString::null();
    assert!(!s.eq(""));

    let s = UAString::from("");
    assert!(s.eq(""));

    let s = UAString::from("Sunshine");
    assert!(s.ne("Moonshine"));
    assert!(s.eq("Sunshine"));
    assert!(!s.eq("Sunshine "));
}

#[test]
fn string_decode_limit() {
    use std::io::Cursor;
    let s = UAString::from("0123456789");
    let mut stream = Cursor::new(s.encode_to_vec());
    let mut decoding_options = DecodingOptions::test();
    decoding_options.max_string_length = 5;
    let err = UAString::decode(&mut stream, &decoding_options).unwrap_err();
    assert_eq!(err.status(), StatusCode::BadEncodingLimitsExceeded);
}

#[test]
fn xml_element_is_not_a_string() {
    let x = XmlElement::from("<a/>");
    assert_eq!(x.as_ref(), "<a/>");
    assert_eq!(x.encode_to_vec(), UAString::from("<a/>").encode_to_vec());
    assert!(XmlElement::null().is_null());
}
