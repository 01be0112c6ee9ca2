// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `NodeId`.

use std::{
    self, fmt,
    io::{Read, Write},
    str::FromStr,
};

use crate::types::{
    byte_string::ByteString,
    encoding::*,
    error::{EncodingError, EncodingResult},
    guid::Guid,
    status_codes::StatusCode,
    string::*,
};

/// The kind of identifier, numeric, string, guid or byte
#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(UAString),
    Guid(Guid),
    ByteString(ByteString),
}

/// The identifier type of a node id. The values are the `IdType` written by the JSON encoding.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Hash)]
pub enum IdType {
    Numeric = 0,
    String = 1,
    Guid = 2,
    Opaque = 3,
}

impl IdType {
    pub fn from_u8(value: u8) -> EncodingResult<IdType> {
        match value {
            0 => Ok(IdType::Numeric),
            1 => Ok(IdType::String),
            2 => Ok(IdType::Guid),
            3 => Ok(IdType::Opaque),
            _ => Err(EncodingError::InvalidIdentifier(format!(
                "{} is not an identifier type",
                value
            ))),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={}", *v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={:?}", v),
            Identifier::ByteString(v) => write!(f, "b={}", v.as_base64()),
        }
    }
}

impl FromStr for Identifier {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 2 || !s.is_char_boundary(2) {
            return Err(EncodingError::InvalidIdentifier(s.to_string()));
        }
        let (k, v) = s.split_at(2);
        let id_type = match k {
            "i=" => IdType::Numeric,
            "s=" => IdType::String,
            "g=" => IdType::Guid,
            "b=" => IdType::Opaque,
            _ => return Err(EncodingError::InvalidIdentifier(s.to_string())),
        };
        Identifier::parse(id_type, v)
    }
}

impl From<i32> for Identifier {
    fn from(v: i32) -> Self {
        Identifier::Numeric(v as u32)
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl<'a> From<&'a str> for Identifier {
    fn from(v: &'a str) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<&String> for Identifier {
    fn from(v: &String) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<UAString> for Identifier {
    fn from(v: UAString) -> Self {
        Identifier::String(v)
    }
}

impl From<Guid> for Identifier {
    fn from(v: Guid) -> Self {
        Identifier::Guid(v)
    }
}

impl From<ByteString> for Identifier {
    fn from(v: ByteString) -> Self {
        Identifier::ByteString(v)
    }
}

impl Identifier {
    pub fn id_type(&self) -> IdType {
        match self {
            Identifier::Numeric(_) => IdType::Numeric,
            Identifier::String(_) => IdType::String,
            Identifier::Guid(_) => IdType::Guid,
            Identifier::ByteString(_) => IdType::Opaque,
        }
    }

    /// Parses the text form of an identifier of the given type, e.g. the digits of a numeric
    /// identifier or the base64 of an opaque one.
    pub fn parse(id_type: IdType, value: &str) -> EncodingResult<Identifier> {
        let invalid = || {
            EncodingError::InvalidIdentifier(format!("{} is not a {:?} identifier", value, id_type))
        };
        match id_type {
            IdType::Numeric => value.parse::<u32>().map(Identifier::from).map_err(|_| invalid()),
            IdType::String => Ok(Identifier::from(value)),
            IdType::Guid => Guid::from_str(value).map(Identifier::from).map_err(|_| invalid()),
            IdType::Opaque => ByteString::from_base64(value)
                .map(Identifier::from)
                .map_err(|_| invalid()),
        }
    }

    /// The identifier without its type prefix, as written by the JSON and XML encodings.
    pub fn value_text(&self) -> String {
        match self {
            Identifier::Numeric(v) => v.to_string(),
            Identifier::String(v) => v.to_string(),
            Identifier::Guid(v) => v.to_string(),
            Identifier::ByteString(v) => v.as_base64(),
        }
    }
}

/// An identifier for a node in the address space of an OPC UA Server.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// The index for a namespace
    pub namespace: u16,
    /// The identifier for the node in the address space
    pub identifier: Identifier,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl BinaryEncoder<NodeId> for NodeId {
    fn byte_len(&self) -> usize {
        // Type determines the byte code
        match self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && value <= 255 {
                    2
                } else if self.namespace <= 255 && value <= 65535 {
                    4
                } else {
                    7
                }
            }
            Identifier::String(ref value) => 3 + value.byte_len(),
            Identifier::Guid(ref value) => 3 + value.byte_len(),
            Identifier::ByteString(ref value) => 3 + value.byte_len(),
        }
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        self.encode_with_flags(stream, 0)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let encoding_byte = read_u8(stream)?;
        NodeId::decode_body(stream, encoding_byte, decoding_options)
    }
}

impl NodeId {
    /// Writes the node id with extra flag bits in the upper part of its encoding byte. The
    /// expanded node id puts its namespace uri and server index flags there.
    pub(crate) fn encode_with_flags<S: Write>(
        &self,
        stream: &mut S,
        flags: u8,
    ) -> EncodingResult<usize> {
        let mut size: usize = 0;
        // Type determines the byte code
        match &self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && *value <= 255 {
                    // node id fits into 2 bytes when the namespace is 0 and the value <= 255
                    size += write_u8(stream, flags)?;
                    size += write_u8(stream, *value as u8)?;
                } else if self.namespace <= 255 && *value <= 65535 {
                    // node id fits into 4 bytes when namespace <= 255 and value <= 65535
                    size += write_u8(stream, flags | 0x1)?;
                    size += write_u8(stream, self.namespace as u8)?;
                    size += write_u16(stream, *value as u16)?;
                } else {
                    // full node id
                    size += write_u8(stream, flags | 0x2)?;
                    size += write_u16(stream, self.namespace)?;
                    size += write_u32(stream, *value)?;
                }
            }
            Identifier::String(value) => {
                size += write_u8(stream, flags | 0x3)?;
                size += write_u16(stream, self.namespace)?;
                size += value.encode(stream)?;
            }
            Identifier::Guid(value) => {
                size += write_u8(stream, flags | 0x4)?;
                size += write_u16(stream, self.namespace)?;
                size += value.encode(stream)?;
            }
            Identifier::ByteString(value) => {
                size += write_u8(stream, flags | 0x5)?;
                size += write_u16(stream, self.namespace)?;
                size += value.encode(stream)?;
            }
        }
        Ok(size)
    }

    /// Reads the node id that follows an encoding byte. Only the low nibble of the byte selects
    /// the identifier layout.
    pub(crate) fn decode_body<S: Read>(
        stream: &mut S,
        encoding_byte: u8,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<NodeId> {
        let identifier = encoding_byte & 0x0f;
        let node_id = match identifier {
            0x0 => NodeId::new(0, u32::from(read_u8(stream)?)),
            0x1 => {
                let namespace = read_u8(stream)?;
                let value = read_u16(stream)?;
                NodeId::new(u16::from(namespace), u32::from(value))
            }
            0x2 => {
                let namespace = read_u16(stream)?;
                let value = read_u32(stream)?;
                NodeId::new(namespace, value)
            }
            0x3 => {
                let namespace = read_u16(stream)?;
                let value = UAString::decode(stream, decoding_options)?;
                NodeId::new(namespace, value)
            }
            0x4 => {
                let namespace = read_u16(stream)?;
                let value = Guid::decode(stream, decoding_options)?;
                NodeId::new(namespace, value)
            }
            0x5 => {
                let namespace = read_u16(stream)?;
                let value = ByteString::decode(stream, decoding_options)?;
                NodeId::new(namespace, value)
            }
            _ => {
                error!("Unrecognized node id type {}", identifier);
                return Err(StatusCode::BadDecodingError.into());
            }
        };
        Ok(node_id)
    }
}

impl FromStr for NodeId {
    type Err = EncodingError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use regex::Regex;

        // Parses a node from a string using the format specified in 5.3.1.10 part 6
        //
        // ns=<namespaceindex>;<type>=<value>
        //
        // Where type:
        //   i = NUMERIC
        //   s = STRING
        //   g = GUID
        //   b = OPAQUE (ByteString)
        //
        // If namespace == 0, the ns=0; will be omitted

        lazy_static! {
            // Contains capture groups "ns" and "t" for namespace and type respectively
            static ref RE: Regex = Regex::new(r"^(ns=(?P<ns>[0-9]+);)?(?P<t>[isgb]=.+)$").unwrap();
        }

        let invalid = || EncodingError::InvalidIdentifier(s.to_string());
        let captures = RE.captures(s).ok_or_else(invalid)?;

        // Check namespace (optional)
        let namespace = if let Some(ns) = captures.name("ns") {
            ns.as_str().parse::<u16>().map_err(|_| invalid())?
        } else {
            0
        };

        // Type identifier
        let t = captures.name("t").ok_or_else(invalid)?;
        Identifier::from_str(t.as_str()).map(|t| NodeId::new(namespace, t))
    }
}

impl From<&NodeId> for NodeId {
    fn from(v: &NodeId) -> Self {
        v.clone()
    }
}

impl Into<String> for NodeId {
    fn into(self) -> String {
        self.to_string()
    }
}

impl<'a> From<(u16, &'a str)> for NodeId {
    fn from(v: (u16, &'a str)) -> Self {
        Self::new(v.0, UAString::from(v.1))
    }
}

impl From<(u16, u32)> for NodeId {
    fn from(v: (u16, u32)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, Guid)> for NodeId {
    fn from(v: (u16, Guid)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, ByteString)> for NodeId {
    fn from(v: (u16, ByteString)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl NodeId {
    // Constructs a new NodeId from anything that can be turned into Identifier
    // u32, Guid, ByteString or String
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    /// Constructs a node id from an identifier type and the text of its value. Fails with
    /// `InvalidIdentifier` when the value cannot be an identifier of that type.
    pub fn try_new(namespace: u16, id_type: IdType, value: &str) -> EncodingResult<NodeId> {
        Ok(NodeId {
            namespace,
            identifier: Identifier::parse(id_type, value)?,
        })
    }

    /// Test if the node id is null, i.e. 0 namespace and 0 identifier
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// Returns a null node id
    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    /// Test if the node id is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self.identifier, Identifier::Numeric(_))
    }

    /// Test if the node id is a string
    pub fn is_string(&self) -> bool {
        matches!(self.identifier, Identifier::String(_))
    }

    /// Test if the node id is a guid
    pub fn is_guid(&self) -> bool {
        matches!(self.identifier, Identifier::Guid(_))
    }

    /// Test if the node id us a byte string
    pub fn is_byte_string(&self) -> bool {
        matches!(self.identifier, Identifier::ByteString(_))
    }

    /// Returns the numeric identifier of a namespace 0 node id
    pub fn as_ns0_numeric(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => Some(id),
            _ => None,
        }
    }
}
