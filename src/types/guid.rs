// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The `Guid` kind. Every codec but binary writes it as hyphenated text, the binary codec as
//! its 16 raw bytes.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::types::{
    encoding::*,
    error::{EncodingError, EncodingResult},
};

/// A 16 byte identifier, used on its own or as the identifier of a `NodeId`.
#[derive(Eq, PartialEq, Clone, Hash)]
pub struct Guid {
    uuid: Uuid,
}

impl Guid {
    /// The all zero guid, which is the null value of the kind
    pub fn null() -> Guid {
        Guid::from(Uuid::nil())
    }

    pub fn is_null(&self) -> bool {
        self.uuid.is_nil()
    }

    /// A random (v4) guid
    pub fn new() -> Guid {
        Guid::from(Uuid::new_v4())
    }

    /// The bytes in the order the binary codec writes them
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.uuid.as_bytes()
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Guid {
        Guid::from(Uuid::from_bytes(bytes))
    }
}

impl Default for Guid {
    fn default() -> Self {
        Guid::null()
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Guid { uuid }
    }
}

impl FromStr for Guid {
    type Err = EncodingError;

    /// Reads the hyphenated, simple or braced text forms
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Uuid::from_str(s.trim()) {
            Ok(uuid) => Ok(Guid::from(uuid)),
            Err(err) => {
                error!("Cannot read a guid from {:?}, {}", s, err);
                Err(EncodingError::InvalidIdentifier(format!("{} is not a guid", s)))
            }
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uuid.hyphenated())
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid.hyphenated())
    }
}

// Serde uses the same text as the JSON and XML codecs
impl Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D>(deserializer: D) -> Result<Guid, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Guid::from_str(&text).map_err(D::Error::custom)
    }
}

impl BinaryEncoder<Guid> for Guid {
    fn byte_len(&self) -> usize {
        16
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        process_encode_io_result(stream.write(self.as_bytes()))
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        let mut bytes = [0u8; 16];
        process_decode_io_result(stream.read_exact(&mut bytes))?;
        Ok(Guid::from_bytes(bytes))
    }
}

#[test]
fn guid_parse() {
    let g = Guid::from_str("72962b91-fa75-4ae6-8d28-b404dc7daf63").unwrap();
    assert_eq!(format!("{}", g), "72962b91-fa75-4ae6-8d28-b404dc7daf63");
    assert!(matches!(
        Guid::from_str("not-a-guid"),
        Err(EncodingError::InvalidIdentifier(_))
    ));
    assert_eq!(
        Guid::from_str(" {72962B91-FA75-4AE6-8D28-B404DC7DAF63} ").unwrap(),
        g
    );
    assert!(Guid::null().is_null());
    assert!(!Guid::new().is_null());
    assert_eq!(serde_json::to_string(&g).unwrap(), "\"72962b91-fa75-4ae6-8d28-b404dc7daf63\"");
}
