// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The closed set of built-in kinds. Every variant, array and matrix carries exactly one of
//! them to describe its element type.

use std::{fmt, str::FromStr};

use crate::types::{
    error::{EncodingError, EncodingResult},
    node_id::NodeId,
    node_ids::DataTypeId,
    status_codes::StatusCode,
};

/// The kind of a value without its payload. The discriminants are the built-in type ids of
/// OPC UA Part 6, which are also the values used in a variant encoding mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltInKind {
    /// Null / Empty
    Null = 0,
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    XmlElement = 16,
    NodeId = 17,
    ExpandedNodeId = 18,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    ExtensionObject = 22,
    DataValue = 23,
    Variant = 24,
    DiagnosticInfo = 25,
    /// Marker for structured values described by the type catalogue. It never appears on the wire.
    Encodeable = 255,
}

/// All kinds that can be carried by a variant, in type id order.
pub const BUILT_IN_KINDS: [BuiltInKind; 25] = [
    BuiltInKind::Boolean,
    BuiltInKind::SByte,
    BuiltInKind::Byte,
    BuiltInKind::Int16,
    BuiltInKind::UInt16,
    BuiltInKind::Int32,
    BuiltInKind::UInt32,
    BuiltInKind::Int64,
    BuiltInKind::UInt64,
    BuiltInKind::Float,
    BuiltInKind::Double,
    BuiltInKind::String,
    BuiltInKind::DateTime,
    BuiltInKind::Guid,
    BuiltInKind::ByteString,
    BuiltInKind::XmlElement,
    BuiltInKind::NodeId,
    BuiltInKind::ExpandedNodeId,
    BuiltInKind::StatusCode,
    BuiltInKind::QualifiedName,
    BuiltInKind::LocalizedText,
    BuiltInKind::ExtensionObject,
    BuiltInKind::DataValue,
    BuiltInKind::Variant,
    BuiltInKind::DiagnosticInfo,
];

impl BuiltInKind {
    /// The built-in type id
    pub fn type_id(&self) -> u8 {
        *self as u8
    }

    pub fn from_type_id(type_id: u8) -> EncodingResult<BuiltInKind> {
        if type_id == 0 {
            Ok(BuiltInKind::Null)
        } else {
            BUILT_IN_KINDS
                .get(type_id as usize - 1)
                .copied()
                .ok_or_else(|| {
                    error!("Unrecognized built-in type id {}", type_id);
                    StatusCode::BadDecodingError.into()
                })
        }
    }

    /// The variant encoding mask of a scalar of this kind
    pub fn encoding_mask(&self) -> u8 {
        match self {
            BuiltInKind::Encodeable => EncodingMask::EXTENSION_OBJECT,
            _ => self.type_id(),
        }
    }

    pub fn from_encoding_mask(encoding_mask: u8) -> EncodingResult<Self> {
        Self::from_type_id(encoding_mask & !EncodingMask::ARRAY_MASK)
    }

    /// The name of the kind, which is also its element name in XML
    pub fn name(&self) -> &'static str {
        match self {
            BuiltInKind::Null => "Null",
            BuiltInKind::Boolean => "Boolean",
            BuiltInKind::SByte => "SByte",
            BuiltInKind::Byte => "Byte",
            BuiltInKind::Int16 => "Int16",
            BuiltInKind::UInt16 => "UInt16",
            BuiltInKind::Int32 => "Int32",
            BuiltInKind::UInt32 => "UInt32",
            BuiltInKind::Int64 => "Int64",
            BuiltInKind::UInt64 => "UInt64",
            BuiltInKind::Float => "Float",
            BuiltInKind::Double => "Double",
            BuiltInKind::String => "String",
            BuiltInKind::DateTime => "DateTime",
            BuiltInKind::Guid => "Guid",
            BuiltInKind::ByteString => "ByteString",
            BuiltInKind::XmlElement => "XmlElement",
            BuiltInKind::NodeId => "NodeId",
            BuiltInKind::ExpandedNodeId => "ExpandedNodeId",
            BuiltInKind::StatusCode => "StatusCode",
            BuiltInKind::QualifiedName => "QualifiedName",
            BuiltInKind::LocalizedText => "LocalizedText",
            BuiltInKind::ExtensionObject => "ExtensionObject",
            BuiltInKind::DataValue => "DataValue",
            BuiltInKind::Variant => "Variant",
            BuiltInKind::DiagnosticInfo => "DiagnosticInfo",
            BuiltInKind::Encodeable => "Encodeable",
        }
    }

    /// The data type node id of the kind
    pub fn data_type_id(&self) -> NodeId {
        match self {
            BuiltInKind::Null | BuiltInKind::Variant => DataTypeId::BaseDataType.into(),
            BuiltInKind::ExtensionObject | BuiltInKind::Encodeable => DataTypeId::Structure.into(),
            _ => NodeId::new(0, self.type_id() as u32),
        }
    }

    /// Tests and returns true if the kind is a numeric type
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating_point()
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            BuiltInKind::SByte
                | BuiltInKind::Byte
                | BuiltInKind::Int16
                | BuiltInKind::UInt16
                | BuiltInKind::Int32
                | BuiltInKind::UInt32
                | BuiltInKind::Int64
                | BuiltInKind::UInt64
        )
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, BuiltInKind::Float | BuiltInKind::Double)
    }
}

impl fmt::Display for BuiltInKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BuiltInKind {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BUILT_IN_KINDS
            .iter()
            .chain([BuiltInKind::Null, BuiltInKind::Encodeable].iter())
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| EncodingError::UnknownType(s.to_string()))
    }
}

pub(crate) struct EncodingMask;

impl EncodingMask {
    pub const EXTENSION_OBJECT: u8 = BuiltInKind::ExtensionObject as u8;
    /// Bit indicates an array with dimensions
    pub const ARRAY_DIMENSIONS_BIT: u8 = 1 << 6;
    /// Bit indicates an array with values
    pub const ARRAY_VALUES_BIT: u8 = 1 << 7;

    pub const ARRAY_MASK: u8 = EncodingMask::ARRAY_DIMENSIONS_BIT | EncodingMask::ARRAY_VALUES_BIT;
}

#[test]
fn kind_type_ids() {
    for (i, kind) in BUILT_IN_KINDS.iter().enumerate() {
        assert_eq!(kind.type_id() as usize, i + 1);
        assert_eq!(BuiltInKind::from_type_id(kind.type_id()).unwrap(), *kind);
        assert_eq!(BuiltInKind::from_str(kind.name()).unwrap(), *kind);
    }
    assert!(BuiltInKind::from_type_id(26).is_err());
    assert_eq!(
        BuiltInKind::from_encoding_mask(6 | EncodingMask::ARRAY_MASK).unwrap(),
        BuiltInKind::Int32
    );
    assert!(matches!(
        BuiltInKind::from_str("Int128"),
        Err(EncodingError::UnknownType(_))
    ));
}
