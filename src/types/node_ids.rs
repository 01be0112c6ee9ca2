// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Well known node ids of namespace 0 that the codec refers to.

use crate::types::node_id::NodeId;

/// Data type node ids of the built-in types and the structured types in the default catalogue.
#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum DataTypeId {
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
    Structure = 22,
    DataValue = 23,
    BaseDataType = 24,
    DiagnosticInfo = 25,
    Argument = 296,
    StatusResult = 299,
    Range = 884,
    EUInformation = 887,
    ProgramDiagnostic2DataType = 15396,
}

/// Encoding object ids of the structured types in the default catalogue.
#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum ObjectId {
    Argument_Encoding_DefaultBinary = 298,
    StatusResult_Encoding_DefaultBinary = 301,
    Range_Encoding_DefaultBinary = 886,
    EUInformation_Encoding_DefaultBinary = 889,
    ProgramDiagnostic2DataType_Encoding_DefaultBinary = 15401,
}

impl From<DataTypeId> for NodeId {
    fn from(value: DataTypeId) -> Self {
        NodeId::new(0, value as u32)
    }
}

impl From<ObjectId> for NodeId {
    fn from(value: ObjectId) -> Self {
        NodeId::new(0, value as u32)
    }
}
