// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Descriptions of the standard structured types. The field order is the order the types write
//! their fields in.

use crate::{
    catalogue::{FieldDescription as Field, TypeDescription},
    types::{
        builtin_kind::BuiltInKind,
        node_ids::{DataTypeId, ObjectId},
    },
};

pub(super) fn descriptions() -> Vec<TypeDescription> {
    vec![
        TypeDescription {
            name: "Argument",
            data_type_id: DataTypeId::Argument.into(),
            encoding_id: ObjectId::Argument_Encoding_DefaultBinary.into(),
            fields: vec![
                Field::scalar("Name", BuiltInKind::String),
                Field::scalar("DataType", BuiltInKind::NodeId),
                Field::scalar("ValueRank", BuiltInKind::Int32),
                Field::array("ArrayDimensions", BuiltInKind::UInt32),
                Field::scalar("Description", BuiltInKind::LocalizedText),
            ],
        },
        TypeDescription {
            name: "StatusResult",
            data_type_id: DataTypeId::StatusResult.into(),
            encoding_id: ObjectId::StatusResult_Encoding_DefaultBinary.into(),
            fields: vec![
                Field::scalar("StatusCode", BuiltInKind::StatusCode),
                Field::scalar("DiagnosticInfo", BuiltInKind::DiagnosticInfo),
            ],
        },
        TypeDescription {
            name: "Range",
            data_type_id: DataTypeId::Range.into(),
            encoding_id: ObjectId::Range_Encoding_DefaultBinary.into(),
            fields: vec![
                Field::scalar("Low", BuiltInKind::Double),
                Field::scalar("High", BuiltInKind::Double),
            ],
        },
        TypeDescription {
            name: "EUInformation",
            data_type_id: DataTypeId::EUInformation.into(),
            encoding_id: ObjectId::EUInformation_Encoding_DefaultBinary.into(),
            fields: vec![
                Field::scalar("NamespaceUri", BuiltInKind::String),
                Field::scalar("UnitId", BuiltInKind::Int32),
                Field::scalar("DisplayName", BuiltInKind::LocalizedText),
                Field::scalar("Description", BuiltInKind::LocalizedText),
            ],
        },
        TypeDescription {
            name: "ProgramDiagnostic2DataType",
            data_type_id: DataTypeId::ProgramDiagnostic2DataType.into(),
            encoding_id: ObjectId::ProgramDiagnostic2DataType_Encoding_DefaultBinary.into(),
            fields: vec![
                Field::scalar("CreateSessionId", BuiltInKind::NodeId),
                Field::scalar("CreateClientName", BuiltInKind::String),
                Field::scalar("InvocationCreationTime", BuiltInKind::DateTime),
                Field::scalar("LastTransitionTime", BuiltInKind::DateTime),
                Field::scalar("LastMethodCall", BuiltInKind::String),
                Field::scalar("LastMethodSessionId", BuiltInKind::NodeId),
                Field::structure_array("LastMethodInputArguments", "Argument"),
                Field::structure_array("LastMethodOutputArguments", "Argument"),
                Field::array("LastMethodInputValues", BuiltInKind::Variant),
                Field::array("LastMethodOutputValues", BuiltInKind::Variant),
                Field::scalar("LastMethodCallTime", BuiltInKind::DateTime),
                Field::structure("LastMethodReturnStatus", "StatusResult"),
            ],
        },
    ]
}
