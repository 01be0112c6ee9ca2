// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Standard structured types carried in extension objects.

use crate::{
    codec::{Decodeable, Decoder, Encodeable, Encoder},
    types::{
        argument::Argument, date_time::DateTime, diagnostic_info::DiagnosticInfo,
        error::EncodingResult, localized_text::LocalizedText, node_id::NodeId,
        status_codes::StatusCode, string::UAString, variant::Variant,
    },
};

/// The result of a method call or an operation together with its diagnostics.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StatusResult {
    pub status_code: StatusCode,
    pub diagnostic_info: DiagnosticInfo,
}

impl Encodeable for StatusResult {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> EncodingResult<()> {
        encoder.write_status_code(Some("StatusCode"), self.status_code)?;
        encoder.write_diagnostic_info(Some("DiagnosticInfo"), &self.diagnostic_info)
    }
}

impl Decodeable for StatusResult {
    const TYPE_NAME: &'static str = "StatusResult";

    fn decode(decoder: &mut dyn Decoder) -> EncodingResult<Self> {
        Ok(StatusResult {
            status_code: decoder.read_status_code(Some("StatusCode"))?,
            diagnostic_info: decoder.read_diagnostic_info(Some("DiagnosticInfo"))?,
        })
    }
}

/// A range of values
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Encodeable for Range {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> EncodingResult<()> {
        encoder.write_double(Some("Low"), self.low)?;
        encoder.write_double(Some("High"), self.high)
    }
}

impl Decodeable for Range {
    const TYPE_NAME: &'static str = "Range";

    fn decode(decoder: &mut dyn Decoder) -> EncodingResult<Self> {
        Ok(Range {
            low: decoder.read_double(Some("Low"))?,
            high: decoder.read_double(Some("High"))?,
        })
    }
}

/// Engineering units of a value
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EUInformation {
    pub namespace_uri: UAString,
    pub unit_id: i32,
    pub display_name: LocalizedText,
    pub description: LocalizedText,
}

impl Encodeable for EUInformation {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> EncodingResult<()> {
        encoder.write_string(Some("NamespaceUri"), &self.namespace_uri)?;
        encoder.write_int32(Some("UnitId"), self.unit_id)?;
        encoder.write_localized_text(Some("DisplayName"), &self.display_name)?;
        encoder.write_localized_text(Some("Description"), &self.description)
    }
}

impl Decodeable for EUInformation {
    const TYPE_NAME: &'static str = "EUInformation";

    fn decode(decoder: &mut dyn Decoder) -> EncodingResult<Self> {
        Ok(EUInformation {
            namespace_uri: decoder.read_string(Some("NamespaceUri"))?,
            unit_id: decoder.read_int32(Some("UnitId"))?,
            display_name: decoder.read_localized_text(Some("DisplayName"))?,
            description: decoder.read_localized_text(Some("Description"))?,
        })
    }
}

/// Diagnostics of a program, including the last method called on it.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ProgramDiagnostic2DataType {
    pub create_session_id: NodeId,
    pub create_client_name: UAString,
    pub invocation_creation_time: DateTime,
    pub last_transition_time: DateTime,
    pub last_method_call: UAString,
    pub last_method_session_id: NodeId,
    pub last_method_input_arguments: Option<Vec<Argument>>,
    pub last_method_output_arguments: Option<Vec<Argument>>,
    pub last_method_input_values: Option<Vec<Variant>>,
    pub last_method_output_values: Option<Vec<Variant>>,
    pub last_method_call_time: DateTime,
    pub last_method_return_status: StatusResult,
}

impl Encodeable for ProgramDiagnostic2DataType {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> EncodingResult<()> {
        encoder.write_node_id(Some("CreateSessionId"), &self.create_session_id)?;
        encoder.write_string(Some("CreateClientName"), &self.create_client_name)?;
        encoder.write_date_time(
            Some("InvocationCreationTime"),
            self.invocation_creation_time,
        )?;
        encoder.write_date_time(Some("LastTransitionTime"), self.last_transition_time)?;
        encoder.write_string(Some("LastMethodCall"), &self.last_method_call)?;
        encoder.write_node_id(Some("LastMethodSessionId"), &self.last_method_session_id)?;
        encoder.write_encodeable_array(
            Some("LastMethodInputArguments"),
            self.last_method_input_arguments.as_deref(),
        )?;
        encoder.write_encodeable_array(
            Some("LastMethodOutputArguments"),
            self.last_method_output_arguments.as_deref(),
        )?;
        encoder.write_variant_array(
            Some("LastMethodInputValues"),
            self.last_method_input_values.as_deref(),
        )?;
        encoder.write_variant_array(
            Some("LastMethodOutputValues"),
            self.last_method_output_values.as_deref(),
        )?;
        encoder.write_date_time(Some("LastMethodCallTime"), self.last_method_call_time)?;
        encoder.write_encodeable(
            Some("LastMethodReturnStatus"),
            &self.last_method_return_status,
        )
    }
}

impl Decodeable for ProgramDiagnostic2DataType {
    const TYPE_NAME: &'static str = "ProgramDiagnostic2DataType";

    fn decode(decoder: &mut dyn Decoder) -> EncodingResult<Self> {
        Ok(ProgramDiagnostic2DataType {
            create_session_id: decoder.read_node_id(Some("CreateSessionId"))?,
            create_client_name: decoder.read_string(Some("CreateClientName"))?,
            invocation_creation_time: decoder.read_date_time(Some("InvocationCreationTime"))?,
            last_transition_time: decoder.read_date_time(Some("LastTransitionTime"))?,
            last_method_call: decoder.read_string(Some("LastMethodCall"))?,
            last_method_session_id: decoder.read_node_id(Some("LastMethodSessionId"))?,
            last_method_input_arguments: decoder
                .read_encodeable_array(Some("LastMethodInputArguments"))?,
            last_method_output_arguments: decoder
                .read_encodeable_array(Some("LastMethodOutputArguments"))?,
            last_method_input_values: decoder.read_variant_array(Some("LastMethodInputValues"))?,
            last_method_output_values: decoder
                .read_variant_array(Some("LastMethodOutputValues"))?,
            last_method_call_time: decoder.read_date_time(Some("LastMethodCallTime"))?,
            last_method_return_status: decoder
                .read_encodeable(Some("LastMethodReturnStatus"))?
                .unwrap_or_default(),
        })
    }
}
