// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

use crate::{
    codec::{Decodeable, Decoder, Encodeable, Encoder},
    types::{
        error::EncodingResult, localized_text::LocalizedText, node_id::NodeId,
        status_codes::StatusCode, string::UAString,
    },
};

// From OPC UA Part 3 - Address Space Model 1.03 Specification
//
// This Structured DataType defines a Method input or output argument specification. It is for
// example used in the input and output argument Properties for Methods. Its elements are described in
// Table23

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Argument {
    pub name: UAString,
    pub data_type: NodeId,
    pub value_rank: i32,
    pub array_dimensions: Option<Vec<u32>>,
    pub description: LocalizedText,
}

impl Argument {
    pub fn new<T>(name: &str, data_type: T, value_rank: i32, description: &str) -> Argument
    where
        T: Into<NodeId>,
    {
        Argument {
            name: UAString::from(name),
            data_type: data_type.into(),
            value_rank,
            array_dimensions: None,
            description: LocalizedText::from(description),
        }
    }

    /// Array dimensions, if any are given, must agree with a positive value rank
    fn check_dimensions(&self) -> EncodingResult<()> {
        match self.array_dimensions {
            Some(ref array_dimensions)
                if self.value_rank > 0
                    && !array_dimensions.is_empty()
                    && self.value_rank as usize != array_dimensions.len() =>
            {
                error!(
                    "The array dimensions {} of the Argument should match value rank {} and they don't",
                    array_dimensions.len(),
                    self.value_rank
                );
                Err(StatusCode::BadDataEncodingInvalid.into())
            }
            _ => Ok(()),
        }
    }
}

impl Encodeable for Argument {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> EncodingResult<()> {
        self.check_dimensions()?;
        encoder.write_string(Some("Name"), &self.name)?;
        encoder.write_node_id(Some("DataType"), &self.data_type)?;
        encoder.write_int32(Some("ValueRank"), self.value_rank)?;
        encoder.write_uint32_array(Some("ArrayDimensions"), self.array_dimensions.as_deref())?;
        encoder.write_localized_text(Some("Description"), &self.description)
    }
}

impl Decodeable for Argument {
    const TYPE_NAME: &'static str = "Argument";

    fn decode(decoder: &mut dyn Decoder) -> EncodingResult<Self> {
        let argument = Argument {
            name: decoder.read_string(Some("Name"))?,
            data_type: decoder.read_node_id(Some("DataType"))?,
            value_rank: decoder.read_int32(Some("ValueRank"))?,
            array_dimensions: decoder.read_uint32_array(Some("ArrayDimensions"))?,
            description: decoder.read_localized_text(Some("Description"))?,
        };
        argument.check_dimensions()?;
        Ok(argument)
    }
}
