// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The OPC UA built-in types and their binary encoding.

pub mod constants {
    /// Default maximum number of elements in an array
    pub const MAX_ARRAY_LENGTH: usize = 1000;
    /// Default maximum size of a string in bytes
    pub const MAX_STRING_LENGTH: usize = 65535;
    /// Default maximum size of a byte string in bytes
    pub const MAX_BYTE_STRING_LENGTH: usize = 65535;
    /// Default maximum depth of nested variants, extension objects, structures and arrays
    pub const MAX_DECODING_DEPTH: usize = 10;
}

pub mod argument;
pub mod array;
pub mod basic_types;
pub mod builtin_kind;
pub mod byte_string;
pub mod data_value;
pub mod date_time;
pub mod diagnostic_info;
pub mod encoding;
pub mod error;
pub mod expanded_node_id;
pub mod extension_object;
pub mod guid;
pub mod localized_text;
pub mod matrix;
pub mod node_id;
pub mod node_ids;
pub mod qualified_name;
pub mod status_code;
pub mod status_codes;
pub mod string;
pub mod structures;
pub mod variant;

pub use crate::types::{
    argument::*, array::*, builtin_kind::*, byte_string::*, data_value::*, date_time::*,
    diagnostic_info::*, encoding::*, error::*, expanded_node_id::*, extension_object::*,
    guid::*, localized_text::*, matrix::*, node_id::*, node_ids::*, qualified_name::*,
    status_code::*, status_codes::StatusCode, string::*, structures::*, variant::*,
};

#[cfg(test)]
mod tests;
