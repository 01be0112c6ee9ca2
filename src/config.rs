// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Codec limits that a host application can embed in its own configuration file.

use crate::types::{constants, DecodingOptions, EncodingOptions};

/// Limits applied by every decoder and encoder. Missing values in a serialized configuration
/// take the defaults from [`constants`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
pub struct CodecLimits {
    /// Max array length in elements
    #[serde(default = "defaults::max_array_length")]
    pub max_array_length: usize,
    /// Max string length in bytes
    #[serde(default = "defaults::max_string_length")]
    pub max_string_length: usize,
    /// Max bytestring length in bytes
    #[serde(default = "defaults::max_byte_string_length")]
    pub max_byte_string_length: usize,
    /// Max nesting of structures, arrays and variants
    #[serde(default = "defaults::max_depth")]
    pub max_depth: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_array_length: defaults::max_array_length(),
            max_string_length: defaults::max_string_length(),
            max_byte_string_length: defaults::max_byte_string_length(),
            max_depth: defaults::max_depth(),
        }
    }
}

impl CodecLimits {
    pub fn decoding_options(&self) -> DecodingOptions {
        DecodingOptions::with_limits(
            self.max_string_length,
            self.max_byte_string_length,
            self.max_array_length,
            self.max_depth,
        )
    }

    pub fn encoding_options(&self) -> EncodingOptions {
        EncodingOptions {
            max_depth: self.max_depth,
            max_array_length: self.max_array_length,
        }
    }
}

mod defaults {
    use super::constants;

    pub fn max_array_length() -> usize {
        constants::MAX_ARRAY_LENGTH
    }
    pub fn max_string_length() -> usize {
        constants::MAX_STRING_LENGTH
    }
    pub fn max_byte_string_length() -> usize {
        constants::MAX_BYTE_STRING_LENGTH
    }
    pub fn max_depth() -> usize {
        constants::MAX_DECODING_DEPTH
    }
}

#[test]
fn limits_defaults_from_partial_json() {
    let limits: CodecLimits = serde_json::from_str(r#"{ "max_array_length": 10 }"#).unwrap();
    assert_eq!(limits.max_array_length, 10);
    assert_eq!(limits.max_string_length, constants::MAX_STRING_LENGTH);
    assert_eq!(limits.max_depth, constants::MAX_DECODING_DEPTH);

    let options = limits.decoding_options();
    assert_eq!(options.max_array_length, 10);
    assert_eq!(options.decoding_depth_gauge.lock().max_depth(), constants::MAX_DECODING_DEPTH);
}
