// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Content type dispatch. Picks the encoder or decoder for a content type and runs a closure
//! against it.

use std::{fmt, str::FromStr};

use crate::{
    codec::{
        binary::{BinaryStreamDecoder, BinaryStreamEncoder},
        json::{JsonDecoder, JsonEncoder, JsonOptions},
        xml::{XmlDecoder, XmlEncoder},
        Decoder, Encoder,
    },
    config::CodecLimits,
    types::{
        encoding::{DecodingOptions, EncodingOptions},
        error::{EncodingError, EncodingResult},
        status_codes::StatusCode,
    },
};

/// The wire representations the codec reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Binary,
    /// Reversible JSON
    Json,
    /// Reversible JSON without top level wrapping
    JsonReference,
    NonReversibleJson,
    NonReversibleJsonReference,
    Xml,
}

pub const CONTENT_TYPES: [ContentType; 6] = [
    ContentType::Binary,
    ContentType::Json,
    ContentType::JsonReference,
    ContentType::NonReversibleJson,
    ContentType::NonReversibleJsonReference,
    ContentType::Xml,
];

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Binary => "application/opcua+uabinary",
            ContentType::Json => "application/opcua+uajson",
            ContentType::JsonReference => "application/ua+json",
            ContentType::NonReversibleJson => "application/opcua+uajson+nonreversible",
            ContentType::NonReversibleJsonReference => "application/ua+json+nonreversible",
            ContentType::Xml => "application/opcua+uaxml",
        }
    }

    /// The JSON dialect of the content type, `None` if it is not JSON
    pub fn json_options(&self) -> Option<JsonOptions> {
        let (reversible, reference) = match self {
            ContentType::Json => (true, false),
            ContentType::JsonReference => (true, true),
            ContentType::NonReversibleJson => (false, false),
            ContentType::NonReversibleJsonReference => (false, true),
            ContentType::Binary | ContentType::Xml => return None,
        };
        Some(JsonOptions {
            reversible,
            reference,
        })
    }

    pub fn is_json(&self) -> bool {
        self.json_options().is_some()
    }

    /// True if the kind and shape of every value can be rebuilt from the encoding
    pub fn is_reversible(&self) -> bool {
        self.json_options().map_or(true, |o| o.reversible)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime())
    }
}

impl FromStr for ContentType {
    type Err = EncodingError;

    /// Parses a mime string. Case is ignored, and so is anything after a `;`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mime = s.split(';').next().unwrap_or_default().trim();
        CONTENT_TYPES
            .iter()
            .find(|ct| ct.mime().eq_ignore_ascii_case(mime))
            .copied()
            .ok_or_else(|| {
                error!("Unsupported content type {}", s);
                StatusCode::BadDataEncodingUnsupported.into()
            })
    }
}

/// Creates an encoder for the content type
pub fn create_encoder(content_type: ContentType, options: EncodingOptions) -> Box<dyn Encoder> {
    debug!("Creating encoder for {}", content_type);
    match content_type {
        ContentType::Binary => Box::new(BinaryStreamEncoder::new(options)),
        ContentType::Xml => Box::new(XmlEncoder::new(options)),
        ContentType::Json
        | ContentType::JsonReference
        | ContentType::NonReversibleJson
        | ContentType::NonReversibleJsonReference => Box::new(JsonEncoder::new(
            content_type.json_options().unwrap_or_default(),
            options,
        )),
    }
}

/// Creates a decoder for the content type over the data. The JSON and XML decoders parse the
/// whole input up front, so malformed input fails here.
pub fn create_decoder<'a>(
    content_type: ContentType,
    data: &'a [u8],
    options: DecodingOptions,
) -> EncodingResult<Box<dyn Decoder + 'a>> {
    debug!("Creating decoder for {}", content_type);
    Ok(match content_type {
        ContentType::Binary => Box::new(BinaryStreamDecoder::new(data, options)),
        ContentType::Xml => Box::new(XmlDecoder::new(data, options)?),
        ContentType::Json
        | ContentType::JsonReference
        | ContentType::NonReversibleJson
        | ContentType::NonReversibleJsonReference => Box::new(JsonDecoder::new(
            data,
            content_type.json_options().unwrap_or_default(),
            options,
        )?),
    })
}

/// Runs the closure against a new encoder and returns everything it wrote.
pub fn encode<F>(content_type: ContentType, f: F) -> EncodingResult<Vec<u8>>
where
    F: FnOnce(&mut dyn Encoder) -> EncodingResult<()>,
{
    encode_with_limits(content_type, &CodecLimits::default(), f)
}

pub fn encode_with_limits<F>(
    content_type: ContentType,
    limits: &CodecLimits,
    f: F,
) -> EncodingResult<Vec<u8>>
where
    F: FnOnce(&mut dyn Encoder) -> EncodingResult<()>,
{
    let mut encoder = create_encoder(content_type, limits.encoding_options());
    f(encoder.as_mut())?;
    encoder.finish()
}

/// Runs the closure against a decoder over the data and returns what it read.
pub fn decode<T, F>(content_type: ContentType, data: &[u8], f: F) -> EncodingResult<T>
where
    F: FnOnce(&mut dyn Decoder) -> EncodingResult<T>,
{
    decode_with_limits(content_type, data, &CodecLimits::default(), f)
}

pub fn decode_with_limits<T, F>(
    content_type: ContentType,
    data: &[u8],
    limits: &CodecLimits,
    f: F,
) -> EncodingResult<T>
where
    F: FnOnce(&mut dyn Decoder) -> EncodingResult<T>,
{
    let mut decoder = create_decoder(content_type, data, limits.decoding_options())?;
    f(decoder.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_mime() {
        for ct in CONTENT_TYPES.iter() {
            assert_eq!(ContentType::from_str(ct.mime()).unwrap(), *ct);
        }
        assert_eq!(
            ContentType::from_str("Application/UA+JSON; charset=utf-8").unwrap(),
            ContentType::JsonReference
        );
        assert!(ContentType::from_str("text/plain").is_err());
        assert!(ContentType::Binary.is_reversible());
        assert!(!ContentType::NonReversibleJsonReference.is_reversible());
        assert!(ContentType::NonReversibleJson.is_json());
        assert!(!ContentType::Xml.is_json());
    }
}
