// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Moves structured values between encodings using their catalogue description, without a
//! Rust type for them. This is how extension object bodies of known types are written as
//! nested JSON or XML and read back into their binary encoding.

use crate::{
    catalogue::{FieldDescription, FieldKind, TypeCatalogue, TypeDescription},
    codec::{create_decoder, create_encoder, ContentType, Decoder, Encoder},
    config::CodecLimits,
    types::{builtin_kind::BuiltInKind, error::EncodingResult, variant::Variant},
};

/// Reads every field of the described structure from the decoder and writes it to the encoder.
/// The enclosing structure scope, if any, is opened and closed by the caller.
pub fn transcode_fields(
    description: &TypeDescription,
    decoder: &mut dyn Decoder,
    encoder: &mut dyn Encoder,
) -> EncodingResult<()> {
    trace!(
        "Transcoding {} from {} to {}",
        description.name,
        decoder.content_type(),
        encoder.content_type()
    );
    for field in &description.fields {
        transcode_field(field, decoder, encoder)?;
    }
    Ok(())
}

fn transcode_field(
    field: &FieldDescription,
    decoder: &mut dyn Decoder,
    encoder: &mut dyn Encoder,
) -> EncodingResult<()> {
    let name = Some(field.name);
    match field.kind {
        FieldKind::BuiltIn(BuiltInKind::Variant) if field.value_rank < 0 => {
            let value = decoder.read_variant(name)?;
            encoder.write_variant(name, &value)
        }
        FieldKind::BuiltIn(kind) if field.value_rank < 0 => {
            let value = decoder.read_scalar(name, kind)?;
            encoder.write_scalar(name, &value)
        }
        FieldKind::BuiltIn(kind) if field.value_rank == 1 => {
            let values = decoder.read_array(name, kind)?;
            encoder.write_array(name, kind, values.as_deref())
        }
        FieldKind::BuiltIn(kind) => match decoder.read_matrix(name, kind)? {
            Some(matrix) => encoder.write_matrix(name, &matrix),
            None => encoder.write_null_array(name),
        },
        FieldKind::Structure(type_name) => {
            let description = TypeCatalogue::global().resolve(type_name)?;
            if field.value_rank < 0 {
                transcode_structure(&description, name, decoder, encoder)
            } else {
                transcode_structure_array(&description, name, decoder, encoder)
            }
        }
    }
}

fn transcode_structure(
    description: &TypeDescription,
    name: Option<&str>,
    decoder: &mut dyn Decoder,
    encoder: &mut dyn Encoder,
) -> EncodingResult<()> {
    encoder.push_structure(name, description.name)?;
    if decoder.push_structure(name, description.name)? {
        transcode_fields(description, decoder, encoder)?;
        decoder.pop_structure()?;
    } else {
        // A null structure still has to be written in full for the binary encoding
        write_defaults(description, encoder)?;
    }
    encoder.pop_structure()
}

fn transcode_structure_array(
    description: &TypeDescription,
    name: Option<&str>,
    decoder: &mut dyn Decoder,
    encoder: &mut dyn Encoder,
) -> EncodingResult<()> {
    match decoder.push_array(name, description.name)? {
        None => encoder.write_null_array(name),
        Some(len) => {
            encoder.push_array(name, description.name, len)?;
            for _ in 0..len {
                transcode_structure(description, None, decoder, encoder)?;
            }
            decoder.pop_array()?;
            encoder.pop_array()
        }
    }
}

/// Writes the null value of every field of the structure
fn write_defaults(description: &TypeDescription, encoder: &mut dyn Encoder) -> EncodingResult<()> {
    for field in &description.fields {
        let name = Some(field.name);
        match field.kind {
            FieldKind::BuiltIn(BuiltInKind::Variant) if field.value_rank < 0 => {
                encoder.write_variant(name, &Variant::Empty)?
            }
            FieldKind::BuiltIn(kind) if field.value_rank < 0 => {
                encoder.write_scalar(name, &Variant::default_for(kind))?
            }
            FieldKind::BuiltIn(_) => encoder.write_null_array(name)?,
            FieldKind::Structure(type_name) if field.value_rank < 0 => {
                let description = TypeCatalogue::global().resolve(type_name)?;
                encoder.push_structure(name, description.name)?;
                write_defaults(&description, encoder)?;
                encoder.pop_structure()?;
            }
            FieldKind::Structure(_) => encoder.write_null_array(name)?,
        }
    }
    Ok(())
}

/// Decodes one structure of the named type from `data` and encodes it in another content type.
/// The type must be registered in the catalogue.
pub fn transcode(
    from: ContentType,
    data: &[u8],
    to: ContentType,
    type_name: &str,
) -> EncodingResult<Vec<u8>> {
    let description = TypeCatalogue::global().resolve(type_name)?;
    let limits = CodecLimits::default();
    let mut decoder = create_decoder(from, data, limits.decoding_options())?;
    let mut encoder = create_encoder(to, limits.encoding_options());
    debug!("Transcoding {} from {} to {}", type_name, from, to);
    if decoder.push_structure(None, description.name)? {
        encoder.push_structure(None, description.name)?;
        transcode_fields(&description, decoder.as_mut(), encoder.as_mut())?;
        decoder.pop_structure()?;
        encoder.pop_structure()?;
    } else {
        encoder.push_structure(None, description.name)?;
        write_defaults(&description, encoder.as_mut())?;
        encoder.pop_structure()?;
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{decode, encode},
        types::{localized_text::LocalizedText, structures::EUInformation},
    };

    #[test]
    fn transcode_binary_to_json() {
        let info = EUInformation {
            namespace_uri: "http://www.opcfoundation.org/UA/units/un/cefact".into(),
            unit_id: 4408652,
            display_name: LocalizedText::new("en", "°C"),
            description: LocalizedText::new("en", "degree Celsius"),
        };
        let binary = encode(ContentType::Binary, |e| e.write_encodeable(None, &info)).unwrap();
        let json = transcode(ContentType::Binary, &binary, ContentType::JsonReference, "EUInformation").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "NamespaceUri": "http://www.opcfoundation.org/UA/units/un/cefact",
                "UnitId": 4408652,
                "DisplayName": {"Locale": "en", "Text": "°C"},
                "Description": {"Locale": "en", "Text": "degree Celsius"}
            })
        );
        let xml = transcode(ContentType::JsonReference, &json, ContentType::Xml, "EUInformation").unwrap();
        let decoded = decode(ContentType::Xml, &xml, |d| d.read_encodeable::<EUInformation>(None))
            .unwrap()
            .unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn transcode_unknown_type() {
        assert!(transcode(ContentType::Binary, &[], ContentType::Json, "NoSuchType").is_err());
    }

    #[test]
    fn transcode_null_structure_writes_defaults() {
        let json = b"null";
        let binary = transcode(ContentType::Json, json, ContentType::Binary, "Range").unwrap();
        assert_eq!(binary, vec![0u8; 16]);
    }
}
