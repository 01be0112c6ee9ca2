// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The OPC UA binary encoding behind the `Encoder` / `Decoder` contracts. Values are laid out by
//! their `BinaryEncoder` impls, field names are ignored.

use std::io::Cursor;

use crate::{
    codec::{ContentType, Decoder, Encoder},
    types::{
        array::values_are_of_kind,
        builtin_kind::BuiltInKind,
        encoding::*,
        error::EncodingResult,
        matrix::Matrix,
        status_codes::StatusCode,
        variant::Variant,
    },
};

/// Writes values in the binary encoding.
#[derive(Debug)]
pub struct BinaryStreamEncoder {
    stream: Cursor<Vec<u8>>,
    options: EncodingOptions,
    depth: usize,
}

impl BinaryStreamEncoder {
    pub fn new(options: EncodingOptions) -> BinaryStreamEncoder {
        BinaryStreamEncoder {
            stream: Cursor::new(Vec::new()),
            options,
            depth: 0,
        }
    }

    /// Returns the bytes written so far
    pub fn into_bytes(self) -> Vec<u8> {
        self.stream.into_inner()
    }

    fn enter(&mut self) -> EncodingResult<()> {
        self.depth += 1;
        self.options.check_depth(self.depth)
    }

    fn leave(&mut self) -> EncodingResult<()> {
        if self.depth == 0 {
            error!("Scope closed without a matching push");
            Err(StatusCode::BadEncodingError.into())
        } else {
            self.depth -= 1;
            Ok(())
        }
    }

    fn write_values(&mut self, kind: BuiltInKind, values: &[Variant]) -> EncodingResult<()> {
        self.options.check_array_length(values.len())?;
        values_are_of_kind(values, kind)?;
        write_i32(&mut self.stream, values.len() as i32)?;
        for value in values {
            Variant::encode_element(&mut self.stream, kind, value)?;
        }
        Ok(())
    }
}

impl Encoder for BinaryStreamEncoder {
    fn content_type(&self) -> ContentType {
        ContentType::Binary
    }

    fn write_scalar(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()> {
        match value {
            Variant::Array(array) => self.write_array(field, array.value_type, Some(array.values.as_slice())),
            Variant::Matrix(matrix) => self.write_matrix(field, matrix),
            value => value.encode_value(&mut self.stream).map(|_| ()),
        }
    }

    fn write_variant(&mut self, _field: Option<&str>, value: &Variant) -> EncodingResult<()> {
        if let Variant::Array(array) = value {
            self.options.check_array_length(array.len())?;
        }
        value.encode(&mut self.stream).map(|_| ())
    }

    fn write_array(
        &mut self,
        _field: Option<&str>,
        kind: BuiltInKind,
        values: Option<&[Variant]>,
    ) -> EncodingResult<()> {
        match values {
            None => write_i32(&mut self.stream, -1).map(|_| ()),
            Some(values) => self.write_values(kind, values),
        }
    }

    fn write_matrix(&mut self, _field: Option<&str>, value: &Matrix) -> EncodingResult<()> {
        // Dimensions first, then the flat elements
        write_i32(&mut self.stream, value.dimensions().len() as i32)?;
        for dimension in value.dimensions() {
            write_i32(&mut self.stream, *dimension as i32)?;
        }
        self.write_values(value.kind(), &value.to_variants())
    }

    fn push_structure(&mut self, _field: Option<&str>, _type_name: &str) -> EncodingResult<()> {
        self.enter()
    }

    fn pop_structure(&mut self) -> EncodingResult<()> {
        self.leave()
    }

    fn push_array(
        &mut self,
        _field: Option<&str>,
        _type_name: &str,
        len: usize,
    ) -> EncodingResult<()> {
        self.options.check_array_length(len)?;
        write_i32(&mut self.stream, len as i32)?;
        self.enter()
    }

    fn pop_array(&mut self) -> EncodingResult<()> {
        self.leave()
    }

    fn write_null_array(&mut self, _field: Option<&str>) -> EncodingResult<()> {
        write_i32(&mut self.stream, -1).map(|_| ())
    }

    fn finish(self: Box<Self>) -> EncodingResult<Vec<u8>> {
        if self.depth != 0 {
            error!("Encoder finished with {} scopes still open", self.depth);
            return Err(StatusCode::BadEncodingError.into());
        }
        Ok(self.into_bytes())
    }
}

/// Reads values in the binary encoding from a byte slice.
#[derive(Debug)]
pub struct BinaryStreamDecoder<'a> {
    stream: Cursor<&'a [u8]>,
    options: DecodingOptions,
    depth: usize,
}

impl<'a> BinaryStreamDecoder<'a> {
    pub fn new(data: &'a [u8], options: DecodingOptions) -> BinaryStreamDecoder<'a> {
        BinaryStreamDecoder {
            stream: Cursor::new(data),
            options,
            depth: 0,
        }
    }

    /// Number of bytes not read yet
    pub fn remaining(&self) -> usize {
        let len = self.stream.get_ref().len();
        len.saturating_sub(self.stream.position() as usize)
    }

    fn enter(&mut self) -> EncodingResult<()> {
        if self.depth >= self.options.max_depth() {
            warn!("Decoding aborted due maximum nesting depth being reached");
            return Err(StatusCode::BadDecodingError.into());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) -> EncodingResult<()> {
        if self.depth == 0 {
            error!("Scope closed without a matching push");
            Err(StatusCode::BadDecodingError.into())
        } else {
            self.depth -= 1;
            Ok(())
        }
    }

    fn read_values(&mut self, kind: BuiltInKind) -> EncodingResult<Option<Vec<Variant>>> {
        let len = read_i32(&mut self.stream)?;
        match self.options.check_array_length(len)? {
            None => Ok(None),
            Some(len) => {
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(Variant::decode_element(
                        kind,
                        &mut self.stream,
                        &self.options,
                    )?);
                }
                Ok(Some(values))
            }
        }
    }
}

impl<'a> Decoder for BinaryStreamDecoder<'a> {
    fn content_type(&self) -> ContentType {
        ContentType::Binary
    }

    fn read_scalar(&mut self, _field: Option<&str>, kind: BuiltInKind) -> EncodingResult<Variant> {
        Variant::decode_value(kind, &mut self.stream, &self.options)
    }

    fn read_variant(&mut self, _field: Option<&str>) -> EncodingResult<Variant> {
        if self.at_end() {
            Ok(Variant::Empty)
        } else {
            Variant::decode(&mut self.stream, &self.options)
        }
    }

    fn read_array(
        &mut self,
        _field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Vec<Variant>>> {
        self.read_values(kind)
    }

    fn read_matrix(
        &mut self,
        _field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Matrix>> {
        let dimensions: Option<Vec<i32>> = read_array(&mut self.stream, &self.options)?;
        let dimensions = match dimensions {
            None => return Ok(None),
            Some(dimensions) => dimensions,
        };
        if dimensions.iter().any(|d| *d <= 0) {
            error!("Invalid matrix dimensions {:?}", dimensions);
            return Err(StatusCode::BadDecodingError.into());
        }
        let dimensions: Vec<u32> = dimensions.into_iter().map(|d| d as u32).collect();
        let values = self.read_values(kind)?.unwrap_or_default();
        Matrix::from_variants(kind, values, dimensions).map(Some)
    }

    fn push_structure(&mut self, _field: Option<&str>, _type_name: &str) -> EncodingResult<bool> {
        self.enter()?;
        Ok(true)
    }

    fn pop_structure(&mut self) -> EncodingResult<()> {
        self.leave()
    }

    fn push_array(
        &mut self,
        _field: Option<&str>,
        _type_name: &str,
    ) -> EncodingResult<Option<usize>> {
        let len = read_i32(&mut self.stream)?;
        match self.options.check_array_length(len)? {
            None => Ok(None),
            Some(len) => {
                self.enter()?;
                Ok(Some(len))
            }
        }
    }

    fn pop_array(&mut self) -> EncodingResult<()> {
        self.leave()
    }

    fn at_end(&self) -> bool {
        self.depth == 0 && self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{error::EncodingError, string::UAString};

    #[test]
    fn binary_null_and_empty_arrays() {
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions::default());
        encoder.write_int32_array(None, None).unwrap();
        encoder.write_int32_array(None, Some(&[])).unwrap();
        let buf = encoder.into_bytes();
        assert_eq!(buf, vec![0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);

        let mut decoder = BinaryStreamDecoder::new(&buf, DecodingOptions::test());
        assert_eq!(decoder.read_int32_array(None).unwrap(), None);
        assert_eq!(decoder.read_int32_array(None).unwrap(), Some(vec![]));
        assert!(decoder.at_end());
    }

    #[test]
    fn binary_array_kind_checked() {
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions::default());
        let values = vec![Variant::from(1i32), Variant::from("one")];
        assert!(matches!(
            encoder.write_array(None, BuiltInKind::Int32, Some(&values)),
            Err(EncodingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn binary_array_limit() {
        let options = EncodingOptions {
            max_array_length: 2,
            ..EncodingOptions::default()
        };
        let mut encoder = BinaryStreamEncoder::new(options);
        assert!(encoder.write_uint16_array(None, Some(&[1, 2, 3])).is_err());

        let mut encoder = BinaryStreamEncoder::new(EncodingOptions::default());
        encoder.write_uint16_array(None, Some(&[1, 2, 3])).unwrap();
        let buf = encoder.into_bytes();
        let options = DecodingOptions::with_limits(100, 100, 2, 10);
        let mut decoder = BinaryStreamDecoder::new(&buf, options);
        assert!(decoder.read_uint16_array(None).is_err());
    }

    #[test]
    fn binary_truncated_string() {
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions::default());
        encoder
            .write_string(None, &UAString::from("truncated"))
            .unwrap();
        let buf = encoder.into_bytes();
        let mut decoder = BinaryStreamDecoder::new(&buf[..6], DecodingOptions::test());
        assert!(matches!(
            decoder.read_string(None),
            Err(EncodingError::UnexpectedEof)
        ));
    }

    #[test]
    fn binary_matrix_layout() {
        let matrix = Matrix::new(vec![1u8, 2, 3, 4, 5, 6], vec![3u32, 2]).unwrap();
        let mut encoder = BinaryStreamEncoder::new(EncodingOptions::default());
        encoder.write_matrix(None, &matrix).unwrap();
        let buf = encoder.into_bytes();
        assert_eq!(
            buf,
            vec![2, 0, 0, 0, 3, 0, 0, 0, 2, 0, 0, 0, 6, 0, 0, 0, 1, 2, 3, 4, 5, 6]
        );
        let mut decoder = BinaryStreamDecoder::new(&buf, DecodingOptions::test());
        assert_eq!(
            decoder.read_matrix(None, BuiltInKind::Byte).unwrap(),
            Some(matrix)
        );
    }

    #[test]
    fn binary_structure_depth() {
        let options = DecodingOptions::with_limits(100, 100, 100, 1);
        let buf: [u8; 0] = [];
        let mut decoder = BinaryStreamDecoder::new(&buf, options);
        assert!(decoder.push_structure(None, "A").unwrap());
        assert!(decoder.push_structure(None, "B").is_err());
    }
}
