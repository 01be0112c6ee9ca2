// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The format agnostic encoder and decoder contracts, and their binary, JSON and XML
//! implementations.
//!
//! Every operation takes an optional field name. The binary encoding ignores it, the JSON and
//! XML encodings use it as the key or element name of the value. Values are written in order and
//! read back in the same order.

use crate::types::{
    builtin_kind::BuiltInKind,
    byte_string::ByteString,
    data_value::DataValue,
    date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    error::{EncodingError, EncodingResult},
    expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject,
    guid::Guid,
    localized_text::LocalizedText,
    matrix::Matrix,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_codes::StatusCode,
    string::{UAString, XmlElement},
    variant::{values_to_variants, variants_to_values, Variant, VariantScalar},
};

pub mod binary;
pub mod facade;
pub mod json;
pub mod transcode;
pub mod xml;

#[cfg(test)]
mod tests;

pub use self::{
    binary::{BinaryStreamDecoder, BinaryStreamEncoder},
    facade::*,
    json::{JsonDecoder, JsonEncoder, JsonOptions},
    transcode::*,
    xml::{XmlDecoder, XmlEncoder},
};

macro_rules! encoder_methods {
    ( $( $kind:ident, $write:ident, $write_array:ident => $how:ident $ty:ty ),* $(,)? ) => {
        $(
            encoder_methods!(@scalar $kind, $write, $how $ty);

            #[doc = concat!("Writes an array of `", stringify!($kind), "` values, `None` is a null array")]
            fn $write_array(&mut self, field: Option<&str>, values: Option<&[$ty]>) -> EncodingResult<()> {
                let values = values.map(values_to_variants);
                self.write_array(field, BuiltInKind::$kind, values.as_deref())
            }
        )*
    };
    (@scalar $kind:ident, $write:ident, copy $ty:ty) => {
        #[doc = concat!("Writes a `", stringify!($kind), "` value")]
        fn $write(&mut self, field: Option<&str>, value: $ty) -> EncodingResult<()> {
            self.write_scalar(field, &value.into_variant())
        }
    };
    (@scalar $kind:ident, $write:ident, by_ref $ty:ty) => {
        #[doc = concat!("Writes a `", stringify!($kind), "` value")]
        fn $write(&mut self, field: Option<&str>, value: &$ty) -> EncodingResult<()> {
            self.write_scalar(field, &value.clone().into_variant())
        }
    };
}

macro_rules! decoder_methods {
    ( $( $kind:ident, $read:ident, $read_array:ident => $ty:ty ),* $(,)? ) => {
        $(
            #[doc = concat!("Reads a `", stringify!($kind), "` value")]
            fn $read(&mut self, field: Option<&str>) -> EncodingResult<$ty> {
                let value = self.read_scalar(field, BuiltInKind::$kind)?;
                scalar_from_variant(value)
            }

            #[doc = concat!("Reads an array of `", stringify!($kind), "` values, `None` is a null array")]
            fn $read_array(&mut self, field: Option<&str>) -> EncodingResult<Option<Vec<$ty>>> {
                match self.read_array(field, BuiltInKind::$kind)? {
                    Some(values) => variants_to_values(values).map(Some),
                    None => Ok(None),
                }
            }
        )*
    };
}

/// Extracts a typed value from the variant returned by `read_scalar`.
fn scalar_from_variant<T: VariantScalar>(value: Variant) -> EncodingResult<T> {
    let found = value.kind();
    T::from_variant(value).ok_or_else(|| EncodingError::type_mismatch(T::KIND, found.name()))
}

/// Writes values into one in-memory buffer. The complete output is returned by `finish()`.
pub trait Encoder {
    /// The content type of the output
    fn content_type(&self) -> ContentType;

    /// Writes a scalar, the kind is that of the value. A `Variant::Variant` is written as a
    /// variant, arrays and matrices are written as such.
    fn write_scalar(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()>;

    /// Writes a variant, i.e. a value together with its kind
    fn write_variant(&mut self, field: Option<&str>, value: &Variant) -> EncodingResult<()>;

    /// Writes a one dimension array of the kind. Elements of a `Variant` array are written as
    /// variants.
    fn write_array(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
        values: Option<&[Variant]>,
    ) -> EncodingResult<()>;

    /// Writes a multi dimension array
    fn write_matrix(&mut self, field: Option<&str>, value: &Matrix) -> EncodingResult<()>;

    /// Opens a structure of the named type. Its fields follow until `pop_structure`.
    fn push_structure(&mut self, field: Option<&str>, type_name: &str) -> EncodingResult<()>;

    fn pop_structure(&mut self) -> EncodingResult<()>;

    /// Opens an array of `len` structures of the named type
    fn push_array(&mut self, field: Option<&str>, type_name: &str, len: usize)
        -> EncodingResult<()>;

    fn pop_array(&mut self) -> EncodingResult<()>;

    /// Writes a null array or a null matrix
    fn write_null_array(&mut self, field: Option<&str>) -> EncodingResult<()>;

    /// Returns everything that was written
    fn finish(self: Box<Self>) -> EncodingResult<Vec<u8>>;

    encoder_methods! {
        Boolean, write_boolean, write_boolean_array => copy bool,
        SByte, write_sbyte, write_sbyte_array => copy i8,
        Byte, write_byte, write_byte_array => copy u8,
        Int16, write_int16, write_int16_array => copy i16,
        UInt16, write_uint16, write_uint16_array => copy u16,
        Int32, write_int32, write_int32_array => copy i32,
        UInt32, write_uint32, write_uint32_array => copy u32,
        Int64, write_int64, write_int64_array => copy i64,
        UInt64, write_uint64, write_uint64_array => copy u64,
        Float, write_float, write_float_array => copy f32,
        Double, write_double, write_double_array => copy f64,
        String, write_string, write_string_array => by_ref UAString,
        DateTime, write_date_time, write_date_time_array => copy DateTime,
        Guid, write_guid, write_guid_array => by_ref Guid,
        ByteString, write_byte_string, write_byte_string_array => by_ref ByteString,
        XmlElement, write_xml_element, write_xml_element_array => by_ref XmlElement,
        NodeId, write_node_id, write_node_id_array => by_ref NodeId,
        ExpandedNodeId, write_expanded_node_id, write_expanded_node_id_array => by_ref ExpandedNodeId,
        StatusCode, write_status_code, write_status_code_array => copy StatusCode,
        QualifiedName, write_qualified_name, write_qualified_name_array => by_ref QualifiedName,
        LocalizedText, write_localized_text, write_localized_text_array => by_ref LocalizedText,
        ExtensionObject, write_extension_object, write_extension_object_array => by_ref ExtensionObject,
        DataValue, write_data_value, write_data_value_array => by_ref DataValue,
        DiagnosticInfo, write_diagnostic_info, write_diagnostic_info_array => by_ref DiagnosticInfo,
    }

    /// Writes an array of variants, `None` is a null array
    fn write_variant_array(
        &mut self,
        field: Option<&str>,
        values: Option<&[Variant]>,
    ) -> EncodingResult<()> {
        self.write_array(field, BuiltInKind::Variant, values)
    }
}

impl<'a> dyn Encoder + 'a {
    /// Writes a structured value. The layout is the one its `encode` writes, which is also the
    /// layout registered for the type in the catalogue.
    pub fn write_encodeable(
        &mut self,
        field: Option<&str>,
        value: &dyn Encodeable,
    ) -> EncodingResult<()> {
        self.push_structure(field, value.type_name())?;
        value.encode(self)?;
        self.pop_structure()
    }

    /// Writes an array of structured values, `None` is a null array
    pub fn write_encodeable_array<T>(
        &mut self,
        field: Option<&str>,
        values: Option<&[T]>,
    ) -> EncodingResult<()>
    where
        T: Encodeable + Decodeable,
    {
        match values {
            None => self.write_null_array(field),
            Some(values) => {
                self.push_array(field, T::TYPE_NAME, values.len())?;
                for value in values {
                    self.write_encodeable(None, value)?;
                }
                self.pop_array()
            }
        }
    }
}

/// Reads values in the order they were written from one in-memory buffer.
pub trait Decoder {
    /// The content type of the input
    fn content_type(&self) -> ContentType;

    /// Reads a scalar of the kind. A `Variant` kind yields `Variant::Variant`. Fails with
    /// `TypeMismatch` when the data cannot be read as the kind.
    fn read_scalar(&mut self, field: Option<&str>, kind: BuiltInKind) -> EncodingResult<Variant>;

    /// Reads a variant. A clean end of input between values yields `Variant::Empty`.
    fn read_variant(&mut self, field: Option<&str>) -> EncodingResult<Variant>;

    /// Reads a one dimension array of the kind, `None` is a null array
    fn read_array(
        &mut self,
        field: Option<&str>,
        kind: BuiltInKind,
    ) -> EncodingResult<Option<Vec<Variant>>>;

    /// Reads a multi dimension array of the kind, `None` is a null matrix
    fn read_matrix(&mut self, field: Option<&str>, kind: BuiltInKind)
        -> EncodingResult<Option<Matrix>>;

    /// Enters a structure of the named type. Returns false when the structure is null or absent.
    fn push_structure(&mut self, field: Option<&str>, type_name: &str) -> EncodingResult<bool>;

    fn pop_structure(&mut self) -> EncodingResult<()>;

    /// Enters an array of structures, returning the number of elements or `None` for a null array
    fn push_array(&mut self, field: Option<&str>, type_name: &str)
        -> EncodingResult<Option<usize>>;

    fn pop_array(&mut self) -> EncodingResult<()>;

    /// True when every top level value has been read
    fn at_end(&self) -> bool;

    decoder_methods! {
        Boolean, read_boolean, read_boolean_array => bool,
        SByte, read_sbyte, read_sbyte_array => i8,
        Byte, read_byte, read_byte_array => u8,
        Int16, read_int16, read_int16_array => i16,
        UInt16, read_uint16, read_uint16_array => u16,
        Int32, read_int32, read_int32_array => i32,
        UInt32, read_uint32, read_uint32_array => u32,
        Int64, read_int64, read_int64_array => i64,
        UInt64, read_uint64, read_uint64_array => u64,
        Float, read_float, read_float_array => f32,
        Double, read_double, read_double_array => f64,
        String, read_string, read_string_array => UAString,
        DateTime, read_date_time, read_date_time_array => DateTime,
        Guid, read_guid, read_guid_array => Guid,
        ByteString, read_byte_string, read_byte_string_array => ByteString,
        XmlElement, read_xml_element, read_xml_element_array => XmlElement,
        NodeId, read_node_id, read_node_id_array => NodeId,
        ExpandedNodeId, read_expanded_node_id, read_expanded_node_id_array => ExpandedNodeId,
        StatusCode, read_status_code, read_status_code_array => StatusCode,
        QualifiedName, read_qualified_name, read_qualified_name_array => QualifiedName,
        LocalizedText, read_localized_text, read_localized_text_array => LocalizedText,
        ExtensionObject, read_extension_object, read_extension_object_array => ExtensionObject,
        DataValue, read_data_value, read_data_value_array => DataValue,
        DiagnosticInfo, read_diagnostic_info, read_diagnostic_info_array => DiagnosticInfo,
    }

    /// Reads an array of variants, `None` is a null array
    fn read_variant_array(&mut self, field: Option<&str>) -> EncodingResult<Option<Vec<Variant>>> {
        self.read_array(field, BuiltInKind::Variant)
    }
}

impl<'a> dyn Decoder + 'a {
    /// Reads a structured value. Yields `None` at a clean end of input or for a null structure.
    pub fn read_encodeable<T>(&mut self, field: Option<&str>) -> EncodingResult<Option<T>>
    where
        T: Decodeable,
    {
        if self.at_end() {
            return Ok(None);
        }
        if !self.push_structure(field, T::TYPE_NAME)? {
            return Ok(None);
        }
        let value = T::decode(self)?;
        self.pop_structure()?;
        Ok(Some(value))
    }

    /// Reads an array of structured values, `None` is a null array
    pub fn read_encodeable_array<T>(&mut self, field: Option<&str>) -> EncodingResult<Option<Vec<T>>>
    where
        T: Decodeable,
    {
        match self.push_array(field, T::TYPE_NAME)? {
            None => Ok(None),
            Some(len) => {
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    let value = self.read_encodeable::<T>(None)?.ok_or_else(|| {
                        EncodingError::type_mismatch(BuiltInKind::Encodeable, "null")
                    })?;
                    values.push(value);
                }
                self.pop_array()?;
                Ok(Some(values))
            }
        }
    }
}

/// A structured value that can write itself field by field. The type name is the name it is
/// registered under in the type catalogue.
pub trait Encodeable {
    fn type_name(&self) -> &'static str;

    /// Writes the fields of the value, without the enclosing structure
    fn encode(&self, encoder: &mut dyn Encoder) -> EncodingResult<()>;
}

/// A structured value that can read itself back field by field.
pub trait Decodeable: Sized {
    const TYPE_NAME: &'static str;

    /// Reads the fields of the value, without the enclosing structure
    fn decode(decoder: &mut dyn Decoder) -> EncodingResult<Self>;
}
