// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `Variant`.

use std::{
    convert::TryFrom,
    fmt,
    io::{Read, Write},
};

use crate::types::{
    array::*,
    builtin_kind::{BuiltInKind, EncodingMask},
    byte_string::ByteString,
    data_value::DataValue,
    date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    encoding::*,
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
};

/// A `Variant` holds built-in OPC UA data types, including single and multi dimensional arrays,
/// data values and extension objects.
///
/// As variants may be passed around a lot on the stack, Boxes are used for more complex types to
/// keep the size of this type down a bit, especially when used in arrays.
#[derive(PartialEq, Debug, Clone)]
pub enum Variant {
    /// Empty type has no value. It is equivalent to a Null value (part 6 5.1.6)
    Empty,
    /// Boolean
    Boolean(bool),
    /// Signed byte
    SByte(i8),
    /// Unsigned byte
    Byte(u8),
    /// Signed 16-bit int
    Int16(i16),
    /// Unsigned 16-bit int
    UInt16(u16),
    /// Signed 32-bit int
    Int32(i32),
    /// Unsigned 32-bit int
    UInt32(u32),
    /// Signed 64-bit int
    Int64(i64),
    /// Unsigned 64-bit int
    UInt64(u64),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// String
    String(UAString),
    /// DateTime
    DateTime(Box<DateTime>),
    /// Guid
    Guid(Box<Guid>),
    /// ByteString
    ByteString(ByteString),
    /// XmlElement
    XmlElement(XmlElement),
    /// NodeId
    NodeId(Box<NodeId>),
    /// ExpandedNodeId
    ExpandedNodeId(Box<ExpandedNodeId>),
    /// StatusCode
    StatusCode(StatusCode),
    /// QualifiedName
    QualifiedName(Box<QualifiedName>),
    /// LocalizedText
    LocalizedText(Box<LocalizedText>),
    /// ExtensionObject
    ExtensionObject(Box<ExtensionObject>),
    /// DataValue
    DataValue(Box<DataValue>),
    /// A variant held inside a variant
    Variant(Box<Variant>),
    /// DiagnosticInfo
    DiagnosticInfo(Box<DiagnosticInfo>),
    /// Single dimension array of values of one kind
    Array(Box<Array>),
    /// Multi dimension array of values of one kind
    Matrix(Box<Matrix>),
}

/// A Rust type that is the value of one built-in kind. This is what lets typed vectors be
/// turned into arrays and matrices and back.
///
/// `Variant` itself is the value of the `Variant` kind. As an element of an array or matrix of
/// that kind it is held as is, not wrapped.
pub trait VariantScalar: Sized + Clone {
    const KIND: BuiltInKind;

    /// Turns the value into the variant that holds it
    fn into_variant(self) -> Variant;

    /// Extracts the value from a variant of the same kind
    fn from_variant(value: Variant) -> Option<Self>;
}

macro_rules! variant_scalar {
    (@plain $( $kind:ident => $ty:ty ),* $(,)? ) => {
        $(
            impl VariantScalar for $ty {
                const KIND: BuiltInKind = BuiltInKind::$kind;

                fn into_variant(self) -> Variant {
                    Variant::$kind(self)
                }

                fn from_variant(value: Variant) -> Option<Self> {
                    match value {
                        Variant::$kind(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Variant {
                fn from(v: $ty) -> Self {
                    v.into_variant()
                }
            }
        )*
    };
    (@boxed $( $kind:ident => $ty:ty ),* $(,)? ) => {
        $(
            impl VariantScalar for $ty {
                const KIND: BuiltInKind = BuiltInKind::$kind;

                fn into_variant(self) -> Variant {
                    Variant::$kind(Box::new(self))
                }

                fn from_variant(value: Variant) -> Option<Self> {
                    match value {
                        Variant::$kind(v) => Some(*v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Variant {
                fn from(v: $ty) -> Self {
                    v.into_variant()
                }
            }
        )*
    };
}

variant_scalar!(@plain
    Boolean => bool,
    SByte => i8,
    Byte => u8,
    Int16 => i16,
    UInt16 => u16,
    Int32 => i32,
    UInt32 => u32,
    Int64 => i64,
    UInt64 => u64,
    Float => f32,
    Double => f64,
    String => UAString,
    ByteString => ByteString,
    XmlElement => XmlElement,
    StatusCode => StatusCode,
);

variant_scalar!(@boxed
    DateTime => DateTime,
    Guid => Guid,
    NodeId => NodeId,
    ExpandedNodeId => ExpandedNodeId,
    QualifiedName => QualifiedName,
    LocalizedText => LocalizedText,
    ExtensionObject => ExtensionObject,
    DataValue => DataValue,
    DiagnosticInfo => DiagnosticInfo,
);

impl VariantScalar for Variant {
    const KIND: BuiltInKind = BuiltInKind::Variant;

    fn into_variant(self) -> Variant {
        self
    }

    fn from_variant(value: Variant) -> Option<Self> {
        Some(value)
    }
}

impl From<()> for Variant {
    fn from(_: ()) -> Self {
        Variant::Empty
    }
}

impl<'a> From<&'a str> for Variant {
    fn from(value: &'a str) -> Self {
        Variant::String(UAString::from(value))
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(UAString::from(value))
    }
}

impl From<Array> for Variant {
    fn from(v: Array) -> Self {
        Variant::Array(Box::new(v))
    }
}

impl From<Matrix> for Variant {
    fn from(v: Matrix) -> Self {
        Variant::Matrix(Box::new(v))
    }
}

impl<T> From<Vec<T>> for Variant
where
    T: VariantScalar,
{
    fn from(values: Vec<T>) -> Self {
        Variant::from(Array::from_values(values))
    }
}

impl<'a, 'b> From<&'a [&'b str]> for Variant {
    fn from(values: &'a [&'b str]) -> Self {
        let values: Vec<UAString> = values.iter().map(|v| UAString::from(*v)).collect();
        Variant::from(values)
    }
}

/// Extracts a typed vector from a one dimensional array of the matching kind.
impl<T> TryFrom<&Variant> for Vec<T>
where
    T: VariantScalar,
{
    type Error = EncodingError;

    fn try_from(value: &Variant) -> Result<Self, Self::Error> {
        match value {
            Variant::Array(array) if array.value_type == T::KIND => {
                variants_to_values(array.values.clone())
            }
            _ => Err(EncodingError::type_mismatch(T::KIND, value.kind().name())),
        }
    }
}

/// Converts typed values into the variants holding them.
pub fn values_to_variants<T: VariantScalar>(values: &[T]) -> Vec<Variant> {
    values.iter().cloned().map(VariantScalar::into_variant).collect()
}

/// Converts variants into typed values, failing on the first one of another kind.
pub fn variants_to_values<T: VariantScalar>(values: Vec<Variant>) -> EncodingResult<Vec<T>> {
    values
        .into_iter()
        .map(|v| {
            let found = v.kind();
            T::from_variant(v).ok_or_else(|| EncodingError::type_mismatch(T::KIND, found.name()))
        })
        .collect()
}

impl BinaryEncoder<Variant> for Variant {
    fn byte_len(&self) -> usize {
        // Encoding mask plus the value
        1 + match self {
            Variant::Array(array) => {
                4 + array
                    .values
                    .iter()
                    .map(|v| Variant::byte_len_element(array.value_type, v))
                    .sum::<usize>()
            }
            Variant::Matrix(matrix) => {
                let kind = matrix.kind();
                // Elements then the dimensions (size + num elements)
                4 + matrix
                    .to_variants()
                    .iter()
                    .map(|v| Variant::byte_len_element(kind, v))
                    .sum::<usize>()
                    + 4
                    + matrix.dimensions().len() * 4
            }
            value => value.byte_len_value(),
        }
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size: usize = 0;

        // Encoding mask will include the array bits if applicable for the type
        size += write_u8(stream, self.encoding_mask())?;

        size += match self {
            Variant::Array(array) => {
                let mut size = write_i32(stream, array.values.len() as i32)?;
                for value in array.values.iter() {
                    size += Variant::encode_element(stream, array.value_type, value)?;
                }
                size
            }
            Variant::Matrix(matrix) => {
                let kind = matrix.kind();
                let values = matrix.to_variants();
                let mut size = write_i32(stream, values.len() as i32)?;
                for value in values.iter() {
                    size += Variant::encode_element(stream, kind, value)?;
                }
                // Note array dimensions are encoded as Int32 even though they are presented
                // as UInt32 through attribute.
                size += write_i32(stream, matrix.dimensions().len() as i32)?;
                for dimension in matrix.dimensions() {
                    size += write_i32(stream, *dimension as i32)?;
                }
                size
            }
            value => value.encode_value(stream)?,
        };
        debug_assert_eq!(size, self.byte_len());
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let encoding_mask = u8::decode(stream, decoding_options)?;
        let kind = BuiltInKind::from_encoding_mask(encoding_mask)?;

        if encoding_mask & EncodingMask::ARRAY_VALUES_BIT == 0 {
            if encoding_mask & EncodingMask::ARRAY_DIMENSIONS_BIT != 0 {
                error!("Array dimensions bit specified without any values");
                return Err(StatusCode::BadDecodingError.into());
            }
            // Read a single variant
            return Variant::decode_value(kind, stream, decoding_options);
        }

        // IMPORTANT NOTE: Arrays and matrices are constructed through Array::new and Matrix::new
        // to correctly process failures from potentially malicious data.
        let array_length = i32::decode(stream, decoding_options)?;
        let values = match decoding_options.check_array_length(array_length)? {
            // null array of type
            None => Vec::new(),
            Some(len) => {
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(Variant::decode_element(kind, stream, decoding_options)?);
                }
                values
            }
        };

        if encoding_mask & EncodingMask::ARRAY_DIMENSIONS_BIT != 0 {
            let dimensions: Vec<i32> = read_array(stream, decoding_options)?.ok_or_else(|| {
                error!("No array dimensions despite the bit flag being set");
                EncodingError::from(StatusCode::BadDecodingError)
            })?;
            if dimensions.iter().any(|d| *d <= 0) {
                error!("Invalid array dimensions {:?}", dimensions);
                return Err(StatusCode::BadDecodingError.into());
            }
            let dimensions = dimensions.into_iter().map(|d| d as u32).collect();
            Matrix::from_variants(kind, values, dimensions).map(Variant::from)
        } else {
            Array::new(kind, values).map(Variant::from)
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Empty
    }
}

/// This implementation is mainly for debugging / convenience purposes, to eliminate some of the
/// noise in common types from using the Debug trait.
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Variant::Empty => write!(f, "Empty"),
            Variant::SByte(v) => write!(f, "{}", v),
            Variant::Byte(v) => write!(f, "{}", v),
            Variant::Int16(v) => write!(f, "{}", v),
            Variant::UInt16(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::String(ref v) => write!(f, "{}", v),
            Variant::Guid(ref v) => write!(f, "{}", v),
            Variant::DateTime(ref v) => write!(f, "{}", v),
            Variant::NodeId(ref v) => write!(f, "{}", v),
            Variant::ExpandedNodeId(ref v) => write!(f, "{}", v),
            Variant::StatusCode(ref v) => write!(f, "{}", v),
            Variant::Variant(ref v) => write!(f, "Variant({})", v),
            value => write!(f, "{:?}", value),
        }
    }
}

impl Variant {
    /// Returns the null value of a kind, which is what a decoder yields for a field that is
    /// absent from a JSON or XML structure.
    pub fn default_for(kind: BuiltInKind) -> Variant {
        match kind {
            BuiltInKind::Null | BuiltInKind::Encodeable => Variant::Empty,
            BuiltInKind::Boolean => Variant::Boolean(false),
            BuiltInKind::SByte => Variant::SByte(0),
            BuiltInKind::Byte => Variant::Byte(0),
            BuiltInKind::Int16 => Variant::Int16(0),
            BuiltInKind::UInt16 => Variant::UInt16(0),
            BuiltInKind::Int32 => Variant::Int32(0),
            BuiltInKind::UInt32 => Variant::UInt32(0),
            BuiltInKind::Int64 => Variant::Int64(0),
            BuiltInKind::UInt64 => Variant::UInt64(0),
            BuiltInKind::Float => Variant::Float(0.0),
            BuiltInKind::Double => Variant::Double(0.0),
            BuiltInKind::String => Variant::String(UAString::null()),
            BuiltInKind::DateTime => Variant::from(DateTime::null()),
            BuiltInKind::Guid => Variant::from(Guid::null()),
            BuiltInKind::ByteString => Variant::ByteString(ByteString::null()),
            BuiltInKind::XmlElement => Variant::XmlElement(XmlElement::null()),
            BuiltInKind::NodeId => Variant::from(NodeId::null()),
            BuiltInKind::ExpandedNodeId => Variant::from(ExpandedNodeId::null()),
            BuiltInKind::StatusCode => Variant::StatusCode(StatusCode::Good),
            BuiltInKind::QualifiedName => Variant::from(QualifiedName::null()),
            BuiltInKind::LocalizedText => Variant::from(LocalizedText::null()),
            BuiltInKind::ExtensionObject => Variant::from(ExtensionObject::null()),
            BuiltInKind::DataValue => Variant::from(DataValue::null()),
            BuiltInKind::Variant => Variant::Variant(Box::new(Variant::Empty)),
            BuiltInKind::DiagnosticInfo => Variant::from(DiagnosticInfo::null()),
        }
    }

    /// Returns the kind of the value. For an array or a matrix this is the kind of its elements.
    pub fn kind(&self) -> BuiltInKind {
        match self {
            Variant::Empty => BuiltInKind::Null,
            Variant::Boolean(_) => BuiltInKind::Boolean,
            Variant::SByte(_) => BuiltInKind::SByte,
            Variant::Byte(_) => BuiltInKind::Byte,
            Variant::Int16(_) => BuiltInKind::Int16,
            Variant::UInt16(_) => BuiltInKind::UInt16,
            Variant::Int32(_) => BuiltInKind::Int32,
            Variant::UInt32(_) => BuiltInKind::UInt32,
            Variant::Int64(_) => BuiltInKind::Int64,
            Variant::UInt64(_) => BuiltInKind::UInt64,
            Variant::Float(_) => BuiltInKind::Float,
            Variant::Double(_) => BuiltInKind::Double,
            Variant::String(_) => BuiltInKind::String,
            Variant::DateTime(_) => BuiltInKind::DateTime,
            Variant::Guid(_) => BuiltInKind::Guid,
            Variant::ByteString(_) => BuiltInKind::ByteString,
            Variant::XmlElement(_) => BuiltInKind::XmlElement,
            Variant::NodeId(_) => BuiltInKind::NodeId,
            Variant::ExpandedNodeId(_) => BuiltInKind::ExpandedNodeId,
            Variant::StatusCode(_) => BuiltInKind::StatusCode,
            Variant::QualifiedName(_) => BuiltInKind::QualifiedName,
            Variant::LocalizedText(_) => BuiltInKind::LocalizedText,
            Variant::ExtensionObject(_) => BuiltInKind::ExtensionObject,
            Variant::DataValue(_) => BuiltInKind::DataValue,
            Variant::Variant(_) => BuiltInKind::Variant,
            Variant::DiagnosticInfo(_) => BuiltInKind::DiagnosticInfo,
            Variant::Array(array) => array.value_type,
            Variant::Matrix(matrix) => matrix.kind(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// Test if the variant holds a single dimension array
    pub fn is_array(&self) -> bool {
        matches!(self, Variant::Array(_))
    }

    /// Test if the variant holds a multi dimension array
    pub fn is_matrix(&self) -> bool {
        matches!(self, Variant::Matrix(_))
    }

    /// Tests and returns true if the variant holds a numeric scalar
    pub fn is_numeric(&self) -> bool {
        !self.is_array() && !self.is_matrix() && self.kind().is_numeric()
    }

    /// Returns the data type of the value, e.g. `i=6` for an `Int32` or an array of `Int32`
    pub fn data_type(&self) -> NodeId {
        self.kind().data_type_id()
    }

    /// Returns the value rank, -1 for a scalar, 1 for an array or the matrix rank
    pub fn value_rank(&self) -> i32 {
        match self {
            Variant::Array(_) => 1,
            Variant::Matrix(matrix) => matrix.dimensions().len() as i32,
            _ => -1,
        }
    }

    pub(crate) fn encoding_mask(&self) -> u8 {
        match self {
            Variant::Array(array) => array.encoding_mask(),
            Variant::Matrix(matrix) => {
                matrix.kind().encoding_mask()
                    | EncodingMask::ARRAY_VALUES_BIT
                    | EncodingMask::ARRAY_DIMENSIONS_BIT
            }
            value => value.kind().encoding_mask(),
        }
    }

    /// Returns the length of just the value of a scalar, not the encoding flag
    fn byte_len_value(&self) -> usize {
        match self {
            Variant::Empty => 0,
            Variant::Boolean(value) => value.byte_len(),
            Variant::SByte(value) => value.byte_len(),
            Variant::Byte(value) => value.byte_len(),
            Variant::Int16(value) => value.byte_len(),
            Variant::UInt16(value) => value.byte_len(),
            Variant::Int32(value) => value.byte_len(),
            Variant::UInt32(value) => value.byte_len(),
            Variant::Int64(value) => value.byte_len(),
            Variant::UInt64(value) => value.byte_len(),
            Variant::Float(value) => value.byte_len(),
            Variant::Double(value) => value.byte_len(),
            Variant::String(value) => value.byte_len(),
            Variant::DateTime(value) => value.byte_len(),
            Variant::Guid(value) => value.byte_len(),
            Variant::ByteString(value) => value.byte_len(),
            Variant::XmlElement(value) => value.byte_len(),
            Variant::NodeId(value) => value.byte_len(),
            Variant::ExpandedNodeId(value) => value.byte_len(),
            Variant::StatusCode(value) => value.byte_len(),
            Variant::QualifiedName(value) => value.byte_len(),
            Variant::LocalizedText(value) => value.byte_len(),
            Variant::ExtensionObject(value) => value.byte_len(),
            Variant::DataValue(value) => value.byte_len(),
            Variant::Variant(value) => value.byte_len(),
            Variant::DiagnosticInfo(value) => value.byte_len(),
            Variant::Array(_) | Variant::Matrix(_) => self.byte_len(),
        }
    }

    /// Encodes just the value of a scalar, not the encoding flag. A value of the `Variant` kind
    /// is the complete encoding of the inner variant.
    pub(crate) fn encode_value<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        match self {
            Variant::Empty => Ok(0),
            Variant::Boolean(value) => value.encode(stream),
            Variant::SByte(value) => value.encode(stream),
            Variant::Byte(value) => value.encode(stream),
            Variant::Int16(value) => value.encode(stream),
            Variant::UInt16(value) => value.encode(stream),
            Variant::Int32(value) => value.encode(stream),
            Variant::UInt32(value) => value.encode(stream),
            Variant::Int64(value) => value.encode(stream),
            Variant::UInt64(value) => value.encode(stream),
            Variant::Float(value) => value.encode(stream),
            Variant::Double(value) => value.encode(stream),
            Variant::String(value) => value.encode(stream),
            Variant::DateTime(value) => value.encode(stream),
            Variant::Guid(value) => value.encode(stream),
            Variant::ByteString(value) => value.encode(stream),
            Variant::XmlElement(value) => value.encode(stream),
            Variant::NodeId(value) => value.encode(stream),
            Variant::ExpandedNodeId(value) => value.encode(stream),
            Variant::StatusCode(value) => value.encode(stream),
            Variant::QualifiedName(value) => value.encode(stream),
            Variant::LocalizedText(value) => value.encode(stream),
            Variant::ExtensionObject(value) => value.encode(stream),
            Variant::DataValue(value) => value.encode(stream),
            Variant::Variant(value) => value.encode(stream),
            Variant::DiagnosticInfo(value) => value.encode(stream),
            Variant::Array(_) | Variant::Matrix(_) => {
                warn!("Cannot encode an array as a scalar value");
                Err(StatusCode::BadEncodingError.into())
            }
        }
    }

    /// Reads just the value of a scalar of the kind from the stream
    pub(crate) fn decode_value<S: Read>(
        kind: BuiltInKind,
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Variant> {
        let value = match kind {
            BuiltInKind::Null => Variant::Empty,
            BuiltInKind::Boolean => Self::from(bool::decode(stream, decoding_options)?),
            BuiltInKind::SByte => Self::from(i8::decode(stream, decoding_options)?),
            BuiltInKind::Byte => Self::from(u8::decode(stream, decoding_options)?),
            BuiltInKind::Int16 => Self::from(i16::decode(stream, decoding_options)?),
            BuiltInKind::UInt16 => Self::from(u16::decode(stream, decoding_options)?),
            BuiltInKind::Int32 => Self::from(i32::decode(stream, decoding_options)?),
            BuiltInKind::UInt32 => Self::from(u32::decode(stream, decoding_options)?),
            BuiltInKind::Int64 => Self::from(i64::decode(stream, decoding_options)?),
            BuiltInKind::UInt64 => Self::from(u64::decode(stream, decoding_options)?),
            BuiltInKind::Float => Self::from(f32::decode(stream, decoding_options)?),
            BuiltInKind::Double => Self::from(f64::decode(stream, decoding_options)?),
            BuiltInKind::String => Self::from(UAString::decode(stream, decoding_options)?),
            BuiltInKind::DateTime => Self::from(DateTime::decode(stream, decoding_options)?),
            BuiltInKind::Guid => Self::from(Guid::decode(stream, decoding_options)?),
            BuiltInKind::ByteString => Self::from(ByteString::decode(stream, decoding_options)?),
            BuiltInKind::XmlElement => Self::from(XmlElement::decode(stream, decoding_options)?),
            BuiltInKind::NodeId => Self::from(NodeId::decode(stream, decoding_options)?),
            BuiltInKind::ExpandedNodeId => {
                Self::from(ExpandedNodeId::decode(stream, decoding_options)?)
            }
            BuiltInKind::StatusCode => Self::from(StatusCode::decode(stream, decoding_options)?),
            BuiltInKind::QualifiedName => {
                Self::from(QualifiedName::decode(stream, decoding_options)?)
            }
            BuiltInKind::LocalizedText => {
                Self::from(LocalizedText::decode(stream, decoding_options)?)
            }
            BuiltInKind::ExtensionObject => {
                // Extension object internally does depth checking to prevent deep recursion
                Self::from(ExtensionObject::decode(stream, decoding_options)?)
            }
            BuiltInKind::DataValue => Self::from(DataValue::decode(stream, decoding_options)?),
            BuiltInKind::Variant => {
                // Nested variant is depth checked to prevent deep recursion
                let _depth_lock = decoding_options.depth_lock()?;
                Variant::Variant(Box::new(Variant::decode(stream, decoding_options)?))
            }
            BuiltInKind::DiagnosticInfo => {
                Self::from(DiagnosticInfo::decode(stream, decoding_options)?)
            }
            BuiltInKind::Encodeable => {
                error!("A structure cannot be decoded without its type");
                return Err(StatusCode::BadDecodingError.into());
            }
        };
        Ok(value)
    }

    /// Array elements of the `Variant` kind are complete variants, anything else is just the value.
    fn byte_len_element(kind: BuiltInKind, value: &Variant) -> usize {
        if kind == BuiltInKind::Variant {
            value.byte_len()
        } else {
            value.byte_len_value()
        }
    }

    pub(crate) fn encode_element<S: Write>(
        stream: &mut S,
        kind: BuiltInKind,
        value: &Variant,
    ) -> EncodingResult<usize> {
        if kind == BuiltInKind::Variant {
            value.encode(stream)
        } else {
            value.encode_value(stream)
        }
    }

    pub(crate) fn decode_element<S: Read>(
        kind: BuiltInKind,
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Variant> {
        if kind == BuiltInKind::Variant {
            let _depth_lock = decoding_options.depth_lock()?;
            Variant::decode(stream, decoding_options)
        } else {
            Variant::decode_value(kind, stream, decoding_options)
        }
    }
}
