// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `Matrix`, a multi dimension array held in a typed flat buffer.

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
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_codes::StatusCode,
    string::{UAString, XmlElement},
    variant::{values_to_variants, variants_to_values, Variant},
};

macro_rules! matrix_elements {
    ( $( $kind:ident => $ty:ty ),* $(,)? ) => {
        /// The flat element buffer of a matrix. There is one case per built-in kind so the
        /// element type is fixed by the buffer itself.
        #[derive(Debug, Clone, PartialEq)]
        pub enum MatrixElements {
            $( $kind(Vec<$ty>), )*
        }

        impl MatrixElements {
            /// The kind of the elements
            pub fn kind(&self) -> BuiltInKind {
                match self {
                    $( MatrixElements::$kind(_) => BuiltInKind::$kind, )*
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $( MatrixElements::$kind(v) => v.len(), )*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Copies the elements out as variants, in buffer order
            pub fn to_variants(&self) -> Vec<Variant> {
                match self {
                    $( MatrixElements::$kind(v) => values_to_variants(v), )*
                }
            }

            /// Builds a buffer of the kind from variants that must all hold that kind
            pub fn from_variants(kind: BuiltInKind, values: Vec<Variant>) -> EncodingResult<Self> {
                match kind {
                    $( BuiltInKind::$kind => Ok(MatrixElements::$kind(variants_to_values(values)?)), )*
                    _ => Err(EncodingError::type_mismatch(kind, "matrix element")),
                }
            }
        }

        $(
            impl From<Vec<$ty>> for MatrixElements {
                fn from(v: Vec<$ty>) -> Self {
                    MatrixElements::$kind(v)
                }
            }
        )*
    };
}

matrix_elements! {
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
    DateTime => DateTime,
    Guid => Guid,
    ByteString => ByteString,
    XmlElement => XmlElement,
    NodeId => NodeId,
    ExpandedNodeId => ExpandedNodeId,
    StatusCode => StatusCode,
    QualifiedName => QualifiedName,
    LocalizedText => LocalizedText,
    ExtensionObject => ExtensionObject,
    DataValue => DataValue,
    Variant => Variant,
    DiagnosticInfo => DiagnosticInfo,
}

/// A multi dimension array. Elements are stored row major, the last dimension varies fastest.
/// For example dimensions [2,2,2] are held in the order [0,0,0], [0,0,1], [0,1,0], [0,1,1],
/// [1,0,0], [1,0,1], [1,1,0], [1,1,1].
///
/// A matrix always has at least one dimension, no dimension is zero and the product of the
/// dimensions equals the number of elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    elements: MatrixElements,
    dimensions: Vec<u32>,
}

impl Matrix {
    pub fn new<E, D>(elements: E, dimensions: D) -> EncodingResult<Matrix>
    where
        E: Into<MatrixElements>,
        D: Into<Vec<u32>>,
    {
        let elements = elements.into();
        let dimensions = dimensions.into();
        Self::check_shape(elements.len(), &dimensions)?;
        Ok(Matrix {
            elements,
            dimensions,
        })
    }

    /// Creates a matrix from variants holding values of the kind
    pub fn from_variants(
        kind: BuiltInKind,
        values: Vec<Variant>,
        dimensions: Vec<u32>,
    ) -> EncodingResult<Matrix> {
        Self::check_shape(values.len(), &dimensions)?;
        Ok(Matrix {
            elements: MatrixElements::from_variants(kind, values)?,
            dimensions,
        })
    }

    fn check_shape(len: usize, dimensions: &[u32]) -> EncodingResult<()> {
        let invalid = || EncodingError::InvalidShape {
            len,
            dimensions: dimensions.to_vec(),
        };
        if dimensions.is_empty() || dimensions.iter().any(|d| *d == 0) {
            return Err(invalid());
        }
        let product = dimensions
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(*d as usize))
            .ok_or_else(invalid)?;
        if product != len {
            Err(invalid())
        } else {
            Ok(())
        }
    }

    /// The kind of the elements
    pub fn kind(&self) -> BuiltInKind {
        self.elements.kind()
    }

    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    pub fn elements(&self) -> &MatrixElements {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn to_variants(&self) -> Vec<Variant> {
        self.elements.to_variants()
    }

    /// Gives the same elements a new shape. The new dimensions must describe the same number of
    /// elements.
    pub fn reshape<D>(self, dimensions: D) -> EncodingResult<Matrix>
    where
        D: Into<Vec<u32>>,
    {
        Matrix::new(self.elements, dimensions)
    }

    /// Returns the element at the index, one coordinate per dimension
    pub fn get(&self, index: &[u32]) -> Option<Variant> {
        if index.len() != self.dimensions.len() {
            return None;
        }
        let mut offset = 0usize;
        for (i, d) in index.iter().zip(self.dimensions.iter()) {
            if i >= d {
                return None;
            }
            offset = offset * (*d as usize) + *i as usize;
        }
        self.to_variants().into_iter().nth(offset)
    }
}
