// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `Array`, a single dimension array of one kind.

use crate::types::{
    builtin_kind::{BuiltInKind, EncodingMask},
    error::{EncodingError, EncodingResult},
    variant::{Variant, VariantScalar},
};

/// An array is a vector of values that all have the same kind. Multi dimension arrays are
/// held by `Matrix`.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Kind of elements in the array
    pub value_type: BuiltInKind,

    /// Values are stored sequentially
    pub values: Vec<Variant>,
}

impl Array {
    /// Creates an array, checking that every value is a scalar of the kind. Arrays of the
    /// `Variant` kind may hold any value other than a nested array.
    pub fn new<V>(value_type: BuiltInKind, values: V) -> EncodingResult<Array>
    where
        V: Into<Vec<Variant>>,
    {
        let values = values.into();
        match value_type {
            BuiltInKind::Null | BuiltInKind::Encodeable => {
                error!("Invalid array type {} supplied", value_type);
                Err(EncodingError::type_mismatch(value_type, value_type.name()))
            }
            _ => {
                values_are_of_kind(&values, value_type)?;
                Ok(Array { value_type, values })
            }
        }
    }

    /// Creates an array from typed values
    pub fn from_values<T: VariantScalar>(values: Vec<T>) -> Array {
        Array {
            value_type: T::KIND,
            values: values.into_iter().map(VariantScalar::into_variant).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn encoding_mask(&self) -> u8 {
        self.value_type.encoding_mask() | EncodingMask::ARRAY_VALUES_BIT
    }
}

/// Check that all elements in the slice are scalars of the expected kind. The elements of a
/// `Variant` array are variants themselves, so they may be anything including arrays.
pub fn values_are_of_kind(values: &[Variant], expected: BuiltInKind) -> EncodingResult<()> {
    if expected == BuiltInKind::Variant {
        return Ok(());
    }
    let unexpected = values
        .iter()
        .find(|v| v.is_array() || v.is_matrix() || v.kind() != expected);
    match unexpected {
        Some(v) => {
            error!(
                "Array's kind is expected to be {} but found {:?} in it",
                expected, v
            );
            let found = if v.is_array() || v.is_matrix() {
                "nested array"
            } else {
                v.kind().name()
            };
            Err(EncodingError::type_mismatch(expected, found))
        }
        None => Ok(()),
    }
}

#[test]
fn array_kind_checked() {
    let array = Array::new(BuiltInKind::Int32, vec![Variant::from(1i32), Variant::from(2i32)]).unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array.encoding_mask(), 6 | 0x80);

    assert!(matches!(
        Array::new(BuiltInKind::Int32, vec![Variant::from(1i32), Variant::from("x")]),
        Err(EncodingError::TypeMismatch { .. })
    ));
    assert!(Array::new(BuiltInKind::Null, Vec::<Variant>::new()).is_err());

    // Mixed and nested content is fine in an array of variants but not in a typed array
    let mixed = Array::new(
        BuiltInKind::Variant,
        vec![Variant::from(vec![1i32, 2]), Variant::from("x")],
    );
    assert!(mixed.is_ok());
    let nested = Array::new(
        BuiltInKind::Int32,
        vec![Variant::from(vec![1i32, 2]), Variant::from(1i32)],
    );
    assert!(nested.is_err());
}
