// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::str::FromStr;

use crate::types::{builtin_kind::BUILT_IN_KINDS, tests::*};

#[test]
fn size() {
    // Boxing the larger values keeps a variant small
    let size = std::mem::size_of::<Variant>();
    println!("Variant size is {}", size);
    assert!(size <= 32);
}

#[test]
fn variant_type_id() {
    let types = [
        (Variant::Empty, BuiltInKind::Null),
        (Variant::from(true), BuiltInKind::Boolean),
        (Variant::from(0i8), BuiltInKind::SByte),
        (Variant::from(0u8), BuiltInKind::Byte),
        (Variant::from(0i16), BuiltInKind::Int16),
        (Variant::from(0u16), BuiltInKind::UInt16),
        (Variant::from(0i32), BuiltInKind::Int32),
        (Variant::from(0u32), BuiltInKind::UInt32),
        (Variant::from(0i64), BuiltInKind::Int64),
        (Variant::from(0u64), BuiltInKind::UInt64),
        (Variant::from(0f32), BuiltInKind::Float),
        (Variant::from(0f64), BuiltInKind::Double),
        (Variant::from("Hello"), BuiltInKind::String),
        (Variant::from(DateTime::now()), BuiltInKind::DateTime),
        (Variant::from(Guid::new()), BuiltInKind::Guid),
        (
            Variant::from(ByteString::from(b"abc")),
            BuiltInKind::ByteString,
        ),
        (
            Variant::from(XmlElement::from("<a/>")),
            BuiltInKind::XmlElement,
        ),
        (Variant::from(NodeId::new(1, 1u32)), BuiltInKind::NodeId),
        (
            Variant::from(ExpandedNodeId::null()),
            BuiltInKind::ExpandedNodeId,
        ),
        (Variant::from(StatusCode::Good), BuiltInKind::StatusCode),
        (
            Variant::from(QualifiedName::null()),
            BuiltInKind::QualifiedName,
        ),
        (
            Variant::from(LocalizedText::new("", "")),
            BuiltInKind::LocalizedText,
        ),
        (
            Variant::from(ExtensionObject::null()),
            BuiltInKind::ExtensionObject,
        ),
        (Variant::from(DataValue::null()), BuiltInKind::DataValue),
        (
            Variant::Variant(Box::new(Variant::from(1u8))),
            BuiltInKind::Variant,
        ),
        (
            Variant::from(DiagnosticInfo::null()),
            BuiltInKind::DiagnosticInfo,
        ),
    ];
    for (value, kind) in types {
        assert_eq!(value.kind(), kind, "{:?}", value);
        assert_eq!(value.value_rank(), -1);
        assert!(!value.is_array());
    }
}

#[test]
fn default_for_every_kind() {
    for kind in BUILT_IN_KINDS {
        assert_eq!(Variant::default_for(kind).kind(), kind);
    }
    assert!(Variant::default_for(BuiltInKind::Null).is_empty());
    assert_eq!(Variant::default_for(BuiltInKind::Int32), Variant::Int32(0));
    assert_eq!(
        Variant::default_for(BuiltInKind::String),
        Variant::String(UAString::null())
    );
    assert_eq!(
        Variant::default_for(BuiltInKind::StatusCode),
        Variant::StatusCode(StatusCode::Good)
    );
}

#[test]
fn data_type_and_value_rank() {
    let v = Variant::from(7i32);
    assert_eq!(v.data_type(), NodeId::new(0, 6u32));
    assert!(v.is_numeric());

    let v = Variant::from(vec![1i32, 2, 3]);
    assert_eq!(v.data_type(), NodeId::new(0, 6u32));
    assert_eq!(v.value_rank(), 1);
    assert!(v.is_array());
    assert!(!v.is_numeric());

    let v = Variant::from(Matrix::new(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], vec![2u32, 2, 2]).unwrap());
    assert_eq!(v.kind(), BuiltInKind::Double);
    assert_eq!(v.data_type(), NodeId::new(0, 11u32));
    assert_eq!(v.value_rank(), 3);
    assert!(v.is_matrix());

    assert_eq!(
        Variant::from(LocalizedText::new("en", "x")).data_type(),
        NodeId::new(0, 21u32)
    );
    assert!(!Variant::from("1").is_numeric());
}

#[test]
fn array_from_typed_values() {
    let v = Variant::from(vec!["a", "b"].into_iter().map(UAString::from).collect::<Vec<_>>());
    match v {
        Variant::Array(ref array) => {
            assert_eq!(array.value_type, BuiltInKind::String);
            assert_eq!(
                array.values,
                vec![Variant::from("a"), Variant::from("b")]
            );
        }
        _ => panic!("Expected an array"),
    }

    let strs: &[&str] = &["x", "y", "z"];
    let v = Variant::from(strs);
    assert_eq!(v.kind(), BuiltInKind::String);
    let values: Vec<UAString> = Vec::try_from(&v).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[2], UAString::from("z"));
}

#[test]
fn array_try_from_wrong_kind() {
    let v = Variant::from(vec![1u32, 2, 3]);
    assert_eq!(Vec::<u32>::try_from(&v).unwrap(), vec![1, 2, 3]);
    assert!(matches!(
        Vec::<i32>::try_from(&v),
        Err(EncodingError::TypeMismatch {
            expected: BuiltInKind::Int32,
            ..
        })
    ));
    // A scalar is not an array
    assert!(Vec::<u32>::try_from(&Variant::from(1u32)).is_err());
}

#[test]
fn array_new_checks_kind() {
    assert!(Array::new(BuiltInKind::Double, vec![Variant::from(1.0f64)]).is_ok());
    assert!(matches!(
        Array::new(BuiltInKind::Double, vec![Variant::from(1.0f64), Variant::from(1.0f32)]),
        Err(EncodingError::TypeMismatch {
            expected: BuiltInKind::Double,
            ..
        })
    ));
    // An empty array still has a kind
    let array = Array::new(BuiltInKind::Guid, Vec::<Variant>::new()).unwrap();
    assert!(array.is_empty());
    assert_eq!(Variant::from(array).kind(), BuiltInKind::Guid);
}

#[test]
fn values_and_variants() {
    let guids = vec![Guid::new(), Guid::new()];
    let variants = values_to_variants(&guids);
    assert_eq!(variants.len(), 2);
    assert!(variants.iter().all(|v| v.kind() == BuiltInKind::Guid));
    let back: Vec<Guid> = variants_to_values(variants).unwrap();
    assert_eq!(back, guids);

    let mixed = vec![Variant::from(1i16), Variant::from(2i32)];
    assert!(matches!(
        variants_to_values::<i16>(mixed),
        Err(EncodingError::TypeMismatch { .. })
    ));

    // Variants are the values of the Variant kind
    let variants = vec![Variant::Empty, Variant::from("x")];
    let back: Vec<Variant> = variants_to_values(variants.clone()).unwrap();
    assert_eq!(back, variants);
}

#[test]
fn variant_scalar_kind() {
    fn kind_of<T: VariantScalar>(value: T) -> (BuiltInKind, BuiltInKind) {
        (T::KIND, value.into_variant().kind())
    }
    let (declared, actual) = kind_of(QualifiedName::new(2, "Name"));
    assert_eq!(declared, BuiltInKind::QualifiedName);
    assert_eq!(declared, actual);
    let (declared, actual) = kind_of(StatusCode::BadTypeMismatch);
    assert_eq!(declared, BuiltInKind::StatusCode);
    assert_eq!(declared, actual);

    assert_eq!(
        u64::from_variant(Variant::UInt64(u64::MAX)),
        Some(u64::MAX)
    );
    assert_eq!(u64::from_variant(Variant::Int64(1)), None);
    assert_eq!(
        NodeId::from_variant(Variant::from(NodeId::new(3, "a"))),
        Some(NodeId::new(3, "a"))
    );
}

#[test]
fn matrix_of_variants() {
    let m = Matrix::from_variants(
        BuiltInKind::Variant,
        vec![
            Variant::from(1i32),
            Variant::from("a"),
            Variant::Empty,
            Variant::from(vec![1u8]),
        ],
        vec![2, 2],
    )
    .unwrap();
    assert_eq!(m.kind(), BuiltInKind::Variant);
    assert_eq!(m.get(&[0, 1]), Some(Variant::from("a")));
    assert_eq!(m.get(&[1, 1]), Some(Variant::from(vec![1u8])));
}

#[test]
fn display() {
    assert_eq!(Variant::Empty.to_string(), "Empty");
    assert_eq!(Variant::from(-5i32).to_string(), "-5");
    assert_eq!(Variant::from("text").to_string(), "text");
    assert_eq!(Variant::from(NodeId::new(2, 5u32)).to_string(), "ns=2;i=5");
    assert_eq!(
        Variant::Variant(Box::new(Variant::from(true))).to_string(),
        "Variant(true)"
    );
}

#[test]
fn builtin_kind_names() {
    for kind in BUILT_IN_KINDS {
        assert_eq!(BuiltInKind::from_str(kind.name()).unwrap(), kind);
        assert_eq!(BuiltInKind::from_type_id(kind.type_id()).unwrap(), kind);
    }
    assert!(BuiltInKind::from_str("Integer").is_err());
    assert!(BuiltInKind::from_type_id(26).is_err());
}

#[test]
fn data_value_in_variant() {
    let dv = DataValue::value_only(10u16).with_status(StatusCode::GoodClamped);
    assert_eq!(dv.status(), StatusCode::GoodClamped);
    let v = Variant::from(dv.clone());
    assert_eq!(v.kind(), BuiltInKind::DataValue);
    serialize_test(v);
    serialize_test(dv);
}
