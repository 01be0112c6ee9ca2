// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

use std::str::FromStr;

use serde_json::json;

use crate::{
    codec::*,
    types::{
        argument::Argument,
        builtin_kind::{BuiltInKind, BUILT_IN_KINDS},
        byte_string::ByteString,
        data_value::DataValue,
        date_time::DateTime,
        diagnostic_info::DiagnosticInfo,
        encoding::DecodingOptions,
        error::{EncodingError, EncodingResult},
        expanded_node_id::ExpandedNodeId,
        extension_object::{ExtensionObject, ExtensionObjectBody},
        guid::Guid,
        localized_text::LocalizedText,
        matrix::Matrix,
        node_id::{IdType, NodeId},
        qualified_name::QualifiedName,
        status_codes::StatusCode,
        string::{UAString, XmlElement},
        structures::{ProgramDiagnostic2DataType, Range, StatusResult},
        variant::Variant,
    },
};

/// Encoder and decoder content types that must give back exactly what was written
const REVERSIBLE_PAIRS: [(ContentType, ContentType); 6] = [
    (ContentType::Binary, ContentType::Binary),
    (ContentType::Xml, ContentType::Xml),
    (ContentType::Json, ContentType::Json),
    (ContentType::Json, ContentType::JsonReference),
    (ContentType::JsonReference, ContentType::Json),
    (ContentType::JsonReference, ContentType::JsonReference),
];

const REVERSIBLE: [ContentType; 4] = [
    ContentType::Binary,
    ContentType::Xml,
    ContentType::Json,
    ContentType::JsonReference,
];

fn guid() -> Guid {
    Guid::from_str("72962b91-fa75-4ae6-8d28-b404dc7daf63").unwrap()
}

fn range() -> Range {
    Range {
        low: 0.5,
        high: 100.25,
    }
}

/// One value of every kind, with something other than the null value in it
fn sample_scalars() -> Vec<Variant> {
    vec![
        Variant::Boolean(true),
        Variant::SByte(-5),
        Variant::Byte(200),
        Variant::Int16(-17000),
        Variant::UInt16(57000),
        Variant::Int32(-17444000),
        Variant::UInt32(4000000000),
        Variant::Int64(-123456789012),
        Variant::UInt64(123456789123456789),
        Variant::Float(1.5),
        Variant::Double(-2.25e10),
        Variant::from("hello <world> & \"you\""),
        Variant::from(""),
        Variant::from(DateTime::ymd_hms_nano(2024, 3, 1, 10, 15, 30, 123_456_700)),
        Variant::from(guid()),
        Variant::from(ByteString::from(vec![0u8, 1, 2, 254, 255])),
        Variant::from(XmlElement::from(UAString::from("<a>b</a>"))),
        Variant::from(NodeId::new(2, "Pump")),
        Variant::from(NodeId::new(0, 85u32)),
        Variant::from(NodeId::new(1, guid())),
        Variant::from(NodeId::new(3, ByteString::from(vec![1u8, 2, 3]))),
        Variant::from(ExpandedNodeId {
            node_id: NodeId::new(0, "Pump"),
            namespace_uri: UAString::from("urn:plant"),
            server_index: 2,
        }),
        Variant::from(ExpandedNodeId::from(NodeId::new(4, 1000u32))),
        Variant::StatusCode(StatusCode::BadDecodingError),
        Variant::from(QualifiedName::new(2, "Pump")),
        Variant::from(LocalizedText::new("en", "Pump")),
        Variant::from(ExtensionObject::from_encodeable(&range()).unwrap()),
        Variant::from(DataValue {
            value: Some(Variant::from(21.5f64)),
            status: Some(StatusCode::Good),
            source_timestamp: Some(DateTime::ymd_hms(2024, 3, 1, 10, 0, 0)),
            source_picoseconds: Some(10),
            server_timestamp: Some(DateTime::ymd_hms(2024, 3, 1, 10, 0, 1)),
            server_picoseconds: Some(20),
        }),
        Variant::Variant(Box::new(Variant::Int32(7))),
        Variant::from(DiagnosticInfo {
            symbolic_id: Some(1),
            additional_info: Some(UAString::from("pump stalled")),
            inner_status_code: Some(StatusCode::BadDecodingError),
            inner_diagnostic_info: Some(Box::new(DiagnosticInfo {
                locale: Some(3),
                ..DiagnosticInfo::null()
            })),
            ..DiagnosticInfo::null()
        }),
    ]
}

/// Writes with one content type and reads what was written with another
fn round_trip<T, W, R>(encoder_type: ContentType, decoder_type: ContentType, write: W, read: R) -> T
where
    W: FnOnce(&mut dyn Encoder) -> EncodingResult<()>,
    R: FnOnce(&mut dyn Decoder) -> EncodingResult<T>,
{
    let data = encode(encoder_type, write).unwrap();
    decode(decoder_type, &data, read).unwrap()
}

fn round_trip_scalar(value: &Variant) {
    for (from, to) in REVERSIBLE_PAIRS.iter() {
        let decoded = round_trip(
            *from,
            *to,
            |e| e.write_scalar(Some("Field"), value),
            |d| d.read_scalar(Some("Field"), value.kind()),
        );
        assert_eq!(&decoded, value, "{} to {}", from, to);
    }
}

fn diagnostic() -> ProgramDiagnostic2DataType {
    let mut output_argument = Argument::new("Level", NodeId::new(0, 11u32), 1, "Fill level");
    output_argument.array_dimensions = Some(vec![3]);
    ProgramDiagnostic2DataType {
        create_session_id: NodeId::new(1, guid()),
        create_client_name: UAString::from("Operator console"),
        invocation_creation_time: DateTime::ymd_hms(2024, 3, 1, 8, 0, 0),
        last_transition_time: DateTime::ymd_hms_nano(2024, 3, 1, 9, 30, 0, 500_000_000),
        last_method_call: UAString::from("Start"),
        last_method_session_id: NodeId::new(1, 42u32),
        last_method_input_arguments: Some(vec![
            Argument::new("Speed", NodeId::new(0, 6u32), -1, "Pump speed"),
            Argument::new("Mode", NodeId::new(0, 12u32), -1, "Run mode"),
        ]),
        last_method_output_arguments: Some(vec![output_argument]),
        last_method_input_values: Some(vec![Variant::Int32(1500), Variant::from("auto")]),
        last_method_output_values: Some(vec![Variant::from(vec![1.5f64, 2.5, 3.5])]),
        last_method_call_time: DateTime::ymd_hms(2024, 3, 1, 9, 29, 59),
        last_method_return_status: StatusResult {
            status_code: StatusCode::BadDecodingError,
            diagnostic_info: DiagnosticInfo {
                additional_info: Some(UAString::from("speed out of range")),
                ..DiagnosticInfo::null()
            },
        },
    }
}

#[test]
fn scalars_round_trip() {
    for value in sample_scalars() {
        round_trip_scalar(&value);
    }
}

#[test]
fn null_scalars_round_trip() {
    for kind in BUILT_IN_KINDS.iter() {
        if matches!(kind, BuiltInKind::Null | BuiltInKind::Encodeable) {
            continue;
        }
        round_trip_scalar(&Variant::default_for(*kind));
    }
}

#[test]
fn arrays_round_trip() {
    for value in sample_scalars() {
        let kind = value.kind();
        if kind == BuiltInKind::Variant {
            continue;
        }
        let values = vec![value.clone(), Variant::default_for(kind), value];
        for (from, to) in REVERSIBLE_PAIRS.iter() {
            let data = encode(*from, |e| {
                e.write_array(Some("Field"), kind, Some(&values))?;
                e.write_array(Some("Empty"), kind, Some(&[][..]))?;
                e.write_array(Some("Missing"), kind, None)
            })
            .unwrap();
            let (decoded, empty, missing) = decode(*to, &data, |d| {
                Ok((
                    d.read_array(Some("Field"), kind)?,
                    d.read_array(Some("Empty"), kind)?,
                    d.read_array(Some("Missing"), kind)?,
                ))
            })
            .unwrap();
            assert_eq!(decoded.as_ref(), Some(&values), "{} to {}", from, to);
            assert_eq!(empty, Some(Vec::new()), "{} to {}", from, to);
            assert_eq!(missing, None, "{} to {}", from, to);
        }
    }
}

#[test]
fn variant_arrays_round_trip() {
    let values = vec![
        Variant::Int32(1),
        Variant::from("two"),
        Variant::Empty,
        Variant::from(vec![3u16, 4]),
        Variant::from(LocalizedText::new("de", "Pumpe")),
    ];
    for (from, to) in REVERSIBLE_PAIRS.iter() {
        let data = encode(*from, |e| e.write_variant_array(Some("Field"), Some(&values))).unwrap();
        let decoded = decode(*to, &data, |d| d.read_variant_array(Some("Field"))).unwrap();
        assert_eq!(decoded, Some(values.clone()), "{} to {}", from, to);
    }
}

#[test]
fn matrices_round_trip() {
    let numbers = Matrix::new(vec![1i32, 2, 3, 4, 5, 6], vec![2u32, 3]).unwrap();
    let names = Matrix::from_variants(
        BuiltInKind::String,
        vec![
            Variant::from("a"),
            Variant::String(UAString::null()),
            Variant::from("c"),
            Variant::from("d"),
        ],
        vec![4, 1],
    )
    .unwrap();
    for (from, to) in REVERSIBLE_PAIRS.iter() {
        let data = encode(*from, |e| {
            e.write_matrix(Some("Numbers"), &numbers)?;
            e.write_matrix(Some("Names"), &names)?;
            e.write_null_array(Some("Missing"))
        })
        .unwrap();
        let decoded = decode(*to, &data, |d| {
            Ok((
                d.read_matrix(Some("Numbers"), BuiltInKind::Int32)?,
                d.read_matrix(Some("Names"), BuiltInKind::String)?,
                d.read_matrix(Some("Missing"), BuiltInKind::Double)?,
            ))
        })
        .unwrap();
        assert_eq!(
            decoded,
            (Some(numbers.clone()), Some(names.clone()), None),
            "{} to {}",
            from,
            to
        );
    }
}

#[test]
fn three_dimension_string_matrix() {
    let values = (0..63).map(|i| Variant::from(format!("s{}", i))).collect();
    let matrix = Matrix::from_variants(BuiltInKind::String, values, vec![7, 3, 3]).unwrap();
    let value = Variant::from(matrix);
    for (from, to) in REVERSIBLE_PAIRS.iter() {
        let data = encode(*from, |e| e.write_variant(Some("Field"), &value)).unwrap();
        let decoded = decode(*to, &data, |d| d.read_variant(Some("Field"))).unwrap();
        assert_eq!(decoded, value, "{} to {}", from, to);
        match decoded {
            Variant::Matrix(matrix) => assert_eq!(matrix.dimensions(), &[7, 3, 3]),
            v => panic!("Expected a matrix, got {:?}", v),
        }
    }
}

#[test]
fn matrices_of_every_kind() {
    for value in sample_scalars() {
        let kind = value.kind();
        if kind == BuiltInKind::Variant {
            continue;
        }
        let null = Variant::default_for(kind);
        let values = vec![
            value.clone(),
            null.clone(),
            value.clone(),
            value.clone(),
            value,
            null,
        ];
        let matrix = Matrix::from_variants(kind, values, vec![2, 1, 3]).unwrap();
        for (from, to) in REVERSIBLE_PAIRS.iter() {
            let decoded = round_trip(
                *from,
                *to,
                |e| e.write_matrix(Some("Field"), &matrix),
                |d| d.read_matrix(Some("Field"), kind),
            );
            assert_eq!(decoded.as_ref(), Some(&matrix), "{} {} to {}", kind, from, to);
        }
    }
}

#[test]
fn uint64_in_every_json_dialect() {
    let value = 123456789123456789u64;
    for content_type in CONTENT_TYPES.iter().filter(|c| c.is_json()) {
        let data = encode(*content_type, |e| e.write_uint64(Some("Total"), value)).unwrap();
        let decoded = decode(*content_type, &data, |d| d.read_uint64(Some("Total"))).unwrap();
        assert_eq!(decoded, value, "{}", content_type);
    }
}

#[test]
fn date_time_offsets_are_normalized() {
    let expected = DateTime::ymd_hms(2024, 3, 1, 10, 0, 0);
    let decoded = decode(ContentType::JsonReference, b"\"2024-03-01T12:00:00+02:00\"", |d| {
        d.read_date_time(None)
    })
    .unwrap();
    assert_eq!(decoded, expected);

    let xml = b"<UaDocument><DateTime>2024-03-01T07:30:00-02:30</DateTime></UaDocument>";
    let decoded = decode(ContentType::Xml, xml, |d| d.read_date_time(None)).unwrap();
    assert_eq!(decoded, expected);
}

#[test]
fn date_time_min_and_max() {
    let data = encode(ContentType::JsonReference, |e| {
        e.write_date_time(None, DateTime::null())?;
        e.write_date_time(None, DateTime::endtimes())
    })
    .unwrap();
    let documents: Vec<serde_json::Value> = serde_json::Deserializer::from_slice(&data)
        .into_iter::<serde_json::Value>()
        .map(Result::unwrap)
        .collect();
    assert_eq!(
        documents,
        vec![json!("0001-01-01T00:00:00Z"), json!("9999-12-31T23:59:59Z")]
    );

    // Anything outside of the range is clamped to it
    let json = b"\"1500-06-01T00:00:00Z\" \"9999-12-31T23:59:59.9999999Z\"";
    let (min, max) = decode(ContentType::JsonReference, json, |d| {
        Ok((d.read_date_time(None)?, d.read_date_time(None)?))
    })
    .unwrap();
    assert!(min.is_null());
    assert!(max.is_endtimes());
}

#[test]
fn variants_until_end_of_input() {
    for content_type in REVERSIBLE.iter() {
        let data = encode(*content_type, |e| {
            for i in 1..=5 {
                e.write_variant(None, &Variant::Int32(i))?;
            }
            Ok(())
        })
        .unwrap();
        let values = decode(*content_type, &data, |d| {
            let mut values = Vec::new();
            loop {
                match d.read_variant(None)? {
                    Variant::Empty => break,
                    value => values.push(value),
                }
            }
            Ok(values)
        })
        .unwrap();
        assert_eq!(
            values,
            (1..=5).map(Variant::Int32).collect::<Vec<_>>(),
            "{}",
            content_type
        );
    }
}

#[test]
fn encodeables_until_end_of_input() {
    let ranges = vec![
        range(),
        Range::default(),
        Range {
            low: -1.0,
            high: 1.0,
        },
    ];
    for content_type in REVERSIBLE.iter() {
        let data = encode(*content_type, |e| {
            for value in &ranges {
                e.write_encodeable(None, value)?;
            }
            Ok(())
        })
        .unwrap();
        let values = decode(*content_type, &data, |d| {
            let mut values = Vec::new();
            while let Some(value) = d.read_encodeable::<Range>(None)? {
                values.push(value);
            }
            // Reading past the end keeps yielding nothing
            assert!(d.read_encodeable::<Range>(None)?.is_none());
            Ok(values)
        })
        .unwrap();
        assert_eq!(values, ranges, "{}", content_type);
    }
}

#[test]
fn field_named_like_a_key_of_its_value() {
    // In the reference dialect these values are written bare, and each is an object whose only
    // key is the field name
    let data_value = DataValue {
        value: Some(Variant::Int32(5)),
        ..DataValue::null()
    };
    let status = StatusResult {
        status_code: StatusCode::BadDecodingError,
        diagnostic_info: DiagnosticInfo::null(),
    };
    let text = LocalizedText {
        locale: UAString::null(),
        text: UAString::from("Pump"),
    };
    let data = encode(ContentType::JsonReference, |e| {
        e.write_data_value(Some("Value"), &data_value)
    })
    .unwrap();
    let document: serde_json::Value = serde_json::from_slice(&data).unwrap();
    assert_eq!(document, json!({"Value": {"Type": 6, "Body": 5}}));

    for (from, to) in REVERSIBLE_PAIRS.iter() {
        let decoded = round_trip(
            *from,
            *to,
            |e| {
                e.write_data_value(Some("Value"), &data_value)?;
                e.write_encodeable(Some("StatusCode"), &status)?;
                e.write_localized_text(Some("Text"), &text)
            },
            |d| {
                Ok((
                    d.read_data_value(Some("Value"))?,
                    d.read_encodeable::<StatusResult>(Some("StatusCode"))?,
                    d.read_localized_text(Some("Text"))?,
                ))
            },
        );
        assert_eq!(
            decoded,
            (data_value.clone(), Some(status.clone()), text.clone()),
            "{} to {}",
            from,
            to
        );
    }
}

#[test]
fn expanded_node_id_namespace_forms() {
    let with_both = ExpandedNodeId {
        node_id: NodeId::new(2, "Pump"),
        namespace_uri: UAString::from("urn:plant"),
        server_index: 1,
    };
    let empty_uri = ExpandedNodeId {
        namespace_uri: UAString::from(""),
        ..with_both.clone()
    };
    let read_back = |content_type: ContentType, value: &ExpandedNodeId| {
        round_trip(
            content_type,
            content_type,
            |e| e.write_expanded_node_id(Some("Id"), value),
            |d| d.read_expanded_node_id(Some("Id")),
        )
    };

    // Binary carries the index and the uri
    assert_eq!(read_back(ContentType::Binary, &with_both), with_both);
    assert_eq!(read_back(ContentType::Binary, &empty_uri), empty_uri);

    // The text forms keep the uri in place of the index
    for content_type in [ContentType::Json, ContentType::Xml].iter() {
        let decoded = read_back(*content_type, &with_both);
        assert_eq!(decoded.node_id, NodeId::new(0, "Pump"), "{}", content_type);
        assert_eq!(decoded.namespace_uri, with_both.namespace_uri);
        assert_eq!(decoded.server_index, 1);
    }

    // JSON keeps an empty uri, XML reads it back as null with the index
    let decoded = read_back(ContentType::Json, &empty_uri);
    assert_eq!(decoded.namespace_uri, UAString::from(""));
    assert_eq!(decoded.node_id, NodeId::new(0, "Pump"));
    let decoded = read_back(ContentType::Xml, &empty_uri);
    assert!(decoded.namespace_uri.is_null());
    assert_eq!(decoded.node_id, NodeId::new(2, "Pump"));
}

#[test]
fn localized_text_locale() {
    let value = LocalizedText::new("en-US", "Pump running");
    for (from, to) in REVERSIBLE_PAIRS.iter() {
        let data = encode(*from, |e| e.write_localized_text(Some("Text"), &value)).unwrap();
        let decoded = decode(*to, &data, |d| d.read_localized_text(Some("Text"))).unwrap();
        assert_eq!(decoded, value, "{} to {}", from, to);
    }
    for content_type in [
        ContentType::NonReversibleJson,
        ContentType::NonReversibleJsonReference,
    ]
    .iter()
    {
        let data = encode(*content_type, |e| e.write_localized_text(Some("Text"), &value)).unwrap();
        let decoded = decode(*content_type, &data, |d| d.read_localized_text(Some("Text"))).unwrap();
        assert!(decoded.locale.is_null());
        assert_eq!(decoded.text, value.text);
    }
}

#[test]
fn structure_round_trip() {
    let value = diagnostic();
    for content_type in REVERSIBLE.iter() {
        let (decoded, ranges) = round_trip(
            *content_type,
            *content_type,
            |e| {
                e.write_encodeable(Some("Diagnostic"), &value)?;
                e.write_encodeable_array(Some("Ranges"), Some(&[range(), Range::default()][..]))
            },
            |d| {
                Ok((
                    d.read_encodeable::<ProgramDiagnostic2DataType>(Some("Diagnostic"))?,
                    d.read_encodeable_array::<Range>(Some("Ranges"))?,
                ))
            },
        );
        assert_eq!(decoded, Some(value.clone()), "{}", content_type);
        assert_eq!(ranges, Some(vec![range(), Range::default()]), "{}", content_type);
    }
}

#[test]
fn structure_json_shape() {
    let data = encode(ContentType::JsonReference, |e| e.write_encodeable(None, &diagnostic())).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
    assert_eq!(value["CreateClientName"], json!("Operator console"));
    assert_eq!(value["LastMethodSessionId"], json!({"Id": 42, "Namespace": 1}));
    assert_eq!(value["LastTransitionTime"], json!("2024-03-01T09:30:00.5Z"));
    assert_eq!(
        value["LastMethodInputValues"],
        json!([{"Type": 6, "Body": 1500}, {"Type": 12, "Body": "auto"}])
    );
    assert_eq!(
        value["LastMethodReturnStatus"],
        json!({"StatusCode": 2147942400u32, "DiagnosticInfo": {"AdditionalInfo": "speed out of range"}})
    );
    assert_eq!(value["LastMethodInputArguments"][0]["ValueRank"], json!(-1));
}

#[test]
fn extension_object_of_known_type() {
    let value = diagnostic();
    let extension_object = ExtensionObject::from_encodeable(&value).unwrap();
    for content_type in REVERSIBLE.iter() {
        let data = encode(*content_type, |e| {
            e.write_extension_object(Some("Body"), &extension_object)
        })
        .unwrap();
        let decoded = decode(*content_type, &data, |d| d.read_extension_object(Some("Body"))).unwrap();
        assert_eq!(decoded, extension_object, "{}", content_type);
        let inner: ProgramDiagnostic2DataType =
            decoded.decode_inner(&DecodingOptions::default()).unwrap();
        assert_eq!(inner, value);
    }
}

#[test]
fn extension_object_of_unknown_type_is_forwarded() {
    let type_id = NodeId::new(3, 9999u32);
    let bodies = vec![
        ExtensionObjectBody::Binary(ByteString::from(vec![1u8, 2, 3])),
        ExtensionObjectBody::Xml(XmlElement::from(UAString::from("<Setpoint>4</Setpoint>"))),
        ExtensionObjectBody::Json("{\"Setpoint\":4}".to_string()),
    ];
    for body in bodies {
        let value = ExtensionObject {
            node_id: type_id.clone(),
            body,
        };
        for (from, to) in REVERSIBLE_PAIRS.iter() {
            let data = encode(*from, |e| e.write_extension_object(None, &value)).unwrap();
            let decoded = decode(*to, &data, |d| d.read_extension_object(None)).unwrap();
            assert_eq!(decoded, value, "{} to {}", from, to);
        }
    }
}

#[test]
fn non_reversible_json_is_lossy() {
    let data_value = DataValue {
        value: Some(Variant::Int32(5)),
        status: Some(StatusCode::BadDecodingError),
        ..DataValue::null()
    };
    let extension_object = ExtensionObject::from_encodeable(&range()).unwrap();
    let data = encode(ContentType::NonReversibleJsonReference, |e| {
        e.write_data_value(None, &data_value)?;
        e.write_extension_object(None, &extension_object)?;
        e.write_variant(None, &Variant::from(vec![1i32, 2, 3]))
    })
    .unwrap();

    let documents: Vec<serde_json::Value> = serde_json::Deserializer::from_slice(&data)
        .into_iter::<serde_json::Value>()
        .map(Result::unwrap)
        .collect();
    assert_eq!(
        documents,
        vec![
            json!({"Value": 5, "StatusCode": {"Code": 2147942400u32, "Symbol": "BadDecodingError"}}),
            json!({"Low": 0.5, "High": 100.25}),
            json!([1, 2, 3]),
        ]
    );

    let (decoded_value, decoded_object, decoded_array) =
        decode(ContentType::NonReversibleJsonReference, &data, |d| {
            Ok((
                d.read_data_value(None)?,
                d.read_extension_object(None)?,
                d.read_variant(None)?,
            ))
        })
        .unwrap();
    // The kind of a variant is not written, so numbers come back as Int64
    assert_eq!(decoded_value.value, Some(Variant::Int64(5)));
    assert_eq!(decoded_value.status, Some(StatusCode::BadDecodingError));
    assert!(decoded_object.node_id.is_null());
    assert!(matches!(decoded_object.body, ExtensionObjectBody::Json(_)));
    assert_eq!(decoded_array, Variant::from(vec![1i64, 2, 3]));
}

#[test]
fn invalid_shape() {
    assert!(matches!(
        Matrix::new(vec![1i32, 2, 3], vec![2u32, 2]),
        Err(EncodingError::InvalidShape { .. })
    ));
    assert!(matches!(
        Matrix::new(vec![1i32, 2], vec![2u32, 0]),
        Err(EncodingError::InvalidShape { .. })
    ));

    let json = b"{\"Type\":6,\"Body\":[1,2,3],\"Dimensions\":[2,2]}";
    assert!(matches!(
        decode(ContentType::JsonReference, json, |d| d.read_variant(None)),
        Err(EncodingError::InvalidShape { .. })
    ));
    let json = b"[[1,2],[3]]";
    assert!(matches!(
        decode(ContentType::NonReversibleJsonReference, json, |d| d.read_variant(None)),
        Err(EncodingError::InvalidShape { .. })
    ));

    // Int32 matrix of 3 elements claiming 2 x 2 dimensions
    let binary = [
        0xC6u8, 3, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0,
        0,
    ];
    assert!(matches!(
        decode(ContentType::Binary, &binary, |d| d.read_variant(None)),
        Err(EncodingError::InvalidShape { .. })
    ));
}

#[test]
fn invalid_identifier() {
    assert!(matches!(
        NodeId::try_new(0, IdType::Numeric, "pump"),
        Err(EncodingError::InvalidIdentifier(_))
    ));
    let json = b"{\"IdType\":2,\"Id\":\"not-a-guid\"}";
    assert!(matches!(
        decode(ContentType::JsonReference, json, |d| d.read_node_id(None)),
        Err(EncodingError::InvalidIdentifier(_))
    ));
    let json = b"{\"IdType\":1}";
    assert!(matches!(
        decode(ContentType::JsonReference, json, |d| d.read_node_id(None)),
        Err(EncodingError::InvalidIdentifier(_))
    ));
}

#[test]
fn type_mismatch() {
    assert!(matches!(
        decode(ContentType::JsonReference, b"\"abc\"", |d| d.read_int32(None)),
        Err(EncodingError::TypeMismatch { .. })
    ));
    assert!(matches!(
        decode(ContentType::JsonReference, b"70000", |d| d.read_uint16(None)),
        Err(EncodingError::TypeMismatch { .. })
    ));
    assert!(matches!(
        decode(ContentType::Json, b"{\"Flag\":1}", |d| d.read_boolean(Some("Flag"))),
        Err(EncodingError::TypeMismatch { .. })
    ));
    assert!(matches!(
        decode(
            ContentType::Xml,
            b"<UaDocument><Boolean>maybe</Boolean></UaDocument>",
            |d| d.read_boolean(None)
        ),
        Err(EncodingError::TypeMismatch { .. })
    ));
}

#[test]
fn unexpected_eof() {
    let data = encode(ContentType::Binary, |e| e.write_string(None, &UAString::from("pump"))).unwrap();
    for len in 0..data.len() {
        assert!(matches!(
            decode(ContentType::Binary, &data[..len], |d| d.read_string(None)),
            Err(EncodingError::UnexpectedEof)
        ));
    }
    assert!(matches!(
        decode(ContentType::JsonReference, b"{\"Low\":0.5,", |d| d
            .read_encodeable::<Range>(None)),
        Err(EncodingError::UnexpectedEof)
    ));
}
