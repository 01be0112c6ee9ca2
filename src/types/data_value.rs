// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `DataValue`.

use std::io::{Read, Write};

use crate::types::{
    byte_string::ByteString, date_time::*, encoding::*, guid::Guid, localized_text::LocalizedText,
    node_id::NodeId, qualified_name::QualifiedName, status_codes::StatusCode, string::UAString,
    variant::Variant,
};

bitflags! {
    pub(crate) struct DataValueFlags: u8 {
        /// False if the Value is Null.
        const HAS_VALUE = 0x1;
        /// False if the StatusCode is Good.
        const HAS_STATUS = 0x2;
        /// False if the Source Timestamp is DateTime.MinValue.
        const HAS_SOURCE_TIMESTAMP = 0x4;
        /// False if the Server Timestamp is DateTime.MinValue.
        const HAS_SERVER_TIMESTAMP = 0x8;
        /// False if the Source Picoseconds is 0.
        const HAS_SOURCE_PICOSECONDS = 0x10;
        /// False if the Server Picoseconds is 0.
        const HAS_SERVER_PICOSECONDS = 0x20;
    }
}

/// A data value is a value of a variable in the OPC UA server and contains information about its
/// value, status and change timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValue {
    /// The value. BaseDataType
    /// Not present if the Value bit in the EncodingMask is False.
    pub value: Option<Variant>,
    /// The status associated with the value.
    /// Not present if the StatusCode bit in the EncodingMask is False
    pub status: Option<StatusCode>,
    /// The source timestamp associated with the value.
    /// Not present if the SourceTimestamp bit in the EncodingMask is False.
    pub source_timestamp: Option<DateTime>,
    /// The number of 10 picosecond intervals for the SourceTimestamp.
    /// Not present if the SourcePicoSeconds bit in the EncodingMask is False.
    /// If the source timestamp is missing the picoseconds are ignored.
    pub source_picoseconds: Option<u16>,
    /// The Server timestamp associated with the value.
    /// Not present if the ServerTimestamp bit in the EncodingMask is False.
    pub server_timestamp: Option<DateTime>,
    /// The number of 10 picosecond intervals for the ServerTimestamp.
    /// Not present if the ServerPicoSeconds bit in the EncodingMask is False.
    /// If the Server timestamp is missing the picoseconds are ignored.
    pub server_picoseconds: Option<u16>,
}

impl BinaryEncoder<DataValue> for DataValue {
    fn byte_len(&self) -> usize {
        let mut size = 1;
        if let Some(ref value) = self.value {
            size += value.byte_len();
        }
        if let Some(ref status) = self.status {
            size += status.byte_len();
        }
        if let Some(ref source_timestamp) = self.source_timestamp {
            size += source_timestamp.byte_len();
            if let Some(ref source_picoseconds) = self.source_picoseconds {
                size += source_picoseconds.byte_len();
            }
        }
        if let Some(ref server_timestamp) = self.server_timestamp {
            size += server_timestamp.byte_len();
            if let Some(ref server_picoseconds) = self.server_picoseconds {
                size += server_picoseconds.byte_len();
            }
        }
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size = 0;
        size += self.encoding_mask().bits.encode(stream)?;

        if let Some(ref value) = self.value {
            size += value.encode(stream)?;
        }
        if let Some(ref status) = self.status {
            size += status.encode(stream)?;
        }
        if let Some(ref source_timestamp) = self.source_timestamp {
            size += source_timestamp.encode(stream)?;
            if let Some(ref source_picoseconds) = self.source_picoseconds {
                size += source_picoseconds.encode(stream)?;
            }
        }
        if let Some(ref server_timestamp) = self.server_timestamp {
            size += server_timestamp.encode(stream)?;
            if let Some(ref server_picoseconds) = self.server_picoseconds {
                size += server_picoseconds.encode(stream)?;
            }
        }
        debug_assert_eq!(size, self.byte_len());
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let encoding_mask =
            DataValueFlags::from_bits_truncate(u8::decode(stream, decoding_options)?);

        // Value
        let value = if encoding_mask.contains(DataValueFlags::HAS_VALUE) {
            let _depth_lock = decoding_options.depth_lock()?;
            Some(Variant::decode(stream, decoding_options)?)
        } else {
            None
        };
        // Status
        let status = if encoding_mask.contains(DataValueFlags::HAS_STATUS) {
            Some(StatusCode::decode(stream, decoding_options)?)
        } else {
            None
        };
        // Source timestamp
        let source_timestamp = if encoding_mask.contains(DataValueFlags::HAS_SOURCE_TIMESTAMP) {
            Some(DateTime::decode(stream, decoding_options)?)
        } else {
            None
        };
        let source_picoseconds = if encoding_mask.contains(DataValueFlags::HAS_SOURCE_PICOSECONDS) {
            Some(u16::decode(stream, decoding_options)?)
        } else {
            None
        };
        // Server timestamp
        let server_timestamp = if encoding_mask.contains(DataValueFlags::HAS_SERVER_TIMESTAMP) {
            Some(DateTime::decode(stream, decoding_options)?)
        } else {
            None
        };
        let server_picoseconds = if encoding_mask.contains(DataValueFlags::HAS_SERVER_PICOSECONDS) {
            Some(u16::decode(stream, decoding_options)?)
        } else {
            None
        };
        // Pico second values are discarded if associated timestamp is not supplied
        Ok(DataValue {
            value,
            status,
            source_picoseconds: if source_timestamp.is_some() {
                source_picoseconds
            } else {
                None
            },
            source_timestamp,
            server_picoseconds: if server_timestamp.is_some() {
                server_picoseconds
            } else {
                None
            },
            server_timestamp,
        })
    }
}

macro_rules! data_value_from {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for DataValue {
                fn from(v: $ty) -> Self {
                    Self::from(Variant::from(v))
                }
            }
        )*
    };
}

data_value_from!(
    bool, u8, i8, i16, u16, i32, u32, i64, u64, f32, f64, &str, String, UAString, DateTime,
    Guid, StatusCode, ByteString, QualifiedName, LocalizedText, NodeId
);

impl From<Variant> for DataValue {
    fn from(v: Variant) -> Self {
        DataValue::value_only(v)
    }
}

impl From<(Variant, StatusCode)> for DataValue {
    fn from(v: (Variant, StatusCode)) -> Self {
        DataValue {
            value: Some(v.0),
            status: Some(v.1),
            source_timestamp: None,
            source_picoseconds: None,
            server_timestamp: None,
            server_picoseconds: None,
        }
    }
}

impl Default for DataValue {
    fn default() -> Self {
        Self::null()
    }
}

impl DataValue {
    /// Creates a `DataValue` from the supplied value with nothing else.
    pub fn value_only<V>(value: V) -> DataValue
    where
        V: Into<Variant>,
    {
        DataValue {
            value: Some(value.into()),
            status: None,
            source_timestamp: None,
            source_picoseconds: None,
            server_timestamp: None,
            server_picoseconds: None,
        }
    }

    /// Creates a `DataValue` from the supplied value AND a timestamp for now. If you are passing a value to the Attribute::Write service
    /// on a server from a server, you may consider this from the specification:
    ///
    /// _If the SourceTimestamp or the ServerTimestamp is specified, the Server shall use these values.
    /// The Server returns a Bad_WriteNotSupported error if it does not support writing of timestamps_
    ///
    /// In which case, use the `value_only()` constructor, or make explicit which fields you pass.
    pub fn new_now<V>(value: V) -> DataValue
    where
        V: Into<Variant>,
    {
        let now = DateTime::now();
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            source_picoseconds: None,
            server_timestamp: Some(now),
            server_picoseconds: None,
        }
    }

    /// Creates an empty DataValue
    pub fn null() -> DataValue {
        DataValue {
            value: None,
            status: None,
            source_timestamp: None,
            source_picoseconds: None,
            server_timestamp: None,
            server_picoseconds: None,
        }
    }

    /// Returns a copy of the data value with its status replaced
    pub fn with_status(&self, status: StatusCode) -> DataValue {
        DataValue {
            status: Some(status),
            ..self.clone()
        }
    }

    /// Returns a copy of the data value with its source timestamp replaced
    pub fn with_source_timestamp(&self, timestamp: DateTime, picoseconds: u16) -> DataValue {
        DataValue {
            source_timestamp: Some(timestamp),
            source_picoseconds: if picoseconds > 0 { Some(picoseconds) } else { None },
            ..self.clone()
        }
    }

    /// Returns a copy of the data value with its server timestamp replaced
    pub fn with_server_timestamp(&self, timestamp: DateTime, picoseconds: u16) -> DataValue {
        DataValue {
            server_timestamp: Some(timestamp),
            server_picoseconds: if picoseconds > 0 { Some(picoseconds) } else { None },
            ..self.clone()
        }
    }

    /// True if no field is set. A null data value is written as `null` in JSON.
    pub fn is_null(&self) -> bool {
        self.encoding_mask().is_empty()
    }

    /// Returns the status code or Good if there is no code on the value
    pub fn status(&self) -> StatusCode {
        self.status.map_or(StatusCode::Good, |s| s)
    }

    /// Test if the value held by this data value is known to be good
    /// Anything other than Good is assumed to be invalid.
    pub fn is_valid(&self) -> bool {
        self.status().status().is_good()
    }

    pub(crate) fn encoding_mask(&self) -> DataValueFlags {
        let mut encoding_mask = DataValueFlags::empty();
        if self.value.is_some() {
            encoding_mask |= DataValueFlags::HAS_VALUE;
        }
        if self.status.is_some() {
            encoding_mask |= DataValueFlags::HAS_STATUS;
        }
        if self.source_timestamp.is_some() {
            encoding_mask |= DataValueFlags::HAS_SOURCE_TIMESTAMP;
            if self.source_picoseconds.is_some() {
                encoding_mask |= DataValueFlags::HAS_SOURCE_PICOSECONDS;
            }
        }
        if self.server_timestamp.is_some() {
            encoding_mask |= DataValueFlags::HAS_SERVER_TIMESTAMP;
            if self.server_picoseconds.is_some() {
                encoding_mask |= DataValueFlags::HAS_SERVER_PICOSECONDS;
            }
        }
        encoding_mask
    }
}

#[test]
fn data_value_patch() {
    let dv = DataValue::from(5i32);
    let bad = dv.with_status(StatusCode::BadSensorFailure);
    assert_eq!(dv.status(), StatusCode::Good);
    assert_eq!(bad.status(), StatusCode::BadSensorFailure);
    assert_eq!(bad.value, dv.value);
    assert!(!bad.is_valid());

    let stamped = dv.with_source_timestamp(DateTime::ymd_hms(2020, 1, 2, 3, 4, 5), 12);
    assert_eq!(stamped.source_picoseconds, Some(12));
    assert!(stamped.server_timestamp.is_none());
    assert!(DataValue::null().is_null());
}

#[test]
fn data_value_picoseconds_need_timestamp() {
    // mask says picoseconds present but there is no timestamp
    let buf = vec![DataValueFlags::HAS_SOURCE_PICOSECONDS.bits, 10, 0];
    let dv = DataValue::decode(&mut std::io::Cursor::new(buf), &DecodingOptions::test()).unwrap();
    assert!(dv.source_picoseconds.is_none());
    assert!(dv.is_null());
}
