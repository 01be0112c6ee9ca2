// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! `DiagnosticInfo`, the optional detail a server attaches to a status code.
//!
//! Every field is optional. The binary codec leads with a mask of the present fields, the JSON
//! codecs omit absent ones and the XML codec leaves out their elements.

use std::io::{Read, Write};

use crate::types::{encoding::*, status_codes::StatusCode, string::UAString};

bitflags! {
    /// One bit per present field of the binary form, in the order the fields are written
    pub struct DiagnosticInfoMask: u8 {
        const HAS_SYMBOLIC_ID = 0x01;
        const HAS_NAMESPACE = 0x02;
        const HAS_LOCALIZED_TEXT = 0x04;
        const HAS_LOCALE = 0x08;
        const HAS_ADDITIONAL_INFO = 0x10;
        const HAS_INNER_STATUS_CODE = 0x20;
        const HAS_INNER_DIAGNOSTIC_INFO = 0x40;
    }
}

/// The first four fields are indexes into a string table that travels with the enclosing
/// message, not strings themselves.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    pub symbolic_id: Option<i32>,
    pub namespace_uri: Option<i32>,
    pub locale: Option<i32>,
    pub localized_text: Option<i32>,
    /// Free text, e.g. a trace from the device that failed
    pub additional_info: Option<UAString>,
    pub inner_status_code: Option<StatusCode>,
    /// Explains `inner_status_code` and may nest to any depth the decoding limits allow
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl DiagnosticInfo {
    /// The table indexes in the order the binary form writes them. The locale precedes the
    /// localized text even though its mask bit is the higher one.
    fn indexes(&self) -> [Option<i32>; 4] {
        [
            self.symbolic_id,
            self.namespace_uri,
            self.locale,
            self.localized_text,
        ]
    }
}

impl BinaryEncoder<DiagnosticInfo> for DiagnosticInfo {
    fn byte_len(&self) -> usize {
        let indexes = self.indexes().iter().flatten().count() * 4;
        1 + indexes
            + self.additional_info.as_ref().map_or(0, |v| v.byte_len())
            + self.inner_status_code.as_ref().map_or(0, |v| v.byte_len())
            + self.inner_diagnostic_info.as_ref().map_or(0, |v| v.byte_len())
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size = write_u8(stream, self.encoding_mask().bits())?;
        for index in self.indexes().iter().flatten() {
            size += write_i32(stream, *index)?;
        }
        if let Some(ref v) = self.additional_info {
            size += v.encode(stream)?;
        }
        if let Some(ref v) = self.inner_status_code {
            size += v.encode(stream)?;
        }
        if let Some(ref v) = self.inner_diagnostic_info {
            size += v.encode(stream)?;
        }
        debug_assert_eq!(size, self.byte_len());
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let mask = DiagnosticInfoMask::from_bits_truncate(read_u8(stream)?);
        let mut index = |bit: DiagnosticInfoMask| -> EncodingResult<Option<i32>> {
            if mask.contains(bit) {
                Ok(Some(read_i32(stream)?))
            } else {
                Ok(None)
            }
        };
        let symbolic_id = index(DiagnosticInfoMask::HAS_SYMBOLIC_ID)?;
        let namespace_uri = index(DiagnosticInfoMask::HAS_NAMESPACE)?;
        let locale = index(DiagnosticInfoMask::HAS_LOCALE)?;
        let localized_text = index(DiagnosticInfoMask::HAS_LOCALIZED_TEXT)?;

        let additional_info = if mask.contains(DiagnosticInfoMask::HAS_ADDITIONAL_INFO) {
            Some(UAString::decode(stream, decoding_options)?)
        } else {
            None
        };
        let inner_status_code = if mask.contains(DiagnosticInfoMask::HAS_INNER_STATUS_CODE) {
            Some(StatusCode::decode(stream, decoding_options)?)
        } else {
            None
        };
        let inner_diagnostic_info = if mask.contains(DiagnosticInfoMask::HAS_INNER_DIAGNOSTIC_INFO) {
            let _depth_lock = decoding_options.depth_lock()?;
            Some(Box::new(DiagnosticInfo::decode(stream, decoding_options)?))
        } else {
            None
        };
        Ok(DiagnosticInfo {
            symbolic_id,
            namespace_uri,
            locale,
            localized_text,
            additional_info,
            inner_status_code,
            inner_diagnostic_info,
        })
    }
}

impl Default for DiagnosticInfo {
    fn default() -> Self {
        DiagnosticInfo::null()
    }
}

impl DiagnosticInfo {
    pub fn null() -> DiagnosticInfo {
        DiagnosticInfo {
            symbolic_id: None,
            namespace_uri: None,
            locale: None,
            localized_text: None,
            additional_info: None,
            inner_status_code: None,
            inner_diagnostic_info: None,
        }
    }

    /// True when no field is present, which the codecs write as null
    pub fn is_null(&self) -> bool {
        self.encoding_mask().is_empty()
    }

    pub fn encoding_mask(&self) -> DiagnosticInfoMask {
        [
            (self.symbolic_id.is_some(), DiagnosticInfoMask::HAS_SYMBOLIC_ID),
            (self.namespace_uri.is_some(), DiagnosticInfoMask::HAS_NAMESPACE),
            (self.locale.is_some(), DiagnosticInfoMask::HAS_LOCALE),
            (self.localized_text.is_some(), DiagnosticInfoMask::HAS_LOCALIZED_TEXT),
            (self.additional_info.is_some(), DiagnosticInfoMask::HAS_ADDITIONAL_INFO),
            (self.inner_status_code.is_some(), DiagnosticInfoMask::HAS_INNER_STATUS_CODE),
            (self.inner_diagnostic_info.is_some(), DiagnosticInfoMask::HAS_INNER_DIAGNOSTIC_INFO),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .fold(DiagnosticInfoMask::empty(), |mask, (_, bit)| mask | *bit)
    }
}

#[test]
fn diagnostic_info_nesting() {
    let mut info = DiagnosticInfo {
        symbolic_id: Some(3),
        additional_info: Some(UAString::from("pump offline")),
        inner_status_code: Some(StatusCode::BadDeviceFailure),
        ..DiagnosticInfo::null()
    };
    for _ in 0..3 {
        info = DiagnosticInfo {
            locale: Some(1),
            inner_diagnostic_info: Some(Box::new(info)),
            ..DiagnosticInfo::null()
        };
    }
    let buf = info.encode_to_vec();
    assert_eq!(buf.len(), info.byte_len());
    let decoded =
        DiagnosticInfo::decode(&mut std::io::Cursor::new(buf.clone()), &DecodingOptions::test())
            .unwrap();
    assert_eq!(decoded, info);

    // nesting deeper than the gauge allows is refused
    let shallow = DecodingOptions::with_limits(100, 100, 100, 2);
    assert!(DiagnosticInfo::decode(&mut std::io::Cursor::new(buf), &shallow).is_err());
    assert!(DiagnosticInfo::null().is_null());
}
