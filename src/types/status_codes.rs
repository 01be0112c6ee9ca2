// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The status code values used by the codec and by the structured types it carries. The
//! symbolic names are kept alongside the values so that the non-reversible JSON form can write
//! and read `{ "Symbol", "Code" }`.

// The symbolic names keep the casing of the published status codes
#![allow(non_upper_case_globals)]

macro_rules! status_codes {
    ( $( $name:ident = $value:literal ),* $(,)? ) => {
        bitflags! {
            pub struct StatusCode: u32 {
                // Mask for the status code section
                const STATUS_MASK = 0xffff_0000;
                // Mask for the bits section
                const BIT_MASK = 0x0000_ffff;
                // Severity bits
                const IS_ERROR = 0x8000_0000;
                const IS_UNCERTAIN = 0x4000_0000;

                // Historian bits 0:4
                const HISTORICAL_RAW          = 0b0000_0000_0000_0000;
                const HISTORICAL_CALCULATED   = 0b0000_0000_0000_0001;
                const HISTORICAL_INTERPOLATED = 0b0000_0000_0000_0010;
                const HISTORICAL_RESERVED     = 0b0000_0000_0000_0011;
                const HISTORICAL_PARTIAL      = 0b0000_0000_0000_0100;
                const HISTORICAL_EXTRA_DATA   = 0b0000_0000_0000_1000;
                const HISTORICAL_MULTI_VALUE  = 0b0000_0000_0001_0000;
                // Overflow bit 7
                const OVERFLOW                = 0b0000_0000_1000_0000;
                // Limit bits 8:9
                const LIMIT_LOW               = 0b0000_0001_0000_0000;
                const LIMIT_HIGH              = 0b0000_0010_0000_0000;
                const LIMIT_CONSTANT          = 0b0000_0011_0000_0000;
                // Semantics changed bit 14
                const SEMANTICS_CHANGED       = 0b0100_0000_0000_0000;
                // Structure changed bit 15
                const STRUCTURE_CHANGED       = 0b1000_0000_0000_0000;

                $(
                    const $name = $value;
                )*
            }
        }

        impl StatusCode {
            /// Returns the symbolic name of the status part of the code.
            pub fn name(&self) -> &'static str {
                match self.status().bits() {
                    $( $value => stringify!($name), )*
                    _ => "Unrecognized",
                }
            }

            /// Looks up a status code from its symbolic name.
            pub fn from_name(name: &str) -> Option<StatusCode> {
                match name {
                    $( stringify!($name) => Some(StatusCode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

status_codes! {
    Good = 0x0000_0000,
    GoodOverload = 0x002F_0000,
    GoodClamped = 0x0030_0000,
    Uncertain = 0x4000_0000,
    UncertainLastUsableValue = 0x4090_0000,
    UncertainInitialValue = 0x4092_0000,
    UncertainSensorNotAccurate = 0x4093_0000,
    Bad = 0x8000_0000,
    BadUnexpectedError = 0x8001_0000,
    BadInternalError = 0x8002_0000,
    BadOutOfMemory = 0x8003_0000,
    BadCommunicationError = 0x8005_0000,
    BadEncodingError = 0x8006_0000,
    BadDecodingError = 0x8007_0000,
    BadEncodingLimitsExceeded = 0x8008_0000,
    BadUnknownResponse = 0x8009_0000,
    BadTimeout = 0x800A_0000,
    BadServiceUnsupported = 0x800B_0000,
    BadNothingToDo = 0x800F_0000,
    BadTooManyOperations = 0x8010_0000,
    BadDataTypeIdUnknown = 0x8011_0000,
    BadUserAccessDenied = 0x801F_0000,
    BadWaitingForInitialData = 0x8032_0000,
    BadNodeIdInvalid = 0x8033_0000,
    BadNodeIdUnknown = 0x8034_0000,
    BadAttributeIdInvalid = 0x8035_0000,
    BadIndexRangeInvalid = 0x8036_0000,
    BadDataEncodingInvalid = 0x8038_0000,
    BadDataEncodingUnsupported = 0x8039_0000,
    BadNotReadable = 0x803A_0000,
    BadNotWritable = 0x803B_0000,
    BadOutOfRange = 0x803C_0000,
    BadNotSupported = 0x803D_0000,
    BadNotFound = 0x803E_0000,
    BadTypeMismatch = 0x8074_0000,
    BadMethodInvalid = 0x8075_0000,
    BadArgumentsMissing = 0x8076_0000,
    BadConfigurationError = 0x8089_0000,
    BadNotConnected = 0x808A_0000,
    BadDeviceFailure = 0x808B_0000,
    BadSensorFailure = 0x808C_0000,
    BadNoData = 0x809B_0000,
    BadInvalidArgument = 0x80AB_0000,
    BadAggregateConfigurationRejected = 0x80DA_0000,
}
