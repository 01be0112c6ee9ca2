// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! The error type returned by all encoding and decoding operations.

use std::io;

use thiserror::Error;

use crate::types::{builtin_kind::BuiltInKind, status_codes::StatusCode};

/// Errors raised while constructing, encoding or decoding values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// A matrix whose dimensions do not describe its element buffer.
    #[error("matrix of {len} elements does not fit dimensions {dimensions:?}")]
    InvalidShape { len: usize, dimensions: Vec<u32> },
    /// A node id whose identifier is malformed or does not match its identifier type.
    #[error("invalid node identifier: {0}")]
    InvalidIdentifier(String),
    /// The data cannot be read as the requested kind.
    #[error("expected {expected:?} but found {found}")]
    TypeMismatch { expected: BuiltInKind, found: String },
    /// The input ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A type name or encoding id that is not in the type catalogue.
    #[error("type {0} is not registered in the type catalogue")]
    UnknownType(String),
    /// A limit or format violation with the OPC UA status code that describes it.
    #[error("{0}")]
    Status(StatusCode),
}

/// Result type used by every encoder and decoder.
pub type EncodingResult<T> = std::result::Result<T, EncodingError>;

impl EncodingError {
    pub fn type_mismatch<T: Into<String>>(expected: BuiltInKind, found: T) -> Self {
        EncodingError::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Returns the status code that best describes the error.
    pub fn status(&self) -> StatusCode {
        match self {
            EncodingError::InvalidShape { .. } => StatusCode::BadEncodingError,
            EncodingError::InvalidIdentifier(_) => StatusCode::BadNodeIdInvalid,
            EncodingError::TypeMismatch { .. } => StatusCode::BadTypeMismatch,
            EncodingError::UnexpectedEof => StatusCode::BadDecodingError,
            EncodingError::UnknownType(_) => StatusCode::BadDataTypeIdUnknown,
            EncodingError::Status(status_code) => *status_code,
        }
    }
}

impl From<StatusCode> for EncodingError {
    fn from(status_code: StatusCode) -> Self {
        EncodingError::Status(status_code)
    }
}

impl From<EncodingError> for io::Error {
    fn from(e: EncodingError) -> io::Error {
        io::Error::new(io::ErrorKind::Other, e.to_string())
    }
}

#[test]
fn error_status() {
    assert_eq!(
        EncodingError::UnexpectedEof.status(),
        StatusCode::BadDecodingError
    );
    assert_eq!(
        EncodingError::type_mismatch(BuiltInKind::UInt64, "String").status(),
        StatusCode::BadTypeMismatch
    );
    assert_eq!(
        EncodingError::from(StatusCode::BadEncodingLimitsExceeded).status(),
        StatusCode::BadEncodingLimitsExceeded
    );
}
