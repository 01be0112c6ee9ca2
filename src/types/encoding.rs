// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the `BinaryEncoder` trait and helpers for reading and writing of scalar values and
//! other primitives.

use std::{
    fmt::Debug,
    io::{self, Cursor, Read, Write},
    sync::Arc,
};

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    sync::Mutex,
    types::{constants, status_codes::StatusCode},
};

pub use crate::types::error::{EncodingError, EncodingResult};

/// Depth lock holds a reference on the depth gauge. The drop ensures impl that the reference is
/// decremented even if there is a panic unwind.
#[derive(Debug)]
pub struct DepthLock {
    depth_gauge: Arc<Mutex<DepthGauge>>,
}

impl Drop for DepthLock {
    fn drop(&mut self) {
        let mut dg = trace_lock!(self.depth_gauge);
        if dg.current_depth > 0 {
            dg.current_depth -= 1;
        }
    }
}

impl DepthLock {
    /// The depth lock tests if the depth can increment and then obtains a lock on it.
    /// The lock will decrement the depth when it drops to ensure proper behaviour during unwinding.
    pub fn obtain(depth_gauge: Arc<Mutex<DepthGauge>>) -> EncodingResult<DepthLock> {
        let mut dg = trace_lock!(depth_gauge);
        if dg.current_depth >= dg.max_depth {
            warn!("Decoding in stream aborted due maximum recursion depth being reached");
            Err(StatusCode::BadDecodingError.into())
        } else {
            dg.current_depth += 1;
            drop(dg);
            Ok(Self { depth_gauge })
        }
    }
}

/// Depth gauge is used on potentially recursive structures like Variant & ExtensionObject during
/// decoding to limit the depth the decoder will go before giving up.
#[derive(Debug)]
pub struct DepthGauge {
    /// Maximum decoding depth for recursive elements. Triggers when current depth equals max depth.
    pub(crate) max_depth: usize,
    /// Current decoding depth for recursive elements.
    pub(crate) current_depth: usize,
}

impl Default for DepthGauge {
    fn default() -> Self {
        Self::with_max_depth(constants::MAX_DECODING_DEPTH)
    }
}

impl DepthGauge {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            current_depth: 0,
        }
    }
    pub fn minimal() -> Self {
        Self::with_max_depth(1)
    }
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
    pub fn current_depth(&self) -> usize {
        self.current_depth
    }
}

/// Limits checked by every decoder.
#[derive(Clone, Debug)]
pub struct DecodingOptions {
    /// Maximum length in bytes (not chars!) of a string. 0 actually means 0, i.e. no string permitted
    pub max_string_length: usize,
    /// Maximum length in bytes of a byte string. 0 actually means 0, i.e. no byte string permitted
    pub max_byte_string_length: usize,
    /// Maximum number of array elements. 0 actually means 0, i.e. no array permitted
    pub max_array_length: usize,
    /// Decoding depth gauge is used to check for recursion
    pub decoding_depth_gauge: Arc<Mutex<DepthGauge>>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self::with_limits(
            constants::MAX_STRING_LENGTH,
            constants::MAX_BYTE_STRING_LENGTH,
            constants::MAX_ARRAY_LENGTH,
            constants::MAX_DECODING_DEPTH,
        )
    }
}

impl DecodingOptions {
    pub fn with_limits(
        max_string_length: usize,
        max_byte_string_length: usize,
        max_array_length: usize,
        max_depth: usize,
    ) -> Self {
        DecodingOptions {
            max_string_length,
            max_byte_string_length,
            max_array_length,
            decoding_depth_gauge: Arc::new(Mutex::new(DepthGauge::with_max_depth(max_depth))),
        }
    }

    /// This can be useful for decoding extension objects where the payload is not expected to contain
    /// a large value.
    pub fn minimal() -> Self {
        DecodingOptions {
            max_string_length: 8192,
            max_byte_string_length: 8192,
            max_array_length: 8192,
            decoding_depth_gauge: Arc::new(Mutex::new(DepthGauge::minimal())),
        }
    }

    /// For test only. Having a separate function makes it easier to control calls to DecodingOptions::default().
    #[cfg(test)]
    pub fn test() -> Self {
        Self::default()
    }

    pub fn max_depth(&self) -> usize {
        trace_lock!(self.decoding_depth_gauge).max_depth()
    }

    pub fn depth_lock(&self) -> EncodingResult<DepthLock> {
        DepthLock::obtain(self.decoding_depth_gauge.clone())
    }

    /// Checks an array length read from the wire against the limit. A -1 length means a null
    /// array and yields `None`.
    pub fn check_array_length(&self, len: i32) -> EncodingResult<Option<usize>> {
        if len == -1 {
            Ok(None)
        } else if len < -1 {
            error!("Array length is negative value and invalid");
            Err(StatusCode::BadDecodingError.into())
        } else if len as usize > self.max_array_length {
            error!(
                "Array length {} exceeds decoding limit {}",
                len, self.max_array_length
            );
            Err(StatusCode::BadEncodingLimitsExceeded.into())
        } else {
            Ok(Some(len as usize))
        }
    }
}

/// Limits checked by every encoder.
#[derive(Clone, Debug)]
pub struct EncodingOptions {
    /// Maximum nesting of structures, arrays and variants
    pub max_depth: usize,
    /// Maximum number of array elements
    pub max_array_length: usize,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        EncodingOptions {
            max_depth: constants::MAX_DECODING_DEPTH,
            max_array_length: constants::MAX_ARRAY_LENGTH,
        }
    }
}

impl EncodingOptions {
    pub fn check_depth(&self, depth: usize) -> EncodingResult<()> {
        if depth > self.max_depth {
            warn!("Encoding aborted due to maximum nesting depth {} being reached", self.max_depth);
            Err(StatusCode::BadEncodingLimitsExceeded.into())
        } else {
            Ok(())
        }
    }

    pub fn check_array_length(&self, len: usize) -> EncodingResult<()> {
        if len > self.max_array_length {
            error!(
                "Array length {} exceeds encoding limit {}",
                len, self.max_array_length
            );
            Err(StatusCode::BadEncodingLimitsExceeded.into())
        } else {
            Ok(())
        }
    }
}

/// OPC UA Binary Encoding interface. Anything that encodes to binary must implement this. It provides
/// functions to calculate the size in bytes of the struct (for allocating memory), encoding to a stream
/// and decoding from a stream.
pub trait BinaryEncoder<T> {
    /// Returns the exact byte length of the structure as it would be if `encode` were called.
    /// This may be called prior to writing to ensure the correct amount of space is available.
    fn byte_len(&self) -> usize;
    /// Encodes the instance to the write stream.
    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize>;
    /// Decodes an instance from the read stream. The decoding options contains restrictions set by
    /// the caller on the length of strings, arrays etc. If these limits are exceeded the
    /// implementation should return with an error as soon as possible.
    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<T>;

    // Convenience method for encoding a message straight into an array of bytes. It is preferable to reuse buffers than
    // to call this so it should be reserved for tests and trivial code.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::with_capacity(self.byte_len()));
        let _ = self.encode(&mut buffer);
        buffer.into_inner()
    }
}

/// Converts an IO encoding error (and logs when in error) into an EncodingResult
pub fn process_encode_io_result(result: io::Result<usize>) -> EncodingResult<usize> {
    result.map_err(|err| {
        trace!("Encoding error - {:?}", err);
        StatusCode::BadEncodingError.into()
    })
}

/// Converts an IO decoding error (and logs when in error) into an EncodingResult. Running out
/// of input is reported as `UnexpectedEof` so callers can tell it apart from malformed data.
pub fn process_decode_io_result<T>(result: io::Result<T>) -> EncodingResult<T>
where
    T: Debug,
{
    result.map_err(|err| {
        trace!("Decoding error - {:?}", err);
        if err.kind() == io::ErrorKind::UnexpectedEof {
            EncodingError::UnexpectedEof
        } else {
            StatusCode::BadDecodingError.into()
        }
    })
}

/// Calculates the length in bytes of an array of encoded type
pub fn byte_len_array<T: BinaryEncoder<T>>(values: &Option<Vec<T>>) -> usize {
    let mut size = 4;
    if let Some(ref values) = values {
        size += values.iter().map(|v| v.byte_len()).sum::<usize>();
    }
    size
}

/// Write an array of the encoded type to stream, preserving distinction between null array and empty array
pub fn write_array<S: Write, T: BinaryEncoder<T>>(
    stream: &mut S,
    values: &Option<Vec<T>>,
) -> EncodingResult<usize> {
    let mut size = 0;
    if let Some(ref values) = values {
        size += write_i32(stream, values.len() as i32)?;
        for value in values.iter() {
            size += value.encode(stream)?;
        }
    } else {
        size += write_i32(stream, -1)?;
    }
    Ok(size)
}

/// Reads an array of the encoded type from a stream, preserving distinction between null array and empty array
pub fn read_array<S: Read, T: BinaryEncoder<T>>(
    stream: &mut S,
    decoding_options: &DecodingOptions,
) -> EncodingResult<Option<Vec<T>>> {
    let len = read_i32(stream)?;
    match decoding_options.check_array_length(len)? {
        None => Ok(None),
        Some(len) => {
            let mut values: Vec<T> = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(T::decode(stream, decoding_options)?);
            }
            Ok(Some(values))
        }
    }
}

/// Reads a length prefixed run of bytes, returning `None` for the -1 null marker.
pub(crate) fn read_length_prefixed<S: Read>(
    stream: &mut S,
    max_length: usize,
    what: &str,
) -> EncodingResult<Option<Vec<u8>>> {
    let len = read_i32(stream)?;
    if len == -1 {
        Ok(None)
    } else if len < -1 {
        error!("{} buf length is a negative number {}", what, len);
        Err(StatusCode::BadDecodingError.into())
    } else if len as usize > max_length {
        error!(
            "{} buf length {} exceeds decoding limit {}",
            what, len, max_length
        );
        Err(StatusCode::BadEncodingLimitsExceeded.into())
    } else {
        // Create a buffer filled with zeroes and read the value over the top
        let mut buf = vec![0u8; len as usize];
        process_decode_io_result(stream.read_exact(&mut buf))?;
        Ok(Some(buf))
    }
}

/// Writes a length prefixed run of bytes, or the -1 null marker.
pub(crate) fn write_length_prefixed<S: Write>(
    stream: &mut S,
    value: Option<&[u8]>,
) -> EncodingResult<usize> {
    match value {
        None => write_i32(stream, -1),
        Some(value) => {
            let size = write_i32(stream, value.len() as i32)?;
            Ok(size + process_encode_io_result(stream.write(value))?)
        }
    }
}

/// Writes an unsigned byte to the stream
pub fn write_u8<T>(stream: &mut dyn Write, value: T) -> EncodingResult<usize>
where
    T: Into<u8>,
{
    let buf: [u8; 1] = [value.into()];
    process_encode_io_result(stream.write(&buf))
}

/// Read an unsigned byte from the stream
pub fn read_u8(stream: &mut dyn Read) -> EncodingResult<u8> {
    let mut buf = [0u8];
    process_decode_io_result(stream.read_exact(&mut buf))?;
    Ok(buf[0])
}

/// Reads an array of bytes from the stream
pub fn read_bytes(stream: &mut dyn Read, buf: &mut [u8]) -> EncodingResult<usize> {
    process_decode_io_result(stream.read_exact(buf))?;
    Ok(buf.len())
}

macro_rules! little_endian_io {
    ( $( $ty:ty, $size:expr, $write:ident, $read:ident, $le_write:ident, $le_read:ident );* $(;)? ) => {
        $(
            #[doc = concat!("Writes a little endian `", stringify!($ty), "` to the stream")]
            pub fn $write<T>(stream: &mut dyn Write, value: T) -> EncodingResult<usize>
            where
                T: Into<$ty>,
            {
                let mut buf = [0u8; $size];
                LittleEndian::$le_write(&mut buf, value.into());
                process_encode_io_result(stream.write(&buf))
            }

            #[doc = concat!("Reads a little endian `", stringify!($ty), "` from the stream")]
            pub fn $read(stream: &mut dyn Read) -> EncodingResult<$ty> {
                let mut buf = [0u8; $size];
                process_decode_io_result(stream.read_exact(&mut buf))?;
                Ok(LittleEndian::$le_read(&buf))
            }
        )*
    };
}

little_endian_io! {
    i16, 2, write_i16, read_i16, write_i16, read_i16;
    u16, 2, write_u16, read_u16, write_u16, read_u16;
    i32, 4, write_i32, read_i32, write_i32, read_i32;
    u32, 4, write_u32, read_u32, write_u32, read_u32;
    i64, 8, write_i64, read_i64, write_i64, read_i64;
    u64, 8, write_u64, read_u64, write_u64, read_u64;
    f32, 4, write_f32, read_f32, write_f32, read_f32;
    f64, 8, write_f64, read_f64, write_f64, read_f64;
}
