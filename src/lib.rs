// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Encoding and decoding of the OPC UA built-in type system.
//!
//! The [`types`] module holds the value model (`Variant`, `Matrix`, `ExtensionObject`,
//! `DataValue` and the scalar types) together with their binary layout. The [`codec`] module
//! holds the format agnostic `Encoder` / `Decoder` contracts and the binary, JSON and XML
//! implementations of them, selected through a [`codec::ContentType`]. Structured types are
//! described in the [`catalogue`] so that they can be forwarded through extension objects
//! without knowing their Rust type.

#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::float_cmp)]
#![allow(clippy::from_over_into)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate serde_derive;

/// Tracing macro for obtaining a lock on a `Mutex`. Sometimes deadlocks can happen in code,
/// and if they do, this macro is useful for finding out where they happened.
#[macro_export]
macro_rules! trace_lock {
    ( $x:expr ) => {{
        //            use std::thread;
        //            trace!("Thread {:?}, {} locking at {}, line {}", thread::current().id(), stringify!($x), file!(), line!());
        let v = $x.lock();
        //            trace!("Thread {:?}, {} lock completed", thread::current().id(), stringify!($x));
        v
    }};
}

/// Tracing macro for obtaining a read lock on a `RwLock`.
#[macro_export]
macro_rules! trace_read_lock {
    ( $x:expr ) => {{
        let v = $x.read();
        v
    }};
}

/// Tracing macro for obtaining a write lock on a `RwLock`.
#[macro_export]
macro_rules! trace_write_lock {
    ( $x:expr ) => {{
        let v = $x.write();
        v
    }};
}

pub mod catalogue;
pub mod codec;
pub mod config;
#[cfg(feature = "console-logging")]
pub mod console_logging;
pub mod sync;
pub mod types;

pub mod prelude {
    pub use crate::catalogue::*;
    pub use crate::codec::*;
    pub use crate::config::CodecLimits;
    pub use crate::types::*;
}
