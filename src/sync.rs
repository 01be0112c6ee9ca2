// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Lock types used by the crate. The catalogue and the decoding depth gauge are the only shared
//! state, both are guarded by `parking_lot` primitives.

pub type Mutex<T> = parking_lot::Mutex<T>;
pub type RwLock<T> = parking_lot::RwLock<T>;
