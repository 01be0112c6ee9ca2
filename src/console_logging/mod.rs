// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Console logging for programs that embed the codec. The filter is read from the
//! `OPCUA_CODEC_LOG` environment variable, in the same syntax as `RUST_LOG`, so codec tracing
//! can be turned on without the noise of every other crate.

use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use env_logger::{fmt::Color, Builder, Env};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "OPCUA_CODEC_LOG";

lazy_static! {
    static ref INITIALISED: AtomicBool = AtomicBool::new(false);
}

/// Installs the console logger, filtering by `OPCUA_CODEC_LOG` and showing warnings and errors
/// when it is not set. Only the first call has any effect.
pub fn init() {
    init_with_default("warn");
}

/// Installs the console logger with the filter used when `OPCUA_CODEC_LOG` is not set,
/// e.g. `"opcua_codec::codec=trace"`.
pub fn init_with_default(default_filter: &str) {
    if INITIALISED.swap(true, Ordering::Relaxed) {
        return;
    }
    let mut builder = Builder::from_env(Env::new().filter_or(LOG_ENV, default_filter));
    builder.format(|f, record| {
        let mut style = f.style();
        match record.level() {
            log::Level::Error => style.set_color(Color::Red).set_bold(true),
            log::Level::Warn => style.set_color(Color::Yellow),
            log::Level::Info => style.set_color(Color::Cyan),
            log::Level::Debug => style.set_color(Color::Green),
            log::Level::Trace => style.set_color(Color::Ansi256(8)),
        };
        // Module paths are shortened to what follows the crate name
        let target = record
            .target()
            .strip_prefix("opcua_codec::")
            .unwrap_or_else(|| record.target());
        writeln!(
            f,
            "{} {:<5} {:<24} {}",
            chrono::Utc::now().format("%H:%M:%S%.3f"),
            style.value(record.level()),
            target,
            record.args()
        )
    });
    if builder.try_init().is_ok() {
        info!(
            "Codec logging is enabled, set {} to change the filter",
            LOG_ENV
        );
    }
}
