/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fs::File;
use std::io;
use std::io::IsTerminal;
use std::io::stderr;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_TRACE_LEVEL: LevelFilter = LevelFilter::WARN;

fn env_filter(level: Option<LevelFilter>) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(level.unwrap_or(DEFAULT_TRACE_LEVEL).into())
}

/// Returns a subscriber that logs to the file `f`.
///
/// NOTE: Writes to `f` are unbuffered and made on the calling thread.
fn file_subscriber(level: Option<LevelFilter>, f: File) -> impl Subscriber {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(Mutex::new(f))
        .with_ansi(false)
        .finish()
}

/// Returns a tracing subscriber that logs to `stderr`.
fn stderr_subscriber(level: Option<LevelFilter>) -> impl Subscriber {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(io::stderr)
        .with_ansi(stderr().is_terminal())
        .finish()
}

/// Initializes tracing to the given file `f`.
pub fn init_file_tracing(level: Option<LevelFilter>, f: File) -> Result<(), anyhow::Error> {
    file_subscriber(level, f).try_init()?;
    Ok(())
}

/// Initializes tracing to `stderr`.
pub fn init_stderr_tracing(level: Option<LevelFilter>) -> Result<(), anyhow::Error> {
    stderr_subscriber(level).try_init()?;
    Ok(())
}
