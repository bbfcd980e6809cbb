/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::OsStringValueParser;
use clap::builder::TypedValueParser;
use tracing::metadata::LevelFilter;

use crate::runner::RunConfig;
use crate::target::DEFAULT_ATTR_VALUE_SIZE;

/// Creates files `<prefix>.1` .. `<prefix>.N`, optionally attaching extended
/// attributes, and unlinks each one right after creating it while keeping it
/// open. All descriptors stay open until the program exits after sleeping.
///
/// Useful for exercising filesystem handling of unlinked-but-open inodes,
/// their attribute storage, and sync behavior around them.
#[derive(Debug, Parser, Clone)]
#[clap(
    name = "multi-open-unlink",
    version,
    override_usage = "multi-open-unlink [-e num_eas] [-f path_prefix] [-F] [-n num_files] [-s sleep_time] [-S] [-v ea_valuesize]"
)]
pub struct Opts {
    /// Number of extended attributes to set on each file.
    #[clap(short = 'e', value_name = "num_eas", default_value_t = 0)]
    pub num_eas: u32,

    /// Path prefix of the files to create. May be empty, giving `.1`, `.2`, ...
    #[clap(
        short = 'f',
        value_name = "path_prefix",
        default_value = "file",
        value_parser = OsStringValueParser::new().map(PathBuf::from)
    )]
    pub path_prefix: PathBuf,

    /// Fsync each file after unlinking it.
    #[clap(short = 'F')]
    pub fsync: bool,

    /// Number of files to create and unlink.
    #[clap(short = 'n', value_name = "num_files", default_value_t = 100)]
    pub num_files: u32,

    /// Seconds to sleep, holding all files open, before exiting.
    #[clap(short = 's', value_name = "sleep_time", default_value_t = 60)]
    pub sleep_time: u64,

    /// Sync the filesystem after creating each file.
    #[clap(short = 'S')]
    pub sync_fs: bool,

    /// Size in bytes of each (zero-filled) attribute value.
    #[clap(short = 'v', value_name = "ea_valuesize", default_value_t = DEFAULT_ATTR_VALUE_SIZE)]
    pub ea_valuesize: usize,

    /// The verbosity level of log output.
    #[clap(short, long, value_name = "LEVEL", env = "MULTI_OPEN_UNLINK_LOG")]
    pub log: Option<LevelFilter>,

    /// Log to a file instead of the terminal.
    #[clap(long, value_name = "FILE", env = "MULTI_OPEN_UNLINK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Opts {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            prefix: self.path_prefix.clone(),
            count: self.num_files,
            num_attrs: self.num_eas,
            attr_value_size: self.ea_valuesize,
            sleep: Duration::from_secs(self.sleep_time),
            fsync_after_unlink: self.fsync,
            sync_fs_after_create: self.sync_fs,
        }
    }
}
