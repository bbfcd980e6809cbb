/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

// Treat all Clippy warnings as errors.
#![deny(clippy::all)]

mod tracing;

use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use colored::*;
use multi_open_unlink::Context;
use multi_open_unlink::Error;
use multi_open_unlink::Opts;

use self::tracing::init_file_tracing;
use self::tracing::init_stderr_tracing;

fn init_tracing(opts: &Opts) -> Result<(), Error> {
    if let Some(path) = &opts.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        init_file_tracing(opts.log, file)
    } else {
        init_stderr_tracing(opts.log)
    }
}

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            // Help and version go to stdout and are not failures.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = init_tracing(&opts).and_then(|()| multi_open_unlink::run(opts.run_config()));

    match result {
        // Returning drops the runner, which is where the held files close.
        Ok(_runner) => ExitCode::SUCCESS,
        Err(err) => {
            display_error(err);
            ExitCode::FAILURE
        }
    }
}

fn display_error(error: Error) {
    let mut chain = error.chain();

    if let Some(error) = chain.next() {
        eprintln!("{}: {}", "Error".red().bold(), error);
    }

    for cause in chain {
        eprintln!("     {} {}", ">".dimmed().bold(), cause);
    }
}
