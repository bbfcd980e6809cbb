/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

pub type Error = anyhow::Error;

pub use anyhow::Context;

/// A target path was already present in the namespace before we tried to
/// create it. Nothing created earlier in the run is cleaned up.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PathExists {
    path: PathBuf,
}

impl PathExists {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for PathExists {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "file \"{}\" already exists", self.path.display())
    }
}

impl std::error::Error for PathExists {}

/// A name or path does not fit the length bound it has to be created under.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TooLong {
    what: &'static str,
    len: usize,
    max: usize,
}

impl TooLong {
    pub fn new(what: &'static str, len: usize, max: usize) -> Self {
        Self { what, len, max }
    }
}

impl fmt::Display for TooLong {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} is {} bytes long, at most {} bytes are allowed",
            self.what, self.len, self.max
        )
    }
}

impl std::error::Error for TooLong {}
