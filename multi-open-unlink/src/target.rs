/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Names of the things we create: target paths, attribute names, and the
//! zero-filled attribute values.

use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Context;
use crate::error::Error;
use crate::error::TooLong;

/// Longest path we will hand to the kernel, not counting the NUL terminator.
pub const MAX_PATH_LEN: usize = libc::PATH_MAX as usize - 1;

/// Longest attribute name, not counting the NUL terminator.
pub const MAX_ATTR_NAME_LEN: usize = 29;

/// Default attribute value size. This is the Linux cap on a single value
/// (`XATTR_SIZE_MAX`), which forces out-of-line attribute storage.
pub const DEFAULT_ATTR_VALUE_SIZE: usize = 64 * 1024;

const ATTR_NAME_PREFIX: &str = "user.name.";

/// Returns `<prefix>.<index>`.
pub fn target_path(prefix: &Path, index: u32) -> Result<PathBuf, Error> {
    let mut path = prefix.as_os_str().to_owned();
    path.push(format!(".{}", index));

    let len = path.as_bytes().len();
    if len > MAX_PATH_LEN {
        return Err(TooLong::new("target path", len, MAX_PATH_LEN))
            .with_context(|| format!("cannot create \"{}\"", Path::new(&path).display()));
    }

    Ok(PathBuf::from(path))
}

/// Returns `user.name.<index>`.
pub fn attr_name(index: u32) -> Result<String, Error> {
    let name = format!("{}{}", ATTR_NAME_PREFIX, index);
    if name.len() > MAX_ATTR_NAME_LEN {
        return Err(TooLong::new("attribute name", name.len(), MAX_ATTR_NAME_LEN).into());
    }
    Ok(name)
}

/// Allocates a zero-filled attribute value of `size` bytes. Allocation
/// failure is reported instead of aborting the process.
pub fn zeroed_value(size: usize) -> Result<Vec<u8>, std::collections::TryReserveError> {
    let mut value = Vec::new();
    value.try_reserve_exact(size)?;
    value.resize(size, 0);
    Ok(value)
}
