/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Extended attribute calls, which nix does not wrap.

use std::ffi::CString;
use std::io;
use std::os::fd::AsFd;
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

fn cstring(bytes: &[u8]) -> io::Result<CString> {
    CString::new(bytes).map_err(|_| io::Error::from_raw_os_error(libc::EINVAL))
}

/// Sets attribute `name` on `path` to `value`, creating or replacing it.
/// Symlinks are followed.
pub fn set(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
    let path = cstring(path.as_os_str().as_bytes())?;
    let name = cstring(name.as_bytes())?;

    let ret = unsafe {
        libc::setxattr(
            path.as_ptr(),
            name.as_ptr(),
            value.as_ptr() as *const libc::c_void,
            value.len(),
            0,
        )
    };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Reads attribute `name` through an open descriptor. This works after the
/// file has been unlinked.
pub fn get(fd: impl AsFd, name: &str) -> io::Result<Vec<u8>> {
    let fd = fd.as_fd().as_raw_fd();
    let name = cstring(name.as_bytes())?;

    let len = unsafe { libc::fgetxattr(fd, name.as_ptr(), std::ptr::null_mut(), 0) };
    if len < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut buf = vec![0u8; len as usize];
    let len = unsafe {
        libc::fgetxattr(
            fd,
            name.as_ptr(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
        )
    };
    if len < 0 {
        return Err(io::Error::last_os_error());
    }
    buf.truncate(len as usize);
    Ok(buf)
}

/// Whether the filesystem holding `dir` accepts `user.*` attributes. Creates
/// and removes a scratch file in `dir`.
#[cfg(test)]
pub(crate) fn user_attrs_supported(dir: &Path) -> io::Result<bool> {
    let scratch = dir.join(".xattr-check");
    std::fs::File::create(&scratch)?;
    let res = set(&scratch, "user.check", b"check");
    std::fs::remove_file(&scratch)?;

    match res {
        Ok(()) => Ok(true),
        Err(err) if err.raw_os_error() == Some(libc::ENOTSUP) => Ok(false),
        Err(err) => Err(err),
    }
}
