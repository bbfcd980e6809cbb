/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Holds many unlinked files open at once.
//!
//! Each of `N` files is created, optionally given extended attributes, and
//! unlinked while its descriptor stays open. Once all of them exist only as
//! open descriptors, the process sleeps so the filesystem can be inspected
//! (space accounting, orphan lists, crash testing) before the descriptors are
//! released at exit. Optional `syncfs` after each create and `fsync` after each
//! unlink make it possible to isolate which step upsets a filesystem.

// Treat all Clippy warnings as errors.
#![deny(clippy::all)]

pub mod error;
pub mod opts;
pub mod runner;
pub mod target;
pub mod xattr;

pub use error::Context;
pub use error::Error;
pub use error::PathExists;
pub use opts::Opts;
pub use runner::Held;
pub use runner::RunConfig;
pub use runner::Runner;
pub use runner::run;
