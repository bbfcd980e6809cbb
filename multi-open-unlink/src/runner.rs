/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The create, sync, set-attributes, unlink, fsync sequence.
//!
//! Every step is fatal on failure. Files handled by earlier iterations are
//! neither closed nor cleaned up, so the filesystem is left as it was at the
//! point of failure.

use std::fs::File;
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use tracing::info;

use crate::error::Context;
use crate::error::Error;
use crate::error::PathExists;
use crate::target;
use crate::xattr;

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Files are named `<prefix>.<index>`.
    pub prefix: PathBuf,
    /// Number of files, indexed from 1.
    pub count: u32,
    /// Attributes set on each file before it is unlinked.
    pub num_attrs: u32,
    /// Size of each zero-filled attribute value.
    pub attr_value_size: usize,
    /// How long to hold the unlinked files open after the last iteration.
    pub sleep: Duration,
    /// Fsync each file right after unlinking it.
    pub fsync_after_unlink: bool,
    /// Sync the containing filesystem right after creating each file.
    pub sync_fs_after_create: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            prefix: PathBuf::from("file"),
            count: 100,
            num_attrs: 0,
            attr_value_size: target::DEFAULT_ATTR_VALUE_SIZE,
            sleep: Duration::from_secs(60),
            fsync_after_unlink: false,
            sync_fs_after_create: false,
        }
    }
}

/// A file created by the run and still open. Unless its iteration failed
/// partway, it has already been unlinked.
#[derive(Debug)]
pub struct Held {
    path: PathBuf,
    file: File,
}

impl Held {
    /// The name the file had before it was unlinked.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &File {
        &self.file
    }
}

/// Owns every file created during a run. Dropping the runner closes them all.
#[derive(Debug)]
pub struct Runner {
    config: RunConfig,
    held: Vec<Held>,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            held: Vec::new(),
        }
    }

    /// Files held so far, in creation order. A file whose iteration failed
    /// after it was created is held too, and is the last one.
    pub fn held(&self) -> &[Held] {
        &self.held
    }

    /// Runs every iteration in order, stopping at the first failure.
    pub fn create_and_unlink_all(&mut self) -> Result<(), Error> {
        info!(
            prefix = %self.config.prefix.display(),
            count = self.config.count,
            num_attrs = self.config.num_attrs,
            attr_value_size = self.config.attr_value_size,
            "creating and unlinking files"
        );

        for index in 1..=self.config.count {
            self.iteration(index)?;
        }

        Ok(())
    }

    /// Creates, optionally syncs and attributes, unlinks and optionally
    /// fsyncs `<prefix>.<index>`. Once created, the open file is kept even if
    /// a later step fails.
    pub fn iteration(&mut self, index: u32) -> Result<(), Error> {
        let path = target::target_path(&self.config.prefix, index)?;

        if matches!(path.try_exists(), Ok(true)) {
            return Err(PathExists::new(path).into());
        }

        debug!(path = %path.display(), "create");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .mode(0o666)
            .open(&path)
            .with_context(|| format!("failed to create \"{}\"", path.display()))?;
        self.held.push(Held { path, file });

        let held = &self.held[self.held.len() - 1];
        let (path, file) = (&held.path, &held.file);

        if self.config.sync_fs_after_create {
            debug!(path = %path.display(), "syncfs");
            nix::unistd::syncfs(file.as_raw_fd()).with_context(|| {
                format!("failed to sync filesystem containing \"{}\"", path.display())
            })?;
        }

        for attr in 0..self.config.num_attrs {
            self.set_attr(path, attr)?;
        }

        debug!(path = %path.display(), "unlink");
        std::fs::remove_file(path)
            .with_context(|| format!("failed to unlink \"{}\"", path.display()))?;

        if self.config.fsync_after_unlink {
            debug!(path = %path.display(), "fsync");
            file.sync_all()
                .with_context(|| format!("failed to fsync \"{}\"", path.display()))?;
        }

        Ok(())
    }

    fn set_attr(&self, path: &Path, attr: u32) -> Result<(), Error> {
        let size = self.config.attr_value_size;
        let name = target::attr_name(attr)?;

        let value = target::zeroed_value(size).with_context(|| {
            format!(
                "failed to create EA value of size {} on path \"{}\"",
                size,
                path.display()
            )
        })?;

        debug!(path = %path.display(), name = %name, size, "setxattr");
        xattr::set(path, &name, &value).with_context(|| {
            format!(
                "failed to create EA \"{}\" of size {} on path \"{}\"",
                name,
                size,
                path.display()
            )
        })
    }

    /// Sleeps for the configured time with every file still open.
    pub fn hold(&self) {
        info!(
            files = self.held.len(),
            seconds = self.config.sleep.as_secs(),
            "holding unlinked files open"
        );
        std::thread::sleep(self.config.sleep);
        info!("done holding");
    }
}

/// Runs the whole sequence and then holds. The returned runner still owns
/// the open files; they are closed when it is dropped.
pub fn run(config: RunConfig) -> Result<Runner, Error> {
    let mut runner = Runner::new(config);
    runner.create_and_unlink_all()?;
    runner.hold();
    Ok(runner)
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::io::Seek;
    use std::io::SeekFrom;
    use std::io::Write;
    use std::os::unix::fs::MetadataExt;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn config_in(dir: &TempDir, count: u32) -> RunConfig {
        RunConfig {
            prefix: dir.path().join("t"),
            count,
            sleep: Duration::ZERO,
            ..Default::default()
        }
    }

    fn names_in(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn files_are_unlinked_but_held() {
        let dir = TempDir::new().unwrap();
        let runner = run(config_in(&dir, 3)).unwrap();

        assert!(names_in(&dir).is_empty());

        let paths: Vec<PathBuf> = runner.held().iter().map(|h| h.path().to_owned()).collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("t.1"),
                dir.path().join("t.2"),
                dir.path().join("t.3"),
            ]
        );

        for held in runner.held() {
            assert!(!held.path().exists());
            let meta = held.file().metadata().unwrap();
            assert_eq!(meta.nlink(), 0);
            assert!(meta.is_file());
        }
    }

    #[test]
    fn held_files_stay_usable() {
        let dir = TempDir::new().unwrap();
        let runner = run(config_in(&dir, 1)).unwrap();

        let mut file = runner.held()[0].file();
        file.write_all(b"still here").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = String::new();
        file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "still here");
    }

    #[test]
    fn zero_files() {
        let dir = TempDir::new().unwrap();
        let runner = run(config_in(&dir, 0)).unwrap();
        assert!(runner.held().is_empty());
        assert!(names_in(&dir).is_empty());
    }

    #[test]
    fn rerun_with_same_prefix_does_not_collide() {
        let dir = TempDir::new().unwrap();
        let first = run(config_in(&dir, 4)).unwrap();
        let second = run(config_in(&dir, 4)).unwrap();
        assert_eq!(first.held().len(), 4);
        assert_eq!(second.held().len(), 4);
    }

    #[test]
    fn existing_path_stops_the_run() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("t.1"), b"").unwrap();

        let mut runner = Runner::new(config_in(&dir, 3));
        let err = runner.create_and_unlink_all().unwrap_err();

        assert_eq!(
            err.downcast_ref::<PathExists>().map(|e| e.path().to_owned()),
            Some(dir.path().join("t.1"))
        );
        assert!(runner.held().is_empty());
        assert_eq!(names_in(&dir), vec!["t.1"]);
    }

    #[test]
    fn failure_midway_keeps_earlier_files_held() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("t.3"), b"").unwrap();

        let mut runner = Runner::new(config_in(&dir, 5));
        let err = runner.create_and_unlink_all().unwrap_err();

        assert!(err.to_string().contains("t.3"));
        assert_eq!(runner.held().len(), 2);
        for held in runner.held() {
            assert_eq!(held.file().metadata().unwrap().nlink(), 0);
        }
        // t.4 and t.5 are never touched.
        assert_eq!(names_in(&dir), vec!["t.3"]);
    }

    #[test]
    fn missing_directory_fails_create() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig {
            prefix: dir.path().join("absent").join("t"),
            ..config_in(&dir, 2)
        };

        let err = run(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "failed to create \"{}\"",
                dir.path().join("absent").join("t.1").display()
            )
        );
        assert_eq!(
            err.root_cause()
                .downcast_ref::<std::io::Error>()
                .map(|e| e.kind()),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[test]
    fn sync_and_fsync_flags() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig {
            fsync_after_unlink: true,
            sync_fs_after_create: true,
            ..config_in(&dir, 3)
        };

        let runner = run(config).unwrap();
        assert_eq!(runner.held().len(), 3);
        assert!(names_in(&dir).is_empty());
    }

    #[test]
    fn attributes_are_set_before_unlink() {
        let dir = TempDir::new().unwrap();
        if !xattr::user_attrs_supported(dir.path()).unwrap() {
            println!("user xattrs unsupported here, skipping");
            return;
        }

        let config = RunConfig {
            num_attrs: 2,
            attr_value_size: 10,
            ..config_in(&dir, 2)
        };
        let runner = run(config).unwrap();

        assert_eq!(runner.held().len(), 2);
        for held in runner.held() {
            for name in ["user.name.0", "user.name.1"] {
                assert_eq!(xattr::get(held.file(), name).unwrap(), vec![0u8; 10]);
            }
            assert!(xattr::get(held.file(), "user.name.2").is_err());
        }
        assert!(names_in(&dir).is_empty());
    }

    #[test]
    fn rejected_attribute_is_fatal() {
        let dir = TempDir::new().unwrap();
        if !xattr::user_attrs_supported(dir.path()).unwrap() {
            println!("user xattrs unsupported here, skipping");
            return;
        }

        // Larger than any filesystem accepts for a single value.
        let config = RunConfig {
            num_attrs: 1,
            attr_value_size: target::DEFAULT_ATTR_VALUE_SIZE + 1,
            ..config_in(&dir, 2)
        };
        let mut runner = Runner::new(config);
        let err = runner.create_and_unlink_all().unwrap_err();

        assert!(err.to_string().starts_with("failed to create EA \"user.name.0\""));
        // The file the attribute was meant for is left in place, still open.
        assert_eq!(names_in(&dir), vec!["t.1"]);
        assert_eq!(runner.held().len(), 1);
        let held = &runner.held()[0];
        assert_eq!(held.path(), dir.path().join("t.1"));
        assert_eq!(held.file().metadata().unwrap().nlink(), 1);
    }
}
