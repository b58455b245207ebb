//! Durable key-value persistence. The tracker and the timer each own one
//! logical key; everything else lives in memory for the process lifetime.

use std::{
    fs::File,
    io::{ErrorKind, Read, Write},
    path::PathBuf,
};

use anyhow::Result;
use fs4::fs_std::FileExt;
use tracing::debug;

/// JSON-serialized array of time entries.
pub const ENTRIES_KEY: &str = "timeWiseAiEntries";
/// String-encoded non-negative count of finished work sessions.
pub const POMODOROS_KEY: &str = "pomodorosCompleted";

/// Interface for abstracting durable storage of the application's state.
#[cfg_attr(test, mockall::automock)]
pub trait KvStore: Send + Sync {
    /// Reads the stored value for `key`. `None` when the key was never
    /// written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Durably replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// The main realization of [KvStore]. Keeps one file per key inside the
/// application directory, guarded with advisory locks since the cli and a
/// running timer may share the directory.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        let mut file = match File::open(&path) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        FileExt::lock_shared(&file)?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content);
        FileExt::unlock(&file)?;
        result?;

        debug!("Read {} bytes from {path:?}", content.len());
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        FileExt::lock_exclusive(&file)?;
        let result = file.write_all(value.as_bytes()).and_then(|_| file.flush());
        FileExt::unlock(&file)?;
        result?;

        debug!("Wrote {} bytes to {path:?}", value.len());
        Ok(())
    }
}
