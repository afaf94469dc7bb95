//! Host-file byte store.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use pagestore_error::{Result, StoreError};
use pagestore_types::{ByteStore, check_position, check_span};
use tracing::debug;

use crate::COPY_STEP;

/// A byte store whose bytes are exactly the contents of one host file.
///
/// The handle is opened lazily on first access and dropped by
/// [`FileByteStore::close`] (or `flush()`); later calls reopen it. The file is
/// created if it does not exist yet.
#[derive(Debug)]
pub struct FileByteStore {
    path: PathBuf,
    file: Option<File>,
    size: u64,
}

impl FileByteStore {
    /// Bind to `path`, picking up the current length of an existing file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            file: None,
            size,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Sync and release the file handle.
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_data()?;
            debug!(path = %self.path.display(), size = self.size, "file store closed");
        }
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.path)?;
            debug!(path = %self.path.display(), size = self.size, "file store opened");
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| StoreError::internal("file handle vanished"))
    }

    /// Move the bytes `[from, size)` so they start at `dest`.
    fn shift_tail(&mut self, from: u64, dest: u64) -> Result<()> {
        let size = self.size;
        let file = self.handle()?;
        let mut step_buf = vec![0_u8; COPY_STEP];
        if dest > from {
            // Moving right: walk backwards so the source is never clobbered.
            let mut end = size;
            while end > from {
                let step = (end - from).min(COPY_STEP as u64);
                let start = end - step;
                let chunk = &mut step_buf[..step as usize];
                file.seek(SeekFrom::Start(start))?;
                file.read_exact(chunk)?;
                file.seek(SeekFrom::Start(start + (dest - from)))?;
                file.write_all(chunk)?;
                end = start;
            }
        } else if dest < from {
            let mut pos = from;
            while pos < size {
                let step = (size - pos).min(COPY_STEP as u64);
                let chunk = &mut step_buf[..step as usize];
                file.seek(SeekFrom::Start(pos))?;
                file.read_exact(chunk)?;
                file.seek(SeekFrom::Start(pos - (from - dest)))?;
                file.write_all(chunk)?;
                pos += step;
            }
        }
        Ok(())
    }
}

impl ByteStore for FileByteStore {
    fn size(&self) -> u64 {
        self.size
    }

    fn read(&mut self, from: u64, buf: &mut [u8]) -> Result<usize> {
        check_position(from, self.size)?;
        let n = (buf.len() as u64).min(self.size - from) as usize;
        if n == 0 {
            return Ok(0);
        }
        let file = self.handle()?;
        file.seek(SeekFrom::Start(from))?;
        file.read_exact(&mut buf[..n])?;
        Ok(n)
    }

    fn write(&mut self, from: u64, buf: &[u8]) -> Result<usize> {
        check_position(from, self.size)?;
        if buf.is_empty() {
            return Ok(0);
        }
        let file = self.handle()?;
        file.seek(SeekFrom::Start(from))?;
        file.write_all(buf)?;
        self.size = self.size.max(from + buf.len() as u64);
        Ok(buf.len())
    }

    fn replace_range(&mut self, from: u64, to: u64, buf: &[u8]) -> Result<usize> {
        check_span(from, to, self.size)?;
        let inserted = buf.len() as u64;
        let removed = to - from;
        if inserted != removed {
            let new_size = self.size - removed + inserted;
            self.shift_tail(to, from + inserted)?;
            // The tail now sits at its new offset; record that before the
            // truncation or the payload write can fail.
            let shrunk = new_size < self.size;
            self.size = new_size;
            if shrunk {
                self.handle()?.set_len(new_size)?;
            }
        }
        if !buf.is_empty() {
            let file = self.handle()?;
            file.seek(SeekFrom::Start(from))?;
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.close()
    }
}
