use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::DEFAULT_CHUNK_SIZE;

/// Random-access reader over a file on disk.
///
/// Safe to share across threads for disjoint reads (each call opens its own
/// cursor position via `seek` before reading); concurrent mutation of the
/// same offset from multiple threads is the caller's responsibility.
pub struct FileReader {
    file: File,
    path: PathBuf,
    size: u64,
}

impl FileReader {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            Error::read_failed(format!("{}: {e}", path.display()))
        })?;
        let size = file.metadata().map_err(|e| Error::read_failed(format!("{}: {e}", path.display())))?.len();
        Ok(FileReader { file, path, size })
    }

    /// The path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total size of the file in bytes.
    pub fn file_size(&self) -> u64 {
        self.size
    }

    /// Reads exactly `count` bytes starting at `at`.
    pub fn read(&mut self, at: u64, count: usize) -> Result<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(at))
            .map_err(|e| Error::read_failed(format!("{}: {e}", self.path.display())))?;
        let mut buf = vec![0u8; count];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| Error::read_failed(format!("{}: {e}", self.path.display())))?;
        Ok(buf)
    }

    /// Reads whatever remains of the file starting at `at`, up to `count`
    /// bytes (fewer if the file is shorter).
    pub fn read_up_to(&mut self, at: u64, count: usize) -> Result<Vec<u8>> {
        let available = self.size.saturating_sub(at);
        let take = (count as u64).min(available) as usize;
        if take == 0 {
            return Ok(Vec::new());
        }
        self.read(at, take)
    }

    /// Streams the byte range `[start, end)`, invoking `on_chunk` with each
    /// chunk (default chunk size [`super::DEFAULT_CHUNK_SIZE`]) in order.
    /// Never buffers the whole range in memory.
    pub fn stream_range(
        &mut self,
        start: u64,
        end: u64,
        mut on_chunk: impl FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        self.stream_range_chunked(start, end, DEFAULT_CHUNK_SIZE, &mut on_chunk)
    }

    /// As [`Self::stream_range`] but with an explicit chunk size.
    pub fn stream_range_chunked(
        &mut self,
        start: u64,
        end: u64,
        chunk_size: usize,
        on_chunk: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(start))
            .map_err(|e| Error::read_failed(format!("{}: {e}", self.path.display())))?;
        let mut remaining = end.saturating_sub(start);
        let mut buf = vec![0u8; chunk_size.max(1)];
        while remaining > 0 {
            let take = (remaining as usize).min(buf.len());
            self.file
                .read_exact(&mut buf[..take])
                .map_err(|e| Error::read_failed(format!("{}: {e}", self.path.display())))?;
            on_chunk(&buf[..take])?;
            remaining -= take as u64;
        }
        Ok(())
    }
}
