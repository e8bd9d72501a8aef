use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{FileReader, DEFAULT_CHUNK_SIZE};

/// Random-access writer over a file on disk.
pub struct FileWriter {
    file: File,
    path: PathBuf,
}

impl FileWriter {
    /// Opens `path` for read/write, creating it if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| Error::write_failed(format!("{}: {e}", path.display())))?;
        Ok(FileWriter { file, path })
    }

    /// Creates (or truncates) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::write_failed(format!("{}: {e}", path.display())))?;
        Ok(FileWriter { file, path })
    }

    /// The path this writer was opened against.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `bytes` at the given absolute offset.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::write_failed(format!("{}: {e}", self.path.display())))?;
        self.file
            .write_all(bytes)
            .map_err(|e| Error::write_failed(format!("{}: {e}", self.path.display())))
    }

    /// Appends `bytes` to the current end of the file.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::write_failed(format!("{}: {e}", self.path.display())))?;
        self.file
            .write_all(bytes)
            .map_err(|e| Error::write_failed(format!("{}: {e}", self.path.display())))
    }

    /// Streams `[start, end)` from `reader` into this writer at `dest_offset`,
    /// in bounded chunks, without ever buffering the whole range.
    pub fn copy_from(
        &mut self,
        reader: &mut FileReader,
        start: u64,
        end: u64,
        dest_offset: u64,
    ) -> Result<()> {
        let mut pos = dest_offset;
        reader.stream_range_chunked(start, end, DEFAULT_CHUNK_SIZE, &mut |chunk| {
            self.write_at(pos, chunk)?;
            pos += chunk.len() as u64;
            Ok(())
        })
    }

    /// Truncates the file to `size` bytes.
    pub fn truncate(&mut self, size: u64) -> Result<()> {
        self.file
            .set_len(size)
            .map_err(|e| Error::write_failed(format!("{}: {e}", self.path.display())))
    }

    /// Flushes buffered writes (a no-op for `std::fs::File`, kept for
    /// symmetry with [`Self::close`] and callers that expect it).
    pub fn flush(&mut self) -> Result<()> {
        self.file
            .flush()
            .map_err(|e| Error::write_failed(format!("{}: {e}", self.path.display())))
    }

    /// Flushes and drops the underlying file handle.
    pub fn close(self) -> Result<()> {
        let mut this = self;
        this.flush()
    }
}

/// Atomically replaces `target` with the contents of `tmp_path`, so a
/// concurrent reader observes either the old or the new complete file,
/// never a torn state.
pub fn atomic_replace(tmp_path: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
    std::fs::rename(tmp_path.as_ref(), target.as_ref())
        .map_err(|e| Error::write_failed(format!("{}: {e}", target.as_ref().display())))
}

/// Builds a sibling temporary path for `target`, e.g. `song.mp3` ->
/// `song.mp3.audio-marker-tmp`.
pub fn sibling_temp_path(target: impl AsRef<Path>) -> PathBuf {
    let target = target.as_ref();
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".audio-marker-tmp");
    target.with_file_name(name)
}
