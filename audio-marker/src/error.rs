//! Error taxonomy for `audio_marker`.
//!
//! Mirrors the teacher's flat `thiserror` enum: one variant per failure
//! kind, `#[from]` conversions for the handful of stdlib errors codecs
//! naturally bump into, and no nested causal chains beyond what
//! `#[error(transparent)]`/`#[source]` gives us for free.

use crate::validation::Issue;

/// Errors produced by any `audio_marker` operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `detectFormat` could not classify the file from magic bytes or extension.
    #[error("could not determine audio container format for {0}")]
    UnknownFormat(String),

    /// The operation requested does not apply to the detected format.
    #[error("{operation} is not supported for {format} files")]
    UnsupportedFormat {
        /// The detected format's name, e.g. "m4b".
        format: String,
        /// The operation that was attempted.
        operation: String,
    },

    /// I/O or parse failure while reading a file.
    #[error("failed to read {detail}")]
    ReadFailed {
        /// File name and cause.
        detail: String,
    },

    /// I/O failure or precondition violation while writing a file.
    #[error("failed to write {detail}")]
    WriteFailed {
        /// File name and cause.
        detail: String,
    },

    /// `validateBeforeWriting` rejected a write because of error-severity issues.
    #[error("validation failed with {} error(s)", .issues.iter().filter(|i| i.is_error()).count())]
    ValidationFailed {
        /// The full set of issues found, including warnings.
        issues: Vec<Issue>,
    },

    /// Malformed ID3v2 structure.
    #[error("invalid ID3v2 tag at offset {offset}: {reason}")]
    InvalidTag {
        /// Byte offset within the tag where the problem was found.
        offset: u64,
        /// Human-readable reason.
        reason: String,
    },

    /// Malformed ISOBMFF container.
    #[error("invalid MP4 container: {0}")]
    InvalidContainer(String),

    /// The binary cursor hit a decoding failure.
    #[error("invalid encoding at offset {0}")]
    InvalidEncoding(u64),

    /// The binary cursor ran past the end of its buffer.
    #[error("unexpected end of data at offset {offset}: requested {requested} bytes, {available} available")]
    UnexpectedEndOfData {
        /// Offset the read was attempted at.
        offset: u64,
        /// Bytes requested.
        requested: u64,
        /// Bytes actually available.
        available: u64,
    },

    /// An absolute seek landed outside the buffer/file.
    #[error("seek to {offset} out of bounds for buffer of size {size}")]
    SeekOutOfBounds {
        /// Requested offset.
        offset: u64,
        /// Size of the underlying buffer.
        size: u64,
    },

    /// A chapter/lyrics text-exchange format failed to parse or emit.
    #[error("export/import error: {0}")]
    ExportError(String),

    /// A duration string failed to parse.
    #[error("invalid timestamp: {0}")]
    TimestampError(String),

    /// Artwork bytes did not match a supported image format.
    #[error("artwork error: {0}")]
    ArtworkError(String),

    /// Wraps `std::io::Error` encountered outside a more specific context.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wraps a UTF-8 decoding failure.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// Wraps an owned-`String` UTF-8 decoding failure.
    #[error(transparent)]
    FromUtf8(#[from] std::string::FromUtf8Error),

    /// Wraps a JSON exchange-format parse/emit failure.
    #[error("JSON exchange format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn read_failed(detail: impl Into<String>) -> Self {
        Error::ReadFailed {
            detail: detail.into(),
        }
    }

    pub(crate) fn write_failed(detail: impl Into<String>) -> Self {
        Error::WriteFailed {
            detail: detail.into(),
        }
    }
}
