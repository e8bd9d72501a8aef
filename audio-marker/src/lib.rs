//! Non-destructive reading, mutation, and writing of ID3v2 and MP4/ISOBMFF
//! audio metadata: descriptive tags, chapter markers, and synchronized
//! lyrics.
//!
//! # Supported formats
//!
//! | Container | Extensions    | Metadata format                          |
//! |-----------|---------------|-------------------------------------------|
//! | MP3       | `mp3`         | `ID3v2.3`, `ID3v2.4`                       |
//! | MP4       | `m4a`, `m4b`  | ISO/IEC 14496-12 `ilst` (iTunes-style)     |
//!
//! [`Facade`] is the single entry point: it detects the container format,
//! dispatches to the matching codec, and honors [`AudioMarkerConfig`].
//!
//! ```no_run
//! use audio_marker::{Facade, AudioFileInfo};
//!
//! let facade = Facade::new();
//! let mut info: AudioFileInfo = facade.read("track.mp3")?;
//! info.metadata.title = Some("New Title".to_string());
//! facade.modify(&info, "track.mp3")?;
//! # Ok::<(), audio_marker::Error>(())
//! ```
//!
//! Chapters and synchronized lyrics round-trip through ten text-exchange
//! formats (Podlove JSON/XML, Podcasting 2.0 JSON, MP4Chaps, FFMetadata,
//! Cue Sheet, LRC, TTML, WebVTT, SRT) via [`exchange::parse`]/[`exchange::emit`],
//! plus Markdown as an export-only eleventh format.
//!
//! Batches of files are processed with bounded parallelism through
//! [`batch::BatchExecutor`].

pub use crate::error::{Error, Result};

pub use crate::config::{AudioMarkerConfig, Id3Version};
pub use crate::detect::{detect_format, Format};
pub use crate::facade::Facade;
pub use crate::model::{
    Artwork, ArtworkFormat, AudioFileInfo, AudioMetadata, Chapter, ChapterList, LyricLine, LyricSegment,
    LyricsContentType, PrivateData, SynchronizedLyrics, Timestamp, UniqueFileIdentifier,
};
pub use crate::validation::{Issue, Severity, ValidationResult, ValidationRule};

#[macro_use]
mod macros;

mod binary;
pub mod batch;
mod config;
mod detect;
mod error;
pub mod exchange;
mod facade;
mod id3v2;
mod io;
mod model;
mod mp4;
pub mod validation;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_surface_compiles() {
        let _ = Facade::new();
        let _ = AudioMarkerConfig::default();
        let _ = AudioFileInfo::new();
    }
}
