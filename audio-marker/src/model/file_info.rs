use super::chapter::ChapterList;
use super::metadata::AudioMetadata;
use super::timestamp::Timestamp;

/// The unit of exchange between the facade and the codecs: everything a
/// single read/write/modify operation needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFileInfo {
    /// Descriptive metadata.
    pub metadata: AudioMetadata,
    /// Chapter markers.
    pub chapters: ChapterList,
    /// Total audio duration, if known (from the container, not decoded
    /// samples).
    pub duration: Option<Timestamp>,
}

impl AudioFileInfo {
    /// An empty file info: no metadata, no chapters, unknown duration.
    pub fn new() -> Self {
        AudioFileInfo::default()
    }
}
