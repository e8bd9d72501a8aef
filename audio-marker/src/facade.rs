//! The facade (§6): the single external entry point. Dispatches to the
//! ID3v2 or MP4 codec by detected format and honors [`AudioMarkerConfig`].

use std::path::Path;

use crate::config::{AudioMarkerConfig, Id3Version};
use crate::detect::{self, Format};
use crate::error::{Error, Result};
use crate::exchange::{self, ChapterFormat};
use crate::id3v2;
use crate::model::{AudioFileInfo, ChapterList};
use crate::mp4;
use crate::validation::{self, ValidationResult};

/// The single library entry point. Carries only configuration — stateless
/// otherwise, cheap to construct per call or keep around and reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facade {
    config: AudioMarkerConfig,
}

impl Facade {
    /// A facade with default configuration.
    pub fn new() -> Self {
        Facade::default()
    }

    /// A facade using `config` instead of the defaults.
    pub fn with_config(config: AudioMarkerConfig) -> Self {
        Facade { config }
    }

    /// This facade's configuration.
    pub fn config(&self) -> &AudioMarkerConfig {
        &self.config
    }

    fn id3_major_version(&self) -> u8 {
        match self.config.id3_version {
            Id3Version::V23 => 3,
            Id3Version::V24 => 4,
        }
    }

    /// Detects the container format of the file at `path`.
    pub fn detect_format(&self, path: impl AsRef<Path>) -> Result<Format> {
        detect::detect_format(path)
    }

    /// Reads metadata, chapters, and duration.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<AudioFileInfo> {
        let path = path.as_ref();
        match self.detect_format(path)? {
            Format::Mp3 => id3v2::read(path, !self.config.preserve_unknown_data),
            Format::M4a | Format::M4b => mp4::read(path),
        }
    }

    /// Reads only the chapter list.
    pub fn read_chapters(&self, path: impl AsRef<Path>) -> Result<ChapterList> {
        Ok(self.read(path)?.chapters)
    }

    /// Full replace: emits a fresh tag/container for `info`, discarding
    /// anything the codec doesn't understand.
    pub fn write(&self, info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<()> {
        if self.config.validate_before_writing {
            validation::validate_or_throw(info)?;
        }
        let path = path.as_ref();
        match self.detect_format(path)? {
            Format::Mp3 => id3v2::write(info, path, self.id3_major_version(), self.config.id3_padding_size),
            Format::M4a | Format::M4b => mp4::write(info, path),
        }
    }

    /// In-place modify: merges `info` into the existing tag/container,
    /// preserving frames/atoms this crate doesn't map to a known field.
    pub fn modify(&self, info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<()> {
        if self.config.validate_before_writing {
            validation::validate_or_throw(info)?;
        }
        let path = path.as_ref();
        match self.detect_format(path)? {
            Format::Mp3 => id3v2::modify(info, path, self.id3_major_version(), self.config.id3_padding_size),
            Format::M4a | Format::M4b => mp4::modify(info, path),
        }
    }

    /// Removes all metadata and chapters, restoring the bare audio stream.
    pub fn strip(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match self.detect_format(path)? {
            Format::Mp3 => id3v2::strip(path),
            Format::M4a | Format::M4b => mp4::strip(path),
        }
    }

    /// Replaces only the chapter list, preserving every other metadata
    /// field and any data this crate doesn't understand.
    pub fn write_chapters(&self, chapters: &ChapterList, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut info = self.read(path)?;
        info.chapters = chapters.clone();
        self.modify(&info, path)
    }

    /// Renders `path`'s chapters as `format`.
    pub fn export_chapters(&self, path: impl AsRef<Path>, format: ChapterFormat) -> Result<String> {
        let chapters = self.read_chapters(path)?;
        exchange::emit(format, &chapters)
    }

    /// Parses `input` as `format` and writes the result as `path`'s
    /// chapter list, preserving other metadata.
    pub fn import_chapters(&self, input: &str, format: ChapterFormat, path: impl AsRef<Path>) -> Result<()> {
        let chapters = exchange::parse(format, input)?;
        self.write_chapters(&chapters, path)
    }

    /// Runs the default validation rule set against `info` without failing.
    pub fn validate(&self, info: &AudioFileInfo) -> ValidationResult {
        validation::validate(info)
    }

    /// Runs the default validation rule set and fails with
    /// [`Error::ValidationFailed`] if any error-severity issue is found.
    pub fn validate_or_throw(&self, info: &AudioFileInfo) -> Result<()> {
        validation::validate_or_throw(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trips_title_through_mp3() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 64]).unwrap();
        let path = file.into_temp_path();

        let facade = Facade::new();
        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("Hello".to_string());
        facade.write(&info, &path).unwrap();

        let read_back = facade.read(&path).unwrap();
        assert_eq!(read_back.metadata.title.as_deref(), Some("Hello"));
    }

    #[test]
    fn write_rejects_invalid_info_when_validating() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 16]).unwrap();
        let path = file.into_temp_path();

        let facade = Facade::new();
        let mut info = AudioFileInfo::new();
        info.metadata.language = Some("not-a-code".to_string());
        let result = facade.write(&info, &path);
        assert!(matches!(result, Err(Error::ValidationFailed { .. })));
    }

    #[test]
    fn export_then_import_chapters_round_trips() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 32]).unwrap();
        let path = file.into_temp_path();

        let facade = Facade::new();
        let mut chapters = ChapterList::new();
        chapters.append(crate::model::Chapter::new(crate::model::Timestamp::ZERO, "Intro").unwrap());
        facade.write_chapters(&chapters, &path).unwrap();

        let exported = facade.export_chapters(&path, ChapterFormat::Mp4Chaps).unwrap();
        facade.import_chapters(&exported, ChapterFormat::Mp4Chaps, &path).unwrap();

        let read_back = facade.read_chapters(&path).unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back.as_slice()[0].title(), "Intro");
    }
}
