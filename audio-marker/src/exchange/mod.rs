//! Chapter/lyrics text-exchange formats (§4.6): bidirectional
//! parse/emit pairs for ten formats plus Markdown, which is emit-only.
//!
//! Each submodule owns one format. [`ChapterFormat`] is the tagged
//! enumeration the facade and CLI dispatch on — a format is a variant
//! with a parser/emitter pair, not a class hierarchy (§9 Polymorphism).

pub mod cue_sheet;
pub mod ffmetadata;
pub mod lrc;
pub mod markdown;
pub mod mp4chaps;
pub mod podcasting2_json;
pub mod podlove_json;
pub mod podlove_xml;
pub mod srt;
pub mod ttml;
pub mod webvtt;

use crate::error::{Error, Result};
use crate::model::ChapterList;

/// One of the eleven chapter/lyrics exchange formats (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterFormat {
    PodloveJson,
    PodloveXml,
    Mp4Chaps,
    FfMetadata,
    Podcasting2Json,
    CueSheet,
    Lrc,
    Ttml,
    WebVtt,
    Srt,
    /// Export-only; [`parse`] always fails for this variant.
    Markdown,
}

impl ChapterFormat {
    /// Guesses a format from a file extension (§10 supplemental CLI
    /// convenience; not part of the core parse/emit contract).
    pub fn from_extension(path: &str) -> Option<ChapterFormat> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        Some(match ext.as_str() {
            "json" => ChapterFormat::PodloveJson,
            "xml" => ChapterFormat::PodloveXml,
            "ffmetadata" => ChapterFormat::FfMetadata,
            "cue" => ChapterFormat::CueSheet,
            "lrc" => ChapterFormat::Lrc,
            "ttml" => ChapterFormat::Ttml,
            "vtt" => ChapterFormat::WebVtt,
            "srt" => ChapterFormat::Srt,
            "md" => ChapterFormat::Markdown,
            "txt" | "chapters" => ChapterFormat::Mp4Chaps,
            _ => return None,
        })
    }
}

/// Parses `input` as `format`. Fails for [`ChapterFormat::Markdown`],
/// which has no canonical parse direction.
pub fn parse(format: ChapterFormat, input: &str) -> Result<ChapterList> {
    match format {
        ChapterFormat::PodloveJson => podlove_json::parse(input),
        ChapterFormat::PodloveXml => podlove_xml::parse(input),
        ChapterFormat::Mp4Chaps => mp4chaps::parse(input),
        ChapterFormat::FfMetadata => ffmetadata::parse(input),
        ChapterFormat::Podcasting2Json => podcasting2_json::parse(input),
        ChapterFormat::CueSheet => cue_sheet::parse(input),
        ChapterFormat::Lrc => lrc::parse(input),
        ChapterFormat::Ttml => ttml::parse_chapters(input),
        ChapterFormat::WebVtt => webvtt::parse(input),
        ChapterFormat::Srt => srt::parse(input),
        ChapterFormat::Markdown => Err(Error::ExportError("Markdown chapter export has no parser".to_string())),
    }
}

/// Emits `chapters` as `format`.
pub fn emit(format: ChapterFormat, chapters: &ChapterList) -> Result<String> {
    match format {
        ChapterFormat::PodloveJson => podlove_json::emit(chapters),
        ChapterFormat::PodloveXml => podlove_xml::emit(chapters),
        ChapterFormat::Mp4Chaps => mp4chaps::emit(chapters),
        ChapterFormat::FfMetadata => ffmetadata::emit(chapters),
        ChapterFormat::Podcasting2Json => podcasting2_json::emit(chapters),
        ChapterFormat::CueSheet => cue_sheet::emit(chapters),
        ChapterFormat::Lrc => lrc::emit(chapters),
        ChapterFormat::Ttml => ttml::emit_chapters(chapters),
        ChapterFormat::WebVtt => webvtt::emit(chapters),
        ChapterFormat::Srt => srt::emit(chapters),
        ChapterFormat::Markdown => markdown::emit(chapters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection_covers_common_cases() {
        assert_eq!(ChapterFormat::from_extension("chapters.srt"), Some(ChapterFormat::Srt));
        assert_eq!(ChapterFormat::from_extension("notes.md"), Some(ChapterFormat::Markdown));
        assert_eq!(ChapterFormat::from_extension("noext"), None);
    }

    #[test]
    fn markdown_parse_is_rejected() {
        assert!(parse(ChapterFormat::Markdown, "- [00:00:00] Intro\n").is_err());
    }
}
