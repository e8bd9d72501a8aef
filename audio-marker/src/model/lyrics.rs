use crate::error::{Error, Result};

use super::timestamp::Timestamp;

/// A word-level span within a [`LyricLine`].
#[derive(Debug, Clone, PartialEq)]
pub struct LyricSegment {
    start: Timestamp,
    end: Timestamp,
    text: String,
}

impl LyricSegment {
    /// Builds a segment. Fails unless `start <= end`.
    pub fn new(start: Timestamp, end: Timestamp, text: impl Into<String>) -> Result<Self> {
        if start > end {
            return Err(Error::ExportError(format!(
                "lyric segment start {start} must not be after end {end}"
            )));
        }
        Ok(LyricSegment {
            start,
            end,
            text: text.into(),
        })
    }

    /// The segment's start timestamp.
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// The segment's end timestamp.
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// The segment's text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A single line of lyrics.
///
/// The presence of `segments` marks the line as *karaoke* (word-level
/// timing available in addition to the line-level timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    time: Timestamp,
    text: String,
    speaker: Option<String>,
    segments: Option<Vec<LyricSegment>>,
}

impl LyricLine {
    /// Builds a plain (non-karaoke) line.
    pub fn new(time: Timestamp, text: impl Into<String>) -> Self {
        LyricLine {
            time,
            text: text.into(),
            speaker: None,
            segments: None,
        }
    }

    /// The line's timestamp.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The line's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The line's speaker label, if any.
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    /// Sets the speaker label.
    pub fn set_speaker(&mut self, speaker: Option<String>) {
        self.speaker = speaker;
    }

    /// Word-level segments, if this is a karaoke line.
    pub fn segments(&self) -> Option<&[LyricSegment]> {
        self.segments.as_deref()
    }

    /// Sets word-level segments, marking the line as karaoke.
    pub fn set_segments(&mut self, segments: Option<Vec<LyricSegment>>) {
        self.segments = segments;
    }

    /// Whether this line carries word-level timing.
    pub fn is_karaoke(&self) -> bool {
        self.segments.is_some()
    }
}

/// Content classification for a [`SynchronizedLyrics`] track, mirroring
/// ID3v2 `SYLT`'s content-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsContentType {
    /// Plain lyrics.
    Lyrics,
    /// A transcription of spoken text.
    TextTranscription,
    /// Movement/part name.
    MovementOrPart,
    /// Event markers.
    Events,
    /// Chord changes.
    Chord,
    /// Trivia/pop-up information.
    Trivia,
}

/// A synchronized lyrics track in one language.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizedLyrics {
    language: String,
    content_type: LyricsContentType,
    descriptor: Option<String>,
    lines: Vec<LyricLine>,
}

impl SynchronizedLyrics {
    /// Builds a track. `language` should be a three-letter ISO 639-2 code.
    pub fn new(language: impl Into<String>, content_type: LyricsContentType, lines: Vec<LyricLine>) -> Self {
        SynchronizedLyrics {
            language: language.into(),
            content_type,
            descriptor: None,
            lines,
        }
    }

    /// The track's language code.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The track's content type.
    pub fn content_type(&self) -> LyricsContentType {
        self.content_type
    }

    /// An optional free-text descriptor.
    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }

    /// Sets the descriptor.
    pub fn set_descriptor(&mut self, descriptor: Option<String>) {
        self.descriptor = descriptor;
    }

    /// The lines, in whatever order they're stored.
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// Whether any line carries word-level (karaoke) timing.
    pub fn has_karaoke(&self) -> bool {
        self.lines.iter().any(LyricLine::is_karaoke)
    }

    /// Whether any line has a speaker label.
    pub fn has_speakers(&self) -> bool {
        self.lines.iter().any(|l| l.speaker().is_some())
    }

    /// Returns a copy with lines ordered by time.
    pub fn sorted(&self) -> SynchronizedLyrics {
        let mut lines = self.lines.clone();
        lines.sort_by_key(LyricLine::time);
        SynchronizedLyrics {
            language: self.language.clone(),
            content_type: self.content_type,
            descriptor: self.descriptor.clone(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_requires_start_le_end() {
        let t0 = Timestamp::from_millis(0);
        let t1 = Timestamp::from_millis(100);
        assert!(LyricSegment::new(t1, t0, "x").is_err());
        assert!(LyricSegment::new(t0, t0, "x").is_ok());
        assert!(LyricSegment::new(t0, t1, "x").is_ok());
    }

    #[test]
    fn karaoke_flag_tracks_segment_presence() {
        let mut line = LyricLine::new(Timestamp::ZERO, "hello world");
        assert!(!line.is_karaoke());
        line.set_segments(Some(vec![LyricSegment::new(
            Timestamp::ZERO,
            Timestamp::from_millis(500),
            "hello",
        )
        .unwrap()]));
        assert!(line.is_karaoke());
    }

    #[test]
    fn sorted_orders_by_time() {
        let lyrics = SynchronizedLyrics::new(
            "eng",
            LyricsContentType::Lyrics,
            vec![
                LyricLine::new(Timestamp::from_millis(2000), "second"),
                LyricLine::new(Timestamp::from_millis(1000), "first"),
            ],
        );
        let sorted = lyrics.sorted();
        assert_eq!(sorted.lines()[0].text(), "first");
        assert_eq!(sorted.lines()[1].text(), "second");
    }
}
