//! TTML exchange format (§4.6, §4.5): `<tt xml:lang><body><div
//! xml:lang><p begin end><span begin end>…</span></p>`, with speakers via
//! `ttm:agent` and multiple languages via sibling `<div>` elements. The
//! full-fidelity synchronized-lyrics storage (karaoke word timing,
//! speaker labels), used whenever LRC's compact form would lose data.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, LyricLine, LyricSegment, LyricsContentType, SynchronizedLyrics, Timestamp};

/// Parses every `<p>` in the document (ignoring language/`<div>`
/// structure) into a flat chapter list; `begin` is the start, `end` (if
/// present) the end, and the element's text content the title.
pub fn parse_chapters(input: &str) -> Result<ChapterList> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut chapters = Vec::new();
    let mut current_begin: Option<Timestamp> = None;
    let mut current_end: Option<Timestamp> = None;
    let mut current_text = String::new();
    let mut in_p = false;

    loop {
        match reader.read_event().map_err(|e| Error::ExportError(e.to_string()))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"p" => {
                in_p = true;
                current_text.clear();
                current_begin = attr(&e, "begin").map(|v| parse_clock_time(&v)).transpose()?;
                current_end = attr(&e, "end").map(|v| parse_clock_time(&v)).transpose()?;
            },
            Event::Text(t) if in_p => {
                current_text.push_str(&t.unescape().unwrap_or_default());
            },
            Event::End(e) if e.local_name().as_ref() == b"p" => {
                in_p = false;
                if let Some(start) = current_begin {
                    let title = if current_text.trim().is_empty() { "Chapter".to_string() } else { current_text.trim().to_string() };
                    let mut chapter = Chapter::new(start, title)?;
                    if let Some(end) = current_end {
                        if end > chapter.start() {
                            chapter.set_end(Some(end))?;
                        }
                    }
                    chapters.push(chapter);
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as a single-language TTML document, one `<p>` per
/// chapter.
pub fn emit_chapters(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<tt xmlns=\"http://www.w3.org/ns/ttml\" xml:lang=\"und\">\n  <body>\n    <div>\n");
    for chapter in chapters.iter() {
        out.push_str(&format!("      <p begin=\"{}\"", chapter.start().format()));
        if let Some(end) = chapter.end() {
            out.push_str(&format!(" end=\"{}\"", end.format()));
        }
        out.push('>');
        out.push_str(&escape(chapter.title()));
        out.push_str("</p>\n");
    }
    out.push_str("    </div>\n  </body>\n</tt>\n");
    Ok(out)
}

/// Parses a TTML document into one [`SynchronizedLyrics`] per `<div
/// xml:lang>`, reconstructing karaoke word timing from nested `<span>`s
/// and speaker labels from `ttm:agent`.
pub fn parse_lyrics(input: &str) -> Result<Vec<SynchronizedLyrics>> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut tracks: Vec<SynchronizedLyrics> = Vec::new();
    let mut current_lang = "und".to_string();
    let mut lines: Vec<LyricLine> = Vec::new();

    let mut in_p = false;
    let mut p_begin: Option<Timestamp> = None;
    let mut p_agent: Option<String> = None;
    let mut p_text = String::new();
    let mut p_segments: Vec<LyricSegment> = Vec::new();
    let mut in_span = false;
    let mut span_begin: Option<Timestamp> = None;
    let mut span_end: Option<Timestamp> = None;
    let mut span_text = String::new();

    loop {
        match reader.read_event().map_err(|e| Error::ExportError(e.to_string()))? {
            Event::Start(e) if e.local_name().as_ref() == b"div" => {
                if !lines.is_empty() {
                    tracks.push(SynchronizedLyrics::new(current_lang.clone(), LyricsContentType::Lyrics, std::mem::take(&mut lines)));
                }
                if let Some(lang) = attr(&e, "lang") {
                    current_lang = lang;
                }
            },
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"p" => {
                in_p = true;
                p_text.clear();
                p_segments.clear();
                p_begin = attr(&e, "begin").map(|v| parse_clock_time(&v)).transpose()?;
                p_agent = attr(&e, "agent");
            },
            Event::Start(e) | Event::Empty(e) if in_p && e.local_name().as_ref() == b"span" => {
                in_span = true;
                span_text.clear();
                span_begin = attr(&e, "begin").map(|v| parse_clock_time(&v)).transpose()?;
                span_end = attr(&e, "end").map(|v| parse_clock_time(&v)).transpose()?;
            },
            Event::Text(t) => {
                let text = t.unescape().unwrap_or_default().to_string();
                if in_span {
                    span_text.push_str(&text);
                } else if in_p {
                    p_text.push_str(&text);
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"span" => {
                in_span = false;
                p_text.push_str(&span_text);
                if let (Some(start), Some(end)) = (span_begin, span_end) {
                    if let Ok(segment) = LyricSegment::new(start, end, span_text.trim()) {
                        p_segments.push(segment);
                    }
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"p" => {
                in_p = false;
                if let Some(start) = p_begin {
                    let mut line = LyricLine::new(start, p_text.trim());
                    line.set_speaker(p_agent.take());
                    if !p_segments.is_empty() {
                        line.set_segments(Some(std::mem::take(&mut p_segments)));
                    }
                    lines.push(line);
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if !lines.is_empty() {
        tracks.push(SynchronizedLyrics::new(current_lang, LyricsContentType::Lyrics, lines));
    }

    if tracks.is_empty() {
        return Err(Error::ExportError("no <div>/<p> lyric lines found in TTML document".to_string()));
    }
    Ok(tracks)
}

/// Emits `tracks` as one `<div xml:lang>` per track, with `<span>`
/// children for karaoke lines and `ttm:agent` for speaker labels.
pub fn emit_lyrics(tracks: &[SynchronizedLyrics]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<tt xmlns=\"http://www.w3.org/ns/ttml\" xmlns:ttm=\"http://www.w3.org/ns/ttml#metadata\">\n  <body>\n");
    for track in tracks {
        out.push_str(&format!("    <div xml:lang=\"{}\">\n", track.language()));
        for line in track.lines() {
            out.push_str(&format!("      <p begin=\"{}\"", line.time().format()));
            if let Some(speaker) = line.speaker() {
                out.push_str(&format!(" ttm:agent=\"{}\"", escape(speaker)));
            }
            out.push('>');
            if let Some(segments) = line.segments() {
                for segment in segments {
                    out.push_str(&format!(
                        "<span begin=\"{}\" end=\"{}\">{}</span>",
                        segment.start().format(),
                        segment.end().format(),
                        escape(segment.text())
                    ));
                }
            } else {
                out.push_str(&escape(line.text()));
            }
            out.push_str("</p>\n");
        }
        out.push_str("    </div>\n");
    }
    out.push_str("  </body>\n</tt>\n");
    out
}

fn attr(e: &quick_xml::events::BytesStart<'_>, local_name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        let key = a.key;
        let name = String::from_utf8_lossy(key.as_ref()).to_string();
        if name == local_name || name.ends_with(&format!(":{local_name}")) {
            Some(String::from_utf8_lossy(&a.value).to_string())
        } else {
            None
        }
    })
}

fn parse_clock_time(input: &str) -> Result<Timestamp> {
    Timestamp::parse(input)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapters_round_trip() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        list.append(Chapter::new(Timestamp::from_millis(60_000), "Main").unwrap());
        let text = emit_chapters(&list).unwrap();
        let parsed = parse_chapters(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.as_slice()[1].title(), "Main");
    }

    #[test]
    fn karaoke_and_speaker_round_trip() {
        let mut line = LyricLine::new(Timestamp::from_millis(1000), "hello world");
        line.set_speaker(Some("Alice".to_string()));
        line.set_segments(Some(vec![
            LyricSegment::new(Timestamp::from_millis(1000), Timestamp::from_millis(1400), "hello").unwrap(),
            LyricSegment::new(Timestamp::from_millis(1400), Timestamp::from_millis(1800), "world").unwrap(),
        ]));
        let track = SynchronizedLyrics::new("eng", LyricsContentType::Lyrics, vec![line]);
        let text = emit_lyrics(std::slice::from_ref(&track));
        let parsed = parse_lyrics(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].lines()[0].speaker(), Some("Alice"));
        assert!(parsed[0].lines()[0].is_karaoke());
        assert_eq!(parsed[0].lines()[0].segments().unwrap().len(), 2);
    }

    #[test]
    fn multiple_languages_become_separate_tracks() {
        let eng = SynchronizedLyrics::new("eng", LyricsContentType::Lyrics, vec![LyricLine::new(Timestamp::ZERO, "hello")]);
        let spa = SynchronizedLyrics::new("spa", LyricsContentType::Lyrics, vec![LyricLine::new(Timestamp::ZERO, "hola")]);
        let text = emit_lyrics(&[eng, spa]);
        let parsed = parse_lyrics(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].language(), "eng");
        assert_eq!(parsed[1].language(), "spa");
    }
}
