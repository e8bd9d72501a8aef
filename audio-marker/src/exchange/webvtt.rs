//! WebVTT chapter exchange format (§4.6): a `WEBVTT` header followed by
//! `start --> end\ntext\n\n` cues, period decimal separator.

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, Timestamp};

/// Parses every cue's `start --> end` line plus its following text
/// line(s) into a chapter.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut chapters = Vec::new();
    let mut lines = input.lines().peekable();

    // Skip the WEBVTT header and any blank/NOTE lines before the first cue.
    while let Some(&line) = lines.peek() {
        if line.contains("-->") {
            break;
        }
        lines.next();
    }

    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() || !line.contains("-->") {
            continue;
        }
        let (start_str, end_str) = line.split_once("-->").ok_or_else(|| Error::ExportError(format!("malformed cue: {line}")))?;
        let start = parse_timestamp(start_str.trim())?;
        let end = parse_timestamp(end_str.trim().split_whitespace().next().unwrap_or(""))?;

        let mut text_lines = Vec::new();
        while let Some(&next) = lines.peek() {
            if next.trim().is_empty() {
                lines.next();
                break;
            }
            text_lines.push(next.trim().to_string());
            lines.next();
        }
        let title = if text_lines.is_empty() { "Chapter".to_string() } else { text_lines.join(" ") };
        let mut chapter = Chapter::new(start, title)?;
        if end > chapter.start() {
            chapter.set_end(Some(end))?;
        }
        chapters.push(chapter);
    }

    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as a WebVTT document, one cue per chapter.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::from("WEBVTT\n\n");
    for chapter in chapters.iter() {
        let end = chapter.end().unwrap_or(chapter.start());
        out.push_str(&format!("{} --> {}\n", chapter.start().format(), end.format()));
        out.push_str(chapter.title());
        out.push_str("\n\n");
    }
    Ok(out)
}

fn parse_timestamp(input: &str) -> Result<Timestamp> {
    Timestamp::parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_cues() {
        let input = "WEBVTT\n\n00:00:00.000 --> 00:01:00.000\nIntro\n\n00:01:00.000 --> 00:02:00.000\nMain\n";
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[0].end(), Some(Timestamp::from_millis(60_000)));
        assert_eq!(list.as_slice()[1].title(), "Main");
    }

    #[test]
    fn round_trips_start_end_title() {
        let mut list = ChapterList::new();
        let mut c = Chapter::new(Timestamp::from_millis(0), "Intro").unwrap();
        c.set_end(Some(Timestamp::from_millis(30_000))).unwrap();
        list.append(c);
        let text = emit(&list).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].title(), "Intro");
        assert_eq!(parsed.as_slice()[0].end(), Some(Timestamp::from_millis(30_000)));
    }
}
