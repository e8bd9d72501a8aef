//! SRT chapter exchange format (§4.6): numeric index, `HH:MM:SS,mmm -->
//! HH:MM:SS,mmm`, comma decimal separator.

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, Timestamp};

/// Parses every numbered cue block into a chapter.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut chapters = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.parse::<u32>().is_err() {
            continue; // not an index line; skip until we find one
        }
        let Some(time_line) = lines.next() else { break };
        let (start_str, end_str) = time_line
            .split_once("-->")
            .ok_or_else(|| Error::ExportError(format!("malformed SRT timing line: {time_line}")))?;
        let start = parse_comma_timestamp(start_str.trim())?;
        let end = parse_comma_timestamp(end_str.trim())?;

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

/// Emits `chapters` as an SRT document with a 1-based numeric index per
/// chapter.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    for (i, chapter) in chapters.iter().enumerate() {
        let end = chapter.end().unwrap_or(chapter.start());
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!("{} --> {}\n", format_comma_timestamp(chapter.start()), format_comma_timestamp(end)));
        out.push_str(chapter.title());
        out.push_str("\n\n");
    }
    Ok(out)
}

fn parse_comma_timestamp(input: &str) -> Result<Timestamp> {
    Timestamp::parse(&input.replace(',', "."))
}

fn format_comma_timestamp(ts: Timestamp) -> String {
    ts.format().replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_cues() {
        let input = "1\n00:00:00,000 --> 00:01:00,000\nIntro\n\n2\n00:01:00,000 --> 00:02:00,000\nMain\n";
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].title(), "Main");
    }

    #[test]
    fn round_trips_with_comma_decimal() {
        let mut list = ChapterList::new();
        let mut c = Chapter::new(Timestamp::from_millis(1500), "Intro").unwrap();
        c.set_end(Some(Timestamp::from_millis(5000))).unwrap();
        list.append(c);
        let text = emit(&list).unwrap();
        assert!(text.contains(','), "expected comma decimal separator");
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].start(), Timestamp::from_millis(1500));
        assert_eq!(parsed.as_slice()[0].end(), Some(Timestamp::from_millis(5000)));
    }
}
