//! MP4Chaps exchange format (§4.6): `HH:MM:SS.mmm <title>` per line, the
//! format mp4chaps/Chapter-and-Verse tools emit for QuickTime chapter
//! tracks.

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, Timestamp};

/// Parses one chapter per non-blank line.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut chapters = Vec::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (time_str, title) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| Error::ExportError(format!("malformed mp4chaps line: {line}")))?;
        let start = Timestamp::parse(time_str)?;
        let title = title.trim();
        let title = if title.is_empty() { "Chapter" } else { title };
        chapters.push(Chapter::new(start, title)?);
    }
    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as one `HH:MM:SS.mmm <title>` line per chapter.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    for chapter in chapters.iter() {
        out.push_str(&chapter.start().format());
        out.push(' ');
        out.push_str(chapter.title());
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_lines() {
        let input = "00:00:00.000 Intro\n00:01:00.000 Main\n";
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].start(), Timestamp::from_millis(60_000));
        assert_eq!(list.as_slice()[1].title(), "Main");
    }

    #[test]
    fn round_trips() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        list.append(Chapter::new(Timestamp::from_millis(90_000), "Outro").unwrap());
        let text = emit(&list).unwrap();
        let parsed = parse(&text).unwrap();
        let starts_titles: Vec<_> = parsed.iter().map(|c| (c.start(), c.title().to_string())).collect();
        assert_eq!(
            starts_titles,
            vec![(Timestamp::from_millis(0), "Intro".to_string()), (Timestamp::from_millis(90_000), "Outro".to_string())]
        );
    }
}
