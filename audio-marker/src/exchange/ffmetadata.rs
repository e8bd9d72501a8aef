//! FFmpeg `ffmetadata` chapter exchange format (§4.6): a `;FFMETADATA1`
//! header followed by `[CHAPTER]` sections with `TIMEBASE=1/1000`,
//! `START=`, `END=`, and `title=` key/value lines.

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, Timestamp};

const HEADER: &str = ";FFMETADATA1";

/// Parses every `[CHAPTER]` section, assuming `TIMEBASE=1/1000`
/// (milliseconds) as this crate always emits.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut chapters = Vec::new();
    let mut in_chapter = false;
    let mut timebase_den: u64 = 1000;
    let mut start: Option<i64> = None;
    let mut end: Option<i64> = None;
    let mut title: Option<String> = None;

    macro_rules! flush {
        () => {
            if in_chapter {
                let Some(start_ms) = start else {
                    return Err(Error::ExportError("CHAPTER section missing START".to_string()));
                };
                let scaled_start = (start_ms as i128 * 1000 / timebase_den as i128).max(0) as u64;
                let title = title.clone().unwrap_or_else(|| "Chapter".to_string());
                let mut chapter = Chapter::new(Timestamp::from_millis(scaled_start), title)?;
                if let Some(end_ms) = end {
                    let scaled_end = (end_ms as i128 * 1000 / timebase_den as i128).max(0) as u64;
                    let end_ts = Timestamp::from_millis(scaled_end);
                    if end_ts > chapter.start() {
                        chapter.set_end(Some(end_ts))?;
                    }
                }
                chapters.push(chapter);
            }
        };
    }

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line == "[CHAPTER]" {
            flush!();
            in_chapter = true;
            timebase_den = 1000;
            start = None;
            end = None;
            title = None;
            continue;
        }
        if line.starts_with('[') {
            flush!();
            in_chapter = false;
            continue;
        }
        if !in_chapter {
            continue;
        }
        if let Some(value) = line.strip_prefix("TIMEBASE=") {
            if let Some((_, den)) = value.split_once('/') {
                timebase_den = den.trim().parse().unwrap_or(1000);
            }
        } else if let Some(value) = line.strip_prefix("START=") {
            start = value.trim().parse().ok();
        } else if let Some(value) = line.strip_prefix("END=") {
            end = value.trim().parse().ok();
        } else if let Some(value) = line.strip_prefix("title=") {
            title = Some(value.to_string());
        }
    }
    flush!();

    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as `;FFMETADATA1` plus one `[CHAPTER]` block per
/// chapter, with `TIMEBASE=1/1000` so `START`/`END` are plain
/// millisecond integers.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for chapter in chapters.iter() {
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", chapter.start().as_millis()));
        if let Some(end) = chapter.end() {
            out.push_str(&format!("END={}\n", end.as_millis()));
        }
        out.push_str(&format!("title={}\n", chapter.title()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_chapters() {
        let input = "\
;FFMETADATA1
[CHAPTER]
TIMEBASE=1/1000
START=0
END=60000
title=Intro
[CHAPTER]
TIMEBASE=1/1000
START=60000
END=120000
title=Main
";
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[0].end(), Some(Timestamp::from_millis(60_000)));
        assert_eq!(list.as_slice()[1].title(), "Main");
    }

    #[test]
    fn round_trips_start_and_title() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        let text = emit(&list).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].start(), Timestamp::from_millis(0));
        assert_eq!(parsed.as_slice()[0].title(), "Intro");
    }
}
