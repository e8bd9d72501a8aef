//! Cue sheet chapter exchange format (§4.6): `TRACK nn AUDIO` / `TITLE
//! "…"` / `INDEX 01 MM:SS:FF` with 75 frames per second, the convention
//! CD authoring tools use for track boundaries.

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, Timestamp};

const FRAMES_PER_SECOND: u64 = 75;

/// Parses `TRACK`/`TITLE`/`INDEX 01` triples into chapters, quantising
/// `INDEX 01 MM:SS:FF` to milliseconds via the 75 frames/sec convention.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut chapters = Vec::new();
    let mut pending_title: Option<String> = None;
    let mut in_track = false;

    for line in input.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("TRACK ") {
            let _ = rest;
            in_track = true;
            pending_title = None;
        } else if in_track && line.starts_with("TITLE ") {
            pending_title = Some(unquote(&line["TITLE ".len()..]));
        } else if in_track && (line.starts_with("INDEX 01 ") || line.starts_with("INDEX 1 ")) {
            let time_str = line.rsplit(' ').next().unwrap_or("");
            let start = parse_mmssff(time_str)?;
            let title = pending_title.clone().unwrap_or_else(|| "Track".to_string());
            chapters.push(Chapter::new(start, title)?);
            in_track = false;
        }
    }

    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as a minimal cue sheet: one `TRACK nn AUDIO` section
/// per chapter with `TITLE` and `INDEX 01` in `MM:SS:FF`.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    for (i, chapter) in chapters.iter().enumerate() {
        let track_no = i + 1;
        out.push_str(&format!("TRACK {track_no:02} AUDIO\n"));
        out.push_str(&format!("  TITLE \"{}\"\n", chapter.title()));
        out.push_str(&format!("  INDEX 01 {}\n", format_mmssff(chapter.start())));
    }
    Ok(out)
}

fn unquote(s: &str) -> String {
    s.trim().trim_matches('"').to_string()
}

fn parse_mmssff(input: &str) -> Result<Timestamp> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    let [mm, ss, ff] = parts.as_slice() else {
        return Err(Error::ExportError(format!("malformed cue sheet index: {input}")));
    };
    let minutes: u64 = mm.parse().map_err(|_| Error::ExportError(format!("bad minutes in {input}")))?;
    let seconds: u64 = ss.parse().map_err(|_| Error::ExportError(format!("bad seconds in {input}")))?;
    let frames: u64 = ff.parse().map_err(|_| Error::ExportError(format!("bad frames in {input}")))?;
    let total_frames = (minutes * 60 + seconds) * FRAMES_PER_SECOND + frames;
    Ok(Timestamp::from_frames(total_frames, FRAMES_PER_SECOND))
}

fn format_mmssff(ts: Timestamp) -> String {
    let total_frames = ts.as_millis() * FRAMES_PER_SECOND / 1000;
    let frames = total_frames % FRAMES_PER_SECOND;
    let total_seconds = total_frames / FRAMES_PER_SECOND;
    let seconds = total_seconds % 60;
    let minutes = total_seconds / 60;
    format!("{minutes:02}:{seconds:02}:{frames:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_title_index() {
        let input = "\
TRACK 01 AUDIO
  TITLE \"Intro\"
  INDEX 01 00:00:00
TRACK 02 AUDIO
  TITLE \"Main\"
  INDEX 01 01:00:00
";
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[0].title(), "Intro");
        assert_eq!(list.as_slice()[1].start(), Timestamp::from_millis(60_000));
    }

    #[test]
    fn quantises_to_75_frames_per_second() {
        let ts = Timestamp::from_millis(1000);
        let formatted = format_mmssff(ts);
        assert_eq!(formatted, "00:01:00");
        let parsed = parse_mmssff(&formatted).unwrap();
        assert_eq!(parsed.as_millis(), 1000);
    }
}
