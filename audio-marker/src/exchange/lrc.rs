//! LRC exchange format (§4.6, §4.5): `[mm:ss.xx] text` per line. The
//! compact form used both as a chapter-exchange format and as the
//! "smart storage" choice for a single-language, non-karaoke,
//! speaker-free MP4 lyrics track.

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, LyricLine, LyricsContentType, SynchronizedLyrics, Timestamp};

/// Parses `[mm:ss.xx] text` lines into a chapter list. `[ti:]`/`[ar:]`/etc.
/// metadata tag lines are ignored, per spec.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut chapters = Vec::new();
    for (time, text) in parse_lines(input)? {
        let title = if text.is_empty() { "Chapter".to_string() } else { text };
        chapters.push(Chapter::new(time, title)?);
    }
    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as one `[mm:ss.xx] title` line per chapter.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    for chapter in chapters.iter() {
        out.push_str(&format_tag(chapter.start()));
        out.push(' ');
        out.push_str(chapter.title());
        out.push('\n');
    }
    Ok(out)
}

/// Parses `[mm:ss.xx] text` lines into a single-language [`SynchronizedLyrics`]
/// track. Loses speaker labels and karaoke segments by construction — LRC
/// has no syntax for either.
pub fn parse_lyrics(input: &str) -> Result<SynchronizedLyrics> {
    let mut lines = Vec::new();
    for (time, text) in parse_lines(input)? {
        lines.push(LyricLine::new(time, text));
    }
    Ok(SynchronizedLyrics::new("und", LyricsContentType::Lyrics, lines))
}

/// Emits `lyrics` as `[mm:ss.xx] text` lines, dropping speakers/segments
/// (LRC cannot represent them).
pub fn emit_lyrics(lyrics: &SynchronizedLyrics) -> String {
    let mut out = String::new();
    for line in lyrics.lines() {
        out.push_str(&format_tag(line.time()));
        out.push(' ');
        out.push_str(line.text());
        out.push('\n');
    }
    out
}

fn parse_lines(input: &str) -> Result<Vec<(Timestamp, String)>> {
    let mut out = Vec::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || !line.starts_with('[') {
            continue;
        }
        let Some(close) = line.find(']') else { continue };
        let tag = &line[1..close];
        if tag.chars().take(2).any(|c| c.is_alphabetic()) {
            // Metadata tag like [ti:Title] or [ar:Artist] — ignored on parse.
            continue;
        }
        let time = parse_tag(tag)?;
        let text = line[close + 1..].trim().to_string();
        out.push((time, text));
    }
    Ok(out)
}

fn parse_tag(tag: &str) -> Result<Timestamp> {
    let (mm, rest) = tag.split_once(':').ok_or_else(|| Error::ExportError(format!("malformed LRC tag [{tag}]")))?;
    let minutes: u64 = mm.parse().map_err(|_| Error::ExportError(format!("bad minutes in [{tag}]")))?;
    let seconds: f64 = rest.parse().map_err(|_| Error::ExportError(format!("bad seconds in [{tag}]")))?;
    Ok(Timestamp::from_seconds(minutes as f64 * 60.0 + seconds))
}

fn format_tag(ts: Timestamp) -> String {
    let total_ms = ts.as_millis();
    let centis = (total_ms % 1000) / 10;
    let total_secs = total_ms / 1000;
    let seconds = total_secs % 60;
    let minutes = total_secs / 60;
    format!("[{minutes:02}:{seconds:02}.{centis:02}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_ignores_metadata_tags() {
        let input = "[ti:My Song]\n[00:12.50] hello\n[01:00.00] world\n";
        let lyrics = parse_lyrics(input).unwrap();
        assert_eq!(lyrics.lines().len(), 2);
        assert_eq!(lyrics.lines()[0].time(), Timestamp::from_millis(12_500));
        assert_eq!(lyrics.lines()[1].text(), "world");
    }

    #[test]
    fn lyrics_round_trip_without_karaoke_or_speakers() {
        let lines = vec![LyricLine::new(Timestamp::from_millis(1000), "hello"), LyricLine::new(Timestamp::from_millis(2000), "world")];
        let lyrics = SynchronizedLyrics::new("eng", LyricsContentType::Lyrics, lines);
        let text = emit_lyrics(&lyrics);
        let parsed = parse_lyrics(&text).unwrap();
        assert_eq!(parsed.lines().len(), 2);
        assert_eq!(parsed.lines()[0].time(), Timestamp::from_millis(1000));
        assert_eq!(parsed.lines()[1].text(), "world");
    }

    #[test]
    fn chapters_round_trip_start_and_title() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        let text = emit(&list).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].title(), "Intro");
    }
}
