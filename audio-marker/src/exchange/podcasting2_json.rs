//! Podcasting 2.0 chapters JSON exchange format (§4.6):
//! `{ "version": "1.2.0", "chapters": [{ "startTime": seconds, "title", "url", "img" }] }`.
//! Unlike Podlove JSON, start times are fractional seconds, not strings.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Chapter, ChapterList, Timestamp};

#[derive(Serialize, Deserialize)]
struct Document {
    version: String,
    chapters: Vec<Entry>,
}

#[derive(Serialize, Deserialize)]
struct Entry {
    #[serde(rename = "startTime")]
    start_time: f64,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    img: Option<String>,
}

/// Parses a Podcasting 2.0 chapters JSON document.
pub fn parse(input: &str) -> Result<ChapterList> {
    let doc: Document = serde_json::from_str(input)?;
    let mut chapters = Vec::with_capacity(doc.chapters.len());
    for entry in doc.chapters {
        let start = Timestamp::from_seconds(entry.start_time);
        let mut chapter = Chapter::new(start, entry.title)?;
        chapter.set_url(entry.url);
        chapters.push(chapter);
    }
    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as pretty-printed Podcasting 2.0 chapters JSON.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let doc = Document {
        version: "1.2.0".to_string(),
        chapters: chapters
            .iter()
            .map(|c| Entry {
                start_time: c.start().as_seconds(),
                title: c.title().to_string(),
                url: c.url().map(str::to_string),
                img: None,
            })
            .collect(),
    };
    let writer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(writer, serde_json::ser::PrettyFormatter::with_indent(b"  "));
    doc.serialize(&mut serializer)?;
    Ok(String::from_utf8(serializer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_seconds() {
        let input = r#"{"version":"1.2.0","chapters":[{"startTime":0,"title":"Opening"},{"startTime":300,"title":"End"}]}"#;
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].start(), Timestamp::from_millis(300_000));
    }

    #[test]
    fn round_trips_title_and_url() {
        let mut list = ChapterList::new();
        let mut chapter = Chapter::new(Timestamp::from_millis(1_500), "Intro").unwrap();
        chapter.set_url(Some("https://example.com".to_string()));
        list.append(chapter);
        let text = emit(&list).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].title(), "Intro");
        assert_eq!(parsed.as_slice()[0].start(), Timestamp::from_millis(1_500));
    }
}
