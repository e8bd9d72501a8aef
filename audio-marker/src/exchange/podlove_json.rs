//! Podlove Simple Chapters JSON v1.2 exchange format (§4.6):
//! `{ "version": "1.2", "chapters": [{ "start", "title", "href", "image" }] }`.

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
    start: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

/// Parses a Podlove JSON document.
pub fn parse(input: &str) -> Result<ChapterList> {
    let doc: Document = serde_json::from_str(input)?;
    let mut chapters = Vec::with_capacity(doc.chapters.len());
    for entry in doc.chapters {
        let start = Timestamp::parse(&entry.start)?;
        let mut chapter = Chapter::new(start, entry.title)?;
        chapter.set_url(entry.href);
        chapters.push(chapter);
    }
    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as pretty-printed Podlove JSON (two-space indent).
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let doc = Document {
        version: "1.2".to_string(),
        chapters: chapters
            .iter()
            .map(|c| Entry {
                start: c.start().format(),
                title: c.title().to_string(),
                href: c.url().map(str::to_string),
                image: None,
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
    fn parses_two_chapters() {
        let input = r#"{"version":"1.2","chapters":[{"start":"00:00:00.000","title":"Opening"},{"start":"00:05:00.000","title":"End"}]}"#;
        let list = parse(input).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].start(), Timestamp::from_millis(300_000));
    }

    #[test]
    fn round_trips_title_and_href() {
        let mut list = ChapterList::new();
        let mut chapter = Chapter::new(Timestamp::from_millis(0), "Intro").unwrap();
        chapter.set_url(Some("https://example.com".to_string()));
        list.append(chapter);
        let text = emit(&list).unwrap();
        assert!(text.contains("  \""), "expected two-space pretty indent");
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].title(), "Intro");
        assert_eq!(parsed.as_slice()[0].url(), Some("https://example.com"));
    }
}
