//! Podlove Simple Chapters XML exchange format (§4.6): `<psc:chapters
//! xmlns:psc="http://podlove.org/simple-chapters"><psc:chapter start=
//! "HH:MM:SS.mmm" title="…" href="…" image="…"/>…</psc:chapters>`.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{Error, Result};
use crate::model::{Chapter, ChapterList, Timestamp};

const NAMESPACE: &str = "http://podlove.org/simple-chapters";

/// Parses every `<psc:chapter>` element.
pub fn parse(input: &str) -> Result<ChapterList> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut chapters = Vec::new();
    loop {
        match reader.read_event().map_err(|e| Error::ExportError(e.to_string()))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"chapter" => {
                let start = attr(&e, "start").ok_or_else(|| Error::ExportError("psc:chapter missing start".to_string()))?;
                let start = Timestamp::parse(&start)?;
                let title = attr(&e, "title").unwrap_or_else(|| "Chapter".to_string());
                let mut chapter = Chapter::new(start, title)?;
                if let Some(href) = attr(&e, "href") {
                    chapter.set_url(Some(href));
                }
                chapters.push(chapter);
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(ChapterList::from_vec(chapters))
}

/// Emits `chapters` as a Podlove Simple Chapters XML document.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<psc:chapters version=\"1.2\" xmlns:psc=\"{NAMESPACE}\">\n"));
    for chapter in chapters.iter() {
        out.push_str(&format!("  <psc:chapter start=\"{}\" title=\"{}\"", chapter.start().format(), escape(chapter.title())));
        if let Some(url) = chapter.url() {
            out.push_str(&format!(" href=\"{}\"", escape(url)));
        }
        out.push_str("/>\n");
    }
    out.push_str("</psc:chapters>\n");
    Ok(out)
}

fn attr(e: &quick_xml::events::BytesStart<'_>, local_name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        let name = String::from_utf8_lossy(a.key.as_ref()).to_string();
        if name == local_name || name.ends_with(&format!(":{local_name}")) {
            Some(String::from_utf8_lossy(&a.value).to_string())
        } else {
            None
        }
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chapter_with_href() {
        let input = format!(
            "<psc:chapters version=\"1.2\" xmlns:psc=\"{NAMESPACE}\">\n  <psc:chapter start=\"00:01:00.000\" title=\"Intro\" href=\"https://example.com\"/>\n</psc:chapters>"
        );
        let list = parse(&input).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].start(), Timestamp::from_millis(60_000));
        assert_eq!(list.as_slice()[0].url(), Some("https://example.com"));
    }

    #[test]
    fn round_trips_title_and_start() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(5_000), "Opening").unwrap());
        let text = emit(&list).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.as_slice()[0].title(), "Opening");
        assert_eq!(parsed.as_slice()[0].start(), Timestamp::from_millis(5_000));
    }
}
