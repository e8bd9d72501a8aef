//! `CHAP`/`CTOC` chapter tree parse and emit (§4.4).

use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::Result;
use crate::model::{Artwork, Chapter, ChapterList, Timestamp};

use super::frame::{self, read_frames, write_frame, RawFrame, TextEncoding};

/// A parsed `CHAP` frame, before being folded into a [`Chapter`].
struct ParsedChap {
    element_id: String,
    chapter: Chapter,
}

/// Decodes every `CHAP`/`CTOC` pair in `frames` into an ordered
/// [`ChapterList`]. CTOC's child-element-id list determines order when a
/// top-level CTOC is present; otherwise chapters keep first-seen order.
pub fn decode_chapters(frames: &[RawFrame], strict: bool) -> Result<ChapterList> {
    let mut parsed: Vec<ParsedChap> = Vec::new();
    let mut order: Option<Vec<String>> = None;

    for frame in frames {
        match frame.id.as_str() {
            "CHAP" => {
                if let Some(p) = decode_chap(&frame.data, strict)? {
                    parsed.push(p);
                }
            },
            "CTOC" => {
                if order.is_none() {
                    order = decode_ctoc_order(&frame.data, strict)?;
                }
            },
            _ => {},
        }
    }

    if let Some(order) = order {
        parsed.sort_by_key(|p| order.iter().position(|id| id == &p.element_id).unwrap_or(usize::MAX));
    }

    Ok(ChapterList::from_vec(parsed.into_iter().map(|p| p.chapter).collect()))
}

fn decode_chap(data: &[u8], strict: bool) -> Result<Option<ParsedChap>> {
    let mut reader = BinaryReader::new(data);
    let element_id = match reader.read_latin1_nul() {
        Ok(s) => s,
        Err(e) => {
            if strict {
                return Err(e);
            }
            return Ok(None);
        },
    };

    let read_times = (|| -> Result<(u32, u32, u32, u32)> {
        let start_ms = reader.read_u32()?;
        let end_ms = reader.read_u32()?;
        let start_offset = reader.read_u32()?;
        let end_offset = reader.read_u32()?;
        Ok((start_ms, end_ms, start_offset, end_offset))
    })();

    let (start_ms, end_ms, _start_offset, _end_offset) = match read_times {
        Ok(t) => t,
        Err(e) => {
            if strict {
                return Err(e);
            }
            return Ok(None);
        },
    };

    let sub_frames = if reader.remaining() > 0 {
        let rest = reader.read_bytes(reader.remaining() as usize)?;
        read_frames(rest, 3, strict)?
    } else {
        Vec::new()
    };

    let title = sub_frames
        .iter()
        .find(|f| f.id == "TIT2")
        .and_then(|f| decode_simple_text(&f.data).ok())
        .unwrap_or_else(|| element_id.clone());

    let mut chapter = match Chapter::new(Timestamp::from_millis(u64::from(start_ms)), title) {
        Ok(c) => c,
        Err(e) => {
            if strict {
                return Err(e);
            }
            return Ok(None);
        },
    };

    if end_ms as u64 > start_ms as u64 {
        let _ = chapter.set_end(Some(Timestamp::from_millis(u64::from(end_ms))));
    }

    if let Some(wxxx) = sub_frames.iter().find(|f| f.id == "WXXX") {
        if let Ok((_, url)) = decode_wxxx(&wxxx.data) {
            chapter.set_url(Some(url));
        }
    }

    if let Some(apic) = sub_frames.iter().find(|f| f.id == "APIC") {
        if let Ok((_, _, image_bytes)) = decode_apic(&apic.data) {
            if let Ok(art) = Artwork::from_bytes(image_bytes) {
                chapter.set_artwork(Some(art));
            }
        }
    }

    Ok(Some(ParsedChap { element_id, chapter }))
}

fn decode_ctoc_order(data: &[u8], strict: bool) -> Result<Option<Vec<String>>> {
    let mut reader = BinaryReader::new(data);
    if reader.read_latin1_nul().is_err() {
        return if strict { Err(crate::error::Error::InvalidTag { offset: 0, reason: "malformed CTOC".to_string() }) } else { Ok(None) };
    }
    let _flags = reader.read_u8()?;
    let entry_count = reader.read_u8()?;
    let mut ids = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        match reader.read_latin1_nul() {
            Ok(id) => ids.push(id),
            Err(e) => {
                if strict {
                    return Err(e);
                }
                return Ok(None);
            },
        }
    }
    Ok(Some(ids))
}

fn decode_simple_text(data: &[u8]) -> Result<String> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let encoding = TextEncoding::from_byte_checked(encoding_byte).unwrap_or(TextEncoding::Latin1);
    let raw = frame::read_encoded_string_rest(&mut reader, encoding)?;
    Ok(frame::first_value_only(&raw).to_string())
}

fn decode_wxxx(data: &[u8]) -> Result<(String, String)> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let encoding = TextEncoding::from_byte_checked(encoding_byte).unwrap_or(TextEncoding::Latin1);
    let description = frame::read_encoded_string_nul(&mut reader, encoding)?;
    let url = reader.read_latin1(reader.remaining() as usize)?;
    Ok((description, url))
}

fn decode_apic(data: &[u8]) -> Result<(String, u8, Vec<u8>)> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let encoding = TextEncoding::from_byte_checked(encoding_byte).unwrap_or(TextEncoding::Latin1);
    let mime = reader.read_latin1_nul()?;
    let pic_type = reader.read_u8()?;
    let _description = frame::read_encoded_string_nul(&mut reader, encoding)?;
    let image = reader.read_bytes(reader.remaining() as usize)?.to_vec();
    Ok((mime, pic_type, image))
}

/// Emits `chapters` as one `CTOC` (top-level, ordered) plus one `CHAP`
/// frame per chapter, with synthetic element IDs `chpN`.
pub fn encode_chapters(chapters: &ChapterList, major_version: u8) -> Result<Vec<RawFrame>> {
    if chapters.is_empty() {
        return Ok(Vec::new());
    }

    let element_ids: Vec<String> = (0..chapters.len()).map(|i| format!("chp{i}")).collect();

    let mut out = Vec::with_capacity(chapters.len() + 1);

    let mut ctoc = BinaryWriter::new();
    ctoc.write_latin1_nul("toc");
    ctoc.write_u8(0b0000_0011); // top-level, ordered
    ctoc.write_u8(element_ids.len() as u8);
    for id in &element_ids {
        ctoc.write_latin1_nul(id);
    }
    out.push(RawFrame::new("CTOC", ctoc.into_bytes()));

    for (chapter, element_id) in chapters.iter().zip(element_ids.iter()) {
        out.push(encode_chap(chapter, element_id, major_version)?);
    }

    Ok(out)
}

fn encode_chap(chapter: &Chapter, element_id: &str, major_version: u8) -> Result<RawFrame> {
    let mut w = BinaryWriter::new();
    w.write_latin1_nul(element_id);
    w.write_u32(chapter.start().as_millis() as u32);
    w.write_u32(chapter.end().unwrap_or(chapter.start()).as_millis() as u32);
    w.write_u32(0xFFFF_FFFF); // start byte offset: none
    w.write_u32(0xFFFF_FFFF); // end byte offset: none

    let encoding = TextEncoding::default_for_version(major_version);
    let mut tit2 = BinaryWriter::new();
    tit2.write_u8(encoding.to_byte());
    frame::write_encoded_string_rest(&mut tit2, encoding, chapter.title());
    let tit2_frame = RawFrame::new("TIT2", tit2.into_bytes());
    write_frame(&mut w, &tit2_frame, major_version)?;

    if let Some(url) = chapter.url() {
        let mut wxxx = BinaryWriter::new();
        wxxx.write_u8(TextEncoding::Latin1.to_byte());
        wxxx.write_u8(0x00); // empty description, NUL-terminated
        wxxx.write_latin1(url);
        let wxxx_frame = RawFrame::new("WXXX", wxxx.into_bytes());
        write_frame(&mut w, &wxxx_frame, major_version)?;
    }

    if let Some(art) = chapter.artwork() {
        let mut apic = BinaryWriter::new();
        apic.write_u8(TextEncoding::Latin1.to_byte());
        apic.write_latin1_nul(art.format().mime_type());
        apic.write_u8(0x00); // picture type: Other
        apic.write_u8(0x00); // empty description, NUL-terminated
        apic.write_bytes(art.data());
        let apic_frame = RawFrame::new("APIC", apic.into_bytes());
        write_frame(&mut w, &apic_frame, major_version)?;
    }

    Ok(RawFrame::new("CHAP", w.into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapters_round_trip_through_chap_ctoc() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        list.append(Chapter::new(Timestamp::from_millis(60_000), "Main").unwrap());

        let frames = encode_chapters(&list, 3).unwrap();
        assert_eq!(frames.len(), 3); // CTOC + 2 CHAP

        let decoded = decode_chapters(&frames, true).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.as_slice()[0].title(), "Intro");
        assert_eq!(decoded.as_slice()[0].start().as_millis(), 0);
        assert_eq!(decoded.as_slice()[1].title(), "Main");
        assert_eq!(decoded.as_slice()[1].start().as_millis(), 60_000);
    }

    #[test]
    fn ctoc_order_overrides_frame_order() {
        let mut chap_a = BinaryWriter::new();
        chap_a.write_latin1_nul("b");
        chap_a.write_u32(60_000);
        chap_a.write_u32(120_000);
        chap_a.write_u32(0xFFFF_FFFF);
        chap_a.write_u32(0xFFFF_FFFF);
        let tit2 = {
            let mut t = BinaryWriter::new();
            t.write_u8(0);
            t.write_latin1("Second");
            RawFrame::new("TIT2", t.into_bytes())
        };
        write_frame(&mut chap_a, &tit2, 3).unwrap();

        let mut chap_b = BinaryWriter::new();
        chap_b.write_latin1_nul("a");
        chap_b.write_u32(0);
        chap_b.write_u32(60_000);
        chap_b.write_u32(0xFFFF_FFFF);
        chap_b.write_u32(0xFFFF_FFFF);
        let tit2b = {
            let mut t = BinaryWriter::new();
            t.write_u8(0);
            t.write_latin1("First");
            RawFrame::new("TIT2", t.into_bytes())
        };
        write_frame(&mut chap_b, &tit2b, 3).unwrap();

        let mut ctoc = BinaryWriter::new();
        ctoc.write_latin1_nul("toc");
        ctoc.write_u8(0b11);
        ctoc.write_u8(2);
        ctoc.write_latin1_nul("a");
        ctoc.write_latin1_nul("b");

        let frames = vec![
            RawFrame::new("CHAP", chap_a.into_bytes()),
            RawFrame::new("CTOC", ctoc.into_bytes()),
            RawFrame::new("CHAP", chap_b.into_bytes()),
        ];

        let decoded = decode_chapters(&frames, true).unwrap();
        assert_eq!(decoded.as_slice()[0].title(), "First");
        assert_eq!(decoded.as_slice()[1].title(), "Second");
    }
}
