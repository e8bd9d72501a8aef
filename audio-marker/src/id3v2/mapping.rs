//! Frame <-> [`AudioMetadata`] field mapping (§4.4 field-mapping table).

use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::Result;
use crate::model::{Artwork, AudioMetadata, LyricLine, LyricsContentType, PrivateData, SynchronizedLyrics, Timestamp, UniqueFileIdentifier};

use super::frame::{self, RawFrame, TextEncoding};

const TEXT_FRAME_IDS: &[(&str, fn(&mut AudioMetadata, String))] = &[
    ("TIT2", |m, v| m.title = Some(v)),
    ("TPE1", |m, v| m.artist = Some(v)),
    ("TALB", |m, v| m.album = Some(v)),
    ("TCON", |m, v| m.genre = Some(v)),
    ("TCOM", |m, v| m.composer = Some(v)),
    ("TPE2", |m, v| m.album_artist = Some(v)),
    ("TPUB", |m, v| m.publisher = Some(v)),
    ("TCOP", |m, v| m.copyright = Some(v)),
    ("TENC", |m, v| m.encoder = Some(v)),
    ("TKEY", |m, v| m.key = Some(v)),
    ("TLAN", |m, v| m.language = Some(v)),
    ("TSRC", |m, v| m.isrc = Some(v)),
];

const URL_FRAME_IDS: &[(&str, fn(&mut AudioMetadata, String))] = &[
    ("WOAR", |m, v| m.artist_url = Some(v)),
    ("WOAS", |m, v| m.audio_source_url = Some(v)),
    ("WOAF", |m, v| m.audio_file_url = Some(v)),
    ("WPUB", |m, v| m.publisher_url = Some(v)),
    ("WCOM", |m, v| m.commercial_url = Some(v)),
];

/// Folds every known frame in `frames` into `metadata`; frames with no
/// field mapping (including ones this crate never learned about) are
/// returned as the unknown-frame list, in original order.
pub fn frames_to_metadata(frames: Vec<RawFrame>, strict: bool) -> Result<(AudioMetadata, Vec<RawFrame>)> {
    let mut metadata = AudioMetadata::new();
    let mut unknown = Vec::new();

    for frame in frames {
        // CHAP/CTOC are handled by `chapters.rs` from the original frame
        // list, not threaded through here; skip them so they aren't also
        // kept as "unknown".
        if frame.id == "CHAP" || frame.id == "CTOC" {
            continue;
        }

        if let Some((_, setter)) = TEXT_FRAME_IDS.iter().find(|(id, _)| *id == frame.id) {
            match decode_text_frame(&frame.data) {
                Ok(Some(v)) => setter(&mut metadata, v),
                Ok(None) => {},
                Err(e) if strict => return Err(e),
                Err(_) => {},
            }
            continue;
        }

        if frame.id == "TYER" || frame.id == "TDRC" {
            if let Ok(Some(text)) = decode_text_frame(&frame.data) {
                if let Some(year) = parse_leading_year(&text) {
                    metadata.year = Some(year);
                }
            }
            continue;
        }

        if frame.id == "TRCK" {
            if let Ok(Some(text)) = decode_text_frame(&frame.data) {
                metadata.track_number = parse_number_pair(&text);
            }
            continue;
        }

        if frame.id == "TPOS" {
            if let Ok(Some(text)) = decode_text_frame(&frame.data) {
                metadata.disc_number = parse_number_pair(&text);
            }
            continue;
        }

        if frame.id == "TBPM" {
            if let Ok(Some(text)) = decode_text_frame(&frame.data) {
                metadata.bpm = text.trim().parse().ok();
            }
            continue;
        }

        if frame.id == "TCMP" {
            if let Ok(Some(text)) = decode_text_frame(&frame.data) {
                metadata.compilation = text.trim().parse::<u8>().ok().map(|v| v != 0);
            }
            continue;
        }

        if let Some((_, setter)) = URL_FRAME_IDS.iter().find(|(id, _)| *id == frame.id) {
            let mut reader = BinaryReader::new(&frame.data);
            if let Ok(url) = reader.read_latin1(reader.remaining() as usize) {
                setter(&mut metadata, url);
            }
            continue;
        }

        match frame.id.as_str() {
            "COMM" => {
                if let Ok(Some(text)) = decode_lang_described_text(&frame.data, strict) {
                    metadata.comment = Some(text);
                }
            },
            "USLT" => {
                if let Ok(Some(text)) = decode_lang_described_text(&frame.data, strict) {
                    metadata.unsynchronized_lyrics = Some(text);
                }
            },
            "WXXX" => {
                if let Ok(Some((label, url))) = decode_wxxx(&frame.data, strict) {
                    metadata.set_custom_url(label, url);
                }
            },
            "TXXX" => {
                if let Ok(Some((label, value))) = decode_txxx(&frame.data, strict) {
                    metadata.set_custom_text_field(label, value);
                }
            },
            "APIC" => {
                if let Ok(Some(art)) = decode_apic(&frame.data, strict) {
                    metadata.artwork = Some(art);
                }
            },
            "PRIV" => {
                if let Ok(Some(priv_data)) = decode_priv(&frame.data) {
                    metadata.private_data.push(priv_data);
                }
            },
            "UFID" => {
                if let Ok(Some(ufid)) = decode_ufid(&frame.data) {
                    metadata.unique_file_identifiers.push(ufid);
                }
            },
            "PCNT" => {
                metadata.play_count = decode_pcnt(&frame.data);
            },
            "POPM" => {
                if let Some(rating) = decode_popm(&frame.data) {
                    metadata.rating = Some(rating);
                }
            },
            "SYLT" => {
                if let Ok(Some(lyrics)) = decode_sylt(&frame.data, strict) {
                    metadata.synchronized_lyrics.push(lyrics);
                }
            },
            _ => unknown.push(frame),
        }
    }

    Ok((metadata, unknown))
}

fn decode_text_frame(data: &[u8]) -> Result<Option<String>> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let Some(encoding) = TextEncoding::from_byte_checked(encoding_byte) else {
        return Ok(None);
    };
    let raw = frame::read_encoded_string_rest(&mut reader, encoding)?;
    Ok(Some(frame::first_value_only(&raw).to_string()))
}

fn parse_leading_year(text: &str) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 4 {
        digits[..4].parse().ok()
    } else {
        None
    }
}

fn parse_number_pair(text: &str) -> Option<u32> {
    text.split('/').next()?.trim().parse().ok()
}

fn decode_lang_described_text(data: &[u8], strict: bool) -> Result<Option<String>> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let Some(encoding) = TextEncoding::from_byte_checked(encoding_byte) else {
        return Ok(None);
    };
    if reader.remaining() < 3 {
        return if strict { Err(crate::error::Error::InvalidTag { offset: reader.position(), reason: "COMM/USLT missing language".to_string() }) } else { Ok(None) };
    }
    let _language = reader.read_bytes(3)?;
    let _descriptor = frame::read_encoded_string_nul(&mut reader, encoding)?;
    let text = frame::read_encoded_string_rest(&mut reader, encoding)?;
    Ok(Some(text))
}

fn decode_wxxx(data: &[u8], strict: bool) -> Result<Option<(String, String)>> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let Some(encoding) = TextEncoding::from_byte_checked(encoding_byte) else {
        return Ok(None);
    };
    let description = match frame::read_encoded_string_nul(&mut reader, encoding) {
        Ok(d) => d,
        Err(e) => return if strict { Err(e) } else { Ok(None) },
    };
    let url = reader.read_latin1(reader.remaining() as usize)?;
    Ok(Some((description, url)))
}

fn decode_txxx(data: &[u8], strict: bool) -> Result<Option<(String, String)>> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let Some(encoding) = TextEncoding::from_byte_checked(encoding_byte) else {
        return Ok(None);
    };
    let description = match frame::read_encoded_string_nul(&mut reader, encoding) {
        Ok(d) => d,
        Err(e) => return if strict { Err(e) } else { Ok(None) },
    };
    let value = frame::read_encoded_string_rest(&mut reader, encoding)?;
    Ok(Some((description, value)))
}

fn decode_apic(data: &[u8], strict: bool) -> Result<Option<Artwork>> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let Some(encoding) = TextEncoding::from_byte_checked(encoding_byte) else {
        return Ok(None);
    };
    let _mime = reader.read_latin1_nul()?;
    let _pic_type = reader.read_u8()?;
    let _description = match frame::read_encoded_string_nul(&mut reader, encoding) {
        Ok(d) => d,
        Err(e) => return if strict { Err(e) } else { Ok(None) },
    };
    let image = reader.read_bytes(reader.remaining() as usize)?.to_vec();
    match Artwork::from_bytes(image) {
        Ok(art) => Ok(Some(art)),
        Err(_) => Ok(None), // unsupported mime type: discard on read, per spec.md
    }
}

fn decode_priv(data: &[u8]) -> Result<Option<PrivateData>> {
    let mut reader = BinaryReader::new(data);
    let owner = reader.read_latin1_nul()?;
    let payload = reader.read_bytes(reader.remaining() as usize)?.to_vec();
    Ok(Some(PrivateData { owner, data: payload }))
}

fn decode_ufid(data: &[u8]) -> Result<Option<UniqueFileIdentifier>> {
    let mut reader = BinaryReader::new(data);
    let owner = reader.read_latin1_nul()?;
    let identifier = reader.read_bytes(reader.remaining() as usize)?.to_vec();
    Ok(Some(UniqueFileIdentifier { owner, identifier }))
}

fn decode_pcnt(data: &[u8]) -> Option<u64> {
    if data.len() < 4 {
        return None;
    }
    let mut value: u64 = 0;
    for &b in data {
        value = (value << 8) | u64::from(b);
    }
    Some(value)
}

fn decode_popm(data: &[u8]) -> Option<u8> {
    let mut reader = BinaryReader::new(data);
    let _email = reader.read_latin1_nul().ok()?;
    reader.read_u8().ok()
}

fn decode_sylt(data: &[u8], strict: bool) -> Result<Option<SynchronizedLyrics>> {
    let mut reader = BinaryReader::new(data);
    let encoding_byte = reader.read_u8()?;
    let Some(encoding) = TextEncoding::from_byte_checked(encoding_byte) else {
        return Ok(None);
    };
    if reader.remaining() < 5 {
        return if strict { Err(crate::error::Error::InvalidTag { offset: reader.position(), reason: "SYLT header truncated".to_string() }) } else { Ok(None) };
    }
    let language = reader.read_latin1(3)?;
    let _timestamp_format = reader.read_u8()?;
    let content_type_byte = reader.read_u8()?;
    let content_type = content_type_from_byte(content_type_byte);
    let descriptor = frame::read_encoded_string_nul(&mut reader, encoding)?;

    let mut lines = Vec::new();
    while reader.remaining() >= 4 {
        let text = match frame::read_encoded_string_nul(&mut reader, encoding) {
            Ok(t) => t,
            Err(_) => break,
        };
        let Ok(timestamp_ms) = reader.read_u32() else { break };
        lines.push(LyricLine::new(Timestamp::from_millis(u64::from(timestamp_ms)), text));
    }

    let mut sync = SynchronizedLyrics::new(language, content_type, lines);
    if !descriptor.is_empty() {
        sync.set_descriptor(Some(descriptor));
    }
    Ok(Some(sync))
}

fn content_type_from_byte(b: u8) -> LyricsContentType {
    match b {
        1 => LyricsContentType::TextTranscription,
        2 => LyricsContentType::MovementOrPart,
        3 => LyricsContentType::Events,
        4 => LyricsContentType::Chord,
        5 => LyricsContentType::Trivia,
        _ => LyricsContentType::Lyrics,
    }
}

fn content_type_to_byte(t: LyricsContentType) -> u8 {
    match t {
        LyricsContentType::Lyrics => 0,
        LyricsContentType::TextTranscription => 1,
        LyricsContentType::MovementOrPart => 2,
        LyricsContentType::Events => 3,
        LyricsContentType::Chord => 4,
        LyricsContentType::Trivia => 5,
    }
}

/// Emits frames for `metadata` in the stable order spec.md's write
/// algorithm documents: text frames, then TXXX, then URL frames, then
/// APIC, then COMM/USLT/SYLT, then PRIV/UFID/PCNT/POPM.
pub fn metadata_to_frames(metadata: &AudioMetadata, major_version: u8) -> Vec<RawFrame> {
    let encoding = TextEncoding::default_for_version(major_version);
    let mut out = Vec::new();

    macro_rules! text_frame {
        ($id:expr, $value:expr) => {
            if let Some(v) = $value {
                out.push(encode_text_frame($id, v, encoding));
            }
        };
    }

    text_frame!("TIT2", &metadata.title);
    text_frame!("TPE1", &metadata.artist);
    text_frame!("TALB", &metadata.album);
    text_frame!("TCON", &metadata.genre);
    text_frame!("TCOM", &metadata.composer);
    text_frame!("TPE2", &metadata.album_artist);
    text_frame!("TPUB", &metadata.publisher);
    text_frame!("TCOP", &metadata.copyright);
    text_frame!("TENC", &metadata.encoder);
    text_frame!("TKEY", &metadata.key);
    text_frame!("TLAN", &metadata.language);
    text_frame!("TSRC", &metadata.isrc);

    if let Some(year) = metadata.year {
        let id = if major_version >= 4 { "TDRC" } else { "TYER" };
        out.push(encode_text_frame(id, &year.to_string(), encoding));
    }
    if let Some(track) = metadata.track_number {
        out.push(encode_text_frame("TRCK", &track.to_string(), encoding));
    }
    if let Some(disc) = metadata.disc_number {
        out.push(encode_text_frame("TPOS", &disc.to_string(), encoding));
    }
    if let Some(bpm) = metadata.bpm {
        out.push(encode_text_frame("TBPM", &bpm.to_string(), encoding));
    }
    if let Some(compilation) = metadata.compilation {
        out.push(encode_text_frame("TCMP", if compilation { "1" } else { "0" }, encoding));
    }

    for (label, value) in &metadata.custom_text_fields {
        out.push(encode_txxx(label, value, encoding));
    }

    macro_rules! url_frame {
        ($id:expr, $value:expr) => {
            if let Some(v) = $value {
                out.push(encode_url_frame($id, v));
            }
        };
    }
    url_frame!("WOAR", &metadata.artist_url);
    url_frame!("WOAS", &metadata.audio_source_url);
    url_frame!("WOAF", &metadata.audio_file_url);
    url_frame!("WPUB", &metadata.publisher_url);
    url_frame!("WCOM", &metadata.commercial_url);
    for (label, url) in &metadata.custom_urls {
        out.push(encode_wxxx(label, url, encoding));
    }

    if let Some(art) = &metadata.artwork {
        out.push(encode_apic(art, encoding));
    }

    if let Some(comment) = &metadata.comment {
        out.push(encode_lang_described_text("COMM", comment, encoding));
    }
    if let Some(lyrics) = &metadata.unsynchronized_lyrics {
        out.push(encode_lang_described_text("USLT", lyrics, encoding));
    }
    for sync in &metadata.synchronized_lyrics {
        out.push(encode_sylt(sync, encoding));
    }

    for priv_data in &metadata.private_data {
        out.push(encode_priv(priv_data));
    }
    for ufid in &metadata.unique_file_identifiers {
        out.push(encode_ufid(ufid));
    }
    if let Some(count) = metadata.play_count {
        out.push(RawFrame::new("PCNT", count.to_be_bytes().to_vec()));
    }
    if let Some(rating) = metadata.rating {
        let mut w = BinaryWriter::new();
        w.write_latin1_nul("");
        w.write_u8(rating);
        out.push(RawFrame::new("POPM", w.into_bytes()));
    }

    out
}

fn encode_text_frame(id: &str, value: &str, encoding: TextEncoding) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_u8(encoding.to_byte());
    frame::write_encoded_string_rest(&mut w, encoding, value);
    RawFrame::new(id, w.into_bytes())
}

fn encode_url_frame(id: &str, value: &str) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_latin1(value);
    RawFrame::new(id, w.into_bytes())
}

fn encode_txxx(label: &str, value: &str, encoding: TextEncoding) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_u8(encoding.to_byte());
    frame::write_encoded_string_nul(&mut w, encoding, label);
    frame::write_encoded_string_rest(&mut w, encoding, value);
    RawFrame::new("TXXX", w.into_bytes())
}

fn encode_wxxx(label: &str, url: &str, encoding: TextEncoding) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_u8(encoding.to_byte());
    frame::write_encoded_string_nul(&mut w, encoding, label);
    w.write_latin1(url);
    RawFrame::new("WXXX", w.into_bytes())
}

fn encode_apic(art: &Artwork, encoding: TextEncoding) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_u8(encoding.to_byte());
    w.write_latin1_nul(art.format().mime_type());
    w.write_u8(0x00); // picture type: Other
    frame::write_encoded_string_nul(&mut w, encoding, "");
    w.write_bytes(art.data());
    RawFrame::new("APIC", w.into_bytes())
}

fn encode_lang_described_text(id: &str, text: &str, encoding: TextEncoding) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_u8(encoding.to_byte());
    w.write_bytes(b"eng");
    frame::write_encoded_string_nul(&mut w, encoding, "");
    frame::write_encoded_string_rest(&mut w, encoding, text);
    RawFrame::new(id, w.into_bytes())
}

fn encode_priv(p: &PrivateData) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_latin1_nul(&p.owner);
    w.write_bytes(&p.data);
    RawFrame::new("PRIV", w.into_bytes())
}

fn encode_ufid(u: &UniqueFileIdentifier) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_latin1_nul(&u.owner);
    w.write_bytes(&u.identifier);
    RawFrame::new("UFID", w.into_bytes())
}

fn encode_sylt(sync: &SynchronizedLyrics, encoding: TextEncoding) -> RawFrame {
    let mut w = BinaryWriter::new();
    w.write_u8(encoding.to_byte());
    w.write_latin1(&format!("{:0<3}", sync.language()));
    w.write_u8(2); // timestamp format: milliseconds
    w.write_u8(content_type_to_byte(sync.content_type()));
    frame::write_encoded_string_nul(&mut w, encoding, sync.descriptor().unwrap_or(""));
    for line in sync.lines() {
        frame::write_encoded_string_nul(&mut w, encoding, line.text());
        w.write_u32(line.time().as_millis() as u32);
    }
    RawFrame::new("SYLT", w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_round_trips() {
        let mut meta = AudioMetadata::new();
        meta.title = Some("My Song".to_string());
        let frames = metadata_to_frames(&meta, 3);
        let (decoded, unknown) = frames_to_metadata(frames, true).unwrap();
        assert_eq!(decoded.title.as_deref(), Some("My Song"));
        assert!(unknown.is_empty());
    }

    #[test]
    fn compilation_flag_round_trips() {
        let mut meta = AudioMetadata::new();
        meta.compilation = Some(true);
        let frames = metadata_to_frames(&meta, 3);
        let frame = frames.iter().find(|f| f.id == "TCMP").unwrap();
        let (decoded, unknown) = frames_to_metadata(vec![frame.clone()], true).unwrap();
        assert_eq!(decoded.compilation, Some(true));
        assert!(unknown.is_empty());

        let mut not_compiled = AudioMetadata::new();
        not_compiled.compilation = Some(false);
        let frames = metadata_to_frames(&not_compiled, 3);
        let (decoded, _) = frames_to_metadata(frames, true).unwrap();
        assert_eq!(decoded.compilation, Some(false));
    }

    #[test]
    fn year_and_track_round_trip() {
        let mut meta = AudioMetadata::new();
        meta.year = Some(2003);
        meta.track_number = Some(7);
        let frames_v3 = metadata_to_frames(&meta, 3);
        assert!(frames_v3.iter().any(|f| f.id == "TYER"));
        let (decoded, _) = frames_to_metadata(frames_v3, true).unwrap();
        assert_eq!(decoded.year, Some(2003));
        assert_eq!(decoded.track_number, Some(7));

        let frames_v4 = metadata_to_frames(&meta, 4);
        assert!(frames_v4.iter().any(|f| f.id == "TDRC"));
    }

    #[test]
    fn track_with_total_ignores_total() {
        let frame = encode_text_frame("TRCK", "3/12", TextEncoding::Latin1);
        let (decoded, _) = frames_to_metadata(vec![frame], true).unwrap();
        assert_eq!(decoded.track_number, Some(3));
    }

    #[test]
    fn custom_text_and_url_round_trip() {
        let mut meta = AudioMetadata::new();
        meta.set_custom_text_field("mood", "upbeat");
        meta.set_custom_url("homepage", "https://example.com");
        let frames = metadata_to_frames(&meta, 4);
        let (decoded, _) = frames_to_metadata(frames, true).unwrap();
        assert_eq!(decoded.custom_text_field("mood"), Some("upbeat"));
        assert_eq!(decoded.custom_url("homepage"), Some("https://example.com"));
    }

    #[test]
    fn unknown_frames_are_preserved() {
        let frames = vec![RawFrame::new("XXXX", vec![1, 2, 3])];
        let (_, unknown) = frames_to_metadata(frames, true).unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].id, "XXXX");
    }

    #[test]
    fn synchronized_lyrics_round_trip() {
        let mut meta = AudioMetadata::new();
        meta.synchronized_lyrics.push(SynchronizedLyrics::new(
            "eng",
            LyricsContentType::Lyrics,
            vec![
                LyricLine::new(Timestamp::from_millis(0), "hello"),
                LyricLine::new(Timestamp::from_millis(1000), "world"),
            ],
        ));
        let frames = metadata_to_frames(&meta, 3);
        let (decoded, _) = frames_to_metadata(frames, true).unwrap();
        assert_eq!(decoded.synchronized_lyrics.len(), 1);
        let lyrics = &decoded.synchronized_lyrics[0];
        assert_eq!(lyrics.lines().len(), 2);
        assert_eq!(lyrics.lines()[1].text(), "world");
    }
}
