//! The Nero/QuickTime-style chapter track (§4.5 "Chapter track"): a text
//! track whose samples are `[u16 length][UTF-8 text]`, referenced by the
//! sound track via `tref/chap`, with start times derived from cumulative
//! sample durations in the track's timescale.

use crate::error::Result;
use crate::io::FileReader;
use crate::model::{Chapter, ChapterList, Timestamp};

use super::atom::Atom;
use super::stbl::{build_stbl, parse_sample_table};

/// The track ID this crate assigns newly authored chapter tracks.
pub const CHAPTER_TRACK_ID: u32 = 2;

pub(super) fn track_id(trak: &Atom) -> Option<u32> {
    let tkhd = trak.find("tkhd")?;
    // Full box: version(1) flags(3) then, for version 0, creation(4)
    // modification(4) track_id(4).
    let version = *tkhd.data.first()?;
    let offset = if version == 1 { 4 + 8 + 8 } else { 4 + 4 + 4 };
    let bytes = tkhd.data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn mdhd_timescale(trak: &Atom) -> Option<u32> {
    let mdhd = trak.find("mdia")?.find("mdhd")?;
    let version = *mdhd.data.first()?;
    let offset = if version == 1 { 4 + 8 + 8 } else { 4 + 4 + 4 };
    let bytes = mdhd.data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

/// Finds the track ID referenced by the sound track's `tref/chap` box.
fn referenced_chapter_track_id(moov: &Atom) -> Option<u32> {
    for trak in moov.find_all("trak") {
        if let Some(tref) = trak.find("tref") {
            if let Some(chap) = tref.find("chap") {
                if chap.data.len() >= 4 {
                    return Some(u32::from_be_bytes(chap.data[0..4].try_into().ok()?));
                }
            }
        }
    }
    None
}

/// Reads the chapter track's samples (if the sound track references one)
/// and reconstructs a [`ChapterList`] with start/end times derived from
/// the track's sample table.
pub fn read_chapters(moov: &Atom, file: &mut FileReader) -> Result<ChapterList> {
    let Some(chapter_id) = referenced_chapter_track_id(moov) else {
        return Ok(ChapterList::new());
    };
    let Some(trak) = moov.find_all("trak").find(|t| track_id(t) == Some(chapter_id)) else {
        return Ok(ChapterList::new());
    };
    let Some(timescale) = mdhd_timescale(trak) else {
        return Ok(ChapterList::new());
    };
    let Some(stbl) = trak.find("mdia").and_then(|m| m.find("minf")).and_then(|m| m.find("stbl")) else {
        return Ok(ChapterList::new());
    };

    let table = parse_sample_table(stbl, timescale)?;
    let mut chapters = Vec::with_capacity(table.samples.len());
    let mut cumulative: u64 = 0;
    for (offset, size, duration) in &table.samples {
        let bytes = file.read(*offset, *size as usize)?;
        let title = decode_sample_text(&bytes).unwrap_or_default();
        let start_ms = cumulative * 1000 / u64::from(timescale);
        let end_ms = (cumulative + u64::from(*duration)) * 1000 / u64::from(timescale);
        if let Ok(mut chapter) = Chapter::new(Timestamp::from_millis(start_ms), if title.is_empty() { " " } else { &title }) {
            if end_ms > start_ms {
                let _ = chapter.set_end(Some(Timestamp::from_millis(end_ms)));
            }
            chapters.push(chapter);
        }
        cumulative += u64::from(*duration);
    }

    Ok(ChapterList::from_vec(chapters))
}

fn decode_sample_text(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 {
        return None;
    }
    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let text = bytes.get(2..2 + len.min(bytes.len().saturating_sub(2)))?;
    String::from_utf8(text.to_vec()).ok()
}

fn encode_sample_text(title: &str) -> Vec<u8> {
    let text_bytes = title.as_bytes();
    let mut out = Vec::with_capacity(2 + text_bytes.len());
    out.extend_from_slice(&(text_bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(text_bytes);
    out
}

/// The raw sample bytes and per-sample `(size, duration)` for a chapter
/// track built from `chapters`, in the track's millisecond timescale.
/// `audio_duration` fills the final chapter's implied duration the same
/// way [`crate::model::ChapterList::with_calculated_end_times`] does.
pub fn encode_chapter_samples(chapters: &ChapterList, audio_duration: Timestamp) -> (Vec<u8>, Vec<u32>, Vec<u32>) {
    const TIMESCALE: u32 = 1000; // milliseconds

    let filled = chapters.with_calculated_end_times(audio_duration);
    let mut blob = Vec::new();
    let mut sizes = Vec::new();
    let mut durations = Vec::new();

    for chapter in filled.iter() {
        let sample = encode_sample_text(chapter.title());
        sizes.push(sample.len() as u32);
        let end = chapter.end().unwrap_or(chapter.start());
        let duration_ms = end.as_millis().saturating_sub(chapter.start().as_millis()).max(1);
        durations.push(duration_ms as u32);
        blob.extend_from_slice(&sample);
    }

    (blob, sizes, durations)
}

/// Builds the chapter `trak` atom. `offsets` are absolute file offsets
/// for each sample, already accounting for where the samples landed in
/// the rebuilt `mdat`.
pub fn build_chapter_trak(sizes: &[u32], durations: &[u32], offsets: &[u64], use_co64: bool) -> Atom {
    const TIMESCALE: u32 = 1000;
    let duration_total: u32 = durations.iter().sum();

    let tkhd = build_tkhd(CHAPTER_TRACK_ID, duration_total);
    let mdhd = build_mdhd(TIMESCALE, duration_total);
    let hdlr = build_hdlr(b"text", "Chapters");
    let stbl = build_stbl("text", sizes, durations, offsets, use_co64);
    let minf = Atom::container("minf", Vec::new(), vec![stbl]);
    let mdia = Atom::container("mdia", Vec::new(), vec![mdhd, hdlr, minf]);

    Atom::container("trak", Vec::new(), vec![tkhd, mdia])
}

/// Builds the `tref/chap` box a sound track needs to reference the
/// chapter track by ID.
pub fn build_chapter_reference(chapter_track_id: u32) -> Atom {
    let chap = Atom::leaf("chap", chapter_track_id.to_be_bytes().to_vec());
    Atom::container("tref", Vec::new(), vec![chap])
}

pub(super) fn build_tkhd(track_id: u32, duration: u32) -> Atom {
    let mut data = vec![0u8, 0, 0, 0]; // version 0, flags = 0 (disabled track; chapter tracks are typically hidden)
    data.extend_from_slice(&0u32.to_be_bytes()); // creation_time
    data.extend_from_slice(&0u32.to_be_bytes()); // modification_time
    data.extend_from_slice(&track_id.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes()); // reserved
    data.extend_from_slice(&duration.to_be_bytes());
    data.extend_from_slice(&[0u8; 8]); // reserved
    data.extend_from_slice(&0u16.to_be_bytes()); // layer
    data.extend_from_slice(&0u16.to_be_bytes()); // alternate_group
    data.extend_from_slice(&0u16.to_be_bytes()); // volume
    data.extend_from_slice(&[0u8; 2]); // reserved
    // unity matrix
    for v in [0x0001_0000i32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    data.extend_from_slice(&0u32.to_be_bytes()); // width
    data.extend_from_slice(&0u32.to_be_bytes()); // height
    Atom::leaf("tkhd", data)
}

pub(super) fn build_mdhd(timescale: u32, duration: u32) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    data.extend_from_slice(&0u32.to_be_bytes()); // creation_time
    data.extend_from_slice(&0u32.to_be_bytes()); // modification_time
    data.extend_from_slice(&timescale.to_be_bytes());
    data.extend_from_slice(&duration.to_be_bytes());
    data.extend_from_slice(&0x55C4u16.to_be_bytes()); // language "und"
    data.extend_from_slice(&0u16.to_be_bytes()); // quality
    Atom::leaf("mdhd", data)
}

pub(super) fn build_hdlr(subtype: &[u8; 4], name: &str) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    data.extend_from_slice(&[0, 0, 0, 0]); // component_type
    data.extend_from_slice(subtype);
    data.extend_from_slice(&[0u8; 12]); // reserved
    data.extend_from_slice(name.as_bytes());
    data.push(0);
    Atom::leaf("hdlr", data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_sample_text() {
        let sample = encode_sample_text("Intro");
        assert_eq!(decode_sample_text(&sample).as_deref(), Some("Intro"));
    }

    #[test]
    fn chapter_samples_durations_match_boundaries() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        list.append(Chapter::new(Timestamp::from_millis(60_000), "Main").unwrap());
        let (_, sizes, durations) = encode_chapter_samples(&list, Timestamp::from_millis(120_000));
        assert_eq!(sizes.len(), 2);
        assert_eq!(durations, vec![60_000, 60_000]);
    }
}
