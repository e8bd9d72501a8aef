//! Synchronized-lyrics text track (§4.5 "Synchronized lyrics"): a
//! subtitle track whose `hdlr` subtype is `sbtl`, carrying either a
//! compact LRC sample or a full-fidelity TTML sample per line, chosen by
//! the same "smart storage" rule the exchange layer documents.

use crate::error::Result;
use crate::exchange::{lrc, ttml};
use crate::io::FileReader;
use crate::model::SynchronizedLyrics;

use super::atom::Atom;
use super::chapters::{build_hdlr, build_mdhd, build_tkhd};
use super::stbl::{build_stbl, parse_sample_table};

/// The track ID this crate assigns newly authored lyrics tracks.
pub const LYRICS_TRACK_ID: u32 = 3;

const LYRICS_HANDLER_NAME: &str = "Lyrics";

fn is_lyrics_track(trak: &Atom) -> bool {
    trak.find("mdia")
        .and_then(|m| m.find("hdlr"))
        .and_then(|hdlr| hdlr.data.get(8..12))
        .map(|subtype| subtype == b"sbtl")
        .unwrap_or(false)
}

fn mdhd_timescale(trak: &Atom) -> Option<u32> {
    let mdhd = trak.find("mdia")?.find("mdhd")?;
    let version = *mdhd.data.first()?;
    let offset = if version == 1 { 4 + 8 + 8 } else { 4 + 4 + 4 };
    let bytes = mdhd.data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

/// Reads the lyrics text track, if present, by concatenating every
/// sample's text and handing it to the TTML parser (samples are always
/// written as one TTML document split across consecutive `<p>`s in this
/// crate's own output; reading also accepts a single LRC-formatted
/// sample for the compact form) and returns every language found.
pub fn read_lyrics(moov: &Atom, file: &mut FileReader) -> Result<Vec<SynchronizedLyrics>> {
    let mut out = Vec::new();
    for trak in moov.find_all("trak") {
        if !is_lyrics_track(trak) {
            continue;
        }
        let Some(timescale) = mdhd_timescale(trak) else { continue };
        let Some(stbl) = trak.find("mdia").and_then(|m| m.find("minf")).and_then(|m| m.find("stbl")) else {
            continue;
        };
        let table = parse_sample_table(stbl, timescale)?;
        let mut text = String::new();
        for (offset, size, _duration) in &table.samples {
            let bytes = file.read(*offset, *size as usize)?;
            if let Some(sample_text) = decode_sample_text(&bytes) {
                text.push_str(&sample_text);
                text.push('\n');
            }
        }
        if text.trim().is_empty() {
            continue;
        }
        if let Ok(parsed) = ttml::parse_lyrics(&text) {
            out.extend(parsed);
        } else if let Ok(single) = lrc::parse_lyrics(&text) {
            out.push(single);
        }
    }
    Ok(out)
}

fn decode_sample_text(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 {
        return None;
    }
    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let text = bytes.get(2..2 + len.min(bytes.len().saturating_sub(2)))?;
    String::from_utf8(text.to_vec()).ok()
}

fn encode_sample_text(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

/// Serializes `tracks` using the storage-selection rule from §4.5: a
/// single language with no karaoke and no speakers is written as one
/// compact LRC sample; anything richer is written as one full-fidelity
/// TTML document, both wrapped in the `[u16 length][UTF-8 text]` sample
/// format the chapter track also uses.
pub fn encode_lyrics_sample(tracks: &[SynchronizedLyrics]) -> Option<(Vec<u8>, u32)> {
    if tracks.is_empty() {
        return None;
    }
    let use_lrc = tracks.len() == 1 && !tracks[0].has_karaoke() && !tracks[0].has_speakers();
    let text = if use_lrc {
        lrc::emit_lyrics(&tracks[0])
    } else {
        ttml::emit_lyrics(tracks)
    };
    let sample = encode_sample_text(&text);
    let size = sample.len() as u32;
    Some((sample, size))
}

/// Builds the lyrics `trak` atom for a single sample covering the whole
/// track duration (in milliseconds).
pub fn build_lyrics_trak(sample: &[u8], duration_ms: u32, offset: u64, use_co64: bool) -> Atom {
    const TIMESCALE: u32 = 1000;
    let tkhd = build_tkhd(LYRICS_TRACK_ID, duration_ms);
    let mdhd = build_mdhd(TIMESCALE, duration_ms);
    let hdlr = build_hdlr(b"sbtl", LYRICS_HANDLER_NAME);
    let stbl = build_stbl("sbtl", &[sample.len() as u32], &[duration_ms.max(1)], &[offset], use_co64);
    let minf = Atom::container("minf", Vec::new(), vec![stbl]);
    let mdia = Atom::container("mdia", Vec::new(), vec![mdhd, hdlr, minf]);
    Atom::container("trak", Vec::new(), vec![tkhd, mdia])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_text_round_trips() {
        let sample = encode_sample_text("hello world");
        assert_eq!(decode_sample_text(&sample).as_deref(), Some("hello world"));
    }
}
