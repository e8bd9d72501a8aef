//! Writes/modifies/strips an MP4-family file (§4.5 "Write algorithm").
//!
//! The central challenge is that `moov` usually changes size, which shifts
//! `mdat` and therefore every chunk offset that points into it. Strategy:
//!
//! 1. Scan the existing top-level boxes, retaining every one that isn't
//!    `moov`/`mdat` verbatim (by byte range for `mdat`, by parsed [`Atom`]
//!    for everything else).
//! 2. Replace or insert `udta/meta/ilst` with the new item list (full
//!    replace for `write`, unknown-item-preserving merge for `modify`).
//! 3. Drop the existing chapter/lyrics text tracks and `tref/chap`
//!    reference, then rebuild them from `info` — these two tracks are
//!    always regenerated wholesale, never merged.
//! 4. Lay the samples for the new tracks out directly after the original
//!    `mdat` payload, so the original audio bytes stay an untouched,
//!    contiguous prefix of the (possibly extended) `mdat` box.
//! 5. Decide up front whether the new `mdat` could exceed 2^32 bytes and,
//!    if so, widen every track's `stco` to `co64` (preserving the offset
//!    values) before measuring anything — so the chunk-offset box's width,
//!    and therefore `moov`'s encoded length, is already final. Only then
//!    measure the rebuilt `moov`, which fixes where the new `mdat` starts,
//!    and patch every track's offset *values* (the original sound track
//!    gets a delta shift, the freshly built tracks get their absolute
//!    offsets) via [`super::stbl::patch_chunk_offsets`], which never
//!    changes a chunk-offset box's encoded length once it's already at the
//!    decided width.
//! 6. Stream the original audio into the new file unchanged, append the
//!    new track samples, and atomically replace the original.

use std::path::Path;

use crate::error::{Error, Result};
use crate::io::{atomic_replace, sibling_temp_path, FileReader, FileWriter};
use crate::model::{AudioFileInfo, Timestamp};

use super::atom::Atom;
use super::chapters::{self, CHAPTER_TRACK_ID};
use super::container::{hdlr_subtype, mvhd_duration, scan_top_level};
use super::ilst;
use super::lyrics;
use super::stbl::{force_co64, patch_chunk_offsets};

/// Full replace: the new `ilst` contains only what `info.metadata` carries,
/// dropping any custom items the previous tag had that aren't reproduced.
pub fn write(info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<()> {
    rebuild(info, path.as_ref(), false)
}

/// Preserves unknown `ilst` items (custom `----` fields this crate doesn't
/// map, or item keys it's never heard of) across the rewrite.
pub fn modify(info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<()> {
    rebuild(info, path.as_ref(), true)
}

/// Removes metadata, chapters, and lyrics, leaving the audio and container
/// structure otherwise intact.
pub fn strip(path: impl AsRef<Path>) -> Result<()> {
    rebuild(&AudioFileInfo::new(), path.as_ref(), false)
}

fn rebuild(info: &AudioFileInfo, path: &Path, preserve_unknown: bool) -> Result<()> {
    let mut file = FileReader::open(path)?;
    let top = scan_top_level(&mut file)?;

    let moov_idx = top
        .iter()
        .position(|e| e.box_type == "moov")
        .ok_or_else(|| Error::InvalidContainer(format!("{}: missing moov box", path.display())))?;
    let mut moov = top[moov_idx]
        .atom
        .clone()
        .ok_or_else(|| Error::InvalidContainer("moov box failed to parse".to_string()))?;
    if moov.find("mvhd").is_none() {
        return Err(Error::InvalidContainer(format!("{}: moov missing mvhd", path.display())));
    }

    let mdat_entry = top.iter().find(|e| e.box_type == "mdat");
    let old_audio_start = mdat_entry.map(|e| e.payload_start).unwrap_or_else(|| file.file_size());
    let old_audio_len = mdat_entry.map(|e| e.payload_len).unwrap_or(0);

    let audio_duration = info
        .duration
        .or_else(|| moov.find("mvhd").and_then(mvhd_duration))
        .unwrap_or(Timestamp::ZERO);

    let old_ilst = moov.find("udta").and_then(|u| u.find("meta")).and_then(|m| m.find("ilst")).cloned();

    strip_marker_tracks(&mut moov);

    let new_ilst = if preserve_unknown {
        ilst::merge_ilst(&info.metadata, old_ilst.as_ref())
    } else {
        ilst::encode_ilst(&info.metadata)
    };
    set_ilst(&mut moov, new_ilst);

    let has_chapters = !info.chapters.is_empty();
    let (chapter_blob, chapter_sizes, chapter_durations) = if has_chapters {
        chapters::encode_chapter_samples(&info.chapters, audio_duration)
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    let lyrics_sample = lyrics::encode_lyrics_sample(&info.metadata.synchronized_lyrics);

    let estimated_end = old_audio_start
        + old_audio_len
        + chapter_blob.len() as u64
        + lyrics_sample.as_ref().map(|(s, _)| s.len() as u64).unwrap_or(0)
        + 4096;
    let use_co64 = estimated_end > u64::from(u32::MAX);

    if has_chapters {
        let relative_offsets = cumulative_offsets(&chapter_sizes);
        let chapter_trak = chapters::build_chapter_trak(&chapter_sizes, &chapter_durations, &relative_offsets, use_co64);
        moov.children.get_or_insert_with(Vec::new).push(chapter_trak);
        attach_chapter_reference(&mut moov);
    }

    if let Some((sample, _)) = &lyrics_sample {
        let duration_ms = audio_duration.as_millis().clamp(1, u64::from(u32::MAX)) as u32;
        let lyrics_trak = lyrics::build_lyrics_trak(sample, duration_ms, 0, use_co64);
        moov.children.get_or_insert_with(Vec::new).push(lyrics_trak);
    }

    // The freshly built chapter/lyrics traks already encode their offset
    // tables at the final width (`use_co64` above). The sound track's
    // `stbl` came from the original file and may still be a 32-bit `stco`;
    // widen it to `co64` now, before moov is measured, so that
    // `patch_track_offsets` below only ever rewrites offset *values* and
    // never the chunk-offset box's encoded length. Doing the upgrade after
    // measuring `new_audio_start` would grow `moov` out from under an
    // already-fixed `mdat` position.
    if use_co64 {
        force_all_chunk_offsets_to_co64(&mut moov)?;
    }

    // moov's size is now final — patching chunk-offset *values* below never
    // changes any box's encoded length, so this measurement stays correct.
    let mut preserved_size = 0u64;
    for (i, entry) in top.iter().enumerate() {
        if i == moov_idx || entry.box_type == "mdat" {
            continue;
        }
        let atom = entry
            .atom
            .as_ref()
            .ok_or_else(|| Error::InvalidContainer(format!("{} box failed to parse", entry.box_type)))?;
        preserved_size += atom.encoded_len();
    }

    let mdat_payload_len = old_audio_len + chapter_blob.len() as u64 + lyrics_sample.as_ref().map(|(s, _)| s.len() as u64).unwrap_or(0);
    let mdat_header_len: u64 = if mdat_payload_len + 8 > u64::from(u32::MAX) { 16 } else { 8 };
    let new_audio_start = preserved_size + moov.encoded_len() + mdat_header_len;

    let sound_delta = new_audio_start as i64 - old_audio_start as i64;
    let chapter_base = new_audio_start + old_audio_len;
    let lyrics_base = chapter_base + chapter_blob.len() as u64;

    patch_track_offsets(
        &mut moov,
        sound_delta,
        has_chapters.then_some(chapter_base as i64),
        lyrics_sample.is_some().then_some(lyrics_base as i64),
    )?;

    let tmp_path = sibling_temp_path(path);
    let mut writer = FileWriter::create(&tmp_path)?;

    let mut head = Vec::new();
    for (i, entry) in top.iter().enumerate() {
        if i == moov_idx || entry.box_type == "mdat" {
            continue;
        }
        entry
            .atom
            .as_ref()
            .ok_or_else(|| Error::InvalidContainer(format!("{} box failed to parse", entry.box_type)))?
            .write_to(&mut head);
    }
    moov.write_to(&mut head);
    writer.write_at(0, &head)?;

    let total_mdat_size = mdat_header_len + mdat_payload_len;
    let mut mdat_header = Vec::new();
    if mdat_header_len == 16 {
        mdat_header.extend_from_slice(&1u32.to_be_bytes());
        mdat_header.extend_from_slice(b"mdat");
        mdat_header.extend_from_slice(&total_mdat_size.to_be_bytes());
    } else {
        mdat_header.extend_from_slice(&(total_mdat_size as u32).to_be_bytes());
        mdat_header.extend_from_slice(b"mdat");
    }
    let mdat_box_start = new_audio_start - mdat_header_len;
    writer.write_at(mdat_box_start, &mdat_header)?;

    if old_audio_len > 0 {
        writer.copy_from(&mut file, old_audio_start, old_audio_start + old_audio_len, new_audio_start)?;
    }

    let mut trailing = chapter_blob;
    if let Some((sample, _)) = lyrics_sample {
        trailing.extend_from_slice(&sample);
    }
    if !trailing.is_empty() {
        writer.write_at(new_audio_start + old_audio_len, &trailing)?;
    }

    writer.close()?;
    atomic_replace(&tmp_path, path)
}

fn cumulative_offsets(sizes: &[u32]) -> Vec<u64> {
    let mut out = Vec::with_capacity(sizes.len());
    let mut running = 0u64;
    for &size in sizes {
        out.push(running);
        running += u64::from(size);
    }
    out
}

/// Drops any `trak` this crate itself produces — a chapter track (`hdlr`
/// subtype `text`) or a lyrics track (subtype `sbtl`) — along with the
/// sound track's `tref/chap` reference to it, so they can be rebuilt fresh.
fn strip_marker_tracks(moov: &mut Atom) {
    if let Some(children) = moov.children.as_mut() {
        children.retain(|c| {
            if c.box_type != "trak" {
                return true;
            }
            !matches!(hdlr_subtype(c), Some(subtype) if &subtype == b"text" || &subtype == b"sbtl")
        });
        for trak in children.iter_mut().filter(|c| c.box_type == "trak") {
            trak.remove_children("tref");
        }
    }
}

fn attach_chapter_reference(moov: &mut Atom) {
    if let Some(children) = moov.children.as_mut() {
        for trak in children.iter_mut().filter(|c| c.box_type == "trak") {
            if hdlr_subtype(trak) == Some(*b"soun") {
                trak.upsert_child(chapters::build_chapter_reference(CHAPTER_TRACK_ID));
                break;
            }
        }
    }
}

fn set_ilst(moov: &mut Atom, ilst: Atom) {
    let children = moov.children.get_or_insert_with(Vec::new);
    if let Some(udta) = children.iter_mut().find(|c| c.box_type == "udta") {
        let udta_children = udta.children.get_or_insert_with(Vec::new);
        if let Some(meta) = udta_children.iter_mut().find(|c| c.box_type == "meta") {
            meta.upsert_child(ilst);
        } else {
            udta_children.push(Atom::container("meta", vec![0, 0, 0, 0], vec![build_meta_hdlr(), ilst]));
        }
    } else {
        let meta = Atom::container("meta", vec![0, 0, 0, 0], vec![build_meta_hdlr(), ilst]);
        children.push(Atom::container("udta", Vec::new(), vec![meta]));
    }
}

fn build_meta_hdlr() -> Atom {
    let mut data = vec![0u8, 0, 0, 0]; // version + flags
    data.extend_from_slice(&[0, 0, 0, 0]); // predefined
    data.extend_from_slice(b"mdir"); // handler_type
    data.extend_from_slice(b"appl"); // manufacturer, per Apple convention
    data.extend_from_slice(&[0u8; 8]); // reserved
    data.push(0); // empty, NUL-terminated name
    Atom::leaf("hdlr", data)
}

/// Widens every track's `stco` to `co64` in place (see the call site in
/// [`rebuild`]). The chapter/lyrics traks are built directly with the
/// final width and already have no `stco` to widen, so in practice this
/// only touches the preserved sound track, but it's harmless to run over
/// every `trak`.
fn force_all_chunk_offsets_to_co64(moov: &mut Atom) -> Result<()> {
    let Some(children) = moov.children.as_mut() else {
        return Ok(());
    };
    for trak in children.iter_mut().filter(|c| c.box_type == "trak") {
        if let Some(stbl) = trak.find_mut("mdia").and_then(|m| m.find_mut("minf")).and_then(|m| m.find_mut("stbl")) {
            force_co64(stbl)?;
        }
    }
    Ok(())
}

fn patch_track_offsets(moov: &mut Atom, sound_delta: i64, chapter_delta: Option<i64>, lyrics_delta: Option<i64>) -> Result<()> {
    let Some(children) = moov.children.as_mut() else {
        return Ok(());
    };
    for trak in children.iter_mut().filter(|c| c.box_type == "trak") {
        let delta = match hdlr_subtype(trak) {
            Some(t) if &t == b"text" => chapter_delta,
            Some(t) if &t == b"sbtl" => lyrics_delta,
            _ => Some(sound_delta),
        };
        let Some(delta) = delta else { continue };
        if let Some(stbl) = trak.find_mut("mdia").and_then(|m| m.find_mut("minf")).and_then(|m| m.find_mut("stbl")) {
            patch_chunk_offsets(stbl, delta)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::model::{Chapter, ChapterList};
    use crate::mp4::chapters::{build_hdlr, build_mdhd, build_tkhd};
    use crate::mp4::stbl::build_stbl;

    fn sample_m4a(audio: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();

        let ftyp = Atom::leaf("ftyp", b"M4A \0\0\x02\0M4A mp42isom".to_vec());

        let mut mvhd_data = vec![0u8, 0, 0, 0];
        mvhd_data.extend_from_slice(&0u32.to_be_bytes());
        mvhd_data.extend_from_slice(&0u32.to_be_bytes());
        mvhd_data.extend_from_slice(&1000u32.to_be_bytes()); // timescale
        mvhd_data.extend_from_slice(&10_000u32.to_be_bytes()); // duration ms
        mvhd_data.extend_from_slice(&0x0001_0000i32.to_be_bytes());
        mvhd_data.extend_from_slice(&0x0100i16.to_be_bytes());
        mvhd_data.extend_from_slice(&[0u8; 10]);
        for v in [0x0001_0000i32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
            mvhd_data.extend_from_slice(&v.to_be_bytes());
        }
        mvhd_data.extend_from_slice(&[0u8; 24]);
        mvhd_data.extend_from_slice(&2u32.to_be_bytes()); // next_track_id
        let mvhd = Atom::leaf("mvhd", mvhd_data);

        let build_moov = |audio_offset: u64| {
            let tkhd = build_tkhd(1, 10_000);
            let mdhd = build_mdhd(1000, 10_000);
            let hdlr = build_hdlr(b"soun", "SoundHandler");
            let stbl = build_stbl("mp4a", &[audio.len() as u32], &[10_000], &[audio_offset], false);
            let minf = Atom::container("minf", Vec::new(), vec![stbl]);
            let mdia = Atom::container("mdia", Vec::new(), vec![mdhd.clone(), hdlr.clone(), minf]);
            let trak = Atom::container("trak", Vec::new(), vec![tkhd, mdia]);
            Atom::container("moov", Vec::new(), vec![mvhd.clone(), trak])
        };

        let ftyp_len = ftyp.encoded_len();
        let provisional_moov = build_moov(0);
        let audio_offset = ftyp_len + provisional_moov.encoded_len() + 8;
        let moov = build_moov(audio_offset);

        let mut bytes = Vec::new();
        ftyp.write_to(&mut bytes);
        moov.write_to(&mut bytes);
        bytes.extend_from_slice(&((8 + audio.len()) as u32).to_be_bytes());
        bytes.extend_from_slice(b"mdat");
        bytes.extend_from_slice(audio);

        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn write_preserves_audio_bytes_and_adds_metadata() {
        let audio = vec![0xABu8; 64];
        let file = sample_m4a(&audio);

        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("Hello".to_string());
        write(&info, file.path()).unwrap();

        let read_back = super::super::read::read(file.path()).unwrap();
        assert_eq!(read_back.metadata.title.as_deref(), Some("Hello"));

        let raw = std::fs::read(file.path()).unwrap();
        let needle = &audio[..];
        assert!(raw.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn write_chapters_round_trip_through_chapter_track() {
        let audio = vec![0x11u8; 32];
        let file = sample_m4a(&audio);

        let mut info = AudioFileInfo::new();
        let mut chapters = ChapterList::new();
        chapters.append(Chapter::new(Timestamp::from_millis(0), "Intro").unwrap());
        chapters.append(Chapter::new(Timestamp::from_millis(5000), "Main").unwrap());
        info.chapters = chapters;
        info.duration = Some(Timestamp::from_millis(10_000));

        write(&info, file.path()).unwrap();

        let read_back = super::super::read::read(file.path()).unwrap();
        assert_eq!(read_back.chapters.len(), 2);
        assert_eq!(read_back.chapters.as_slice()[0].title(), "Intro");
        assert_eq!(read_back.chapters.as_slice()[1].title(), "Main");
    }

    #[test]
    fn strip_removes_metadata() {
        let audio = vec![0x22u8; 16];
        let file = sample_m4a(&audio);

        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("Will be stripped".to_string());
        write(&info, file.path()).unwrap();
        assert!(super::super::read::read(file.path()).unwrap().metadata.title.is_some());

        strip(file.path()).unwrap();
        let stripped = super::super::read::read(file.path()).unwrap();
        assert_eq!(stripped.metadata.title, None);
    }

    #[test]
    fn modify_preserves_unknown_custom_field() {
        let audio = vec![0x33u8; 16];
        let file = sample_m4a(&audio);

        let mut first = AudioFileInfo::new();
        first.metadata.title = Some("Title One".to_string());
        first.metadata.set_custom_text_field("MOOD", "Chill");
        write(&first, file.path()).unwrap();

        let mut second = AudioFileInfo::new();
        second.metadata.title = Some("Title Two".to_string());
        modify(&second, file.path()).unwrap();

        let result = super::super::read::read(file.path()).unwrap();
        assert_eq!(result.metadata.title.as_deref(), Some("Title Two"));
        assert_eq!(result.metadata.custom_text_field("MOOD"), Some("Chill"));
    }

    /// Widening a track's `stco` to `co64` up front must settle `moov`'s
    /// encoded length before it's measured: patching offset *values*
    /// afterwards (the `sound_delta` shift `rebuild` applies) must not
    /// change that length again, or the already-fixed `mdat` position
    /// would be wrong.
    #[test]
    fn forcing_co64_up_front_makes_moov_size_stable_under_later_patching() {
        let stbl = build_stbl("mp4a", &[64], &[10_000], &[1000], false);
        let mdia = Atom::container(
            "mdia",
            Vec::new(),
            vec![
                build_mdhd(1000, 10_000),
                build_hdlr(b"soun", "SoundHandler"),
                Atom::container("minf", Vec::new(), vec![stbl]),
            ],
        );
        let trak = Atom::container("trak", Vec::new(), vec![build_tkhd(1, 10_000), mdia]);
        let mut moov = Atom::container("moov", Vec::new(), vec![trak]);

        force_all_chunk_offsets_to_co64(&mut moov).unwrap();
        let size_after_widening = moov.encoded_len();

        patch_track_offsets(&mut moov, 123_456, None, None).unwrap();
        assert_eq!(moov.encoded_len(), size_after_widening);

        let stbl = moov.find("trak").unwrap().find("mdia").unwrap().find("minf").unwrap().find("stbl").unwrap();
        assert!(stbl.find("co64").is_some());
        assert!(stbl.find("stco").is_none());
    }
}
