//! Reads an `AudioFileInfo` out of an M4A/M4B container (§4.5): locate
//! `moov`, pull duration from `mvhd`, metadata from `udta/meta/ilst`,
//! chapters from the referenced chapter track, lyrics from the subtitle
//! track.

use std::path::Path;

use crate::error::{Error, Result};
use crate::io::FileReader;
use crate::model::AudioFileInfo;

use super::chapters;
use super::container::{mvhd_duration, scan_top_level};
use super::ilst;
use super::lyrics;

/// Reads metadata, chapters, and lyrics from an MP4-family file at `path`.
pub fn read(path: impl AsRef<Path>) -> Result<AudioFileInfo> {
    let path = path.as_ref();
    let mut file = FileReader::open(path)?;
    let top = scan_top_level(&mut file)?;

    let moov = top
        .iter()
        .find(|e| e.box_type == "moov")
        .and_then(|e| e.atom.as_ref())
        .ok_or_else(|| Error::InvalidContainer(format!("{}: missing moov box", path.display())))?;

    let duration = moov.find("mvhd").and_then(mvhd_duration);

    let mut info = AudioFileInfo::new();
    info.duration = duration;

    if let Some(ilst_atom) = moov.find("udta").and_then(|u| u.find("meta")).and_then(|m| m.find("ilst")) {
        ilst::decode_ilst(ilst_atom, &mut info.metadata)?;
    }

    info.chapters = chapters::read_chapters(moov, &mut file)?;
    info.metadata.synchronized_lyrics = lyrics::read_lyrics(moov, &mut file)?;

    Ok(info)
}
