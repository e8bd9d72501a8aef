use std::path::Path;

use crate::binary::BinaryWriter;
use crate::error::Result;
use crate::io::{atomic_replace, sibling_temp_path, FileReader, FileWriter};
use crate::model::AudioFileInfo;

use super::chapters::encode_chapters;
use super::frame::write_frame;
use super::header::{self, HEADER_LEN};
use super::mapping::{frames_to_metadata, metadata_to_frames};
use super::read::read_tag;

/// In-place modify (§4.4 "In-place modify" / §6 `modify`): merges `info`
/// into the existing tag, replacing every frame this crate maps to a
/// known field while preserving unknown frames verbatim. Overwrites in
/// place when the new frame block fits within the old tag's reserved
/// space (header + body + padding); otherwise rebuilds the file through a
/// sibling temp file and atomic rename.
pub fn modify(info: &AudioFileInfo, path: impl AsRef<Path>, major_version: u8, padding_size: usize) -> Result<()> {
    let path = path.as_ref();
    let tag = read_tag(path, false)?;
    let old_body_start = tag.body_start;
    let old_declared_size = u64::from(tag.declared_size);

    // `frames_to_metadata` strips every frame this crate understands
    // (including CHAP/CTOC, which it skips outright) and hands back
    // whatever's left as the unknown list to preserve.
    let (_discarded_metadata, unknown_frames) = frames_to_metadata(tag.frames, false)?;

    let mut block = BinaryWriter::new();
    for frame in metadata_to_frames(&info.metadata, major_version) {
        write_frame(&mut block, &frame, major_version)?;
    }
    for frame in encode_chapters(&info.chapters, major_version)? {
        write_frame(&mut block, &frame, major_version)?;
    }
    for frame in &unknown_frames {
        write_frame(&mut block, frame, major_version)?;
    }
    let new_body = block.into_bytes();

    if (new_body.len() as u64) <= old_declared_size {
        tracing::debug!(
            new_size = new_body.len(),
            old_size = old_declared_size,
            "modifying ID3v2 tag in place"
        );
        let mut writer = FileWriter::open(path)?;
        let mut header_writer = BinaryWriter::new();
        header::write_header(&mut header_writer, major_version, old_declared_size as u32)?;
        writer.write_at(0, header_writer.as_bytes())?;
        writer.write_at(old_body_start, &new_body)?;
        let zero_fill = old_declared_size - new_body.len() as u64;
        if zero_fill > 0 {
            writer.write_at(old_body_start + new_body.len() as u64, &vec![0u8; zero_fill as usize])?;
        }
        writer.close()
    } else {
        tracing::debug!(
            new_size = new_body.len(),
            old_size = old_declared_size,
            "ID3v2 tag outgrew its padding, rewriting file"
        );
        let audio_offset = old_body_start + old_declared_size;
        let total_size = new_body.len() + padding_size;

        let tmp_path = sibling_temp_path(path);
        {
            let mut reader = FileReader::open(path)?;
            let file_size = reader.file_size();
            let mut writer = FileWriter::create(&tmp_path)?;
            let mut header_writer = BinaryWriter::new();
            header::write_header(&mut header_writer, major_version, total_size as u32)?;
            writer.write_at(0, header_writer.as_bytes())?;
            writer.write_at(HEADER_LEN, &new_body)?;
            writer.write_at(HEADER_LEN + new_body.len() as u64, &vec![0u8; padding_size])?;
            let audio_dest = HEADER_LEN + total_size as u64;
            if audio_offset < file_size {
                writer.copy_from(&mut reader, audio_offset, file_size, audio_dest)?;
            } else {
                writer.truncate(audio_dest)?;
            }
            writer.close()?;
        }
        atomic_replace(&tmp_path, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chapter;
    use crate::model::Timestamp;
    use std::io::Write;

    #[test]
    fn fits_in_padding_overwrites_in_place() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 64]).unwrap();
        let path = file.into_temp_path();

        let mut first = AudioFileInfo::new();
        first.metadata.title = Some("Original".to_string());
        super::super::write::write(&first, &path, 3, 2048).unwrap();
        let audio_start_before = std::fs::read(&path).unwrap().len();

        let mut second = AudioFileInfo::new();
        second.metadata.title = Some("Replaced".to_string());
        modify(&second, &path, 3, 2048).unwrap();

        assert_eq!(std::fs::read(&path).unwrap().len(), audio_start_before);
        let read_back = super::super::read::read(&path, true).unwrap();
        assert_eq!(read_back.metadata.title.as_deref(), Some("Replaced"));
    }

    #[test]
    fn unknown_frames_survive_modify() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 64]).unwrap();
        let path = file.into_temp_path();

        let first = AudioFileInfo::new();
        super::super::write::write(&first, &path, 3, 2048).unwrap();

        // Inject an unknown frame directly by reading the raw tag and
        // writing it back with an extra frame appended.
        let tag = read_tag(&path, true).unwrap();
        let mut frames = tag.frames;
        frames.push(super::frame::RawFrame::new("WEIRD", vec![1, 2, 3]));
        let mut block = BinaryWriter::new();
        for f in &frames {
            write_frame(&mut block, f, 3).unwrap();
        }
        let mut writer = FileWriter::open(&path).unwrap();
        let mut hw = BinaryWriter::new();
        header::write_header(&mut hw, 3, 2048).unwrap();
        writer.write_at(0, hw.as_bytes()).unwrap();
        writer.write_at(HEADER_LEN, block.as_bytes()).unwrap();
        writer.close().unwrap();

        let mut second = AudioFileInfo::new();
        second.metadata.title = Some("New".to_string());
        second.chapters.append(Chapter::new(Timestamp::ZERO, "One").unwrap());
        modify(&second, &path, 3, 2048).unwrap();

        let reparsed = read_tag(&path, true).unwrap();
        assert!(reparsed.frames.iter().any(|f| f.id == "WEIRD"));
    }
}
