use std::path::Path;

use crate::binary::BinaryWriter;
use crate::error::Result;
use crate::io::{atomic_replace, sibling_temp_path, FileReader, FileWriter};
use crate::model::AudioFileInfo;

use super::chapters::encode_chapters;
use super::frame::write_frame;
use super::header::{self, HEADER_LEN};
use super::mapping::metadata_to_frames;
use super::read::read_tag;

/// Locates where the audio stream begins in `path`: right after an
/// existing ID3v2 tag if one parses, or offset 0 if the file has none (or
/// isn't a recognisable tag at all — we don't fail a fresh write just
/// because there's nothing to replace).
fn audio_start(path: &Path) -> u64 {
    match read_tag(path, false) {
        Ok(tag) => tag.body_start + u64::from(tag.declared_size),
        Err(_) => 0,
    }
}

fn build_frame_block(info: &AudioFileInfo, major_version: u8) -> Result<Vec<u8>> {
    let mut block = BinaryWriter::new();
    for frame in metadata_to_frames(&info.metadata, major_version) {
        write_frame(&mut block, &frame, major_version)?;
    }
    for frame in encode_chapters(&info.chapters, major_version)? {
        write_frame(&mut block, &frame, major_version)?;
    }
    Ok(block.into_bytes())
}

/// Full replace (§4.4 "Write algorithm" / §6 `write`): emits a fresh tag
/// for `info` with `padding_size` bytes of zero padding, preserving the
/// existing audio stream byte-for-byte.
pub fn write(info: &AudioFileInfo, path: impl AsRef<Path>, major_version: u8, padding_size: usize) -> Result<()> {
    let path = path.as_ref();
    let audio_offset = audio_start(path);
    let frame_block = build_frame_block(info, major_version)?;

    let total_size = frame_block.len() + padding_size;
    tracing::debug!(total_size, padding_size, "writing new ID3v2 tag");

    let tmp_path = sibling_temp_path(path);
    let mut writer = FileWriter::create(&tmp_path)?;
    let mut header_writer = BinaryWriter::new();
    header::write_header(&mut header_writer, major_version, total_size as u32)?;
    writer.write_at(0, header_writer.as_bytes())?;
    writer.write_at(HEADER_LEN, &frame_block)?;
    writer.write_at(HEADER_LEN + frame_block.len() as u64, &vec![0u8; padding_size])?;

    let audio_dest = HEADER_LEN + total_size as u64;
    if path.exists() {
        let mut reader = FileReader::open(path)?;
        let file_size = reader.file_size();
        if audio_offset < file_size {
            writer.copy_from(&mut reader, audio_offset, file_size, audio_dest)?;
        } else {
            writer.truncate(audio_dest)?;
        }
    } else {
        writer.truncate(audio_dest)?;
    }
    writer.close()?;

    atomic_replace(&tmp_path, path)
}

/// Removes all metadata and chapters (§4.4 "Strip" / §6 `strip`):
/// truncates to the audio-stream start, under the documented assumption
/// that audio frames begin immediately after the ID3 header (spec.md §9
/// Open Questions — preserved verbatim, not reinterpreted).
pub fn strip(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let audio_offset = audio_start(path);
    if audio_offset == 0 {
        // Nothing to strip.
        return Ok(());
    }

    let tmp_path = sibling_temp_path(path);
    {
        let mut reader = FileReader::open(path)?;
        let file_size = reader.file_size();
        let mut writer = FileWriter::create(&tmp_path)?;
        if audio_offset < file_size {
            writer.copy_from(&mut reader, audio_offset, file_size, 0)?;
        }
        writer.close()?;
    }
    atomic_replace(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;
    use std::io::Write;

    #[test]
    fn write_then_read_round_trips_title() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xFFu8; 64]).unwrap(); // fake audio payload
        let path = file.into_temp_path();

        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("New Title".to_string());
        write(&info, &path, 3, 64).unwrap();

        let read_back = super::super::read::read(&path, true).unwrap();
        assert_eq!(read_back.metadata.title.as_deref(), Some("New Title"));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..5], b"ID3\x03\x00");
    }

    #[test]
    fn write_preserves_audio_bytes() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        let audio = vec![0xAAu8; 128];
        file.write_all(&audio).unwrap();
        let path = file.into_temp_path();

        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("T".to_string());
        write(&info, &path, 3, 0).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[bytes.len() - 128..], &audio[..]);
    }

    #[test]
    fn strip_removes_tag_and_restores_audio_start() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 32]).unwrap();
        let path = file.into_temp_path();

        let mut info = AudioFileInfo::new();
        info.metadata.title = Some("T".to_string());
        info.chapters.append(crate::model::Chapter::new(Timestamp::ZERO, "One").unwrap());
        write(&info, &path, 3, 0).unwrap();

        strip(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.starts_with(b"ID3"));
        assert_eq!(bytes, vec![0xAAu8; 32]);
    }
}
