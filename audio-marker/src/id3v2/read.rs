use crate::binary::BinaryReader;
use crate::error::Result;
use crate::io::FileReader;
use crate::model::AudioFileInfo;

use super::chapters::decode_chapters;
use super::frame::read_frames;
use super::header::{self, HEADER_LEN};
use super::mapping::frames_to_metadata;

/// The parsed tag plus enough bookkeeping to support in-place modify/strip
/// without re-parsing.
pub(super) struct ParsedTag {
    pub major_version: u8,
    pub frames: Vec<super::frame::RawFrame>,
    /// Offset of the first byte after the 10-byte header (start of the
    /// frame+padding region).
    pub body_start: u64,
    /// Declared size of the frame+padding region (from the header).
    pub declared_size: u32,
}

/// Reads the ID3v2 tag at the start of `path` and returns the raw frame
/// list plus enough layout information to support modify/strip. Does not
/// fold frames into the data model; callers needing that call
/// [`frames_to_metadata`]/[`decode_chapters`] themselves, or use [`read`].
pub(super) fn read_tag(path: impl AsRef<std::path::Path>, strict: bool) -> Result<ParsedTag> {
    let mut file = FileReader::open(path)?;
    let header_bytes = file.read(0, HEADER_LEN as usize)?;
    let mut header_reader = BinaryReader::new(&header_bytes);
    let hdr = header::read_header(&mut header_reader)?;

    tracing::debug!(
        major_version = hdr.major_version,
        size = hdr.size,
        "parsing ID3v2 tag"
    );

    let mut body = file.read(HEADER_LEN, hdr.size as usize)?;
    if hdr.flags.unsynchronisation {
        body = header::remove_unsynchronisation(&body);
    }
    if hdr.flags.extended_header {
        let mut reader = BinaryReader::new(&body);
        header::skip_extended_header(&mut reader, hdr.major_version)?;
        let consumed = reader.position() as usize;
        body = body[consumed..].to_vec();
    }

    let frames = read_frames(&body, hdr.major_version, strict)?;

    Ok(ParsedTag {
        major_version: hdr.major_version,
        frames,
        body_start: HEADER_LEN,
        declared_size: hdr.size,
    })
}

/// Reads `path`'s ID3v2 tag into the data model. ID3v2 never records
/// overall file duration, so `duration` is always `None` here; the facade
/// layers that in from elsewhere if needed.
pub fn read(path: impl AsRef<std::path::Path>, strict: bool) -> Result<AudioFileInfo> {
    let tag = read_tag(path, strict)?;
    let chapters = decode_chapters(&tag.frames, strict)?;
    let (metadata, _unknown) = frames_to_metadata(tag.frames, strict)?;
    Ok(AudioFileInfo {
        metadata,
        chapters,
        duration: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryWriter;
    use std::io::Write;

    fn build_minimal_tag(major: u8, frames: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut body = BinaryWriter::new();
        for (id, data) in frames {
            let frame = super::super::frame::RawFrame::new(*id, data.clone());
            super::super::frame::write_frame(&mut body, &frame, major).unwrap();
        }
        let mut out = BinaryWriter::new();
        header::write_header(&mut out, major, body.len() as u32).unwrap();
        out.write_bytes(body.as_bytes());
        out.into_bytes()
    }

    #[test]
    fn reads_title_from_minimal_tag() {
        let mut text = vec![0x00];
        text.extend_from_slice(b"My Song");
        let bytes = build_minimal_tag(3, &[("TIT2", text)]);

        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&bytes).unwrap();

        let info = read(file.path(), true).unwrap();
        assert_eq!(info.metadata.title.as_deref(), Some("My Song"));
    }

    #[test]
    fn file_starts_with_expected_magic() {
        let bytes = build_minimal_tag(3, &[]);
        assert_eq!(&bytes[0..5], b"ID3\x03\x00");
    }
}
