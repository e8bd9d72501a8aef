use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::Result;

/// A single ID3v2 frame as parsed off the wire: 4-char ID, status/format
/// flag bytes, raw payload. Frame IDs this crate doesn't map to the data
/// model are kept around verbatim in exactly this shape so they round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub id: String,
    pub flags: u16,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(id: impl Into<String>, data: Vec<u8>) -> Self {
        RawFrame {
            id: id.into(),
            flags: 0,
            data,
        }
    }
}

/// Parses every frame in `body` until the declared size is consumed or a
/// padding frame (ID starting with `\0`) is encountered. Malformed frames
/// are dropped and parsing stops there when `strict` is false (best-effort
/// read); with `strict` set, a malformed frame is a hard `InvalidTag` error.
pub fn read_frames(body: &[u8], major_version: u8, strict: bool) -> Result<Vec<RawFrame>> {
    let mut reader = BinaryReader::new(body);
    let mut frames = Vec::new();

    loop {
        if reader.remaining() < 10 {
            break;
        }
        let start = reader.position();
        let id_bytes = reader.read_bytes(4)?;
        if id_bytes[0] == 0 {
            // Padding begins here.
            break;
        }
        let id = match std::str::from_utf8(id_bytes) {
            Ok(s) if s.chars().all(|c| c.is_ascii_alphanumeric()) => s.to_string(),
            _ => {
                if strict {
                    crate::macros::err!(InvalidTag {
                        offset: start,
                        reason: "frame ID is not ASCII alphanumeric".to_string(),
                    });
                }
                break;
            },
        };

        let size_result = if major_version >= 4 {
            reader.read_syncsafe_u32()
        } else {
            reader.read_u32()
        };
        let size = match size_result {
            Ok(s) => s,
            Err(e) => {
                if strict {
                    return Err(e);
                }
                break;
            },
        };

        let flags = match reader.read_u16() {
            Ok(f) => f,
            Err(e) => {
                if strict {
                    return Err(e);
                }
                break;
            },
        };

        if (size as u64) > reader.remaining() {
            if strict {
                crate::macros::err!(InvalidTag {
                    offset: start,
                    reason: format!("frame {id} declares size {size} exceeding remaining tag body"),
                });
            }
            break;
        }

        let data = reader.read_bytes(size as usize)?.to_vec();
        frames.push(RawFrame { id, flags, data });
    }

    Ok(frames)
}

/// Serializes a single frame (header + payload) into `writer`.
pub fn write_frame(writer: &mut BinaryWriter, frame: &RawFrame, major_version: u8) -> Result<()> {
    writer.write_bytes(frame.id.as_bytes());
    if major_version >= 4 {
        writer.write_syncsafe_u32(frame.data.len() as u32)?;
    } else {
        writer.write_u32(frame.data.len() as u32);
    }
    writer.write_u16(frame.flags);
    writer.write_bytes(&frame.data);
    Ok(())
}

/// Text-encoding selector byte used by ID3v2 text-ish frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Latin1,
    Utf16Bom,
    Utf16Be,
    Utf8,
}

impl TextEncoding {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x01 => TextEncoding::Utf16Bom,
            0x02 => TextEncoding::Utf16Be,
            0x03 => TextEncoding::Utf8,
            _ => TextEncoding::Latin1,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            TextEncoding::Latin1 => 0x00,
            TextEncoding::Utf16Bom => 0x01,
            TextEncoding::Utf16Be => 0x02,
            TextEncoding::Utf8 => 0x03,
        }
    }

    /// As [`Self::from_byte`], but `None` for anything other than 0-3 — an
    /// "impossible encoding byte" per spec.md's best-effort read rule.
    pub fn from_byte_checked(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(TextEncoding::Latin1),
            0x01 => Some(TextEncoding::Utf16Bom),
            0x02 => Some(TextEncoding::Utf16Be),
            0x03 => Some(TextEncoding::Utf8),
            _ => None,
        }
    }

    /// The default encoding this crate writes: Latin-1 for v2.3 (maximum
    /// compatibility), UTF-8 for v2.4.
    pub fn default_for_version(major_version: u8) -> Self {
        if major_version >= 4 {
            TextEncoding::Utf8
        } else {
            TextEncoding::Latin1
        }
    }
}

/// Reads a NUL-terminated string in the given encoding.
pub fn read_encoded_string_nul(reader: &mut BinaryReader, encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Latin1 => reader.read_latin1_nul(),
        TextEncoding::Utf16Bom => reader.read_utf16_nul(),
        TextEncoding::Utf16Be => reader.read_utf16be_nul(),
        TextEncoding::Utf8 => reader.read_utf8_nul(),
    }
}

/// Reads the remainder of the frame as text in the given encoding (no
/// terminator expected — used for the last field of a frame).
pub fn read_encoded_string_rest(reader: &mut BinaryReader, encoding: TextEncoding) -> Result<String> {
    let remaining = reader.remaining() as usize;
    match encoding {
        TextEncoding::Latin1 => reader.read_latin1(remaining),
        TextEncoding::Utf16Bom => reader.read_utf16(remaining),
        TextEncoding::Utf16Be => {
            // No BOM variant of read_utf16 that assumes BE directly on a
            // non-terminated span; reuse the NUL reader semantics by
            // decoding the raw bytes.
            let bytes = reader.read_bytes(remaining)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units).map_err(|_| crate::error::Error::InvalidEncoding(reader.position()))
        },
        TextEncoding::Utf8 => reader.read_utf8(remaining),
    }
}

/// Writes a NUL-terminated string in the given encoding.
pub fn write_encoded_string_nul(writer: &mut BinaryWriter, encoding: TextEncoding, s: &str) {
    match encoding {
        TextEncoding::Latin1 => writer.write_latin1_nul(s),
        TextEncoding::Utf16Bom => writer.write_utf16_bom_nul(s),
        TextEncoding::Utf16Be => writer.write_utf16be_nul(s),
        TextEncoding::Utf8 => writer.write_utf8_nul(s),
    }
}

/// Writes a string with no terminator (for the final field of a frame).
pub fn write_encoded_string_rest(writer: &mut BinaryWriter, encoding: TextEncoding, s: &str) {
    match encoding {
        TextEncoding::Latin1 => writer.write_latin1(s),
        TextEncoding::Utf16Bom => {
            writer.write_bytes(&[0xFF, 0xFE]);
            for unit in s.encode_utf16() {
                writer.write_bytes(&unit.to_le_bytes());
            }
        },
        TextEncoding::Utf16Be => {
            for unit in s.encode_utf16() {
                writer.write_bytes(&unit.to_be_bytes());
            }
        },
        TextEncoding::Utf8 => writer.write_utf8(s),
    }
}

/// Splits a Latin-1/UTF-8 text-frame payload (after the encoding byte) on
/// NUL into multiple values, per ID3v2.4's multi-value text frames.
/// Keeps only the first value, per this crate's documented mapping choice.
pub fn first_value_only(raw: &str) -> &str {
    raw.split('\u{0}').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip_v23() {
        let frame = RawFrame::new("TIT2", vec![0x00, b'h', b'i']);
        let mut w = BinaryWriter::new();
        write_frame(&mut w, &frame, 3).unwrap();
        let parsed = read_frames(w.as_bytes(), 3, true).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], frame);
    }

    #[test]
    fn frame_round_trip_v24_syncsafe_size() {
        let frame = RawFrame::new("TPE1", vec![0x03, b'a', b'r', b't']);
        let mut w = BinaryWriter::new();
        write_frame(&mut w, &frame, 4).unwrap();
        let parsed = read_frames(w.as_bytes(), 4, true).unwrap();
        assert_eq!(parsed[0], frame);
    }

    #[test]
    fn stops_at_padding() {
        let mut bytes = Vec::new();
        let frame = RawFrame::new("TIT2", vec![0x00, b'x']);
        let mut w = BinaryWriter::new();
        write_frame(&mut w, &frame, 3).unwrap();
        bytes.extend_from_slice(w.as_bytes());
        bytes.extend_from_slice(&[0u8; 20]); // padding
        let parsed = read_frames(&bytes, 3, true).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn best_effort_drops_malformed_trailing_frame() {
        let mut bytes = Vec::new();
        let frame = RawFrame::new("TIT2", vec![0x00, b'x']);
        let mut w = BinaryWriter::new();
        write_frame(&mut w, &frame, 3).unwrap();
        bytes.extend_from_slice(w.as_bytes());
        // A frame claiming a size far larger than what follows.
        bytes.extend_from_slice(b"TPE1");
        bytes.extend_from_slice(&999u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8, 0u8]);
        let parsed = read_frames(&bytes, 3, false).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(read_frames(&bytes, 3, true).is_err());
    }
}
