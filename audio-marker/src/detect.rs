//! Format detection (§4.3): magic-byte sniff with extension refinement.

use std::path::Path;

use crate::error::{Error, Result};
use crate::io::FileReader;

/// A detected container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// MPEG audio with an ID3v2 tag.
    Mp3,
    /// ISOBMFF, refined to the `.m4a` convention (music).
    M4a,
    /// ISOBMFF, refined to the `.m4b` convention (audiobook).
    M4b,
}

impl Format {
    /// A lowercase name for diagnostics and extension matching.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Mp3 => "mp3",
            Format::M4a => "m4a",
            Format::M4b => "m4b",
        }
    }

    /// Whether this format's metadata lives in an ISOBMFF container.
    pub fn is_mp4(&self) -> bool {
        matches!(self, Format::M4a | Format::M4b)
    }
}

/// Reads up to 12 bytes from the start of `path` and classifies the
/// container, refining M4A vs M4B by the `ftyp` major brand and falling
/// back to the file extension when that's ambiguous.
pub fn detect_format(path: impl AsRef<Path>) -> Result<Format> {
    let path = path.as_ref();
    let mut reader = FileReader::open(path)?;
    let header = reader.read_up_to(0, 12)?;
    classify(&header, path)
}

fn classify(header: &[u8], path: &Path) -> Result<Format> {
    if header.len() >= 3 && &header[0..3] == b"ID3" {
        return Ok(Format::Mp3);
    }
    if header.len() >= 2 && header[0] == 0xFF && (header[1] & 0xE0) == 0xE0 {
        return Ok(Format::Mp3);
    }
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        if &header[8..12] == b"M4B " {
            return Ok(Format::M4b);
        }
        return Ok(refine_by_extension(path));
    }

    match extension_format(path) {
        Some(format) => Ok(format),
        None => Err(Error::UnknownFormat(path.display().to_string())),
    }
}

fn refine_by_extension(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("m4b") => Format::M4b,
        _ => Format::M4a,
    }
}

fn extension_format(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("mp3") => Some(Format::Mp3),
        Some("m4b") => Some(Format::M4b),
        Some("m4a") => Some(Format::M4a),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, bytes: &[u8]) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(name).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn detects_id3_mp3() {
        let path = write_temp(".mp3", b"ID3\x03\x00\x00\x00\x00\x00\x00");
        assert_eq!(detect_format(&path).unwrap(), Format::Mp3);
    }

    #[test]
    fn detects_mpeg_sync_mp3() {
        let path = write_temp(".mp3", &[0xFF, 0xFB, 0x90, 0x00, 0, 0, 0, 0]);
        assert_eq!(detect_format(&path).unwrap(), Format::Mp3);
    }

    #[test]
    fn detects_m4b_brand() {
        let mut bytes = vec![0, 0, 0, 24];
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"M4B ");
        bytes.extend_from_slice(&[0u8; 8]);
        let path = write_temp(".bin", &bytes);
        assert_eq!(detect_format(&path).unwrap(), Format::M4b);
    }

    #[test]
    fn refines_m4a_by_extension() {
        let mut bytes = vec![0, 0, 0, 24];
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"isom");
        bytes.extend_from_slice(&[0u8; 8]);
        let path = write_temp(".m4a", &bytes);
        assert_eq!(detect_format(&path).unwrap(), Format::M4a);

        let path_b = write_temp(".m4b", &bytes);
        assert_eq!(detect_format(&path_b).unwrap(), Format::M4b);
    }

    #[test]
    fn unknown_format_errors() {
        let path = write_temp(".bin", b"not audio at all");
        assert!(detect_format(&path).is_err());
    }
}
