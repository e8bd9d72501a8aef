use crate::error::{Error, Result};

/// Declared image format of an [`Artwork`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkFormat {
    /// `image/jpeg`.
    Jpeg,
    /// `image/png`.
    Png,
}

impl ArtworkFormat {
    /// The MIME type used in ID3v2 `APIC` frames.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtworkFormat::Jpeg => "image/jpeg",
            ArtworkFormat::Png => "image/png",
        }
    }

    /// Detects a format from a MIME type string.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(ArtworkFormat::Jpeg),
            "image/png" => Some(ArtworkFormat::Png),
            _ => None,
        }
    }
}

/// Opaque image bytes plus a declared format.
///
/// Format is auto-detected from magic bytes on construction from raw
/// bytes: `FF D8 FF` is JPEG, `89 50 4E 47 0D 0A 1A 0A` is PNG. Anything
/// else is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    format: ArtworkFormat,
    data: Vec<u8>,
}

impl Artwork {
    /// Detects the format of `data` from its magic bytes and wraps it.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = detect_format(&data)?;
        Ok(Artwork { format, data })
    }

    /// Wraps `data` under an explicitly declared `format`, without
    /// re-sniffing the magic bytes.
    pub fn with_format(format: ArtworkFormat, data: Vec<u8>) -> Self {
        Artwork { format, data }
    }

    /// The declared format.
    pub fn format(&self) -> ArtworkFormat {
        self.format
    }

    /// The raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes this artwork, returning the raw bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

fn detect_format(data: &[u8]) -> Result<ArtworkFormat> {
    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    if data.len() >= 3 && data[0..3] == [0xFF, 0xD8, 0xFF] {
        Ok(ArtworkFormat::Jpeg)
    } else if data.len() >= 8 && data[0..8] == PNG_MAGIC {
        Ok(ArtworkFormat::Png)
    } else {
        Err(Error::ArtworkError(
            "data does not begin with a JPEG or PNG magic number".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jpeg() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0u8; 16]);
        let art = Artwork::from_bytes(bytes).unwrap();
        assert_eq!(art.format(), ArtworkFormat::Jpeg);
    }

    #[test]
    fn detects_png() {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 16]);
        let art = Artwork::from_bytes(bytes).unwrap();
        assert_eq!(art.format(), ArtworkFormat::Png);
    }

    #[test]
    fn rejects_unknown() {
        assert!(Artwork::from_bytes(vec![0, 1, 2, 3]).is_err());
    }
}
