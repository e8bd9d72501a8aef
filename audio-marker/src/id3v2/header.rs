use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

/// Bit flags in byte 5 of the ID3v2 header.
pub struct HeaderFlags {
    pub unsynchronisation: bool,
    pub extended_header: bool,
    pub experimental: bool,
    pub footer: bool,
}

impl HeaderFlags {
    fn from_byte(b: u8) -> Self {
        HeaderFlags {
            unsynchronisation: b & 0x80 != 0,
            extended_header: b & 0x40 != 0,
            experimental: b & 0x20 != 0,
            footer: b & 0x10 != 0,
        }
    }
}

/// The 10-byte ID3v2 header plus the declared (syncsafe) body size.
pub struct Id3v2Header {
    pub major_version: u8,
    pub revision: u8,
    pub flags: HeaderFlags,
    /// Size of the frame+padding region that follows, excluding this header.
    pub size: u32,
}

/// Parses the 10-byte header at the start of `buf`. Does not consume an
/// extended header, if present — callers skip that separately so the
/// caller controls whether to surface its contents.
pub fn read_header(reader: &mut BinaryReader) -> Result<Id3v2Header> {
    let magic = reader.read_bytes(3)?;
    if magic != b"ID3" {
        return Err(Error::InvalidTag {
            offset: 0,
            reason: "missing \"ID3\" magic".to_string(),
        });
    }
    let major_version = reader.read_u8()?;
    if major_version != 3 && major_version != 4 {
        return Err(Error::InvalidTag {
            offset: 3,
            reason: format!("unsupported ID3v2 major version {major_version}"),
        });
    }
    let revision = reader.read_u8()?;
    let flags = HeaderFlags::from_byte(reader.read_u8()?);
    let size = reader.read_syncsafe_u32()?;
    Ok(Id3v2Header {
        major_version,
        revision,
        flags,
        size,
    })
}

/// Skips past an extended header at the current cursor position, per the
/// version-specific layout, returning the number of bytes consumed.
pub fn skip_extended_header(reader: &mut BinaryReader, major_version: u8) -> Result<()> {
    if major_version == 4 {
        // v2.4: syncsafe size (includes itself), num flag bytes, flags.
        let start = reader.position();
        let ext_size = reader.read_syncsafe_u32()?;
        reader.seek(start + u64::from(ext_size))?;
    } else {
        // v2.3: plain u32 size, NOT including the 4 size bytes themselves.
        let ext_size = reader.read_u32()?;
        reader.skip(u64::from(ext_size))?;
    }
    Ok(())
}

/// Writes the 10-byte ID3v2 header. `size` must already be validated to
/// fit in 28 bits by the caller (the writer's `write_syncsafe_u32` enforces
/// this too).
pub fn write_header(writer: &mut BinaryWriter, major_version: u8, size: u32) -> Result<()> {
    writer.write_bytes(b"ID3");
    writer.write_u8(major_version);
    writer.write_u8(0); // revision
    writer.write_u8(0); // flags: no unsynchronisation, no extended header
    writer.write_syncsafe_u32(size)?;
    Ok(())
}

/// Reverses the `FF 00 -> FF` unsynchronisation escaping.
pub fn remove_unsynchronisation(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        out.push(data[i]);
        if data[i] == 0xFF && i + 1 < data.len() && data[i + 1] == 0x00 {
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

pub const HEADER_LEN: u64 = 10;
