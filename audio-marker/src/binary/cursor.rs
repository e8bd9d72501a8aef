use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// A read-only cursor over a borrowed byte slice.
///
/// Never copies the source buffer; every accessor either returns a
/// sub-slice of it or decodes a fixed-width scalar in place. Bounds
/// violations surface as [`Error::UnexpectedEndOfData`] /
/// [`Error::SeekOutOfBounds`], decode failures as [`Error::InvalidEncoding`].
pub struct BinaryReader<'a> {
    buf: &'a [u8],
    pos: u64,
}

impl<'a> BinaryReader<'a> {
    /// Wraps `buf`, positioned at offset 0.
    pub fn new(buf: &'a [u8]) -> Self {
        BinaryReader { buf, pos: 0 }
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current absolute offset.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes remaining between the cursor and the end of the buffer.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.pos)
    }

    fn require(&self, count: u64) -> Result<()> {
        if self.pos + count > self.len() {
            return Err(Error::UnexpectedEndOfData {
                offset: self.pos,
                requested: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn slice(&mut self, count: u64) -> Result<&'a [u8]> {
        self.require(count)?;
        let start = self.pos as usize;
        let end = start + count as usize;
        self.pos += count;
        Ok(&self.buf[start..end])
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.slice(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.slice(2)?))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.slice(4)?))
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.slice(8)?))
    }

    /// Reads a 28-bit ID3v2 syncsafe integer: four bytes, each contributing
    /// its low seven bits, top bit always zero.
    pub fn read_syncsafe_u32(&mut self) -> Result<u32> {
        let bytes = self.slice(4)?;
        for &b in bytes {
            if b & 0x80 != 0 {
                return Err(Error::InvalidEncoding(self.pos - 4));
            }
        }
        Ok((u32::from(bytes[0]) << 21)
            | (u32::from(bytes[1]) << 14)
            | (u32::from(bytes[2]) << 7)
            | u32::from(bytes[3]))
    }

    /// Reads exactly `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.slice(count as u64)
    }

    /// Reads bytes up to, and consuming, a `0x00` terminator (or EOF).
    /// Returns the bytes before the terminator.
    pub fn read_until_nul(&mut self) -> Result<&'a [u8]> {
        let start = self.pos as usize;
        let mut end = start;
        while end < self.buf.len() && self.buf[end] != 0x00 {
            end += 1;
        }
        let consumed_terminator = end < self.buf.len();
        let result = &self.buf[start..end];
        self.pos = (end + usize::from(consumed_terminator)) as u64;
        Ok(result)
    }

    /// Decodes `count` bytes as Latin-1 (ISO-8859-1), which is infallible
    /// since every byte value maps to a Unicode scalar.
    pub fn read_latin1(&mut self, count: usize) -> Result<String> {
        Ok(self.read_bytes(count)?.iter().map(|&b| b as char).collect())
    }

    /// Reads a NUL-terminated Latin-1 string.
    pub fn read_latin1_nul(&mut self) -> Result<String> {
        Ok(self.read_until_nul()?.iter().map(|&b| b as char).collect())
    }

    /// Decodes `count` bytes as UTF-8.
    pub fn read_utf8(&mut self, count: usize) -> Result<String> {
        let bytes = self.read_bytes(count)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidEncoding(self.pos - count as u64))
    }

    /// Reads a NUL-terminated UTF-8 string.
    pub fn read_utf8_nul(&mut self) -> Result<String> {
        let start = self.pos;
        let bytes = self.read_until_nul()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidEncoding(start))
    }

    /// Decodes `count` bytes as UTF-16 (with a leading BOM determining
    /// endianness; defaults to little-endian if no BOM is present).
    pub fn read_utf16(&mut self, count: usize) -> Result<String> {
        let bytes = self.read_bytes(count)?;
        decode_utf16_bytes(bytes).ok_or(Error::InvalidEncoding(self.pos - count as u64))
    }

    /// Reads a NUL-NUL-terminated UTF-16 string (BOM-prefixed).
    pub fn read_utf16_nul(&mut self) -> Result<String> {
        let start = self.pos as usize;
        let mut end = start;
        while end + 1 < self.buf.len() && !(self.buf[end] == 0 && self.buf[end + 1] == 0) {
            end += 2;
        }
        let consumed = end + 1 < self.buf.len();
        let bytes = &self.buf[start..end];
        self.pos = (end + if consumed { 2 } else { 0 }) as u64;
        decode_utf16_bytes(bytes).ok_or(Error::InvalidEncoding(start as u64))
    }

    /// Reads a NUL-terminated UTF-16BE string (no BOM, ID3v2.4 encoding 0x02).
    pub fn read_utf16be_nul(&mut self) -> Result<String> {
        let start = self.pos as usize;
        let mut end = start;
        while end + 1 < self.buf.len() && !(self.buf[end] == 0 && self.buf[end + 1] == 0) {
            end += 2;
        }
        let consumed = end + 1 < self.buf.len();
        let bytes = &self.buf[start..end];
        self.pos = (end + if consumed { 2 } else { 0 }) as u64;
        let units: Vec<u16> = bytes.chunks_exact(2).map(|c| BigEndian::read_u16(c)).collect();
        String::from_utf16(&units).map_err(|_| Error::InvalidEncoding(start as u64))
    }

    /// Skips `count` bytes without returning them.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.require(count)?;
        self.pos += count;
        Ok(())
    }

    /// Seeks to an absolute offset.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.len() {
            return Err(Error::SeekOutOfBounds {
                offset,
                size: self.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }
}

fn decode_utf16_bytes(bytes: &[u8]) -> Option<String> {
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..].chunks_exact(2).map(|c| BigEndian::read_u16(c)).collect();
        String::from_utf16(&units).ok()
    } else {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).ok()
    }
}

/// An append/overwrite byte buffer with an always-available byte view.
///
/// Unlike [`BinaryReader`], the writer owns its buffer: writes accumulate
/// into it and `as_bytes` is valid to call at any point.
#[derive(Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    /// An empty writer.
    pub fn new() -> Self {
        BinaryWriter { buf: Vec::new() }
    }

    /// An empty writer with `capacity` bytes pre-reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        BinaryWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current length of the accumulated buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrows the accumulated bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Appends a big-endian `u16`.
    pub fn write_u16(&mut self, v: u16) {
        let mut tmp = [0u8; 2];
        BigEndian::write_u16(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    /// Appends a big-endian `u32`.
    pub fn write_u32(&mut self, v: u32) {
        let mut tmp = [0u8; 4];
        BigEndian::write_u32(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    /// Appends a big-endian `u64`.
    pub fn write_u64(&mut self, v: u64) {
        let mut tmp = [0u8; 8];
        BigEndian::write_u64(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    /// Appends `v` as a 28-bit ID3v2 syncsafe integer. Callers must ensure
    /// `v < 2^28`; values at or above that overflow and refuse to encode.
    pub fn write_syncsafe_u32(&mut self, v: u32) -> Result<()> {
        if v >= 1 << 28 {
            return Err(Error::InvalidTag {
                offset: self.buf.len() as u64,
                reason: format!("value {v} does not fit in a 28-bit syncsafe integer"),
            });
        }
        self.buf.push(((v >> 21) & 0x7F) as u8);
        self.buf.push(((v >> 14) & 0x7F) as u8);
        self.buf.push(((v >> 7) & 0x7F) as u8);
        self.buf.push((v & 0x7F) as u8);
        Ok(())
    }

    /// Appends raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends a Latin-1 encoded string, one byte per `char` (chars above
    /// `0xFF` are replaced with `?`, matching the format's lossy nature).
    pub fn write_latin1(&mut self, s: &str) {
        for c in s.chars() {
            self.buf.push(if (c as u32) <= 0xFF { c as u8 } else { b'?' });
        }
    }

    /// Appends a NUL-terminated Latin-1 string.
    pub fn write_latin1_nul(&mut self, s: &str) {
        self.write_latin1(s);
        self.buf.push(0x00);
    }

    /// Appends a UTF-8 string verbatim.
    pub fn write_utf8(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Appends a NUL-terminated UTF-8 string.
    pub fn write_utf8_nul(&mut self, s: &str) {
        self.write_utf8(s);
        self.buf.push(0x00);
    }

    /// Appends a BOM-prefixed, NUL-NUL-terminated UTF-16LE string
    /// (ID3v2 encoding `0x01`).
    pub fn write_utf16_bom_nul(&mut self, s: &str) {
        self.buf.extend_from_slice(&[0xFF, 0xFE]);
        for unit in s.encode_utf16() {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
        self.buf.extend_from_slice(&[0x00, 0x00]);
    }

    /// Appends a NUL-NUL-terminated UTF-16BE string (no BOM,
    /// ID3v2.4 encoding `0x02`).
    pub fn write_utf16be_nul(&mut self, s: &str) {
        for unit in s.encode_utf16() {
            let mut tmp = [0u8; 2];
            BigEndian::write_u16(&mut tmp, unit);
            self.buf.extend_from_slice(&tmp);
        }
        self.buf.extend_from_slice(&[0x00, 0x00]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syncsafe_round_trip() {
        let mut w = BinaryWriter::new();
        w.write_syncsafe_u32(0x0FFF_FFFF).unwrap();
        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_syncsafe_u32().unwrap(), 0x0FFF_FFFF);
    }

    #[test]
    fn syncsafe_overflow_refuses_to_encode() {
        let mut w = BinaryWriter::new();
        assert!(w.write_syncsafe_u32(1 << 28).is_err());
    }

    #[test]
    fn read_past_end_reports_offsets() {
        let mut r = BinaryReader::new(&[1, 2]);
        let err = r.read_u32().unwrap_err();
        match err {
            Error::UnexpectedEndOfData {
                offset,
                requested,
                available,
            } => {
                assert_eq!(offset, 0);
                assert_eq!(requested, 4);
                assert_eq!(available, 2);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn seek_out_of_bounds() {
        let mut r = BinaryReader::new(&[1, 2, 3]);
        assert!(r.seek(10).is_err());
        assert!(r.seek(3).is_ok());
    }

    #[test]
    fn nul_terminated_latin1() {
        let mut w = BinaryWriter::new();
        w.write_latin1_nul("hello");
        w.write_u8(0xAA);
        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_latin1_nul().unwrap(), "hello");
        assert_eq!(r.read_u8().unwrap(), 0xAA);
    }

    #[test]
    fn utf16_bom_round_trip() {
        let mut w = BinaryWriter::new();
        w.write_utf16_bom_nul("héllo");
        let mut r = BinaryReader::new(w.as_bytes());
        assert_eq!(r.read_utf16_nul().unwrap(), "héllo");
    }
}
