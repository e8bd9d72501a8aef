//! Top-level ISOBMFF box scanning shared by `read`/`write` (§4.5): walks the
//! file's sibling boxes without ever loading `mdat`'s payload, which is
//! tracked by byte range instead.

use crate::error::{Error, Result};
use crate::io::FileReader;

use super::atom::{parse_atoms, Atom};

/// One top-level box. `atom` is `None` only for `mdat`, whose payload we
/// never parse or buffer — `payload_start`/`payload_len` describe it
/// instead.
pub(super) struct TopLevelEntry {
    pub box_type: String,
    pub atom: Option<Atom>,
    pub payload_start: u64,
    pub payload_len: u64,
}

/// Scans every sibling box in the file, parsing all but `mdat` into a full
/// [`Atom`] tree.
pub(super) fn scan_top_level(file: &mut FileReader) -> Result<Vec<TopLevelEntry>> {
    let file_size = file.file_size();
    let mut entries = Vec::new();
    let mut pos = 0u64;

    while pos + 8 <= file_size {
        let header = file.read(pos, 8)?;
        let size32 = u32::from_be_bytes(header[0..4].try_into().unwrap());
        let box_type = String::from_utf8_lossy(&header[4..8]).to_string();

        let (header_len, total_size): (u64, u64) = if size32 == 1 {
            let ext = file.read(pos + 8, 8)?;
            (16, u64::from_be_bytes(ext[..].try_into().unwrap()))
        } else if size32 == 0 {
            (8, file_size - pos)
        } else {
            (8, u64::from(size32))
        };

        if total_size < header_len || pos + total_size > file_size {
            return Err(Error::InvalidContainer(format!("box {box_type} size out of range")));
        }

        let payload_start = pos + header_len;
        let payload_len = total_size - header_len;

        let atom = if box_type == "mdat" {
            None
        } else {
            let bytes = file.read(pos, total_size as usize)?;
            let mut parsed = parse_atoms(&bytes, false)?;
            if parsed.len() != 1 {
                return Err(Error::InvalidContainer(format!("expected a single top-level {box_type} box")));
            }
            Some(parsed.remove(0))
        };

        entries.push(TopLevelEntry {
            box_type,
            atom,
            payload_start,
            payload_len,
        });
        pos += total_size;
    }

    Ok(entries)
}

/// Parses `mvhd`'s overall duration, honoring the 32/64-bit version split.
pub(super) fn mvhd_duration(mvhd: &Atom) -> Option<crate::model::Timestamp> {
    let data = &mvhd.data;
    let version = *data.first()?;
    let (ts_off, dur_len) = if version == 1 { (20, 8usize) } else { (12, 4usize) };
    let timescale = u32::from_be_bytes(data.get(ts_off..ts_off + 4)?.try_into().ok()?);
    if timescale == 0 {
        return None;
    }
    let dur_off = ts_off + 4;
    let duration = if dur_len == 8 {
        u64::from_be_bytes(data.get(dur_off..dur_off + 8)?.try_into().ok()?)
    } else {
        u64::from(u32::from_be_bytes(data.get(dur_off..dur_off + 4)?.try_into().ok()?))
    };
    Some(crate::model::Timestamp::from_millis(duration * 1000 / u64::from(timescale)))
}

/// The `hdlr` component subtype for a `trak`'s media handler (`soun`,
/// `text`, `sbtl`, …), if present.
pub(super) fn hdlr_subtype(trak: &Atom) -> Option<[u8; 4]> {
    let hdlr = trak.find("mdia")?.find("hdlr")?;
    hdlr.data.get(8..12)?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvhd_duration_reads_version_0() {
        let mut data = vec![0u8, 0, 0, 0]; // version + flags
        data.extend_from_slice(&0u32.to_be_bytes()); // creation
        data.extend_from_slice(&0u32.to_be_bytes()); // modification
        data.extend_from_slice(&1000u32.to_be_bytes()); // timescale
        data.extend_from_slice(&5000u32.to_be_bytes()); // duration
        let mvhd = Atom::leaf("mvhd", data);
        assert_eq!(mvhd_duration(&mvhd), Some(crate::model::Timestamp::from_millis(5000)));
    }
}
