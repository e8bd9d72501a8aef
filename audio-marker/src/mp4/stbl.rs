//! Sample-table helpers shared by the chapter and lyrics text tracks
//! (§4.5): expanding `stts`/`stsc` into per-sample durations and file
//! offsets, and building fresh `stsd`/`stts`/`stsc`/`stsz`/`stco`/`co64`
//! leaves for a freshly authored track.

use crate::error::{Error, Result};

use super::atom::Atom;

/// A flattened view of one track's sample table: one entry per sample,
/// already resolved to an absolute file offset.
pub struct SampleTable {
    pub timescale: u32,
    /// `(file_offset, size, duration_in_timescale_units)` per sample, in
    /// sample order.
    pub samples: Vec<(u64, u32, u32)>,
}

/// Parses `stbl`'s `stts`/`stsc`/`stsz`/`stco|co64` into a flattened
/// [`SampleTable`]. `timescale` comes from the enclosing `mdhd`.
pub fn parse_sample_table(stbl: &Atom, timescale: u32) -> Result<SampleTable> {
    let stsz = stbl.find("stsz").ok_or_else(|| Error::InvalidContainer("stbl missing stsz".to_string()))?;
    let sizes = parse_stsz(&stsz.data)?;

    let chunk_offsets = if let Some(stco) = stbl.find("stco") {
        parse_stco(&stco.data)?
    } else if let Some(co64) = stbl.find("co64") {
        parse_co64(&co64.data)?
    } else {
        return Err(Error::InvalidContainer("stbl missing stco/co64".to_string()));
    };

    let stsc = stbl.find("stsc").ok_or_else(|| Error::InvalidContainer("stbl missing stsc".to_string()))?;
    let samples_per_chunk = expand_stsc(&stsc.data, chunk_offsets.len())?;

    let stts = stbl.find("stts").ok_or_else(|| Error::InvalidContainer("stbl missing stts".to_string()))?;
    let durations = expand_stts(&stts.data, sizes.len())?;

    let mut samples = Vec::with_capacity(sizes.len());
    let mut sample_index = 0usize;
    for (chunk_index, &chunk_offset) in chunk_offsets.iter().enumerate() {
        let count = samples_per_chunk.get(chunk_index).copied().unwrap_or(0);
        let mut running = chunk_offset;
        for _ in 0..count {
            if sample_index >= sizes.len() {
                break;
            }
            let size = sizes[sample_index];
            let duration = durations.get(sample_index).copied().unwrap_or(0);
            samples.push((running, size, duration));
            running += u64::from(size);
            sample_index += 1;
        }
    }

    Ok(SampleTable { timescale, samples })
}

fn parse_stsz(data: &[u8]) -> Result<Vec<u32>> {
    if data.len() < 12 {
        return Err(Error::InvalidContainer("truncated stsz".to_string()));
    }
    let sample_size = u32::from_be_bytes(data[4..8].try_into().unwrap());
    let count = u32::from_be_bytes(data[8..12].try_into().unwrap()) as usize;
    if sample_size != 0 {
        return Ok(vec![sample_size; count]);
    }
    let mut sizes = Vec::with_capacity(count);
    let mut pos = 12;
    for _ in 0..count {
        if pos + 4 > data.len() {
            break;
        }
        sizes.push(u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap()));
        pos += 4;
    }
    Ok(sizes)
}

fn parse_stco(data: &[u8]) -> Result<Vec<u64>> {
    if data.len() < 8 {
        return Err(Error::InvalidContainer("truncated stco".to_string()));
    }
    let count = u32::from_be_bytes(data[4..8].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(count);
    let mut pos = 8;
    for _ in 0..count {
        if pos + 4 > data.len() {
            break;
        }
        out.push(u64::from(u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap())));
        pos += 4;
    }
    Ok(out)
}

fn parse_co64(data: &[u8]) -> Result<Vec<u64>> {
    if data.len() < 8 {
        return Err(Error::InvalidContainer("truncated co64".to_string()));
    }
    let count = u32::from_be_bytes(data[4..8].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(count);
    let mut pos = 8;
    for _ in 0..count {
        if pos + 8 > data.len() {
            break;
        }
        out.push(u64::from_be_bytes(data[pos..pos + 8].try_into().unwrap()));
        pos += 8;
    }
    Ok(out)
}

fn expand_stsc(data: &[u8], chunk_count: usize) -> Result<Vec<u32>> {
    if data.len() < 8 {
        return Err(Error::InvalidContainer("truncated stsc".to_string()));
    }
    let count = u32::from_be_bytes(data[4..8].try_into().unwrap()) as usize;
    let mut entries = Vec::with_capacity(count);
    let mut pos = 8;
    for _ in 0..count {
        if pos + 12 > data.len() {
            break;
        }
        let first_chunk = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap());
        let samples_per_chunk = u32::from_be_bytes(data[pos + 4..pos + 8].try_into().unwrap());
        entries.push((first_chunk, samples_per_chunk));
        pos += 12;
    }

    let mut out = vec![0u32; chunk_count];
    for (i, window) in entries.windows(2).enumerate() {
        let (first, spc) = entries[i];
        let next_first = window[1].0;
        for chunk in first..next_first {
            if let Some(slot) = out.get_mut(chunk as usize - 1) {
                *slot = spc;
            }
        }
    }
    if let Some(&(first, spc)) = entries.last() {
        for chunk in first as usize..=chunk_count {
            if chunk == 0 {
                continue;
            }
            if let Some(slot) = out.get_mut(chunk - 1) {
                *slot = spc;
            }
        }
    }
    Ok(out)
}

fn expand_stts(data: &[u8], sample_count: usize) -> Result<Vec<u32>> {
    if data.len() < 8 {
        return Err(Error::InvalidContainer("truncated stts".to_string()));
    }
    let count = u32::from_be_bytes(data[4..8].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(sample_count);
    let mut pos = 8;
    for _ in 0..count {
        if pos + 8 > data.len() {
            break;
        }
        let run = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap());
        let duration = u32::from_be_bytes(data[pos + 4..pos + 8].try_into().unwrap());
        for _ in 0..run {
            out.push(duration);
        }
        pos += 8;
    }
    out.truncate(sample_count);
    Ok(out)
}

/// Builds a minimal `stbl` for a freshly authored text/subtitle track with
/// one sample per chunk: `stsd` (using `sample_entry_type`, e.g. `text`),
/// `stts`, `stsc`, `stsz`, and `stco`/`co64` depending on `use_co64`.
/// `offsets` are absolute file offsets, already final.
pub fn build_stbl(sample_entry_type: &str, sizes: &[u32], durations: &[u32], offsets: &[u64], use_co64: bool) -> Atom {
    let stsd = build_stsd(sample_entry_type);
    let stts = build_stts(durations);
    let stsc = build_stsc(offsets.len());
    let stsz = build_stsz(sizes);
    let offsets_atom = if use_co64 { build_co64(offsets) } else { build_stco(offsets) };

    Atom::container("stbl", Vec::new(), vec![stsd, stts, stsc, stsz, offsets_atom])
}

fn build_stsd(sample_entry_type: &str) -> Atom {
    // Minimal sample entry: reserved(6) + data_reference_index(2), no
    // format-specific fields beyond that — enough for a text/subtitle
    // track authored and consumed by this crate alone.
    let mut entry_payload = vec![0u8; 6];
    entry_payload.extend_from_slice(&1u16.to_be_bytes());
    let entry = Atom::leaf(sample_entry_type, entry_payload);

    let mut prefix = vec![0u8, 0, 0, 0]; // version+flags
    prefix.extend_from_slice(&1u32.to_be_bytes()); // entry_count
    Atom::container("stsd", prefix, vec![entry])
}

fn build_stts(durations: &[u32]) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    // Run-length encode consecutive equal durations.
    let mut runs: Vec<(u32, u32)> = Vec::new();
    for &d in durations {
        if let Some(last) = runs.last_mut() {
            if last.1 == d {
                last.0 += 1;
                continue;
            }
        }
        runs.push((1, d));
    }
    data.extend_from_slice(&(runs.len() as u32).to_be_bytes());
    for (count, duration) in runs {
        data.extend_from_slice(&count.to_be_bytes());
        data.extend_from_slice(&duration.to_be_bytes());
    }
    Atom::leaf("stts", data)
}

fn build_stsc(chunk_count: usize) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    data.extend_from_slice(&1u32.to_be_bytes()); // one entry: all chunks, 1 sample each
    data.extend_from_slice(&1u32.to_be_bytes()); // first_chunk
    data.extend_from_slice(&1u32.to_be_bytes()); // samples_per_chunk
    data.extend_from_slice(&1u32.to_be_bytes()); // sample_description_index
    let _ = chunk_count;
    Atom::leaf("stsc", data)
}

fn build_stsz(sizes: &[u32]) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    data.extend_from_slice(&0u32.to_be_bytes()); // sample_size = 0 (variable)
    data.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
    for &size in sizes {
        data.extend_from_slice(&size.to_be_bytes());
    }
    Atom::leaf("stsz", data)
}

fn build_stco(offsets: &[u64]) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    data.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for &offset in offsets {
        data.extend_from_slice(&(offset as u32).to_be_bytes());
    }
    Atom::leaf("stco", data)
}

fn build_co64(offsets: &[u64]) -> Atom {
    let mut data = vec![0u8, 0, 0, 0];
    data.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for &offset in offsets {
        data.extend_from_slice(&offset.to_be_bytes());
    }
    Atom::leaf("co64", data)
}

/// Patches every chunk-offset entry in `stbl`'s `stco` by `delta`,
/// upgrading to `co64` if any resulting offset would overflow 32 bits.
pub fn patch_chunk_offsets(stbl: &mut Atom, delta: i64) -> Result<()> {
    if let Some(stco) = stbl.find("stco") {
        let offsets = parse_stco(&stco.data)?;
        let shifted: Vec<u64> = offsets.iter().map(|&o| (o as i64 + delta) as u64).collect();
        if shifted.iter().any(|&o| o > u32::MAX as u64) {
            stbl.remove_children("stco");
            let co64 = build_co64(&shifted);
            stbl.upsert_child(co64);
        } else {
            stbl.upsert_child(build_stco(&shifted));
        }
    } else if let Some(co64) = stbl.find("co64") {
        let offsets = parse_co64(&co64.data)?;
        let shifted: Vec<u64> = offsets.iter().map(|&o| (o as i64 + delta) as u64).collect();
        stbl.upsert_child(build_co64(&shifted));
    }
    Ok(())
}

/// Widens `stbl`'s `stco` to `co64` in place, without touching the offset
/// values. Used to settle a track's chunk-offset width *before* `moov` is
/// measured for the new `mdat` position, so that later calling
/// [`patch_chunk_offsets`] can never grow the box further and invalidate an
/// already-fixed `mdat` start. A no-op if `stbl` has no `stco` (already
/// `co64`, or malformed).
pub fn force_co64(stbl: &mut Atom) -> Result<()> {
    if let Some(stco) = stbl.find("stco") {
        let offsets = parse_stco(&stco.data)?;
        stbl.remove_children("stco");
        stbl.upsert_child(build_co64(&offsets));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_parse_round_trip() {
        let sizes = vec![5u32, 7, 3];
        let durations = vec![1000u32, 1000, 1000];
        let offsets = vec![100u64, 105, 112];
        let stbl = build_stbl("text", &sizes, &durations, &offsets, false);
        let table = parse_sample_table(&stbl, 1000).unwrap();
        assert_eq!(table.samples, vec![(100, 5, 1000), (105, 7, 1000), (112, 3, 1000)]);
    }

    #[test]
    fn patch_offsets_upgrades_to_co64_on_overflow() {
        let offsets = vec![10u64, 20];
        let stco = build_stco(&offsets);
        let mut stbl = Atom::container("stbl", Vec::new(), vec![stco]);
        patch_chunk_offsets(&mut stbl, (u32::MAX as i64) + 1000).unwrap();
        assert!(stbl.find("co64").is_some());
        assert!(stbl.find("stco").is_none());
    }

    #[test]
    fn force_co64_widens_without_changing_offset_values() {
        let offsets = vec![10u64, 20, 30];
        let stco = build_stco(&offsets);
        let mut stbl = Atom::container("stbl", Vec::new(), vec![stco]);

        force_co64(&mut stbl).unwrap();
        assert!(stbl.find("co64").is_some());
        assert!(stbl.find("stco").is_none());

        let co64 = stbl.find("co64").unwrap();
        assert_eq!(parse_co64(&co64.data).unwrap(), offsets);

        // Patching afterwards must not change the box's encoded length.
        let len_before = stbl.encoded_len();
        patch_chunk_offsets(&mut stbl, 5).unwrap();
        assert_eq!(stbl.encoded_len(), len_before);
    }
}
