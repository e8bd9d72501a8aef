//! The ISOBMFF box tree (§4.5): a generic recursive parser/serializer used
//! for every top-level box except `mdat`, whose payload is never loaded
//! into memory (see `mp4/read.rs`/`mp4/write.rs`, which track it by byte
//! range instead).

use crate::error::{Error, Result};

/// Box types this crate recurses into as plain containers (no leading
/// version/flags prefix). `meta` is handled separately since it's a full
/// box with a 4-byte prefix before its children.
const CONTAINERS: &[&str] = &[
    "moov", "trak", "mdia", "minf", "stbl", "udta", "edts", "mvex", "dinf", "ilst",
];

/// One parsed ISOBMFF box.
///
/// `data` holds either the entire leaf payload (when `children` is
/// `None`) or just the bytes preceding the first child (empty for a plain
/// container, the 4-byte version+flags prefix for `meta`). Re-serializing
/// an `Atom` recomputes its size from `data` plus its children's encoded
/// lengths, so edits to a child automatically propagate to every
/// ancestor's size field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub box_type: String,
    pub data: Vec<u8>,
    pub children: Option<Vec<Atom>>,
}

impl Atom {
    /// A leaf box with an opaque payload.
    pub fn leaf(box_type: impl Into<String>, data: Vec<u8>) -> Self {
        Atom {
            box_type: box_type.into(),
            data,
            children: None,
        }
    }

    /// A container box; `prefix` is whatever precedes the first child
    /// (empty for a plain container, 4 bytes for `meta`).
    pub fn container(box_type: impl Into<String>, prefix: Vec<u8>, children: Vec<Atom>) -> Self {
        Atom {
            box_type: box_type.into(),
            data: prefix,
            children: Some(children),
        }
    }

    /// The first direct child with this box type, if any.
    pub fn find(&self, box_type: &str) -> Option<&Atom> {
        self.children.as_ref()?.iter().find(|c| c.box_type == box_type)
    }

    /// The first direct child with this box type, mutably.
    pub fn find_mut(&mut self, box_type: &str) -> Option<&mut Atom> {
        self.children.as_mut()?.iter_mut().find(|c| c.box_type == box_type)
    }

    /// Every direct child with this box type, in order.
    pub fn find_all<'a>(&'a self, box_type: &'a str) -> impl Iterator<Item = &'a Atom> {
        self.children.iter().flatten().filter(move |c| c.box_type == box_type)
    }

    /// Direct children, or an empty slice for a leaf.
    pub fn children_or_empty(&self) -> &[Atom] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Replaces the first child of type `box_type`, or appends `child` if
    /// none exists. No-op (promotes to a container) if `self` was a leaf.
    pub fn upsert_child(&mut self, child: Atom) {
        let children = self.children.get_or_insert_with(Vec::new);
        if let Some(existing) = children.iter_mut().find(|c| c.box_type == child.box_type) {
            *existing = child;
        } else {
            children.push(child);
        }
    }

    /// Removes every direct child of type `box_type`.
    pub fn remove_children(&mut self, box_type: &str) {
        if let Some(children) = &mut self.children {
            children.retain(|c| c.box_type != box_type);
        }
    }

    /// This atom's total encoded size (header + payload), recursively.
    pub fn encoded_len(&self) -> u64 {
        header_len(self.body_len()) + self.body_len()
    }

    fn body_len(&self) -> u64 {
        match &self.children {
            Some(children) => self.data.len() as u64 + children.iter().map(Atom::encoded_len).sum::<u64>(),
            None => self.data.len() as u64,
        }
    }

    /// Serializes this atom (header, prefix/leaf payload, and children)
    /// onto `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let body_len = self.body_len();
        let total = header_len(body_len) + body_len;
        if total > u32::MAX as u64 {
            out.extend_from_slice(&1u32.to_be_bytes());
            out.extend_from_slice(self.box_type.as_bytes());
            out.extend_from_slice(&total.to_be_bytes());
        } else {
            out.extend_from_slice(&(total as u32).to_be_bytes());
            out.extend_from_slice(self.box_type.as_bytes());
        }
        out.extend_from_slice(&self.data);
        if let Some(children) = &self.children {
            for child in children {
                child.write_to(out);
            }
        }
    }
}

fn header_len(body_len: u64) -> u64 {
    if body_len + 8 > u32::MAX as u64 {
        16
    } else {
        8
    }
}

/// Parses every sibling box in `buf`. `force_container` treats every box
/// encountered at this level as a container regardless of its type name —
/// used for `ilst`'s direct children, which are iTunes item atoms (e.g.
/// `©nam`) that always wrap one or more `data`/`mean`/`name` leaves.
pub fn parse_atoms(buf: &[u8], force_container: bool) -> Result<Vec<Atom>> {
    let mut atoms = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= buf.len() {
        let (atom, consumed) = parse_one(buf, pos, force_container)?;
        if consumed == 0 {
            return Err(Error::InvalidContainer("zero-length box".to_string()));
        }
        atoms.push(atom);
        pos += consumed;
    }
    Ok(atoms)
}

fn parse_one(buf: &[u8], pos: usize, force_container: bool) -> Result<(Atom, usize)> {
    if pos + 8 > buf.len() {
        return Err(Error::InvalidContainer("truncated box header".to_string()));
    }
    let size32 = u32::from_be_bytes(buf[pos..pos + 4].try_into().unwrap());
    let box_type = String::from_utf8_lossy(&buf[pos + 4..pos + 8]).to_string();

    let (header_bytes, total_size): (usize, u64) = if size32 == 1 {
        if pos + 16 > buf.len() {
            return Err(Error::InvalidContainer(format!("box {box_type} has truncated extended size")));
        }
        let size64 = u64::from_be_bytes(buf[pos + 8..pos + 16].try_into().unwrap());
        (16, size64)
    } else if size32 == 0 {
        (8, (buf.len() - pos) as u64)
    } else {
        (8, u64::from(size32))
    };

    if total_size < header_bytes as u64 || pos as u64 + total_size > buf.len() as u64 {
        return Err(Error::InvalidContainer(format!("box {box_type} size out of range")));
    }

    let payload_start = pos + header_bytes;
    let payload_end = pos + total_size as usize;
    let payload = &buf[payload_start..payload_end];

    let atom = if box_type == "meta" {
        if payload.len() < 4 {
            return Err(Error::InvalidContainer("truncated meta box".to_string()));
        }
        let prefix = payload[0..4].to_vec();
        let children = parse_atoms(&payload[4..], false)?;
        Atom::container(box_type, prefix, children)
    } else if force_container || CONTAINERS.contains(&box_type.as_str()) {
        let child_force = box_type == "ilst";
        let children = parse_atoms(payload, child_force)?;
        Atom::container(box_type, Vec::new(), children)
    } else {
        Atom::leaf(box_type, payload.to_vec())
    };

    Ok((atom, total_size as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_container() {
        let mvhd = Atom::leaf("mvhd", vec![1, 2, 3, 4]);
        let moov = Atom::container("moov", Vec::new(), vec![mvhd]);
        let mut bytes = Vec::new();
        moov.write_to(&mut bytes);

        let parsed = parse_atoms(&bytes, false).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].box_type, "moov");
        assert_eq!(parsed[0].find("mvhd").unwrap().data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn meta_prefix_is_preserved() {
        let hdlr = Atom::leaf("hdlr", vec![9, 9]);
        let meta = Atom::container("meta", vec![0, 0, 0, 0], vec![hdlr]);
        let mut bytes = Vec::new();
        meta.write_to(&mut bytes);

        let parsed = parse_atoms(&bytes, false).unwrap();
        assert_eq!(parsed[0].data, vec![0, 0, 0, 0]);
        assert_eq!(parsed[0].find("hdlr").unwrap().data, vec![9, 9]);
    }

    #[test]
    fn ilst_items_recurse_regardless_of_name() {
        let data_atom = Atom::leaf("data", vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, b'h', b'i']);
        let nam = Atom::container("\u{a9}nam", Vec::new(), vec![data_atom]);
        let ilst = Atom::container("ilst", Vec::new(), vec![nam]);
        let mut bytes = Vec::new();
        ilst.write_to(&mut bytes);

        let parsed = parse_atoms(&bytes, false).unwrap();
        let item = parsed[0].find("\u{a9}nam").unwrap();
        assert!(item.children.is_some());
        assert_eq!(item.find("data").unwrap().data[8..], *b"hi");
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(parse_atoms(&[0, 0, 0], false).is_err());
    }
}
