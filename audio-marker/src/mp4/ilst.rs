//! `moov/udta/meta/ilst` item list <-> [`AudioMetadata`] (§4.5 "ilst items").

use crate::error::Result;
use crate::model::{Artwork, ArtworkFormat, AudioMetadata};

use super::atom::Atom;

const DATA_FLAG_UTF8: u32 = 1;
const DATA_FLAG_JPEG: u32 = 13;
const DATA_FLAG_PNG: u32 = 14;
const DATA_FLAG_INT: u32 = 21;
const DATA_FLAG_BINARY: u32 = 0;

const TEXT_ITEMS: &[(&str, fn(&mut AudioMetadata, String))] = &[
    ("\u{a9}nam", |m, v| m.title = Some(v)),
    ("\u{a9}ART", |m, v| m.artist = Some(v)),
    ("\u{a9}alb", |m, v| m.album = Some(v)),
    ("\u{a9}day", |m, v| m.year = v.chars().take(4).collect::<String>().parse().ok()),
    ("\u{a9}cmt", |m, v| m.comment = Some(v)),
    ("\u{a9}gen", |m, v| m.genre = Some(v)),
    ("aART", |m, v| m.album_artist = Some(v)),
    ("\u{a9}wrt", |m, v| m.composer = Some(v)),
    ("\u{a9}lyr", |m, v| m.unsynchronized_lyrics = Some(v)),
    ("cprt", |m, v| m.copyright = Some(v)),
];

/// Builds an `ilst` [`Atom`] from `metadata`.
pub fn encode_ilst(metadata: &AudioMetadata) -> Atom {
    let mut items = Vec::new();

    macro_rules! text_item {
        ($key:expr, $value:expr) => {
            if let Some(v) = $value {
                items.push(text_item_atom($key, v));
            }
        };
    }
    text_item!("\u{a9}nam", &metadata.title);
    text_item!("\u{a9}ART", &metadata.artist);
    text_item!("\u{a9}alb", &metadata.album);
    if let Some(year) = metadata.year {
        items.push(text_item_atom("\u{a9}day", &year.to_string()));
    }
    text_item!("\u{a9}cmt", &metadata.comment);
    text_item!("\u{a9}gen", &metadata.genre);
    text_item!("aART", &metadata.album_artist);
    text_item!("\u{a9}wrt", &metadata.composer);
    text_item!("\u{a9}lyr", &metadata.unsynchronized_lyrics);
    text_item!("cprt", &metadata.copyright);

    if let Some(track) = metadata.track_number {
        items.push(number_pair_item("trkn", track, None));
    }
    if let Some(disc) = metadata.disc_number {
        items.push(number_pair_item("disk", disc, None));
    }
    if let Some(bpm) = metadata.bpm {
        items.push(int_item("tmpo", bpm as i64, 2));
    }
    if let Some(art) = &metadata.artwork {
        items.push(artwork_item(art));
    }
    for (label, value) in &metadata.custom_text_fields {
        items.push(freeform_item(label, value));
    }

    Atom::container("ilst", Vec::new(), items)
}

/// Folds every known `ilst` item into `metadata`. Unknown/custom keys this
/// crate doesn't map are left untouched in the returned atom, so the
/// caller can keep the original `ilst` children it doesn't recognize.
pub fn decode_ilst(ilst: &Atom, metadata: &mut AudioMetadata) -> Result<()> {
    for item in ilst.children_or_empty() {
        if let Some((_, setter)) = TEXT_ITEMS.iter().find(|(k, _)| *k == item.box_type) {
            if let Some(text) = text_value(item) {
                setter(metadata, text);
            }
            continue;
        }

        match item.box_type.as_str() {
            "trkn" => {
                if let Some((n, _)) = number_pair_value(item) {
                    metadata.track_number = Some(n);
                }
            },
            "disk" => {
                if let Some((n, _)) = number_pair_value(item) {
                    metadata.disc_number = Some(n);
                }
            },
            "gnre" => {
                if let Some(text) = text_value(item) {
                    metadata.genre = Some(text);
                }
            },
            "tmpo" => {
                if let Some(n) = int_value(item) {
                    metadata.bpm = Some(n.max(0) as u32);
                }
            },
            "covr" => {
                if let Some(art) = artwork_value(item) {
                    metadata.artwork = Some(art);
                }
            },
            "----" => {
                if let Some((name, value)) = freeform_value(item) {
                    metadata.set_custom_text_field(name, value);
                }
                // Binary `----` payloads are preserved as unknown atoms
                // by the caller (they're never removed from `ilst`), but
                // not exposed in the model, per spec.md §9.
            },
            _ => {},
        }
    }
    Ok(())
}

/// Builds an `ilst` from `metadata`, then carries over every child of
/// `existing` this crate doesn't map to a metadata field — used by
/// `modify`, which must not drop custom item keys it can't interpret.
pub fn merge_ilst(metadata: &AudioMetadata, existing: Option<&Atom>) -> Atom {
    let mut atom = encode_ilst(metadata);
    let Some(existing) = existing else { return atom };

    let known_keys: Vec<&str> = TEXT_ITEMS
        .iter()
        .map(|(k, _)| *k)
        .chain(["trkn", "disk", "gnre", "tmpo", "covr"])
        .collect();
    let custom_labels: Vec<&str> = metadata.custom_text_fields.iter().map(|(k, _)| k.as_str()).collect();

    let children = atom.children.get_or_insert_with(Vec::new);
    for child in existing.children_or_empty() {
        if known_keys.contains(&child.box_type.as_str()) {
            continue;
        }
        if child.box_type == "----" {
            if let Some((name, _)) = freeform_value(child) {
                if custom_labels.contains(&name.as_str()) {
                    continue;
                }
            }
        }
        children.push(child.clone());
    }
    atom
}

fn data_children<'a>(item: &'a Atom) -> impl Iterator<Item = &'a Atom> {
    item.find_all("data")
}

fn first_data(item: &Atom) -> Option<&Atom> {
    data_children(item).next()
}

fn data_payload(data: &Atom) -> Option<(u32, &[u8])> {
    if data.data.len() < 8 {
        return None;
    }
    let flags = u32::from_be_bytes([0, data.data[1], data.data[2], data.data[3]]);
    Some((flags, &data.data[8..]))
}

fn text_value(item: &Atom) -> Option<String> {
    let data = first_data(item)?;
    let (flags, payload) = data_payload(data)?;
    if flags != DATA_FLAG_UTF8 {
        return None;
    }
    String::from_utf8(payload.to_vec()).ok()
}

fn int_value(item: &Atom) -> Option<i64> {
    let data = first_data(item)?;
    let (flags, payload) = data_payload(data)?;
    if flags != DATA_FLAG_INT {
        return None;
    }
    Some(match payload.len() {
        1 => payload[0] as i8 as i64,
        2 => i16::from_be_bytes([payload[0], payload[1]]) as i64,
        4 => i32::from_be_bytes(payload[0..4].try_into().ok()?) as i64,
        8 => i64::from_be_bytes(payload[0..8].try_into().ok()?),
        _ => return None,
    })
}

fn number_pair_value(item: &Atom) -> Option<(u32, Option<u32>)> {
    let data = first_data(item)?;
    let (flags, payload) = data_payload(data)?;
    if flags != DATA_FLAG_BINARY || payload.len() < 6 {
        return None;
    }
    let index = u16::from_be_bytes([payload[2], payload[3]]) as u32;
    let total = u16::from_be_bytes([payload[4], payload[5]]) as u32;
    Some((index, if total > 0 { Some(total) } else { None }))
}

fn artwork_value(item: &Atom) -> Option<Artwork> {
    let data = first_data(item)?;
    let (flags, payload) = data_payload(data)?;
    let format = match flags {
        DATA_FLAG_JPEG => ArtworkFormat::Jpeg,
        DATA_FLAG_PNG => ArtworkFormat::Png,
        _ => return Artwork::from_bytes(payload.to_vec()).ok(),
    };
    Some(Artwork::with_format(format, payload.to_vec()))
}

fn freeform_value(item: &Atom) -> Option<(String, String)> {
    let name = item.find("name")?;
    if name.data.len() < 4 {
        return None;
    }
    let name_str = String::from_utf8(name.data[4..].to_vec()).ok()?;
    let data = first_data(item)?;
    let (flags, payload) = data_payload(data)?;
    if flags != DATA_FLAG_UTF8 {
        return None;
    }
    let value = String::from_utf8(payload.to_vec()).ok()?;
    Some((name_str, value))
}

fn build_data_atom(flags: u32, payload: Vec<u8>) -> Atom {
    let mut data = Vec::with_capacity(8 + payload.len());
    data.push(0); // version
    data.extend_from_slice(&flags.to_be_bytes()[1..]); // 24-bit flags
    data.extend_from_slice(&[0, 0, 0, 0]); // locale
    data.extend_from_slice(&payload);
    Atom::leaf("data", data)
}

fn text_item_atom(key: &str, value: &str) -> Atom {
    Atom::container(key, Vec::new(), vec![build_data_atom(DATA_FLAG_UTF8, value.as_bytes().to_vec())])
}

fn number_pair_item(key: &str, index: u32, total: Option<u32>) -> Atom {
    let mut payload = vec![0u8, 0u8];
    payload.extend_from_slice(&(index as u16).to_be_bytes());
    payload.extend_from_slice(&(total.unwrap_or(0) as u16).to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    Atom::container(key, Vec::new(), vec![build_data_atom(DATA_FLAG_BINARY, payload)])
}

fn int_item(key: &str, value: i64, width: usize) -> Atom {
    let payload = match width {
        1 => vec![value as u8],
        2 => (value as i16).to_be_bytes().to_vec(),
        4 => (value as i32).to_be_bytes().to_vec(),
        _ => value.to_be_bytes().to_vec(),
    };
    Atom::container(key, Vec::new(), vec![build_data_atom(DATA_FLAG_INT, payload)])
}

fn artwork_item(art: &Artwork) -> Atom {
    let flags = match art.format() {
        ArtworkFormat::Jpeg => DATA_FLAG_JPEG,
        ArtworkFormat::Png => DATA_FLAG_PNG,
    };
    Atom::container("covr", Vec::new(), vec![build_data_atom(flags, art.data().to_vec())])
}

fn freeform_item(name: &str, value: &str) -> Atom {
    let mut mean_payload = vec![0, 0, 0, 0];
    mean_payload.extend_from_slice(b"com.apple.iTunes");
    let mean = Atom::leaf("mean", mean_payload);

    let mut name_payload = vec![0, 0, 0, 0];
    name_payload.extend_from_slice(name.as_bytes());
    let name_atom = Atom::leaf("name", name_payload);

    let data = build_data_atom(DATA_FLAG_UTF8, value.as_bytes().to_vec());
    Atom::container("----", Vec::new(), vec![mean, name_atom, data])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_round_trips() {
        let mut meta = AudioMetadata::new();
        meta.title = Some("M4A Written".to_string());
        let ilst = encode_ilst(&meta);

        let mut decoded = AudioMetadata::new();
        decode_ilst(&ilst, &mut decoded).unwrap();
        assert_eq!(decoded.title.as_deref(), Some("M4A Written"));
    }

    #[test]
    fn track_and_disc_pair_round_trip() {
        let mut meta = AudioMetadata::new();
        meta.track_number = Some(5);
        meta.disc_number = Some(2);
        let ilst = encode_ilst(&meta);

        let mut decoded = AudioMetadata::new();
        decode_ilst(&ilst, &mut decoded).unwrap();
        assert_eq!(decoded.track_number, Some(5));
        assert_eq!(decoded.disc_number, Some(2));
    }

    #[test]
    fn artwork_round_trips_as_png() {
        let mut meta = AudioMetadata::new();
        let mut png_bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        png_bytes.extend_from_slice(&[1, 2, 3, 4]);
        meta.artwork = Some(Artwork::from_bytes(png_bytes).unwrap());
        let ilst = encode_ilst(&meta);

        let mut decoded = AudioMetadata::new();
        decode_ilst(&ilst, &mut decoded).unwrap();
        assert_eq!(decoded.artwork.unwrap().format(), ArtworkFormat::Png);
    }

    #[test]
    fn merge_keeps_unknown_items_and_overwrites_known_ones() {
        let mut original = AudioMetadata::new();
        original.title = Some("Old Title".to_string());
        original.set_custom_text_field("MOOD", "Mellow");
        let old_ilst = encode_ilst(&original);

        let mut update = AudioMetadata::new();
        update.title = Some("New Title".to_string());
        let merged = merge_ilst(&update, Some(&old_ilst));

        let mut decoded = AudioMetadata::new();
        decode_ilst(&merged, &mut decoded).unwrap();
        assert_eq!(decoded.title.as_deref(), Some("New Title"));
        assert_eq!(decoded.custom_text_field("MOOD"), Some("Mellow"));
    }

    #[test]
    fn freeform_custom_field_round_trips() {
        let mut meta = AudioMetadata::new();
        meta.set_custom_text_field("MOOD", "Energetic");
        let ilst = encode_ilst(&meta);

        let mut decoded = AudioMetadata::new();
        decode_ilst(&ilst, &mut decoded).unwrap();
        assert_eq!(decoded.custom_text_field("MOOD"), Some("Energetic"));
    }
}
