//! Facade-wide configuration (§6).

/// Which ID3v2 minor version new tags are emitted as.
///
/// Reading always accepts both; this only controls `write`/`modify` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Id3Version {
    /// ID3v2.3: plain `u32` frame sizes, `TYER` for year.
    #[default]
    V23,
    /// ID3v2.4: syncsafe frame sizes, `TDRC` for year, UTF-8 text frames.
    V24,
}

/// Options accepted by [`crate::facade::Facade`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMarkerConfig {
    /// ID3v2 minor version to emit. Default `v2.3`.
    pub id3_version: Id3Version,
    /// Run [`crate::validation`]'s default rule set before every write. Default `true`.
    pub validate_before_writing: bool,
    /// Preserve frames/atoms the codec doesn't understand. Default `true`.
    pub preserve_unknown_data: bool,
    /// Padding, in bytes, appended after the frame block on ID3v2 write. Default `2048`.
    pub id3_padding_size: usize,
}

impl Default for AudioMarkerConfig {
    fn default() -> Self {
        AudioMarkerConfig {
            id3_version: Id3Version::default(),
            validate_before_writing: true,
            preserve_unknown_data: true,
            id3_padding_size: 2048,
        }
    }
}
