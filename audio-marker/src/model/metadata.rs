use super::artwork::Artwork;
use super::lyrics::SynchronizedLyrics;

/// Private (ID3 `PRIV`-style) data blob, owner-tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateData {
    /// The owner identifier string.
    pub owner: String,
    /// The opaque payload.
    pub data: Vec<u8>,
}

/// A unique file identifier (ID3 `UFID`-style), owner-tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueFileIdentifier {
    /// The owner identifier string.
    pub owner: String,
    /// The identifier bytes.
    pub identifier: Vec<u8>,
}

/// Descriptive and professional metadata for one audio file.
///
/// All fields are optional; an absent field means "not present in the
/// source tag", not "empty string". `custom_text_fields` and
/// `custom_urls` preserve insertion order, hence `Vec<(String, String)>`
/// rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata {
    // Core
    /// Track title.
    pub title: Option<String>,
    /// Track artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Genre.
    pub genre: Option<String>,
    /// Release year, always a positive integer when present.
    pub year: Option<u32>,
    /// Track number within the album/disc.
    pub track_number: Option<u32>,
    /// Disc number within a multi-disc set.
    pub disc_number: Option<u32>,

    // Professional
    /// Composer.
    pub composer: Option<String>,
    /// Album artist (as distinct from track artist).
    pub album_artist: Option<String>,
    /// Publisher/label.
    pub publisher: Option<String>,
    /// Copyright notice.
    pub copyright: Option<String>,
    /// Encoder software/settings.
    pub encoder: Option<String>,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Beats per minute.
    pub bpm: Option<u32>,
    /// Initial musical key.
    pub key: Option<String>,
    /// Three-letter ISO 639-2 language code.
    pub language: Option<String>,
    /// International Standard Recording Code.
    pub isrc: Option<String>,
    /// Whether this track is part of a compilation album.
    pub compilation: Option<bool>,

    // URLs
    /// Artist's official URL.
    pub artist_url: Option<String>,
    /// URL of the original audio source.
    pub audio_source_url: Option<String>,
    /// URL of this audio file.
    pub audio_file_url: Option<String>,
    /// Publisher's official URL.
    pub publisher_url: Option<String>,
    /// Commercial information URL.
    pub commercial_url: Option<String>,
    /// Custom label -> URL pairs, insertion order preserved.
    pub custom_urls: Vec<(String, String)>,

    // Media
    /// Cover artwork.
    pub artwork: Option<Artwork>,
    /// Plain-text, unsynchronized lyrics.
    pub unsynchronized_lyrics: Option<String>,
    /// Time-synchronized lyrics, one entry per language.
    pub synchronized_lyrics: Vec<SynchronizedLyrics>,

    // Custom / statistics
    /// Custom label -> value text pairs, insertion order preserved.
    pub custom_text_fields: Vec<(String, String)>,
    /// Private, owner-tagged opaque data blobs.
    pub private_data: Vec<PrivateData>,
    /// Unique file identifiers.
    pub unique_file_identifiers: Vec<UniqueFileIdentifier>,
    /// Number of times the file has been played.
    pub play_count: Option<u64>,
    /// Rating, 0-255.
    pub rating: Option<u8>,
}

impl AudioMetadata {
    /// An empty set of metadata.
    pub fn new() -> Self {
        AudioMetadata::default()
    }

    /// Looks up a custom text field by label.
    pub fn custom_text_field(&self, label: &str) -> Option<&str> {
        self.custom_text_fields
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }

    /// Inserts or replaces a custom text field, preserving the position of
    /// an existing entry with the same label or appending a new one.
    pub fn set_custom_text_field(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        if let Some(entry) = self.custom_text_fields.iter_mut().find(|(k, _)| *k == label) {
            entry.1 = value;
        } else {
            self.custom_text_fields.push((label, value));
        }
    }

    /// Looks up a custom URL by label.
    pub fn custom_url(&self, label: &str) -> Option<&str> {
        self.custom_urls.iter().find(|(k, _)| k == label).map(|(_, v)| v.as_str())
    }

    /// Inserts or replaces a custom URL, preserving insertion order.
    pub fn set_custom_url(&mut self, label: impl Into<String>, url: impl Into<String>) {
        let label = label.into();
        let url = url.into();
        if let Some(entry) = self.custom_urls.iter_mut().find(|(k, _)| *k == label) {
            entry.1 = url;
        } else {
            self.custom_urls.push((label, url));
        }
    }

    /// Looks up synchronized lyrics by language code.
    pub fn synchronized_lyrics_for(&self, language: &str) -> Option<&SynchronizedLyrics> {
        self.synchronized_lyrics.iter().find(|l| l.language() == language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_text_fields_preserve_insertion_order() {
        let mut meta = AudioMetadata::new();
        meta.set_custom_text_field("b", "2");
        meta.set_custom_text_field("a", "1");
        meta.set_custom_text_field("b", "2-updated");
        assert_eq!(
            meta.custom_text_fields,
            vec![("b".to_string(), "2-updated".to_string()), ("a".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn custom_url_lookup() {
        let mut meta = AudioMetadata::new();
        meta.set_custom_url("Homepage", "https://example.com");
        assert_eq!(meta.custom_url("Homepage"), Some("https://example.com"));
        assert_eq!(meta.custom_url("Missing"), None);
    }
}
