use uuid::Uuid;

use super::artwork::Artwork;
use super::timestamp::Timestamp;
use crate::error::{Error, Result};

/// A single chapter marker.
///
/// Identity is a UUID generated at construction, stable across mutation of
/// the other fields but not preserved across read/write round-trips
/// through formats that have no concept of it (ID3 `CHAP` identifies
/// chapters by an element-id string, not a UUID; MP4 chapter tracks have
/// no chapter identity beyond ordering).
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    id: Uuid,
    start: Timestamp,
    title: String,
    end: Option<Timestamp>,
    url: Option<String>,
    artwork: Option<Artwork>,
}

impl Chapter {
    /// Builds a chapter with a required start and title and a freshly
    /// generated identity. Fails if `title` is empty.
    pub fn new(start: Timestamp, title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        if title.is_empty() {
            return Err(Error::ExportError("chapter title must not be empty".to_string()));
        }
        Ok(Chapter {
            id: Uuid::new_v4(),
            start,
            title,
            end: None,
            url: None,
            artwork: None,
        })
    }

    /// The chapter's stable identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The chapter's start timestamp.
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Sets the start timestamp.
    pub fn set_start(&mut self, start: Timestamp) {
        self.start = start;
    }

    /// The chapter's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the title. Fails if empty.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        if title.is_empty() {
            return Err(Error::ExportError("chapter title must not be empty".to_string()));
        }
        self.title = title;
        Ok(())
    }

    /// The chapter's end timestamp, if set.
    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    /// Sets the end timestamp. Fails the invariant `start < end` if
    /// violated.
    pub fn set_end(&mut self, end: Option<Timestamp>) -> Result<()> {
        if let Some(end) = end {
            if !(self.start < end) {
                return Err(Error::ExportError(format!(
                    "chapter end {end} must be strictly after start {}",
                    self.start
                )));
            }
        }
        self.end = end;
        Ok(())
    }

    /// The chapter's URL, if set.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Sets the URL.
    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url;
    }

    /// The chapter's artwork, if any.
    pub fn artwork(&self) -> Option<&Artwork> {
        self.artwork.as_ref()
    }

    /// Sets the artwork.
    pub fn set_artwork(&mut self, artwork: Option<Artwork>) {
        self.artwork = artwork;
    }
}

/// An ordered sequence of [`Chapter`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterList {
    chapters: Vec<Chapter>,
}

impl ChapterList {
    /// An empty list.
    pub fn new() -> Self {
        ChapterList::default()
    }

    /// Wraps an existing vector of chapters.
    pub fn from_vec(chapters: Vec<Chapter>) -> Self {
        ChapterList { chapters }
    }

    /// Number of chapters.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Borrows the chapters in order.
    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter()
    }

    /// Borrows the chapters as a slice.
    pub fn as_slice(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Appends a chapter to the end.
    pub fn append(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Inserts a chapter at `index`, shifting subsequent chapters right.
    pub fn insert_at(&mut self, index: usize, chapter: Chapter) {
        let index = index.min(self.chapters.len());
        self.chapters.insert(index, chapter);
    }

    /// Removes and returns the chapter at `index`, if present.
    pub fn remove_at(&mut self, index: usize) -> Option<Chapter> {
        if index < self.chapters.len() {
            Some(self.chapters.remove(index))
        } else {
            None
        }
    }

    /// Sorts the chapters by start time (stable).
    pub fn sort_by_start(&mut self) {
        self.chapters.sort_by_key(|c| c.start());
    }

    /// Returns a derived copy with every missing `end` filled in: each
    /// chapter's end becomes the next chapter's start, and the final
    /// chapter's end becomes `audio_duration`. Does not mutate `self`.
    /// Idempotent: calling it again on the result is a no-op.
    pub fn with_calculated_end_times(&self, audio_duration: Timestamp) -> ChapterList {
        let mut chapters = self.chapters.clone();
        let len = chapters.len();
        for i in 0..len {
            if chapters[i].end.is_none() {
                let next_start = if i + 1 < len {
                    Some(chapters[i + 1].start)
                } else {
                    Some(audio_duration)
                };
                chapters[i].end = next_start;
            }
        }
        ChapterList { chapters }
    }
}

impl IntoIterator for ChapterList {
    type Item = Chapter;
    type IntoIter = std::vec::IntoIter<Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.chapters.into_iter()
    }
}

impl FromIterator<Chapter> for ChapterList {
    fn from_iter<T: IntoIterator<Item = Chapter>>(iter: T) -> Self {
        ChapterList {
            chapters: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(start_ms: u64, title: &str) -> Chapter {
        Chapter::new(Timestamp::from_millis(start_ms), title).unwrap()
    }

    #[test]
    fn rejects_empty_title() {
        assert!(Chapter::new(Timestamp::ZERO, "").is_err());
    }

    #[test]
    fn end_must_be_after_start() {
        let mut c = chapter(1000, "Intro");
        assert!(c.set_end(Some(Timestamp::from_millis(500))).is_err());
        assert!(c.set_end(Some(Timestamp::from_millis(1000))).is_err());
        assert!(c.set_end(Some(Timestamp::from_millis(2000))).is_ok());
    }

    #[test]
    fn calculated_end_times_chain_and_cap_at_duration() {
        let list = ChapterList::from_vec(vec![
            chapter(0, "Intro"),
            chapter(60_000, "Main"),
            chapter(120_000, "Outro"),
        ]);
        let duration = Timestamp::from_millis(180_000);
        let filled = list.with_calculated_end_times(duration);
        assert_eq!(filled.as_slice()[0].end(), Some(Timestamp::from_millis(60_000)));
        assert_eq!(filled.as_slice()[1].end(), Some(Timestamp::from_millis(120_000)));
        assert_eq!(filled.as_slice()[2].end(), Some(duration));

        // Idempotent: every end is already set, so a second pass is a no-op.
        let filled_again = filled.with_calculated_end_times(duration);
        assert_eq!(filled, filled_again);
    }

    #[test]
    fn original_list_is_not_mutated() {
        let list = ChapterList::from_vec(vec![chapter(0, "Intro")]);
        let _ = list.with_calculated_end_times(Timestamp::from_millis(10_000));
        assert_eq!(list.as_slice()[0].end(), None);
    }
}
