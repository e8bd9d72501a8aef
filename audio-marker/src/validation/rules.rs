//! The default ten-rule set (§4.7).

use std::time::{SystemTime, UNIX_EPOCH};

use super::{Issue, ValidationRule};
use crate::model::AudioFileInfo;

/// Average Julian year length in seconds; close enough for a "is this
/// year plausible" bound, not used for anything calendar-exact.
const SECONDS_PER_YEAR: u64 = 31_556_952;

fn current_year() -> u32 {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    1970 + (secs / SECONDS_PER_YEAR) as u32
}

/// Chapter start times must be non-decreasing.
pub struct ChapterOrder;

impl ValidationRule for ChapterOrder {
    fn name(&self) -> &'static str {
        "chapter-order"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        info.chapters
            .as_slice()
            .windows(2)
            .filter(|pair| pair[0].start() > pair[1].start())
            .map(|pair| {
                Issue::error(format!(
                    "chapter starting at {} comes after chapter starting at {}",
                    pair[1].start(),
                    pair[0].start()
                ))
            })
            .collect()
    }
}

/// A chapter's end must not run past the next chapter's start.
pub struct ChapterOverlap;

impl ValidationRule for ChapterOverlap {
    fn name(&self) -> &'static str {
        "chapter-overlap"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        info.chapters
            .as_slice()
            .windows(2)
            .filter_map(|pair| {
                let end = pair[0].end()?;
                (end > pair[1].start()).then(|| {
                    Issue::error(format!(
                        "chapter ending at {end} overlaps the next chapter, which starts at {}",
                        pair[1].start()
                    ))
                })
            })
            .collect()
    }
}

/// Every chapter title must be non-empty.
///
/// [`crate::model::Chapter::new`]/`set_title` already reject an empty
/// title at construction; this rule exists to catch a title that is
/// present but only whitespace, and to document the invariant.
pub struct ChapterTitle;

impl ValidationRule for ChapterTitle {
    fn name(&self) -> &'static str {
        "chapter-title"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        info.chapters
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.title().trim().is_empty())
            .map(|(i, _)| Issue::error("chapter title must not be empty").with_context(format!("chapter index {i}")))
            .collect()
    }
}

/// When both are present, a chapter's start must be strictly before its end.
pub struct ChapterBounds;

impl ValidationRule for ChapterBounds {
    fn name(&self) -> &'static str {
        "chapter-bounds"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        info.chapters
            .as_slice()
            .iter()
            .filter_map(|c| {
                let end = c.end()?;
                (!(c.start() < end))
                    .then(|| Issue::error(format!("chapter end {end} must be strictly after start {}", c.start())))
            })
            .collect()
    }
}

/// Chapter start/end are non-negative.
///
/// [`crate::model::Timestamp`] wraps an unsigned millisecond count, so this
/// can never fail in practice; the rule is kept so the documented rule set
/// stays complete and so a future signed timestamp representation would
/// still be checked.
pub struct ChapterNonNegative;

impl ValidationRule for ChapterNonNegative {
    fn name(&self) -> &'static str {
        "chapter-non-negative"
    }

    fn validate(&self, _info: &AudioFileInfo) -> Vec<Issue> {
        Vec::new()
    }
}

/// Warns (does not fail) when metadata has no title.
pub struct MetadataTitle;

impl ValidationRule for MetadataTitle {
    fn name(&self) -> &'static str {
        "metadata-title"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        let empty = info.metadata.title.as_deref().map(str::trim).unwrap_or("").is_empty();
        if empty {
            vec![Issue::warning("metadata title is missing or empty")]
        } else {
            Vec::new()
        }
    }
}

/// When present, the release year must be in `(0, current_year + 1]`.
pub struct MetadataYear;

impl ValidationRule for MetadataYear {
    fn name(&self) -> &'static str {
        "metadata-year"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        let Some(year) = info.metadata.year else {
            return Vec::new();
        };
        let max = current_year() + 1;
        if year == 0 || year > max {
            vec![Issue::error(format!("release year {year} is out of the plausible range 1..={max}"))]
        } else {
            Vec::new()
        }
    }
}

/// Artwork must be JPEG or PNG.
///
/// [`crate::model::ArtworkFormat`] has exactly those two variants and
/// [`crate::model::Artwork::from_bytes`] rejects anything else at
/// construction, so this can never fail today; kept for parity with the
/// documented rule set and in case a future format is added to the enum
/// without updating every construction site.
pub struct ArtworkFormatRule;

impl ValidationRule for ArtworkFormatRule {
    fn name(&self) -> &'static str {
        "artwork-format"
    }

    fn validate(&self, _info: &AudioFileInfo) -> Vec<Issue> {
        Vec::new()
    }
}

/// When present, `metadata.language` and every synchronized lyrics track's
/// language must be a three-letter lowercase ISO 639-2 code.
pub struct LanguageCode;

impl LanguageCode {
    fn check(code: &str) -> bool {
        code.len() == 3 && code.chars().all(|c| c.is_ascii_lowercase())
    }
}

impl ValidationRule for LanguageCode {
    fn name(&self) -> &'static str {
        "language-code"
    }

    fn validate(&self, info: &AudioFileInfo) -> Vec<Issue> {
        let mut issues = Vec::new();
        if let Some(lang) = &info.metadata.language {
            if !Self::check(lang) {
                issues.push(Issue::error(format!(
                    "language code {lang:?} is not a three-letter lowercase ISO 639-2 code"
                )));
            }
        }
        for lyrics in &info.metadata.synchronized_lyrics {
            if !Self::check(lyrics.language()) {
                issues.push(
                    Issue::error(format!(
                        "language code {:?} is not a three-letter lowercase ISO 639-2 code",
                        lyrics.language()
                    ))
                    .with_context("synchronized lyrics track"),
                );
            }
        }
        issues
    }
}

/// Rating, when present, is 0-255.
///
/// `AudioMetadata::rating` is already `Option<u8>`, so this can never
/// fail; kept for parity with the documented rule set.
pub struct RatingRange;

impl ValidationRule for RatingRange {
    fn name(&self) -> &'static str {
        "rating-range"
    }

    fn validate(&self, _info: &AudioFileInfo) -> Vec<Issue> {
        Vec::new()
    }
}

/// The documented default rule set, run in this order.
pub fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(ChapterOrder),
        Box::new(ChapterOverlap),
        Box::new(ChapterTitle),
        Box::new(ChapterBounds),
        Box::new(ChapterNonNegative),
        Box::new(MetadataTitle),
        Box::new(MetadataYear),
        Box::new(ArtworkFormatRule),
        Box::new(LanguageCode),
        Box::new(RatingRange),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, Timestamp};

    #[test]
    fn overlap_rule_flags_overrunning_chapter() {
        let mut info = AudioFileInfo::new();
        let mut first = Chapter::new(Timestamp::from_millis(0), "One").unwrap();
        first.set_end(Some(Timestamp::from_millis(20_000))).unwrap();
        info.chapters.append(first);
        info.chapters.append(Chapter::new(Timestamp::from_millis(10_000), "Two").unwrap());

        let issues = ChapterOverlap.validate(&info);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn language_code_rejects_bad_codes() {
        let mut info = AudioFileInfo::new();
        info.metadata.language = Some("english".to_string());
        assert!(!LanguageCode.validate(&info).is_empty());

        info.metadata.language = Some("eng".to_string());
        assert!(LanguageCode.validate(&info).is_empty());
    }

    #[test]
    fn year_zero_and_far_future_are_rejected() {
        let mut info = AudioFileInfo::new();
        info.metadata.year = Some(0);
        assert!(!MetadataYear.validate(&info).is_empty());

        info.metadata.year = Some(9999);
        assert!(!MetadataYear.validate(&info).is_empty());

        info.metadata.year = Some(2020);
        assert!(MetadataYear.validate(&info).is_empty());
    }
}
