//! Markdown chapter export format (§4.6): `- [HH:MM:SS] Title` per
//! chapter. Export-only — there is no canonical Markdown chapter dialect
//! to parse back.

use crate::error::Result;
use crate::model::ChapterList;

/// Emits `chapters` as a Markdown bullet list with truncated
/// second-precision timestamps.
pub fn emit(chapters: &ChapterList) -> Result<String> {
    let mut out = String::new();
    for chapter in chapters.iter() {
        let formatted = chapter.start().format();
        let without_millis = formatted.split('.').next().unwrap_or(&formatted);
        out.push_str(&format!("- [{without_millis}] {}\n", chapter.title()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, Timestamp};

    #[test]
    fn emits_bullet_list_without_milliseconds() {
        let mut list = ChapterList::new();
        list.append(Chapter::new(Timestamp::from_millis(3_723_456), "Intro").unwrap());
        let text = emit(&list).unwrap();
        assert_eq!(text, "- [01:02:03] Intro\n");
    }
}
