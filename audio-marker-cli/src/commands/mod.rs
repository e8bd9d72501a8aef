//! Subcommand implementations, one module per top-level command.

mod artwork;
mod batch;
mod chapters;
mod info;
mod lyrics;
mod read;
mod strip;
mod validate;
mod write;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::Command;

/// A CLI-level failure, mapped to an exit code in `main`.
pub enum CliError {
    /// Bad arguments or preconditions the user can fix without re-running
    /// with different data (exit code 2).
    Usage(String),
    /// The operation itself failed (exit code 1).
    Operation(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(message) | CliError::Operation(message) => write!(f, "{message}"),
        }
    }
}

impl From<audio_marker::Error> for CliError {
    fn from(err: audio_marker::Error) -> Self {
        CliError::Operation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Routes a parsed [`Command`] to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Read { file, format } => read::run(&file, format),
        Command::Write {
            file,
            replace,
            title,
            artist,
            album,
            genre,
            year,
            track_number,
            disc_number,
            composer,
            album_artist,
            comment,
            publisher,
            copyright,
            language,
            rating,
        } => {
            let fields = WriteFields {
                title,
                artist,
                album,
                genre,
                year,
                track_number,
                disc_number,
                composer,
                album_artist,
                comment,
                publisher,
                copyright,
                language,
                rating,
            };
            write::run(&file, replace, &fields)
        }
        Command::Chapters { action } => chapters::run(action),
        Command::Lyrics { action } => lyrics::run(action),
        Command::Artwork { action } => artwork::run(action),
        Command::Validate { file } => validate::run(&file),
        Command::Strip { file, force } => strip::run(&file, force),
        Command::Batch { action } => batch::run(action),
        Command::Info { file } => info::run(&file),
    }
}

/// `Command::Write`'s scalar fields, collected so `write::run` works with a
/// plain struct instead of the whole enum variant.
pub(crate) struct WriteFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub composer: Option<String>,
    pub album_artist: Option<String>,
    pub comment: Option<String>,
    pub publisher: Option<String>,
    pub copyright: Option<String>,
    pub language: Option<String>,
    pub rating: Option<u8>,
}

/// Resolves a user-supplied `--format`, falling back to guessing from
/// `path`'s extension (§10 supplemental CLI convenience).
pub(crate) fn resolve_chapter_format(
    explicit: Option<crate::cli::ChapterFormatArg>,
    path: &Path,
) -> Result<audio_marker::exchange::ChapterFormat> {
    if let Some(format) = explicit {
        return Ok(format.into());
    }
    audio_marker::exchange::ChapterFormat::from_extension(&path.to_string_lossy())
        .ok_or_else(|| CliError::Usage(format!("cannot guess a chapter format from {}; pass --format", path.display())))
}

/// Expands a `pattern` argument into a sorted, deduplicated file list:
/// a plain path (file or directory, optionally recursed) or a simple glob
/// (`*`/`?` wildcards in the final path component) against its parent
/// directory.
pub(crate) fn expand_pattern(pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let path = Path::new(pattern);
    let mut files = Vec::new();

    if path.is_dir() {
        collect_dir(path, recursive, &mut files)?;
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let glob_name = path
            .file_name()
            .ok_or_else(|| CliError::Usage(format!("{pattern} is not a valid glob pattern")))?
            .to_string_lossy()
            .to_string();
        let entries = std::fs::read_dir(parent).map_err(|e| CliError::Usage(format!("cannot read {}: {e}", parent.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| CliError::Operation(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if glob_match(&glob_name, &name) && entry.path().is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    files.dedup();
    if files.is_empty() {
        return Err(CliError::Usage(format!("no files matched {pattern}")));
    }
    Ok(files)
}

fn collect_dir(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CliError::Operation(format!("cannot read {}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| CliError::Operation(e.to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_dir(&path, recursive, out)?;
            }
        } else if is_audio_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("mp3" | "m4a" | "m4b")
    )
}

/// A minimal shell-style glob matcher supporting `*` (any run of
/// characters) and `?` (exactly one character). No character classes, no
/// recursive `**` — the CLI's `--recursive` flag covers directory descent
/// instead.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let mut memo = vec![vec![None; text.len() + 1]; pattern.len() + 1];
    glob_match_at(&pattern, &text, 0, 0, &mut memo)
}

fn glob_match_at(pattern: &[char], text: &[char], pi: usize, ti: usize, memo: &mut Vec<Vec<Option<bool>>>) -> bool {
    if let Some(cached) = memo[pi][ti] {
        return cached;
    }
    let result = if pi == pattern.len() {
        ti == text.len()
    } else if pattern[pi] == '*' {
        (ti..=text.len()).any(|t| glob_match_at(pattern, text, pi + 1, t, memo))
    } else if ti < text.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
        glob_match_at(pattern, text, pi + 1, ti + 1, memo)
    } else {
        false
    };
    memo[pi][ti] = Some(result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_wildcards() {
        assert!(glob_match("*.mp3", "track.mp3"));
        assert!(!glob_match("*.mp3", "track.m4a"));
        assert!(glob_match("track?.mp3", "track1.mp3"));
        assert!(glob_match("*", "anything"));
    }
}
