//! Argument parsing (§6 CLI surface).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "audio-marker", version, about = "Read, write, and validate audio metadata, chapters, and lyrics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit debug-level logging to stderr.
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a file's metadata, chapters, and duration.
    Read {
        file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write metadata fields, preserving anything not specified.
    Write {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<u32>,
        #[arg(long)]
        track_number: Option<u32>,
        #[arg(long)]
        disc_number: Option<u32>,
        #[arg(long)]
        composer: Option<String>,
        #[arg(long)]
        album_artist: Option<String>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        copyright: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        rating: Option<u8>,

        /// Full replace instead of in-place modify.
        #[arg(long)]
        replace: bool,
    },

    /// Manage chapter markers.
    Chapters {
        #[command(subcommand)]
        action: ChapterAction,
    },

    /// Manage synchronized lyrics.
    Lyrics {
        #[command(subcommand)]
        action: LyricsAction,
    },

    /// Manage cover artwork.
    Artwork {
        #[command(subcommand)]
        action: ArtworkAction,
    },

    /// Run the default validation rule set and print any issues.
    Validate { file: PathBuf },

    /// Remove all metadata and chapters.
    Strip {
        file: PathBuf,
        /// Required, to make a destructive operation explicit.
        #[arg(long)]
        force: bool,
    },

    /// Run an operation across many files with bounded parallelism.
    Batch {
        #[command(subcommand)]
        action: BatchAction,
    },

    /// Print a short summary: format, duration, chapter count, lyrics languages.
    Info { file: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChapterFormatArg {
    PodloveJson,
    PodloveXml,
    Mp4Chaps,
    FfMetadata,
    Podcasting2Json,
    CueSheet,
    Lrc,
    Ttml,
    WebVtt,
    Srt,
    Markdown,
}

impl From<ChapterFormatArg> for audio_marker::exchange::ChapterFormat {
    fn from(value: ChapterFormatArg) -> Self {
        use audio_marker::exchange::ChapterFormat as F;
        match value {
            ChapterFormatArg::PodloveJson => F::PodloveJson,
            ChapterFormatArg::PodloveXml => F::PodloveXml,
            ChapterFormatArg::Mp4Chaps => F::Mp4Chaps,
            ChapterFormatArg::FfMetadata => F::FfMetadata,
            ChapterFormatArg::Podcasting2Json => F::Podcasting2Json,
            ChapterFormatArg::CueSheet => F::CueSheet,
            ChapterFormatArg::Lrc => F::Lrc,
            ChapterFormatArg::Ttml => F::Ttml,
            ChapterFormatArg::WebVtt => F::WebVtt,
            ChapterFormatArg::Srt => F::Srt,
            ChapterFormatArg::Markdown => F::Markdown,
        }
    }
}

#[derive(Subcommand)]
pub enum ChapterAction {
    /// Append a chapter.
    Add {
        file: PathBuf,
        /// Start time, `HH:MM:SS.mmm`.
        #[arg(long)]
        start: String,
        #[arg(long)]
        title: String,
        /// End time, `HH:MM:SS.mmm`.
        #[arg(long)]
        end: Option<String>,
    },
    /// Replace the chapter list from a text-exchange file.
    Import {
        file: PathBuf,
        input: PathBuf,
        /// Guessed from `input`'s extension when omitted.
        #[arg(long, value_enum)]
        format: Option<ChapterFormatArg>,
    },
    /// Render the chapter list to a text-exchange file.
    Export {
        file: PathBuf,
        output: PathBuf,
        /// Guessed from `output`'s extension when omitted.
        #[arg(long, value_enum)]
        format: Option<ChapterFormatArg>,
    },
    /// Remove every chapter.
    Clear { file: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LyricsFormatArg {
    Lrc,
    Ttml,
}

#[derive(Subcommand)]
pub enum LyricsAction {
    /// Render a language's synchronized lyrics to a file.
    Export {
        file: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = LyricsFormatArg::Lrc)]
        format: LyricsFormatArg,
        /// Language to export; defaults to the first track when omitted.
        #[arg(long)]
        language: Option<String>,
    },
    /// Parse a file and set (or add) a language's synchronized lyrics.
    Import {
        file: PathBuf,
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = LyricsFormatArg::Lrc)]
        format: LyricsFormatArg,
        /// Required for LRC, which carries no language tag of its own.
        #[arg(long)]
        language: Option<String>,
    },
    /// Remove every synchronized lyrics track.
    Clear { file: PathBuf },
}

#[derive(Subcommand)]
pub enum ArtworkAction {
    /// Set the cover image from a JPEG/PNG file.
    Set { file: PathBuf, image: PathBuf },
    /// Write the cover image out to a file.
    Extract { file: PathBuf, output: PathBuf },
    /// Remove the cover image.
    Remove { file: PathBuf },
}

#[derive(Subcommand)]
pub enum BatchAction {
    /// Read every matching file and print a one-line summary per file.
    Read {
        pattern: String,
        #[arg(long)]
        recursive: bool,
        #[arg(long, default_value_t = audio_marker::batch::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Strip every matching file.
    Strip {
        pattern: String,
        #[arg(long)]
        recursive: bool,
        #[arg(long, default_value_t = audio_marker::batch::DEFAULT_CONCURRENCY)]
        concurrency: usize,
        #[arg(long)]
        force: bool,
    },
}
