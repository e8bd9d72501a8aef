//! `audio-marker lyrics {export|import|clear}`.

use audio_marker::exchange::{lrc, ttml};
use audio_marker::Facade;

use crate::cli::{LyricsAction, LyricsFormatArg};

use super::{CliError, Result};

pub fn run(action: LyricsAction) -> Result<()> {
    let facade = Facade::new();

    match action {
        LyricsAction::Export { file, output, format, language } => {
            let info = facade.read(&file)?;
            let track = match &language {
                Some(lang) => info
                    .metadata
                    .synchronized_lyrics_for(lang)
                    .ok_or_else(|| CliError::Usage(format!("{file:?} has no synchronized lyrics for language {lang:?}")))?,
                None => info
                    .metadata
                    .synchronized_lyrics
                    .first()
                    .ok_or_else(|| CliError::Usage(format!("{file:?} has no synchronized lyrics")))?,
            };
            let text = match format {
                LyricsFormatArg::Lrc => lrc::emit_lyrics(track),
                LyricsFormatArg::Ttml => ttml::emit_lyrics(std::slice::from_ref(track)),
            };
            std::fs::write(&output, text).map_err(|e| CliError::Operation(e.to_string()))?;
            println!("exported {} lyrics to {}", track.language(), output.display());
        }
        LyricsAction::Import { file, input, format, language } => {
            let text = std::fs::read_to_string(&input).map_err(|e| CliError::Operation(e.to_string()))?;
            let mut info = facade.read(&file)?;
            match format {
                LyricsFormatArg::Lrc => {
                    let language = language
                        .ok_or_else(|| CliError::Usage("--language is required when importing LRC".to_string()))?;
                    let track = lrc::parse_lyrics(&text)?;
                    info.metadata.synchronized_lyrics.retain(|l| l.language() != language);
                    info.metadata.synchronized_lyrics.push(rename_language(track, language));
                }
                LyricsFormatArg::Ttml => {
                    let tracks = ttml::parse_lyrics(&text)?;
                    for track in tracks {
                        info.metadata.synchronized_lyrics.retain(|l| l.language() != track.language());
                        info.metadata.synchronized_lyrics.push(track);
                    }
                }
            }
            facade.modify(&info, &file)?;
            println!("imported lyrics into {}", file.display());
        }
        LyricsAction::Clear { file } => {
            let mut info = facade.read(&file)?;
            info.metadata.synchronized_lyrics.clear();
            facade.modify(&info, &file)?;
            println!("cleared lyrics in {}", file.display());
        }
    }
    Ok(())
}

fn rename_language(track: audio_marker::SynchronizedLyrics, language: String) -> audio_marker::SynchronizedLyrics {
    let mut renamed = audio_marker::SynchronizedLyrics::new(language, track.content_type(), track.lines().to_vec());
    renamed.set_descriptor(track.descriptor().map(str::to_string));
    renamed
}
