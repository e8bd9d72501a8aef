//! `audio-marker chapters {add|import|export|clear}`.

use audio_marker::{Chapter, ChapterList, Facade, Timestamp};

use crate::cli::ChapterAction;

use super::{resolve_chapter_format, CliError, Result};

pub fn run(action: ChapterAction) -> Result<()> {
    let facade = Facade::new();

    match action {
        ChapterAction::Add { file, start, title, end } => {
            let start = Timestamp::parse(&start).map_err(|e| CliError::Usage(e.to_string()))?;
            let mut chapter = Chapter::new(start, title).map_err(|e| CliError::Usage(e.to_string()))?;
            if let Some(end) = end {
                let end = Timestamp::parse(&end).map_err(|e| CliError::Usage(e.to_string()))?;
                chapter.set_end(Some(end)).map_err(|e| CliError::Usage(e.to_string()))?;
            }
            let mut chapters = facade.read_chapters(&file)?;
            chapters.append(chapter);
            chapters.sort_by_start();
            facade.write_chapters(&chapters, &file)?;
            println!("added chapter to {}", file.display());
        }
        ChapterAction::Import { file, input, format } => {
            let format = resolve_chapter_format(format, &input)?;
            let text = std::fs::read_to_string(&input).map_err(|e| CliError::Operation(e.to_string()))?;
            let chapters: ChapterList = audio_marker::exchange::parse(format, &text)?;
            facade.write_chapters(&chapters, &file)?;
            println!("imported {} chapters into {}", chapters.len(), file.display());
        }
        ChapterAction::Export { file, output, format } => {
            let format = resolve_chapter_format(format, &output)?;
            let chapters = facade.read_chapters(&file)?;
            let text = audio_marker::exchange::emit(format, &chapters)?;
            std::fs::write(&output, text).map_err(|e| CliError::Operation(e.to_string()))?;
            println!("exported {} chapters to {}", chapters.len(), output.display());
        }
        ChapterAction::Clear { file } => {
            facade.write_chapters(&ChapterList::new(), &file)?;
            println!("cleared chapters in {}", file.display());
        }
    }
    Ok(())
}
