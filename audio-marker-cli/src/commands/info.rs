//! `audio-marker info`.

use std::path::Path;

use audio_marker::Facade;

use super::Result;

pub fn run(file: &Path) -> Result<()> {
    let facade = Facade::new();
    let format = facade.detect_format(file)?;
    let info = facade.read(file)?;

    println!("File:     {}", file.display());
    println!("Format:   {}", format.name());
    println!(
        "Duration: {}",
        info.duration.map(|d| d.format()).unwrap_or_else(|| "-".to_string())
    );
    println!("Chapters: {}", info.chapters.len());
    if info.metadata.synchronized_lyrics.is_empty() {
        println!("Lyrics:   none");
    } else {
        let languages: Vec<&str> = info.metadata.synchronized_lyrics.iter().map(|l| l.language()).collect();
        println!("Lyrics:   {}", languages.join(", "));
    }
    println!("Artwork:  {}", if info.metadata.artwork.is_some() { "yes" } else { "no" });
    Ok(())
}
