//! `audio-marker read`.

use std::path::Path;

use audio_marker::Facade;

use crate::cli::OutputFormat;

use super::Result;

pub fn run(file: &Path, format: OutputFormat) -> Result<()> {
    let info = Facade::new().read(file)?;

    match format {
        OutputFormat::Text => print_text(&info),
        OutputFormat::Json => print_json(&info)?,
    }
    Ok(())
}

fn print_text(info: &audio_marker::AudioFileInfo) {
    let meta = &info.metadata;
    println!("Title:    {}", meta.title.as_deref().unwrap_or("-"));
    println!("Artist:   {}", meta.artist.as_deref().unwrap_or("-"));
    println!("Album:    {}", meta.album.as_deref().unwrap_or("-"));
    println!("Genre:    {}", meta.genre.as_deref().unwrap_or("-"));
    println!("Year:     {}", meta.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()));
    println!(
        "Duration: {}",
        info.duration.map(|d| d.format()).unwrap_or_else(|| "-".to_string())
    );
    println!("Chapters: {}", info.chapters.len());
    for chapter in info.chapters.iter() {
        let end = chapter.end().map(|e| e.format()).unwrap_or_else(|| "-".to_string());
        println!("  [{} - {}] {}", chapter.start().format(), end, chapter.title());
    }
    if !meta.synchronized_lyrics.is_empty() {
        let languages: Vec<&str> = meta.synchronized_lyrics.iter().map(|l| l.language()).collect();
        println!("Lyrics:   {}", languages.join(", "));
    }
}

fn print_json(info: &audio_marker::AudioFileInfo) -> Result<()> {
    let meta = &info.metadata;
    let chapters: Vec<serde_json::Value> = info
        .chapters
        .iter()
        .map(|c| {
            serde_json::json!({
                "start": c.start().as_millis(),
                "end": c.end().map(|e| e.as_millis()),
                "title": c.title(),
            })
        })
        .collect();

    let value = serde_json::json!({
        "title": meta.title,
        "artist": meta.artist,
        "album": meta.album,
        "genre": meta.genre,
        "year": meta.year,
        "durationMs": info.duration.map(|d| d.as_millis()),
        "chapters": chapters,
        "lyricsLanguages": meta.synchronized_lyrics.iter().map(|l| l.language()).collect::<Vec<_>>(),
    });

    let rendered = serde_json::to_string_pretty(&value).map_err(audio_marker::Error::from)?;
    println!("{rendered}");
    Ok(())
}
