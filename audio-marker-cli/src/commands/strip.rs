//! `audio-marker strip`.

use std::path::Path;

use audio_marker::Facade;

use super::{CliError, Result};

pub fn run(file: &Path, force: bool) -> Result<()> {
    if !force {
        return Err(CliError::Usage(format!(
            "refusing to strip {} without --force, this removes all metadata and chapters",
            file.display()
        )));
    }
    Facade::new().strip(file)?;
    println!("stripped {}", file.display());
    Ok(())
}
