//! `audio-marker artwork {set|extract|remove}`.

use audio_marker::{Artwork, Facade};

use crate::cli::ArtworkAction;

use super::{CliError, Result};

pub fn run(action: ArtworkAction) -> Result<()> {
    let facade = Facade::new();

    match action {
        ArtworkAction::Set { file, image } => {
            let data = std::fs::read(&image).map_err(|e| CliError::Operation(e.to_string()))?;
            let artwork = Artwork::from_bytes(data).map_err(|e| CliError::Usage(e.to_string()))?;
            let mut info = facade.read(&file)?;
            info.metadata.artwork = Some(artwork);
            facade.modify(&info, &file)?;
            println!("set artwork on {}", file.display());
        }
        ArtworkAction::Extract { file, output } => {
            let info = facade.read(&file)?;
            let artwork = info
                .metadata
                .artwork
                .ok_or_else(|| CliError::Usage(format!("{} has no artwork", file.display())))?;
            std::fs::write(&output, artwork.data()).map_err(|e| CliError::Operation(e.to_string()))?;
            println!("extracted artwork from {} to {}", file.display(), output.display());
        }
        ArtworkAction::Remove { file } => {
            let mut info = facade.read(&file)?;
            info.metadata.artwork = None;
            facade.modify(&info, &file)?;
            println!("removed artwork from {}", file.display());
        }
    }
    Ok(())
}
