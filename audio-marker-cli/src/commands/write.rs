//! `audio-marker write`.

use std::path::Path;

use audio_marker::Facade;

use super::{Result, WriteFields};

pub fn run(file: &Path, replace: bool, fields: &WriteFields) -> Result<()> {
    let facade = Facade::new();
    let mut info = if replace { audio_marker::AudioFileInfo::new() } else { facade.read(file)? };

    macro_rules! apply {
        ($field:ident) => {
            if fields.$field.is_some() {
                info.metadata.$field = fields.$field.clone();
            }
        };
    }
    apply!(title);
    apply!(artist);
    apply!(album);
    apply!(genre);
    apply!(year);
    apply!(track_number);
    apply!(disc_number);
    apply!(composer);
    apply!(album_artist);
    apply!(comment);
    apply!(publisher);
    apply!(copyright);
    apply!(language);
    apply!(rating);

    if replace {
        facade.write(&info, file)?;
    } else {
        facade.modify(&info, file)?;
    }
    println!("wrote {}", file.display());
    Ok(())
}
