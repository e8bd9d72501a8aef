//! `audio-marker validate`.

use std::path::Path;

use audio_marker::{Facade, Severity};

use super::{CliError, Result};

pub fn run(file: &Path) -> Result<()> {
    let facade = Facade::new();
    let info = facade.read(file)?;
    let result = facade.validate(&info);

    for issue in result.issues() {
        let label = match issue.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("{label}: {issue}");
    }

    if result.is_valid() {
        println!("{} is valid", file.display());
        Ok(())
    } else {
        Err(CliError::Operation(format!(
            "{} failed validation with {} error(s)",
            file.display(),
            result.errors().count()
        )))
    }
}
