//! Export files are staged in a temporary file next to their destination
//! and renamed into place once fully written. A failed export leaves
//! nothing behind in the target directory.

use crate::report::RenderError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Run `write` against a staged file and publish it as `dir/file_name`
pub fn write_atomically<F>(dir: &Path, file_name: &str, write: F) -> Result<PathBuf, RenderError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), RenderError>,
{
    let path = dir.join(file_name);
    let mut staged = NamedTempFile::new_in(dir)?;
    debug!(staged = %staged.path().display(), "staging export");

    write(staged.as_file_mut())?;
    staged.as_file_mut().flush()?;
    staged
        .persist(&path)
        .map_err(|err| RenderError::Io(err.error))?;
    Ok(path)
}
