use std::path::Path;

use crate::error::{Result, VerityError};

/// Read a document from disk as UTF-8 text.
///
/// Missing files and non-UTF-8 content are input errors; an empty file is
/// returned as-is and rejected later by the pipeline.
pub fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| VerityError::Input(format!("cannot read {}: {e}", path.display())))?;
    String::from_utf8(bytes)
        .map_err(|e| VerityError::Input(format!("{} is not valid UTF-8: {e}", path.display())))
}
