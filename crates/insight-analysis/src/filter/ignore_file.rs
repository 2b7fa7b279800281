//! Repository ignore files (`.gitignore` syntax).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use insight_core::errors::FilterError;

/// Read an ignore file's raw lines. A missing file is `Ok(None)`; any other
/// read failure is an error. Comment and blank lines are left for the rule
/// parser to drop.
pub fn load(path: &Path) -> Result<Option<Vec<String>>, FilterError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content.lines().map(str::to_string).collect())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FilterError::IgnoreFileUnreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
