use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0} has no parent directory")]
    NoParent(PathBuf),
    #[error("cannot prepare {path}: {reason}")]
    Directory { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Replaces `path` with `content` in one rename, creating parent directories.
///
/// The temp file is created by `tempfile`, which uses owner-only permissions on
/// unix; the renamed file keeps them, so a saved bearer token is not world
/// readable.
pub fn write_atomically(path: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => return Err(PersistError::NoParent(path.to_path_buf())),
    };
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|err| PersistError::Directory {
            path: dir.to_path_buf(),
            reason: err.to_string(),
        })?;
    }

    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| PersistError::Directory {
        path: dir.to_path_buf(),
        reason: err.to_string(),
    })?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| PersistError::Io(err.error))?;
    engine_debug!("wrote {}", path.display());
    Ok(())
}
