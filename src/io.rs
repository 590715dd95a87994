//! Whole-file input and output for the patch pipeline.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Mode given to patched output on Unix; patched files are usually executables.
#[cfg(unix)]
pub const OUTPUT_MODE: u32 = 0o755;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read input file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write output file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read the whole input file into memory.
pub fn read_input(path: &Path) -> Result<Vec<u8>, IoError> {
    fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path` atomically.
///
/// Uses tempfile + fsync + rename so a failed write never leaves a
/// half-written output behind.
pub fn write_output(path: &Path, content: &[u8]) -> Result<(), IoError> {
    atomic_write(path, content).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Bare file names have an empty parent; use the current directory then
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(OUTPUT_MODE))?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
