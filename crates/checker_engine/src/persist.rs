use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use checker_logging::checker_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid export file name {0:?}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if needed and check that files can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    } else if !dir.is_dir() {
        return Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes the files of one export into a single directory.
///
/// All contents are staged as temp files before any target is replaced, so a
/// bad name or a failed write leaves the previous export untouched.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let mut written = self.write_all(&[(filename, content)])?;
        written
            .pop()
            .ok_or_else(|| PersistError::InvalidName(filename.to_string()))
    }

    /// Stage every `(filename, content)` pair, then move them into place in order.
    pub fn write_all(&self, files: &[(&str, &[u8])]) -> Result<Vec<PathBuf>, PersistError> {
        for (name, _) in files {
            validate_name(name)?;
        }
        ensure_output_dir(&self.dir)?;

        let mut staged = Vec::with_capacity(files.len());
        for (name, content) in files {
            let mut tmp = NamedTempFile::new_in(&self.dir)?;
            tmp.write_all(content)?;
            tmp.as_file_mut().sync_all()?;
            staged.push((self.dir.join(name), tmp));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (target, tmp) in staged {
            tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
            checker_debug!("wrote {:?}", target);
            written.push(target);
        }
        Ok(written)
    }
}

/// A bare file name: no directories, no `..`, not empty.
fn validate_name(name: &str) -> Result<(), PersistError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(PersistError::InvalidName(name.to_string())),
    }
}
