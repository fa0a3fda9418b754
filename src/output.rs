//! Writes generated files, leaving untouched the ones whose content didn't change.

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::ctx::GenerationReport;
use crate::error::{Error, Result};

/// Returns whether the file was written. The new content is fully written to a
/// temporary file next to `path` before replacing it, so an interrupted run
/// never leaves a truncated project file behind.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
  if let Ok(existing) = fs::read(path) {
    if existing == content.as_bytes() {
      debug!(path = %path.display(), "unchanged");
      return Ok(false);
    }
  }

  let dir = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _                                    => Path::new(".")
  };
  fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

  let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
  tmp.write_all(content.as_bytes()).map_err(|e| Error::io(tmp.path(), e))?;
  tmp.flush().map_err(|e| Error::io(tmp.path(), e))?;
  tmp.persist(path).map_err(|e| Error::io(path, e.error))?;

  debug!(path = %path.display(), "written");
  Ok(true)
}

/// Writes `content` to `path` and records the outcome.
pub fn emit(report: &mut GenerationReport, path: &Path, content: &str) -> Result<()> {
  let written = write_if_changed(path, content)?;
  report.record(path.to_path_buf(), written);
  Ok(())
}

/// Removes a previously generated file which no longer has any content.
pub fn remove_stale(path: &Path) -> Result<bool> {
  match fs::remove_file(path) {
    Ok(())                                             => Ok(true),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
    Err(e)                                             => Err(Error::io(path, e))
  }
}
