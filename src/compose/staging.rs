//! Staged artifact writes: content goes to hidden sibling temp files first and is renamed
//! into place only on commit. A commit that fails partway puts every destination it already
//! replaced back the way it was. Whatever is still staged when the value drops is removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default)]
pub struct StagedWrites {
    /// (temp path, destination), in staging order
    staged: Vec<(PathBuf, PathBuf)>,
}

/// A destination replaced during commit, with the previous file moved aside
struct Replaced {
    dest: PathBuf,
    backup: Option<PathBuf>,
}

fn sibling(dest: &Path, suffix: &str) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}", name, suffix))
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` next to `dest` without touching `dest` itself
    pub fn stage(&mut self, dest: &Path, content: &str) -> io::Result<()> {
        if self.staged.iter().any(|(_, d)| d == dest) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is already staged", dest.display()),
            ));
        }
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = sibling(dest, "tmp");
        // Track before writing so a failed write is still cleaned up
        self.staged.push((temp.clone(), dest.to_path_buf()));
        fs::write(&temp, content)
    }

    pub fn temp_paths(&self) -> Vec<&Path> {
        self.staged.iter().map(|(t, _)| t.as_path()).collect()
    }

    /// Move every staged file onto its destination, all or nothing
    pub fn commit(mut self) -> io::Result<Vec<PathBuf>> {
        let mut replaced: Vec<Replaced> = Vec::with_capacity(self.staged.len());

        for (temp, dest) in &self.staged {
            match replace(temp, dest) {
                Ok(backup) => replaced.push(Replaced {
                    dest: dest.clone(),
                    backup,
                }),
                Err(e) => {
                    for done in replaced.into_iter().rev() {
                        restore(done);
                    }
                    return Err(e);
                }
            }
        }

        self.staged.clear();
        Ok(replaced
            .into_iter()
            .map(|done| {
                if let Some(backup) = &done.backup {
                    let _ = fs::remove_file(backup);
                }
                done.dest
            })
            .collect())
    }
}

/// Rename `temp` onto `dest`, keeping any existing `dest` aside as a backup
fn replace(temp: &Path, dest: &Path) -> io::Result<Option<PathBuf>> {
    let backup = if dest.is_file() {
        let backup = sibling(dest, "bak");
        fs::rename(dest, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(temp, dest) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, dest);
        }
        return Err(e);
    }
    Ok(backup)
}

fn restore(done: Replaced) {
    debug!(path = %done.dest.display(), "rolling back artifact");
    let _ = fs::remove_file(&done.dest);
    if let Some(backup) = done.backup {
        let _ = fs::rename(&backup, &done.dest);
    }
}

impl Drop for StagedWrites {
    fn drop(&mut self) {
        for (temp, _) in self.staged.drain(..) {
            debug!(path = %temp.display(), "removing staged file");
            let _ = fs::remove_file(&temp);
        }
    }
}
