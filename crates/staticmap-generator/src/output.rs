//! Output directory management.
//!
//! A build never writes into the published folder. Files go to a sibling
//! staging directory which then replaces the folder in two renames, so the
//! published folder always holds a complete build.

use std::{
    fs::{self, File, OpenOptions, TryLockError},
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem operation failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another build holds the output folder.
    #[error("output folder is locked by another build ({0})")]
    Locked(PathBuf),
}

impl OutputError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// A rendered document and the file name it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub name: String,
    pub contents: String,
}

impl RenderedFile {
    pub fn new(name: impl Into<String>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Writes build results into `<public_dir>/<folder>`.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    public_dir: PathBuf,
    folder: String,
}

impl OutputWriter {
    #[must_use]
    pub fn new(public_dir: impl Into<PathBuf>, folder: impl Into<String>) -> Self {
        Self {
            public_dir: public_dir.into(),
            folder: folder.into(),
        }
    }

    /// The published folder.
    pub fn target_dir(&self) -> PathBuf {
        self.public_dir.join(&self.folder)
    }

    fn staging_dir(&self) -> PathBuf {
        self.public_dir.join(format!(".{}.staging", self.folder))
    }

    fn previous_dir(&self) -> PathBuf {
        self.public_dir.join(format!(".{}.previous", self.folder))
    }

    fn lock_path(&self) -> PathBuf {
        self.public_dir.join(format!(".{}.lock", self.folder))
    }

    /// Take the build lock for this folder.
    pub fn lock(&self) -> Result<BuildLock> {
        create_dir(&self.public_dir)?;
        BuildLock::acquire(self.lock_path())
    }

    /// Whether another holder currently has the build lock.
    pub fn is_locked(&self) -> bool {
        let path = self.lock_path();
        let Ok(file) = File::open(&path) else {
            return false;
        };
        matches!(file.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Replace the published folder with exactly `files`.
    ///
    /// Returns the number of bytes written.
    pub fn publish(&self, files: &[RenderedFile]) -> Result<u64> {
        create_dir(&self.public_dir)?;
        self.recover_interrupted_swap()?;

        let staging = self.staging_dir();
        remove_dir_if_exists(&staging)?;

        let written = match self.write_staging(&staging, files) {
            Ok(written) => written,
            Err(e) => {
                discard(&staging);
                return Err(e);
            }
        };

        if let Err(e) = self.swap(&staging) {
            discard(&staging);
            return Err(e);
        }

        info!(
            dir = %self.target_dir().display(),
            files = files.len(),
            bytes = written,
            "published sitemap files"
        );
        Ok(written)
    }

    /// Remove the published folder. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        let target = self.target_dir();
        if !target.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&target).map_err(|e| OutputError::io("remove", &target, e))?;
        info!(dir = %target.display(), "cleared sitemap folder");
        Ok(true)
    }

    /// Put back a folder that an interrupted swap moved aside.
    fn recover_interrupted_swap(&self) -> Result<()> {
        let target = self.target_dir();
        let previous = self.previous_dir();
        if !previous.exists() {
            return Ok(());
        }
        if target.exists() {
            warn!(dir = %previous.display(), "removing leftover previous sitemap folder");
            return remove_dir_if_exists(&previous);
        }
        warn!(dir = %target.display(), "restoring sitemap folder from an interrupted build");
        fs::rename(&previous, &target).map_err(|e| OutputError::io("restore", &previous, e))
    }

    fn write_staging(&self, staging: &Path, files: &[RenderedFile]) -> Result<u64> {
        fs::create_dir(staging).map_err(|e| OutputError::io("create", staging, e))?;
        set_dir_permissions(staging)?;

        let mut written = 0u64;
        for file in files {
            let path = staging.join(&file.name);
            fs::write(&path, file.contents.as_bytes())
                .map_err(|e| OutputError::io("write", &path, e))?;
            debug!(path = %path.display(), bytes = file.len(), "wrote file");
            written += file.len() as u64;
        }
        Ok(written)
    }

    fn swap(&self, staging: &Path) -> Result<()> {
        let target = self.target_dir();
        let previous = self.previous_dir();

        let had_previous = target.exists();
        if had_previous {
            remove_dir_if_exists(&previous)?;
            fs::rename(&target, &previous)
                .map_err(|e| OutputError::io("move aside", &target, e))?;
        }

        if let Err(e) = fs::rename(staging, &target) {
            if had_previous {
                if let Err(restore) = fs::rename(&previous, &target) {
                    warn!(
                        dir = %previous.display(),
                        error = %restore,
                        "failed to restore previous sitemap folder"
                    );
                }
            }
            return Err(OutputError::io("publish", &target, e));
        }

        if had_previous {
            if let Err(e) = fs::remove_dir_all(&previous) {
                warn!(
                    dir = %previous.display(),
                    error = %e,
                    "failed to remove previous sitemap folder"
                );
            }
        }
        Ok(())
    }
}

/// Exclusive hold on an output folder, released on drop.
///
/// The hold is an OS advisory lock on `.<folder>.lock`, so it also ends
/// when the holding process dies. The file itself stays in place.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
    file: File,
}

impl BuildLock {
    /// Lock the file at `path`, creating it if needed. Never waits.
    pub fn acquire(path: PathBuf) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| OutputError::io("open", &path, e))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(OutputError::Locked(path)),
            Err(TryLockError::Error(e)) => return Err(OutputError::io("lock", &path, e)),
        }

        // Holder pid, for operators inspecting a busy folder.
        file.set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()))
            .map_err(|e| OutputError::io("write", &path, e))?;

        debug!(path = %path.display(), "acquired build lock");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %e, "failed to release build lock");
        }
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| OutputError::io("create", path, e))
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| OutputError::io("remove", path, e))?;
    }
    Ok(())
}

fn discard(staging: &Path) {
    if !staging.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(staging) {
        warn!(dir = %staging.display(), error = %e, "failed to remove staging folder");
    }
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| OutputError::io("set permissions on", path, e))
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
