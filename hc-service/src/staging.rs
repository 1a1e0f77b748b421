//! Staged directory trees: build aside, publish with one rename
//!
//! A new instance is assembled in a hidden sibling directory and renamed
//! into place only once complete. Until then nothing at the target path can
//! satisfy the "configured" predicate. Replacing an existing tree swaps it
//! out whole at publish time. Dropping an unpublished `StagedTree` removes
//! the staging directory.

use crate::error::{ServiceError, ServiceResult};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// A directory tree under construction
#[derive(Debug)]
pub struct StagedTree {
    target: PathBuf,
    work: PathBuf,
    replaces: bool,
    published: bool,
}

impl StagedTree {
    /// Stage a tree for a target that must not exist yet
    pub fn begin(target: &Path) -> ServiceResult<Self> {
        if target.exists() {
            return Err(ServiceError::AlreadyExists(target.to_path_buf()));
        }
        Self::stage(target, false)
    }

    /// Stage a tree that may replace an existing one.
    ///
    /// The existing target is left untouched until `publish`, which swaps the
    /// whole tree. Nothing of the old tree survives the swap.
    pub fn overwrite(target: &Path) -> ServiceResult<Self> {
        Self::stage(target, target.exists())
    }

    fn stage(target: &Path, replaces: bool) -> ServiceResult<Self> {
        let name = file_name(target)?;
        let parent = parent_dir(target);
        fs::create_dir_all(&parent).map_err(|e| ServiceError::io(&parent, e))?;

        let work = parent.join(format!(".{}.staging-{}", name, uuid::Uuid::new_v4().simple()));
        fs::create_dir(&work).map_err(|e| ServiceError::io(&work, e))?;
        debug!("Staging {} in {}", target.display(), work.display());

        Ok(Self {
            target: target.to_path_buf(),
            work,
            replaces,
            published: false,
        })
    }

    /// Where files should be written right now
    pub fn path(&self) -> &Path {
        &self.work
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the staged tree to its target
    pub fn publish(mut self) -> ServiceResult<PathBuf> {
        if self.target.exists() {
            if !self.replaces {
                return Err(ServiceError::AlreadyExists(self.target.clone()));
            }
            self.swap_in()?;
        } else {
            fs::rename(&self.work, &self.target).map_err(|e| ServiceError::io(&self.target, e))?;
        }
        self.published = true;
        Ok(self.target.clone())
    }

    /// Move the old target aside, move the staged tree in, drop the old one
    fn swap_in(&self) -> ServiceResult<()> {
        let name = file_name(&self.target)?;
        let retired = parent_dir(&self.target).join(format!(".{}.replaced-{}", name, uuid::Uuid::new_v4().simple()));
        fs::rename(&self.target, &retired).map_err(|e| ServiceError::io(&self.target, e))?;

        if let Err(e) = fs::rename(&self.work, &self.target) {
            if let Err(restore) = fs::rename(&retired, &self.target) {
                warn!("Could not restore {} from {}: {}", self.target.display(), retired.display(), restore);
            }
            return Err(ServiceError::io(&self.target, e));
        }

        if let Err(e) = fs::remove_dir_all(&retired) {
            warn!("Could not remove replaced tree {}: {}", retired.display(), e);
        }
        Ok(())
    }
}

impl Drop for StagedTree {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.work) {
            warn!("Could not remove staging tree {}: {}", self.work.display(), e);
        }
    }
}

fn file_name(target: &Path) -> ServiceResult<String> {
    target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ServiceError::InvalidPath(target.to_path_buf()))
}

fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write `contents` to `path`, creating parent directories
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> ServiceResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ServiceError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| ServiceError::io(path, e))
}

/// Recursively copy `from` into `to`
pub fn copy_dir(from: &Path, to: &Path) -> ServiceResult<()> {
    let copy_err = |source| ServiceError::CopyFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    fs::create_dir_all(to).map_err(copy_err)?;
    for entry in fs::read_dir(from).map_err(copy_err)? {
        let entry = entry.map_err(copy_err)?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(copy_err)?;
        if file_type.is_dir() {
            copy_dir(&src, &dst)?;
        } else if file_type.is_file() {
            copy_file(&src, &dst)?;
        } else {
            debug!("Skipping non-regular entry {}", src.display());
        }
    }
    Ok(())
}

pub fn copy_file(from: &Path, to: &Path) -> ServiceResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| ServiceError::CopyFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
    }
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| ServiceError::CopyFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}
