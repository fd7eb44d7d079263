//! Temporary staging of the toolkit directory into the image build context.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{DriverError, DriverResult};

/// A copy of the toolkit inside the build context.
///
/// The copy is deleted by [`StagedToolkit::remove`] or, failing that, on drop.
#[derive(Debug)]
pub struct StagedToolkit {
    path: PathBuf,
}

impl StagedToolkit {
    /// Copy `toolkit` into `context/<toolkit dir name>`.
    ///
    /// A stale copy left by an interrupted run is replaced. A partial copy
    /// is removed before the error is returned. Nothing is touched when the
    /// destination overlaps the toolkit itself.
    pub fn stage(toolkit: &Path, context: &Path) -> DriverResult<Self> {
        let staging_err = |reason: String| DriverError::ToolkitStaging {
            path: toolkit.to_path_buf(),
            reason,
        };

        if !toolkit.is_dir() {
            return Err(staging_err("not a directory".to_string()));
        }
        let name = toolkit
            .file_name()
            .ok_or_else(|| staging_err("path has no directory name".to_string()))?;

        let source = std::fs::canonicalize(toolkit)
            .map_err(|e| staging_err(format!("cannot resolve toolkit: {e}")))?;
        let context_dir = std::fs::canonicalize(context)
            .map_err(|e| staging_err(format!("cannot resolve build context: {e}")))?;
        let destination = context_dir.join(name);
        if destination.starts_with(&source) || source.starts_with(&destination) {
            return Err(staging_err(format!(
                "toolkit overlaps its staging destination {}",
                destination.display()
            )));
        }

        let staged = Self {
            path: context.join(name),
        };
        if staged.path.exists() {
            std::fs::remove_dir_all(&staged.path)
                .map_err(|e| staging_err(format!("cannot remove stale copy: {e}")))?;
        }

        copy_tree(&source, &staged.path).map_err(staging_err)?;
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged copy now.
    pub fn remove(mut self) -> DriverResult<()> {
        let path = std::mem::take(&mut self.path);
        match std::fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DriverError::ToolkitStaging {
                reason: format!("cannot remove staged copy: {e}"),
                path,
            }),
        }
    }
}

impl Drop for StagedToolkit {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() || !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged toolkit");
        }
    }
}

/// Recursive copy. Symlinks are recreated as links, never followed.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), String> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| e.to_string())?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| e.to_string())?;
        let target = dst.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|e| format!("cannot create {}: {e}", target.display()))?;
        } else if file_type.is_symlink() {
            copy_link(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| format!("cannot copy {}: {e}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(link: &Path, target: &Path) -> Result<(), String> {
    let points_to = std::fs::read_link(link)
        .map_err(|e| format!("cannot read link {}: {e}", link.display()))?;
    std::os::unix::fs::symlink(&points_to, target)
        .map_err(|e| format!("cannot create link {}: {e}", target.display()))
}

#[cfg(not(unix))]
fn copy_link(link: &Path, _target: &Path) -> Result<(), String> {
    tracing::warn!(path = %link.display(), "Skipping symlink in toolkit");
    Ok(())
}
