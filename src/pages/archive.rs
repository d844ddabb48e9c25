//! pages::archive
//!
//! Uncompressed tarball of a published tree, in the layout the Pages
//! deployment service expects: entries relative to the tree root, no
//! gzip, nothing from `.git`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::PagesError;

/// Whether `rel` (a `/`-separated path relative to the archive root) is
/// left out of the archive.
pub fn is_excluded(rel: &str) -> bool {
    rel == ".git" || rel.starts_with(".git/")
}

/// A tar file on disk, deleted when dropped.
#[derive(Debug)]
pub struct TempArchive {
    path: PathBuf,
    entries: Vec<String>,
}

impl TempArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in archive order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to delete archive");
            }
        }
    }
}

/// Write an uncompressed tar of `root` to `tar_path`.
///
/// Entries are visited in sorted order so identical trees produce identical
/// archives.
pub fn create_tar(root: &Path, tar_path: &Path) -> Result<TempArchive, PagesError> {
    let file = File::create(tar_path)
        .map_err(|e| PagesError::Archive(format!("create {}: {e}", tar_path.display())))?;

    // From here on the guard owns the file, so an error below deletes it.
    let mut archive = TempArchive {
        path: tar_path.to_path_buf(),
        entries: Vec::new(),
    };

    let mut builder = tar::Builder::new(file);
    builder.follow_symlinks(false);
    append_dir(&mut builder, root, "", &mut archive.entries)?;
    builder
        .into_inner()
        .map_err(|e| PagesError::Archive(format!("finish {}: {e}", tar_path.display())))?;

    tracing::debug!(
        path = %tar_path.display(),
        entries = archive.entries.len(),
        "archive written"
    );
    Ok(archive)
}

fn append_dir(
    builder: &mut tar::Builder<File>,
    dir: &Path,
    prefix: &str,
    entries: &mut Vec<String>,
) -> Result<(), PagesError> {
    let read = fs::read_dir(dir).map_err(|e| PagesError::Archive(format!("read {}: {e}", dir.display())))?;
    let mut children = read
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PagesError::Archive(format!("read {}: {e}", dir.display())))?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let name = child.file_name().to_string_lossy().into_owned();
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if is_excluded(&rel) {
            continue;
        }

        let path = child.path();
        let file_type = child
            .file_type()
            .map_err(|e| PagesError::Archive(format!("stat {}: {e}", path.display())))?;

        builder
            .append_path_with_name(&path, &rel)
            .map_err(|e| PagesError::Archive(format!("append {}: {e}", path.display())))?;
        entries.push(rel.clone());

        if file_type.is_dir() {
            append_dir(builder, &path, &rel, entries)?;
        }
    }
    Ok(())
}
