//! Filesystem utilities for the import pipeline.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Filesystem utility functions.
pub struct FsUtils;

impl FsUtils {
    /// Extract filename as String; returns an empty string for paths without one.
    pub fn extract_filename_str(path: &Path) -> String {
        path.file_name()
            .and_then(|f| f.to_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    /// Bare file name of a `/`-separated path string.
    pub fn file_name_of(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Replace `\` with `/`.
    pub fn normalize_separators(path: &str) -> String {
        path.replace('\\', "/")
    }

    /// Case-insensitive extension match; `None` accepts every file.
    pub fn has_extension(path: &Path, extension: Option<&str>) -> bool {
        match extension {
            None => true,
            Some(wanted) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(wanted)),
        }
    }

    /// List regular files under `dir`, sorted and de-duplicated.
    ///
    /// A missing directory yields an empty list. The first unreadable
    /// directory fails the whole listing.
    pub async fn list_files(
        dir: &Path,
        recursive: bool,
        extension: Option<&str>,
    ) -> io::Result<Vec<PathBuf>> {
        let (files, unreadable) = Self::list_files_tolerant(dir, recursive, extension).await;
        match unreadable.into_iter().next() {
            Some((_, e)) => Err(e),
            None => Ok(files),
        }
    }

    /// Like [`list_files`](Self::list_files), but a directory that cannot
    /// be read is returned with its error and the walk goes on.
    pub async fn list_files_tolerant(
        dir: &Path,
        recursive: bool,
        extension: Option<&str>,
    ) -> (Vec<PathBuf>, Vec<(PathBuf, io::Error)>) {
        let mut found = BTreeSet::new();
        let mut unreadable = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    unreadable.push((current, e));
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        unreadable.push((current.clone(), e));
                        break;
                    }
                };
                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        unreadable.push((path, e));
                        continue;
                    }
                };
                if file_type.is_dir() {
                    if recursive {
                        pending.push(path);
                    }
                } else if Self::has_extension(&path, extension) {
                    found.insert(path);
                }
            }
        }

        (found.into_iter().collect(), unreadable)
    }

    /// Temporary sibling of `destination` used for atomic replacement.
    pub fn temp_sibling(destination: &Path) -> PathBuf {
        let name = format!(
            ".{}.{}.tmp",
            Self::extract_filename_str(destination),
            Uuid::now_v7().simple()
        );
        destination.with_file_name(name)
    }

    /// Delete files with `extension` directly inside `dir`. Returns the count.
    pub async fn remove_matching(dir: &Path, extension: &str) -> io::Result<usize> {
        let stale = Self::list_files(dir, false, Some(extension)).await?;
        for path in &stale {
            tokio::fs::remove_file(path).await?;
        }
        Ok(stale.len())
    }
}
