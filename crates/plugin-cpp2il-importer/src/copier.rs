//! Destructive copy of accepted artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CopyStrategy;
use crate::error::ImportError;
use crate::filesystem::FsUtils;
use crate::filter::ImportFilter;
use crate::metadata::MetadataWriter;
use crate::models::{BatchReport, CopyDecision, CopyFailure, ImportedFile};

/// Copies accepted files into the package tree, latest wins.
#[derive(Clone)]
pub struct ArtifactCopier {
    strategy: CopyStrategy,
    metadata: Arc<dyn MetadataWriter>,
}

impl std::fmt::Debug for ArtifactCopier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCopier")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl ArtifactCopier {
    /// Create a copier.
    pub fn new(strategy: CopyStrategy, metadata: Arc<dyn MetadataWriter>) -> Self {
        Self { strategy, metadata }
    }

    /// Sidecar path for `destination`.
    pub fn meta_path(destination: &Path) -> PathBuf {
        let mut name = destination.as_os_str().to_os_string();
        name.push(".meta");
        PathBuf::from(name)
    }

    /// Replace `destination` with the bytes of `source`, then write its sidecar.
    pub async fn copy_accepted(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<ImportedFile, ImportError> {
        let copy_err = |e: std::io::Error| ImportError::Copy {
            destination: destination.to_path_buf(),
            source: e,
        };

        let size = match self.strategy {
            CopyStrategy::Replace => {
                match tokio::fs::remove_file(destination).await {
                    Ok(()) => debug!(file = %destination.display(), "Removed previous copy"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(copy_err(e)),
                }
                tokio::fs::copy(source, destination).await.map_err(copy_err)?
            }
            CopyStrategy::Atomic => {
                let staging = FsUtils::temp_sibling(destination);
                let size = match tokio::fs::copy(source, &staging).await {
                    Ok(size) => size,
                    Err(e) => {
                        let _ = tokio::fs::remove_file(&staging).await;
                        return Err(copy_err(e));
                    }
                };
                if let Err(e) = tokio::fs::rename(&staging, destination).await {
                    let _ = tokio::fs::remove_file(&staging).await;
                    return Err(copy_err(e));
                }
                size
            }
        };

        self.metadata
            .write_metadata(source, &Self::meta_path(destination))
            .await?;

        Ok(ImportedFile {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            size,
        })
    }

    /// Filter and copy every candidate into `destination_folder`.
    ///
    /// Per-file failures are logged and recorded; the batch always runs to
    /// completion.
    pub async fn import_filtered(
        &self,
        filter: &ImportFilter,
        candidates: &[PathBuf],
        destination_folder: &Path,
    ) -> BatchReport {
        let mut report = BatchReport::new(destination_folder);

        for candidate in candidates {
            match filter.decide(candidate, destination_folder) {
                CopyDecision::Skip { file_name } => report.skipped.push(file_name),
                CopyDecision::Import {
                    source,
                    destination,
                } => match self.copy_accepted(&source, &destination).await {
                    Ok(imported) => report.imported.push(imported),
                    Err(e) => {
                        warn!(
                            destination = %destination.display(),
                            error = %e,
                            "Could not update assembly"
                        );
                        report.failures.push(CopyFailure {
                            destination,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            folder = %destination_folder.display(),
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Batch imported"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetaFileWriter;
    use crate::models::{NameCase, NameSet, NameSetKind};
    use async_trait::async_trait;
    use cpp2il_plugin::{NameList, ProcessorRegistry};

    #[derive(Debug)]
    struct FailingMetadata;

    #[async_trait]
    impl MetadataWriter for FailingMetadata {
        async fn write_metadata(&self, _source: &Path, meta_path: &Path) -> Result<(), ImportError> {
            Err(ImportError::Metadata {
                destination: meta_path.to_path_buf(),
                reason: "read-only".to_string(),
            })
        }
    }

    fn copier(strategy: CopyStrategy) -> ArtifactCopier {
        ArtifactCopier::new(strategy, Arc::new(MetaFileWriter))
    }

    fn open_filter(black: &[&str]) -> ImportFilter {
        let names: NameList = black.iter().map(|s| s.to_string()).collect();
        ImportFilter::new(
            NameSet::new(NameSetKind::Blacklist, names, NameCase::Sensitive),
            NameSet::empty(NameSetKind::Whitelist),
            Arc::new(ProcessorRegistry::new()),
        )
    }

    #[test]
    fn test_meta_path() {
        assert_eq!(
            ArtifactCopier::meta_path(Path::new("/pkg/A.dll")),
            PathBuf::from("/pkg/A.dll.meta")
        );
    }

    #[tokio::test]
    async fn test_overwrite_leaves_new_bytes() {
        for strategy in [CopyStrategy::Replace, CopyStrategy::Atomic] {
            let temp = tempfile::tempdir().expect("tempdir");
            let src = temp.path().join("A.dll");
            let dest = temp.path().join("pkg-A.dll");
            std::fs::write(&src, b"new bytes").expect("write");
            std::fs::write(&dest, b"old contents that are longer").expect("write");

            let imported = copier(strategy)
                .copy_accepted(&src, &dest)
                .await
                .expect("copy");
            assert_eq!(imported.size, 9);
            assert_eq!(std::fs::read(&dest).expect("read"), b"new bytes");
            assert!(ArtifactCopier::meta_path(&dest).exists());

            let leftovers = std::fs::read_dir(temp.path())
                .expect("read_dir")
                .flatten()
                .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                .count();
            assert_eq!(leftovers, 0);
        }
    }

    #[tokio::test]
    async fn test_metadata_failure_is_per_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let src = temp.path().join("A.dll");
        std::fs::write(&src, b"a").expect("write");

        let copier = ArtifactCopier::new(CopyStrategy::Replace, Arc::new(FailingMetadata));
        let err = copier
            .copy_accepted(&src, &temp.path().join("out.dll"))
            .await
            .expect_err("metadata");
        assert_eq!(err.reason(), "metadata failed");
    }

    #[tokio::test]
    async fn test_batch_continues_past_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("out");
        let pkg = temp.path().join("pkg");
        std::fs::create_dir_all(&out).expect("mkdir");
        std::fs::create_dir_all(&pkg).expect("mkdir");
        std::fs::write(out.join("A.dll"), b"a").expect("write");
        std::fs::write(out.join("C.dll"), b"c").expect("write");
        std::fs::write(out.join("Skip.dll"), b"s").expect("write");

        let candidates = vec![
            out.join("A.dll"),
            out.join("Missing.dll"),
            out.join("Skip.dll"),
            out.join("C.dll"),
        ];
        let report = copier(CopyStrategy::Replace)
            .import_filtered(&open_filter(&["Skip.dll"]), &candidates, &pkg)
            .await;

        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.skipped, vec!["Skip.dll".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].destination, pkg.join("Missing.dll"));
        assert_eq!(report.total(), 4);
        assert!(pkg.join("C.dll").exists());
    }
}
