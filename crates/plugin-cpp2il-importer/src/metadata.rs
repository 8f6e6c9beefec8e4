//! Sidecar metadata for imported files.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ImportError;

/// Writes the sidecar describing a freshly copied file.
#[async_trait]
pub trait MetadataWriter: Send + Sync {
    /// Called once per copied file with its source and `<destination>.meta`.
    async fn write_metadata(&self, source: &Path, meta_path: &Path) -> Result<(), ImportError>;
}

/// Writes Unity-style `.meta` YAML with a plugin importer block.
///
/// The guid of an existing sidecar is kept so references survive re-imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaFileWriter;

impl MetaFileWriter {
    /// Guid recorded in existing sidecar text, if well formed.
    pub fn existing_guid(text: &str) -> Option<String> {
        text.lines()
            .filter_map(|line| line.trim().strip_prefix("guid:"))
            .map(str::trim)
            .find(|guid| guid.len() == 32 && guid.chars().all(|c| c.is_ascii_hexdigit()))
            .map(str::to_string)
    }

    /// Sidecar body for `guid`.
    pub fn render(guid: &str) -> String {
        format!(
            "fileFormatVersion: 2\n\
             guid: {guid}\n\
             PluginImporter:\n  \
             externalObjects: {{}}\n  \
             serializedVersion: 2\n  \
             iconMap: {{}}\n  \
             executionOrder: {{}}\n  \
             defineConstraints: []\n  \
             isPreloaded: 0\n  \
             isOverridable: 0\n  \
             isExplicitlyReferenced: 0\n  \
             validateReferences: 0\n  \
             platformData:\n  \
             - first:\n      \
             Any: \n    \
             second:\n      \
             enabled: 1\n      \
             settings: {{}}\n  \
             userData: \n  \
             assetBundleName: \n  \
             assetBundleVariant: \n"
        )
    }
}

#[async_trait]
impl MetadataWriter for MetaFileWriter {
    async fn write_metadata(&self, _source: &Path, meta_path: &Path) -> Result<(), ImportError> {
        let existing = tokio::fs::read_to_string(meta_path).await.ok();
        let guid = existing
            .as_deref()
            .and_then(Self::existing_guid)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        tokio::fs::write(meta_path, Self::render(&guid))
            .await
            .map_err(|e| ImportError::Metadata {
                destination: meta_path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_has_guid() {
        let body = MetaFileWriter::render("0123456789abcdef0123456789abcdef");
        assert!(body.starts_with("fileFormatVersion: 2\nguid: 0123456789abcdef0123456789abcdef\n"));
        assert!(body.contains("\n  isPreloaded: 0\n"));
        assert!(body.contains("\n  - first:\n      Any: \n    second:\n"));
    }

    #[test]
    fn test_existing_guid_parsing() {
        assert_eq!(
            MetaFileWriter::existing_guid("fileFormatVersion: 2\nguid: 0123456789abcdef0123456789abcdef\n"),
            Some("0123456789abcdef0123456789abcdef".to_string())
        );
        assert_eq!(MetaFileWriter::existing_guid("guid: nothex"), None);
    }

    #[tokio::test]
    async fn test_guid_is_preserved() {
        let temp = tempfile::tempdir().expect("tempdir");
        let meta = temp.path().join("A.dll.meta");
        let writer = MetaFileWriter;

        writer
            .write_metadata(Path::new("/out/A.dll"), &meta)
            .await
            .expect("first");
        let first = MetaFileWriter::existing_guid(&std::fs::read_to_string(&meta).expect("read"))
            .expect("guid");

        writer
            .write_metadata(Path::new("/out/A.dll"), &meta)
            .await
            .expect("second");
        let second = MetaFileWriter::existing_guid(&std::fs::read_to_string(&meta).expect("read"))
            .expect("guid");

        assert_eq!(first, second);
    }
}
