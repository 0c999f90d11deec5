use crate::error::{Result, Warning};
use crate::loaders::{write_alto, AltoLoader, PageLoader};
use crate::reading_order::Restructured;
use crate::types::RestructuredPage;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage abstraction for restructured pages
///
/// An artifact is keyed by its source page file and only valid for the exact
/// bytes it was computed from.
pub trait ArtifactStore {
    /// Stored reading order for `source`, if one exists for `source_digest`,
    /// with the warnings its computation raised
    fn load(&self, source: &Path, source_digest: &str) -> Result<Option<Restructured>>;

    fn store(&self, source: &Path, page: &RestructuredPage, source_digest: &str) -> Result<()>;
}

/// ALTO artifacts written next to their source page: `<stem>_<marker>.xml`
pub struct FileArtifactStore {
    marker: String,
    loader: AltoLoader,
}

impl FileArtifactStore {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            loader: AltoLoader::new(),
        }
    }

    pub fn artifact_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        source.with_file_name(format!("{stem}_{}.xml", self.marker))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load(&self, source: &Path, source_digest: &str) -> Result<Option<Restructured>> {
        let path = self.artifact_path(source);
        if !path.exists() {
            return Ok(None);
        }

        // A broken artifact is recomputed, it never aborts the run
        let artifact = match self.loader.load_file(&path) {
            Ok(artifact) => artifact,
            Err(err) => {
                tracing::warn!("⚠️  Ignoring unreadable artifact {}: {}", path.display(), err);
                return Ok(None);
            }
        };

        if artifact.source_digest.as_deref() != Some(source_digest) {
            tracing::debug!("   ♻️  stale artifact {}", path.display());
            return Ok(None);
        }

        let mut page = RestructuredPage::passthrough(&artifact);
        page.page_id = crate::loaders::page_id_from_path(source);
        page.strategy = "artifact".to_string();

        // Source order kept on the first run: the warning holds on every run
        let mut warnings = Vec::new();
        if !artifact.degenerate_blocks.is_empty() {
            page.degenerate = true;
            warnings.push(
                Warning::DegenerateGeometry {
                    page_id: page.page_id.clone(),
                    block_ids: artifact.degenerate_blocks,
                }
                .emit(),
            );
        }
        Ok(Some(Restructured { page, warnings }))
    }

    fn store(&self, source: &Path, page: &RestructuredPage, source_digest: &str) -> Result<()> {
        let path = self.artifact_path(source);
        let xml = write_alto(page, Some(source_digest))?;
        fs::write(&path, xml)?;
        tracing::debug!("   💾 wrote {}", path.display());
        Ok(())
    }
}

/// SHA-256 of a page file's bytes, lowercase hex
pub fn calculate_source_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// No-op storage implementation that disables artifacts
pub struct NoOpArtifactStore;

impl Default for NoOpArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for NoOpArtifactStore {
    fn load(&self, _source: &Path, _source_digest: &str) -> Result<Option<Restructured>> {
        Ok(None) // Always a miss
    }

    fn store(&self, _source: &Path, _page: &RestructuredPage, _source_digest: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, LogicalBlock, TextLine};

    fn restructured() -> RestructuredPage {
        RestructuredPage {
            page_id: "p003".to_string(),
            width: 1200.0,
            height: 1800.0,
            blocks: vec![LogicalBlock {
                id: "b1".to_string(),
                bbox: BoundingBox::new(50.0, 60.0, 700.0, 80.0),
                source_block_ids: vec!["b1".to_string()],
                lines: vec![TextLine {
                    id: "l1".to_string(),
                    bbox: BoundingBox::new(50.0, 60.0, 700.0, 35.0),
                    text: "12. BONNAT (Léon) — Portrait".to_string(),
                    tag: None,
                }],
            }],
            strategy: "spatial".to_string(),
            degenerate: false,
        }
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = calculate_source_digest(b"<alto/>");
        assert_eq!(a, calculate_source_digest(b"<alto/>"));
        assert_ne!(a, calculate_source_digest(b"<alto />"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn artifact_name_follows_the_source_stem() {
        let store = FileArtifactStore::new("restructuration");
        assert_eq!(
            store.artifact_path(Path::new("/scans/p003.xml")),
            PathBuf::from("/scans/p003_restructuration.xml")
        );
    }

    #[test]
    fn stored_artifact_is_reused_only_for_matching_digest() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("p003.xml");
        let store = FileArtifactStore::new("restructuration");

        store.store(&source, &restructured(), "abc123").unwrap();
        assert!(dir.path().join("p003_restructuration.xml").exists());

        let reused = store.load(&source, "abc123").unwrap().unwrap();
        assert_eq!(reused.page.page_id, "p003");
        assert_eq!(reused.page.strategy, "artifact");
        assert_eq!(reused.page.line_texts(), restructured().line_texts());
        assert!(!reused.page.degenerate);
        assert!(reused.warnings.is_empty());

        assert!(store.load(&source, "other").unwrap().is_none());
    }

    #[test]
    fn reused_passthrough_artifact_keeps_its_warning() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("p003.xml");
        let store = FileArtifactStore::new("restructuration");

        let mut page = restructured();
        page.strategy = "passthrough".to_string();
        page.degenerate = true;
        page.blocks[0].bbox.width = 0.0;
        store.store(&source, &page, "abc123").unwrap();

        let reused = store.load(&source, "abc123").unwrap().unwrap();
        assert!(reused.page.degenerate);
        assert_eq!(
            reused.warnings,
            vec![Warning::DegenerateGeometry {
                page_id: "p003".to_string(),
                block_ids: vec!["b1".to_string()],
            }]
        );
    }

    #[test]
    fn unreadable_artifact_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("p004.xml");
        fs::write(dir.path().join("p004_restructuration.xml"), "<alto><oops").unwrap();

        let store = FileArtifactStore::new("restructuration");
        assert!(store.load(&source, "abc").unwrap().is_none());
    }

    #[test]
    fn noop_store_never_hits() {
        let store = NoOpArtifactStore::new();
        store.store(Path::new("p.xml"), &restructured(), "d").unwrap();
        assert!(store.load(Path::new("p.xml"), "d").unwrap().is_none());
    }
}
