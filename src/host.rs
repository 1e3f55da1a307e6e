//! Host Application Boundary
//!
//! Everything the composition engine needs from a document-authoring host:
//! document lifecycle, file existence, save and export. Page level editing
//! happens on the [`crate::document`] model the host hands out.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::Document;
use crate::fonts::FontError;
use crate::pdf;
use crate::print::{ExportPreset, PageGeometry};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Cannot create document: {0}")]
    CreateFailed(String),

    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Font(#[from] FontError),
}

/// Primitives consumed from the host application.
///
/// Methods take `&self`; a run is single-threaded and hosts that track
/// state use interior mutability.
pub trait Host {
    fn create_document(&self, name: &str, geometry: &PageGeometry) -> Result<Document, HostError>;

    fn exists(&self, path: &Path) -> bool;

    fn open_document(&self, path: &Path) -> Result<Document, HostError>;

    /// Close without saving.
    fn close_document(&self, document: Document);

    fn save_document(&self, document: &Document, path: &Path) -> Result<(), HostError>;

    fn export_pdf(
        &self,
        document: &Document,
        path: &Path,
        preset: &ExportPreset,
    ) -> Result<(), HostError>;
}

/// File-backed host: documents are JSON files, export goes through lopdf.
#[derive(Debug, Default)]
pub struct FsHost {
    open: Cell<usize>,
}

impl FsHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents opened and not yet closed.
    pub fn open_documents(&self) -> usize {
        self.open.get()
    }
}

impl Host for FsHost {
    fn create_document(&self, name: &str, geometry: &PageGeometry) -> Result<Document, HostError> {
        if geometry.width_mm <= 0.0 || geometry.height_mm <= 0.0 {
            return Err(HostError::CreateFailed(format!(
                "invalid page size {}x{} mm",
                geometry.width_mm, geometry.height_mm
            )));
        }
        Ok(Document::new(name, geometry.clone()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open_document(&self, path: &Path) -> Result<Document, HostError> {
        let content = fs::read_to_string(path).map_err(|source| HostError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let document = serde_json::from_str(&content).map_err(|source| HostError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        self.open.set(self.open.get() + 1);
        Ok(document)
    }

    fn close_document(&self, document: Document) {
        drop(document);
        self.open.set(self.open.get().saturating_sub(1));
    }

    fn save_document(&self, document: &Document, path: &Path) -> Result<(), HostError> {
        let json = serde_json::to_string_pretty(document)?;
        fs::write(path, json).map_err(|source| HostError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn export_pdf(
        &self,
        document: &Document,
        path: &Path,
        preset: &ExportPreset,
    ) -> Result<(), HostError> {
        let rendered = pdf::render(document, preset)?;
        fs::write(path, rendered.bytes).map_err(|source| HostError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageItem;
    use tempfile::TempDir;

    #[test]
    fn save_then_open_counts_handles() {
        let tmp = TempDir::new().unwrap();
        let host = FsHost::new();
        let mut doc = host
            .create_document("t", &PageGeometry::a4_magazine())
            .unwrap();
        doc.pages.push(crate::document::Page {
            items: vec![PageItem::text("COVER_TITLE", "Hello")],
        });

        let path = tmp.path().join("t.json");
        host.save_document(&doc, &path).unwrap();
        assert!(host.exists(&path));

        let opened = host.open_document(&path).unwrap();
        assert_eq!(host.open_documents(), 1);
        assert_eq!(opened, doc);
        host.close_document(opened);
        assert_eq!(host.open_documents(), 0);
    }

    #[test]
    fn open_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let host = FsHost::new();
        let err = host.open_document(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, HostError::Open { .. }));
        assert_eq!(host.open_documents(), 0);
    }

    #[test]
    fn zero_sized_geometry_is_rejected() {
        let host = FsHost::new();
        let geometry = PageGeometry {
            width_mm: 0.0,
            ..PageGeometry::a4_magazine()
        };
        assert!(matches!(
            host.create_document("bad", &geometry),
            Err(HostError::CreateFailed(_))
        ));
    }
}
