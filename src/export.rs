//! Exporter - Native Document and Print PDF

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::Document;
use crate::fonts;
use crate::host::{Host, HostError};
use crate::pdf;
use crate::print::ExportPreset;
use crate::DEFAULT_PROJECT_NAME;

/// Extension of the native editable document
pub const NATIVE_EXTENSION: &str = "magdoc";
pub const PDF_EXTENSION: &str = "pdf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Saving {} failed: {}", .path.display(), .source)]
    Save {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("PDF export to {} failed: {}", .path.display(), .source)]
    Pdf {
        path: PathBuf,
        #[source]
        source: HostError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub native: PathBuf,
    pub pdf: PathBuf,
}

/// `project_name`, or the default when absent or empty.
pub fn base_name(project_name: Option<&str>) -> &str {
    project_name
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PROJECT_NAME)
}

pub struct Exporter<'h> {
    host: &'h dyn Host,
    preset: ExportPreset,
    system_fonts: bool,
}

impl<'h> Exporter<'h> {
    pub fn new(host: &'h dyn Host) -> Self {
        Self {
            host,
            preset: ExportPreset::high_quality_print(),
            system_fonts: true,
        }
    }

    pub fn with_preset(mut self, preset: ExportPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Whether text outside Latin-1 may pull in an installed font when the
    /// preset names none.
    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        self.system_fonts = enabled;
        self
    }

    /// The preset, with an installed font added when the text needs one.
    pub fn preset_for(&self, document: &Document) -> ExportPreset {
        if self.preset.font.is_some() || !self.system_fonts {
            return self.preset.clone();
        }
        let wide = pdf::non_latin1_text(document);
        if wide.is_empty() {
            return self.preset.clone();
        }
        match fonts::find_system_font(&wide) {
            Some(source) => {
                info!("Embedding {} for non-Latin text", source.path.display());
                self.preset.clone().with_font(source)
            }
            None => {
                warn!("No installed font covers '{}'; those characters will not print", wide);
                self.preset.clone()
            }
        }
    }

    /// Save the document, then export the PDF. Both share one base name.
    pub fn export(
        &self,
        document: &Document,
        output_dir: &Path,
        project_name: Option<&str>,
    ) -> Result<Artifacts, ExportError> {
        let base = base_name(project_name);
        let native = output_dir.join(format!("{base}.{NATIVE_EXTENSION}"));
        let pdf = output_dir.join(format!("{base}.{PDF_EXTENSION}"));

        self.host
            .save_document(document, &native)
            .map_err(|source| ExportError::Save {
                path: native.clone(),
                source,
            })?;
        info!("Saved {}", native.display());

        let preset = self.preset_for(document);
        self.host
            .export_pdf(document, &pdf, &preset)
            .map_err(|source| ExportError::Pdf {
                path: pdf.clone(),
                source,
            })?;
        info!("Exported {} ({})", pdf.display(), preset.name);

        Ok(Artifacts { native, pdf })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FsHost;
    use crate::document::{Page, PageItem};
    use crate::print::PageGeometry;
    use tempfile::TempDir;

    fn text_page(text: &str) -> Page {
        Page {
            items: vec![PageItem::text("TITLE", text)],
        }
    }

    #[test]
    fn base_name_falls_back() {
        assert_eq!(base_name(Some("demo")), "demo");
        assert_eq!(base_name(Some("")), "magazine");
        assert_eq!(base_name(None), "magazine");
    }

    #[test]
    fn writes_both_artifacts_with_one_base_name() {
        let tmp = TempDir::new().unwrap();
        let host = FsHost::new();
        let doc = Document::new("demo", PageGeometry::default());

        let artifacts = Exporter::new(&host).export(&doc, tmp.path(), None).unwrap();

        assert_eq!(artifacts.native, tmp.path().join("magazine.magdoc"));
        assert_eq!(artifacts.pdf, tmp.path().join("magazine.pdf"));
        assert!(artifacts.native.is_file());
        assert!(artifacts.pdf.is_file());
    }

    #[test]
    fn wide_text_without_a_font_still_exports() {
        let tmp = TempDir::new().unwrap();
        let host = FsHost::new();
        let mut doc = Document::new("demo", PageGeometry::default());
        doc.pages.push(text_page("Київ"));

        let exporter = Exporter::new(&host).with_system_fonts(false);
        assert!(exporter.preset_for(&doc).font.is_none());

        let artifacts = exporter.export(&doc, tmp.path(), Some("wide")).unwrap();
        assert!(artifacts.native.is_file());
        assert!(artifacts.pdf.is_file());
    }

    #[test]
    fn latin_text_keeps_the_standard_font() {
        let host = FsHost::new();
        let mut doc = Document::new("demo", PageGeometry::default());
        doc.pages.push(text_page("Café"));

        assert!(Exporter::new(&host).preset_for(&doc).font.is_none());
    }

    #[test]
    fn missing_output_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let host = FsHost::new();
        let doc = Document::new("demo", PageGeometry::default());

        let err = Exporter::new(&host)
            .export(&doc, &tmp.path().join("absent"), Some("demo"))
            .unwrap_err();

        assert!(matches!(err, ExportError::Save { .. }));
    }
}
