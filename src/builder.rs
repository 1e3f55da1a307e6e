//! Magazine Builder - Whole-Plan Assembly
//!
//! Only failing to create the output document stops a build. Every entry
//! problem is recorded in the [`BuildReport`] and the next entry proceeds.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compose::{EntryReport, EntryStatus, PageComposer};
use crate::document::Document;
use crate::host::HostError;
use crate::plan::Plan;
use crate::print::PageGeometry;
use crate::session::Session;
use crate::validation::{PlanFinding, Validator};
use crate::DEFAULT_PROJECT_NAME;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Cannot create output document: {0}")]
    DocumentCreation(#[source] HostError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub findings: Vec<PlanFinding>,
    pub entries: Vec<EntryReport>,
}

impl BuildReport {
    pub fn composed(&self) -> usize {
        self.count(|s| matches!(s, EntryStatus::Composed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, EntryStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, EntryStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&EntryStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }
}

/// Finished document plus what happened to each entry
#[derive(Debug, Clone)]
pub struct Build {
    pub document: Document,
    pub report: BuildReport,
}

pub struct MagazineBuilder<'s> {
    session: &'s Session<'s>,
    geometry: PageGeometry,
    validator: Validator,
}

impl<'s> MagazineBuilder<'s> {
    pub fn new(session: &'s Session<'s>) -> Self {
        Self {
            session,
            geometry: PageGeometry::a4_magazine(),
            validator: Validator::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn build(&self, plan: &Plan) -> Result<Build, BuildError> {
        let name = plan
            .project_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME);
        let mut document = self
            .session
            .host()
            .create_document(name, &self.geometry)
            .map_err(BuildError::DocumentCreation)?;

        let findings = self.validator.review(plan);
        for finding in &findings {
            warn!("Plan entry {}: {} ({})", finding.entry, finding.message, finding.rule);
        }

        let composer = PageComposer::new(self.session);
        let entries: Vec<EntryReport> = plan
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| composer.compose(&mut document, index, entry))
            .collect();

        let report = BuildReport { findings, entries };
        info!(
            "Built '{}': {} pages, {} entries composed, {} skipped, {} failed",
            name,
            document.page_count(),
            report.composed(),
            report.skipped(),
            report.failed()
        );
        Ok(Build { document, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Page, PageItem};
    use crate::host::FsHost;
    use crate::plan::PageEntry;
    use std::fs;
    use tempfile::TempDir;

    fn project_with_cover() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let mut doc = Document::new("cover", PageGeometry::default());
        doc.pages.push(Page { items: vec![PageItem::text("COVER_TITLE", "Title")] });
        fs::create_dir(tmp.path().join("templates")).unwrap();
        fs::write(
            tmp.path().join("templates/cover.tmpl"),
            serde_json::to_string(&doc).unwrap(),
        )
        .unwrap();
        tmp
    }

    #[test]
    fn empty_plan_builds_an_empty_document() {
        let tmp = project_with_cover();
        let host = FsHost::new();
        let session = Session::with_project_root(&host, tmp.path());

        let build = MagazineBuilder::new(&session).build(&Plan::default()).unwrap();

        assert_eq!(build.document.page_count(), 0);
        assert_eq!(build.document.name, "magazine");
        assert!(build.document.geometry.facing_pages);
        assert_eq!(build.report, BuildReport::default());
    }

    #[test]
    fn every_entry_gets_a_report_in_order() {
        let tmp = project_with_cover();
        let host = FsHost::new();
        let session = Session::with_project_root(&host, tmp.path());
        let plan = Plan::from_json(
            r#"{"project_name": "demo", "pages": [
                {"template": "cover", "template_file": "cover.tmpl", "page": 1},
                {"template": "mystery", "template_file": "cover.tmpl", "page": 1},
                {"template": "cover", "template_file": "cover.tmpl", "page": 9},
                {"template": "cover", "template_file": "cover.tmpl", "page": 1}
            ]}"#,
        )
        .unwrap();

        let build = MagazineBuilder::new(&session).build(&plan).unwrap();

        let indices: Vec<_> = build.report.entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(
            (build.report.composed(), build.report.skipped(), build.report.failed()),
            (2, 1, 1)
        );
        assert_eq!(build.document.page_count(), 2);
        assert_eq!(build.report.findings.len(), 1);
        assert!(matches!(plan.entries[1], PageEntry::Unrecognized { .. }));
        assert_eq!(host.open_documents(), 0);
    }

    #[test]
    fn bad_geometry_is_fatal() {
        let tmp = project_with_cover();
        let host = FsHost::new();
        let session = Session::with_project_root(&host, tmp.path());
        let geometry = PageGeometry {
            height_mm: -1.0,
            ..PageGeometry::a4_magazine()
        };

        let result = MagazineBuilder::new(&session)
            .with_geometry(geometry)
            .build(&Plan::default());

        assert!(matches!(result, Err(BuildError::DocumentCreation(_))));
    }
}
