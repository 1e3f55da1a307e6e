//! Page Composer - One Plan Entry at a Time
//!
//! Every entry ends in an [`EntryReport`]; nothing raised while composing
//! one entry escapes to the builder.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::binder::{SlotReport, COVER_SLOTS, LEFT_SLOTS, RIGHT_SLOTS};
use crate::document::{Document, Page};
use crate::host::HostError;
use crate::plan::{CoverEntry, PageEntry, SpreadEntry, TemplateKind};
use crate::session::Session;
use crate::templates::{Resolved, TemplateHandle};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Unrecognized template kind: {0}")]
    UnrecognizedKind(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Page {} not in {} ({} pages)", .page, .template.display(), .available)]
    PageOutOfRange {
        template: PathBuf,
        page: u32,
        available: usize,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl ComposeError {
    /// Skips are expected gaps in the plan; everything else is a failure.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ComposeError::TemplateNotFound(_) | ComposeError::UnrecognizedKind(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    /// 0-based indices of the appended pages, in duplication order
    Composed { pages: Vec<usize> },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    pub index: usize,
    pub template: String,
    pub kind: Option<TemplateKind>,
    #[serde(flatten)]
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<SlotReport>,
}

impl EntryReport {
    pub fn is_composed(&self) -> bool {
        matches!(self.status, EntryStatus::Composed { .. })
    }
}

pub struct PageComposer<'s> {
    session: &'s Session<'s>,
}

impl<'s> PageComposer<'s> {
    pub fn new(session: &'s Session<'s>) -> Self {
        Self { session }
    }

    /// Compose entry `index` of the plan onto the end of `document`.
    pub fn compose(&self, document: &mut Document, index: usize, entry: &PageEntry) -> EntryReport {
        let mut slots = vec![];
        let result = match entry {
            PageEntry::Cover(cover) => self.compose_cover(document, cover, &mut slots),
            PageEntry::Spread(spread) => self.compose_spread(document, spread, &mut slots),
            PageEntry::Unrecognized { template } => {
                Err(ComposeError::UnrecognizedKind(template.clone()))
            }
            PageEntry::Invalid { reason, .. } => Err(ComposeError::InvalidEntry(reason.clone())),
        };

        let status = match result {
            Ok(pages) => {
                info!("Entry {} ({}): added pages {:?}", index, entry.template(), pages);
                EntryStatus::Composed { pages }
            }
            Err(e) if e.is_skip() => {
                warn!("Entry {} ({}) skipped: {}", index, entry.template(), e);
                EntryStatus::Skipped { reason: e.to_string() }
            }
            Err(e) => {
                warn!("Entry {} ({}) failed: {}", index, entry.template(), e);
                EntryStatus::Failed { reason: e.to_string() }
            }
        };

        EntryReport {
            index,
            template: entry.template().to_string(),
            kind: entry.kind(),
            status,
            slots,
        }
    }

    fn open(&self, template_file: &str) -> Result<TemplateHandle<'s>, ComposeError> {
        match self.session.templates().resolve(self.session.host(), template_file)? {
            Resolved::Found(handle) => Ok(handle),
            Resolved::NotFound(path) => Err(ComposeError::TemplateNotFound(path)),
        }
    }

    fn compose_cover(
        &self,
        document: &mut Document,
        entry: &CoverEntry,
        slots: &mut Vec<SlotReport>,
    ) -> Result<Vec<usize>, ComposeError> {
        let template = self.open(&entry.template_file)?;
        let appended = source_page(&template, entry.page)?.duplicate_to_end(document);
        template.close();

        if let Some(page) = document.page_mut(appended) {
            slots.extend(self.session.binder().bind(page, &COVER_SLOTS, &entry.data));
        }
        Ok(vec![appended])
    }

    fn compose_spread(
        &self,
        document: &mut Document,
        entry: &SpreadEntry,
        slots: &mut Vec<SlotReport>,
    ) -> Result<Vec<usize>, ComposeError> {
        let template = self.open(&entry.template_file)?;
        // All page numbers are checked before anything is appended
        let sources = entry
            .pages
            .iter()
            .map(|&number| source_page(&template, number))
            .collect::<Result<Vec<_>, _>>()?;
        let appended: Vec<usize> = sources
            .into_iter()
            .map(|page| page.duplicate_to_end(document))
            .collect();
        template.close();

        // Content goes on the last two appended pages; a single page is left
        let targets = match appended.as_slice() {
            [.., left, right] => vec![
                (*left, &LEFT_SLOTS, &entry.left),
                (*right, &RIGHT_SLOTS, &entry.right),
            ],
            [only] => vec![(*only, &LEFT_SLOTS, &entry.left)],
            [] => vec![],
        };
        let binder = self.session.binder();
        for (index, table, data) in targets {
            if let Some(page) = document.page_mut(index) {
                slots.extend(binder.bind(page, table, data));
            }
        }
        Ok(appended)
    }
}

fn source_page<'t>(template: &'t TemplateHandle<'_>, number: u32) -> Result<&'t Page, ComposeError> {
    template.page(number).ok_or_else(|| ComposeError::PageOutOfRange {
        template: template.path().to_path_buf(),
        page: number,
        available: template.page_count(),
    })
}
