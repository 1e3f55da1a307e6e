//! Content Binder - Label-Driven Slot Filling
//!
//! Each page role has a [`SlotTable`] mapping a frame label to the payload
//! field it reads and the kind of content it accepts. Binding walks the page
//! once and looks every label up in the table.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::document::{FitOption, Page, PageItem};
use crate::host::Host;
use crate::plan::DataPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Image,
    Text,
    /// Sequence of strings joined by newline
    TextList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBinding {
    pub label: &'static str,
    pub field: &'static str,
    pub kind: SlotKind,
}

const fn slot(label: &'static str, field: &'static str, kind: SlotKind) -> SlotBinding {
    SlotBinding { label, field, kind }
}

#[derive(Debug, Clone, Copy)]
pub struct SlotTable(&'static [SlotBinding]);

impl SlotTable {
    pub fn lookup(&self, label: &str) -> Option<&SlotBinding> {
        self.0.iter().find(|s| s.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|s| s.label)
    }
}

pub const COVER_SLOTS: SlotTable = SlotTable(&[
    slot("COVER_IMAGE", "image1", SlotKind::Image),
    slot("COVER_TITLE", "title", SlotKind::Text),
    slot("COVER_SUB", "subtitle", SlotKind::Text),
]);

pub const LEFT_SLOTS: SlotTable = SlotTable(&[
    slot("L_IMG1", "image1", SlotKind::Image),
    slot("L_TITLE", "title", SlotKind::Text),
    slot("L_QUOTE", "quote", SlotKind::Text),
]);

pub const RIGHT_SLOTS: SlotTable = SlotTable(&[
    slot("R_IMG1", "image1", SlotKind::Image),
    slot("R_NAME", "name", SlotKind::Text),
    slot("R_BIO", "bio", SlotKind::Text),
    slot("R_FACTS", "facts", SlotKind::TextList),
]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SlotStatus {
    Bound,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub label: String,
    #[serde(flatten)]
    pub status: SlotStatus,
}

enum SlotValue<'a> {
    Path(&'a str),
    Text(String),
}

fn slot_value<'a>(data: &'a DataPayload, binding: &SlotBinding) -> Option<SlotValue<'a>> {
    match binding.kind {
        SlotKind::Image => data.text(binding.field).map(SlotValue::Path),
        SlotKind::Text => data.text(binding.field).map(|s| SlotValue::Text(s.to_string())),
        SlotKind::TextList => data
            .list(binding.field)
            .map(|items| SlotValue::Text(items.join("\n"))),
    }
}

/// Fills labelled frames with payload values
pub struct ContentBinder<'s> {
    host: &'s dyn Host,
    project_root: &'s Path,
}

impl<'s> ContentBinder<'s> {
    pub fn new(host: &'s dyn Host, project_root: &'s Path) -> Self {
        Self { host, project_root }
    }

    /// Bind every slot of `slots` present on `page` and in `data`.
    ///
    /// Items whose label is unknown or whose field is absent stay untouched
    /// and produce no report line.
    pub fn bind(&self, page: &mut Page, slots: &SlotTable, data: &DataPayload) -> Vec<SlotReport> {
        let mut reports = vec![];
        page.visit_items_mut(&mut |item| {
            let Some(binding) = slots.lookup(&item.label) else {
                return;
            };
            let Some(value) = slot_value(data, binding) else {
                return;
            };
            let status = match value {
                SlotValue::Path(path) => self.bind_image(item, path),
                SlotValue::Text(text) => bind_text(item, &text),
            };
            reports.push(SlotReport {
                label: binding.label.to_string(),
                status,
            });
        });
        reports
    }

    fn bind_image(&self, item: &mut PageItem, relative: &str) -> SlotStatus {
        let path = self.project_root.join(relative);
        if !self.host.exists(&path) {
            warn!("Image not found for {}: {}", item.label, path.display());
            return SlotStatus::Skipped(format!("image not found: {}", path.display()));
        }

        item.remove_graphic();
        if let Err(e) = item.place(&path) {
            warn!("Cannot place image in {}: {}", item.label, e);
            return SlotStatus::Failed(e.to_string());
        }
        item.fit(FitOption::FillProportionally);
        item.fit(FitOption::CenterContent);
        SlotStatus::Bound
    }
}

fn bind_text(item: &mut PageItem, text: &str) -> SlotStatus {
    if item.set_contents(text) {
        SlotStatus::Bound
    } else {
        debug!("{} is not a text frame, left unchanged", item.label);
        SlotStatus::Skipped("not a text frame".to_string())
    }
}
