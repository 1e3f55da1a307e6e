//! Document Object Model
//!
//! Documents hold pages; pages hold labelled page items. Template documents
//! and the output document share this model, so duplicating a page is a deep
//! copy of its item tree.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::print::PageGeometry;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("item '{0}' is not a graphic frame")]
    NotGraphicFrame(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub geometry: PageGeometry,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(name: impl Into<String>, geometry: PageGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            pages: vec![],
        }
    }

    /// Page by 0-based index
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub items: Vec<PageItem>,
}

impl Page {
    /// Copy this page to the end of `target`, returning the new 0-based index.
    pub fn duplicate_to_end(&self, target: &mut Document) -> usize {
        target.pages.push(self.clone());
        target.pages.len() - 1
    }

    /// Visit every item on the page depth-first, group members included.
    pub fn visit_items_mut(&mut self, f: &mut impl FnMut(&mut PageItem)) {
        fn walk(items: &mut [PageItem], f: &mut impl FnMut(&mut PageItem)) {
            for item in items {
                f(&mut *item);
                walk(&mut item.children, f);
            }
        }
        walk(&mut self.items, f);
    }

    /// Find the first item carrying `label`, searching groups too.
    pub fn find(&self, label: &str) -> Option<&PageItem> {
        fn walk<'a>(items: &'a [PageItem], label: &str) -> Option<&'a PageItem> {
            items.iter().find_map(|item| {
                if item.label == label {
                    Some(item)
                } else {
                    walk(&item.children, label)
                }
            })
        }
        walk(&self.items, label)
    }
}

/// Frame position in millimetres, origin at the page's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOption {
    FillProportionally,
    CenterContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedGraphic {
    pub path: PathBuf,
    #[serde(default)]
    pub fit: Vec<FitOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Text {
        #[serde(default)]
        contents: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
    },
    Graphic {
        #[serde(default)]
        graphic: Option<PlacedGraphic>,
    },
    /// Lines, groups and other items that hold no content.
    Other,
}

fn default_font_size() -> f64 {
    12.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub bounds: Bounds,
    pub frame: Frame,
    #[serde(default)]
    pub children: Vec<PageItem>,
}

impl PageItem {
    pub fn text(label: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bounds: Bounds::default(),
            frame: Frame::Text {
                contents: contents.into(),
                font_size: default_font_size(),
            },
            children: vec![],
        }
    }

    pub fn graphic(label: impl Into<String>, graphic: Option<PlacedGraphic>) -> Self {
        Self {
            label: label.into(),
            bounds: Bounds::default(),
            frame: Frame::Graphic { graphic },
            children: vec![],
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn is_text_frame(&self) -> bool {
        matches!(self.frame, Frame::Text { .. })
    }

    pub fn contents(&self) -> Option<&str> {
        match &self.frame {
            Frame::Text { contents, .. } => Some(contents),
            _ => None,
        }
    }

    pub fn graphic_ref(&self) -> Option<&PlacedGraphic> {
        match &self.frame {
            Frame::Graphic { graphic } => graphic.as_ref(),
            _ => None,
        }
    }

    /// Replace text contents. Returns false for non-text frames.
    pub fn set_contents(&mut self, text: &str) -> bool {
        match &mut self.frame {
            Frame::Text { contents, .. } => {
                contents.clear();
                contents.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Drop the placed graphic, if any.
    pub fn remove_graphic(&mut self) {
        if let Frame::Graphic { graphic } = &mut self.frame {
            *graphic = None;
        }
    }

    pub fn place(&mut self, path: &Path) -> Result<(), ItemError> {
        match &mut self.frame {
            Frame::Graphic { graphic } => {
                *graphic = Some(PlacedGraphic {
                    path: path.to_path_buf(),
                    fit: vec![],
                });
                Ok(())
            }
            _ => Err(ItemError::NotGraphicFrame(self.label.clone())),
        }
    }

    /// Apply a fit to the placed graphic. No-op on an empty frame.
    pub fn fit(&mut self, option: FitOption) {
        if let Frame::Graphic { graphic: Some(graphic) } = &mut self.frame {
            if !graphic.fit.contains(&option) {
                graphic.fit.push(option);
            }
        }
    }
}
