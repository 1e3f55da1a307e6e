//! Template Library - Scoped Template Access

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{Document, Page};
use crate::host::{Host, HostError};

/// Result of a lookup in the library
pub enum Resolved<'h> {
    Found(TemplateHandle<'h>),
    NotFound(PathBuf),
}

/// An open template document.
///
/// The document is closed without saving when the handle is closed or
/// dropped, whichever comes first.
pub struct TemplateHandle<'h> {
    host: &'h dyn Host,
    path: PathBuf,
    document: Option<Document>,
}

impl<'h> TemplateHandle<'h> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, Document::page_count)
    }

    /// Page by 1-based number
    pub fn page(&self, number: u32) -> Option<&Page> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.document.as_ref()?.page(index)
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(document) = self.document.take() {
            self.host.close_document(document);
        }
    }
}

impl Drop for TemplateHandle<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Directory of template documents addressed by filename
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    root: PathBuf,
}

impl TemplateLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, template_file: &str) -> PathBuf {
        self.root.join(template_file)
    }

    /// Open `template_file` if it exists. A missing file is not an error.
    pub fn resolve<'h>(
        &self,
        host: &'h dyn Host,
        template_file: &str,
    ) -> Result<Resolved<'h>, HostError> {
        let path = self.path_for(template_file);
        if !host.exists(&path) {
            return Ok(Resolved::NotFound(path));
        }
        let document = host.open_document(&path)?;
        Ok(Resolved::Found(TemplateHandle {
            host,
            path,
            document: Some(document),
        }))
    }

    /// Template file names in the library, sorted.
    pub fn list(&self) -> Result<Vec<String>, std::io::Error> {
        let mut names = vec![];
        if self.root.exists() {
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
