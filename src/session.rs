//! Run context shared by every component of a build.

use std::path::{Path, PathBuf};

use crate::binder::ContentBinder;
use crate::host::Host;
use crate::templates::TemplateLibrary;

pub struct Session<'h> {
    host: &'h dyn Host,
    templates: TemplateLibrary,
    project_root: PathBuf,
}

impl<'h> Session<'h> {
    pub fn new(host: &'h dyn Host, templates: TemplateLibrary, project_root: impl Into<PathBuf>) -> Self {
        Self {
            host,
            templates,
            project_root: project_root.into(),
        }
    }

    /// Project root with the library at `<root>/templates`.
    pub fn with_project_root(host: &'h dyn Host, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let templates = TemplateLibrary::new(project_root.join("templates"));
        Self::new(host, templates, project_root)
    }

    pub fn host(&self) -> &'h dyn Host {
        self.host
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Base directory for image paths in payloads
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn binder(&self) -> ContentBinder<'_> {
        ContentBinder::new(self.host, &self.project_root)
    }
}
