//! Magazine Composer - Plan-Driven Print Assembly
//!
//! A content plan lists covers and spreads with their data. Each entry copies
//! template pages into one output document and fills the labelled frames,
//! then the document is saved and exported to PDF.
//!
//! # Guarantees
//! 1. Plan order is page order
//! 2. One bad entry never stops a build
//! 3. Missing data leaves template content as is
//! 4. Templates are read, never written

pub mod binder;
pub mod builder;
pub mod compose;
pub mod document;
pub mod export;
pub mod fonts;
pub mod hashing;
pub mod host;
pub mod manifest;
pub mod pdf;
pub mod plan;
pub mod print;
pub mod session;
pub mod templates;
pub mod validation;
pub mod variants;

pub use binder::{ContentBinder, SlotKind, SlotReport, SlotStatus, SlotTable};
pub use builder::{Build, BuildError, BuildReport, MagazineBuilder};
pub use compose::{ComposeError, EntryReport, EntryStatus, PageComposer};
pub use document::{Document, Page, PageItem};
pub use export::{Artifacts, ExportError, Exporter};
pub use fonts::{FontError, FontSource};
pub use host::{FsHost, Host, HostError};
pub use manifest::BuildManifest;
pub use plan::{PageEntry, Plan, PlanError};
pub use print::{ExportPreset, PageGeometry};
pub use session::Session;
pub use templates::{Resolved, TemplateHandle, TemplateLibrary};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_PROJECT_NAME: &str = "magazine";
