//! Fonts for PDF Export
//!
//! The standard Helvetica only covers Latin-1. Text outside it needs a
//! TrueType face, which the PDF embeds as a CID font addressed by glyph id.

use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Cannot read font {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse font {}: {}", .0.display(), .1)]
    Parse(PathBuf, ttf_parser::FaceParsingError),

    #[error("Font {} has no TrueType outlines", .0.display())]
    NotTrueType(PathBuf),
}

/// Font file plus the face index inside it (collections hold several)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSource {
    pub path: PathBuf,
    #[serde(default)]
    pub index: u32,
}

impl FontSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: 0,
        }
    }
}

/// TrueType face held in memory for embedding
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub name: String,
    pub data: Vec<u8>,
    pub index: u32,
}

impl EmbeddedFont {
    pub fn load(source: &FontSource) -> Result<Self, FontError> {
        let data = fs::read(&source.path).map_err(|e| FontError::Read {
            path: source.path.clone(),
            source: e,
        })?;
        let name = {
            let face = ttf_parser::Face::parse(&data, source.index)
                .map_err(|e| FontError::Parse(source.path.clone(), e))?;
            if face.tables().glyf.is_none() {
                return Err(FontError::NotTrueType(source.path.clone()));
            }
            postscript_name(&face).unwrap_or_else(|| file_name(&source.path))
        };
        Ok(Self {
            name,
            data,
            index: source.index,
        })
    }

    pub fn face(&self) -> Result<ttf_parser::Face<'_>, ttf_parser::FaceParsingError> {
        ttf_parser::Face::parse(&self.data, self.index)
    }
}

/// PDF names allow neither spaces nor delimiters
fn pdf_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(63)
        .collect()
}

fn postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .find_map(|n| n.to_string())
        .map(|n| pdf_name(&n))
        .filter(|n| !n.is_empty())
}

fn file_name(path: &Path) -> String {
    let name = path
        .file_stem()
        .map(|s| pdf_name(&s.to_string_lossy()))
        .unwrap_or_default();
    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}

/// Installed TrueType face with a glyph for every printable character of
/// `sample`. Common Unicode sans-serif families are tried first.
pub fn find_system_font(sample: &str) -> Option<FontSource> {
    let mut db = Database::new();
    db.load_system_fonts();

    let covers = |data: &[u8], index: u32| {
        ttf_parser::Face::parse(data, index).is_ok_and(|face| {
            face.tables().glyf.is_some()
                && sample
                    .chars()
                    .filter(|c| !c.is_control())
                    .all(|c| face.glyph_index(c).is_some())
        })
    };

    let preferred = [
        Family::Name("DejaVu Sans"),
        Family::Name("Noto Sans"),
        Family::Name("Liberation Sans"),
        Family::Name("Arial"),
        Family::SansSerif,
    ];
    let queried = preferred.iter().filter_map(|family| {
        db.query(&Query {
            families: std::slice::from_ref(family),
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })
    });

    let found = queried.chain(db.faces().map(|f| f.id)).find_map(|id| {
        let face = db.face(id)?;
        let Source::File(path) = &face.source else {
            return None;
        };
        db.with_face_data(id, |data, index| covers(data, index))
            .filter(|&ok| ok)
            .map(|_| FontSource {
                path: path.clone(),
                index: face.index,
            })
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn names_are_stripped_to_pdf_safe_characters() {
        assert_eq!(pdf_name("DejaVu Sans (Book)"), "DejaVuSansBook");
        assert_eq!(file_name(Path::new("/fonts/My Font.ttf")), "MyFont");
        assert_eq!(file_name(Path::new("/fonts/???.ttf")), "EmbeddedFont");
    }

    #[test]
    fn unreadable_font_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = FontSource::new(tmp.path().join("none.ttf"));
        assert!(matches!(EmbeddedFont::load(&missing), Err(FontError::Read { .. })));

        let junk = tmp.path().join("junk.ttf");
        fs::write(&junk, b"not a font").unwrap();
        assert!(matches!(
            EmbeddedFont::load(&FontSource::new(junk)),
            Err(FontError::Parse(..))
        ));
    }

    #[test]
    fn system_font_covers_its_sample() {
        // Hosts without a Cyrillic-capable TrueType font have nothing to check
        let Some(source) = find_system_font("Київ") else {
            return;
        };
        let font = EmbeddedFont::load(&source).unwrap();
        let face = font.face().unwrap();
        assert!("Київ".chars().all(|c| face.glyph_index(c).is_some()));
        assert!(!font.name.is_empty());
    }
}
