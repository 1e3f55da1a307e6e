//! Content Plan
//!
//! The plan file is parsed into [`PlanDocument`] (the JSON shape) and then
//! into [`Plan`], where each entry's kind is decided once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Cannot read plan {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid plan: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Plan file as written by the variant generator or by hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<u32>,
    #[serde(default)]
    pub pages: Vec<EntryDocument>,
}

impl PlanDocument {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One `pages` item. Every field may be absent; a cover or spread missing
/// what it needs becomes [`PageEntry::Invalid`] rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDocument {
    #[serde(default)]
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<u32>>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Cover,
    Spread,
}

impl TemplateKind {
    /// Cover wins when an identifier mentions both.
    pub fn infer(template: &str) -> Option<Self> {
        if template.contains("cover") {
            Some(Self::Cover)
        } else if template.contains("spread") {
            Some(Self::Spread)
        } else {
            None
        }
    }
}

/// Slot values for one page, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPayload(Map<String, Value>);

impl DataPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Non-empty string value of `field`.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// String items of a list field. A plain string counts as one item.
    pub fn list(&self, field: &str) -> Option<Vec<&str>> {
        match self.0.get(field) {
            Some(Value::Array(items)) => {
                let strings: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if strings.is_empty() {
                    None
                } else {
                    Some(strings)
                }
            }
            Some(Value::String(s)) if !s.is_empty() => Some(vec![s.as_str()]),
            _ => None,
        }
    }

    /// Nested object under `field`, empty when absent.
    pub fn section(&self, field: &str) -> DataPayload {
        match self.0.get(field) {
            Some(Value::Object(map)) => DataPayload(map.clone()),
            _ => DataPayload::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverEntry {
    pub template: String,
    pub template_file: String,
    /// 1-based
    pub page: u32,
    pub data: DataPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadEntry {
    pub template: String,
    pub template_file: String,
    /// 1-based, duplication order
    pub pages: Vec<u32>,
    pub left: DataPayload,
    pub right: DataPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEntry {
    Cover(CoverEntry),
    Spread(SpreadEntry),
    Unrecognized { template: String },
    /// Cover or spread lacking a field it needs
    Invalid { template: String, reason: String },
}

impl PageEntry {
    pub fn template(&self) -> &str {
        match self {
            PageEntry::Cover(c) => &c.template,
            PageEntry::Spread(s) => &s.template,
            PageEntry::Unrecognized { template } | PageEntry::Invalid { template, .. } => template,
        }
    }

    pub fn kind(&self) -> Option<TemplateKind> {
        match self {
            PageEntry::Cover(_) => Some(TemplateKind::Cover),
            PageEntry::Spread(_) => Some(TemplateKind::Spread),
            PageEntry::Unrecognized { .. } => None,
            PageEntry::Invalid { template, .. } => TemplateKind::infer(template),
        }
    }

    fn from_document(doc: EntryDocument) -> Self {
        let Some(kind) = TemplateKind::infer(&doc.template) else {
            return PageEntry::Unrecognized {
                template: doc.template,
            };
        };
        let invalid = |template: String, field: &str| PageEntry::Invalid {
            template,
            reason: format!("missing field '{field}'"),
        };
        let Some(template_file) = doc.template_file.filter(|f| !f.is_empty()) else {
            return invalid(doc.template, "template_file");
        };

        match kind {
            TemplateKind::Cover => match doc.page {
                Some(page) => PageEntry::Cover(CoverEntry {
                    page,
                    data: DataPayload(doc.data),
                    template: doc.template,
                    template_file,
                }),
                None => invalid(doc.template, "page"),
            },
            TemplateKind::Spread => match doc.pages {
                Some(pages) => {
                    let data = DataPayload(doc.data);
                    PageEntry::Spread(SpreadEntry {
                        pages,
                        left: data.section("left"),
                        right: data.section("right"),
                        template: doc.template,
                        template_file,
                    })
                }
                None => invalid(doc.template, "pages"),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub project_name: Option<String>,
    pub entries: Vec<PageEntry>,
}

impl Plan {
    pub fn from_document(doc: PlanDocument) -> Self {
        Self {
            project_name: doc.project_name,
            entries: doc.pages.into_iter().map(PageEntry::from_document).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(Self::from_document(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        Ok(Self::from_document(PlanDocument::load(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_are_decided_at_parse_time() {
        let plan = Plan::from_json(
            &json!({
                "project_name": "demo",
                "pages": [
                    {"template": "cover_fashion", "template_file": "c.tmpl", "page": 1, "data": {"title": "T"}},
                    {"template": "spread_fashion", "template_file": "s.tmpl", "pages": [2, 3],
                     "data": {"left": {"title": "L"}, "right": {"facts": ["a"]}}},
                    {"template": "back_page", "template_file": "b.tmpl", "page": 1}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(plan.project_name.as_deref(), Some("demo"));
        assert_eq!(plan.entries[0].kind(), Some(TemplateKind::Cover));
        match &plan.entries[1] {
            PageEntry::Spread(s) => {
                assert_eq!(s.pages, vec![2, 3]);
                assert_eq!(s.left.text("title"), Some("L"));
                assert_eq!(s.right.list("facts"), Some(vec!["a"]));
            }
            other => panic!("expected spread, got {other:?}"),
        }
        assert_eq!(
            plan.entries[2],
            PageEntry::Unrecognized { template: "back_page".into() }
        );
    }

    #[test]
    fn incomplete_entries_stay_in_the_plan() {
        let plan = Plan::from_json(
            &json!({
                "pages": [
                    {"template": "cover", "template_file": "c.tmpl"},
                    {"template": "spread", "pages": [1, 2]},
                    {"template": "back_page", "page": 1},
                    {"template": "cover", "template_file": "c.tmpl", "page": 1}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(plan.entries.len(), 4);
        assert_eq!(
            plan.entries[0],
            PageEntry::Invalid {
                template: "cover".into(),
                reason: "missing field 'page'".into()
            }
        );
        assert_eq!(
            plan.entries[1],
            PageEntry::Invalid {
                template: "spread".into(),
                reason: "missing field 'template_file'".into()
            }
        );
        assert_eq!(plan.entries[1].kind(), Some(TemplateKind::Spread));
        assert_eq!(
            plan.entries[2],
            PageEntry::Unrecognized { template: "back_page".into() }
        );
        assert!(matches!(plan.entries[3], PageEntry::Cover(_)));
    }

    #[test]
    fn empty_values_read_as_absent() {
        let data = DataPayload::new(
            json!({"title": "", "facts": [], "subtitle": null, "bio": 3})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(data.text("title"), None);
        assert_eq!(data.list("facts"), None);
        assert_eq!(data.text("subtitle"), None);
        assert_eq!(data.text("bio"), None);
        assert_eq!(data.text("missing"), None);
    }

    #[test]
    fn spread_without_sections_gets_empty_payloads() {
        let plan = Plan::from_json(
            r#"{"pages": [{"template": "spread", "template_file": "s.tmpl", "pages": [1, 2]}]}"#,
        )
        .unwrap();
        let PageEntry::Spread(spread) = &plan.entries[0] else {
            panic!("expected spread");
        };
        assert_eq!(spread.left, DataPayload::default());
        assert_eq!(spread.right, DataPayload::default());
    }
}
