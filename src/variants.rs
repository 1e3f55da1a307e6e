//! Plan Variants - Several Layouts From One Brief
//!
//! A brief lists cover and spread rows. Each variant picks templates from the
//! catalog for its style and, past the first, reorders the spreads. Every
//! choice is derived from the variant number so reruns give the same plans.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hashing::{stable_index, stable_key};
use crate::plan::{EntryDocument, PlanDocument};

pub const PLAN_FILE: &str = "plan.json";
const VARIANT_PREFIX: &str = "variant_";

#[derive(Debug, Error)]
pub enum VariantError {
    #[error("Cannot read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverChoice {
    pub file: String,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpreadChoice {
    pub file: String,
    pub pages: Vec<u32>,
}

/// Templates available per style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    pub covers: HashMap<String, Vec<CoverChoice>>,
    #[serde(default)]
    pub spreads: HashMap<String, Vec<SpreadChoice>>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        let cover = || vec![CoverChoice { file: "cover_labels.json".into(), page: 1 }];
        let spread = |pages: &[[u32; 2]]| {
            pages
                .iter()
                .map(|p| SpreadChoice { file: "profile_spreads.json".into(), pages: p.to_vec() })
                .collect::<Vec<_>>()
        };
        Self {
            covers: HashMap::from([
                ("fashion".to_string(), cover()),
                ("minimal".to_string(), cover()),
            ]),
            spreads: HashMap::from([
                ("fashion".to_string(), spread(&[[2, 3], [4, 5], [6, 7]])),
                ("minimal".to_string(), spread(&[[2, 3]])),
            ]),
        }
    }
}

impl TemplateCatalog {
    /// Load from `path`, or the built-in catalog when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, VariantError> {
        if !path.exists() {
            warn!("Template catalog {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| VariantError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One row of the client brief
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefRow {
    #[serde(rename = "type", default)]
    pub row_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// One path, or `left|right`
    #[serde(default)]
    pub photo_path: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body_text: String,
    /// `fact|fact|fact`
    #[serde(default)]
    pub facts: String,
}

/// Read a brief. `.json` files hold an array of rows; anything else is CSV
/// with a header line naming the columns.
pub fn load_brief(path: &Path) -> Result<Vec<BriefRow>, VariantError> {
    let content = fs::read_to_string(path).map_err(|source| VariantError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        return Ok(serde_json::from_str(&content)?);
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let rows = reader.deserialize().collect::<Result<Vec<BriefRow>, _>>()?;
    Ok(rows)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub struct VariantGenerator {
    catalog: TemplateCatalog,
}

impl VariantGenerator {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self { catalog }
    }

    fn cover_entry(&self, row: &BriefRow, style: &str, variant: u32) -> Option<EntryDocument> {
        let choices = self.catalog.covers.get(style).filter(|c| !c.is_empty())?;
        let choice = &choices[stable_index(&[variant.to_string().as_str(), "cover"], choices.len())];
        Some(EntryDocument {
            template: format!("cover_{style}"),
            template_file: Some(choice.file.clone()),
            page: Some(choice.page),
            pages: None,
            data: object(json!({
                "image1": row.photo_path,
                "title": row.title,
                "subtitle": row.subtitle,
            })),
        })
    }

    fn spread_entry(
        &self,
        row: &BriefRow,
        style: &str,
        variant: u32,
        position: usize,
    ) -> Option<EntryDocument> {
        let choices = self.catalog.spreads.get(style).filter(|c| !c.is_empty())?;
        let (v, p) = (variant.to_string(), position.to_string());
        let choice = &choices[stable_index(&[v.as_str(), "spread", p.as_str()], choices.len())];

        let mut photos = row.photo_path.split('|');
        let left_photo = photos.next().unwrap_or_default();
        let right_photo = photos.next().unwrap_or(left_photo);
        let facts: Vec<&str> = if row.facts.is_empty() {
            vec![]
        } else {
            row.facts.split('|').collect()
        };

        Some(EntryDocument {
            template: format!("spread_{style}"),
            template_file: Some(choice.file.clone()),
            page: None,
            pages: Some(choice.pages.clone()),
            data: object(json!({
                "left": {
                    "image1": left_photo,
                    "title": row.title,
                    "quote": row.quote,
                },
                "right": {
                    "image1": right_photo,
                    "name": row.name,
                    "bio": row.body_text,
                    "facts": facts,
                },
            })),
        })
    }

    /// Build the plan for `variant` (1-based).
    pub fn create_variant(&self, brief: &[BriefRow], variant: u32, style: &str) -> PlanDocument {
        let mut pages = vec![];

        match brief.iter().find(|r| r.row_type == "cover") {
            Some(row) => match self.cover_entry(row, style, variant) {
                Some(entry) => pages.push(entry),
                None => warn!("No cover templates for style '{}'", style),
            },
            None => warn!("Brief has no cover row"),
        }

        let mut spreads: Vec<(usize, &BriefRow)> = brief
            .iter()
            .filter(|r| r.row_type == "spread")
            .enumerate()
            .collect();
        if variant > 1 {
            let v = variant.to_string();
            spreads.sort_by_key(|(i, _)| stable_key(&[v.as_str(), "order", i.to_string().as_str()]));
        }
        for (position, (_, row)) in spreads.into_iter().enumerate() {
            match self.spread_entry(row, style, variant, position) {
                Some(entry) => pages.push(entry),
                None => warn!("No spread templates for style '{}'", style),
            }
        }

        PlanDocument {
            project_name: Some(format!("magazine_variant_{variant}")),
            style: Some(style.to_string()),
            variant: Some(variant),
            pages,
        }
    }

    /// Write `count` variants to `<output>/variant_<n>/plan.json`.
    pub fn generate_all(
        &self,
        brief: &[BriefRow],
        count: u32,
        style: &str,
        output: &Path,
    ) -> Result<Vec<VariantDir>, VariantError> {
        let mut written = vec![];
        for number in 1..=count {
            let plan = self.create_variant(brief, number, style);
            let dir = output.join(format!("{VARIANT_PREFIX}{number}"));
            let plan_path = dir.join(PLAN_FILE);
            fs::create_dir_all(&dir).map_err(|source| VariantError::Write {
                path: dir.clone(),
                source,
            })?;
            fs::write(&plan_path, serde_json::to_string_pretty(&plan)?).map_err(|source| {
                VariantError::Write {
                    path: plan_path.clone(),
                    source,
                }
            })?;
            info!("Variant {}: {} pages -> {}", number, plan.pages.len(), plan_path.display());
            written.push(VariantDir { number, dir, plan: plan_path });
        }
        Ok(written)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDir {
    pub number: u32,
    pub dir: PathBuf,
    pub plan: PathBuf,
}

/// `variant_<n>` directories under `output` holding a plan, by number.
pub fn discover_variants(output: &Path) -> Result<Vec<VariantDir>, VariantError> {
    let mut variants = vec![];
    if !output.exists() {
        return Ok(variants);
    }
    let read_err = |source| VariantError::Read {
        path: output.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(output).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let dir = entry.path();
        let Some(number) = entry
            .file_name()
            .to_str()
            .and_then(|n| n.strip_prefix(VARIANT_PREFIX))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        let plan = dir.join(PLAN_FILE);
        if dir.is_dir() && plan.is_file() {
            variants.push(VariantDir { number, dir, plan });
        }
    }
    variants.sort_by_key(|v| v.number);
    Ok(variants)
}
