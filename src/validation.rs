//! Plan Review - Routing Checks Before Composition
//!
//! Rules produce structured findings. The builder logs them and carries them
//! in its report; they never stop a build.

use serde::{Deserialize, Serialize};

use crate::plan::{PageEntry, Plan};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanFinding {
    pub rule: String,
    pub severity: FindingSeverity,
    pub entry: usize,
    pub message: String,
}

/// Routing rule over one plan entry
pub trait ReviewRule {
    fn name(&self) -> &'static str;
    fn review(&self, index: usize, entry: &PageEntry) -> Vec<PlanFinding>;
}

pub struct RecognizedKindRule;

impl ReviewRule for RecognizedKindRule {
    fn name(&self) -> &'static str { "recognized_kind" }

    fn review(&self, index: usize, entry: &PageEntry) -> Vec<PlanFinding> {
        match entry {
            PageEntry::Unrecognized { template } => vec![PlanFinding {
                rule: self.name().to_string(),
                severity: FindingSeverity::Warning,
                entry: index,
                message: format!(
                    "template '{}' is neither a cover nor a spread; entry will be skipped",
                    template
                ),
            }],
            _ => vec![],
        }
    }
}

pub struct SpreadPageCountRule;

impl ReviewRule for SpreadPageCountRule {
    fn name(&self) -> &'static str { "spread_page_count" }

    fn review(&self, index: usize, entry: &PageEntry) -> Vec<PlanFinding> {
        match entry {
            PageEntry::Spread(spread) if spread.pages.len() != 2 => vec![PlanFinding {
                rule: self.name().to_string(),
                severity: FindingSeverity::Warning,
                entry: index,
                message: format!(
                    "spread lists {} pages; only the last two receive content",
                    spread.pages.len()
                ),
            }],
            _ => vec![],
        }
    }
}

pub struct CompleteEntryRule;

impl ReviewRule for CompleteEntryRule {
    fn name(&self) -> &'static str { "complete_entry" }

    fn review(&self, index: usize, entry: &PageEntry) -> Vec<PlanFinding> {
        match entry {
            PageEntry::Invalid { template, reason } => vec![PlanFinding {
                rule: self.name().to_string(),
                severity: FindingSeverity::Error,
                entry: index,
                message: format!("template '{}': {}; entry will fail", template, reason),
            }],
            _ => vec![],
        }
    }
}

pub struct PageNumberRule;

impl ReviewRule for PageNumberRule {
    fn name(&self) -> &'static str { "page_number" }

    fn review(&self, index: usize, entry: &PageEntry) -> Vec<PlanFinding> {
        let numbers: &[u32] = match entry {
            PageEntry::Cover(cover) => std::slice::from_ref(&cover.page),
            PageEntry::Spread(spread) => &spread.pages,
            PageEntry::Unrecognized { .. } | PageEntry::Invalid { .. } => &[],
        };
        if numbers.contains(&0) {
            vec![PlanFinding {
                rule: self.name().to_string(),
                severity: FindingSeverity::Error,
                entry: index,
                message: "page numbers start at 1".to_string(),
            }]
        } else {
            vec![]
        }
    }
}

/// Runs every rule over every entry
pub struct Validator {
    rules: Vec<Box<dyn ReviewRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(RecognizedKindRule),
                Box::new(CompleteEntryRule),
                Box::new(SpreadPageCountRule),
                Box::new(PageNumberRule),
            ],
        }
    }

    pub fn review(&self, plan: &Plan) -> Vec<PlanFinding> {
        let mut findings = vec![];
        for (index, entry) in plan.entries.iter().enumerate() {
            for rule in &self.rules {
                findings.extend(rule.review(index, entry));
            }
        }
        findings
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{CoverEntry, DataPayload, SpreadEntry};

    fn spread(pages: Vec<u32>) -> PageEntry {
        PageEntry::Spread(SpreadEntry {
            template: "spread".into(),
            template_file: "s.tmpl".into(),
            pages,
            left: DataPayload::default(),
            right: DataPayload::default(),
        })
    }

    #[test]
    fn clean_plan_has_no_findings() {
        let plan = Plan {
            project_name: None,
            entries: vec![
                PageEntry::Cover(CoverEntry {
                    template: "cover".into(),
                    template_file: "c.tmpl".into(),
                    page: 1,
                    data: DataPayload::default(),
                }),
                spread(vec![2, 3]),
            ],
        };
        assert!(Validator::new().review(&plan).is_empty());
    }

    #[test]
    fn findings_name_rule_and_entry() {
        let plan = Plan {
            project_name: None,
            entries: vec![
                PageEntry::Unrecognized { template: "back".into() },
                spread(vec![0, 1, 2]),
                PageEntry::Invalid {
                    template: "cover".into(),
                    reason: "missing field 'page'".into(),
                },
            ],
        };
        let findings = Validator::new().review(&plan);
        let summary: Vec<_> = findings
            .iter()
            .map(|f| (f.rule.as_str(), f.entry, f.severity))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("recognized_kind", 0, FindingSeverity::Warning),
                ("spread_page_count", 1, FindingSeverity::Warning),
                ("page_number", 1, FindingSeverity::Error),
                ("complete_entry", 2, FindingSeverity::Error),
            ]
        );
        assert_eq!(
            findings[1].message,
            "spread lists 3 pages; only the last two receive content"
        );
    }
}
