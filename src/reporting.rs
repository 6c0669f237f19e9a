//! Resolution diagnostics
//!
//! Resolution never raises on an ordinary mismatch; it tells a
//! [`ReportSink`] which attribute failed and why. Collectors keep a bounded
//! [`FootprintLog`] of their recent searches so that callers can ask why a
//! given class was not picked.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use regex::RegexBuilder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Why an attribute was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Why {
    Missing,
    Invalid,
    Outside,
    Outcast,
    Reclass,
    Subclass,
}

impl Why {
    pub fn as_str(&self) -> &'static str {
        match self {
            Why::Missing => "Missing value",
            Why::Invalid => "Invalid value",
            Why::Outside => "Not in values",
            Why::Outcast => "Outcast value",
            Why::Reclass => "Could not reclass",
            Why::Subclass => "Not a subclass",
        }
    }
}

/// Why an only-rule rejected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnlyWhy {
    NotFound,
    NotMatch,
}

impl OnlyWhy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnlyWhy::NotFound => "No value found",
            OnlyWhy::NotMatch => "Do not match",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    Attribute(Why),
    Only(OnlyWhy),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Attribute(why) => write!(f, "{}", why.as_str()),
            Reason::Only(why) => write!(f, "{}", why.as_str()),
        }
    }
}

/// How much of a collector search gets recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    /// Never record.
    None,
    /// Record only searches that found nothing.
    #[default]
    OnError,
    Light,
    Full,
}

/// Layout used when a report is dumped to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    /// Candidates with their failed attributes.
    #[default]
    Raw,
    /// One `attribute | why | class` row per failure.
    Flat,
}

/// Receiver of resolution diagnostics.
pub trait ReportSink {
    fn collector(&mut self, tag: &str);
    fn candidate(&mut self, fullname: &str);
    fn attribute(&mut self, name: &str, why: Why, args: Option<String>);
    fn only(&mut self, name: &str, why: OnlyWhy, args: Option<String>);
}

/// Sink discarding everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReport;

impl ReportSink for NullReport {
    fn collector(&mut self, _tag: &str) {}
    fn candidate(&mut self, _fullname: &str) {}
    fn attribute(&mut self, _name: &str, _why: Why, _args: Option<String>) {}
    fn only(&mut self, _name: &str, _why: OnlyWhy, _args: Option<String>) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportItem {
    pub attribute: String,
    pub reason: Reason,
    pub args: Option<String>,
}

impl ReportItem {
    fn as_json(&self) -> serde_json::Value {
        serde_json::json!({ "why": self.reason.to_string(), "args": self.args })
    }
}

/// One candidate class tried during a search.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntry {
    pub name: String,
    pub items: Vec<ReportItem>,
}

/// One flattened failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub focus: String,
    pub attribute: String,
    pub why: String,
    pub args: Option<String>,
}

/// One collector search.
#[derive(Debug, Clone)]
pub struct CollectorEntry {
    pub tag: String,
    pub stamp: DateTime<Local>,
    pub candidates: Vec<CandidateEntry>,
}

impl CollectorEntry {
    /// Candidates sorted by full name.
    pub fn candidates(&self) -> Vec<&CandidateEntry> {
        let mut sorted: Vec<&CandidateEntry> = self.candidates.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }

    pub fn as_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for candidate in &self.candidates {
            let attrs: serde_json::Map<String, serde_json::Value> = candidate
                .items
                .iter()
                .map(|item| (item.attribute.clone(), item.as_json()))
                .collect();
            out.insert(candidate.name.clone(), serde_json::Value::Object(attrs));
        }
        serde_json::Value::Object(out)
    }

    pub fn flat(&self) -> Vec<FlatRow> {
        self.candidates()
            .into_iter()
            .flat_map(|candidate| {
                candidate.items.iter().map(move |item| FlatRow {
                    focus: candidate.name.clone(),
                    attribute: item.attribute.clone(),
                    why: item.reason.to_string(),
                    args: item.args.clone(),
                })
            })
            .collect()
    }

    /// Indented text: failing candidates with their attributes, `=>` for
    /// candidates that passed.
    pub fn lightdump(&self) -> String {
        let mut out = String::new();
        for candidate in self.candidates() {
            if candidate.items.is_empty() {
                out.push_str(&format!("  => {}\n", candidate.name));
            } else {
                out.push_str(&format!("    {}\n", candidate.name));
                for item in &candidate.items {
                    match &item.args {
                        Some(args) => out.push_str(&format!(
                            "        {:<10} : {} ({})\n",
                            item.attribute, item.reason, args
                        )),
                        None => out.push_str(&format!("        {:<10} : {}\n", item.attribute, item.reason)),
                    }
                }
            }
        }
        out
    }

    pub fn flatdump(&self) -> String {
        self.flat()
            .iter()
            .map(|row| match &row.args {
                Some(args) => format!("{} | {} | {} | {}\n", row.attribute, row.why, row.focus, args),
                None => format!("{} | {} | {}\n", row.attribute, row.why, row.focus),
            })
            .collect()
    }
}

/// Bounded log of collector searches.
#[derive(Debug, Clone, Default)]
pub struct FootprintLog {
    maxlen: Option<usize>,
    entries: VecDeque<CollectorEntry>,
}

impl FootprintLog {
    pub fn new(maxlen: Option<usize>) -> Self {
        Self {
            maxlen,
            entries: VecDeque::new(),
        }
    }

    pub fn set_maxlen(&mut self, maxlen: Option<usize>) {
        self.maxlen = maxlen;
        self.trim();
    }

    fn trim(&mut self) {
        if let Some(max) = self.maxlen {
            while self.entries.len() > max.max(1) {
                self.entries.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn reduce_to_last(&mut self) {
        while self.entries.len() > 1 {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &CollectorEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&CollectorEntry> {
        self.entries.back()
    }

    /// Failures of the last search for candidates whose full name matches
    /// `select` (case-insensitive regex search). Candidates without
    /// failures are left out.
    pub fn whynot(&self, select: &str) -> Result<Option<BTreeMap<String, Vec<ReportItem>>>> {
        let Some(last) = self.last() else {
            return Ok(None);
        };
        let pattern = RegexBuilder::new(select)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Other(format!("Invalid whynot pattern: {e}")))?;
        Ok(Some(
            last.candidates
                .iter()
                .filter(|c| !c.items.is_empty() && pattern.is_match(&c.name))
                .map(|c| (c.name.clone(), c.items.clone()))
                .collect(),
        ))
    }

    /// All entries keyed by tag, with either the timestamp or a sequence
    /// number appended.
    pub fn as_json(&self, stamped: bool) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let key = if stamped {
                format!("{} {}", entry.tag, entry.stamp.to_rfc3339())
            } else {
                format!("{}_{:04}", entry.tag, i + 1)
            };
            out.insert(key, entry.as_json());
        }
        serde_json::Value::Object(out)
    }

    fn current_candidate(&mut self) -> Option<&mut CandidateEntry> {
        self.entries.back_mut().and_then(|e| e.candidates.last_mut())
    }

    fn push_item(&mut self, item: ReportItem) {
        match self.current_candidate() {
            Some(candidate) => candidate.items.push(item),
            None => tracing::warn!(attr = %item.attribute, "report item without a candidate entry, dropped"),
        }
    }
}

impl ReportSink for FootprintLog {
    fn collector(&mut self, tag: &str) {
        self.entries.push_back(CollectorEntry {
            tag: tag.to_string(),
            stamp: Local::now(),
            candidates: Vec::new(),
        });
        self.trim();
    }

    fn candidate(&mut self, fullname: &str) {
        match self.entries.back_mut() {
            Some(entry) => entry.candidates.push(CandidateEntry {
                name: fullname.to_string(),
                items: Vec::new(),
            }),
            None => tracing::warn!(class = fullname, "report candidate without a collector entry, dropped"),
        }
    }

    fn attribute(&mut self, name: &str, why: Why, args: Option<String>) {
        self.push_item(ReportItem {
            attribute: name.to_string(),
            reason: Reason::Attribute(why),
            args,
        });
    }

    fn only(&mut self, name: &str, why: OnlyWhy, args: Option<String>) {
        self.push_item(ReportItem {
            attribute: name.to_string(),
            reason: Reason::Only(why),
            args,
        });
    }
}
