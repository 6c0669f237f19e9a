//! Priority levels
//!
//! A [`PrioritySet`] keeps an editable total order of named levels. Footprints
//! carry a [`PriorityLevel`] handle; its rank is always read from the set
//! owned by the context, so reordering the set reorders every class at once.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Upper-cased tag naming a level in a [`PrioritySet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriorityLevel(String);

impl PriorityLevel {
    pub fn new(tag: &str) -> Self {
        PriorityLevel(tag.trim().to_uppercase())
    }

    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl Default for PriorityLevel {
    fn default() -> Self {
        PriorityLevel::new("default")
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PriorityLevel {
    fn from(tag: &str) -> Self {
        PriorityLevel::new(tag)
    }
}

/// Where [`PrioritySet::insert`] puts a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    After(&'a str),
    Before(&'a str),
    Top,
}

const DEFAULT_FREEZE: &str = "default";

/// Ordered set of priority levels, lowest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PrioritySet {
    levels: Vec<String>,
    frozen: BTreeMap<String, Vec<String>>,
}

impl PrioritySet {
    /// New set; the initial ordering is frozen as `default`.
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = PrioritySet {
            levels: Vec::new(),
            frozen: BTreeMap::new(),
        };
        set.extend(levels);
        set.frozen.insert(DEFAULT_FREEZE.to_string(), set.levels.clone());
        set
    }

    /// `NONE < DEFAULT < TOOLBOX < DEBUG`
    pub fn standard() -> Self {
        PrioritySet::new(["none", "default", "toolbox", "debug"])
    }

    /// Documentation visibility: `DEFAULT < ADVANCED < GURU`.
    pub fn visibility() -> Self {
        PrioritySet::new(["default", "advanced", "guru"])
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.position(tag).is_some()
    }

    fn position(&self, tag: &str) -> Option<usize> {
        let tag = tag.trim().to_uppercase();
        self.levels.iter().position(|l| *l == tag)
    }

    fn require(&self, tag: &str) -> Result<usize> {
        self.position(tag)
            .ok_or_else(|| Error::UnknownLevel(tag.to_uppercase()))
    }

    pub fn level(&self, tag: &str) -> Option<PriorityLevel> {
        self.position(tag).map(|i| PriorityLevel(self.levels[i].clone()))
    }

    pub fn rank(&self, level: &PriorityLevel) -> Result<usize> {
        self.require(level.tag())
    }

    pub fn compare(&self, a: &PriorityLevel, b: &PriorityLevel) -> Result<Ordering> {
        Ok(self.rank(a)?.cmp(&self.rank(b)?))
    }

    pub fn level_by_index(&self, index: usize) -> Option<PriorityLevel> {
        self.levels.get(index).map(|l| PriorityLevel(l.clone()))
    }

    pub fn next_level(&self, level: &PriorityLevel) -> Option<PriorityLevel> {
        self.position(level.tag()).and_then(|i| self.level_by_index(i + 1))
    }

    pub fn prev_level(&self, level: &PriorityLevel) -> Option<PriorityLevel> {
        self.position(level.tag())
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.level_by_index(i))
    }

    /// Add levels on top; levels already present move to the top too.
    pub fn extend<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim().to_uppercase();
            self.levels.retain(|l| *l != tag);
            self.levels.push(tag);
        }
    }

    pub fn insert(&mut self, tag: &str, position: Position<'_>) -> Result<PriorityLevel> {
        let tag = tag.trim().to_uppercase();
        if let Position::After(reference) | Position::Before(reference) = position {
            self.require(reference)?;
        }
        self.levels.retain(|l| *l != tag);
        let index = match position {
            Position::After(reference) => self.require(reference)? + 1,
            Position::Before(reference) => self.require(reference)?,
            Position::Top => self.levels.len(),
        };
        self.levels.insert(index, tag.clone());
        Ok(PriorityLevel(tag))
    }

    pub fn remove(&mut self, tag: &str) -> Result<()> {
        let index = self.require(tag)?;
        self.levels.remove(index);
        Ok(())
    }

    /// Move a level by `shift` steps (positive is higher), clamped to the set.
    pub fn rerank(&mut self, tag: &str, shift: isize) -> Result<PriorityLevel> {
        let index = self.require(tag)?;
        let level = self.levels.remove(index);
        let target = (index as isize).saturating_add(shift).clamp(0, self.levels.len() as isize) as usize;
        self.levels.insert(target, level.clone());
        Ok(PriorityLevel(level))
    }

    pub fn up(&mut self, tag: &str) -> Result<PriorityLevel> {
        self.rerank(tag, 1)
    }

    pub fn down(&mut self, tag: &str) -> Result<PriorityLevel> {
        self.rerank(tag, -1)
    }

    pub fn top(&mut self, tag: &str) -> Result<PriorityLevel> {
        self.rerank(tag, self.levels.len() as isize)
    }

    pub fn bottom(&mut self, tag: &str) -> Result<PriorityLevel> {
        self.rerank(tag, -(self.levels.len() as isize))
    }

    /// Save the current ordering under `name`.
    pub fn freeze(&mut self, name: &str) -> Result<()> {
        let name = name.to_lowercase();
        if name == DEFAULT_FREEZE {
            return Err(Error::Other("Could not freeze a new default".to_string()));
        }
        self.frozen.insert(name, self.levels.clone());
        Ok(())
    }

    pub fn restore(&mut self, name: &str) -> Result<()> {
        let levels = self
            .frozen
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::Other(format!("No frozen priorities named `{name}`")))?;
        self.levels = levels.clone();
        Ok(())
    }

    /// Back to the ordering the set was created with.
    pub fn reset(&mut self) {
        if let Some(levels) = self.frozen.get(DEFAULT_FREEZE) {
            self.levels = levels.clone();
        }
    }

    pub fn frozen(&self) -> Vec<String> {
        self.frozen.keys().cloned().collect()
    }

    pub fn as_dump(&self, level: &PriorityLevel) -> String {
        match self.position(level.tag()) {
            Some(rank) => format!("{} (rank={})", level.tag(), rank),
            None => format!("{} (unranked)", level.tag()),
        }
    }
}

impl Default for PrioritySet {
    fn default() -> Self {
        PrioritySet::standard()
    }
}

/// Insert `tags` just below `reference`, in the given order.
pub fn set_before(set: &mut PrioritySet, reference: &str, tags: &[&str]) -> Result<()> {
    for tag in tags {
        set.insert(tag, Position::Before(reference))?;
    }
    Ok(())
}

/// Insert `tags` just above `reference`, in the given order.
pub fn set_after(set: &mut PrioritySet, reference: &str, tags: &[&str]) -> Result<()> {
    for tag in tags.iter().rev() {
        set.insert(tag, Position::After(reference))?;
    }
    Ok(())
}
