//! Resolution context
//!
//! A [`Context`] gathers everything resolution and searches share: the
//! [`Setup`], the priority levels, the collectors by tag, the class
//! registry, custom attribute types and the observer board. Contexts are
//! independent from each other; [`crate::global`] offers a thread-local
//! default one.

use crate::class::{ClassBuilder, FootprintClass, DEFAULT_COLLECTOR};
use crate::collector::Collector;
use crate::config::Setup;
use crate::error::{Error, Result};
use crate::footprint::{Footprint, Resolution, ResolveCache, ResolveOptions};
use crate::instance::Instance;
use crate::observers::ObserverBoard;
use crate::priorities::{PriorityLevel, PrioritySet};
use crate::reporting::NullReport;
use crate::schema::{ClassDef, DefinitionFile};
use crate::types::{AttrType, CustomType};
use crate::util::clean_tag;
use crate::value::{Description, Value};
use indexmap::IndexMap;
use std::path::Path;
use std::rc::Rc;

/// Description key naming the collector of a context-level pickup.
pub const TAG_KEY: &str = "tag";

#[derive(Debug)]
pub struct Context {
    setup: Setup,
    priorities: PrioritySet,
    visibility: PrioritySet,
    collectors: IndexMap<String, Rc<Collector>>,
    classes: IndexMap<String, Rc<FootprintClass>>,
    types: IndexMap<String, CustomType>,
    observers: ObserverBoard,
    next_id: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_setup(Setup::default())
    }

    pub fn with_setup(setup: Setup) -> Self {
        Self {
            setup,
            priorities: PrioritySet::standard(),
            visibility: PrioritySet::visibility(),
            collectors: IndexMap::new(),
            classes: IndexMap::new(),
            types: IndexMap::new(),
            observers: ObserverBoard::new(),
            next_id: 0,
        }
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    pub fn setup_mut(&mut self) -> &mut Setup {
        &mut self.setup
    }

    pub fn priorities(&self) -> &PrioritySet {
        &self.priorities
    }

    pub fn priorities_mut(&mut self) -> &mut PrioritySet {
        &mut self.priorities
    }

    /// Ordering of documentation visibility levels.
    pub fn visibility(&self) -> &PrioritySet {
        &self.visibility
    }

    pub fn observers(&self) -> &ObserverBoard {
        &self.observers
    }

    pub(crate) fn next_class_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Collector for `tag`, created with the setup's report settings on
    /// first use.
    pub fn collector(&mut self, tag: &str) -> Rc<Collector> {
        let key = clean_tag(tag);
        let setup = &self.setup;
        Rc::clone(
            self.collectors
                .entry(key.clone())
                .or_insert_with(|| Rc::new(Collector::new(&key, setup))),
        )
    }

    /// Existing collector for `tag`.
    pub fn get_collector(&self, tag: &str) -> Option<Rc<Collector>> {
        self.collectors.get(&clean_tag(tag)).cloned()
    }

    pub fn collectors(&self) -> Vec<Rc<Collector>> {
        self.collectors.values().cloned().collect()
    }

    pub fn collector_tags(&self) -> Vec<String> {
        self.collectors.keys().cloned().collect()
    }

    pub(crate) fn register_class(&mut self, cls: &Rc<FootprintClass>) {
        self.classes.insert(cls.fullname(), Rc::clone(cls));
    }

    /// Class by full name, or by short name when unambiguous.
    pub fn class(&self, name: &str) -> Option<Rc<FootprintClass>> {
        if let Some(cls) = self.classes.get(name) {
            return Some(Rc::clone(cls));
        }
        let mut matching = self.classes.values().filter(|c| c.name() == name);
        match (matching.next(), matching.next()) {
            (Some(cls), None) => Some(Rc::clone(cls)),
            _ => None,
        }
    }

    pub fn classes(&self) -> Vec<Rc<FootprintClass>> {
        self.classes.values().cloned().collect()
    }

    pub fn register_type(&mut self, custom: CustomType) {
        self.types.insert(custom.name().to_string(), custom);
    }

    pub fn custom_type(&self, name: &str) -> Option<&CustomType> {
        self.types.get(name)
    }

    /// Attribute type for a definition-file type name.
    pub fn attr_type(&self, name: &str) -> AttrType {
        match self.custom_type(name) {
            Some(custom) => AttrType::Custom(custom.clone()),
            None => AttrType::from_name(name),
        }
    }

    /// Shared inputs of every resolution run in this context.
    pub fn resolve_cache(&self) -> ResolveCache {
        ResolveCache {
            defaults: self.setup.defaults.clone(),
            extras: self.setup.extras(),
            fastkeys: self.setup.fastkeys.iter().cloned().collect(),
            extended: self.setup.extended,
        }
    }

    /// Resolve `desc` against `footprint` with the setup's fatality.
    pub fn resolve(&self, footprint: &Footprint, desc: &Description) -> Result<Resolution> {
        let options = ResolveOptions {
            fatal: self.setup.fatal,
            fast: self.setup.fastmode,
        };
        footprint.resolve(desc, &self.resolve_cache(), options, &mut NullReport)
    }

    fn tag_of(desc: &Description) -> String {
        desc.get(TAG_KEY)
            .and_then(Value::as_str)
            .map_or_else(|| DEFAULT_COLLECTOR.to_string(), str::to_string)
    }

    /// Pick up an object in the collector named by the `tag` key
    /// (`garbage` by default), which is consumed.
    pub fn pickup(&mut self, desc: &mut Description) -> Result<()> {
        let tag = Self::tag_of(desc);
        desc.shift_remove(TAG_KEY);
        let collector = self.collector(&tag);
        collector.pickup(self, desc)
    }

    pub fn load(&mut self, mut desc: Description) -> Result<Option<Rc<Instance>>> {
        let tag = Self::tag_of(&desc);
        desc.shift_remove(TAG_KEY);
        let collector = self.collector(&tag);
        collector.load(self, desc)
    }

    pub fn default(&mut self, mut desc: Description) -> Result<Option<Rc<Instance>>> {
        let tag = Self::tag_of(&desc);
        desc.shift_remove(TAG_KEY);
        let collector = self.collector(&tag);
        collector.default(self, desc)
    }

    /// Live instances of collector `tag` matching every attribute of `attrs`.
    pub fn grep(&self, tag: &str, attrs: &Description) -> Vec<Rc<Instance>> {
        self.get_collector(tag)
            .map(|c| c.grep(attrs))
            .unwrap_or_default()
    }

    /// Every class registered in some collector, by full name.
    pub fn collected_classes(&self) -> Vec<Rc<FootprintClass>> {
        let mut found: IndexMap<String, Rc<FootprintClass>> = IndexMap::new();
        for collector in self.collectors.values() {
            for cls in collector.classes() {
                found.entry(cls.fullname()).or_insert(cls);
            }
        }
        found.sort_keys();
        found.into_values().collect()
    }

    /// Collected classes at or above priority `tag`, with their level,
    /// sorted by full name.
    pub fn collected_priorities(&self, tag: &str) -> Result<Vec<(PriorityLevel, Rc<FootprintClass>)>> {
        let mut found: IndexMap<String, (PriorityLevel, Rc<FootprintClass>)> = IndexMap::new();
        for collector in self.collectors.values() {
            for cls in collector.filter_higher_level(&self.priorities, tag)? {
                found.entry(cls.fullname()).or_insert_with(|| (cls.level(), Rc::clone(&cls)));
            }
        }
        found.sort_keys();
        Ok(found.into_values().collect())
    }

    /// Set priority `tag` on every collected class whose full name starts
    /// with `package`.
    pub fn reset_package_priority(&self, package: &str, tag: &str) -> Result<()> {
        for collector in self.collectors.values() {
            collector.reset_package_level(&self.priorities, package, tag)?;
        }
        Ok(())
    }

    /// Register the classes of a YAML definition document.
    pub fn define_yaml(&mut self, content: &str) -> Result<Vec<Rc<FootprintClass>>> {
        let file: DefinitionFile = serde_norway::from_str(content)?;
        self.define(file.into_classes())
    }

    pub fn define_json(&mut self, content: &str) -> Result<Vec<Rc<FootprintClass>>> {
        let file: DefinitionFile = serde_json::from_str(content)?;
        self.define(file.into_classes())
    }

    /// Register the classes of a `.json`, `.yaml` or `.yml` file.
    pub fn define_file(&mut self, path: &Path) -> Result<Vec<Rc<FootprintClass>>> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.define_json(&content),
            _ => self
                .define_yaml(&content)
                .map_err(|e| match e {
                    Error::SchemaParse(msg) => Error::SchemaParse(format!("Failed to parse {}: {}", path.display(), msg)),
                    other => other,
                }),
        }
    }

    /// Build class definitions in order; `extends` may name classes
    /// defined earlier in the same batch.
    pub fn define(&mut self, defs: Vec<ClassDef>) -> Result<Vec<Rc<FootprintClass>>> {
        let mut built = Vec::with_capacity(defs.len());
        for def in defs {
            let mut builder = ClassBuilder::new(&def.name)
                .abstract_class(def.is_abstract)
                .footprint(def.footprint.to_fragment(self)?);
            if let Some(module) = &def.module {
                builder = builder.module(module);
            }
            for base in &def.extends {
                let cls = self
                    .class(base)
                    .ok_or_else(|| Error::InvalidDefinition(format!("Unknown base class {base} for {}", def.name)))?;
                builder = builder.extends(&cls);
            }
            if let Some(explicit) = def.explicit {
                builder = builder.explicit(explicit);
            }
            if let Some(reusable) = def.reusable {
                builder = builder.reusable(reusable);
            }
            for tag in def.collectors.iter().flatten() {
                builder = builder.collector(tag);
            }
            built.push(builder.build(self)?);
        }
        Ok(built)
    }
}
