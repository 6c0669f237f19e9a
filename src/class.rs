//! Footprint classes
//!
//! A [`FootprintClass`] is the runtime stand-in for a class carrying a
//! footprint: it owns the merged [`Footprint`], the registration flags, the
//! collectors it belongs to and a table of named methods reachable from
//! placeholders. Classes are built with [`ClassBuilder`], which merges the
//! footprints of the base classes, validates the result and registers the
//! class in its collectors.

use crate::access::Access;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::footprint::{Footprint, FootprintFragment, Resolution, ResolveCache, ResolveOptions};
use crate::instance::Instance;
use crate::observers::{Observer, ObserverSet};
use crate::priorities::{PriorityLevel, PrioritySet};
use crate::reporting::ReportSink;
use crate::util::clean_tag;
use crate::value::{Description, Member, Scope, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Named method of a footprint class, callable from `[key:method]`
/// placeholders with the current guess and extras.
pub type Method = Rc<dyn Fn(&Instance, &Scope<'_>) -> Member>;

/// Collector tag used when a class names none.
pub const DEFAULT_COLLECTOR: &str = "garbage";

pub struct FootprintClass {
    id: usize,
    name: String,
    module: String,
    bases: Vec<Rc<FootprintClass>>,
    footprint: Footprint,
    is_abstract: bool,
    explicit: bool,
    reusable: bool,
    collectors: Vec<String>,
    level: RefCell<Option<PriorityLevel>>,
    methods: IndexMap<String, Method>,
    observer: Rc<ObserverSet>,
}

impl fmt::Debug for FootprintClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FootprintClass")
            .field("id", &self.id)
            .field("fullname", &self.fullname())
            .field("abstract", &self.is_abstract)
            .field("collectors", &self.collectors)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for FootprintClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname())
    }
}

impl FootprintClass {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn fullname(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Lower-case class name.
    pub fn clskind(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn bases(&self) -> &[Rc<FootprintClass>] {
        &self.bases
    }

    /// Whether this class is `name` (short or full name) or derives from it.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.name == name || self.fullname() == name || self.bases.iter().any(|b| b.is_subclass_of(name))
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn is_reusable(&self) -> bool {
        self.reusable
    }

    pub fn collectors(&self) -> &[String] {
        &self.collectors
    }

    pub fn mandatory(&self) -> Vec<&str> {
        self.footprint.mandatory()
    }

    pub fn optional(&self, attr: &str) -> Result<bool> {
        self.footprint.optional(attr)
    }

    pub fn values(&self, attr: &str) -> Result<&[Value]> {
        self.footprint.values(attr)
    }

    pub fn access(&self, attr: &str) -> Result<Access> {
        self.footprint
            .attribute(attr)
            .map(|a| a.access)
            .ok_or_else(|| Error::NoSuchAttribute(attr.to_string()))
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub(crate) fn observer(&self) -> &Rc<ObserverSet> {
        &self.observer
    }

    /// Priority level: the per-class override, else the footprint's one.
    pub fn level(&self) -> PriorityLevel {
        self.level
            .borrow()
            .clone()
            .unwrap_or_else(|| self.footprint.priority().clone())
    }

    pub fn set_level(&self, level: PriorityLevel) {
        *self.level.borrow_mut() = Some(level);
    }

    /// Ranking key of a candidate: priority rank, then number of
    /// attributes supplied by the caller.
    pub fn weight(&self, priorities: &PrioritySet, inputs: usize) -> Result<(usize, usize)> {
        Ok((priorities.rank(&self.level())?, inputs))
    }

    /// Resolve `desc` without raising on data errors, then check the
    /// only-rules. `Some` when this class can be built from `desc`.
    pub fn couldbe(
        &self,
        desc: &Description,
        cache: &ResolveCache,
        fast: bool,
        report: &mut dyn ReportSink,
    ) -> Result<Option<Resolution>> {
        let resolution = self
            .footprint
            .resolve(desc, cache, ResolveOptions::screening(fast), report)?;
        if resolution.is_complete() && self.footprint.checkonly(&resolution.attributes, &cache.defaults, report) {
            Ok(Some(resolution))
        } else {
            Ok(None)
        }
    }

    /// Build an instance out of `desc`, resolving it first.
    pub fn instantiate(self: &Rc<Self>, ctx: &Context, desc: &Description) -> Result<Rc<Instance>> {
        self.check_concrete()?;
        let options = ResolveOptions {
            fatal: ctx.setup().fatal,
            fast: false,
        };
        let resolution = self
            .footprint
            .resolve(desc, &ctx.resolve_cache(), options, &mut crate::reporting::NullReport)?;
        Ok(Instance::spawn(Rc::clone(self), resolution.attributes))
    }

    /// Build an instance from an already checked resolution.
    pub fn instantiate_checked(self: &Rc<Self>, resolution: Resolution) -> Result<Rc<Instance>> {
        self.check_concrete()?;
        Ok(Instance::spawn(Rc::clone(self), resolution.attributes))
    }

    fn check_concrete(&self) -> Result<()> {
        if self.is_abstract {
            return Err(Error::InvalidDefinition(format!(
                "Could not instantiate abstract class {}",
                self.fullname()
            )));
        }
        Ok(())
    }
}

/// Builder performing class registration.
///
/// ```
/// use footprints::{AttributeFragment, ClassBuilder, Context, FootprintFragment};
///
/// let mut ctx = Context::new();
/// let base = ClassBuilder::new("Base")
///     .abstract_class(true)
///     .footprint(FootprintFragment::new().attr("kind", AttributeFragment::new()))
///     .build(&mut ctx)
///     .unwrap();
/// let cls = ClassBuilder::new("Leaf")
///     .extends(&base)
///     .footprint(FootprintFragment::new().attr("kind", AttributeFragment::new().values(["leaf"])))
///     .build(&mut ctx)
///     .unwrap();
/// assert!(cls.is_subclass_of("Base"));
/// assert_eq!(ctx.collector("garbage").classes().len(), 1);
/// ```
pub struct ClassBuilder {
    name: String,
    module: Option<String>,
    bases: Vec<Rc<FootprintClass>>,
    fragments: Vec<FootprintFragment>,
    is_abstract: bool,
    explicit: Option<bool>,
    reusable: Option<bool>,
    collectors: Option<Vec<String>>,
    methods: IndexMap<String, Method>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            module: None,
            bases: Vec::new(),
            fragments: Vec::new(),
            is_abstract: false,
            explicit: None,
            reusable: None,
            collectors: None,
            methods: IndexMap::new(),
        }
    }

    pub fn module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn extends(mut self, base: &Rc<FootprintClass>) -> Self {
        self.bases.push(Rc::clone(base));
        self
    }

    /// Own footprint fragment; several calls merge in order.
    pub fn footprint(mut self, fragment: FootprintFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn abstract_class(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn explicit(mut self, explicit: bool) -> Self {
        self.explicit = Some(explicit);
        self
    }

    pub fn reusable(mut self, reusable: bool) -> Self {
        self.reusable = Some(reusable);
        self
    }

    /// Add a collector tag. Replaces the inherited list on first call.
    pub fn collector(mut self, tag: &str) -> Self {
        self.collectors.get_or_insert_with(Vec::new).push(tag.to_string());
        self
    }

    pub fn method(mut self, name: &str, method: impl Fn(&Instance, &Scope<'_>) -> Member + 'static) -> Self {
        self.methods.insert(name.to_string(), Rc::new(method));
        self
    }

    fn inherited<T>(&self, own: Option<T>, pick: impl Fn(&FootprintClass) -> T, default: T) -> T {
        own.or_else(|| self.bases.first().map(|b| pick(b))).unwrap_or(default)
    }

    /// Merge, validate and register the class in `ctx`.
    pub fn build(self, ctx: &mut Context) -> Result<Rc<FootprintClass>> {
        let module = self.module.clone().unwrap_or_else(|| "main".to_string());
        let fullname = format!("{}.{}", module, self.name);
        if ctx.class(&fullname).is_some() {
            return Err(Error::InvalidDefinition(format!("Class {fullname} is already defined")));
        }

        // Later bases first, so that the first base wins like the own
        // fragments win over all bases.
        let fragments = self
            .bases
            .iter()
            .rev()
            .map(|b| b.footprint.as_fragment())
            .chain(self.fragments.iter().cloned());
        let footprint = Footprint::build(&fullname, fragments)?;

        let explicit = self.inherited(self.explicit, |b| b.explicit, true);
        let reusable = self.inherited(self.reusable, |b| b.reusable, true);
        let collectors = self.inherited(
            self.collectors.clone(),
            |b| b.collectors.clone(),
            vec![DEFAULT_COLLECTOR.to_string()],
        );

        if !self.is_abstract && explicit && footprint.mandatory().is_empty() {
            return Err(Error::InvalidDefinition(format!(
                "Explicit class {fullname} without any mandatory footprint attribute"
            )));
        }
        let tracked = footprint.tracked();
        if let Some(tag) = collectors.iter().find(|tag| tracked.contains(&clean_tag(tag))) {
            return Err(Error::InvalidDefinition(format!(
                "An attribute or alias name of {fullname} is equal to collector tag: {tag}"
            )));
        }

        let mut methods = IndexMap::new();
        for base in self.bases.iter().rev() {
            methods.extend(base.methods.iter().map(|(k, m)| (k.clone(), Rc::clone(m))));
        }
        methods.extend(self.methods);

        let cls = Rc::new(FootprintClass {
            id: ctx.next_class_id(),
            name: self.name,
            module,
            bases: self.bases,
            footprint,
            is_abstract: self.is_abstract,
            explicit,
            reusable,
            collectors,
            level: RefCell::new(None),
            methods,
            observer: ctx.observers().get(&fullname),
        });

        ctx.register_class(&cls);
        for tag in &cls.collectors {
            let collector = ctx.collector(tag);
            if cls.is_abstract {
                collector.add_abstract(&cls);
            } else {
                collector.add(&cls);
                let listener: Rc<dyn Observer> = collector;
                cls.observer.register(&listener);
            }
            tracing::debug!(class = %fullname, collector = %tag, "class registered");
        }
        Ok(cls)
    }
}
