//! Collectors
//!
//! A [`Collector`] gathers the footprint classes registered under one tag
//! and the live instances built from them. Searches screen every candidate
//! class against a description (`couldbe`), rank the survivors by priority
//! level and number of supplied attributes, and build the best one.

mod fasttrack;

pub use fasttrack::FastTrack;

use crate::class::FootprintClass;
use crate::config::Setup;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::footprint::Resolution;
use crate::instance::Instance;
use crate::observers::Observer;
use crate::priorities::{PriorityLevel, PrioritySet};
use crate::reporting::{CollectorEntry, FootprintLog, NullReport, ReportItem, ReportLevel, ReportSink, ReportStyle};
use crate::util::clean_tag;
use crate::value::{Description, Value};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// A class able to build an object from a description, with the
/// resolution that proved it.
#[derive(Debug)]
pub struct Candidate {
    pub class: Rc<FootprintClass>,
    pub resolution: Resolution,
}

/// One class entry of [`Collector::attrmap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttrMapEntry {
    pub name: String,
    pub module: String,
    pub values: Vec<serde_json::Value>,
    pub outcast: Vec<serde_json::Value>,
}

pub struct Collector {
    tag: String,
    classes: RefCell<Vec<Rc<FootprintClass>>>,
    abstract_classes: RefCell<Vec<Rc<FootprintClass>>>,
    instances: RefCell<Vec<Weak<Instance>>>,
    report: Cell<ReportLevel>,
    report_auto: Cell<bool>,
    report_style: Cell<ReportStyle>,
    report_len: Cell<usize>,
    log: RefCell<FootprintLog>,
    fasttrack: RefCell<FastTrack>,
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("tag", &self.tag)
            .field("classes", &self.classes.borrow().len())
            .field("instances", &self.instances.borrow().len())
            .field("report", &self.report.get())
            .finish()
    }
}

fn log_length(level: ReportLevel, len: usize) -> Option<usize> {
    match level {
        ReportLevel::Full => None,
        _ => Some(len),
    }
}

impl Collector {
    /// New empty collector with the report settings of `setup`.
    pub fn new(tag: &str, setup: &Setup) -> Self {
        Self {
            tag: clean_tag(tag),
            classes: RefCell::new(Vec::new()),
            abstract_classes: RefCell::new(Vec::new()),
            instances: RefCell::new(Vec::new()),
            report: Cell::new(setup.report),
            report_auto: Cell::new(true),
            report_style: Cell::new(setup.report_style),
            report_len: Cell::new(setup.report_len),
            log: RefCell::new(FootprintLog::new(log_length(setup.report, setup.report_len))),
            fasttrack: RefCell::new(FastTrack::new(setup.fastkeys.iter().cloned())),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Lower case, trailing `s` removed.
    pub fn clean_tag(tag: &str) -> String {
        clean_tag(tag)
    }

    pub fn add(&self, cls: &Rc<FootprintClass>) {
        let mut classes = self.classes.borrow_mut();
        if classes.iter().any(|c| c.id() == cls.id()) {
            return;
        }
        self.fasttrack.borrow_mut().add(cls);
        classes.push(Rc::clone(cls));
    }

    pub fn add_abstract(&self, cls: &Rc<FootprintClass>) {
        let mut classes = self.abstract_classes.borrow_mut();
        if !classes.iter().any(|c| c.id() == cls.id()) {
            classes.push(Rc::clone(cls));
        }
    }

    /// Remove `cls` from the candidates. Returns whether it was there.
    pub fn discard(&self, cls: &FootprintClass) -> bool {
        let mut classes = self.classes.borrow_mut();
        let before = classes.len();
        classes.retain(|c| c.id() != cls.id());
        self.fasttrack.borrow_mut().remove(cls.id());
        classes.len() != before
    }

    pub fn classes(&self) -> Vec<Rc<FootprintClass>> {
        self.classes.borrow().clone()
    }

    pub fn abstract_classes(&self) -> Vec<Rc<FootprintClass>> {
        self.abstract_classes.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.classes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.borrow().is_empty()
    }

    /// Live instances of the collected classes.
    pub fn instances(&self) -> Vec<Rc<Instance>> {
        let mut instances = self.instances.borrow_mut();
        instances.retain(|w| w.strong_count() > 0);
        instances.iter().filter_map(Weak::upgrade).collect()
    }

    // Search

    fn candidates(&self, desc: &Description) -> Vec<Rc<FootprintClass>> {
        let classes = self.classes.borrow();
        match self.fasttrack.borrow().subset(desc) {
            Some(ids) => classes.iter().filter(|c| ids.contains(&c.id())).cloned().collect(),
            None => classes.clone(),
        }
    }

    fn screen(
        &self,
        ctx: &Context,
        desc: &Description,
        first_only: bool,
        report: &mut dyn ReportSink,
    ) -> Result<Vec<Candidate>> {
        let cache = ctx.resolve_cache();
        let fast = ctx.setup().fastmode;
        let mut found = Vec::new();
        report.collector(&self.tag);
        for cls in self.candidates(desc) {
            report.candidate(&cls.fullname());
            match cls.couldbe(desc, &cache, fast, report) {
                Ok(Some(resolution)) => {
                    found.push(Candidate { class: cls, resolution });
                    if first_only {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_schema_error() => return Err(e),
                Err(e) => {
                    tracing::debug!(class = %cls.fullname(), error = %e, "candidate screening failed");
                }
            }
        }
        Ok(found)
    }

    fn search(&self, ctx: &Context, desc: &Description, first_only: bool) -> Result<Vec<Candidate>> {
        tracing::debug!(tag = %self.tag, "search in collector");
        match self.report.get() {
            ReportLevel::None => self.screen(ctx, desc, first_only, &mut NullReport),
            ReportLevel::OnError => {
                let found = self.screen(ctx, desc, first_only, &mut NullReport)?;
                if found.is_empty() {
                    let mut log = self.log.borrow_mut();
                    return self.screen(ctx, desc, first_only, &mut *log);
                }
                Ok(found)
            }
            ReportLevel::Light | ReportLevel::Full => {
                let mut log = self.log.borrow_mut();
                self.screen(ctx, desc, first_only, &mut *log)
            }
        }
    }

    /// Every class that could be built from `desc`, in registration order.
    pub fn find_all(&self, ctx: &Context, desc: &Description) -> Result<Vec<Candidate>> {
        self.search(ctx, desc, false)
    }

    /// Build the first class that could be built from `desc`.
    pub fn find_any(&self, ctx: &Context, desc: &Description) -> Result<Option<Rc<Instance>>> {
        match self.search(ctx, desc, true)?.into_iter().next() {
            Some(top) => top.class.instantiate_checked(top.resolution).map(Some),
            None => Ok(None),
        }
    }

    /// Build the best ranked class for `desc`.
    pub fn find_best(&self, ctx: &Context, desc: &Description) -> Result<Option<Rc<Instance>>> {
        let mut candidates = self.find_all(ctx, desc)?;
        if candidates.len() > 1 {
            let priorities = ctx.priorities();
            let mut weighted = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let weight = candidate
                    .class
                    .weight(priorities, candidate.resolution.inputs.len())?;
                weighted.push((weight, candidate));
            }
            weighted.sort_by(|a, b| b.0.cmp(&a.0));
            let ambiguous = weighted[0].0 .0 == weighted[1].0 .0;
            if ambiguous {
                tracing::warn!(tag = %self.tag, desc = ?desc, "multiple candidates with the same priority");
            } else {
                tracing::info!(tag = %self.tag, desc = ?desc, "multiple candidates");
            }
            for (i, (_, candidate)) in weighted.iter().enumerate() {
                let line = format!(
                    "no.{} in.{} is {}",
                    i + 1,
                    candidate.resolution.inputs.len(),
                    candidate.class.fullname()
                );
                if ambiguous {
                    tracing::warn!("{line}");
                } else {
                    tracing::info!("{line}");
                }
            }
            candidates = weighted.into_iter().map(|(_, c)| c).collect();
        }
        match candidates.into_iter().next() {
            Some(top) => top.class.instantiate_checked(top.resolution).map(Some),
            None => Ok(None),
        }
    }

    /// Look for an object matching `desc` and store it under the collector
    /// tag, unless that key already holds something. On success the keys
    /// claimed by the object's footprint are removed from `desc`.
    ///
    /// Control keys: `_emptywarning` and `_report` (both default to true)
    /// tune what is logged when nothing is found; other `_` keys are
    /// dropped.
    pub fn pickup(&self, ctx: &Context, desc: &mut Description) -> Result<()> {
        let emptywarning = desc
            .shift_remove("_emptywarning")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let mkreport = desc
            .shift_remove("_report")
            .and_then(|v| v.as_bool())
            .unwrap_or_else(|| self.report_auto.get());
        let hidden: Vec<String> = desc.keys().filter(|k| k.starts_with('_')).cloned().collect();
        for key in hidden {
            tracing::warn!(key = %key, "hidden argument ignored in pickup attributes");
            desc.shift_remove(&key);
        }

        match desc.get(&self.tag) {
            Some(existing) if !existing.is_null() => {
                tracing::debug!(tag = %self.tag, value = %existing, "already defined");
            }
            _ => {
                let found = self.find_best(ctx, desc)?;
                desc.insert(self.tag.clone(), Value::from(found));
            }
        }

        match desc.get(&self.tag).and_then(Value::as_instance) {
            Some(inst) => inst.cleanup(desc),
            None if emptywarning => {
                tracing::warn!(tag = %self.tag, desc = ?desc, "nothing found in description");
                if mkreport && self.report.get() != ReportLevel::None {
                    self.dump_last();
                }
            }
            None => {}
        }
        Ok(())
    }

    fn dump_last(&self) {
        let log = self.log.borrow();
        let Some(last) = log.last() else {
            return;
        };
        let text = match self.report_style.get() {
            ReportStyle::Raw => last.lightdump(),
            ReportStyle::Flat => last.flatdump(),
        };
        tracing::warn!(tag = %self.tag, "search report\n{text}");
    }

    /// Object stored under the tag after a pickup of `desc`.
    pub fn load(&self, ctx: &Context, mut desc: Description) -> Result<Option<Rc<Instance>>> {
        self.pickup(ctx, &mut desc)?;
        Ok(desc.get(&self.tag).and_then(Value::as_instance))
    }

    /// Reuse a live reusable instance compatible with `desc`, else load.
    pub fn default(&self, ctx: &Context, desc: Description) -> Result<Option<Rc<Instance>>> {
        for inst in self.instances() {
            if inst.class().is_reusable() && inst.compatible(ctx, &desc)? {
                tracing::debug!(tag = %self.tag, item = %inst, "reusing instance");
                return Ok(Some(inst));
            }
        }
        self.load(ctx, desc)
    }

    /// Load with the attributes of `original` overridden by `extra`.
    pub fn almost_clone(
        &self,
        ctx: &Context,
        original: &Instance,
        extra: Description,
    ) -> Result<Option<Rc<Instance>>> {
        let mut desc = original.attributes();
        desc.extend(extra);
        self.load(ctx, desc)
    }

    /// Live instances whose attributes equal every entry of `attrs`.
    pub fn grep(&self, attrs: &Description) -> Vec<Rc<Instance>> {
        self.instances()
            .into_iter()
            .filter(|inst| {
                attrs
                    .iter()
                    .all(|(k, v)| inst.get(k).is_ok_and(|mine| mine == v.upgrade()))
            })
            .collect()
    }

    // Introspection

    /// Every value explicitly allowed for `attr` by some class, sorted.
    pub fn get_values(&self, attr: &str) -> Vec<Value> {
        let mut all: Vec<Value> = Vec::new();
        for cls in self.classes.borrow().iter() {
            for v in cls.values(attr).unwrap_or_default() {
                if !all.contains(v) {
                    all.push(v.clone());
                }
            }
        }
        all.sort_by(|a, b| {
            a.partial_cmp(b)
                .unwrap_or_else(|| a.to_string().cmp(&b.to_string()))
        });
        all
    }

    /// Classes by attribute name (suffixed ` [optional]` where optional).
    pub fn attrmap(&self, only: Option<&[&str]>) -> BTreeMap<String, Vec<AttrMapEntry>> {
        let mut map: BTreeMap<String, Vec<AttrMapEntry>> = BTreeMap::new();
        for cls in self.classes.borrow().iter() {
            for spec in cls.footprint().attributes() {
                if only.is_some_and(|names| !names.contains(&spec.name.as_str())) {
                    continue;
                }
                let key = if spec.optional {
                    format!("{} [optional]", spec.name)
                } else {
                    spec.name.clone()
                };
                map.entry(key).or_default().push(AttrMapEntry {
                    name: cls.name().to_string(),
                    module: cls.module().to_string(),
                    values: spec.values.iter().map(Value::to_json).collect(),
                    outcast: spec.outcast.iter().map(Value::to_json).collect(),
                });
            }
        }
        for entries in map.values_mut() {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        map
    }

    /// One ` * name  [optional]` line per attribute of [`Collector::attrmap`].
    pub fn show_attrkeys(&self, only: Option<&[&str]>) -> String {
        let mut out = String::new();
        for key in self.attrmap(only).keys() {
            let (name, flag) = key.split_once(' ').unwrap_or((key.as_str(), ""));
            out.push_str(&format!(" * {name:<24} {flag}\n"));
        }
        out
    }

    // Package and priority filters

    /// Classes whose full name starts with `package`.
    pub fn filter_package(&self, package: &str) -> Vec<Rc<FootprintClass>> {
        self.classes
            .borrow()
            .iter()
            .filter(|c| c.fullname().starts_with(package))
            .cloned()
            .collect()
    }

    pub fn discard_package(&self, package: &str) -> Vec<Rc<FootprintClass>> {
        let gone = self.filter_package(package);
        for cls in &gone {
            tracing::info!(tag = %self.tag, class = %cls.fullname(), "discarding class");
            self.discard(cls);
        }
        gone
    }

    fn filter_level(
        &self,
        priorities: &PrioritySet,
        tag: &str,
        keep: impl Fn(Ordering) -> bool,
    ) -> Result<Vec<Rc<FootprintClass>>> {
        let level = priorities
            .level(tag)
            .ok_or_else(|| Error::UnknownLevel(tag.to_uppercase()))?;
        let mut found = Vec::new();
        for cls in self.classes.borrow().iter() {
            if keep(priorities.compare(&cls.level(), &level)?) {
                found.push(Rc::clone(cls));
            }
        }
        Ok(found)
    }

    /// Classes with a priority level higher than or equal to `tag`.
    pub fn filter_higher_level(&self, priorities: &PrioritySet, tag: &str) -> Result<Vec<Rc<FootprintClass>>> {
        self.filter_level(priorities, tag, |o| o != Ordering::Less)
    }

    /// Classes with a priority level strictly lower than `tag`.
    pub fn filter_lower_level(&self, priorities: &PrioritySet, tag: &str) -> Result<Vec<Rc<FootprintClass>>> {
        self.filter_level(priorities, tag, |o| o == Ordering::Less)
    }

    pub fn discard_higher_level(&self, priorities: &PrioritySet, tag: &str) -> Result<Vec<Rc<FootprintClass>>> {
        let gone = self.filter_higher_level(priorities, tag)?;
        for cls in &gone {
            self.discard(cls);
        }
        Ok(gone)
    }

    pub fn discard_lower_level(&self, priorities: &PrioritySet, tag: &str) -> Result<Vec<Rc<FootprintClass>>> {
        let gone = self.filter_lower_level(priorities, tag)?;
        for cls in &gone {
            self.discard(cls);
        }
        Ok(gone)
    }

    /// Give priority `tag` to the classes of `package`.
    pub fn reset_package_level(&self, priorities: &PrioritySet, package: &str, tag: &str) -> Result<()> {
        let level: PriorityLevel = priorities
            .level(tag)
            .ok_or_else(|| Error::UnknownLevel(tag.to_uppercase()))?;
        for cls in self.filter_package(package) {
            cls.set_level(level.clone());
        }
        Ok(())
    }

    // Reporting

    pub fn report(&self) -> ReportLevel {
        self.report.get()
    }

    pub fn set_report(&self, level: ReportLevel) {
        self.report.set(level);
        self.log
            .borrow_mut()
            .set_maxlen(log_length(level, self.report_len.get()));
    }

    pub fn report_style(&self) -> ReportStyle {
        self.report_style.get()
    }

    pub fn set_report_style(&self, style: ReportStyle) {
        self.report_style.set(style);
    }

    pub fn set_report_auto(&self, auto: bool) {
        self.report_auto.set(auto);
    }

    pub fn set_report_len(&self, len: usize) {
        self.report_len.set(len);
        self.log
            .borrow_mut()
            .set_maxlen(log_length(self.report.get(), len));
    }

    /// Last recorded search.
    pub fn report_last(&self) -> Option<CollectorEntry> {
        self.log.borrow().last().cloned()
    }

    /// Why classes matching `select` were not picked by the last search.
    pub fn report_whynot(&self, select: &str) -> Result<Option<BTreeMap<String, Vec<ReportItem>>>> {
        self.log.borrow().whynot(select)
    }

    pub fn report_dump(&self, stamped: bool) -> serde_json::Value {
        self.log.borrow().as_json(stamped)
    }

    pub fn report_clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn report_len(&self) -> usize {
        self.log.borrow().len()
    }

    // Fast track

    /// Rebuild the fast-subsetting index over `attrs`.
    pub fn set_fasttrack<I, S>(&self, attrs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ft = FastTrack::new(attrs);
        for cls in self.classes.borrow().iter() {
            ft.add(cls);
        }
        *self.fasttrack.borrow_mut() = ft;
    }

    pub fn fasttrack(&self) -> Vec<String> {
        self.fasttrack.borrow().attrs().to_vec()
    }
}

impl Observer for Collector {
    fn new_item(&self, item: &Rc<Instance>, _info: &Description) {
        tracing::debug!(tag = %self.tag, item = %item, "new item");
        let mut instances = self.instances.borrow_mut();
        instances.retain(|w| w.strong_count() > 0);
        instances.push(Rc::downgrade(item));
    }

    fn del_item(&self, item: &Instance, _info: &Description) {
        tracing::debug!(tag = %self.tag, "del item");
        self.instances
            .borrow_mut()
            .retain(|w| w.strong_count() > 0 && !std::ptr::eq(w.as_ptr(), item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::desc;
    use crate::footprint::{AttributeFragment, FootprintFragment};
    use crate::reporting::{OnlyWhy, Reason, Why};
    use crate::types::AttrType;
    use pretty_assertions::assert_eq;

    fn footprint(kinds: &[&str]) -> FootprintFragment {
        FootprintFragment::new()
            .attr("kind", AttributeFragment::new().values(kinds.iter().copied()))
            .attr("someint", AttributeFragment::new().typ(AttrType::Int).values(0..10))
    }

    fn build(ctx: &mut Context, name: &str, fp: FootprintFragment) -> Rc<FootprintClass> {
        ClassBuilder::new(name).module("coll").footprint(fp).build(ctx).unwrap()
    }

    #[test]
    fn test_find_best_by_priority() {
        let mut ctx = Context::new();
        build(&mut ctx, "Plain", footprint(&["hip"]));
        build(&mut ctx, "Tool", footprint(&["hip"]).priority("toolbox"));
        let collector = ctx.collector("garbage");
        let d = desc! { "kind" => "hip", "someint" => 5 };
        assert_eq!(collector.find_all(&ctx, &d).unwrap().len(), 2);
        let best = collector.find_best(&ctx, &d).unwrap().unwrap();
        assert_eq!(best.class().name(), "Tool");
    }

    #[test]
    fn test_find_best_prefers_supplied_attributes() {
        let mut ctx = Context::new();
        build(
            &mut ctx,
            "Guessing",
            footprint(&["hip"]).attr("label", AttributeFragment::new().optional(true).default("x")),
        );
        build(
            &mut ctx,
            "Asking",
            footprint(&["hip"]).attr("extra", AttributeFragment::new()),
        );
        let collector = ctx.collector("garbage");
        let best = collector
            .find_best(&ctx, &desc! { "kind" => "hip", "someint" => 5, "extra" => "y" })
            .unwrap()
            .unwrap();
        assert_eq!(best.class().name(), "Asking");
    }

    #[test]
    fn test_pickup_consumes_tracked_keys() {
        let mut ctx = Context::new();
        build(&mut ctx, "Foo", footprint(&["hip", "hop"]).attr("label", AttributeFragment::new().alias(["lbl"]).optional(true)));
        let collector = ctx.collector("garbage");
        let mut d = desc! { "kind" => "hip", "someint" => 2, "lbl" => "x", "extra_key" => 1, "_debug" => true };
        collector.pickup(&ctx, &mut d).unwrap();
        assert_eq!(d.keys().map(String::as_str).collect::<Vec<_>>(), vec!["extra_key", "garbage"]);
        let inst = d["garbage"].as_instance().unwrap();
        assert_eq!(inst.get("label").unwrap(), Value::from("x"));
        assert_eq!(collector.instances().len(), 1);
    }

    #[test]
    fn test_pickup_keeps_existing_value() {
        let mut ctx = Context::new();
        build(&mut ctx, "Foo", footprint(&["hip"]));
        let collector = ctx.collector("garbage");
        let mut d = desc! { "kind" => "hip", "someint" => 2, "garbage" => "mine" };
        collector.pickup(&ctx, &mut d).unwrap();
        assert_eq!(d["garbage"], Value::from("mine"));
        assert!(d.contains_key("kind"));
    }

    #[test]
    fn test_failed_load_is_reported() {
        let mut ctx = Context::new();
        build(&mut ctx, "Foo", footprint(&["hip"]));
        build(&mut ctx, "Bar", footprint(&["hop"]).only("someint", [3]));
        let collector = ctx.collector("garbage");
        collector.set_fasttrack(Vec::<String>::new());
        let found = collector
            .load(&ctx, desc! { "kind" => "hop", "someint" => 4, "_emptywarning" => false })
            .unwrap();
        assert!(found.is_none());
        assert_eq!(collector.report_len(), 1);
        let whynot = collector.report_whynot("foo").unwrap().unwrap();
        assert_eq!(whynot["coll.Foo"][0].reason, Reason::Attribute(Why::Outside));
        let whynot = collector.report_whynot("bar").unwrap().unwrap();
        assert_eq!(whynot["coll.Bar"][0].reason, Reason::Only(OnlyWhy::NotMatch));

        // Successful searches are not recorded on error-only reporting.
        collector.load(&ctx, desc! { "kind" => "hip", "someint" => 4 }).unwrap().unwrap();
        assert_eq!(collector.report_len(), 1);

        collector.set_report(ReportLevel::Light);
        collector.load(&ctx, desc! { "kind" => "hip", "someint" => 4 }).unwrap().unwrap();
        assert_eq!(collector.report_len(), 2);
        let last = collector.report_last().unwrap();
        assert_eq!(last.candidates.len(), 2);
    }

    #[test]
    fn test_default_reuses_compatible_instances() {
        let mut ctx = Context::new();
        build(&mut ctx, "Foo", footprint(&["hip", "hop"]));
        let collector = ctx.collector("garbage");
        let first = collector.default(&ctx, desc! { "kind" => "hip", "someint" => 1 }).unwrap().unwrap();
        let again = collector.default(&ctx, desc! { "kind" => "hip", "someint" => "1" }).unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        let other = collector.default(&ctx, desc! { "kind" => "hop", "someint" => 1 }).unwrap().unwrap();
        assert!(!Rc::ptr_eq(&first, &other));
        assert_eq!(collector.grep(&desc! { "kind" => "hop" }).len(), 1);
        assert_eq!(collector.grep(&desc! { "someint" => 1 }).len(), 2);

        let clone = collector
            .almost_clone(&ctx, &first, desc! { "someint" => 7 })
            .unwrap()
            .unwrap();
        assert_eq!(clone.get("someint").unwrap(), Value::Int(7));
        assert_eq!(clone.get("kind").unwrap(), Value::from("hip"));

        drop(other);
        assert_eq!(collector.instances().len(), 2);
    }

    #[test]
    fn test_non_reusable_classes_are_rebuilt() {
        let mut ctx = Context::new();
        ClassBuilder::new("Once")
            .reusable(false)
            .footprint(footprint(&["hip"]))
            .build(&mut ctx)
            .unwrap();
        let collector = ctx.collector("garbage");
        let a = collector.default(&ctx, desc! { "kind" => "hip", "someint" => 1 }).unwrap().unwrap();
        let b = collector.default(&ctx, desc! { "kind" => "hip", "someint" => 1 }).unwrap().unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_introspection() {
        let mut ctx = Context::new();
        build(&mut ctx, "Foo", footprint(&["hop", "hip"]));
        build(
            &mut ctx,
            "Bar",
            footprint(&["hup"]).attr("note", AttributeFragment::new().optional(true)),
        );
        let collector = ctx.collector("garbage");
        assert_eq!(
            collector.get_values("kind"),
            vec![Value::from("hip"), Value::from("hop"), Value::from("hup")]
        );
        let map = collector.attrmap(Some(&["kind", "note"][..]));
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["kind", "note [optional]"]);
        assert_eq!(map["kind"][0].name, "Bar");
        assert_eq!(map["kind"][1].values, vec![serde_json::json!("hop"), serde_json::json!("hip")]);
        assert_eq!(
            collector.show_attrkeys(None),
            format!(" * {:<24} \n * {:<24} [optional]\n * {:<24} \n", "kind", "note", "someint")
        );
    }

    #[test]
    fn test_package_and_level_filters() {
        let mut ctx = Context::new();
        let a = ClassBuilder::new("A").module("pkg.one").footprint(footprint(&["a"])).build(&mut ctx).unwrap();
        ClassBuilder::new("B")
            .module("pkg.two")
            .footprint(footprint(&["b"]).priority("toolbox"))
            .build(&mut ctx)
            .unwrap();
        let collector = ctx.collector("garbage");
        assert_eq!(collector.filter_package("pkg.one").len(), 1);
        assert_eq!(collector.filter_higher_level(ctx.priorities(), "toolbox").unwrap().len(), 1);
        assert_eq!(collector.filter_lower_level(ctx.priorities(), "toolbox").unwrap()[0].name(), "A");
        assert!(collector.filter_higher_level(ctx.priorities(), "nope").is_err());

        collector.reset_package_level(ctx.priorities(), "pkg.one", "debug").unwrap();
        assert_eq!(a.level().tag(), "DEBUG");
        assert!(collector.filter_lower_level(ctx.priorities(), "toolbox").unwrap().is_empty());

        let gone = collector.discard_package("pkg.two");
        assert_eq!(gone.len(), 1);
        assert_eq!(collector.len(), 1);
        assert!(collector
            .find_all(&ctx, &desc! { "kind" => "b", "someint" => 1 })
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fasttrack_keeps_results() {
        let mut ctx = Context::new();
        build(&mut ctx, "Hip", footprint(&["hip"]));
        build(&mut ctx, "Hop", footprint(&["hop"]));
        build(
            &mut ctx,
            "Any",
            FootprintFragment::new()
                .attr("kind", AttributeFragment::new())
                .attr("someint", AttributeFragment::new().typ(AttrType::Int)),
        );
        let collector = ctx.collector("garbage");
        assert_eq!(collector.fasttrack(), vec!["kind".to_string()]);
        let d = desc! { "kind" => "hop", "someint" => 3 };
        let names = |found: Vec<Candidate>| found.iter().map(|c| c.class.name().to_string()).collect::<Vec<_>>();
        let indexed = names(collector.find_all(&ctx, &d).unwrap());
        collector.set_fasttrack(Vec::<String>::new());
        let exhaustive = names(collector.find_all(&ctx, &d).unwrap());
        assert_eq!(indexed, exhaustive);
        assert_eq!(indexed, vec!["Hop", "Any"]);
    }

    #[test]
    fn test_schema_errors_abort_the_search() {
        let mut ctx = Context::new();
        build(
            &mut ctx,
            "Broken",
            footprint(&["hip"]).attr("label", AttributeFragment::new().optional(true).default("[nowhere]")),
        );
        let collector = ctx.collector("garbage");
        let err = collector
            .find_all(&ctx, &desc! { "kind" => "hip", "someint" => 1 })
            .unwrap_err();
        assert!(matches!(err, Error::UnreachableAttr { .. }), "{err}");
    }
}
