//! Fast-subsetting index
//!
//! For a few attribute names, [`FastTrack`] maps every admissible value to
//! the ids of the classes accepting it. Classes the index cannot speak for
//! (attribute optional, missing, unrestricted, pattern-valued or typed
//! differently) sit in a per-attribute trap and stay candidates for any
//! value. Subsetting only ever shrinks the set of classes to screen.

use crate::class::FootprintClass;
use crate::placeholder::Placeholder;
use crate::types::{AttrType, TypeArgs};
use crate::value::{Description, Value};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct FastTrack {
    attrs: Vec<String>,
    types: HashMap<String, (AttrType, TypeArgs)>,
    index: HashMap<String, Vec<(Value, BTreeSet<usize>)>>,
    trap: HashMap<String, BTreeSet<usize>>,
}

impl FastTrack {
    pub fn new<I, S>(attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attrs: Vec<String> = attrs.into_iter().map(Into::into).collect();
        attrs.sort();
        attrs.dedup();
        Self {
            attrs,
            ..Self::default()
        }
    }

    pub fn attrs(&self) -> &[String] {
        &self.attrs
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Index `cls` under every fast attribute.
    pub fn add(&mut self, cls: &FootprintClass) {
        for attr in &self.attrs {
            let trap = self.trap.entry(attr.clone()).or_default();
            let Some(spec) = cls.footprint().attribute(attr) else {
                trap.insert(cls.id());
                continue;
            };
            let indexable = !spec.optional
                && !spec.values.is_empty()
                && !spec.values.iter().any(|v| matches!(v, Value::Pattern(_)));
            if !indexable {
                trap.insert(cls.id());
                continue;
            }
            match self.types.get(attr) {
                Some((typ, args)) if !typ.same_as(&spec.typ) || *args != spec.args => {
                    tracing::warn!(
                        attr = %attr,
                        class = %cls.fullname(),
                        expected = %typ,
                        found = %spec.typ,
                        "inconsistent fast track type, class left out of the index"
                    );
                    trap.insert(cls.id());
                    continue;
                }
                Some(_) => {}
                None => {
                    self.types
                        .insert(attr.clone(), (spec.typ.clone(), spec.args.clone()));
                }
            }
            let entries = self.index.entry(attr.clone()).or_default();
            let keys = spec.values.iter().chain(spec.remap.iter().map(|(from, _)| from));
            for key in keys {
                match entries.iter_mut().find(|(v, _)| v == key) {
                    Some((_, ids)) => {
                        ids.insert(cls.id());
                    }
                    None => entries.push((key.clone(), BTreeSet::from([cls.id()]))),
                }
            }
        }
    }

    pub fn remove(&mut self, id: usize) {
        for entries in self.index.values_mut() {
            for (_, ids) in entries.iter_mut() {
                ids.remove(&id);
            }
            entries.retain(|(_, ids)| !ids.is_empty());
        }
        for ids in self.trap.values_mut() {
            ids.remove(&id);
        }
    }

    fn hits(&self, attr: &str, value: &Value) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        let Some(entries) = self.index.get(attr) else {
            return found;
        };
        let coerced = self
            .types
            .get(attr)
            .and_then(|(typ, args)| typ.coerce(value, args).ok());
        for (key, ids) in entries {
            if key == value || coerced.as_ref().is_some_and(|c| key == c) {
                found.extend(ids.iter().copied());
            }
        }
        found
    }

    /// Ids of the classes worth screening for `desc`, or `None` when no
    /// fast attribute narrows anything down.
    pub fn subset(&self, desc: &Description) -> Option<BTreeSet<usize>> {
        let mut result: Option<BTreeSet<usize>> = None;
        for attr in &self.attrs {
            let Some(value) = desc.get(attr) else {
                continue;
            };
            if value.is_null() || value.as_str().is_some_and(Placeholder::contains) {
                continue;
            }
            let hits = self.hits(attr, value);
            if hits.is_empty() {
                continue;
            }
            tracing::debug!(attr = %attr, "fast track subsetting");
            let mut group = hits;
            if let Some(trap) = self.trap.get(attr) {
                group.extend(trap.iter().copied());
            }
            result = Some(match result {
                Some(current) => current.intersection(&group).copied().collect(),
                None => group,
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::context::Context;
    use crate::desc;
    use crate::footprint::{AttributeFragment, FootprintFragment};
    use crate::value::Pattern;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn class(ctx: &mut Context, name: &str, kind: AttributeFragment) -> Rc<FootprintClass> {
        ClassBuilder::new(name)
            .module("ft")
            .explicit(false)
            .footprint(FootprintFragment::new().attr("kind", kind))
            .build(ctx)
            .unwrap()
    }

    #[test]
    fn test_index_and_trap() {
        let mut ctx = Context::new();
        let a = class(&mut ctx, "A", AttributeFragment::new().values(["hip", "hop"]).remap("foo", "hop"));
        let b = class(&mut ctx, "B", AttributeFragment::new().values(["hup"]));
        let c = class(&mut ctx, "C", AttributeFragment::new().optional(true).values(["hip"]));
        let d = class(&mut ctx, "D", AttributeFragment::new().values([Pattern::new("^h").unwrap()]));

        let mut ft = FastTrack::new(["kind"]);
        for cls in [&a, &b, &c, &d] {
            ft.add(cls);
        }
        assert_eq!(ft.subset(&desc! { "kind" => "hip" }), Some(BTreeSet::from([a.id(), c.id(), d.id()])));
        assert_eq!(ft.subset(&desc! { "kind" => "foo" }), Some(BTreeSet::from([a.id(), c.id(), d.id()])));
        assert_eq!(ft.subset(&desc! { "kind" => "hup" }), Some(BTreeSet::from([b.id(), c.id(), d.id()])));
        assert_eq!(ft.subset(&desc! { "kind" => "nothing" }), None);
        assert_eq!(ft.subset(&desc! { "kind" => "[other]" }), None);
        assert_eq!(ft.subset(&desc! { "other" => "hip" }), None);

        ft.remove(a.id());
        assert_eq!(ft.subset(&desc! { "kind" => "foo" }), None);
    }

    #[test]
    fn test_coerced_lookup_and_type_conflicts() {
        let mut ctx = Context::new();
        let a = class(&mut ctx, "A", AttributeFragment::new().typ(AttrType::Int).values([1, 2]));
        let b = class(&mut ctx, "B", AttributeFragment::new().values(["1"]));

        let mut ft = FastTrack::new(["kind"]);
        ft.add(&a);
        ft.add(&b);
        assert_eq!(ft.subset(&desc! { "kind" => "2" }), Some(BTreeSet::from([a.id(), b.id()])));
        assert_eq!(ft.subset(&desc! { "kind" => 1 }), Some(BTreeSet::from([a.id(), b.id()])));
    }
}
