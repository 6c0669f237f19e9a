//! Footprints
//!
//! A [`Footprint`] is the declarative schema of a class: a table of
//! [`AttributeSpec`] plus footprint-wide metadata (`info`, only-rules,
//! priority level). Footprints are built by merging [`FootprintFragment`]s
//! in order, later fragments overriding earlier ones attribute by attribute.
//!
//! ```
//! use footprints::{AttrType, AttributeFragment, Footprint, FootprintFragment};
//!
//! let fp = Footprint::new([FootprintFragment::new()
//!     .info("Demo")
//!     .attr("kind", AttributeFragment::new().values(["hip", "hop"]).alias(["stuff"]))
//!     .attr("someint", AttributeFragment::new().typ(AttrType::Int).values(0..10))])
//! .unwrap();
//! assert_eq!(fp.mandatory(), vec!["kind", "someint"]);
//! ```

mod only;
mod resolve;

pub use resolve::{Resolution, ResolveCache, ResolveOptions, MAX_PASSES};

use crate::access::Access;
use crate::error::{Error, Result};
use crate::priorities::PriorityLevel;
use crate::reporting::Why;
use crate::types::{AttrType, TypeArgs};
use crate::value::{Description, Value};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// Declared default of an attribute.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Computed each time a resolution needs it.
    Lazy(Rc<dyn Fn() -> Value>),
}

impl DefaultValue {
    pub fn value(&self) -> Value {
        match self {
            DefaultValue::Literal(v) => v.clone(),
            DefaultValue::Lazy(f) => f(),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Literal(Value::Null))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => write!(f, "{v:?}"),
            DefaultValue::Lazy(_) => write!(f, "<lazy>"),
        }
    }
}

/// Why a value was refused by an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Subclass(String),
    Reclass(String),
    Outside(Value),
    Outcast(Value),
}

impl Rejection {
    pub fn why(&self) -> Why {
        match self {
            Rejection::Subclass(_) => Why::Subclass,
            Rejection::Reclass(_) => Why::Reclass,
            Rejection::Outside(_) => Why::Outside,
            Rejection::Outcast(_) => Why::Outcast,
        }
    }

    pub fn args(&self) -> Option<String> {
        match self {
            Rejection::Subclass(detail) | Rejection::Reclass(detail) => Some(detail.clone()),
            Rejection::Outside(v) | Rejection::Outcast(v) => Some(v.to_string()),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args() {
            Some(args) => write!(f, "{} ({})", self.why().as_str(), args),
            None => write!(f, "{}", self.why().as_str()),
        }
    }
}

/// One normalized attribute of a footprint.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub name: String,
    pub typ: AttrType,
    pub args: TypeArgs,
    pub isclass: bool,
    pub default: Option<DefaultValue>,
    pub optional: bool,
    pub alias: BTreeSet<String>,
    pub remap: Vec<(Value, Value)>,
    pub values: Vec<Value>,
    pub outcast: Vec<Value>,
    pub access: Access,
    pub info: Option<String>,
    pub doc_visibility: PriorityLevel,
    pub doc_zorder: i32,
}

impl AttributeSpec {
    pub fn in_values(&self, value: &Value) -> bool {
        self.values.iter().any(|member| member.admits(value))
    }

    pub fn is_outcast(&self, value: &Value) -> bool {
        self.outcast.iter().any(|member| member.admits(value))
    }

    pub fn remap_target(&self, value: &Value) -> Option<&Value> {
        if !value.is_hashable() {
            return None;
        }
        self.remap.iter().find(|(from, _)| from == value).map(|(_, to)| to)
    }

    /// Follow the remap table until the value is no longer a remap key.
    pub fn remap(&self, mut value: Value) -> Result<Value> {
        let mut passes = 0;
        while let Some(next) = self.remap_target(&value) {
            passes += 1;
            if passes > MAX_PASSES {
                return Err(Error::MaxIter {
                    attr: self.name.clone(),
                    passes,
                });
            }
            value = next.clone();
        }
        Ok(value)
    }

    /// Type, values and outcast checks shared by resolution and attribute
    /// writes. Stops at the first failed check.
    pub fn validate(&self, value: Value) -> std::result::Result<Value, Rejection> {
        let value = if self.isclass {
            if !self.typ.accepts_subclass(&value) {
                return Err(Rejection::Subclass(self.typ.name()));
            }
            value
        } else if self.typ.is_instance(&value) {
            value
        } else {
            self.typ
                .coerce(&value, &self.args)
                .map_err(|_| Rejection::Reclass(format!("{}, {}", self.typ.name(), value)))?
        };
        if !self.values.is_empty() && !self.in_values(&value) {
            return Err(Rejection::Outside(value));
        }
        if !self.outcast.is_empty() && self.is_outcast(&value) {
            return Err(Rejection::Outcast(value));
        }
        Ok(value)
    }

    /// Partial definition carrying every field of this one.
    pub fn as_fragment(&self) -> AttributeFragment {
        AttributeFragment {
            typ: Some(self.typ.clone()),
            args: Some(self.args.clone()),
            isclass: Some(self.isclass),
            default: Some(self.default.clone().unwrap_or(DefaultValue::Literal(Value::Null))),
            optional: Some(self.optional),
            alias: Some(self.alias.clone()),
            remap: Some(self.remap.clone()),
            autoremap: None,
            values: Some(self.values.clone()),
            outcast: Some(self.outcast.clone()),
            access: Some(self.access),
            info: self.info.clone(),
            doc_visibility: Some(self.doc_visibility.clone()),
            doc_zorder: Some(self.doc_zorder),
        }
    }
}

/// Partial attribute definition, merged field by field.
#[derive(Debug, Clone, Default)]
pub struct AttributeFragment {
    pub typ: Option<AttrType>,
    pub args: Option<TypeArgs>,
    pub isclass: Option<bool>,
    /// `Literal(Value::Null)` resets an inherited default.
    pub default: Option<DefaultValue>,
    pub optional: Option<bool>,
    pub alias: Option<BTreeSet<String>>,
    pub remap: Option<Vec<(Value, Value)>>,
    /// Remap every admissible value to the first one.
    pub autoremap: Option<bool>,
    pub values: Option<Vec<Value>>,
    pub outcast: Option<Vec<Value>>,
    pub access: Option<Access>,
    pub info: Option<String>,
    pub doc_visibility: Option<PriorityLevel>,
    pub doc_zorder: Option<i32>,
}

impl AttributeFragment {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    pub fn typ(mut self, typ: AttrType) -> Self {
        self.typ = Some(typ);
        self
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.args.get_or_insert_with(TypeArgs::new).insert(key.to_string(), value.into());
        self
    }

    pub fn isclass(mut self, isclass: bool) -> Self {
        self.isclass = Some(isclass);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn lazy_default(mut self, f: impl Fn() -> Value + 'static) -> Self {
        self.default = Some(DefaultValue::Lazy(Rc::new(f)));
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn alias<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.alias = Some(aliases.into_iter().map(|a| a.as_ref().to_string()).collect());
        self
    }

    pub fn remap(mut self, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        let table = self.remap.get_or_insert_with(Vec::new);
        let from = from.into();
        let to = to.into();
        match table.iter_mut().find(|(k, _)| *k == from) {
            Some(entry) => entry.1 = to,
            None => table.push((from, to)),
        }
        self
    }

    pub fn autoremap(mut self) -> Self {
        self.autoremap = Some(true);
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn outcast<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.outcast = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn info(mut self, info: &str) -> Self {
        self.info = Some(info.to_string());
        self
    }

    pub fn doc_visibility(mut self, level: &str) -> Self {
        self.doc_visibility = Some(PriorityLevel::new(level));
        self
    }

    pub fn doc_zorder(mut self, zorder: i32) -> Self {
        self.doc_zorder = Some(zorder);
        self
    }

    /// Overlay `other` onto `self`. Type args and remap tables merge key by
    /// key; every other field is replaced when `other` sets it.
    pub fn merge(&mut self, other: &AttributeFragment) {
        if let Some(typ) = &other.typ {
            self.typ = Some(typ.clone());
        }
        if let Some(args) = &other.args {
            let mine = self.args.get_or_insert_with(TypeArgs::new);
            for (k, v) in args {
                mine.insert(k.clone(), v.clone());
            }
        }
        if let Some(remap) = &other.remap {
            let mine = self.remap.get_or_insert_with(Vec::new);
            for (from, to) in remap {
                match mine.iter_mut().find(|(k, _)| k == from) {
                    Some(entry) => entry.1 = to.clone(),
                    None => mine.push((from.clone(), to.clone())),
                }
            }
        }
        macro_rules! overlay {
            ($($field:ident),*) => {
                $( if other.$field.is_some() { self.$field = other.$field.clone(); } )*
            };
        }
        overlay!(isclass, default, optional, alias, autoremap, values, outcast, access, info, doc_visibility, doc_zorder);
    }

    fn normalize(self, owner: &str, name: &str) -> Result<AttributeSpec> {
        let typ = self.typ.unwrap_or_default();
        let args = self.args.unwrap_or_default();
        let mut remap = self.remap.unwrap_or_default();
        let values = self.values.unwrap_or_default();

        if self.autoremap == Some(true) {
            let Some(first) = values.first() else {
                return Err(Error::InvalidDefinition(format!(
                    "{owner}: autoremap on attribute `{name}` without values"
                )));
            };
            for other in &values[1..] {
                match remap.iter_mut().find(|(k, _)| k == other) {
                    Some(entry) => entry.1 = first.clone(),
                    None => remap.push((other.clone(), first.clone())),
                }
            }
        }

        let reclass = |field: &str, items: Vec<Value>| -> Result<Vec<Value>> {
            items
                .into_iter()
                .map(|v| {
                    if typ.is_instance(&v) || matches!(v, Value::Pattern(_)) || self.isclass == Some(true) {
                        Ok(v)
                    } else {
                        typ.coerce(&v, &args).map_err(|e| {
                            Error::InvalidDefinition(format!(
                                "{owner}: bad {field} entry `{v}` for attribute `{name}`: {e}"
                            ))
                        })
                    }
                })
                .collect()
        };
        let values = reclass("values", values)?;
        let outcast = reclass("outcast", self.outcast.unwrap_or_default())?;

        Ok(AttributeSpec {
            name: name.to_string(),
            typ: typ.clone(),
            args: args.clone(),
            isclass: self.isclass.unwrap_or(false),
            default: self.default.filter(|d| !d.is_null()),
            optional: self.optional.unwrap_or(false),
            alias: self.alias.unwrap_or_default(),
            remap,
            values,
            outcast,
            access: self.access.unwrap_or_default(),
            info: self.info,
            doc_visibility: self.doc_visibility.unwrap_or_default(),
            doc_zorder: self.doc_zorder.unwrap_or(0).clamp(-100, 100),
        })
    }
}

/// Partial footprint definition.
#[derive(Debug, Clone, Default)]
pub struct FootprintFragment {
    pub info: Option<String>,
    pub attr: IndexMap<String, AttributeFragment>,
    pub only: IndexMap<String, Vec<Value>>,
    pub priority: Option<PriorityLevel>,
    pub bind: Option<Vec<String>>,
    pub fastkeys: Option<BTreeSet<String>>,
}

impl FootprintFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(mut self, info: &str) -> Self {
        self.info = Some(info.to_string());
        self
    }

    /// Add or extend the definition of attribute `name`.
    pub fn attr(mut self, name: &str, fragment: AttributeFragment) -> Self {
        match self.attr.get_mut(name) {
            Some(existing) => existing.merge(&fragment),
            None => {
                self.attr.insert(name.to_string(), fragment);
            }
        }
        self
    }

    /// Only-rule: `key` may carry an `after_` or `before_` prefix.
    pub fn only<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.only.insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn priority(mut self, level: &str) -> Self {
        self.priority = Some(PriorityLevel::new(level));
        self
    }

    pub fn bind<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bind = Some(names.into_iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    pub fn fastkeys<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fastkeys = Some(names.into_iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    fn merge(&mut self, other: &FootprintFragment) {
        for (name, fragment) in &other.attr {
            match self.attr.get_mut(name) {
                Some(existing) => existing.merge(fragment),
                None => {
                    self.attr.insert(name.clone(), fragment.clone());
                }
            }
        }
        for (key, values) in &other.only {
            self.only.insert(key.clone(), values.clone());
        }
        if other.info.is_some() {
            self.info = other.info.clone();
        }
        if other.priority.is_some() {
            self.priority = other.priority.clone();
        }
        if other.bind.is_some() {
            self.bind = other.bind.clone();
        }
        if other.fastkeys.is_some() {
            self.fastkeys = other.fastkeys.clone();
        }
    }
}

/// Normalized, immutable footprint.
#[derive(Debug, Clone)]
pub struct Footprint {
    attrs: IndexMap<String, AttributeSpec>,
    info: String,
    only: IndexMap<String, Vec<Value>>,
    priority: PriorityLevel,
    bind: Vec<String>,
    fastkeys: BTreeSet<String>,
}

impl Default for Footprint {
    fn default() -> Self {
        Footprint {
            attrs: IndexMap::new(),
            info: "Not documented".to_string(),
            only: IndexMap::new(),
            priority: PriorityLevel::default(),
            bind: Vec::new(),
            fastkeys: BTreeSet::new(),
        }
    }
}

impl Footprint {
    pub fn new(fragments: impl IntoIterator<Item = FootprintFragment>) -> Result<Self> {
        Self::build("unknown class", fragments)
    }

    /// Merge `fragments` in order and normalize the result. `owner` only
    /// names the class in diagnostics.
    pub fn build(owner: &str, fragments: impl IntoIterator<Item = FootprintFragment>) -> Result<Self> {
        let mut merged = FootprintFragment::new();
        let mut declared_types: IndexMap<String, Vec<AttrType>> = IndexMap::new();
        for fragment in fragments {
            for (name, attr) in &fragment.attr {
                if let Some(typ) = &attr.typ {
                    declared_types.entry(name.clone()).or_default().push(typ.clone());
                }
            }
            merged.merge(&fragment);
        }
        for (name, types) in &declared_types {
            if types.windows(2).any(|pair| !pair[0].same_as(&pair[1])) {
                let listed: Vec<String> = types.iter().map(AttrType::name).collect();
                tracing::warn!(class = owner, attr = %name, types = %listed.join(","), "type inconsistency among footprints");
            }
        }

        let mut attrs = IndexMap::with_capacity(merged.attr.len());
        for (name, fragment) in merged.attr {
            let spec = fragment.normalize(owner, &name)?;
            attrs.insert(name, spec);
        }
        Ok(Footprint {
            attrs,
            info: merged.info.unwrap_or_else(|| "Not documented".to_string()),
            only: merged.only,
            priority: merged.priority.unwrap_or_default(),
            bind: merged.bind.unwrap_or_default(),
            fastkeys: merged.fastkeys.unwrap_or_default(),
        })
    }

    /// Fragment reproducing this footprint, for further merging.
    pub fn as_fragment(&self) -> FootprintFragment {
        FootprintFragment {
            info: Some(self.info.clone()),
            attr: self
                .attrs
                .iter()
                .map(|(name, spec)| (name.clone(), spec.as_fragment()))
                .collect(),
            only: self.only.clone(),
            priority: Some(self.priority.clone()),
            bind: Some(self.bind.clone()),
            fastkeys: Some(self.fastkeys.clone()),
        }
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn priority(&self) -> &PriorityLevel {
        &self.priority
    }

    pub fn bind(&self) -> &[String] {
        &self.bind
    }

    pub fn fastkeys(&self) -> &BTreeSet<String> {
        &self.fastkeys
    }

    pub fn only(&self) -> &IndexMap<String, Vec<Value>> {
        &self.only
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attrs.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attrs.get(name)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn mandatory(&self) -> Vec<&str> {
        self.attrs
            .values()
            .filter(|a| !a.optional)
            .map(|a| a.name.as_str())
            .collect()
    }

    pub fn optional(&self, name: &str) -> Result<bool> {
        self.attrs
            .get(name)
            .map(|a| a.optional)
            .ok_or_else(|| Error::NoSuchAttribute(name.to_string()))
    }

    pub fn values(&self, name: &str) -> Result<&[Value]> {
        self.attrs
            .get(name)
            .map(|a| a.values.as_slice())
            .ok_or_else(|| Error::NoSuchAttribute(name.to_string()))
    }

    pub fn outcast(&self, name: &str) -> Result<&[Value]> {
        self.attrs
            .get(name)
            .map(|a| a.outcast.as_slice())
            .ok_or_else(|| Error::NoSuchAttribute(name.to_string()))
    }

    /// Attribute names and all their aliases.
    pub fn tracked(&self) -> BTreeSet<String> {
        self.attrs
            .values()
            .flat_map(|a| std::iter::once(a.name.clone()).chain(a.alias.iter().cloned()))
            .collect()
    }

    /// Keys of `desc` this footprint claims, as attribute or alias.
    pub fn track(&self, desc: &Description) -> Vec<String> {
        let keys = self.tracked();
        desc.keys().filter(|k| keys.contains(*k)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessMode;
    use pretty_assertions::assert_eq;

    fn base() -> FootprintFragment {
        FootprintFragment::new()
            .info("Base")
            .attr(
                "kind",
                AttributeFragment::new()
                    .values(["hip", "hop"])
                    .alias(["stuff"])
                    .remap("foo", "hop"),
            )
            .attr("someint", AttributeFragment::new().typ(AttrType::Int).values(["1", "2", "3"]))
    }

    #[test]
    fn test_new_fragment_is_blank() {
        let blank = AttributeFragment::new();
        assert!(blank.default.is_none());
        assert!(blank.typ.is_none() && blank.values.is_none());

        let with_default = AttributeFragment::new().default("x");
        assert!(matches!(with_default.default, Some(DefaultValue::Literal(Value::Str(ref s))) if s == "x"));
    }

    #[test]
    fn test_values_are_reclassed() {
        let fp = Footprint::new([base()]).unwrap();
        assert_eq!(fp.values("someint").unwrap(), &[Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(fp.values("nope").is_err());
    }

    #[test]
    fn test_bad_values_are_invalid_definitions() {
        let broken = FootprintFragment::new().attr("n", AttributeFragment::new().typ(AttrType::Int).values(["x"]));
        assert!(matches!(Footprint::new([broken]), Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_merge_overrides_and_deep_merges() {
        let child = FootprintFragment::new()
            .attr("kind", AttributeFragment::new().remap("bar", "hip").optional(true))
            .attr("extra", AttributeFragment::new().optional(true).default("x"))
            .only("after_rdate", [1]);
        let fp = Footprint::new([base(), child]).unwrap();
        let kind = fp.attribute("kind").unwrap();
        assert!(kind.optional);
        assert_eq!(kind.remap.len(), 2);
        assert_eq!(kind.alias.iter().collect::<Vec<_>>(), vec!["stuff"]);
        assert_eq!(fp.info(), "Base");
        assert_eq!(fp.mandatory(), vec!["someint"]);
        assert_eq!(fp.only().len(), 1);
        assert_eq!(
            fp.tracked().into_iter().collect::<Vec<_>>(),
            vec!["extra", "kind", "someint", "stuff"]
        );
    }

    #[test]
    fn test_normalized_defaults() {
        let fp = Footprint::new([FootprintFragment::new().attr("a", AttributeFragment::new().doc_zorder(500))]).unwrap();
        let a = fp.attribute("a").unwrap();
        assert_eq!(a.doc_zorder, 100);
        assert_eq!(a.access.mode, AccessMode::ReadOnly);
        assert!(!a.access.weak);
        assert_eq!(a.doc_visibility.tag(), "DEFAULT");
        assert_eq!(fp.priority().tag(), "DEFAULT");
        assert_eq!(fp.info(), "Not documented");
    }

    #[test]
    fn test_autoremap_first() {
        let fp = Footprint::new([FootprintFragment::new().attr(
            "model",
            AttributeFragment::new().values(["arpege", "arp", "ifs"]).autoremap(),
        )])
        .unwrap();
        let model = fp.attribute("model").unwrap();
        assert_eq!(model.remap(Value::from("ifs")).unwrap(), Value::from("arpege"));
        assert_eq!(model.remap(Value::from("arpege")).unwrap(), Value::from("arpege"));
    }

    #[test]
    fn test_remap_cycle_is_bounded() {
        let fp = Footprint::new([FootprintFragment::new().attr(
            "a",
            AttributeFragment::new().remap("x", "y").remap("y", "x"),
        )])
        .unwrap();
        let err = fp.attribute("a").unwrap().remap(Value::from("x")).unwrap_err();
        assert!(matches!(err, Error::MaxIter { .. }));
    }

    #[test]
    fn test_default_reset_by_null() {
        let parent = FootprintFragment::new().attr("a", AttributeFragment::new().optional(true).default("x"));
        let child = FootprintFragment::new().attr("a", AttributeFragment::new().default(Value::Null));
        let fp = Footprint::new([parent.clone(), child]).unwrap();
        assert!(fp.attribute("a").unwrap().default.is_none());
        let fp = Footprint::new([parent]).unwrap();
        let again = Footprint::new([fp.as_fragment()]).unwrap();
        assert!(matches!(
            again.attribute("a").unwrap().default,
            Some(DefaultValue::Literal(Value::Str(_)))
        ));
    }

    #[test]
    fn test_validate_reports_first_failure() {
        let fp = Footprint::new([FootprintFragment::new().attr(
            "n",
            AttributeFragment::new().typ(AttrType::Int).values([1, 2, 3]).outcast([2]),
        )])
        .unwrap();
        let n = fp.attribute("n").unwrap();
        assert_eq!(n.validate(Value::from("1")), Ok(Value::Int(1)));
        assert_eq!(n.validate(Value::from("x")).unwrap_err().why(), Why::Reclass);
        assert_eq!(n.validate(Value::Int(4)), Err(Rejection::Outside(Value::Int(4))));
        assert_eq!(n.validate(Value::Int(2)), Err(Rejection::Outcast(Value::Int(2))));
    }

    #[test]
    fn test_track() {
        let fp = Footprint::new([base()]).unwrap();
        let desc = crate::desc! { "stuff" => "foo", "someint" => 2, "other" => 1 };
        assert_eq!(fp.track(&desc), vec!["stuff".to_string(), "someint".to_string()]);
    }
}
