//! Definition files
//!
//! Footprint classes may be declared in YAML or JSON instead of code.
//!
//! ```yaml
//! - name: Foo
//!   module: demo
//!   collectors: [garbage]
//!   footprint:
//!     info: A demo class
//!     attr:
//!       kind:
//!         values: [hip, hop]
//!         alias: [stuff]
//!         remap: { foo: hop }
//!       someint:
//!         type: int
//!         values: [1, 2, 3]
//!       rdate:
//!         type: date
//!         optional: true
//!         default: { date: "2013-11-02" }
//!     only:
//!       after_rdate: { date: "2013-11-01" }
//!     priority:
//!       level: toolbox
//! ```
//!
//! Plain scalars and lists map to the matching [`Value`]; regexes are
//! written `{pattern: "..."}` and dates `{date: "YYYY-MM-DD"}`.

use crate::access::Access;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::footprint::{AttributeFragment, FootprintFragment};
use crate::types::{AttrType, TypeArgs};
use crate::value::{Pattern, Value};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remap entry turning every admissible value into the first one.
pub const AUTOREMAP: &str = "autoremap";

/// A literal value in a definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ValueDef {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ValueDef>),
    /// Regular expression
    Pattern { pattern: String },
    /// Calendar date, `YYYY-MM-DD` or `YYYYMMDD`
    Date { date: String },
}

impl ValueDef {
    pub fn to_value(&self) -> Result<Value> {
        let value = match self {
            ValueDef::Null => Value::Null,
            ValueDef::Bool(b) => Value::Bool(*b),
            ValueDef::Int(i) => Value::Int(*i),
            ValueDef::Float(f) => Value::Float(*f),
            ValueDef::Str(s) => Value::Str(s.clone()),
            ValueDef::List(items) => Value::List(items.iter().map(ValueDef::to_value).collect::<Result<_>>()?),
            ValueDef::Pattern { pattern } => Value::Pattern(
                Pattern::new(pattern).map_err(|e| Error::InvalidDefinition(format!("Bad pattern `{pattern}`: {e}")))?,
            ),
            ValueDef::Date { date } => AttrType::Date
                .coerce(&Value::Str(date.clone()), &TypeArgs::new())
                .map_err(Error::InvalidDefinition)?,
        };
        Ok(value)
    }

    /// File form of `value`; `None` for objects, classes and unknowns.
    pub fn from_value(value: &Value) -> Option<ValueDef> {
        let def = match value {
            Value::Null => ValueDef::Null,
            Value::Bool(b) => ValueDef::Bool(*b),
            Value::Int(i) => ValueDef::Int(*i),
            Value::Float(f) => ValueDef::Float(*f),
            Value::Str(s) => ValueDef::Str(s.clone()),
            Value::Date(d) => ValueDef::Date {
                date: d.format("%Y-%m-%d").to_string(),
            },
            Value::Pattern(p) => ValueDef::Pattern {
                pattern: p.source().to_string(),
            },
            Value::List(items) => ValueDef::List(items.iter().map(ValueDef::from_value).collect::<Option<_>>()?),
            _ => return None,
        };
        Some(def)
    }
}

fn values_of(defs: &[ValueDef]) -> Result<Vec<Value>> {
    defs.iter().map(ValueDef::to_value).collect()
}

/// One footprint attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeDef {
    /// Type name: str, int, float, bool, date, pattern, list, any, a
    /// registered custom type or a footprint class name
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Extra arguments of the type conversion
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, ValueDef>,

    /// Values are classes deriving from `type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isclass: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ValueDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Vec<String>>,

    /// Input value to substituted value; `autoremap: first` remaps every
    /// admissible value to the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remap: Option<BTreeMap<String, ValueDef>>,

    /// Admissible values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ValueDef>>,

    /// Rejected values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcast: Option<Vec<ValueDef>>,

    /// Access mode: rxx, rwx or rwd, optionally with a `-weak` suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_visibility: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_zorder: Option<i32>,
}

impl AttributeDef {
    pub fn to_fragment(&self, ctx: &Context) -> Result<AttributeFragment> {
        let mut fragment = AttributeFragment::new();
        let typ = self.typ.as_deref().map(|name| ctx.attr_type(name));
        if let Some(typ) = &typ {
            fragment = fragment.typ(typ.clone());
        }
        for (key, value) in &self.args {
            fragment = fragment.arg(key, value.to_value()?);
        }
        if let Some(isclass) = self.isclass {
            fragment = fragment.isclass(isclass);
        }
        if let Some(default) = &self.default {
            fragment = fragment.default(default.to_value()?);
        }
        if let Some(optional) = self.optional {
            fragment = fragment.optional(optional);
        }
        if let Some(alias) = &self.alias {
            fragment = fragment.alias(alias);
        }
        if let Some(remap) = &self.remap {
            let args: TypeArgs = fragment.args.clone().unwrap_or_default();
            for (key, target) in remap {
                if key == AUTOREMAP && *target == ValueDef::Str("first".into()) {
                    fragment = fragment.autoremap();
                    continue;
                }
                let target = target.to_value()?;
                // Keys are strings in files; also match them once converted.
                if let Some(Ok(typed)) = typ.as_ref().map(|t| t.coerce(&Value::Str(key.clone()), &args)) {
                    if typed != Value::Str(key.clone()) {
                        fragment = fragment.remap(typed, target.clone());
                    }
                }
                fragment = fragment.remap(key.as_str(), target);
            }
        }
        if let Some(values) = &self.values {
            fragment = fragment.values(values_of(values)?);
        }
        if let Some(outcast) = &self.outcast {
            fragment = fragment.outcast(values_of(outcast)?);
        }
        if let Some(access) = &self.access {
            fragment = fragment.access(access.parse::<Access>()?);
        }
        if let Some(info) = &self.info {
            fragment = fragment.info(info);
        }
        if let Some(level) = &self.doc_visibility {
            if !ctx.visibility().contains(level) {
                return Err(Error::UnknownLevel(level.to_uppercase()));
            }
            fragment = fragment.doc_visibility(level);
        }
        if let Some(zorder) = self.doc_zorder {
            fragment = fragment.doc_zorder(zorder);
        }
        Ok(fragment)
    }
}

/// Only-rule comparison values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OnlyDef {
    Many(Vec<ValueDef>),
    One(ValueDef),
}

impl OnlyDef {
    fn to_values(&self) -> Result<Vec<Value>> {
        match self {
            OnlyDef::Many(items) => values_of(items),
            OnlyDef::One(item) => Ok(vec![item.to_value()?]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityDef {
    pub level: String,
}

/// A footprint declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FootprintDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,

    /// Attributes by name
    #[serde(default)]
    pub attr: IndexMap<String, AttributeDef>,

    /// Post-resolution rules; keys may carry an `after_` or `before_` prefix
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub only: IndexMap<String, OnlyDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<Vec<String>>,

    /// Attributes whose failure aborts a resolution at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fastkeys: Option<Vec<String>>,
}

impl FootprintDef {
    pub fn to_fragment(&self, ctx: &Context) -> Result<FootprintFragment> {
        let mut fragment = FootprintFragment::new();
        if let Some(info) = &self.info {
            fragment = fragment.info(info);
        }
        for (name, attr) in &self.attr {
            fragment = fragment.attr(name, attr.to_fragment(ctx)?);
        }
        for (key, rule) in &self.only {
            fragment = fragment.only(key, rule.to_values()?);
        }
        if let Some(priority) = &self.priority {
            if !ctx.priorities().contains(&priority.level) {
                return Err(Error::UnknownLevel(priority.level.to_uppercase()));
            }
            fragment = fragment.priority(&priority.level);
        }
        if let Some(bind) = &self.bind {
            fragment = fragment.bind(bind);
        }
        if let Some(fastkeys) = &self.fastkeys {
            fragment = fragment.fastkeys(fastkeys);
        }
        Ok(fragment)
    }
}

/// A footprint class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Footprint class", description = "Footprint class definition")]
pub struct ClassDef {
    pub name: String,

    /// Module path, `main` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Base classes, by name or full name, defined beforehand
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reusable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collectors: Option<Vec<String>>,

    #[serde(default)]
    pub footprint: FootprintDef,
}

/// Content of a definition file: one class or a list of classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DefinitionFile {
    Many(Vec<ClassDef>),
    One(ClassDef),
}

impl DefinitionFile {
    pub fn into_classes(self) -> Vec<ClassDef> {
        match self {
            DefinitionFile::Many(classes) => classes,
            DefinitionFile::One(class) => vec![class],
        }
    }
}

/// JSON schema of definition files.
pub fn json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(DefinitionFile)).unwrap_or(serde_json::Value::Null)
}
