//! Attribute types
//!
//! An attribute's type both validates and coerces raw description values.
//! Builtin scalar types cover the usual cases; footprint classes are
//! referenced by name, external [`crate::value::Resolvable`] values by their
//! `type_name`, and anything else goes through a [`CustomType`].

use crate::value::{Pattern, Value};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Extra keyword arguments given to a coercion (`base`, `format`, ...).
pub type TypeArgs = IndexMap<String, Value>;

pub type CheckFn = dyn Fn(&Value) -> bool;
pub type BuildFn = dyn Fn(&Value, &TypeArgs) -> Result<Value, String>;

/// User-provided type: an instance check and a constructor.
#[derive(Clone)]
pub struct CustomType {
    name: String,
    check: Rc<CheckFn>,
    build: Rc<BuildFn>,
}

impl CustomType {
    pub fn new(
        name: &str,
        check: impl Fn(&Value) -> bool + 'static,
        build: impl Fn(&Value, &TypeArgs) -> Result<Value, String> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            check: Rc::new(check),
            build: Rc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomType({})", self.name)
    }
}

/// Declared type of a footprint attribute.
#[derive(Debug, Clone, Default)]
pub enum AttrType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Date,
    Pattern,
    List,
    Any,
    /// A registered footprint class, by name or full name.
    Class(String),
    /// An external resolvable value, by type name.
    Opaque(String),
    Custom(CustomType),
}

impl AttrType {
    /// Map a type name found in a definition file. Unknown names are taken
    /// as footprint class names.
    pub fn from_name(name: &str) -> AttrType {
        match name.trim() {
            "str" | "string" => AttrType::Str,
            "int" | "integer" => AttrType::Int,
            "float" => AttrType::Float,
            "bool" | "boolean" => AttrType::Bool,
            "date" => AttrType::Date,
            "pattern" | "regex" => AttrType::Pattern,
            "list" => AttrType::List,
            "any" => AttrType::Any,
            other => AttrType::Class(other.to_string()),
        }
    }

    /// Builtin type describing an existing value, if any.
    pub fn of_value(value: &Value) -> Option<AttrType> {
        match value {
            Value::Str(_) => Some(AttrType::Str),
            Value::Int(_) => Some(AttrType::Int),
            Value::Float(_) => Some(AttrType::Float),
            Value::Bool(_) => Some(AttrType::Bool),
            Value::Date(_) => Some(AttrType::Date),
            Value::Pattern(_) => Some(AttrType::Pattern),
            Value::List(_) => Some(AttrType::List),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            AttrType::Str => "str".into(),
            AttrType::Int => "int".into(),
            AttrType::Float => "float".into(),
            AttrType::Bool => "bool".into(),
            AttrType::Date => "date".into(),
            AttrType::Pattern => "pattern".into(),
            AttrType::List => "list".into(),
            AttrType::Any => "any".into(),
            AttrType::Class(name) | AttrType::Opaque(name) => name.clone(),
            AttrType::Custom(custom) => custom.name.clone(),
        }
    }

    /// Same declared type (custom types compare by name).
    pub fn same_as(&self, other: &AttrType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other) && self.name() == other.name()
    }

    pub fn is_instance(&self, value: &Value) -> bool {
        match (self, value) {
            (AttrType::Any, _) => true,
            (AttrType::Str, Value::Str(_))
            | (AttrType::Int, Value::Int(_))
            | (AttrType::Float, Value::Float(_))
            | (AttrType::Bool, Value::Bool(_))
            | (AttrType::Date, Value::Date(_))
            | (AttrType::Pattern, Value::Pattern(_))
            | (AttrType::List, Value::List(_)) => true,
            (AttrType::Class(name), v) => v
                .as_instance()
                .is_some_and(|inst| inst.class().is_subclass_of(name)),
            (AttrType::Opaque(name), v) => v.as_opaque().is_some_and(|o| o.type_name() == name),
            (AttrType::Custom(custom), v) => (custom.check)(v),
            _ => false,
        }
    }

    /// Check used by `isclass` attributes: the value must be a class
    /// deriving from the declared one.
    pub fn accepts_subclass(&self, value: &Value) -> bool {
        match (self, value) {
            (AttrType::Any, Value::Class(_)) => true,
            (AttrType::Class(name), Value::Class(cls)) => cls.is_subclass_of(name),
            _ => false,
        }
    }

    /// Build a value of this type out of `value`.
    pub fn coerce(&self, value: &Value, args: &TypeArgs) -> Result<Value, String> {
        if self.is_instance(value) && args.is_empty() {
            return Ok(value.clone());
        }
        let fail = || format!("cannot build {} from {} `{}`", self.name(), value.kind(), value);
        match self {
            AttrType::Any => Ok(value.clone()),
            AttrType::Str => match value {
                Value::Str(_) => Ok(value.clone()),
                Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Date(_) | Value::Pattern(_) | Value::List(_) => {
                    Ok(Value::Str(value.to_string()))
                }
                _ => Err(fail()),
            },
            AttrType::Int => match value {
                Value::Int(_) => Ok(value.clone()),
                Value::Str(s) => {
                    let base = match args.get("base") {
                        Some(Value::Int(b)) if (2..=36).contains(b) => *b as u32,
                        Some(other) => return Err(format!("invalid base `{other}`")),
                        None => 10,
                    };
                    i64::from_str_radix(s.trim(), base).map(Value::Int).map_err(|_| fail())
                }
                Value::Float(x) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                _ => Err(fail()),
            },
            AttrType::Float => match value {
                Value::Float(_) => Ok(value.clone()),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
                _ => Err(fail()),
            },
            AttrType::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Int(i) => Ok(Value::Bool(*i != 0)),
                Value::Str(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                    "false" | "no" | "off" | "0" | "" => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            AttrType::Date => match value {
                Value::Date(_) => Ok(value.clone()),
                Value::Str(s) => {
                    let s = s.trim();
                    let parsed = match args.get("format") {
                        Some(Value::Str(format)) => NaiveDate::parse_from_str(s, format).ok(),
                        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| compact_date(s)),
                    };
                    parsed.map(Value::Date).ok_or_else(fail)
                }
                Value::Int(i) => compact_date(&i.to_string()).map(Value::Date).ok_or_else(fail),
                _ => Err(fail()),
            },
            AttrType::Pattern => match value {
                Value::Pattern(_) => Ok(value.clone()),
                Value::Str(s) => Pattern::new(s).map(Value::Pattern).map_err(|e| e.to_string()),
                _ => Err(fail()),
            },
            AttrType::List => match value {
                Value::List(_) => Ok(value.clone()),
                Value::Null | Value::Unknown => Err(fail()),
                other => Ok(Value::List(vec![other.clone()])),
            },
            AttrType::Class(_) | AttrType::Opaque(_) => {
                if self.is_instance(value) {
                    Ok(value.clone())
                } else {
                    Err(fail())
                }
            }
            AttrType::Custom(custom) => (custom.build)(value, args),
        }
    }
}

/// `YYYYMMDD`
fn compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[..4].parse().ok()?;
    let month = s[4..6].parse().ok()?;
    let day = s[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
