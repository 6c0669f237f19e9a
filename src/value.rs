//! Dynamic values
//!
//! Descriptions handed to a collector are loose bags of hints: strings,
//! numbers, dates, other footprint instances, or anything the caller wraps
//! as [`Resolvable`]. [`Value`] is the tagged union carrying them through
//! resolution, validation and placeholder substitution.

use crate::class::FootprintClass;
use crate::instance::Instance;
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

/// Raw input mapping given to a resolution or a collector search.
pub type Description = IndexMap<String, Value>;

/// Attribute table while resolving: `None` marks a failed attribute.
pub type Guess = IndexMap<String, Option<Value>>;

/// Auxiliary value pool consulted by placeholder substitution.
pub type Extras = IndexMap<String, Value>;

/// Text rendering of [`Value::Unknown`].
pub const UNKNOWN_TEXT: &str = "__unknown__";

/// A regular expression matched at the start of the candidate text.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

/// What a callable member sees while a placeholder is substituted.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub guess: &'a Guess,
    pub extras: &'a Extras,
}

impl<'a> Scope<'a> {
    pub fn new(guess: &'a Guess, extras: &'a Extras) -> Self {
        Self { guess, extras }
    }
}

/// Outcome of a member lookup in a `[key:member]` chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Found(Value),
    Missing,
    /// The member exists but computing it failed.
    Failed(String),
}

/// Capability interface for external values taking part in substitutions.
pub trait Resolvable {
    fn type_name(&self) -> &str;

    fn member(&self, _name: &str, _scope: &Scope<'_>) -> Member {
        Member::Missing
    }

    fn render(&self) -> String {
        format!("<{}>", self.type_name())
    }

    fn export(&self) -> serde_json::Value {
        serde_json::Value::String(self.render())
    }
}

/// A description or attribute value.
#[derive(Clone)]
pub enum Value {
    Null,
    /// Optional attribute left without any value.
    Unknown,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Pattern(Pattern),
    List(Vec<Value>),
    Class(Rc<FootprintClass>),
    Object(Rc<Instance>),
    WeakObject(Weak<Instance>),
    Opaque(Rc<dyn Resolvable>),
    WeakOpaque(Weak<dyn Resolvable>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::WeakObject(w) => w.strong_count() == 0,
            Value::WeakOpaque(w) => w.strong_count() == 0,
            _ => false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Short kind name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unknown => "unknown",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Date(_) => "date",
            Value::Pattern(_) => "pattern",
            Value::List(_) => "list",
            Value::Class(_) => "class",
            Value::Object(_) | Value::WeakObject(_) => "object",
            Value::Opaque(_) | Value::WeakOpaque(_) => "opaque",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The instance behind a strong or live weak object handle.
    pub fn as_instance(&self) -> Option<Rc<Instance>> {
        match self {
            Value::Object(inst) => Some(Rc::clone(inst)),
            Value::WeakObject(w) => w.upgrade(),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<Rc<dyn Resolvable>> {
        match self {
            Value::Opaque(o) => Some(Rc::clone(o)),
            Value::WeakOpaque(w) => w.upgrade(),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Rc<FootprintClass>> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Replace weak handles by strong ones (`Null` once the target is gone).
    pub fn upgrade(&self) -> Value {
        match self {
            Value::WeakObject(w) => w.upgrade().map_or(Value::Null, Value::Object),
            Value::WeakOpaque(w) => w.upgrade().map_or(Value::Null, Value::Opaque),
            other => other.clone(),
        }
    }

    /// Non-owning form of object handles; other values are unchanged.
    pub fn downgrade(&self) -> Value {
        match self {
            Value::Object(inst) => Value::WeakObject(Rc::downgrade(inst)),
            Value::Opaque(o) => Value::WeakOpaque(Rc::downgrade(o)),
            other => other.clone(),
        }
    }

    /// Whether the value may be used as a remap key.
    pub fn is_hashable(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    /// Text used for pattern matching.
    pub fn text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Membership test used by `values`, `outcast` and only-rules:
    /// a pattern matches the candidate's text, anything else compares equal.
    pub fn admits(&self, candidate: &Value) -> bool {
        match (self, candidate) {
            (Value::Pattern(p), Value::Pattern(q)) => p == q,
            (Value::Pattern(_), Value::Null | Value::Unknown) => false,
            (Value::Pattern(p), other) => p.is_match(&other.text()),
            (member, other) => member == other,
        }
    }

    /// Chained member lookup used by `[key:member]` placeholders.
    pub fn member(&self, name: &str, scope: &Scope<'_>) -> Member {
        match self {
            Value::Str(s) => match name {
                "upper" => Member::Found(Value::Str(s.to_uppercase())),
                "lower" => Member::Found(Value::Str(s.to_lowercase())),
                "strip" => Member::Found(Value::Str(s.trim().to_string())),
                "capitalize" => {
                    let mut chars = s.chars();
                    let text = match chars.next() {
                        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                        None => String::new(),
                    };
                    Member::Found(Value::Str(text))
                }
                "len" => Member::Found(Value::Int(s.chars().count() as i64)),
                _ => Member::Missing,
            },
            Value::Date(d) => match name {
                "year" => Member::Found(Value::Int(i64::from(d.year()))),
                "month" => Member::Found(Value::Int(i64::from(d.month()))),
                "day" => Member::Found(Value::Int(i64::from(d.day()))),
                "isoformat" => Member::Found(Value::Str(d.format("%Y-%m-%d").to_string())),
                "ymd" => Member::Found(Value::Str(d.format("%Y%m%d").to_string())),
                _ => Member::Missing,
            },
            Value::List(items) => match name {
                "first" => items.first().cloned().map_or(Member::Missing, Member::Found),
                "last" => items.last().cloned().map_or(Member::Missing, Member::Found),
                "len" => Member::Found(Value::Int(items.len() as i64)),
                _ => Member::Missing,
            },
            Value::Class(cls) => match name {
                "name" => Member::Found(Value::Str(cls.name().to_string())),
                "fullname" => Member::Found(Value::Str(cls.fullname())),
                _ => Member::Missing,
            },
            Value::Object(inst) => inst.member(name, scope),
            Value::WeakObject(w) => match w.upgrade() {
                Some(inst) => inst.member(name, scope),
                None => Member::Missing,
            },
            Value::Opaque(o) => o.member(name, scope),
            Value::WeakOpaque(w) => match w.upgrade() {
                Some(o) => o.member(name, scope),
                None => Member::Missing,
            },
            _ => Member::Missing,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null | Value::Unknown => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Opaque(o) => o.export(),
            Value::WeakOpaque(w) => w.upgrade().map_or(Json::Null, |o| o.export()),
            Value::WeakObject(w) if w.strong_count() == 0 => Json::Null,
            other => Json::String(other.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) | (Unknown, Unknown) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Str(a), Str(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Pattern(a), Pattern(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Class(a), Class(b)) => a.id() == b.id(),
            (Object(_) | WeakObject(_), Object(_) | WeakObject(_)) => {
                match (self.as_instance(), other.as_instance()) {
                    (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
                    _ => false,
                }
            }
            (Opaque(_) | WeakOpaque(_), Opaque(_) | WeakOpaque(_)) => {
                match (self.as_opaque(), other.as_opaque()) {
                    (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(&a), Rc::as_ptr(&b)),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Str(a), Str(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) => a.partial_cmp(b),
            (List(a), List(b)) => a.partial_cmp(b),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Unknown => write!(f, "{UNKNOWN_TEXT}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Pattern(p) => write!(f, "{}", p.source()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Class(cls) => write!(f, "{}", cls.fullname()),
            Value::Object(inst) => write!(f, "{inst}"),
            Value::WeakObject(w) => match w.upgrade() {
                Some(inst) => write!(f, "{inst}"),
                None => write!(f, "None"),
            },
            Value::Opaque(o) => write!(f, "{}", o.render()),
            Value::WeakOpaque(w) => match w.upgrade() {
                Some(o) => write!(f, "{}", o.render()),
                None => write!(f, "None"),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Unknown => write!(f, "Unknown"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Date(d) => write!(f, "Date({d})"),
            Value::Pattern(p) => write!(f, "{p:?}"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Class(cls) => write!(f, "Class({})", cls.fullname()),
            Value::Object(_) | Value::WeakObject(_) => write!(f, "Object({self})"),
            Value::Opaque(_) | Value::WeakOpaque(_) => write!(f, "Opaque({self})"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(p)
    }
}

impl From<Rc<Instance>> for Value {
    fn from(inst: Rc<Instance>) -> Self {
        Value::Object(inst)
    }
}

impl From<Rc<FootprintClass>> for Value {
    fn from(cls: Rc<FootprintClass>) -> Self {
        Value::Class(cls)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(item: Option<T>) -> Self {
        item.map_or(Value::Null, Into::into)
    }
}

/// Build a [`Description`] from key/value pairs.
///
/// ```
/// use footprints::{desc, Value};
/// let d = desc! { "kind" => "hip", "someint" => 7 };
/// assert_eq!(d.get("someint"), Some(&Value::Int(7)));
/// ```
#[macro_export]
macro_rules! desc {
    () => { $crate::value::Description::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut d = $crate::value::Description::new();
        $( d.insert(::std::string::String::from($key), $crate::value::Value::from($value)); )+
        d
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Probe;

    impl Resolvable for Probe {
        fn type_name(&self) -> &str {
            "Probe"
        }

        fn member(&self, name: &str, scope: &Scope<'_>) -> Member {
            match name {
                "width" => Member::Found(Value::Int(scope.guess.len() as i64)),
                "broken" => Member::Failed("no width yet".into()),
                _ => Member::Missing,
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(Value::Int(2), Value::Float(2.0), true)]
    #[case(Value::Str("2".into()), Value::Int(2), false)]
    #[case(Value::Unknown, Value::Unknown, true)]
    #[case(Value::Null, Value::Unknown, false)]
    #[case(Value::from(vec![1, 2]), Value::from(vec![1, 2]), true)]
    fn test_equality(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
        assert_eq!(a == b, expected);
        assert_eq!(b == a, expected);
    }

    #[test]
    fn test_ordering() {
        assert!(Value::from(date(2013, 12, 3)) >= Value::from(date(2013, 11, 2)));
        assert!(Value::Int(3) < Value::Float(3.5));
        assert_eq!(Value::Str("a".into()).partial_cmp(&Value::Int(1)), None);
    }

    #[test]
    fn test_pattern_admits_from_start() {
        let p = Value::Pattern(Pattern::new("ar(pege|ome)").unwrap());
        assert!(p.admits(&Value::from("arpege")));
        assert!(p.admits(&Value::from("arome_france")));
        assert!(!p.admits(&Value::from("the_arpege")));
        assert!(!p.admits(&Value::Null));
        assert!(Value::Int(3).admits(&Value::Int(3)));
    }

    #[rstest]
    #[case(Value::Float(2.0), "2.0")]
    #[case(Value::Float(2.5), "2.5")]
    #[case(Value::Null, "None")]
    #[case(Value::Unknown, "__unknown__")]
    #[case(Value::Bool(true), "true")]
    #[case(Value::from(vec!["a", "b"]), "[a, b]")]
    fn test_display(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_builtin_members() {
        let guess = Guess::new();
        let extras = Extras::new();
        let scope = Scope::new(&guess, &extras);
        assert_eq!(
            Value::from("toto").member("upper", &scope),
            Member::Found(Value::from("TOTO"))
        );
        assert_eq!(
            Value::from(date(2013, 11, 2)).member("ymd", &scope),
            Member::Found(Value::from("20131102"))
        );
        assert_eq!(Value::Int(1).member("upper", &scope), Member::Missing);
    }

    #[test]
    fn test_opaque_members_and_weak_handles() {
        let probe: Rc<dyn Resolvable> = Rc::new(Probe);
        let mut guess = Guess::new();
        guess.insert("a".into(), None);
        let extras = Extras::new();
        let scope = Scope::new(&guess, &extras);

        let strong = Value::Opaque(Rc::clone(&probe));
        assert_eq!(strong.member("width", &scope), Member::Found(Value::Int(1)));
        assert!(matches!(strong.member("broken", &scope), Member::Failed(_)));

        let weak = strong.downgrade();
        assert_eq!(weak, strong);
        assert!(!weak.is_null());
        drop(strong);
        drop(probe);
        assert!(weak.is_null());
        assert!(matches!(weak.upgrade(), Value::Null));
    }

    #[test]
    fn test_desc_macro() {
        let d = desc! { "kind" => "hip", "flag" => true };
        assert_eq!(d.len(), 2);
        assert_eq!(d["flag"], Value::Bool(true));
    }
}
