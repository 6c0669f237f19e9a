//! Value Formatting Module
//!
//! Renders the `%fmt` part of a placeholder. Two forms are accepted:
//! - a plain format spec (`[num%03d]`, `[name%>8]`, `[rdate%Y%m%d]`)
//! - a field expression walking members first (`[name%.upper:s]`, `[x%!r]`)
//!
//! Format specs follow `[[fill]align][sign][#][0][width][,|_][.precision][type]`.
//! Dates take a `strftime` pattern instead, introduced by the placeholder's `%`.

mod spec;

pub use spec::FormatSpec;

use crate::value::{Member, Scope, Value};
use std::fmt::Write;

/// Format `value` according to the placeholder format `fmt`.
pub fn apply(value: &Value, fmt: &str, scope: &Scope<'_>) -> Result<String, FormatError> {
    let Some(split) = fmt.find([':', '!']) else {
        return render(value, fmt);
    };

    let (field, mut rest) = fmt.split_at(split);
    let mut current = value.clone();
    if !field.is_empty() {
        let Some(path) = field.strip_prefix('.') else {
            return Err(FormatError::BadField(field.to_string()));
        };
        for name in path.split('.') {
            current = match current.member(name, scope) {
                Member::Found(next) => next,
                Member::Missing => return Err(FormatError::MissingMember(name.to_string())),
                Member::Failed(reason) => return Err(FormatError::MemberFailed { name: name.to_string(), reason }),
            };
        }
    }

    if let Some(conversion) = rest.strip_prefix('!') {
        let mut chars = conversion.chars();
        let text = match chars.next() {
            Some('s') => current.to_string(),
            Some('r') | Some('a') => repr(&current),
            other => return Err(FormatError::BadConversion(other.map(String::from).unwrap_or_default())),
        };
        current = Value::Str(text);
        rest = chars.as_str();
    }

    let spec = match rest.strip_prefix(':') {
        Some(spec) => spec,
        None if rest.is_empty() => "",
        None => return Err(FormatError::BadField(rest.to_string())),
    };
    render(&current, spec)
}

/// Format a single value with a format spec.
pub fn render(value: &Value, spec: &str) -> Result<String, FormatError> {
    match value {
        Value::Date(date) => {
            if spec.is_empty() {
                return Ok(value.to_string());
            }
            let pattern = format!("%{spec}");
            let mut out = String::new();
            write!(out, "{}", date.format(&pattern)).map_err(|_| FormatError::BadSpec {
                spec: spec.to_string(),
                message: "invalid date pattern".to_string(),
            })?;
            Ok(out)
        }
        Value::Int(i) => FormatSpec::parse(spec)?.format_int(*i),
        Value::Float(x) => FormatSpec::parse(spec)?.format_float(*x),
        Value::Bool(b) => {
            let parsed = FormatSpec::parse(spec)?;
            if parsed.is_numeric() {
                parsed.format_int(i64::from(*b))
            } else {
                parsed.format_str(&value.to_string())
            }
        }
        other => FormatSpec::parse(spec)?.format_str(&other.to_string()),
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// Formatting errors
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The format spec does not parse
    BadSpec { spec: String, message: String },
    /// The presentation type does not apply to this kind of value
    Unsupported { code: char, kind: &'static str },
    /// Option not allowed for this kind of value (sign on a string, ...)
    NotAllowed { option: &'static str, kind: &'static str },
    BadField(String),
    BadConversion(String),
    MissingMember(String),
    MemberFailed { name: String, reason: String },
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::BadSpec { spec, message } => write!(f, "invalid format spec `{}`: {}", spec, message),
            FormatError::Unsupported { code, kind } => {
                write!(f, "unknown format code '{}' for value of type {}", code, kind)
            }
            FormatError::NotAllowed { option, kind } => write!(f, "{} not allowed with {} values", option, kind),
            FormatError::BadField(field) => write!(f, "invalid field expression `{}`", field),
            FormatError::BadConversion(conv) => write!(f, "unknown conversion `!{}`", conv),
            FormatError::MissingMember(name) => write!(f, "no member `{}`", name),
            FormatError::MemberFailed { name, reason } => write!(f, "member `{}` failed: {}", name, reason),
        }
    }
}

impl std::error::Error for FormatError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Extras, Guess};
    use chrono::NaiveDate;
    use rstest::rstest;

    fn fmt(value: Value, spec: &str) -> Result<String, FormatError> {
        let guess = Guess::new();
        let extras = Extras::new();
        apply(&value, spec, &Scope::new(&guess, &extras))
    }

    #[rstest]
    #[case(Value::Int(2), "03d", "002")]
    #[case(Value::Int(-2), "04d", "-002")]
    #[case(Value::Int(255), "#x", "0xff")]
    #[case(Value::Int(1234567), ",", "1,234,567")]
    #[case(Value::Int(7), "+d", "+7")]
    #[case(Value::Int(7), "*^5", "**7**")]
    #[case(Value::Float(3.14159), ".2f", "3.14")]
    #[case(Value::Float(1500.0), ".3e", "1.500e+03")]
    #[case(Value::Float(0.5), ".0%", "50%")]
    #[case(Value::Float(0.0001), "g", "0.0001")]
    #[case(Value::Float(1234567.0), "g", "1.23457e+06")]
    #[case(Value::from("toto"), ">6", "  toto")]
    #[case(Value::from("toto"), ".2", "to")]
    #[case(Value::from("toto"), ".upper:s", "TOTO")]
    #[case(Value::from("toto"), "!r", "'toto'")]
    #[case(Value::Bool(true), "d", "1")]
    #[case(Value::Bool(true), "", "true")]
    fn test_apply(#[case] value: Value, #[case] spec: &str, #[case] expected: &str) {
        assert_eq!(fmt(value, spec).unwrap(), expected);
    }

    #[test]
    fn test_date_patterns() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2013, 11, 2).unwrap());
        assert_eq!(fmt(date.clone(), "Y%m%d").unwrap(), "20131102");
        assert_eq!(fmt(date.clone(), "").unwrap(), "2013-11-02");
        assert_eq!(fmt(date, ".year:05d").unwrap(), "02013");
    }

    #[rstest]
    #[case(Value::from("foo"), "03d")]
    #[case(Value::Float(1.5), "d")]
    #[case(Value::Int(3), "s")]
    #[case(Value::Int(3), ".2d")]
    #[case(Value::from("foo"), "+s")]
    #[case(Value::from("foo"), ".nope:s")]
    #[case(Value::from("foo"), "!z")]
    #[case(Value::Int(3), "03dd")]
    fn test_apply_errors(#[case] value: Value, #[case] spec: &str) {
        assert!(fmt(value, spec).is_err());
    }
}
