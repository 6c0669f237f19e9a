//! Placeholder mini-language
//!
//! String attribute values may refer to other attributes:
//!
//! ```text
//! [key]            value of `key`
//! [key:attr]       member `attr` of that value (`[key::meth]` is the same)
//! [key:a:b]        chained members
//! [key#literal]    `literal` when `key` is known nowhere
//! [key%fmt]        formatted with `fmt` (see [`crate::format`])
//! ```
//!
//! Only the leftmost placeholder is handled per substitution step; the
//! resolver loops until none is left.

use crate::error::{Error, Result};
use crate::format;
use crate::value::{Member, Scope, Value};
use regex::Regex;
use std::sync::LazyLock;

/// One placeholder occurrence inside a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder<'a> {
    /// Byte span of the whole `[...]` in the scanned text.
    pub start: usize,
    pub end: usize,
    pub key: &'a str,
    pub chain: Vec<&'a str>,
    pub fallback: Option<&'a str>,
    pub format: Option<&'a str>,
}

/// What a placeholder turns into once its key is known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Replace(String),
    /// A chain member is missing: the whole attribute value goes away.
    Vanish,
    /// A callable member failed: leave the text alone for now.
    Skip,
}

/// `[key]`, `[key:chain]`, `[key#fallback]`, `[key%fmt]` and combinations.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)(?::+([:\w]+))?(?:#(\w+))?(?:%([^\]]+))?\]").unwrap());

/// Separator between chained members.
static CHAIN_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":+").unwrap());

impl<'a> Placeholder<'a> {
    /// Leftmost placeholder in `text`.
    pub fn find(text: &'a str) -> Option<Self> {
        let caps = PLACEHOLDER_RE.captures(text)?;
        let whole = caps.get(0)?;
        Some(Placeholder {
            start: whole.start(),
            end: whole.end(),
            key: caps.get(1)?.as_str(),
            // A chain made of colons only yields empty member names.
            chain: caps
                .get(2)
                .map(|m| CHAIN_SEP_RE.split(m.as_str()).collect())
                .unwrap_or_default(),
            fallback: caps.get(3).map(|m| m.as_str()),
            format: caps.get(4).map(|m| m.as_str()),
        })
    }

    /// Whether `text` holds at least one placeholder.
    pub fn contains(text: &str) -> bool {
        PLACEHOLDER_RE.is_match(text)
    }

    /// The placeholder as written.
    pub fn raw<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    /// `text` with this placeholder replaced by `replacement`.
    pub fn replace_in(&self, text: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..self.start]);
        out.push_str(replacement);
        out.push_str(&text[self.end..]);
        out
    }

    /// Walk the member chain from `base` and render the result.
    pub(crate) fn expand(&self, base: &Value, scope: &Scope<'_>) -> Result<Step> {
        let mut current = base.upgrade();
        if current.is_null() && !self.chain.is_empty() {
            return Ok(Step::Vanish);
        }
        for name in &self.chain {
            if name.is_empty() {
                return Ok(Step::Vanish);
            }
            current = match current.member(name, scope) {
                Member::Found(next) => next,
                Member::Missing => return Ok(Step::Vanish),
                Member::Failed(reason) => {
                    tracing::warn!(key = self.key, member = *name, %reason, "placeholder member failed, substitution skipped");
                    return Ok(Step::Skip);
                }
            };
            if current.is_null() {
                return Ok(Step::Vanish);
            }
        }
        let text = match self.format {
            Some(fmt) => format::apply(&current, fmt, scope).map_err(|e| Error::Format {
                placeholder: format!("[{}%{}]", self.key, fmt),
                reason: e.to_string(),
            })?,
            None => current.to_string(),
        };
        Ok(Step::Replace(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Extras, Guess};
    use rstest::rstest;

    #[rstest]
    #[case("misc_[stuff2]", "stuff2", vec![], None, None)]
    #[case("[somefoo:justtoto]", "somefoo", vec!["justtoto"], None, None)]
    #[case("[somefoo::justtoto:upper]", "somefoo", vec!["justtoto", "upper"], None, None)]
    #[case("x[nope#fine]y", "nope", vec![], Some("fine"), None)]
    #[case("[num%03d]", "num", vec![], None, Some("03d"))]
    #[case("[a:b#c%.upper:s]", "a", vec!["b"], Some("c"), Some(".upper:s"))]
    #[case("[a[b]", "b", vec![], None, None)]
    #[case("[b::]", "b", vec!["", ""], None, None)]
    #[case("[b:::upper]", "b", vec!["upper"], None, None)]
    fn test_find(
        #[case] text: &str,
        #[case] key: &str,
        #[case] chain: Vec<&str>,
        #[case] fallback: Option<&str>,
        #[case] format: Option<&str>,
    ) {
        let ph = Placeholder::find(text).unwrap();
        assert_eq!(ph.key, key);
        assert_eq!(ph.chain, chain);
        assert_eq!(ph.fallback, fallback);
        assert_eq!(ph.format, format);
    }

    #[rstest]
    #[case("plain")]
    #[case("[]")]
    #[case("[a")]
    #[case("[a:]")]
    #[case("[a#]")]
    #[case("[a%]")]
    #[case("[with space]")]
    fn test_no_placeholder(#[case] text: &str) {
        assert_eq!(Placeholder::find(text), None);
    }

    #[test]
    fn test_replace_first_only() {
        let text = "[a]_[a]";
        let ph = Placeholder::find(text).unwrap();
        assert_eq!(ph.raw(text), "[a]");
        assert_eq!(ph.replace_in(text, "x"), "x_[a]");
    }

    #[test]
    fn test_expand() {
        let guess = Guess::new();
        let extras = Extras::new();
        let scope = Scope::new(&guess, &extras);

        let ph = Placeholder::find("[name:upper]").unwrap();
        assert_eq!(
            ph.expand(&Value::from("toto"), &scope).unwrap(),
            Step::Replace("TOTO".into())
        );
        assert_eq!(ph.expand(&Value::Int(2), &scope).unwrap(), Step::Vanish);
        assert_eq!(ph.expand(&Value::Null, &scope).unwrap(), Step::Vanish);

        let ph = Placeholder::find("[name::]").unwrap();
        assert_eq!(ph.expand(&Value::from("toto"), &scope).unwrap(), Step::Vanish);

        let ph = Placeholder::find("[name]").unwrap();
        assert_eq!(ph.expand(&Value::Null, &scope).unwrap(), Step::Replace("None".into()));

        let ph = Placeholder::find("[num%03d]").unwrap();
        assert_eq!(ph.expand(&Value::Int(2), &scope).unwrap(), Step::Replace("002".into()));
        let err = ph.expand(&Value::from("foo"), &scope).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
