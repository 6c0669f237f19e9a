//! Only-rules: acceptance checks run after a successful resolution.

use super::Footprint;
use crate::config::Defaults;
use crate::reporting::{OnlyWhy, ReportSink};
use crate::types::{AttrType, TypeArgs};
use crate::value::{Guess, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    After,
    Before,
    Equal,
}

fn split_rule(key: &str) -> (&str, Comparison) {
    if let Some(attr) = key.strip_prefix("after_") {
        (attr, Comparison::After)
    } else if let Some(attr) = key.strip_prefix("before_") {
        (attr, Comparison::Before)
    } else {
        (key, Comparison::Equal)
    }
}

fn satisfies(actual: &Value, check: &Value, comparison: Comparison) -> bool {
    if let Value::Pattern(_) = check {
        return check.admits(actual);
    }
    let check = if actual.kind() == check.kind() {
        check.clone()
    } else {
        match AttrType::of_value(actual).map(|t| t.coerce(check, &TypeArgs::new())) {
            Some(Ok(coerced)) => coerced,
            _ => return false,
        }
    };
    match comparison {
        Comparison::After => matches!(actual.partial_cmp(&check), Some(Ordering::Greater | Ordering::Equal)),
        Comparison::Before => matches!(actual.partial_cmp(&check), Some(Ordering::Less)),
        Comparison::Equal => *actual == check,
    }
}

impl Footprint {
    /// Check every only-rule against `resolved`, falling back on the
    /// defaults table for attributes the footprint does not declare.
    /// Rules are ANDed; each one passes when any of its values does.
    pub fn checkonly(&self, resolved: &Guess, defaults: &Defaults, report: &mut dyn ReportSink) -> bool {
        for (key, checks) in self.only() {
            let (attr, comparison) = split_rule(key);
            let actual = match resolved.get(attr) {
                Some(found) => found.as_ref().map(Value::upgrade),
                None => defaults.get(attr).cloned(),
            };
            let Some(actual) = actual else {
                report.only(key, OnlyWhy::NotFound, Some(attr.to_string()));
                return false;
            };
            if !checks.iter().any(|check| satisfies(&actual, check, comparison)) {
                report.only(key, OnlyWhy::NotMatch, Some(actual.to_string()));
                return false;
            }
        }
        true
    }
}
