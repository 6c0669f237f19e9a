//! Footprint resolution
//!
//! Turns a loose [`Description`] into a complete attribute table:
//!
//! 1. first guess from the description, aliases, the defaults table and
//!    declared defaults;
//! 2. extras gathered from the setup callback, sibling instances and
//!    unconsumed keys;
//! 3. placeholder substitution, attribute by attribute, requeueing values
//!    whose dependencies are still pending;
//! 4. remapping, type coercion, `values` and `outcast` checks;
//! 5. a final pass turning leftovers into diagnostics or fatal errors.

use super::{AttributeSpec, Footprint};
use crate::config::Defaults;
use crate::error::{Error, Result};
use crate::placeholder::{Placeholder, Step};
use crate::reporting::{ReportSink, Why};
use crate::value::{Description, Extras, Guess, Scope, Value};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Ceiling on substitution passes of one attribute, and on remap chains.
pub const MAX_PASSES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Raise [`Error::Fatal`] on the first attribute left without a value.
    pub fatal: bool,
    /// Stop at the first failing attribute, fast key or not.
    pub fast: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fatal: true,
            fast: false,
        }
    }
}

impl ResolveOptions {
    /// Options used when screening collector candidates.
    pub fn screening(fast: bool) -> Self {
        Self { fatal: false, fast }
    }
}

/// Context-wide inputs of a resolution, computed once per search.
#[derive(Debug, Clone, Default)]
pub struct ResolveCache {
    pub defaults: Defaults,
    /// Extras seed, usually the output of the setup callback.
    pub extras: Extras,
    pub fastkeys: BTreeSet<String>,
    /// Fold unconsumed defaults into extras.
    pub extended: bool,
}

impl ResolveCache {
    pub fn new(defaults: Defaults) -> Self {
        Self {
            defaults,
            extras: Extras::new(),
            fastkeys: BTreeSet::new(),
            extended: true,
        }
    }

    pub fn with_fastkeys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fastkeys = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        self
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }
}

/// Outcome of [`Footprint::resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Every declared attribute; `None` for the ones that failed.
    pub attributes: Guess,
    /// Attributes fed by the description or the defaults table.
    pub inputs: BTreeSet<String>,
    /// Attributes that went through substitution and validation.
    pub seen: BTreeSet<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.attributes.values().all(Option::is_some)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).and_then(Option::as_ref)
    }

    /// Successfully resolved attributes, without the failed ones.
    pub fn values(&self) -> Description {
        self.attributes
            .iter()
            .filter_map(|(k, v)| v.clone().map(|v| (k.clone(), v)))
            .collect()
    }
}

enum Substitution {
    Settled,
    Requeue,
}

/// Sink wrapper remembering which attributes already got a diagnostic.
struct Diagnostics<'r> {
    sink: &'r mut dyn ReportSink,
    reported: BTreeSet<String>,
}

impl Diagnostics<'_> {
    fn attribute(&mut self, name: &str, why: Why, args: Option<String>) {
        self.reported.insert(name.to_string());
        self.sink.attribute(name, why, args);
    }

    fn once(&mut self, name: &str, why: Why, args: Option<String>) {
        if !self.reported.contains(name) {
            self.attribute(name, why, args);
        }
    }
}

impl Footprint {
    /// Processing order: fast keys, then mandatory attributes, then the
    /// optional ones, declaration order within each group.
    fn resolve_order(&self, cache: &ResolveCache) -> Vec<&AttributeSpec> {
        let mut order: Vec<&AttributeSpec> = self.attributes().collect();
        order.sort_by_key(|a| (!self.is_fastkey(cache, &a.name), a.optional));
        order
    }

    fn is_fastkey(&self, cache: &ResolveCache, name: &str) -> bool {
        cache.fastkeys.contains(name) || self.fastkeys().contains(name)
    }

    fn first_guess(
        &self,
        order: &[&AttributeSpec],
        desc: &Description,
        cache: &ResolveCache,
    ) -> (Guess, BTreeSet<String>) {
        let mut guess = Guess::with_capacity(order.len());
        let mut inputs = BTreeSet::new();
        for attr in order {
            let supplied = |v: &&Value| !(attr.optional && v.is_null());
            let given = desc
                .get(&attr.name)
                .filter(supplied)
                .or_else(|| attr.alias.iter().find_map(|a| desc.get(a).filter(supplied)));
            let value = if let Some(v) = given {
                inputs.insert(attr.name.clone());
                Some(v.clone())
            } else if let Some(v) = cache.defaults.get(&attr.name) {
                inputs.insert(attr.name.clone());
                Some(v.clone())
            } else if attr.optional {
                Some(attr.default.as_ref().map_or(Value::Unknown, |d| d.value()))
            } else {
                None
            };
            guess.insert(attr.name.clone(), value.filter(|v| !v.is_null()));
        }
        (guess, inputs)
    }

    fn find_extras(&self, desc: &Description, guess: &Guess, cache: &ResolveCache) -> Extras {
        let mut extras = cache.extras.clone();
        for inst in desc.values().filter_map(Value::as_instance) {
            extras.extend(inst.shallow());
        }
        let mut fold = |key: &String, value: &Value| {
            if !extras.contains_key(key) && !guess.contains_key(key) {
                extras.insert(key.clone(), value.clone());
            }
        };
        for (k, v) in desc {
            fold(k, v);
        }
        if cache.extended {
            for (k, v) in cache.defaults.iter() {
                fold(k, v);
            }
        }
        extras
    }

    /// Substitute placeholders in the guess of `name`, leftmost first.
    fn substitute(&self, name: &str, guess: &mut Guess, extras: &Extras, pending: &BTreeSet<String>) -> Result<Substitution> {
        let Some(Some(Value::Str(original))) = guess.get(name) else {
            return Ok(Substitution::Settled);
        };
        let mut text = original.clone();
        let mut steps = 0;
        while let Some(ph) = Placeholder::find(&text) {
            steps += 1;
            if steps > MAX_PASSES {
                return Err(Error::MaxIter {
                    attr: name.to_string(),
                    passes: steps,
                });
            }
            let base = if let Some(current) = guess.get(ph.key) {
                if pending.contains(ph.key) {
                    break;
                }
                current.clone().unwrap_or(Value::Null)
            } else if let Some(extra) = extras.get(ph.key) {
                extra.clone()
            } else if let Some(fallback) = ph.fallback {
                text = ph.replace_in(&text, fallback);
                continue;
            } else {
                return Err(Error::UnreachableAttr {
                    attr: name.to_string(),
                    key: ph.key.to_string(),
                });
            };
            let step = ph.expand(&base, &Scope::new(guess, extras))?;
            match step {
                Step::Replace(replacement) => text = ph.replace_in(&text, &replacement),
                Step::Vanish => {
                    guess.insert(name.to_string(), None);
                    return Ok(Substitution::Settled);
                }
                Step::Skip => break,
            }
        }
        if Placeholder::contains(&text) {
            return Ok(Substitution::Requeue);
        }
        guess.insert(name.to_string(), Some(Value::Str(text)));
        Ok(Substitution::Settled)
    }

    /// Resolve `desc` against this footprint.
    ///
    /// Attribute-level failures are sent to `report` and leave the
    /// attribute at `None`; with `options.fatal` the first of them becomes
    /// [`Error::Fatal`]. Broken definitions (placeholder cycles, unknown
    /// placeholder keys, bad format specs) always raise.
    pub fn resolve(
        &self,
        desc: &Description,
        cache: &ResolveCache,
        options: ResolveOptions,
        report: &mut dyn ReportSink,
    ) -> Result<Resolution> {
        let order = self.resolve_order(cache);
        let (mut guess, mut inputs) = self.first_guess(&order, desc, cache);
        let extras = self.find_extras(desc, &guess, cache);
        let mut seen = BTreeSet::new();
        let mut diagnostics = Diagnostics {
            sink: report,
            reported: BTreeSet::new(),
        };

        if guess.values().all(Option::is_some) {
            let mut queue: VecDeque<&AttributeSpec> = order.iter().copied().collect();
            let mut pending: BTreeSet<String> = order.iter().map(|a| a.name.clone()).collect();
            let mut passes: HashMap<&str, usize> = HashMap::new();

            while let Some(attr) = queue.pop_front() {
                let name = attr.name.as_str();
                pending.remove(name);
                let count = passes.entry(name).or_insert(0);
                *count += 1;
                if *count > MAX_PASSES {
                    return Err(Error::MaxIter {
                        attr: name.to_string(),
                        passes: *count,
                    });
                }

                if let Substitution::Requeue = self.substitute(name, &mut guess, &extras, &pending)? {
                    pending.insert(name.to_string());
                    queue.push_back(attr);
                    continue;
                }
                let Some(value) = guess.get(name).cloned().flatten() else {
                    continue;
                };

                seen.insert(name.to_string());
                let value = attr.remap(value.upgrade())?;
                let checked = if value.is_unknown() {
                    Some(value)
                } else {
                    match attr.validate(value) {
                        Ok(valid) => Some(valid),
                        Err(rejection) => {
                            diagnostics.attribute(name, rejection.why(), rejection.args());
                            None
                        }
                    }
                };
                let failed = checked.is_none();
                guess.insert(name.to_string(), checked);
                if failed && (options.fast || self.is_fastkey(cache, name)) {
                    break;
                }
            }
        }

        for attr in self.attributes() {
            let name = attr.name.as_str();
            let mut value = guess.get(name).cloned().flatten();
            if matches!(&value, Some(Value::Str(s)) if s == "None") {
                tracing::warn!(attr = name, "literal \"None\" string taken as a missing value");
                diagnostics.once(name, Why::Invalid, Some("None".to_string()));
                value = None;
            }
            match value {
                None => {
                    inputs.remove(name);
                    diagnostics.once(name, Why::Missing, None);
                    if options.fatal {
                        return Err(Error::Fatal {
                            attr: name.to_string(),
                        });
                    }
                    guess.insert(name.to_string(), None);
                }
                Some(v) if attr.access.weak => {
                    guess.insert(name.to_string(), Some(v.downgrade()));
                }
                Some(_) => {}
            }
        }

        // Declaration order for callers.
        let attributes = self
            .attributes()
            .map(|a| (a.name.clone(), guess.get(&a.name).cloned().flatten()))
            .collect();
        Ok(Resolution {
            attributes,
            inputs,
            seen,
        })
    }
}
