//! Instance lifecycle notifications
//!
//! Every footprint class owns an [`ObserverSet`], found by full name on the
//! context's [`ObserverBoard`]. Instances announce their creation, updates
//! and drop to that set, which forwards them to the registered observers
//! (collectors, mostly). Both observers and observed items are held weakly.

use crate::instance::Instance;
use crate::value::Description;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Listener of instance lifecycle events.
pub trait Observer {
    fn new_item(&self, item: &Rc<Instance>, info: &Description) {
        tracing::debug!(item = %item, info = ?info, "notified new item");
    }

    fn del_item(&self, item: &Instance, info: &Description) {
        tracing::debug!(item = %item, info = ?info, "notified del item");
    }

    fn upd_item(&self, item: &Instance, info: &Description) {
        tracing::debug!(item = %item, info = ?info, "notified upd item");
    }
}

fn same_listener(a: &Weak<dyn Observer>, b: &Rc<dyn Observer>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), Rc::as_ptr(b))
}

/// Observed items of one tag and their listeners.
pub struct ObserverSet {
    tag: String,
    listeners: RefCell<Vec<Weak<dyn Observer>>>,
    items: RefCell<Vec<Weak<Instance>>>,
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("tag", &self.tag)
            .field("listeners", &self.listeners.borrow().len())
            .field("items", &self.items.borrow().len())
            .finish()
    }
}

impl ObserverSet {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            listeners: RefCell::new(Vec::new()),
            items: RefCell::new(Vec::new()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn register(&self, remote: &Rc<dyn Observer>) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|l| l.strong_count() > 0);
        if !listeners.iter().any(|l| same_listener(l, remote)) {
            listeners.push(Rc::downgrade(remote));
        }
    }

    pub fn unregister(&self, remote: &Rc<dyn Observer>) {
        self.listeners
            .borrow_mut()
            .retain(|l| l.strong_count() > 0 && !same_listener(l, remote));
    }

    pub fn observers(&self) -> Vec<Rc<dyn Observer>> {
        self.listeners.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    pub fn observed(&self) -> Vec<Rc<Instance>> {
        self.items.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    fn is_observed(&self, item: &Instance) -> bool {
        self.items
            .borrow()
            .iter()
            .any(|w| std::ptr::eq(w.as_ptr(), item))
    }

    pub fn notify_new(&self, item: &Rc<Instance>, info: &Description) {
        tracing::debug!(tag = %self.tag, item = %item, "notify new");
        {
            let mut items = self.items.borrow_mut();
            items.retain(|w| w.strong_count() > 0);
            items.push(Rc::downgrade(item));
        }
        for remote in self.observers() {
            remote.new_item(item, info);
        }
    }

    /// Called while `item` is being dropped.
    pub fn notify_del(&self, item: &Instance, info: &Description) {
        if !self.is_observed(item) {
            return;
        }
        tracing::debug!(tag = %self.tag, "notify del");
        for remote in self.observers() {
            remote.del_item(item, info);
        }
        self.items
            .borrow_mut()
            .retain(|w| w.strong_count() > 0 && !std::ptr::eq(w.as_ptr(), item));
    }

    pub fn notify_upd(&self, item: &Instance, info: &Description) {
        if !self.is_observed(item) {
            return;
        }
        tracing::debug!(tag = %self.tag, item = %item, "notify upd");
        for remote in self.observers() {
            remote.upd_item(item, info);
        }
    }
}

/// Observer sets by tag, created on first request.
#[derive(Debug, Default)]
pub struct ObserverBoard {
    sets: RefCell<IndexMap<String, Rc<ObserverSet>>>,
}

impl ObserverBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &str) -> Rc<ObserverSet> {
        Rc::clone(
            self.sets
                .borrow_mut()
                .entry(tag.to_string())
                .or_insert_with(|| Rc::new(ObserverSet::new(tag))),
        )
    }

    pub fn tags(&self) -> Vec<String> {
        self.sets.borrow().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.sets.borrow_mut().clear();
    }
}
