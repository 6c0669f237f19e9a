//! Thread-local default context
//!
//! Simple callers may share one [`Context`] per thread instead of passing
//! one around. The context is created on first use; [`reset`] drops it so
//! that tests start from a clean slate.
//!
//! Method closures run during a search must not borrow the default context
//! again: it is mutably borrowed for the whole search.

use crate::context::Context;
use crate::error::Result;
use crate::instance::Instance;
use crate::value::Description;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static CONTEXT: RefCell<Option<Rc<RefCell<Context>>>> = const { RefCell::new(None) };
}

/// The default context of this thread.
pub fn context() -> Rc<RefCell<Context>> {
    CONTEXT.with(|slot| {
        Rc::clone(
            slot.borrow_mut()
                .get_or_insert_with(|| Rc::new(RefCell::new(Context::new()))),
        )
    })
}

/// Replace the default context of this thread.
pub fn install(ctx: Context) -> Rc<RefCell<Context>> {
    let shared = Rc::new(RefCell::new(ctx));
    CONTEXT.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&shared)));
    shared
}

/// Forget the default context; the next call builds a fresh one.
pub fn reset() {
    CONTEXT.with(|slot| *slot.borrow_mut() = None);
}

/// Run `f` with the default context.
pub fn with<R>(f: impl FnOnce(&mut Context) -> R) -> R {
    let ctx = context();
    let mut guard = ctx.borrow_mut();
    f(&mut guard)
}

/// [`Context::pickup`] on the default context.
pub fn pickup(desc: &mut Description) -> Result<()> {
    with(|ctx| ctx.pickup(desc))
}

/// [`Context::load`] on the default context.
pub fn load(desc: Description) -> Result<Option<Rc<Instance>>> {
    with(|ctx| ctx.load(desc))
}

/// [`Context::default`] on the default context.
pub fn default(desc: Description) -> Result<Option<Rc<Instance>>> {
    with(|ctx| ctx.default(desc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::desc;
    use crate::footprint::{AttributeFragment, FootprintFragment};

    #[test]
    fn test_default_context_lifecycle() {
        reset();
        with(|ctx| {
            ClassBuilder::new("Glob")
                .footprint(FootprintFragment::new().attr("kind", AttributeFragment::new().values(["glob"])))
                .build(ctx)
                .unwrap();
        });
        let inst = load(desc! { "tag" => "garbage", "kind" => "glob" }).unwrap().unwrap();
        assert_eq!(inst.class().name(), "Glob");
        let same = default(desc! { "kind" => "glob" }).unwrap().unwrap();
        assert!(Rc::ptr_eq(&inst, &same));

        reset();
        assert!(context().borrow().class("Glob").is_none());

        let mut setup_ctx = Context::new();
        setup_ctx.setup_mut().fatal = false;
        install(setup_ctx);
        assert!(!context().borrow().setup().fatal);
        reset();
    }
}
