//! Footprint instances
//!
//! An [`Instance`] holds the resolved attributes of one object built from a
//! [`FootprintClass`]. Reads and writes go through the attribute's access
//! mode; writes are validated exactly like a resolution would validate them.

use crate::class::FootprintClass;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::footprint::ResolveOptions;
use crate::reporting::NullReport;
use crate::value::{Description, Extras, Guess, Member, Scope, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub struct Instance {
    class: Rc<FootprintClass>,
    attrs: RefCell<Guess>,
}

impl Instance {
    /// Create an instance and announce it to the class observers.
    pub(crate) fn spawn(class: Rc<FootprintClass>, attrs: Guess) -> Rc<Instance> {
        let inst = Rc::new(Instance {
            class,
            attrs: RefCell::new(attrs),
        });
        inst.class.observer().notify_new(&inst, &Description::new());
        inst
    }

    pub fn class(&self) -> &Rc<FootprintClass> {
        &self.class
    }

    fn spec(&self, attr: &str) -> Result<&crate::footprint::AttributeSpec> {
        self.class
            .footprint()
            .attribute(attr)
            .ok_or_else(|| Error::NoSuchAttribute(attr.to_string()))
    }

    /// Current value of `attr`; `Null` when undefined or unknown.
    pub fn get(&self, attr: &str) -> Result<Value> {
        self.spec(attr)?;
        let value = match self.attrs.borrow().get(attr) {
            Some(Some(v)) if !v.is_unknown() => v.upgrade(),
            _ => Value::Null,
        };
        Ok(value)
    }

    /// Write `attr` after validating `value`; remap tables only apply at resolution.
    pub fn set(&self, attr: &str, value: impl Into<Value>) -> Result<()> {
        let spec = self.spec(attr)?;
        spec.access.check(attr, "set")?;
        let mut value = spec.validate(value.into()).map_err(|rejection| Error::AttributeValue {
            attr: attr.to_string(),
            reason: rejection.to_string(),
        })?;
        if spec.access.weak {
            value = value.downgrade();
        }
        let info = crate::desc! { "attr" => attr, "value" => value.upgrade() };
        self.attrs.borrow_mut().insert(attr.to_string(), Some(value));
        self.class.observer().notify_upd(self, &info);
        Ok(())
    }

    pub fn delete(&self, attr: &str) -> Result<()> {
        let spec = self.spec(attr)?;
        spec.access.check(attr, "delete")?;
        self.attrs.borrow_mut().insert(attr.to_string(), None);
        let info = crate::desc! { "attr" => attr, "value" => Value::Null };
        self.class.observer().notify_upd(self, &info);
        Ok(())
    }

    /// Defined attributes with strong values.
    pub fn attributes(&self) -> Description {
        self.attrs
            .borrow()
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.upgrade())))
            .filter(|(_, v)| !v.is_null())
            .collect()
    }

    /// Attributes without a value.
    pub fn undefs(&self) -> Vec<String> {
        self.attrs
            .borrow()
            .iter()
            .filter(|(_, v)| v.as_ref().is_none_or(|v| v.is_null() || v.is_unknown()))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Attributes as stored, fed to the extras of other resolutions.
    pub fn shallow(&self) -> Extras {
        self.attrs
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().unwrap_or(Value::Null)))
            .collect()
    }

    pub fn export(&self) -> serde_json::Value {
        let attrs = self.attrs.borrow();
        let map: serde_json::Map<String, serde_json::Value> = attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.as_ref().map_or(serde_json::Value::Null, Value::to_json)))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Whether `desc` resolves, through this class's footprint, to values
    /// this instance already has.
    pub fn compatible(&self, ctx: &Context, desc: &Description) -> Result<bool> {
        let resolution = self.class.footprint().resolve(
            desc,
            &ctx.resolve_cache(),
            ResolveOptions::screening(false),
            &mut NullReport,
        )?;
        if !resolution.is_complete() {
            return Ok(false);
        }
        let attrs = self.attrs.borrow();
        Ok(resolution.attributes.iter().all(|(k, resolved)| {
            let mine = attrs.get(k).cloned().flatten().map(|v| v.upgrade());
            mine == resolved.as_ref().map(Value::upgrade)
        }))
    }

    /// Remove from `desc` every key this instance's footprint tracks.
    pub fn cleanup(&self, desc: &mut Description) {
        for key in self.class.footprint().track(desc) {
            tracing::debug!(attr = %key, "removing tracked attribute from description");
            desc.shift_remove(&key);
        }
    }

    /// New instance of the same class with some attributes replaced.
    pub fn clone_with(&self, ctx: &Context, extra: Description) -> Result<Rc<Instance>> {
        let mut desc = self.attributes();
        desc.extend(extra);
        self.class.instantiate(ctx, &desc)
    }

    /// Placeholder member lookup: attributes, then methods, then the class
    /// names.
    pub fn member(&self, name: &str, scope: &Scope<'_>) -> Member {
        if self.class.footprint().attribute(name).is_some() {
            return match self.get(name) {
                Ok(value) => Member::Found(value),
                Err(e) => Member::Failed(e.to_string()),
            };
        }
        if let Some(method) = self.class.method(name) {
            return method(self, scope);
        }
        match name {
            "clskind" => Member::Found(Value::Str(self.class.clskind())),
            "fullname" => Member::Found(Value::Str(self.class.fullname())),
            _ => Member::Missing,
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.class.fullname())?;
        match self.attrs.try_borrow() {
            Ok(attrs) => {
                for (k, v) in attrs.iter() {
                    match v {
                        Some(v) => write!(f, " {k}={v}")?,
                        None => write!(f, " {k}=None")?,
                    }
                }
            }
            Err(_) => write!(f, " ...")?,
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance{self}")
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.class.observer().notify_del(self, &Description::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Access;
    use crate::class::ClassBuilder;
    use crate::footprint::{AttributeFragment, FootprintFragment};
    use crate::types::AttrType;
    use crate::desc;
    use pretty_assertions::assert_eq;

    fn setup() -> (Context, Rc<FootprintClass>) {
        let mut ctx = Context::new();
        let cls = ClassBuilder::new("Foo")
            .module("demo")
            .footprint(
                FootprintFragment::new()
                    .attr("kind", AttributeFragment::new().values(["hip", "hop"]))
                    .attr(
                        "someint",
                        AttributeFragment::new()
                            .typ(AttrType::Int)
                            .values(0..10)
                            .access(Access::READ_WRITE),
                    )
                    .attr(
                        "tag_line",
                        AttributeFragment::new().optional(true).access(Access::READ_WRITE_DELETE),
                    ),
            )
            .method("double", |inst, _| match inst.get("someint") {
                Ok(Value::Int(i)) => Member::Found(Value::Int(i * 2)),
                _ => Member::Failed("no int".into()),
            })
            .build(&mut ctx)
            .unwrap();
        (ctx, cls)
    }

    #[test]
    fn test_access_modes() {
        let (ctx, cls) = setup();
        let inst = cls.instantiate(&ctx, &desc! { "kind" => "hip", "someint" => "3" }).unwrap();
        assert_eq!(inst.get("someint").unwrap(), Value::Int(3));
        assert_eq!(inst.get("tag_line").unwrap(), Value::Null);
        assert_eq!(inst.undefs(), vec!["tag_line".to_string()]);

        assert!(matches!(inst.set("kind", "hop"), Err(Error::ReadOnly { .. })));
        inst.set("someint", "5").unwrap();
        assert_eq!(inst.get("someint").unwrap(), Value::Int(5));
        let err = inst.set("someint", 12).unwrap_err();
        assert!(matches!(err, Error::AttributeValue { .. }), "{err}");
        assert!(inst.delete("someint").is_err());

        inst.set("tag_line", "x").unwrap();
        inst.delete("tag_line").unwrap();
        assert_eq!(inst.get("tag_line").unwrap(), Value::Null);
        assert!(matches!(inst.get("nope"), Err(Error::NoSuchAttribute(_))));
    }

    #[test]
    fn test_set_does_not_remap() {
        let mut ctx = Context::new();
        let cls = ClassBuilder::new("Remapped")
            .module("demo")
            .footprint(FootprintFragment::new().attr(
                "kind",
                AttributeFragment::new()
                    .values(["hip", "hop"])
                    .remap("foo", "hop")
                    .access(Access::READ_WRITE),
            ))
            .build(&mut ctx)
            .unwrap();
        let inst = cls.instantiate(&ctx, &desc! { "kind" => "foo" }).unwrap();
        assert_eq!(inst.get("kind").unwrap(), Value::from("hop"));

        let err = inst.set("kind", "foo").unwrap_err();
        assert!(matches!(err, Error::AttributeValue { .. }), "{err}");
        assert_eq!(inst.get("kind").unwrap(), Value::from("hop"));
        inst.set("kind", "hip").unwrap();
        assert_eq!(inst.get("kind").unwrap(), Value::from("hip"));
    }

    #[test]
    fn test_members() {
        let (ctx, cls) = setup();
        let inst = cls.instantiate(&ctx, &desc! { "kind" => "hip", "someint" => 4 }).unwrap();
        let guess = Guess::new();
        let extras = Extras::new();
        let scope = Scope::new(&guess, &extras);
        assert_eq!(inst.member("double", &scope), Member::Found(Value::Int(8)));
        assert_eq!(inst.member("kind", &scope), Member::Found(Value::from("hip")));
        assert_eq!(inst.member("clskind", &scope), Member::Found(Value::from("foo")));
        assert_eq!(inst.member("fullname", &scope), Member::Found(Value::from("demo.Foo")));
        assert_eq!(inst.member("nothing", &scope), Member::Missing);
    }

    #[test]
    fn test_compatible_and_cleanup() {
        let (ctx, cls) = setup();
        let inst = cls.instantiate(&ctx, &desc! { "kind" => "hip", "someint" => 4 }).unwrap();
        assert!(inst.compatible(&ctx, &desc! { "kind" => "hip", "someint" => "4" }).unwrap());
        assert!(!inst.compatible(&ctx, &desc! { "kind" => "hop", "someint" => 4 }).unwrap());
        assert!(!inst.compatible(&ctx, &desc! { "kind" => "hip" }).unwrap());

        let mut d = desc! { "kind" => "hip", "someint" => 4, "other" => 1 };
        inst.cleanup(&mut d);
        assert_eq!(d, desc! { "other" => 1 });
    }

    #[test]
    fn test_clone_with_and_export() {
        let (ctx, cls) = setup();
        let inst = cls.instantiate(&ctx, &desc! { "kind" => "hip", "someint" => 4 }).unwrap();
        let other = inst.clone_with(&ctx, desc! { "someint" => 6 }).unwrap();
        assert_eq!(other.get("someint").unwrap(), Value::Int(6));
        assert_eq!(other.get("kind").unwrap(), Value::from("hip"));
        assert_eq!(
            inst.export(),
            serde_json::json!({ "kind": "hip", "someint": 4, "tag_line": null })
        );
        assert_eq!(inst.to_string(), "<demo.Foo kind=hip someint=4 tag_line=__unknown__>");
    }

    #[test]
    fn test_instance_as_placeholder_source() {
        let (ctx, cls) = setup();
        let inst = cls.instantiate(&ctx, &desc! { "kind" => "hip", "someint" => 4 }).unwrap();
        let fp = crate::footprint::Footprint::new([
            FootprintFragment::new().attr("label", AttributeFragment::new())
        ])
        .unwrap();
        let res = fp
            .resolve(
                &desc! { "label" => "[foo:kind]_[someint]_[foo:double]", "foo" => Value::Object(inst) },
                &ctx.resolve_cache(),
                ResolveOptions::screening(false),
                &mut NullReport,
            )
            .unwrap();
        assert_eq!(res.value("label"), Some(&Value::from("hip_4_8")));
    }
}
