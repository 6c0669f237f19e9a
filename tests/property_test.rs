//! Property-based tests
//!
//! Uses proptest to check resolution and collector invariants over random
//! descriptions.

use footprints::{
    desc, AttrType, AttributeFragment, ClassBuilder, Context, Description, Footprint, FootprintFragment,
    NullReport, ResolveOptions, Value,
};
use proptest::prelude::*;

const KINDS: [&str; 5] = ["hip", "hop", "hup", "foo", "bar"];

fn kind_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(KINDS.to_vec()).prop_map(String::from)
}

fn someint_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-3i64..15).prop_map(Value::Int),
        (-3i64..15).prop_map(|i| Value::Str(i.to_string())),
    ]
}

fn demo_footprint() -> Footprint {
    Footprint::new([FootprintFragment::new()
        .attr(
            "kind",
            AttributeFragment::new()
                .values(["hip", "hop"])
                .alias(["stuff"])
                .remap("foo", "hop"),
        )
        .attr("someint", AttributeFragment::new().typ(AttrType::Int).values(0..10))
        .attr(
            "flavour",
            AttributeFragment::new()
                .optional(true)
                .default("[kind]")
                .outcast(["hup", "bar"]),
        )])
    .unwrap()
}

fn resolve(fp: &Footprint, ctx: &Context, d: &Description) -> footprints::Resolution {
    fp.resolve(d, &ctx.resolve_cache(), ResolveOptions::screening(false), &mut NullReport)
        .unwrap()
}

fn collector_context() -> Context {
    let mut ctx = Context::new();
    let defs: [(&str, &[&str], bool); 4] = [
        ("Hip", &["hip"], false),
        ("Hop", &["hop", "foo"], false),
        ("Any", &["hip", "hop", "hup"], true),
        ("Loose", &[], false),
    ];
    for (name, kinds, optional) in defs {
        let kind = if kinds.is_empty() {
            AttributeFragment::new()
        } else {
            AttributeFragment::new().values(kinds.iter().copied())
        };
        ClassBuilder::new(name)
            .module("prop")
            .footprint(
                FootprintFragment::new()
                    .attr("kind", kind.optional(optional))
                    .attr("someint", AttributeFragment::new().typ(AttrType::Int).values(0..10)),
            )
            .build(&mut ctx)
            .unwrap();
    }
    ctx
}

fn found_names(ctx: &Context, d: &Description) -> Vec<String> {
    let collector = ctx.get_collector("garbage").unwrap();
    collector
        .find_all(ctx, d)
        .unwrap()
        .into_iter()
        .map(|c| c.class.fullname())
        .collect()
}

proptest! {
    /// Resolving the same description twice yields the same outcome.
    #[test]
    fn resolution_is_deterministic(kind in kind_strategy(), someint in someint_strategy()) {
        let ctx = Context::new();
        let fp = demo_footprint();
        let d = desc! { "kind" => kind.as_str(), "someint" => someint };
        let a = resolve(&fp, &ctx, &d);
        let b = resolve(&fp, &ctx, &d);
        prop_assert_eq!(a.attributes, b.attributes);
        prop_assert_eq!(a.inputs, b.inputs);
        prop_assert_eq!(a.seen, b.seen);
    }

    /// Feeding a complete resolution back in changes nothing.
    #[test]
    fn resolution_is_idempotent(kind in kind_strategy(), someint in someint_strategy()) {
        let ctx = Context::new();
        let fp = demo_footprint();
        let first = resolve(&fp, &ctx, &desc! { "kind" => kind.as_str(), "someint" => someint });
        if first.is_complete() {
            let again = resolve(&fp, &ctx, &first.values());
            prop_assert_eq!(again.attributes, first.attributes);
        }
    }

    /// An alias feeds its attribute exactly like the attribute name does.
    #[test]
    fn alias_is_equivalent_to_name(kind in kind_strategy(), someint in someint_strategy()) {
        let ctx = Context::new();
        let fp = demo_footprint();
        let by_name = resolve(&fp, &ctx, &desc! { "kind" => kind.as_str(), "someint" => someint.clone() });
        let by_alias = resolve(&fp, &ctx, &desc! { "stuff" => kind.as_str(), "someint" => someint });
        prop_assert_eq!(by_name.attributes, by_alias.attributes);
    }

    /// Resolved values stay inside `values` and outside `outcast`.
    #[test]
    fn resolved_values_respect_restrictions(
        kind in kind_strategy(),
        flavour in prop::option::of(kind_strategy()),
        someint in someint_strategy(),
    ) {
        let ctx = Context::new();
        let fp = demo_footprint();
        let mut d = desc! { "kind" => kind.as_str(), "someint" => someint };
        if let Some(flavour) = flavour {
            d.insert("flavour".into(), Value::from(flavour));
        }
        let res = resolve(&fp, &ctx, &d);
        if let Some(kind) = res.value("kind") {
            prop_assert!(kind == &Value::from("hip") || kind == &Value::from("hop"));
        }
        // A failing fast key stops validation of the others.
        if res.is_complete() {
            if let Some(Value::Int(i)) = res.value("someint") {
                prop_assert!((0..10).contains(i));
            }
            if let Some(flavour) = res.value("flavour") {
                prop_assert!(flavour != &Value::from("hup") && flavour != &Value::from("bar"));
            }
        }
    }

    /// A fatal resolution fails exactly when a lenient one is incomplete.
    #[test]
    fn fatality_matches_completeness(
        kind in prop::option::of(kind_strategy()),
        someint in prop::option::of(someint_strategy()),
    ) {
        let ctx = Context::new();
        let fp = demo_footprint();
        let mut d = Description::new();
        if let Some(kind) = kind {
            d.insert("kind".into(), Value::from(kind));
        }
        if let Some(someint) = someint {
            d.insert("someint".into(), someint);
        }
        let lenient = resolve(&fp, &ctx, &d);
        let fatal = fp.resolve(&d, &ctx.resolve_cache(), ResolveOptions::default(), &mut NullReport);
        prop_assert_eq!(fatal.is_err(), !lenient.is_complete());
    }

    /// The fast track never changes what a search finds.
    #[test]
    fn fasttrack_preserves_results(
        kind in prop::option::of(kind_strategy()),
        someint in someint_strategy(),
    ) {
        let mut d = desc! { "someint" => someint };
        if let Some(kind) = kind {
            d.insert("kind".into(), Value::from(kind));
        }

        let ctx = collector_context();
        ctx.get_collector("garbage").unwrap().set_fasttrack(["kind", "someint"]);
        let fast = found_names(&ctx, &d);

        let ctx = collector_context();
        ctx.get_collector("garbage").unwrap().set_fasttrack(Vec::<String>::new());
        let slow = found_names(&ctx, &d);

        prop_assert_eq!(fast, slow);
    }
}
