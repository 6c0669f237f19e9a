//! Definition file smoke tests
//!
//! Classes declared in YAML and JSON files, registered in a context and
//! picked up through their collectors.

use footprints::{desc, Context, Error, Setup, Value};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const SHOP: &str = r#"
- name: Shop
  module: shops
  abstract: true
  collectors: [shop]
  footprint:
    attr:
      town:
        values: [paris, toulouse]
        remap: { tls: toulouse }
      opening:
        type: int
        optional: true
        default: 9
- name: Bakery
  module: shops
  extends: [Shop]
  footprint:
    attr:
      kind:
        values: [bakery, bread]
        remap: { bread: bakery }
- name: LateBakery
  module: shops
  extends: [Bakery]
  footprint:
    attr:
      opening:
        values: [11, 12]
    priority:
      level: toolbox
"#;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_define_from_file_and_pickup() {
    let file = yaml_file(SHOP);
    let mut ctx = Context::new();
    let classes = ctx.define_file(file.path()).unwrap();
    assert_eq!(
        classes.iter().map(|c| c.fullname()).collect::<Vec<_>>(),
        vec!["shops.Shop", "shops.Bakery", "shops.LateBakery"]
    );
    assert!(classes[0].is_abstract());
    assert_eq!(classes[2].collectors().to_vec(), vec!["shop".to_string()]);

    let shop = ctx.load(desc! { "tag" => "shop", "kind" => "bread", "town" => "tls" }).unwrap().unwrap();
    assert_eq!(shop.class().fullname(), "shops.Bakery");
    assert_eq!(shop.get("town").unwrap(), Value::from("toulouse"));
    assert_eq!(shop.get("opening").unwrap(), Value::Int(9));

    let late = ctx
        .load(desc! { "tag" => "shop", "kind" => "bakery", "town" => "paris", "opening" => "11" })
        .unwrap()
        .unwrap();
    assert_eq!(late.class().fullname(), "shops.LateBakery");
    assert_eq!(late.get("opening").unwrap(), Value::Int(11));
}

#[test]
fn test_define_reports_path_on_parse_errors() {
    let file = yaml_file("- name: [unclosed\n");
    let mut ctx = Context::new();
    let err = ctx.define_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::SchemaParse(_)), "{err}");
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_define_json() {
    let mut ctx = Context::new();
    let classes = ctx
        .define_json(r#"{"name": "Probe", "footprint": {"attr": {"level": {"type": "int", "values": [1, 2]}}}}"#)
        .unwrap();
    assert_eq!(classes[0].fullname(), "main.Probe");
    let probe = ctx.load(desc! { "level" => 2 }).unwrap().unwrap();
    assert_eq!(probe.get("level").unwrap(), Value::Int(2));
}

#[test]
fn test_setup_file_drives_the_context() {
    let setup = Setup::from_yaml("fatal: false\nreport: full\ndefaults:\n  Town: paris\n").unwrap();
    let mut ctx = Context::with_setup(setup);
    ctx.define_yaml(SHOP).unwrap();
    let shop = ctx.load(desc! { "tag" => "shop", "kind" => "bakery" }).unwrap().unwrap();
    assert_eq!(shop.get("town").unwrap(), Value::from("paris"));
    assert!(ctx.get_collector("shop").unwrap().report_last().is_some());
}
