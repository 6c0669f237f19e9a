//! Resolution setup
//!
//! [`Setup`] holds the settings shared by every search of a
//! [`crate::Context`]: fast keys, default fatality, report level and the
//! case-insensitive table of default values. Its serializable part can be
//! loaded from YAML or JSON through [`SetupFile`].

use crate::config_validate::validate_setup;
use crate::error::{Error, Result};
use crate::reporting::{ReportLevel, ReportStyle};
use crate::schema::ValueDef;
use crate::util::LowerCaseMap;
use crate::value::{Extras, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// Process-wide default values, looked up case-insensitively.
pub type Defaults = LowerCaseMap<Value>;

/// Zero-argument hook seeding the extras of every resolution.
pub type ExtrasCallback = Rc<dyn Fn() -> Extras>;

/// Serializable setup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SetupFile {
    /// Fold unconsumed defaults into extras
    #[serde(default = "default_true")]
    pub extended: bool,

    /// Abort a resolution at the first failing attribute
    #[serde(default)]
    pub fastmode: bool,

    /// Raise on a missing mandatory attribute when resolving directly
    #[serde(default = "default_true")]
    pub fatal: bool,

    /// Attributes whose failure aborts a resolution at once
    #[serde(default = "default_fastkeys")]
    pub fastkeys: Vec<String>,

    /// Collector report level
    #[serde(default)]
    pub report: ReportLevel,

    /// Number of searches kept by each collector report log
    #[serde(default = "default_report_len")]
    pub report_len: usize,

    /// Layout of dumped reports
    #[serde(default)]
    pub report_style: ReportStyle,

    /// Default values table
    #[serde(default)]
    pub defaults: BTreeMap<String, ValueDef>,
}

fn default_true() -> bool {
    true
}

fn default_fastkeys() -> Vec<String> {
    vec!["kind".to_string()]
}

fn default_report_len() -> usize {
    100
}

impl Default for SetupFile {
    fn default() -> Self {
        Self {
            extended: true,
            fastmode: false,
            fatal: true,
            fastkeys: default_fastkeys(),
            report: ReportLevel::default(),
            report_len: default_report_len(),
            report_style: ReportStyle::default(),
            defaults: BTreeMap::new(),
        }
    }
}

impl SetupFile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_norway::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Runtime settings of a resolution context.
#[derive(Clone)]
pub struct Setup {
    pub extended: bool,
    pub fastmode: bool,
    pub fatal: bool,
    pub fastkeys: Vec<String>,
    pub report: ReportLevel,
    pub report_len: usize,
    pub report_style: ReportStyle,
    pub defaults: Defaults,
    pub callback: Option<ExtrasCallback>,
}

impl Default for Setup {
    fn default() -> Self {
        let mut setup = Setup {
            extended: true,
            fastmode: false,
            fatal: true,
            fastkeys: Vec::new(),
            report: ReportLevel::default(),
            report_len: 0,
            report_style: ReportStyle::default(),
            defaults: Defaults::new(),
            callback: None,
        };
        setup.apply_settings(&SetupFile::default());
        setup
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup")
            .field("extended", &self.extended)
            .field("fastmode", &self.fastmode)
            .field("fatal", &self.fatal)
            .field("fastkeys", &self.fastkeys)
            .field("report", &self.report)
            .field("report_len", &self.report_len)
            .field("report_style", &self.report_style)
            .field("defaults", &self.defaults)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Setup {
    /// Load settings from YAML, validating them first.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file = SetupFile::from_yaml(content)?;
        Self::from_file_settings(file, "<yaml>")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file = SetupFile::from_json(content)?;
        Self::from_file_settings(file, "<json>")
    }

    /// Load a `.json`, `.yaml` or `.yml` setup file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SetupFile::from_json(&content)?,
            _ => SetupFile::from_yaml(&content)
                .map_err(|e| Error::SchemaParse(format!("Failed to parse {}: {}", path.display(), e)))?,
        };
        Self::from_file_settings(file, &path.display().to_string())
    }

    fn from_file_settings(file: SetupFile, origin: &str) -> Result<Self> {
        let mut setup = Setup::default();
        setup.apply(&file, origin)?;
        Ok(setup)
    }

    /// Overwrite settings with `file`, after validation. Defaults from
    /// the file are added to the current table.
    pub fn apply(&mut self, file: &SetupFile, origin: &str) -> Result<()> {
        let validation = validate_setup(file, origin);
        for issue in validation.warnings() {
            tracing::warn!(code = issue.code, origin = %validation.origin, "{}", issue.message);
        }
        if validation.has_errors() {
            let messages: Vec<String> = validation
                .errors()
                .map(|issue| format!("{}: {}", issue.code, issue.message))
                .collect();
            return Err(Error::Other(format!("Invalid setup {}: {}", origin, messages.join("; "))));
        }
        let mut defaults = Vec::with_capacity(file.defaults.len());
        for (key, value) in &file.defaults {
            defaults.push((key.clone(), value.to_value()?));
        }
        self.apply_settings(file);
        self.defaults.extend(defaults);
        Ok(())
    }

    fn apply_settings(&mut self, file: &SetupFile) {
        self.extended = file.extended;
        self.fastmode = file.fastmode;
        self.fatal = file.fatal;
        self.fastkeys = file.fastkeys.clone();
        self.report = file.report;
        self.report_len = file.report_len;
        self.report_style = file.report_style;
    }

    /// Serializable view of the current settings. Defaults that have no
    /// file representation (objects, classes) are left out.
    pub fn to_file(&self) -> SetupFile {
        SetupFile {
            extended: self.extended,
            fastmode: self.fastmode,
            fatal: self.fatal,
            fastkeys: self.fastkeys.clone(),
            report: self.report,
            report_len: self.report_len,
            report_style: self.report_style,
            defaults: self
                .defaults
                .iter()
                .filter_map(|(k, v)| ValueDef::from_value(v).map(|def| (k.clone(), def)))
                .collect(),
        }
    }

    /// JSON schema of setup files.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(SetupFile)).unwrap_or(serde_json::Value::Null)
    }

    /// Extras seed produced by the callback, if any.
    pub fn extras(&self) -> Extras {
        self.callback.as_ref().map(|cb| cb()).unwrap_or_default()
    }

    pub fn set_callback(&mut self, callback: impl Fn() -> Extras + 'static) {
        self.callback = Some(Rc::new(callback));
    }

    pub fn is_fastkey(&self, name: &str) -> bool {
        self.fastkeys.iter().any(|k| k == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let setup = Setup::default();
        assert!(setup.extended);
        assert!(!setup.fastmode);
        assert!(setup.fatal);
        assert_eq!(setup.fastkeys, vec!["kind".to_string()]);
        assert_eq!(setup.report, ReportLevel::OnError);
        assert_eq!(setup.report_len, 100);
        assert!(setup.extras().is_empty());
    }

    #[test]
    fn test_from_yaml() {
        let setup = Setup::from_yaml(
            r#"
fastmode: true
fastkeys: [kind, model]
report: full
defaults:
  Geometry: globalupd
  cutoff: 6
  rdate: { date: "2013-11-02" }
"#,
        )
        .unwrap();
        assert!(setup.fastmode);
        assert!(setup.is_fastkey("model"));
        assert_eq!(setup.report, ReportLevel::Full);
        assert_eq!(setup.defaults.get("geometry"), Some(&Value::from("globalupd")));
        assert_eq!(setup.defaults.get("CUTOFF"), Some(&Value::Int(6)));
        assert!(matches!(setup.defaults.get("rdate"), Some(Value::Date(_))));
    }

    #[test]
    fn test_invalid_setup_is_rejected() {
        let err = Setup::from_yaml("fastkeys: ['not a key']\nreport_len: 0\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("E004"), "{msg}");
        assert!(msg.contains("E005"), "{msg}");
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let mut original = SetupFile::default();
        original.fatal = false;
        original.defaults.insert("cutoff".into(), ValueDef::Int(6));
        write!(file, "{}", serde_json::to_string(&original).unwrap()).unwrap();

        let setup = Setup::load_from_file(file.path()).unwrap();
        assert!(!setup.fatal);
        assert_eq!(setup.to_file(), original);
    }

    #[test]
    fn test_callback() {
        let mut setup = Setup::default();
        setup.set_callback(|| {
            let mut extras = Extras::new();
            extras.insert("glove".into(), Value::from("mine"));
            extras
        });
        assert_eq!(setup.extras().get("glove"), Some(&Value::from("mine")));
        assert!(format!("{setup:?}").contains("<fn>"));
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = Setup::json_schema();
        let props = &schema["properties"];
        assert!(props.get("fastkeys").is_some());
        assert!(props.get("defaults").is_some());
    }
}
