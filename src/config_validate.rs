//! Setup validation
//!
//! Validates setup files before their settings reach a context.

use crate::config::SetupFile;
use crate::util::is_identifier;
use std::collections::BTreeSet;
use std::path::Path;

/// How bad a setup issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Loading is refused
    Error,
    /// Logged, loading goes on
    Warning,
}

/// One problem found in a setup file
#[derive(Debug, Clone)]
pub struct SetupIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

/// Issues found in one setup source
#[derive(Debug, Default)]
pub struct SetupValidationResult {
    /// Where the settings came from (a path, or a label for in-memory text)
    pub origin: String,
    pub issues: Vec<SetupIssue>,
}

impl SetupValidationResult {
    fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            issues: Vec::new(),
        }
    }

    fn error(&mut self, code: &'static str, message: String) {
        self.issues.push(SetupIssue {
            severity: Severity::Error,
            code,
            message,
        });
    }

    fn warning(&mut self, code: &'static str, message: String) {
        self.issues.push(SetupIssue {
            severity: Severity::Warning,
            code,
            message,
        });
    }

    fn of(&self, severity: Severity) -> impl Iterator<Item = &SetupIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &SetupIssue> {
        self.of(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SetupIssue> {
        self.of(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

/// Check parsed settings coming from `origin`.
pub fn validate_setup(setup: &SetupFile, origin: &str) -> SetupValidationResult {
    let mut result = SetupValidationResult::new(origin);

    let mut seen = BTreeSet::new();
    for key in &setup.fastkeys {
        if !is_identifier(key) {
            result.error("E004", format!("Fast key '{key}' is not a valid attribute name"));
        } else if !seen.insert(key.as_str()) {
            result.warning("W001", format!("Fast key '{key}' is listed twice"));
        }
    }

    if setup.report_len == 0 {
        result.error("E005", "report_len must be at least 1".to_string());
    }

    let mut folded = BTreeSet::new();
    for (key, value) in &setup.defaults {
        if let Err(e) = value.to_value() {
            result.error("E006", format!("Default '{key}' has an invalid value: {e}"));
        }
        if !folded.insert(key.to_lowercase()) {
            result.warning("W002", format!("Default '{key}' clashes with another key once lower-cased"));
        }
    }

    if setup.fastmode && setup.fastkeys.is_empty() {
        result.warning(
            "W003",
            "fastmode is on with no fast keys; every attribute failure aborts resolution".to_string(),
        );
    }

    result
}

/// Read, parse and check a setup file. `.json` files are read as JSON,
/// anything else as YAML.
pub fn validate_setup_file(path: &Path) -> SetupValidationResult {
    let origin = path.display().to_string();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut result = SetupValidationResult::new(&origin);
            result.error("E001", "File does not exist".to_string());
            return result;
        }
        Err(e) => {
            let mut result = SetupValidationResult::new(&origin);
            result.error("E002", format!("Cannot read file: {e}"));
            return result;
        }
    };

    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SetupFile::from_json(&content),
        _ => SetupFile::from_yaml(&content),
    };
    match parsed {
        Ok(setup) => validate_setup(&setup, &origin),
        Err(e) => {
            let mut result = SetupValidationResult::new(&origin);
            result.error("E003", format!("Invalid setup file: {e}"));
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueDef;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_default_setup() {
        let result = validate_setup(&SetupFile::default(), "mem");
        assert!(!result.has_errors());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_validate_bad_default_value() {
        let mut setup = SetupFile::default();
        setup.defaults.insert(
            "rdate".into(),
            ValueDef::Date {
                date: "2013-14-01".into(),
            },
        );
        setup.defaults.insert("Model".into(), ValueDef::Str("arpege".into()));
        setup.defaults.insert("model".into(), ValueDef::Str("arome".into()));
        let result = validate_setup(&setup, "mem");
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_validate_duplicated_fastkeys() {
        let mut setup = SetupFile::default();
        setup.fastkeys = vec!["kind".into(), "kind".into()];
        let result = validate_setup(&setup, "mem");
        assert!(!result.has_errors());
        assert_eq!(result.warnings().next().unwrap().code, "W001");
    }

    #[test]
    fn test_validate_files() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yaml");
        assert_eq!(validate_setup_file(&missing).issues[0].code, "E001");

        let broken = temp.path().join("setup.yaml");
        fs::write(&broken, "fastkeys: {{").unwrap();
        assert_eq!(validate_setup_file(&broken).issues[0].code, "E003");

        let good = temp.path().join("setup.yml");
        fs::write(&good, "fastmode: true\n").unwrap();
        assert!(!validate_setup_file(&good).has_errors());
    }
}
