//! Rule documents: loading, marker resolution and validation.

pub mod markers;
pub mod pattern;
pub mod schema;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use markers::{SubstituteMarkers, VariableMap};
pub use pattern::{build_regex, CompositePattern, Join, PatternCompiler, PatternNode};
pub use schema::{FieldRule, OrderedMap, RuleSet, Section, SectionRule};

use crate::error::RuleError;

/// Rule document shipped with the library, describing the standard stub layout.
pub const DEFAULT_RULES: &str = include_str!("../../rules/default.rules.json");

/// A parsed rule document: reusable variables plus the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Named fragments referenced as `{{name}}`, in substitution order.
    #[serde(default)]
    pub variables: OrderedMap<PatternNode>,
    pub rules: RuleSet,
}

/// A rule document after marker substitution and validation.
#[derive(Debug, Clone)]
pub struct ResolvedRules {
    /// Every variable compiled to regex source.
    pub variables: VariableMap,
    pub rules: RuleSet,
}

impl RuleDocument {
    /// Load rules from a file path or from inline JSON.
    ///
    /// A specifier naming an existing location is read from disk; anything
    /// else is parsed as the payload itself.
    pub fn load(specifier: &str) -> Result<Self, RuleError> {
        if specifier.trim().is_empty() {
            return Err(RuleError::InputMissing);
        }

        let path = Path::new(specifier);
        if path.exists() {
            let payload = fs::read_to_string(path).map_err(|source| RuleError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Loaded rules from {} ({} bytes)", path.display(), payload.len());
            return Self::from_json(&payload);
        }

        debug!("Parsing inline rules ({} bytes)", specifier.len());
        Self::from_json(specifier)
    }

    /// Parse a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, RuleError> {
        serde_json::from_str(payload).map_err(|e| RuleError::Parse {
            reason: e.to_string(),
            payload: payload.to_string(),
        })
    }

    /// The embedded default rule document.
    pub fn embedded() -> Result<Self, RuleError> {
        Self::from_json(DEFAULT_RULES)
    }

    /// Load `specifier` if given, otherwise fall back to the embedded rules.
    pub fn load_or_default(specifier: Option<&str>) -> Result<Self, RuleError> {
        match specifier {
            Some(specifier) => Self::load(specifier),
            None => {
                debug!("No rules configured, using embedded defaults");
                Self::embedded()
            }
        }
    }

    /// Substitute markers and validate, leaving `self` untouched.
    pub fn resolve(&self, compiler: &PatternCompiler) -> Result<ResolvedRules, RuleError> {
        let mut variables = self.variables.clone();
        markers::expand_variables(&mut variables);
        let flat = markers::compile_variables(&variables, compiler);

        let mut rules = self.rules.clone();
        rules.substitute_markers(&flat);
        rules.validate(compiler)?;

        let leftover = unresolved_markers(&rules, compiler);
        if !leftover.is_empty() {
            warn!("Unresolved markers in rules: {}", leftover.join(", "));
        }

        Ok(ResolvedRules {
            variables: flat,
            rules,
        })
    }
}

/// Marker names still present anywhere in a rule set.
pub fn unresolved_markers(rules: &RuleSet, compiler: &PatternCompiler) -> Vec<String> {
    let mut names = markers::unresolved(&compiler.compile(&rules.document_start));
    for (_, section) in rules.sections() {
        names.extend(markers::unresolved(&compiler.compile(&section.table_header)));
        names.extend(markers::unresolved(&compiler.compile(&section.next_table_header)));
        if let Some(pattern) = &section.find_pattern {
            names.extend(markers::unresolved(&compiler.compile(pattern)));
        }
        for (_, field) in section.find.iter() {
            if let Some(pattern) = &field.pattern {
                names.extend(markers::unresolved(&compiler.compile(pattern)));
            }
        }
    }
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::PaystubError;
    use std::io::Write;

    fn minimal_rules() -> String {
        let section = r#"{"tableHeader": "H", "nextTableHeader": "N", "find": {"x": "x"}}"#;
        format!(
            r#"{{"variables": {{"documentStart": "Start.*"}},
               "rules": {{"check": {section}, "grossEarnings": {section}, "taxes": {section},
                          "deductions": {section}, "deposits": {section}}}}}"#
        )
    }

    #[test]
    fn test_load_missing_specifier() {
        let err = RuleDocument::load("   ").unwrap_err();
        assert_eq!(PaystubError::from(err).kind(), ErrorKind::RuleInputMissing);
    }

    #[test]
    fn test_load_inline() {
        let document = RuleDocument::load(&minimal_rules()).unwrap();
        assert_eq!(document.variables.len(), 1);
        assert_eq!(document.rules.document_start, PatternNode::literal("{{documentStart}}"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal_rules().as_bytes()).unwrap();
        let document = RuleDocument::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(document.rules.check.find.len(), 1);
    }

    #[test]
    fn test_load_unreadable_location() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuleDocument::load(dir.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuleReadError);
    }

    #[test]
    fn test_load_malformed_payload() {
        let err = RuleDocument::load("{not json").unwrap_err();
        match err {
            RuleError::Parse { payload, .. } => assert_eq!(payload, "{not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_does_not_mutate_document() {
        let document = RuleDocument::from_json(&minimal_rules()).unwrap();
        let before = document.clone();
        let resolved = document.resolve(&PatternCompiler::default()).unwrap();
        assert_eq!(document, before);
        assert_eq!(resolved.rules.document_start, PatternNode::literal("Start.*"));
    }

    #[test]
    fn test_resolve_reports_leftover_markers() {
        let json = minimal_rules().replace(r#""H""#, r#""{{nope}}""#);
        let document = RuleDocument::from_json(&json).unwrap();
        let compiler = PatternCompiler::default();
        let resolved = document.resolve(&compiler).unwrap();
        assert_eq!(unresolved_markers(&resolved.rules, &compiler), vec!["nope"]);
    }

    #[test]
    fn test_embedded_rules_resolve() {
        let document = RuleDocument::embedded().unwrap();
        let compiler = PatternCompiler::default();
        let resolved = document.resolve(&compiler).unwrap();
        assert!(unresolved_markers(&resolved.rules, &compiler).is_empty());
        assert_eq!(
            resolved.rules.check.find.keys().collect::<Vec<_>>(),
            vec![
                "checkNumber",
                "checkDate",
                "payPeriodStart",
                "payPeriodEnd",
                "salary",
                "netPay",
                "fedTaxIncome",
                "hoursWorked"
            ]
        );
    }
}
