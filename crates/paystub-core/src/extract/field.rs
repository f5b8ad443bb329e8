//! Field extraction from a table window.

use regex::Regex;
use tracing::debug;

use crate::error::{ExtractionError, RuleError};
use crate::rules::{build_regex, FieldRule, PatternCompiler, PatternNode};

/// Where an extracted value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// The primary group participated.
    Primary,
    /// The named alternate group participated.
    Alternate(String),
    /// The configured default value.
    Default,
    /// Optional field, nothing matched.
    Absent,
}

/// A field rule with its effective pattern compiled.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    name: String,
    rule: FieldRule,
    regex: Regex,
}

impl FieldMatcher {
    /// Compile the field's own pattern, falling back to `shared`, then to an empty pattern.
    pub fn new(
        name: &str,
        rule: &FieldRule,
        shared: Option<&PatternNode>,
        compiler: &PatternCompiler,
    ) -> Result<Self, RuleError> {
        Self::with_context(name, name, rule, shared, compiler)
    }

    /// Like [`new`](Self::new), naming `context` in pattern errors.
    pub fn with_context(
        name: &str,
        context: &str,
        rule: &FieldRule,
        shared: Option<&PatternNode>,
        compiler: &PatternCompiler,
    ) -> Result<Self, RuleError> {
        let source = rule
            .pattern
            .as_ref()
            .or(shared)
            .map(|node| compiler.compile(node))
            .unwrap_or_default();
        let regex = build_regex(&source, context)?;
        Ok(Self {
            name: name.to_string(),
            rule: rule.clone(),
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &FieldRule {
        &self.rule
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Extract the field's value from `window`.
    pub fn extract(&self, window: &str) -> Result<String, ExtractionError> {
        self.extract_with_source(window).map(|(value, _)| value)
    }

    /// Like [`extract`](Self::extract), also reporting which fallback supplied the value.
    ///
    /// Order: primary group, alternates in order, default value, empty for
    /// optional fields. Trimming applies to whichever value wins.
    pub fn extract_with_source(&self, window: &str) -> Result<(String, ValueSource), ExtractionError> {
        let captured = self.regex.captures(window).and_then(|caps| {
            std::iter::once(&self.rule.group)
                .chain(self.rule.alternate_group.iter())
                .find_map(|group| caps.name(group).map(|m| (group, m.as_str().to_string())))
        });

        let (value, source) = match captured {
            Some((group, value)) if *group == self.rule.group => (value, ValueSource::Primary),
            Some((group, value)) => (value, ValueSource::Alternate(group.clone())),
            None => match &self.rule.default_value {
                Some(default) => (default.clone(), ValueSource::Default),
                None if !self.rule.is_required => (String::new(), ValueSource::Absent),
                None => {
                    return Err(ExtractionError::FieldNotFound {
                        group: self.rule.group.clone(),
                        pattern: self.regex.as_str().to_string(),
                        window: window.to_string(),
                    });
                }
            },
        };

        let value = if self.rule.trim {
            value.trim().to_string()
        } else {
            value
        };
        debug!("Field {} = {:?} ({:?})", self.name, value, source);
        Ok((value, source))
    }
}

/// Extract one field from a window using its rule and the section's shared pattern.
pub fn extract_field(
    window: &str,
    rule: &FieldRule,
    shared: Option<&PatternNode>,
    compiler: &PatternCompiler,
) -> crate::Result<String> {
    let matcher = FieldMatcher::new(&rule.group, rule, shared, compiler)?;
    Ok(matcher.extract(window)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const WINDOW: &str = "Deductions | Amount | YTD\nNo Deductions\n";

    fn shared() -> PatternNode {
        PatternNode::literal(
            r"(?:Deductions \| (?<period>\d+\.\d{2}) \| (?<ytd>\d+\.\d{2})|^(?<ytd_only>\d+\.\d{2})|No Deductions(?<no_deductions>\W|))",
        )
    }

    fn matcher(rule: FieldRule) -> FieldMatcher {
        FieldMatcher::new("field", &rule, Some(&shared()), &PatternCompiler::default()).unwrap()
    }

    #[test]
    fn test_primary_group_wins() {
        let rule = FieldRule::group("ytd").with_alternates(["ytd_only"]);
        let (value, source) = matcher(rule)
            .extract_with_source("Deductions | 1.00 | 2.00\n")
            .unwrap();
        assert_eq!(value, "2.00");
        assert_eq!(source, ValueSource::Primary);
    }

    #[test]
    fn test_first_participating_alternate_wins() {
        let rule = FieldRule::group("ytd").with_alternates(["ytd_only", "no_deductions"]);
        let (value, source) = matcher(rule).extract_with_source("header\n3.00\n").unwrap();
        assert_eq!(value, "3.00");
        assert_eq!(source, ValueSource::Alternate("ytd_only".into()));
    }

    #[test]
    fn test_alternate_value_is_trimmed() {
        let rule = FieldRule::group("ytd")
            .with_alternates(["ytd_only", "no_deductions"])
            .trimmed();
        let (value, source) = matcher(rule).extract_with_source(WINDOW).unwrap();
        assert_eq!(value, "");
        assert_eq!(source, ValueSource::Alternate("no_deductions".into()));
    }

    #[test]
    fn test_untrimmed_alternate_keeps_whitespace() {
        let rule = FieldRule::group("ytd").with_alternates(["no_deductions"]);
        assert_eq!(matcher(rule).extract(WINDOW).unwrap(), "\n");
    }

    #[test]
    fn test_default_value_when_no_group_matches() {
        let rule = FieldRule::group("period").with_default("n/a");
        let (value, source) = matcher(rule).extract_with_source(WINDOW).unwrap();
        assert_eq!(value, "n/a");
        assert_eq!(source, ValueSource::Default);
    }

    #[test]
    fn test_trim_applies_after_default() {
        let rule = FieldRule::group("period").with_default("  n/a ").trimmed();
        assert_eq!(matcher(rule).extract(WINDOW).unwrap(), "n/a");
    }

    #[test]
    fn test_optional_field_resolves_empty() {
        let rule = FieldRule::group("period").optional();
        let (value, source) = matcher(rule).extract_with_source(WINDOW).unwrap();
        assert_eq!(value, "");
        assert_eq!(source, ValueSource::Absent);
    }

    #[test]
    fn test_required_field_fails_with_context() {
        let rule = FieldRule::group("period");
        match matcher(rule).extract(WINDOW).unwrap_err() {
            ExtractionError::FieldNotFound { group, pattern, window } => {
                assert_eq!(group, "period");
                assert!(pattern.contains("No Deductions"));
                assert_eq!(window, WINDOW);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_field_pattern_overrides_shared() {
        let rule = FieldRule::group("label").with_pattern(r"^(?<label>\w+) \|");
        assert_eq!(matcher(rule).extract(WINDOW).unwrap(), "Deductions");
    }

    #[test]
    fn test_missing_pattern_uses_empty_pattern() {
        let rule = FieldRule::group("x").optional();
        let matcher = FieldMatcher::new("x", &rule, None, &PatternCompiler::default()).unwrap();
        assert_eq!(matcher.pattern(), "");
        assert_eq!(matcher.extract("anything").unwrap(), "");
    }

    #[test]
    fn test_extract_field_free_function() {
        let rule = FieldRule::group("ytd");
        let err = extract_field("nothing here", &rule, Some(&shared()), &PatternCompiler::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldNotFound);
    }
}
