//! Rule document schema: field rules, section rules and the five-section rule set.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::markers::{SubstituteMarkers, VariableMap};
use super::pattern::{PatternCompiler, PatternNode};
use crate::error::RuleError;

/// A string-keyed map that keeps the order entries were written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub(crate) fn value_at_mut(&mut self, index: usize) -> Option<&mut V> {
        self.0.get_mut(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut V)> {
        self.0.iter_mut().map(|(k, v)| (&*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

impl<V: SubstituteMarkers> SubstituteMarkers for OrderedMap<V> {
    fn substitute_markers(&mut self, variables: &VariableMap) {
        for (_, value) in self.iter_mut() {
            value.substitute_markers(variables);
        }
    }
}

/// How one field is read out of a table window.
///
/// JSON accepts either a bare group name or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFieldRule", rename_all = "camelCase")]
pub struct FieldRule {
    /// Primary capture group.
    pub group: String,
    /// Groups tried in order when the primary group did not participate.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternate_group: Vec<String>,
    /// Overrides the section's shared pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternNode>,
    pub is_required: bool,
    /// Strip surrounding whitespace from the final value.
    pub trim: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldRule {
    /// A required field read from `group` with the shared pattern.
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            alternate_group: Vec::new(),
            pattern: None,
            is_required: true,
            trim: false,
            default_value: None,
        }
    }

    pub fn with_alternates<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_group = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<PatternNode>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldRule {
    Group(String),
    Detailed(DetailedFieldRule),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailedFieldRule {
    group: String,
    #[serde(default)]
    alternate_group: Option<OneOrMany>,
    #[serde(default)]
    pattern: Option<PatternNode>,
    #[serde(default = "default_required")]
    is_required: bool,
    #[serde(default)]
    trim: bool,
    #[serde(default)]
    default_value: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn default_required() -> bool {
    true
}

impl From<RawFieldRule> for FieldRule {
    fn from(raw: RawFieldRule) -> Self {
        match raw {
            RawFieldRule::Group(group) => FieldRule::group(group),
            RawFieldRule::Detailed(rule) => FieldRule {
                group: rule.group,
                alternate_group: match rule.alternate_group {
                    Some(OneOrMany::One(group)) => vec![group],
                    Some(OneOrMany::Many(groups)) => groups,
                    None => Vec::new(),
                },
                pattern: rule.pattern,
                is_required: rule.is_required,
                trim: rule.trim,
                default_value: rule.default_value,
            },
        }
    }
}

impl SubstituteMarkers for FieldRule {
    fn substitute_markers(&mut self, variables: &VariableMap) {
        if let Some(pattern) = &mut self.pattern {
            pattern.substitute_markers(variables);
        }
        if let Some(default) = &mut self.default_value {
            default.substitute_markers(variables);
        }
    }
}

/// Rules for one logical section of a pay stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRule {
    #[serde(rename = "tableHeader")]
    pub table_header: PatternNode,
    #[serde(rename = "nextTableHeader")]
    pub next_table_header: PatternNode,
    /// Output field name to field rule, in extraction order.
    pub find: OrderedMap<FieldRule>,
    /// Pattern shared by every field without its own.
    #[serde(default, alias = "findPattern", skip_serializing_if = "Option::is_none")]
    pub find_pattern: Option<PatternNode>,
}

impl SectionRule {
    /// Check that both headers compile to something and `find` has entries.
    pub fn validate(&self, section: Section, compiler: &PatternCompiler) -> Result<(), RuleError> {
        let invalid = |reason: &str| RuleError::InvalidSection {
            section: section.name().to_string(),
            reason: reason.to_string(),
        };
        if compiler.compile(&self.table_header).is_empty() {
            return Err(invalid("tableHeader compiles to an empty pattern"));
        }
        if compiler.compile(&self.next_table_header).is_empty() {
            return Err(invalid("nextTableHeader compiles to an empty pattern"));
        }
        if self.find.is_empty() {
            return Err(invalid("find has no fields"));
        }
        Ok(())
    }
}

impl SubstituteMarkers for SectionRule {
    fn substitute_markers(&mut self, variables: &VariableMap) {
        self.table_header.substitute_markers(variables);
        self.next_table_header.substitute_markers(variables);
        self.find.substitute_markers(variables);
        if let Some(pattern) = &mut self.find_pattern {
            pattern.substitute_markers(variables);
        }
    }
}

/// The five pay-stub sections, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Check,
    GrossEarnings,
    Taxes,
    Deductions,
    Deposits,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Check,
        Section::GrossEarnings,
        Section::Taxes,
        Section::Deductions,
        Section::Deposits,
    ];

    /// Key used for this section in rule documents.
    pub fn name(&self) -> &'static str {
        match self {
            Section::Check => "check",
            Section::GrossEarnings => "grossEarnings",
            Section::Taxes => "taxes",
            Section::Deductions => "deductions",
            Section::Deposits => "deposits",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Section rules plus the document-start anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    /// Marks the start of valid content; every window is anchored after it.
    #[serde(default = "default_document_start")]
    pub document_start: PatternNode,
    pub check: SectionRule,
    pub gross_earnings: SectionRule,
    pub taxes: SectionRule,
    pub deductions: SectionRule,
    pub deposits: SectionRule,
}

fn default_document_start() -> PatternNode {
    PatternNode::literal("{{documentStart}}")
}

impl RuleSet {
    pub fn section(&self, section: Section) -> &SectionRule {
        match section {
            Section::Check => &self.check,
            Section::GrossEarnings => &self.gross_earnings,
            Section::Taxes => &self.taxes,
            Section::Deductions => &self.deductions,
            Section::Deposits => &self.deposits,
        }
    }

    /// Sections in extraction order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, &SectionRule)> {
        Section::ALL.into_iter().map(move |section| (section, self.section(section)))
    }

    pub fn validate(&self, compiler: &PatternCompiler) -> Result<(), RuleError> {
        for (section, rule) in self.sections() {
            rule.validate(section, compiler)?;
        }
        Ok(())
    }
}

impl SubstituteMarkers for RuleSet {
    fn substitute_markers(&mut self, variables: &VariableMap) {
        self.document_start.substitute_markers(variables);
        self.check.substitute_markers(variables);
        self.gross_earnings.substitute_markers(variables);
        self.taxes.substitute_markers(variables);
        self.deductions.substitute_markers(variables);
        self.deposits.substitute_markers(variables);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_rule_shorthand() {
        let rule: FieldRule = serde_json::from_str(r#""netPay""#).unwrap();
        assert_eq!(rule, FieldRule::group("netPay"));
        assert!(rule.is_required);
        assert!(!rule.trim);
    }

    #[test]
    fn test_field_rule_object() {
        let rule: FieldRule = serde_json::from_str(
            r#"{"group": "ytd", "alternateGroup": ["ytd_only", "none"], "trim": true, "isRequired": false}"#,
        )
        .unwrap();
        assert_eq!(rule.alternate_group, vec!["ytd_only", "none"]);
        assert!(rule.trim);
        assert!(!rule.is_required);

        let rule: FieldRule =
            serde_json::from_str(r#"{"group": "deposited", "alternateGroup": "no_deposits"}"#).unwrap();
        assert_eq!(rule.alternate_group, vec!["no_deposits"]);
        assert!(rule.is_required);
    }

    #[test]
    fn test_field_rule_rejects_other_shapes() {
        assert!(serde_json::from_str::<FieldRule>("12").is_err());
        assert!(serde_json::from_str::<FieldRule>(r#"{"pattern": "x"}"#).is_err());
    }

    #[test]
    fn test_ordered_map_keeps_source_order() {
        let map: OrderedMap<FieldRule> =
            serde_json::from_str(r#"{"zeta": "z", "alpha": "a", "mid": "m"}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());
    }

    #[test]
    fn test_section_rule_alias_and_validation() {
        let compiler = PatternCompiler::default();
        let rule: SectionRule = serde_json::from_str(
            r#"{"tableHeader": "A", "nextTableHeader": "B", "find": {"x": "x"}, "findPattern": "(?<x>1)"}"#,
        )
        .unwrap();
        assert_eq!(rule.find_pattern, Some(PatternNode::literal("(?<x>1)")));
        assert!(rule.validate(Section::Taxes, &compiler).is_ok());

        let empty_header = SectionRule {
            table_header: PatternNode::List(Vec::new()),
            ..rule.clone()
        };
        let err = empty_header.validate(Section::Taxes, &compiler).unwrap_err();
        assert!(matches!(err, RuleError::InvalidSection { ref section, .. } if section == "taxes"));

        let no_fields = SectionRule {
            find: OrderedMap::new(),
            ..rule
        };
        assert!(no_fields.validate(Section::Deposits, &compiler).is_err());
    }
}
