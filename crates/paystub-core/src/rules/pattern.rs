//! Pattern fragments and the compiler that flattens them into regex source.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::markers;
use crate::error::RuleError;

/// Column separator used by the text renderer when none is configured.
pub const DEFAULT_COLUMN_SEPARATOR: &str = " | ";

/// Non-greedy wildcard used by the `any-text` join.
pub const ANY_TEXT: &str = ".*?";

/// A recursive regex fragment.
///
/// Leaves are raw regex source. Lists join their children with the join rule
/// of the nearest enclosing composite; composites carry their own join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternNode {
    Literal(String),
    List(Vec<PatternNode>),
    Composite(CompositePattern),
}

/// A `{ join, values }` pattern node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawComposite")]
pub struct CompositePattern {
    pub join: Join,
    pub values: Vec<PatternNode>,
}

#[derive(Deserialize)]
struct RawComposite {
    #[serde(default, alias = "join_type")]
    join: Option<Join>,
    #[serde(default)]
    join_string: Option<String>,
    values: Vec<PatternNode>,
}

impl From<RawComposite> for CompositePattern {
    fn from(raw: RawComposite) -> Self {
        let join = match raw.join_string {
            Some(literal) => Join::Literal(literal),
            None => raw.join.unwrap_or_default(),
        };
        Self {
            join,
            values: raw.values,
        }
    }
}

/// How compiled child fragments are joined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Join {
    /// Plain concatenation.
    None,
    /// A single literal space.
    Space,
    /// Non-greedy "anything in between".
    #[serde(alias = "any")]
    AnyText,
    /// The document's column separator.
    #[default]
    #[serde(alias = "line-element")]
    LineSeparator,
    /// A caller supplied regex fragment.
    Literal(String),
}

impl PatternNode {
    /// Shorthand for a literal leaf.
    pub fn literal(source: impl Into<String>) -> Self {
        PatternNode::Literal(source.into())
    }

    /// Shorthand for a composite node.
    pub fn composite(join: Join, values: Vec<PatternNode>) -> Self {
        PatternNode::Composite(CompositePattern { join, values })
    }

    /// The literal source if this node is a leaf.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            PatternNode::Literal(source) => Some(source),
            _ => None,
        }
    }

    /// Visit every string leaf, including literal join strings.
    pub(crate) fn for_each_literal_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        match self {
            PatternNode::Literal(source) => f(source),
            PatternNode::List(values) => {
                for value in values {
                    value.for_each_literal_mut(f);
                }
            }
            PatternNode::Composite(composite) => {
                if let Join::Literal(literal) = &mut composite.join {
                    f(literal);
                }
                for value in &mut composite.values {
                    value.for_each_literal_mut(f);
                }
            }
        }
    }
}

impl From<&str> for PatternNode {
    fn from(source: &str) -> Self {
        PatternNode::Literal(source.to_string())
    }
}

impl From<String> for PatternNode {
    fn from(source: String) -> Self {
        PatternNode::Literal(source)
    }
}

/// Flattens [`PatternNode`] trees into regex source strings.
#[derive(Debug, Clone)]
pub struct PatternCompiler {
    line_separator: String,
}

impl PatternCompiler {
    /// Create a compiler whose `line-separator` join matches `column_separator` literally.
    pub fn new(column_separator: &str) -> Self {
        Self {
            line_separator: regex::escape(column_separator),
        }
    }

    /// The regex source inserted by the `line-separator` join.
    pub fn line_separator(&self) -> &str {
        &self.line_separator
    }

    /// Compile a node. A top-level list joins with the line separator.
    ///
    /// Literals are returned unchanged; nothing is escaped.
    pub fn compile(&self, node: &PatternNode) -> String {
        self.compile_with(node, &Join::LineSeparator)
    }

    fn compile_with(&self, node: &PatternNode, enclosing: &Join) -> String {
        match node {
            PatternNode::Literal(source) => source.clone(),
            PatternNode::List(values) => self.join(values, enclosing),
            PatternNode::Composite(composite) => self.join(&composite.values, &composite.join),
        }
    }

    fn join(&self, values: &[PatternNode], join: &Join) -> String {
        values
            .iter()
            .map(|value| self.compile_with(value, join))
            .collect::<Vec<_>>()
            .join(self.joiner(join))
    }

    fn joiner<'a>(&'a self, join: &'a Join) -> &'a str {
        match join {
            Join::None => "",
            Join::Space => " ",
            Join::AnyText => ANY_TEXT,
            Join::LineSeparator => &self.line_separator,
            Join::Literal(literal) => literal,
        }
    }
}

impl Default for PatternCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN_SEPARATOR)
    }
}

/// Build a case-insensitive, multi-line, dot-matches-newline regex.
///
/// Markers left unresolved are escaped so they match only their own literal text.
pub fn build_regex(pattern: &str, context: &str) -> Result<Regex, RuleError> {
    let source = markers::escape_unresolved(pattern);
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| RuleError::InvalidPattern {
            context: context.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
