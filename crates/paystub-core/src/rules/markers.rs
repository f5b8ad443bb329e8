//! `{{name}}` marker substitution.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use super::pattern::{PatternCompiler, PatternNode};
use super::schema::OrderedMap;

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").unwrap();
}

/// Flat variable map produced by [`compile_variables`].
pub type VariableMap = HashMap<String, String>;

/// Types whose string leaves can carry markers.
pub trait SubstituteMarkers {
    /// Replace every resolvable marker in every string leaf.
    fn substitute_markers(&mut self, variables: &VariableMap);
}

impl SubstituteMarkers for PatternNode {
    fn substitute_markers(&mut self, variables: &VariableMap) {
        self.for_each_literal_mut(&mut |leaf| {
            *leaf = substitute(leaf, |name| variables.get(name).map(String::as_str));
        });
    }
}

impl SubstituteMarkers for String {
    fn substitute_markers(&mut self, variables: &VariableMap) {
        *self = substitute(self, |name| variables.get(name).map(String::as_str));
    }
}

/// Replace each marker whose name `lookup` resolves. Unknown markers stay verbatim.
pub fn substitute<'a, F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    if !text.contains("{{") {
        return text.to_string();
    }
    MARKER
        .replace_all(text, |caps: &Captures| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names of the markers still present in `text`.
pub fn unresolved(text: &str) -> Vec<String> {
    MARKER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Escape remaining markers so a regex treats them as literal text.
pub fn escape_unresolved(pattern: &str) -> String {
    MARKER
        .replace_all(pattern, |caps: &Captures| regex::escape(&caps[0]))
        .into_owned()
}

/// Substitute variables into each other, in document order.
///
/// Only literal variables are substituted. A single pass is made, so a variable
/// sees the already expanded form of the entries before it and the raw form of
/// the entries after it.
pub fn expand_variables(variables: &mut OrderedMap<PatternNode>) {
    for index in 0..variables.len() {
        let Some(slot) = variables.value_at_mut(index) else {
            continue;
        };
        let mut node = std::mem::replace(slot, PatternNode::List(Vec::new()));
        {
            let lookup = |name: &str| variables.get(name).and_then(PatternNode::as_literal);
            node.for_each_literal_mut(&mut |leaf| {
                *leaf = substitute(leaf, lookup);
            });
        }
        if let Some(slot) = variables.value_at_mut(index) {
            *slot = node;
        }
    }
    trace!("Expanded {} variables", variables.len());
}

/// Compile every variable into its final regex source.
pub fn compile_variables(
    variables: &OrderedMap<PatternNode>,
    compiler: &PatternCompiler,
) -> VariableMap {
    let compiled: VariableMap = variables
        .iter()
        .map(|(name, node)| (name.clone(), compiler.compile(node)))
        .collect();
    debug!("Compiled {} variables", compiled.len());
    compiled
}
