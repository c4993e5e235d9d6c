//! `{{name}}` placeholder scanning and single-pass substitution.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The substitution pattern could not be compiled (size limits only; names
    /// are always escaped).
    #[error("template pattern could not be built: {0}")]
    Pattern(String),
}

/// The literal token for `name`, e.g. `{{ruc_emisor}}`.
pub fn token(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// Distinct placeholder names in `text`, in first-seen order.
///
/// Each `}}` closes the nearest `{{` before it, the same match substitution
/// makes, so `{{{name}}}` yields `name`.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(close) = rest.find("}}") {
        let before = &rest[..close];
        rest = &rest[close + 2..];
        let Some(open) = before.rfind("{{") else { continue };
        let name = &before[open + 2..];
        if name.is_empty() || name.contains('\n') {
            continue;
        }
        if seen.insert(name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Result of a substitution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub text: String,
    /// Names that occurred in the text and were replaced.
    pub replaced: HashSet<String>,
}

/// Replace every `{{name}}` for the given `(name, value)` pairs in one pass.
///
/// Names are matched literally (regex-escaped), case-sensitively. Inserted
/// values are never re-scanned, so a value containing `{{other}}` stays as
/// written. When two pairs share a name the first one wins; pairs with an
/// empty name are ignored.
pub fn substitute(text: &str, values: &[(String, String)]) -> Result<Substituted, TemplateError> {
    let mut by_token: HashMap<String, (&str, &str)> = HashMap::with_capacity(values.len());
    for (name, value) in values.iter().filter(|(name, _)| !name.is_empty()) {
        by_token
            .entry(token(name))
            .or_insert((name.as_str(), value.as_str()));
    }

    if by_token.is_empty() {
        return Ok(Substituted {
            text: text.to_string(),
            replaced: HashSet::new(),
        });
    }

    // Longest token first so overlapping names prefer the most specific match.
    let mut tokens: Vec<&String> = by_token.keys().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let pattern = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let re = Regex::new(&pattern).map_err(|e| TemplateError::Pattern(e.to_string()))?;

    let mut replaced = HashSet::new();
    let out = re.replace_all(text, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        match by_token.get(matched) {
            Some((name, value)) => {
                replaced.insert((*name).to_string());
                (*value).to_string()
            }
            None => matched.to_string(),
        }
    });

    Ok(Substituted {
        text: out.into_owned(),
        replaced,
    })
}
