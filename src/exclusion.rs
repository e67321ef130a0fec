//! Exclusion rules for keeping files out of archives and hashes
//!
//! Rules are plain strings taken from configuration. Each rule is normalised
//! once and classified by its wildcard markers and whether it names a path:
//!
//! | Rule                       | Kind          | Matches when                      |
//! |----------------------------|---------------|-----------------------------------|
//! | `session.lock`             | file name     | final segment is equal            |
//! | `world/region/r.0.0.mca`   | relative path | whole relative path is equal      |
//! | `*.log`                    | ends with     | relative path ends with `.log`    |
//! | `temp/*`                   | starts with   | relative path starts with `temp/` |
//! | `*cache*`                  | contains      | relative path contains `cache`    |
//!
//! Relative paths are always compared in forward-slash form, so rules written
//! with either separator behave the same on every platform.

use std::path::Path;

const WILDCARD: char = '*';
const SEPARATOR: char = '/';

/// How a single rule is compared against a relative path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    FileName,
    RelativePath,
    Contains,
    EndsWith,
    StartsWith,
}

/// A normalised exclusion rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    /// The rule as written in configuration
    pub raw: String,
    /// Pattern with separators normalised and wildcard markers removed
    pub pattern: String,
    pub kind: RuleKind,
}

impl ExclusionRule {
    /// Parse a rule string into its normalised form
    pub fn parse(raw: &str) -> Self {
        let mut pattern = raw.replace('\\', "/");

        let leading = pattern.starts_with(WILDCARD);
        if leading {
            pattern.remove(0);
        }

        let trailing = pattern.ends_with(WILDCARD);
        if trailing {
            pattern.pop();
        }

        let wildcard = leading || trailing;
        let names_path = pattern.contains(SEPARATOR);

        // Relative paths never carry a leading separator
        if !leading && pattern.starts_with(SEPARATOR) {
            pattern.remove(0);
        }

        let kind = match (names_path, wildcard) {
            (false, false) => RuleKind::FileName,
            (true, false) => RuleKind::RelativePath,
            _ if leading && trailing => RuleKind::Contains,
            _ if leading => RuleKind::EndsWith,
            _ => RuleKind::StartsWith,
        };

        Self {
            raw: raw.to_string(),
            pattern,
            kind,
        }
    }

    /// Check a forward-slash relative path against this rule
    pub fn matches(&self, relative: &str) -> bool {
        match self.kind {
            RuleKind::FileName => file_name(relative) == self.pattern,
            RuleKind::RelativePath => relative == self.pattern,
            RuleKind::Contains => relative.contains(self.pattern.as_str()),
            RuleKind::EndsWith => relative.ends_with(self.pattern.as_str()),
            RuleKind::StartsWith => relative.starts_with(self.pattern.as_str()),
        }
    }
}

/// An ordered set of exclusion rules
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    rules: Vec<ExclusionRule>,
}

impl ExclusionMatcher {
    /// Build a matcher from configured rule strings, keeping their order
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| ExclusionRule::parse(rule.as_ref()))
                .collect(),
        }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return the first rule matching `relative`, if any
    pub fn matching_rule(&self, relative: &str) -> Option<&ExclusionRule> {
        let relative = normalize_separators(relative);
        self.rules.iter().find(|rule| rule.matches(&relative))
    }

    /// Whether `relative` is excluded by any rule
    pub fn matches(&self, relative: &str) -> bool {
        self.matching_rule(relative).is_some()
    }
}

/// One-shot form of [`ExclusionMatcher::matches`]
pub fn matches<S: AsRef<str>>(relative: &str, rules: &[S]) -> bool {
    ExclusionMatcher::new(rules).matches(relative)
}

/// Whether `path` equals `parent` or lies anywhere beneath it
pub fn is_child_of(path: &Path, parent: &Path) -> bool {
    let mut current = Some(path);
    while let Some(candidate) = current {
        if candidate == parent {
            return true;
        }
        current = candidate.parent();
    }
    false
}

fn normalize_separators(relative: &str) -> std::borrow::Cow<'_, str> {
    if relative.contains('\\') {
        std::borrow::Cow::Owned(relative.replace('\\', "/"))
    } else {
        std::borrow::Cow::Borrowed(relative)
    }
}

fn file_name(relative: &str) -> &str {
    relative.rsplit(SEPARATOR).next().unwrap_or(relative)
}
