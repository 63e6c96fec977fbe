// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shading rules.
//!
//! A rules file has one rule per line:
//!
//! ```text
//! rule <pattern> <replacement>
//! keep <pattern>
//! ```
//!
//! Patterns are globs over fully-qualified class names. `**` matches any run of characters and
//! captures it; captures are numbered from 1 in the order they appear. `*`, `?` and `[...]`
//! match as in shell globs but don't capture. In the replacement, `@N` is replaced with the Nth
//! capture.
//!
//! `keep` rules are accepted and ignored, since rewriting never removes anything. `zap` rules
//! are rejected. Lines with any other kind are ignored with a warning.

use crate::errors::{RuleParseError, RuleParseErrorKind};
use regex::Regex;
use std::borrow::Cow;
use tracing::warn;

/// A compiled `rule <pattern> <replacement>` line.
#[derive(Clone, Debug)]
pub struct ShadeRule {
    pattern: String,
    replacement: String,
    regex: Regex,
    template: Template,
}

impl ShadeRule {
    /// Compiles a rule.
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleParseErrorKind> {
        let pattern = pattern.into();
        let replacement = replacement.into();

        let (regex_str, group_count) = glob_to_regex(&pattern);
        let regex = Regex::new(&regex_str).map_err(|err| RuleParseErrorKind::InvalidPattern {
            pattern: pattern.clone(),
            err,
        })?;
        let template = Template::parse(&replacement, group_count)?;

        Ok(Self {
            pattern,
            replacement,
            regex,
            template,
        })
    }

    /// Returns the pattern as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the replacement as written.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Returns the rewritten name, or `None` if the rule doesn't match.
    pub fn apply(&self, name: &str) -> Option<String> {
        let captures = self.regex.captures(name)?;
        Some(self.template.expand(|group| {
            captures
                .get(group + 1)
                .map_or("", |capture| capture.as_str())
        }))
    }
}

/// A replacement split into literal pieces and the groups that go between them.
///
/// `pieces` always has one more element than `groups`.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Template {
    pieces: Vec<String>,
    // Zero-based capture indexes.
    groups: Vec<usize>,
}

impl Template {
    fn parse(replacement: &str, group_count: usize) -> Result<Self, RuleParseErrorKind> {
        let mut pieces = Vec::new();
        let mut groups = Vec::new();
        let mut current = String::new();

        let mut rest = replacement;
        while let Some(at) = rest.find('@') {
            current.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            let digits_len = after
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after.len());
            if digits_len == 0 {
                // A lone `@` is literal.
                current.push('@');
                rest = after;
                continue;
            }

            let digits = &after[..digits_len];
            let index = match digits.parse::<usize>() {
                Ok(index) if index > 0 => index,
                _ => {
                    return Err(RuleParseErrorKind::InvalidBackreference {
                        token: format!("@{digits}"),
                    });
                }
            };
            if index > group_count {
                return Err(RuleParseErrorKind::BackreferenceOutOfRange { index, group_count });
            }

            pieces.push(std::mem::take(&mut current));
            groups.push(index - 1);
            rest = &after[digits_len..];
        }
        current.push_str(rest);
        pieces.push(current);

        Ok(Self { pieces, groups })
    }

    fn expand<'a>(&self, mut group: impl FnMut(usize) -> &'a str) -> String {
        let mut out = self.pieces[0].clone();
        for (index, piece) in self.groups.iter().zip(&self.pieces[1..]) {
            out.push_str(group(*index));
            out.push_str(piece);
        }
        out
    }
}

/// Translates a glob into an anchored regex, returning the number of capture groups.
fn glob_to_regex(glob: &str) -> (String, usize) {
    let mut out = String::from("^");
    let mut group_count = 0;
    let mut chars = glob.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '*' => {
                if chars.next_if(|(_, c)| *c == '*').is_some() {
                    out.push_str("(.*)");
                    group_count += 1;
                } else {
                    out.push_str(".*");
                }
            }
            '?' => out.push('.'),
            '[' => match glob[idx + 1..].find(']') {
                Some(len) if len > 0 => {
                    let class = &glob[idx + 1..idx + 1 + len];
                    let (negated, class) = match class.strip_prefix('!') {
                        Some(rest) => (true, rest),
                        None => (false, class),
                    };
                    out.push('[');
                    if negated {
                        out.push('^');
                    }
                    for c in class.chars() {
                        // Escape everything but ranges.
                        if c == '-' {
                            out.push('-');
                        } else {
                            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                        }
                    }
                    out.push(']');
                    // Skip past the class and its closing bracket.
                    while chars.next_if(|(i, _)| *i <= idx + 1 + len).is_some() {}
                }
                _ => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    (out, group_count)
}

/// An ordered list of shading rules.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<ShadeRule>,
    keep_patterns: Vec<String>,
}

impl RuleSet {
    /// Parses a rules file.
    ///
    /// A `zap` rule, or a `rule` or `keep` line with the wrong number of tokens, fails the whole
    /// parse.
    pub fn parse(text: &str) -> Result<Self, RuleParseError> {
        let mut rules = Vec::new();
        let mut keep_patterns = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            let tokens: Vec<_> = line.split_whitespace().collect();
            let Some(&kind) = tokens.first() else {
                continue;
            };
            let err = |error_kind| RuleParseError::new(line_number, line.trim(), error_kind);

            match kind {
                "rule" => match tokens[..] {
                    [_, pattern, replacement] => {
                        rules.push(ShadeRule::new(pattern, replacement).map_err(err)?);
                    }
                    _ => {
                        return Err(err(RuleParseErrorKind::WrongTokenCount {
                            kind: "rule",
                            expected: 3,
                            found: tokens.len(),
                        }));
                    }
                },
                "keep" => match tokens[..] {
                    [_, pattern] => keep_patterns.push(pattern.to_owned()),
                    _ => {
                        return Err(err(RuleParseErrorKind::WrongTokenCount {
                            kind: "keep",
                            expected: 2,
                            found: tokens.len(),
                        }));
                    }
                },
                "zap" => return Err(err(RuleParseErrorKind::UnsupportedZap)),
                other => {
                    warn!("line {line_number}: ignoring unknown rule kind `{other}`");
                }
            }
        }

        Ok(Self {
            rules,
            keep_patterns,
        })
    }

    /// Returns the `rule` rules in file order.
    pub fn rules(&self) -> &[ShadeRule] {
        &self.rules
    }

    /// Returns the patterns of `keep` rules, which have no effect on renaming.
    pub fn keep_patterns(&self) -> &[String] {
        &self.keep_patterns
    }

    /// Returns true if there are no renaming rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Renames a class with the first matching rule, or returns it unchanged.
    pub fn shade_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(name))
            .map_or(Cow::Borrowed(name), Cow::Owned)
    }
}
