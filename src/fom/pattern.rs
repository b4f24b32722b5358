//! # Pattern Compiler
//!
//! Path patterns are written with two kinds of placeholders:
//!
//! - `<name>`: an attribute, substituted with a value at completion time
//! - `{name}`: a directory binding, substituted with the binding's own
//!   pattern at compile time (only inside parameter patterns)
//!
//! ```text
//! directories: bids = "<subject>/anat"
//! parameter:   t1   = "{bids}/<subject>_T1w"
//! compiled:           "<subject>/anat/<subject>_T1w"
//! ```
//!
//! A [`CompiledPattern`] only holds literals and attribute placeholders. It
//! formats to a concrete path given attribute values, and builds an anchored
//! [`Matcher`] that recovers those values from a literal path.
//!
//! Attribute values never span a `/`: a free attribute matches one or more
//! characters inside a single path component.

use crate::attributes::{AttributeRegistry, AttributeValues};
use crate::error::SchemaError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([^<>{}]*)>|\{([^<>{}]*)\}").expect("placeholder regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Attribute(String),
    Directory(String),
}

/// Split a raw pattern into literals and placeholders.
pub fn tokenize(raw: &str) -> Result<Vec<Token>, SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidPattern {
        pattern: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut tokens = Vec::new();
    let mut last_end = 0;
    for caps in PLACEHOLDER.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_literal(&mut tokens, &raw[last_end..whole.start()]);
        last_end = whole.end();

        let (name, is_attribute) = match (caps.get(1), caps.get(2)) {
            (Some(attr), _) => (attr.as_str(), true),
            (_, Some(dir)) => (dir.as_str(), false),
            _ => unreachable!("one alternative always matches"),
        };
        if name.trim().is_empty() {
            return Err(invalid("empty placeholder"));
        }
        tokens.push(if is_attribute {
            Token::Attribute(name.to_string())
        } else {
            Token::Directory(name.to_string())
        });
    }
    push_literal(&mut tokens, &raw[last_end..]);

    let stray = tokens.iter().any(|t| match t {
        Token::Literal(text) => text.contains(['<', '>', '{', '}']),
        _ => false,
    });
    if stray {
        return Err(invalid("unbalanced placeholder bracket"));
    }
    Ok(tokens)
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Literal(previous)) = tokens.last_mut() {
        previous.push_str(text);
    } else {
        tokens.push(Token::Literal(text.to_string()));
    }
}

/// A named directory pattern, resolved once per model load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBinding {
    pub name: String,
    pub source: String,
    tokens: Vec<Token>,
}

impl DirectoryBinding {
    pub fn parse(name: &str, raw: &str) -> Result<Self, SchemaError> {
        let tokens = tokenize(raw)?;
        if let Some(Token::Directory(nested)) =
            tokens.iter().find(|t| matches!(t, Token::Directory(_)))
        {
            return Err(SchemaError::NestedDirectory {
                directory: name.to_string(),
                name: nested.clone(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            source: raw.to_string(),
            tokens,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Attribute(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    tokens: Vec<Token>,
    attributes: Vec<String>,
}

impl CompiledPattern {
    /// Expand every `{directory}` of `raw` from `directories`, keeping
    /// `<attribute>` placeholders for value substitution.
    pub fn compile(
        raw: &str,
        directories: &BTreeMap<String, DirectoryBinding>,
    ) -> Result<Self, SchemaError> {
        let mut tokens = Vec::new();
        for token in tokenize(raw)? {
            match token {
                Token::Literal(text) => push_literal(&mut tokens, &text),
                Token::Attribute(name) => tokens.push(Token::Attribute(name)),
                Token::Directory(name) => {
                    let binding =
                        directories
                            .get(&name)
                            .ok_or_else(|| SchemaError::UndeclaredDirectory {
                                pattern: raw.to_string(),
                                name: name.clone(),
                            })?;
                    for inner in &binding.tokens {
                        match inner {
                            Token::Literal(text) => push_literal(&mut tokens, text),
                            other => tokens.push(other.clone()),
                        }
                    }
                }
            }
        }
        Ok(Self::from_tokens(raw.to_string(), tokens))
    }

    fn from_tokens(source: String, tokens: Vec<Token>) -> Self {
        let mut attributes: Vec<String> = Vec::new();
        for token in &tokens {
            if let Token::Attribute(name) = token {
                if !attributes.contains(name) {
                    attributes.push(name.clone());
                }
            }
        }
        Self {
            source,
            tokens,
            attributes,
        }
    }

    /// Substitute fixed attribute values as literals. The substituted
    /// attributes are no longer placeholders of the pattern.
    pub fn with_fixed(self, fixed: &AttributeValues) -> Self {
        if fixed.is_empty() {
            return self;
        }
        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in self.tokens {
            match token {
                Token::Attribute(name) if fixed.contains_key(&name) => {
                    push_literal(&mut tokens, &fixed[&name]);
                }
                Token::Literal(text) => push_literal(&mut tokens, &text),
                other => tokens.push(other),
            }
        }
        Self::from_tokens(self.source, tokens)
    }

    /// The pattern as written in the schema.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Attribute placeholders in order of first appearance.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Number of literal characters, used to rank matchers by specificity.
    pub fn literal_len(&self) -> usize {
        self.tokens
            .iter()
            .map(|t| match t {
                Token::Literal(text) => text.chars().count(),
                _ => 0,
            })
            .sum()
    }

    /// Concrete path for `values`, or `None` if an attribute has no value.
    pub fn format(&self, values: &AttributeValues) -> Option<String> {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Attribute(name) => out.push_str(values.get(name)?),
                Token::Directory(_) => return None,
            }
        }
        Some(out)
    }

    /// Anchored matcher for this pattern followed by `.extension`.
    ///
    /// Attributes with a closed domain in `registry` only match one of their
    /// declared values.
    pub fn matcher(
        &self,
        extension: Option<&str>,
        registry: &AttributeRegistry,
    ) -> Result<Matcher, SchemaError> {
        let mut expr = String::from("^");
        let mut prefixes = Vec::new();
        let mut slots = Vec::new();

        for token in &self.tokens {
            match token {
                Token::Literal(text) => {
                    for (i, piece) in text.split('/').enumerate() {
                        if i > 0 {
                            if expr.len() > 1 {
                                prefixes.push(format!("{expr}$"));
                            }
                            expr.push('/');
                        }
                        expr.push_str(&regex::escape(piece));
                    }
                    slots.push(Slot::Literal(text.clone()));
                }
                Token::Attribute(name) => {
                    let domain = registry
                        .get(name)
                        .and_then(|d| d.values.as_ref())
                        .filter(|values| !values.is_empty())
                        .map(|values| {
                            let mut values = values.clone();
                            values.sort_by_key(|v| std::cmp::Reverse(v.len()));
                            values
                        });
                    match &domain {
                        Some(values) => {
                            let alternatives: Vec<String> =
                                values.iter().map(|v| regex::escape(v)).collect();
                            expr.push_str(&format!("(?:{})", alternatives.join("|")));
                        }
                        None => expr.push_str("[^/]+"),
                    }
                    slots.push(Slot::Attribute {
                        name: name.clone(),
                        domain,
                    });
                }
                Token::Directory(_) => {}
            }
        }
        if let Some(ext) = extension {
            expr.push_str(r"\.");
            expr.push_str(&regex::escape(ext));
            slots.push(Slot::Literal(format!(".{ext}")));
        }
        expr.push('$');

        let build = |source: &str| {
            Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
                pattern: self.source.clone(),
                reason: e.to_string(),
            })
        };
        let regex = build(expr.as_str())?;
        let prefixes = prefixes
            .iter()
            .map(|p| build(p.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let specificity = self.literal_len() + extension.map_or(0, |e| e.chars().count() + 1);
        Ok(Matcher {
            regex,
            prefixes,
            slots,
            extension: extension.map(str::to_string),
            specificity,
        })
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Literal(text) => f.write_str(text)?,
                Token::Attribute(name) => write!(f, "<{name}>")?,
                Token::Directory(name) => write!(f, "{{{name}}}")?,
            }
        }
        Ok(())
    }
}

/// One piece of a matcher: literal text or an attribute slot.
#[derive(Debug, Clone)]
enum Slot {
    Literal(String),
    Attribute {
        name: String,
        /// Declared values, longest first.
        domain: Option<Vec<String>>,
    },
}

/// Assign values to the remaining `slots` so that they spell `rest`.
///
/// Free attributes try every split inside the current path component,
/// longest first. An attribute that is already bound must repeat its value.
fn solve(slots: &[Slot], rest: &str, values: &mut AttributeValues) -> bool {
    let Some((slot, tail)) = slots.split_first() else {
        return rest.is_empty();
    };
    match slot {
        Slot::Literal(text) => rest
            .strip_prefix(text.as_str())
            .is_some_and(|rest| solve(tail, rest, values)),
        Slot::Attribute { name, domain } => {
            if let Some(bound) = values.get(name).cloned() {
                return rest
                    .strip_prefix(bound.as_str())
                    .is_some_and(|rest| solve(tail, rest, values));
            }
            let candidates: Vec<&str> = match domain {
                Some(domain) => domain
                    .iter()
                    .map(String::as_str)
                    .filter(|v| rest.starts_with(v))
                    .collect(),
                None => {
                    let component = rest.split('/').next().unwrap_or_default();
                    let mut splits: Vec<&str> = component
                        .char_indices()
                        .skip(1)
                        .map(|(i, _)| &component[..i])
                        .chain(std::iter::once(component))
                        .filter(|v| !v.is_empty())
                        .collect();
                    splits.reverse();
                    splits
                }
            };
            for value in candidates {
                values.insert(name.clone(), value.to_string());
                if solve(tail, &rest[value.len()..], values) {
                    return true;
                }
            }
            values.remove(name);
            false
        }
    }
}

/// Anchored matcher built from a [`CompiledPattern`].
///
/// The regex accepts every path the pattern could produce if repeated
/// placeholders were independent; [`solve`] then finds values that agree.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    /// One anchored regex per leading directory depth.
    prefixes: Vec<Regex>,
    slots: Vec<Slot>,
    extension: Option<String>,
    specificity: usize,
}

impl Matcher {
    /// Attribute values captured from `path`, or `None` when no assignment
    /// reproduces `path` exactly.
    pub fn captures(&self, path: &str) -> Option<AttributeValues> {
        if !self.regex.is_match(path) {
            return None;
        }
        let mut values = AttributeValues::new();
        solve(&self.slots, path, &mut values).then_some(values)
    }

    /// Whether a path below directory `dir` could match this pattern.
    pub fn may_contain(&self, dir: &str) -> bool {
        let depth = dir.split('/').count();
        self.prefixes
            .get(depth - 1)
            .is_some_and(|prefix| prefix.is_match(dir))
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn specificity(&self) -> usize {
        self.specificity
    }
}
