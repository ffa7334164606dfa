//! Annotation scope collection and classification.
//!
//! Consecutive annotation commands preceding a parameter or field are
//! collected into an ordered scope of (path, value) pairs; the model
//! builder drains the scope when it attaches the next parameter/field.
//! Malformed annotation syntax yields a [`ScopeError`] which the builder
//! records as a diagnostic - never a fatal error.
//!
//! Path classification (element/parameter/association/entity reference) is
//! driven by an [`AnnotationCatalog`] supplied to the analyzer, not by
//! process-wide tables, so dialect variants stay testable.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{dialect, name_key};
use crate::parser::command::unquote;
use crate::parser::{Command, Token, TokenKind};

/// A recoverable problem while grouping annotation declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("annotation is missing a path")]
    MissingPath,
    #[error("annotation '{path}' has a malformed value")]
    MalformedValue { path: SmolStr },
    #[error("unexpected token '{text}' in annotation")]
    UnexpectedToken { text: SmolStr },
}

/// The ordered set of (path, value) pairs accumulated from consecutive
/// annotation commands.
#[derive(Debug, Default)]
pub struct AnnotationScope {
    entries: Vec<(SmolStr, SmolStr)>,
}

impl AnnotationScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one annotation command into the scope.
    ///
    /// Nested record values (`@Anno: { sub: 'x', other: 'y' }`) flatten into
    /// one entry per leaf with dot-joined paths; array values flatten into a
    /// single entry whose value is the joined token text.
    pub fn add(&mut self, command: &Command) -> Result<(), ScopeError> {
        let tokens: Vec<&Token> = command.tokens().iter().filter(|t| t.is_code()).collect();
        let mut cursor = 0;

        if !tokens.first().is_some_and(|t| t.text_equals("@")) {
            return Err(ScopeError::UnexpectedToken {
                text: tokens.first().map(|t| t.text.clone()).unwrap_or_default(),
            });
        }
        cursor += 1;

        let path = match tokens.get(cursor) {
            Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                t.text.clone()
            }
            _ => return Err(ScopeError::MissingPath),
        };
        cursor += 1;

        match tokens.get(cursor) {
            None => {
                // boolean shorthand: `@Anno.flag`
                self.entries.push((path, SmolStr::new("true")));
                Ok(())
            }
            Some(t) if t.text_equals(":") => {
                cursor += 1;
                self.parse_value(&tokens, &mut cursor, &path)
            }
            Some(t) => Err(ScopeError::UnexpectedToken {
                text: t.text.clone(),
            }),
        }
    }

    fn parse_value(
        &mut self,
        tokens: &[&Token],
        cursor: &mut usize,
        path: &SmolStr,
    ) -> Result<(), ScopeError> {
        let Some(token) = tokens.get(*cursor) else {
            return Err(ScopeError::MalformedValue { path: path.clone() });
        };
        if token.text_equals("{") {
            *cursor += 1;
            self.parse_record(tokens, cursor, path)
        } else if token.text_equals("[") {
            let value = join_array(tokens, cursor);
            self.entries.push((path.clone(), value));
            Ok(())
        } else if token.is_literal() {
            self.entries.push((path.clone(), unquote(&token.text)));
            *cursor += 1;
            Ok(())
        } else if matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword) {
            self.entries.push((path.clone(), token.text.clone()));
            *cursor += 1;
            Ok(())
        } else {
            Err(ScopeError::MalformedValue { path: path.clone() })
        }
    }

    /// `{ sub: value, ... }` - every leaf extends the path with a dot.
    fn parse_record(
        &mut self,
        tokens: &[&Token],
        cursor: &mut usize,
        path: &SmolStr,
    ) -> Result<(), ScopeError> {
        loop {
            let Some(token) = tokens.get(*cursor) else {
                return Err(ScopeError::MalformedValue { path: path.clone() });
            };
            if token.text_equals("}") {
                *cursor += 1;
                return Ok(());
            }
            if token.text_equals(",") {
                *cursor += 1;
                continue;
            }
            if !matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword) {
                return Err(ScopeError::UnexpectedToken {
                    text: token.text.clone(),
                });
            }
            let sub_path = SmolStr::new(format!("{path}.{}", token.text));
            *cursor += 1;
            match tokens.get(*cursor) {
                Some(t) if t.text_equals(":") => {
                    *cursor += 1;
                    self.parse_value(tokens, cursor, &sub_path)?;
                }
                // record element without value: boolean shorthand
                Some(t) if t.text_equals(",") || t.text_equals("}") => {
                    self.entries.push((sub_path, SmolStr::new("true")));
                }
                _ => return Err(ScopeError::MalformedValue { path: sub_path }),
            }
        }
    }

    /// Drain the collected entries, resetting the scope.
    pub fn take(&mut self) -> Vec<(SmolStr, SmolStr)> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn join_array(tokens: &[&Token], cursor: &mut usize) -> SmolStr {
    let mut depth = 0u32;
    let mut parts: Vec<&str> = Vec::new();
    while let Some(token) = tokens.get(*cursor) {
        if token.opens_group() {
            depth += 1;
        } else if token.closes_group() {
            depth -= 1;
            if depth == 0 {
                *cursor += 1;
                break;
            }
        } else {
            parts.push(token.text.as_str());
        }
        *cursor += 1;
    }
    SmolStr::new(parts.join(" "))
}

// ============================================================================
// CATALOG
// ============================================================================

/// The sets of annotation paths known to reference elements, parameters,
/// associations, or entities. Passed to the analyzer explicitly; the
/// default carries the dialect's standard vocabulary.
#[derive(Debug, Clone)]
pub struct AnnotationCatalog {
    element_refs: FxHashSet<SmolStr>,
    parameter_refs: FxHashSet<SmolStr>,
    association_refs: FxHashSet<SmolStr>,
    entity_refs: FxHashSet<SmolStr>,
}

impl AnnotationCatalog {
    /// An empty catalog: no path classifies as any reference kind.
    pub fn empty() -> Self {
        Self {
            element_refs: FxHashSet::default(),
            parameter_refs: FxHashSet::default(),
            association_refs: FxHashSet::default(),
            entity_refs: FxHashSet::default(),
        }
    }

    pub fn with_element_refs<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.element_refs.extend(paths.into_iter().map(name_key));
        self
    }

    pub fn with_parameter_refs<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.parameter_refs.extend(paths.into_iter().map(name_key));
        self
    }

    pub fn with_association_refs<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.association_refs.extend(paths.into_iter().map(name_key));
        self
    }

    pub fn with_entity_refs<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.entity_refs.extend(paths.into_iter().map(name_key));
        self
    }

    pub fn is_element_ref(&self, path: &str) -> bool {
        self.element_refs.contains(&name_key(path))
    }

    pub fn is_parameter_ref(&self, path: &str) -> bool {
        self.parameter_refs.contains(&name_key(path))
    }

    pub fn is_association_ref(&self, path: &str) -> bool {
        self.association_refs.contains(&name_key(path))
    }

    pub fn is_entity_ref(&self, path: &str) -> bool {
        self.entity_refs.contains(&name_key(path))
    }
}

impl Default for AnnotationCatalog {
    fn default() -> Self {
        Self::empty()
            .with_element_refs(dialect::ELEMENT_REF_ANNOTATIONS.iter().copied())
            .with_parameter_refs(dialect::PARAMETER_REF_ANNOTATIONS.iter().copied())
            .with_association_refs(dialect::ASSOCIATION_REF_ANNOTATIONS.iter().copied())
            .with_entity_refs(dialect::ENTITY_REF_ANNOTATIONS.iter().copied())
    }
}
