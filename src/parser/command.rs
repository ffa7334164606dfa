//! Command segmentation and classification.
//!
//! A source file is carved into an ordered sequence of commands, and every
//! command is classified exactly once into a [`CommandKind`] variant. The
//! semantic layer matches on the variant instead of re-inspecting keywords,
//! which keeps the dialect grammar in one place.
//!
//! Segmentation is clause-driven: entity declarations, parameter
//! declarations, FROM/JOIN/ASSOCIATION clauses, UNION-class introducers,
//! annotations, and select-list elements each become their own command.

use smol_str::SmolStr;

use super::lexer::tokenize;
use super::token::{Token, TokenKind};

/// Classification of one command, computed once at segmentation time.
///
/// Token payloads are indices into the owning command's token vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// A standalone comment line.
    Comment,
    /// An annotation declaration (`@Path.sub: value`).
    Annotation,
    /// `define [root] view [entity] <name>` or `extend view entity <name>`.
    EntityDeclaration { name: usize, is_view_entity: bool },
    /// `union [all]`, `except`, or `intersect` - introduces a new view part.
    UnionBranch,
    /// One parameter declaration (`P_Date : abap.dats`).
    ParameterDecl,
    /// `[as] select [distinct] from <source> [as <alias>]`.
    FromClause { source: usize },
    /// A join clause; `target` is the joined entity.
    Join { target: usize },
    /// An association declaration; `target` is the association target entity.
    Association { target: usize },
    /// One select-list element.
    SelectElement,
    /// Anything else (braces, WHERE/GROUP BY clauses, unknown statements).
    Other,
}

/// One classified command with its tokens.
#[derive(Debug, Clone)]
pub struct Command {
    pub kind: CommandKind,
    tokens: Vec<Token>,
    /// Group nesting depth per token; openers sit on the outer level and
    /// *their contents* one level deeper, closers back on the outer level.
    depths: Vec<u16>,
}

impl Command {
    pub(crate) fn new(kind: CommandKind, tokens: Vec<Token>) -> Self {
        let mut depths = Vec::with_capacity(tokens.len());
        let mut depth: u16 = 0;
        for token in &tokens {
            if token.closes_group() {
                depth = depth.saturating_sub(1);
            }
            depths.push(depth);
            if token.opens_group() {
                depth += 1;
            }
        }
        Self {
            kind,
            tokens,
            depths,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    pub fn is_comment_line(&self) -> bool {
        self.kind == CommandKind::Comment
    }

    /// Index of the first code (non-comment) token.
    pub fn first_code(&self) -> Option<usize> {
        self.tokens.iter().position(Token::is_code)
    }

    /// Index of the last code (non-comment) token.
    pub fn last_code(&self) -> Option<usize> {
        self.tokens.iter().rposition(Token::is_code)
    }

    /// Next code token in plain order, descending into groups.
    pub fn next_code(&self, index: usize) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, t)| t.is_code())
            .map(|(i, _)| i)
    }

    /// Next code token on the same group level, skipping balanced groups.
    ///
    /// Returns `None` when the current group ends before another sibling.
    pub fn next_code_sibling(&self, index: usize) -> Option<usize> {
        let level = self.depths[index];
        for i in index + 1..self.tokens.len() {
            if !self.tokens[i].is_code() {
                continue;
            }
            if self.depths[i] < level {
                return None;
            }
            if self.depths[i] == level {
                return Some(i);
            }
        }
        None
    }

    /// Previous code token on the same group level.
    pub fn prev_code_sibling(&self, index: usize) -> Option<usize> {
        let level = self.depths[index];
        for i in (0..index).rev() {
            if !self.tokens[i].is_code() {
                continue;
            }
            if self.depths[i] < level {
                return None;
            }
            if self.depths[i] == level {
                return Some(i);
            }
        }
        None
    }

    /// First code token inside the group opened at `index`.
    pub fn first_child(&self, index: usize) -> Option<usize> {
        if !self.tokens[index].opens_group() {
            return None;
        }
        let level = self.depths[index];
        for i in index + 1..self.tokens.len() {
            if !self.tokens[i].is_code() {
                continue;
            }
            if self.depths[i] <= level {
                return None;
            }
            if self.depths[i] == level + 1 {
                return Some(i);
            }
        }
        None
    }

    /// Last sibling matching the given keyword, starting after `index`.
    pub fn find_last_keyword_sibling(&self, index: usize, keyword: &str) -> Option<usize> {
        let mut found = None;
        let mut cursor = self.next_code_sibling(index);
        while let Some(i) = cursor {
            if self.tokens[i].is_keyword(keyword) {
                found = Some(i);
            }
            cursor = self.next_code_sibling(i);
        }
        found
    }
}

/// The classified command sequence of one source file.
#[derive(Debug, Clone)]
pub struct CommandSeq {
    pub commands: Vec<Command>,
    /// True when the source declares at least one view/entity; the model
    /// builder ignores sequences that do not.
    pub is_view_ddl: bool,
}

/// Tokenize and segment a source text into classified commands.
pub fn parse_source(text: &str) -> CommandSeq {
    let tokens = tokenize(text);
    segment(tokens)
}

const JOIN_STARTERS: &[&str] = &["INNER", "LEFT", "RIGHT", "CROSS", "JOIN"];
const UNION_STARTERS: &[&str] = &["UNION", "EXCEPT", "INTERSECT"];

fn segment(tokens: Vec<Token>) -> CommandSeq {
    let mut commands = Vec::new();
    let mut i = 0;
    let mut in_select_list = false;
    let n = tokens.len();

    while i < n {
        let t = &tokens[i];

        if t.is_comment() {
            commands.push(Command::new(CommandKind::Comment, vec![t.clone()]));
            i += 1;
        } else if t.text_equals("@") {
            let end = annotation_end(&tokens, i);
            commands.push(Command::new(
                CommandKind::Annotation,
                tokens[i..end].to_vec(),
            ));
            i = end;
        } else if in_select_list {
            if t.text_equals("}") {
                commands.push(Command::new(CommandKind::Other, vec![t.clone()]));
                in_select_list = false;
                i += 1;
            } else {
                let (end, next) = element_end(&tokens, i);
                commands.push(Command::new(
                    CommandKind::SelectElement,
                    tokens[i..end].to_vec(),
                ));
                i = next;
            }
        } else if t.text_equals("{") {
            commands.push(Command::new(CommandKind::Other, vec![t.clone()]));
            in_select_list = true;
            i += 1;
        } else if t.is_any_keyword(&["DEFINE", "EXTEND"]) {
            let end = clause_end(&tokens, i + 1);
            let slice = tokens[i..end].to_vec();
            let kind = classify_entity_declaration(&slice);
            commands.push(Command::new(kind, slice));
            i = end;
        } else if t.is_keyword("WITH") && next_is_keyword(&tokens, i, "PARAMETERS") {
            let params_kw = next_code_index(&tokens, i).unwrap_or(i);
            commands.push(Command::new(
                CommandKind::Other,
                tokens[i..=params_kw].to_vec(),
            ));
            i = params_kw + 1;
            i = carve_parameters(&tokens, i, &mut commands);
        } else if starts_from_clause(&tokens, i) {
            // scan past the select keyword so an `as select` starter is not
            // cut at its own clause boundary
            let select_idx = if t.is_keyword("SELECT") {
                i
            } else {
                next_code_index(&tokens, i).unwrap_or(i)
            };
            let end = clause_end(&tokens, select_idx + 1);
            let slice = tokens[i..end].to_vec();
            let kind = classify_from_clause(&slice);
            commands.push(Command::new(kind, slice));
            i = end;
        } else if t.is_any_keyword(JOIN_STARTERS) {
            let end = clause_end(&tokens, i + 1);
            let slice = tokens[i..end].to_vec();
            let kind = classify_join(&slice);
            commands.push(Command::new(kind, slice));
            i = end;
        } else if t.is_keyword("ASSOCIATION") {
            let end = clause_end(&tokens, i + 1);
            let slice = tokens[i..end].to_vec();
            let kind = classify_association(&slice);
            commands.push(Command::new(kind, slice));
            i = end;
        } else if t.is_any_keyword(UNION_STARTERS) {
            let mut end = i + 1;
            if next_is_keyword(&tokens, i, "ALL") {
                end = next_code_index(&tokens, i).map_or(end, |j| j + 1);
            }
            commands.push(Command::new(CommandKind::UnionBranch, tokens[i..end].to_vec()));
            i = end;
        } else {
            let end = clause_end(&tokens, i + 1);
            commands.push(Command::new(CommandKind::Other, tokens[i..end].to_vec()));
            i = end;
        }
    }

    let is_view_ddl = commands
        .iter()
        .any(|c| matches!(c.kind, CommandKind::EntityDeclaration { .. }));
    CommandSeq {
        commands,
        is_view_ddl,
    }
}

fn next_code_index(tokens: &[Token], index: usize) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, t)| t.is_code())
        .map(|(i, _)| i)
}

fn next_is_keyword(tokens: &[Token], index: usize, keyword: &str) -> bool {
    next_code_index(tokens, index).is_some_and(|j| tokens[j].is_keyword(keyword))
}

/// `as select ...` or a bare `select ...` (after a union introducer).
fn starts_from_clause(tokens: &[Token], index: usize) -> bool {
    let t = &tokens[index];
    t.is_keyword("SELECT") || (t.is_keyword("AS") && next_is_keyword(tokens, index, "SELECT"))
}

/// True when a new clause begins at `index` on group level zero.
fn is_clause_start(tokens: &[Token], index: usize) -> bool {
    let t = &tokens[index];
    t.text_equals_any(&["{", "}", "@"])
        || t.is_any_keyword(&[
            "DEFINE",
            "EXTEND",
            "WITH",
            "ASSOCIATION",
            "WHERE",
            "GROUP",
            "HAVING",
        ])
        || t.is_any_keyword(JOIN_STARTERS)
        || t.is_any_keyword(UNION_STARTERS)
        || starts_from_clause(tokens, index)
}

/// Scan forward to the next clause boundary on group level zero.
fn clause_end(tokens: &[Token], mut index: usize) -> usize {
    let mut depth: u32 = 0;
    while index < tokens.len() {
        let t = &tokens[index];
        // select-list braces are clause boundaries, not nested groups here
        if depth == 0 && is_clause_start(tokens, index) {
            return index;
        }
        if t.opens_group() {
            depth += 1;
        } else if t.closes_group() {
            if depth == 0 {
                return index; // stray closer belongs to the enclosing context
            }
            depth -= 1;
        }
        index += 1;
    }
    index
}

/// End of an annotation command: `@` path [`:` value].
fn annotation_end(tokens: &[Token], start: usize) -> usize {
    let n = tokens.len();
    let mut i = start + 1;
    if i < n && matches!(tokens[i].kind, TokenKind::Identifier | TokenKind::Keyword) {
        i += 1;
    }
    if i < n && tokens[i].text_equals(":") {
        i += 1;
        i = annotation_value_end(tokens, i);
    }
    i
}

/// End of one annotation value: a literal, an identifier, or a balanced
/// `{...}` / `[...]` group.
fn annotation_value_end(tokens: &[Token], i: usize) -> usize {
    if i >= tokens.len() {
        return i;
    }
    let t = &tokens[i];
    if t.opens_group() {
        skip_group(tokens, i)
    } else if t.is_literal() || t.is_identifier() {
        i + 1
    } else {
        // malformed; the scope collector reports it
        i
    }
}

/// Index just past the closer matching the opener at `open`.
fn skip_group(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0u32;
    let mut i = open;
    while i < tokens.len() {
        if tokens[i].opens_group() {
            depth += 1;
        } else if tokens[i].closes_group() {
            depth -= 1;
            if depth == 0 {
                return i + 1;
            }
        }
        i += 1;
    }
    i
}

/// Carve parameter declarations until the next clause begins.
fn carve_parameters(tokens: &[Token], mut i: usize, commands: &mut Vec<Command>) -> usize {
    let n = tokens.len();
    while i < n {
        if tokens[i].is_comment() {
            commands.push(Command::new(CommandKind::Comment, vec![tokens[i].clone()]));
            i += 1;
            continue;
        }
        if tokens[i].text_equals("@") {
            let end = annotation_end(tokens, i);
            commands.push(Command::new(CommandKind::Annotation, tokens[i..end].to_vec()));
            i = end;
            continue;
        }
        if is_clause_start(tokens, i) {
            return i;
        }
        // one parameter up to a level-zero comma
        let mut j = i;
        let mut depth = 0u32;
        while j < n {
            let t = &tokens[j];
            if t.opens_group() {
                depth += 1;
            } else if t.closes_group() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && (t.text_equals(",") || is_clause_start(tokens, j)) {
                break;
            }
            j += 1;
        }
        commands.push(Command::new(CommandKind::ParameterDecl, tokens[i..j].to_vec()));
        i = j;
        if i < n && tokens[i].text_equals(",") {
            i += 1;
        }
    }
    i
}

/// End of one select-list element: a level-zero `,` (consumed) or `}` (left).
fn element_end(tokens: &[Token], start: usize) -> (usize, usize) {
    let mut depth = 0u32;
    let mut i = start;
    while i < tokens.len() {
        let t = &tokens[i];
        if t.opens_group() {
            depth += 1;
        } else if t.text_equals("}") && depth == 0 {
            return (i, i);
        } else if t.closes_group() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && t.text_equals(",") {
            return (i, i + 1);
        }
        i += 1;
    }
    (i, i)
}

fn classify_entity_declaration(tokens: &[Token]) -> CommandKind {
    let view_pos = tokens.iter().position(|t| t.is_keyword("VIEW"));
    if let Some(view_pos) = view_pos {
        if let Some(next) = next_code_index(tokens, view_pos) {
            if tokens[next].is_keyword("ENTITY") {
                if let Some(name) = next_code_index(tokens, next) {
                    if tokens[name].is_identifier() {
                        return CommandKind::EntityDeclaration {
                            name,
                            is_view_entity: true,
                        };
                    }
                }
            } else if tokens[next].is_identifier() {
                return CommandKind::EntityDeclaration {
                    name: next,
                    is_view_entity: false,
                };
            }
        }
    }
    CommandKind::Other
}

fn classify_from_clause(tokens: &[Token]) -> CommandKind {
    if let Some(from_pos) = tokens.iter().position(|t| t.is_keyword("FROM")) {
        if let Some(source) = next_code_index(tokens, from_pos) {
            if tokens[source].is_identifier() {
                return CommandKind::FromClause { source };
            }
        }
    }
    CommandKind::Other
}

fn classify_join(tokens: &[Token]) -> CommandKind {
    if let Some(join_pos) = tokens.iter().position(|t| t.is_keyword("JOIN")) {
        if let Some(target) = next_code_index(tokens, join_pos) {
            if tokens[target].is_identifier() {
                return CommandKind::Join { target };
            }
        }
    }
    CommandKind::Other
}

fn classify_association(tokens: &[Token]) -> CommandKind {
    if let Some(to_pos) = tokens.iter().position(|t| t.is_keyword("TO")) {
        if let Some(target) = next_code_index(tokens, to_pos) {
            if tokens[target].is_identifier() {
                return CommandKind::Association { target };
            }
        }
    }
    CommandKind::Other
}

/// Strip surrounding single quotes from a literal value.
pub(crate) fn unquote(text: &str) -> SmolStr {
    let stripped = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);
    SmolStr::new(stripped)
}
