//! Model building: one pass over a file's classified command sequence.
//!
//! Produces views, parameters, data sources, and fields, attaching the
//! annotation scope accumulated ahead of each parameter/field. Field
//! construction derives the output name, the simplified source path, and
//! the usage statistics from the defining expression's tokens.

use smol_str::SmolStr;

use crate::base::dialect;
use crate::parser::{Command, CommandKind, CommandSeq};

use super::annotations::{AnnotationCatalog, AnnotationScope};
use super::diagnostics::{Diagnostic, MALFORMED_ANNOTATION};
use super::model::{Annotation, AnnotationOwner, Model, UsageStats, ViewId};

pub(crate) struct ModelBuilder<'a> {
    model: &'a mut Model,
    catalog: &'a AnnotationCatalog,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(
        model: &'a mut Model,
        catalog: &'a AnnotationCatalog,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            model,
            catalog,
            diagnostics,
        }
    }

    /// Scan one file's commands into the model. No-op for non-DDL sources.
    pub(crate) fn add_file(&mut self, file_name: &str, code: &CommandSeq) {
        if !code.is_view_ddl {
            return;
        }

        let mut main_view: Option<ViewId> = None;
        let mut view: Option<ViewId> = None;
        let mut entity_name = SmolStr::default();
        let mut is_view_entity = false;
        // increased for each UNION / EXCEPT / INTERSECT, which defines new aliases
        let mut view_part: u32 = 0;
        let mut scope = AnnotationScope::new();

        for command in &code.commands {
            match command.kind {
                CommandKind::Comment => continue,

                CommandKind::Annotation => {
                    if let Err(error) = scope.add(command) {
                        let (line, col) = command
                            .first_code()
                            .map(|i| (command.token(i).line, command.token(i).col))
                            .unwrap_or((0, 0));
                        self.diagnostics.push(Diagnostic::warning(
                            file_name,
                            line,
                            col,
                            MALFORMED_ANNOTATION,
                            error.to_string(),
                        ));
                    }
                }

                CommandKind::EntityDeclaration {
                    name,
                    is_view_entity: entity_form,
                } => {
                    entity_name = command.token(name).text.clone();
                    is_view_entity = entity_form;
                    let id = self.model.add_view(
                        SmolStr::new(file_name),
                        entity_name.clone(),
                        is_view_entity,
                        0,
                        None,
                    );
                    self.model.register_entity(&entity_name, id);
                    view = Some(id);
                    main_view = Some(id);
                    scope.clear();
                }

                CommandKind::UnionBranch => {
                    view_part += 1;
                    let branch_name = SmolStr::new(format!("{entity_name}+{view_part}"));
                    // branch views are not registered under the entity name:
                    // they are not independently referenceable
                    let id = self.model.add_view(
                        SmolStr::new(file_name),
                        branch_name,
                        is_view_entity,
                        view_part,
                        main_view,
                    );
                    view = Some(id);
                    scope.clear();
                }

                CommandKind::ParameterDecl => {
                    if let Some(view) = view {
                        self.add_parameter(view, command, &mut scope);
                    }
                }

                CommandKind::FromClause { source } => {
                    if let Some(view) = view {
                        self.add_data_source(view, command, source, false, false);
                    }
                    scope.clear();
                }

                CommandKind::Join { target } => {
                    if let Some(view) = view {
                        self.add_data_source(view, command, target, true, false);
                    }
                    scope.clear();
                }

                CommandKind::Association { target } => {
                    if let Some(view) = view {
                        self.add_data_source(view, command, target, false, true);
                    }
                    scope.clear();
                }

                CommandKind::SelectElement => {
                    if let Some(view) = view {
                        self.add_field(view, command, &mut scope);
                    }
                }

                CommandKind::Other => scope.clear(),
            }
        }
    }

    fn add_data_source(
        &mut self,
        view: ViewId,
        command: &Command,
        entity_token: usize,
        is_join: bool,
        is_association: bool,
    ) {
        let entity_name = command.token(entity_token).text.clone();
        let alias = find_alias_after(command, entity_token).unwrap_or_else(|| entity_name.clone());
        self.model
            .add_data_source(view, entity_name, alias, is_join, is_association);
    }

    fn add_parameter(&mut self, view: ViewId, command: &Command, scope: &mut AnnotationScope) {
        let Some(name_idx) = command.first_code() else {
            return;
        };
        let name = command.token(name_idx).text.clone();
        let type_name = command
            .next_code_sibling(name_idx)
            .filter(|&colon| command.token(colon).text_equals(":"))
            .and_then(|colon| command.next_code_sibling(colon))
            .map(|t| command.token(t).text.clone())
            .unwrap_or_default();

        let id = self.model.add_parameter(view, name, type_name);
        let owner = AnnotationOwner::Parameter(id);
        for (path, value) in scope.take() {
            let annotation = self.classify(path, value, owner);
            self.model.parameters[id.index()]
                .annotations
                .insert(crate::base::name_key(&annotation.path), annotation);
        }
    }

    fn add_field(&mut self, view: ViewId, command: &Command, scope: &mut AnnotationScope) {
        let Some(first) = command.first_code() else {
            return;
        };
        let extraction = extract_field(command, first);

        let id = self.model.add_field(
            view,
            extraction.name,
            extraction.is_virtual,
            extraction.source_path,
            extraction.stats,
        );
        let owner = AnnotationOwner::Field(id);
        for (path, value) in scope.take() {
            let annotation = self.classify(path, value, owner);
            self.model.fields[id.index()]
                .annotations
                .insert(crate::base::name_key(&annotation.path), annotation);
        }
    }

    fn classify(&self, path: SmolStr, value: SmolStr, owner: AnnotationOwner) -> Annotation {
        Annotation {
            is_element_ref: self.catalog.is_element_ref(&path),
            is_parameter_ref: self.catalog.is_parameter_ref(&path),
            is_association_ref: self.catalog.is_association_ref(&path),
            is_entity_ref: self.catalog.is_entity_ref(&path),
            path,
            value,
            owner,
        }
    }
}

/// Alias after an `as` keyword following `index`, stopping at `on`.
fn find_alias_after(command: &Command, index: usize) -> Option<SmolStr> {
    let mut cursor = command.next_code_sibling(index);
    while let Some(i) = cursor {
        let token = command.token(i);
        if token.is_keyword("ON") {
            return None;
        }
        if token.is_keyword("AS") {
            return command
                .next_code_sibling(i)
                .map(|alias| command.token(alias).text.clone());
        }
        cursor = command.next_code_sibling(i);
    }
    None
}

struct FieldExtraction {
    name: SmolStr,
    is_virtual: bool,
    source_path: SmolStr,
    stats: UsageStats,
}

/// Derive a field's name, source path, and usage statistics from its
/// select-element tokens.
fn extract_field(command: &Command, first: usize) -> FieldExtraction {
    let last = command.last_code();

    // the element may still end in a separator when the source carries one
    let mut path_end: Option<usize> =
        last.filter(|&i| command.token(i).text_equals_any(&[",", ";"]));
    let as_idx = command.find_last_keyword_sibling(first, "AS");
    let mut expr_end: Option<usize> = None;
    let mut is_virtual = false;

    let name: SmolStr = if let Some(as_idx) = as_idx {
        path_end = Some(as_idx);
        expr_end = Some(as_idx);
        command
            .next_code_sibling(as_idx)
            .map(|i| command.token(i).text.clone())
            .unwrap_or_default()
    } else if command.token(first).is_keyword("VIRTUAL") {
        is_virtual = true;
        let colon = find_sign_sibling(command, first, ":");
        if colon.is_some() {
            path_end = colon;
            expr_end = colon;
        }
        command
            .next_code_sibling(first)
            .map(|i| command.token(i).text.clone())
            .unwrap_or_default()
    } else {
        // skip trailing keywords and separators, e.g. `_assoc.field : localized`
        let mut name_idx = last;
        while let Some(i) = name_idx {
            let token = command.token(i);
            if token.is_any_keyword_token() || token.text_equals_any(&[",", ";", ":"]) {
                name_idx = command.prev_code_sibling(i);
            } else {
                break;
            }
        }
        let text = name_idx
            .map(|i| command.token(i).text.as_str())
            .unwrap_or_default();
        SmolStr::new(text.rsplit('.').next().unwrap_or(text))
    };

    let source_path = extract_source_path(command, first, path_end);
    let stats = count_usage(command, first, expr_end);

    FieldExtraction {
        name,
        is_virtual,
        source_path,
        stats,
    }
}

/// Walk the expression's top-level siblings into a simplified dotted path.
///
/// Descends one level into a `cast(...)` or non-COUNT aggregate call when
/// its parenthesis is exactly the aliased expression; skips bracketed
/// filter segments; discards the whole path on a literal, an arithmetic
/// operator, or a built-in function call.
fn extract_source_path(command: &Command, first: usize, path_end: Option<usize>) -> SmolStr {
    let first_token = command.token(first);
    let next_code = command.next_code_sibling(first);

    let mut path_end = path_end;
    let path_start: Option<usize>;

    let is_descendable_call = first_token.is_keyword("CAST")
        || (first_token.is_any_keyword(dialect::AGGREGATION_FUNCTIONS)
            && !first_token.text.eq_ignore_ascii_case("COUNT"));
    // the call's parenthesis must be exactly the aliased expression
    let descend_open = next_code
        .filter(|&i| is_descendable_call && command.token(i).text_equals("("))
        .filter(|&open| {
            command
                .next_code_sibling(open)
                .is_some_and(|close| command.next_code_sibling(close) == path_end)
        });

    if let Some(open) = descend_open {
        // move inside the call and read the path until `as` (cast) or the
        // end of the parenthesis (aggregate)
        path_start = command.first_child(open);
        path_end = if first_token.is_keyword("CAST") {
            path_start.and_then(|start| command.find_last_keyword_sibling(start, "AS"))
        } else {
            None
        };
    } else if first_token.is_any_keyword(&["KEY", "VIRTUAL"]) {
        path_start = command.next_code_sibling(first);
    } else {
        path_start = Some(first);
    }

    let mut path = String::new();
    let mut cursor = path_start;
    while let Some(i) = cursor {
        if path_end == Some(i) {
            break;
        }
        let token = command.token(i);
        let next = command.next_code_sibling(i);
        if token.text_equals("[") {
            // continue after the [...] filter
            cursor = next.and_then(|close| command.next_code_sibling(close));
            continue;
        } else if token.is_literal()
            || dialect::is_arithmetic_operator(&token.text)
            || (dialect::is_builtin_function(&token.text)
                && next.is_some_and(|n| command.token(n).text_equals("(")))
        {
            // no single traceable source
            path.clear();
            break;
        } else if token.is_identifier() || token.text_equals(".") {
            path.push_str(&token.text);
        }
        cursor = next;
    }
    SmolStr::new(path)
}

/// Count literals, casts, cases, built-in function calls, and aggregation
/// calls across every token of the expression.
fn count_usage(command: &Command, first: usize, expr_end: Option<usize>) -> UsageStats {
    let mut stats = UsageStats::default();
    let mut cursor = Some(first);
    while let Some(i) = cursor {
        if expr_end == Some(i) {
            break;
        }
        let token = command.token(i);
        let next = command.next_code(i);
        if token.is_literal() {
            stats.literals += 1;
        } else if token.is_keyword("CAST") {
            stats.casts += 1;
        } else if token.is_keyword("CASE") {
            stats.cases += 1;
        } else if next.is_some_and(|n| command.token(n).text_equals("("))
            && dialect::is_builtin_function(&token.text)
        {
            stats.functions += 1;
        } else if token.is_any_keyword(dialect::AGGREGATION_FUNCTIONS) {
            stats.aggregations += 1;
        }
        cursor = next;
    }
    stats
}

/// First sign token with the given text on the sibling chain after `index`.
fn find_sign_sibling(command: &Command, index: usize, text: &str) -> Option<usize> {
    let mut cursor = command.next_code_sibling(index);
    while let Some(i) = cursor {
        if command.token(i).text_equals(text) {
            return Some(i);
        }
        cursor = command.next_code_sibling(i);
    }
    None
}
