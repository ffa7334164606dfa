//! Semantic analysis of parsed view sources.
//!
//! Module dependency order:
//!
//! ```text
//! diagnostics  annotations
//!       \         /
//!        model  (arenas, handles)
//!          |
//!       builder  (per-file model building)
//!          |
//!       resolve  (source-field resolution)
//!        /    \
//!   inherit  report
//! ```
//!
//! [`Analyzer`] ties the phases together: feed it files, link them with
//! [`Analyzer::finish_build`], then resolve, inherit, and report.

pub mod annotations;
mod builder;
pub mod diagnostics;
mod inherit;
pub mod model;
mod report;
pub mod resolve;

pub use annotations::{AnnotationCatalog, ScopeError};
pub use diagnostics::{Diagnostic, Severity};
pub use model::{
    Annotation, AnnotationOwner, DataSource, DataSourceId, Field, FieldId, InferredField, Model,
    Parameter, ParameterId, SourceField, UsageStats, View, ViewId,
};
pub use resolve::Resolution;

use crate::parser::{parse_source, CommandSeq};

use builder::ModelBuilder;

// ============================================================================
// ANALYZER
// ============================================================================

/// Cross-file analyzer: accumulates a [`Model`] file by file.
///
/// Files may arrive in any order; forward references resolve once
/// [`finish_build`] has linked every data source to the view registered
/// under its entity name.
///
/// [`finish_build`]: Analyzer::finish_build
#[derive(Debug, Default)]
pub struct Analyzer {
    model: Model,
    catalog: AnnotationCatalog,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    /// An analyzer with the built-in annotation catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// An analyzer with a caller-supplied annotation catalog.
    pub fn with_catalog(catalog: AnnotationCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Parse one source text and add it to the model.
    pub fn add_source(&mut self, file_name: &str, text: &str) {
        let code = parse_source(text);
        self.add_file(file_name, &code);
    }

    /// Add one already-parsed file to the model. Non-DDL files are ignored.
    pub fn add_file(&mut self, file_name: &str, code: &CommandSeq) {
        tracing::debug!(file = file_name, commands = code.commands.len(), "adding file");
        ModelBuilder::new(&mut self.model, &self.catalog, &mut self.diagnostics)
            .add_file(file_name, code);
    }

    /// Link every data source to the main view registered under its entity
    /// name. Entities outside the added files stay unlinked. Idempotent;
    /// call again after adding further files.
    pub fn finish_build(&mut self) {
        let mut linked = 0usize;
        for index in 0..self.model.data_sources.len() {
            let entity_name = self.model.data_sources[index].entity_name.clone();
            let view = self.model.view_of_entity(&entity_name);
            self.model.data_sources[index].view = view;
            linked += view.is_some() as usize;
        }
        tracing::debug!(
            views = self.model.view_count(),
            data_sources = self.model.data_sources.len(),
            linked,
            "model linked"
        );
    }

    /// Trace a field one hop back to its direct source.
    pub fn resolve_source(&self, field: FieldId) -> Resolution {
        self.model.resolve_source(field)
    }

    /// Propagate the given annotations down the source chains.
    pub fn inherit_annotations(&mut self, annotation_paths: &[&str]) {
        self.model.inherit_annotations(annotation_paths);
    }

    /// Render the tab-separated field report.
    pub fn render_report(&self, annotation_paths: &[&str]) -> String {
        self.model.render_report(annotation_paths)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Problems collected while building, e.g. malformed annotations.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
