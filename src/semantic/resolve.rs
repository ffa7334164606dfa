//! Source-field resolution.
//!
//! Follows a field's dotted source path backwards through data-source
//! aliases and exposed associations until it reaches the defining field in
//! an underlying view, an [`InferredField`] on a data source whose view was
//! never loaded, or a dead end.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::dialect;
use crate::semantic::model::{
    DataSourceId, FieldId, InferredField, Model, SourceField, ViewId,
};

/// Outcome of tracing a field back to its direct source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The direct source field, one hop below the field's own view.
    Source(SourceField),
    /// The path leads nowhere traceable (no path, unknown alias, field
    /// missing in the source view, or a computed expression).
    Unresolved,
    /// The path runs through a ring of exposed associations that closes
    /// back on itself.
    Cyclic,
}

impl Resolution {
    /// The resolved source field, if any.
    pub fn source_field(&self) -> Option<&SourceField> {
        match self {
            Resolution::Source(source) => Some(source),
            Resolution::Unresolved | Resolution::Cyclic => None,
        }
    }
}

impl Model {
    /// Trace a field one hop back to the data source it selects from.
    ///
    /// Intermediate path segments name data-source aliases of the owning
    /// view, or exposed associations of its data sources, which are
    /// resolved recursively. The recursion carries a visited set; meeting
    /// the same field twice yields [`Resolution::Cyclic`].
    pub fn resolve_source(&self, field: FieldId) -> Resolution {
        let mut visited = FxHashSet::default();
        visited.insert(field);
        self.resolve_with_guard(field, &mut visited)
    }

    fn resolve_with_guard(&self, field: FieldId, visited: &mut FxHashSet<FieldId>) -> Resolution {
        let info = self.field(field);
        if info.source_path.is_empty() {
            return Resolution::Unresolved;
        }
        let owning_view = info.view;
        let bits: Vec<&str> = info.source_path.split('.').collect();

        // the view (or unloaded data source) the walk currently stands in
        let mut view: Option<ViewId> = Some(owning_view);
        let mut unknown_source: Option<DataSourceId> = None;

        for (index, bit) in bits.iter().enumerate() {
            let is_last = index + 1 == bits.len();
            if !is_last {
                let Some(current) = view else {
                    // an unloaded data source cannot be navigated further
                    return Resolution::Unresolved;
                };
                let data_source = match self.intermediate_data_source(current, bit, visited) {
                    Ok(data_source) => data_source,
                    Err(outcome) => return outcome,
                };
                match self.data_source(data_source).view {
                    Some(next_view) => {
                        view = Some(next_view);
                        unknown_source = None;
                    }
                    None => {
                        view = None;
                        unknown_source = Some(data_source);
                    }
                }
                continue;
            }

            if info.is_exposed_association {
                // the association itself is the source, not one of its fields
                return match view.and_then(|v| self.view(v).data_source_by_alias(bit)) {
                    Some(data_source) => Resolution::Source(SourceField::Inferred(InferredField {
                        data_source,
                        name: SmolStr::default(),
                    })),
                    None => Resolution::Unresolved,
                };
            }
            if let Some(current) = view {
                let found = if current == owning_view {
                    self.find_field_in_data_sources(current, bit, true)
                } else {
                    self.view(current).field_by_name(bit).map(SourceField::Field)
                };
                return match found {
                    Some(source) => Resolution::Source(source),
                    None => Resolution::Unresolved,
                };
            }
            if let Some(data_source) = unknown_source {
                return Resolution::Source(SourceField::Inferred(InferredField {
                    data_source,
                    name: SmolStr::new(bit),
                }));
            }
            return Resolution::Unresolved;
        }
        Resolution::Unresolved
    }

    /// Resolve one intermediate path segment to a data source of `view`:
    /// either a direct alias or, for association-marked segments, an
    /// exposed association picked up from one of the view's sources.
    fn intermediate_data_source(
        &self,
        view: ViewId,
        bit: &str,
        visited: &mut FxHashSet<FieldId>,
    ) -> Result<DataSourceId, Resolution> {
        if let Some(data_source) = self.view(view).data_source_by_alias(bit) {
            return Ok(data_source);
        }
        if !bit.starts_with(dialect::ASSOCIATION_PREFIX) {
            return Err(Resolution::Unresolved);
        }
        match self.find_field_in_data_sources(view, bit, true) {
            Some(SourceField::Inferred(inferred)) => Ok(inferred.data_source),
            Some(SourceField::Field(association_field)) => {
                if !visited.insert(association_field) {
                    tracing::trace!(
                        field = %self.field(association_field).name,
                        "association chain closed on itself"
                    );
                    return Err(Resolution::Cyclic);
                }
                // the exposed association must itself point at a data
                // source; a plain field or dead end stops the walk
                match self.resolve_with_guard(association_field, visited) {
                    Resolution::Source(SourceField::Inferred(inferred)) => Ok(inferred.data_source),
                    Resolution::Cyclic => Err(Resolution::Cyclic),
                    Resolution::Source(SourceField::Field(_)) | Resolution::Unresolved => {
                        Err(Resolution::Unresolved)
                    }
                }
            }
            None => Err(Resolution::Unresolved),
        }
    }

    /// Search a field by name across a view's non-association data sources,
    /// in declaration order.
    ///
    /// With `infer_from_sole_unknown_source`, a miss still produces an
    /// [`InferredField`] when the view reads from exactly one data source
    /// and that source's view was never loaded; the field is then assumed
    /// to exist there.
    pub(crate) fn find_field_in_data_sources(
        &self,
        view: ViewId,
        name: &str,
        infer_from_sole_unknown_source: bool,
    ) -> Option<SourceField> {
        let sources = &self.view(view).data_sources;
        let mut only_source = sources.first().copied();
        for &id in sources {
            let data_source = self.data_source(id);
            if data_source.is_association {
                continue;
            }
            if only_source != Some(id) {
                only_source = None;
            }
            let Some(source_view) = data_source.view else {
                continue;
            };
            if let Some(field) = self.view(source_view).field_by_name(name) {
                return Some(SourceField::Field(field));
            }
        }
        if infer_from_sole_unknown_source {
            if let Some(id) = only_source {
                if self.data_source(id).view.is_none() {
                    return Some(SourceField::Inferred(InferredField {
                        data_source: id,
                        name: SmolStr::new(name),
                    }));
                }
            }
        }
        None
    }
}
