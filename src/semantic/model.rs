//! The cross-file view model.
//!
//! Views, data sources, parameters, and fields live in arenas on [`Model`]
//! and reference each other through integer handles, so back-references
//! (field → owning view, data source → resolved view, annotation → owner)
//! are handle lookups rather than ownership cycles. Per-view name indices
//! are case-insensitive; a later duplicate overwrites the index entry while
//! the ordered collections keep every occurrence.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::name_key;

// ============================================================================
// HANDLES
// ============================================================================

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_handle!(
    /// Handle of a [`View`] in the model's view arena.
    ViewId
);
define_handle!(
    /// Handle of a [`DataSource`].
    DataSourceId
);
define_handle!(
    /// Handle of a [`Parameter`].
    ParameterId
);
define_handle!(
    /// Handle of a [`Field`].
    FieldId
);

// ============================================================================
// MODEL ENTITIES
// ============================================================================

/// One view/entity definition, or one UNION/EXCEPT/INTERSECT branch of one.
#[derive(Debug)]
pub struct View {
    pub file_name: SmolStr,
    /// Entity name; branches carry a synthesized `<entity>+<n>` name.
    pub entity_name: SmolStr,
    pub is_view_entity: bool,
    /// 0 for the main view, the 1-based branch index for branches.
    pub view_part: u32,
    /// The first branch of a multi-part view, for non-main branches.
    pub main_view: Option<ViewId>,

    pub parameters: Vec<ParameterId>,
    pub data_sources: Vec<DataSourceId>,
    pub fields: Vec<FieldId>,

    pub(crate) parameter_of_name: FxHashMap<SmolStr, ParameterId>,
    pub(crate) data_source_of_alias: FxHashMap<SmolStr, DataSourceId>,
    pub(crate) field_of_name: FxHashMap<SmolStr, FieldId>,
}

impl View {
    /// Look up a field by name, case-insensitively.
    pub fn field_by_name(&self, name: &str) -> Option<FieldId> {
        self.field_of_name.get(&name_key(name)).copied()
    }

    /// Look up a data source by alias, case-insensitively.
    pub fn data_source_by_alias(&self, alias: &str) -> Option<DataSourceId> {
        self.data_source_of_alias.get(&name_key(alias)).copied()
    }
}

/// One FROM/JOIN/association target inside a view.
#[derive(Debug)]
pub struct DataSource {
    /// Referenced entity name, as written.
    pub entity_name: SmolStr,
    /// Explicit `as` alias, or the entity name itself.
    pub alias: SmolStr,
    pub is_join: bool,
    pub is_association: bool,
    /// Filled by the linker; stays `None` for entities outside the corpus.
    pub view: Option<ViewId>,
}

/// A view input parameter.
#[derive(Debug)]
pub struct Parameter {
    pub view: ViewId,
    pub position: usize,
    pub name: SmolStr,
    pub type_name: SmolStr,
    /// Keyed by the case-insensitive annotation path.
    pub annotations: IndexMap<SmolStr, Annotation>,
}

/// Usage statistics of a field's defining expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageStats {
    pub literals: u32,
    pub casts: u32,
    pub cases: u32,
    /// Built-in function calls.
    pub functions: u32,
    /// Aggregation function calls; a value > 0 marks an aggregation boundary
    /// for annotation inheritance.
    pub aggregations: u32,
}

/// A selected/exposed column or an exposed association of a view.
#[derive(Debug)]
pub struct Field {
    pub view: ViewId,
    pub position: usize,
    pub name: SmolStr,
    pub is_virtual: bool,
    /// Simplified dotted source path; empty when the expression has no
    /// single traceable origin (literal/arithmetic/function).
    pub source_path: SmolStr,
    /// True when the path's last segment starts with the association marker.
    pub is_exposed_association: bool,
    pub stats: UsageStats,
    /// Keyed by the case-insensitive annotation path. An annotation's owner
    /// may be a *different* field, which marks it as inherited.
    pub annotations: IndexMap<SmolStr, Annotation>,
}

/// A placeholder for a field that must exist in a data source whose view
/// definition was never loaded. Created transiently during resolution;
/// never stored in a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredField {
    pub data_source: DataSourceId,
    pub name: SmolStr,
}

/// A resolved source field: either a genuine field of a loaded view or an
/// inferred placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceField {
    Field(FieldId),
    Inferred(InferredField),
}

impl SourceField {
    /// True for placeholder fields inferred from unknown data sources.
    pub fn was_inferred(&self) -> bool {
        matches!(self, SourceField::Inferred(_))
    }
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

/// Whichever parameter or field an annotation was declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationOwner {
    Field(FieldId),
    Parameter(ParameterId),
}

/// One metadata declaration: a dotted path and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Dot-separated namespace path, e.g. `Semantics.amount.currencyCode`.
    pub path: SmolStr,
    /// The value, typically an element name.
    pub value: SmolStr,
    /// The parameter or field the annotation was declared on. A field map
    /// entry whose owner is a different field was inherited.
    pub owner: AnnotationOwner,
    pub is_element_ref: bool,
    pub is_parameter_ref: bool,
    pub is_association_ref: bool,
    pub is_entity_ref: bool,
}

// ============================================================================
// MODEL
// ============================================================================

/// The cross-file analyzer state: arenas plus the global entity-name map.
///
/// Append-only during building; read-only after [`finish_build`] links the
/// data sources (see `semantic::Analyzer`).
///
/// [`finish_build`]: crate::semantic::Analyzer::finish_build
#[derive(Debug, Default)]
pub struct Model {
    pub(crate) views: Vec<View>,
    pub(crate) data_sources: Vec<DataSource>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) fields: Vec<Field>,
    /// Entity name → main view; branch views are intentionally absent.
    pub(crate) view_of_entity_name: FxHashMap<SmolStr, ViewId>,
}

impl Model {
    pub fn view(&self, id: ViewId) -> &View {
        &self.views[id.index()]
    }

    pub fn data_source(&self, id: DataSourceId) -> &DataSource {
        &self.data_sources[id.index()]
    }

    pub fn parameter(&self, id: ParameterId) -> &Parameter {
        &self.parameters[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    /// All views (main and branch) in build order.
    pub fn views_in_order(&self) -> impl Iterator<Item = (ViewId, &View)> {
        self.views
            .iter()
            .enumerate()
            .map(|(i, v)| (ViewId::new(i), v))
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Look up the main view registered under an entity name.
    pub fn view_of_entity(&self, entity_name: &str) -> Option<ViewId> {
        self.view_of_entity_name.get(&name_key(entity_name)).copied()
    }

    // ------------------------------------------------------------------
    // Build-phase mutation (crate-internal; used by the model builder)
    // ------------------------------------------------------------------

    pub(crate) fn add_view(
        &mut self,
        file_name: SmolStr,
        entity_name: SmolStr,
        is_view_entity: bool,
        view_part: u32,
        main_view: Option<ViewId>,
    ) -> ViewId {
        let id = ViewId::new(self.views.len());
        self.views.push(View {
            file_name,
            entity_name,
            is_view_entity,
            view_part,
            main_view,
            parameters: Vec::new(),
            data_sources: Vec::new(),
            fields: Vec::new(),
            parameter_of_name: FxHashMap::default(),
            data_source_of_alias: FxHashMap::default(),
            field_of_name: FxHashMap::default(),
        });
        id
    }

    /// Register a main view under its entity name; a later file wins.
    pub(crate) fn register_entity(&mut self, entity_name: &str, view: ViewId) {
        self.view_of_entity_name.insert(name_key(entity_name), view);
    }

    pub(crate) fn add_data_source(
        &mut self,
        view: ViewId,
        entity_name: SmolStr,
        alias: SmolStr,
        is_join: bool,
        is_association: bool,
    ) -> DataSourceId {
        let id = DataSourceId::new(self.data_sources.len());
        let key = name_key(&alias);
        self.data_sources.push(DataSource {
            entity_name,
            alias,
            is_join,
            is_association,
            view: None,
        });
        let view = &mut self.views[view.index()];
        view.data_sources.push(id);
        view.data_source_of_alias.insert(key, id);
        id
    }

    pub(crate) fn add_parameter(
        &mut self,
        view: ViewId,
        name: SmolStr,
        type_name: SmolStr,
    ) -> ParameterId {
        let id = ParameterId::new(self.parameters.len());
        let key = name_key(&name);
        let position = self.views[view.index()].parameter_of_name.len();
        self.parameters.push(Parameter {
            view,
            position,
            name,
            type_name,
            annotations: IndexMap::new(),
        });
        let view = &mut self.views[view.index()];
        view.parameters.push(id);
        view.parameter_of_name.insert(key, id);
        id
    }

    pub(crate) fn add_field(
        &mut self,
        view: ViewId,
        name: SmolStr,
        is_virtual: bool,
        source_path: SmolStr,
        stats: UsageStats,
    ) -> FieldId {
        let id = FieldId::new(self.fields.len());
        let key = name_key(&name);
        let position = self.views[view.index()].field_of_name.len();
        let is_exposed_association = source_path
            .rsplit('.')
            .next()
            .is_some_and(|segment| segment.starts_with(crate::base::dialect::ASSOCIATION_PREFIX));
        self.fields.push(Field {
            view,
            position,
            name,
            is_virtual,
            source_path,
            is_exposed_association,
            stats,
            annotations: IndexMap::new(),
        });
        let view = &mut self.views[view.index()];
        view.fields.push(id);
        view.field_of_name.insert(key, id);
        id
    }

    /// First annotation on a field matching any of the given path keys, in
    /// the order the keys were requested.
    pub(crate) fn find_any_annotation(
        &self,
        field: FieldId,
        path_keys: &[SmolStr],
    ) -> Option<&Annotation> {
        let annotations = &self.fields[field.index()].annotations;
        path_keys.iter().find_map(|key| annotations.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposed_association_flag_from_path() {
        let mut model = Model::default();
        let view = model.add_view("f".into(), "V".into(), true, 0, None);
        let assoc = model.add_field(view, "_Currency".into(), false, "_Currency".into(), UsageStats::default());
        let plain = model.add_field(view, "Amount".into(), false, "p.amount".into(), UsageStats::default());
        let chained = model.add_field(view, "_Text".into(), false, "p._Text".into(), UsageStats::default());
        assert!(model.field(assoc).is_exposed_association);
        assert!(!model.field(plain).is_exposed_association);
        assert!(model.field(chained).is_exposed_association);
    }

    #[test]
    fn test_duplicate_field_name_last_wins_in_index() {
        let mut model = Model::default();
        let view = model.add_view("f".into(), "V".into(), true, 0, None);
        let first = model.add_field(view, "Same".into(), false, "a".into(), UsageStats::default());
        let second = model.add_field(view, "SAME".into(), false, "b".into(), UsageStats::default());
        assert_eq!(model.view(view).fields.len(), 2);
        assert_eq!(model.view(view).field_by_name("same"), Some(second));
        // positions derive from the index size, so the overwrite keeps them stable
        assert_eq!(model.field(first).position, 0);
        assert_eq!(model.field(second).position, 1);
    }

    #[test]
    fn test_parameter_positions_derive_from_name_index() {
        let mut model = Model::default();
        let view = model.add_view("f".into(), "V".into(), true, 0, None);
        let first = model.add_parameter(view, "P_Date".into(), "abap.dats".into());
        let second = model.add_parameter(view, "p_date".into(), "abap.datn".into());
        let third = model.add_parameter(view, "P_Other".into(), "abap.char".into());
        assert_eq!(model.view(view).parameters.len(), 3);
        // like fields, positions count distinct names seen so far
        assert_eq!(model.parameter(first).position, 0);
        assert_eq!(model.parameter(second).position, 1);
        assert_eq!(model.parameter(third).position, 1);
    }

    #[test]
    fn test_entity_registration_last_wins() {
        let mut model = Model::default();
        let v1 = model.add_view("f1".into(), "V".into(), true, 0, None);
        let v2 = model.add_view("f2".into(), "V".into(), true, 0, None);
        model.register_entity("V", v1);
        model.register_entity("v", v2);
        assert_eq!(model.view_of_entity("V"), Some(v2));
    }
}
