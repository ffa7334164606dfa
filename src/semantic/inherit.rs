//! Annotation inheritance across the view hierarchy.
//!
//! Fields that lack one of the requested annotations pick it up from the
//! field they select from, hopping down the source chain until an
//! annotation is found or an aggregation boundary stops the search. The
//! cloned annotation keeps its original owner, which records where it was
//! declared.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::name_key;
use crate::semantic::model::{FieldId, Model, SourceField, ViewId};

impl Model {
    /// Propagate the annotations with the given paths from source fields to
    /// the selecting fields that do not declare them.
    ///
    /// Additive and idempotent: existing entries are never replaced, and a
    /// second run with the same paths changes nothing. Fields computed with
    /// an aggregation neither inherit nor pass annotations on; branch
    /// fields of a multi-part view entity inherit from the main branch's
    /// field of the same name first, falling back to their own source chain
    /// when that field carries none of the requested annotations.
    pub fn inherit_annotations(&mut self, annotation_paths: &[&str]) {
        let keys: Vec<SmolStr> = annotation_paths.iter().map(|path| name_key(path)).collect();

        for view_index in 0..self.views.len() {
            let view_id = ViewId::new(view_index);
            let field_ids = self.views[view_index].fields.clone();
            for field_id in field_ids {
                if self.find_any_annotation(field_id, &keys).is_some() {
                    continue;
                }
                let view = &self.views[view_index];
                if view.is_view_entity {
                    if let Some(main_view) = view.main_view {
                        if self.inherit_from_main_branch(field_id, main_view, &keys) {
                            continue;
                        }
                    }
                }
                if self.field(field_id).stats.aggregations > 0 {
                    continue;
                }
                self.inherit_from_source_chain(view_id, field_id, &keys);
            }
        }
    }

    /// Branch fields of view entities mirror the main branch, so the
    /// annotation comes from the main view's field of the same name.
    /// Returns whether an annotation was found there.
    fn inherit_from_main_branch(
        &mut self,
        field: FieldId,
        main_view: ViewId,
        keys: &[SmolStr],
    ) -> bool {
        let name = self.field(field).name.clone();
        let Some(main_field) = self.view(main_view).field_by_name(&name) else {
            return false;
        };
        let Some(annotation) = self.find_any_annotation(main_field, keys) else {
            return false;
        };
        let annotation = annotation.clone();
        let key = name_key(&annotation.path);
        self.fields[field.index()].annotations.insert(key, annotation);
        true
    }

    fn inherit_from_source_chain(&mut self, view: ViewId, field: FieldId, keys: &[SmolStr]) {
        let mut hops = FxHashSet::default();
        hops.insert(field);
        let mut current = self.resolve_source(field).source_field().cloned();
        while let Some(SourceField::Field(source_field)) = current {
            if !hops.insert(source_field) {
                break;
            }
            if let Some(annotation) = self.find_any_annotation(source_field, keys) {
                let annotation = annotation.clone();
                tracing::trace!(
                    view = %self.view(view).entity_name,
                    field = %self.field(field).name,
                    path = %annotation.path,
                    "inherited annotation"
                );
                let key = name_key(&annotation.path);
                self.fields[field.index()].annotations.insert(key, annotation);
                break;
            }
            if self.field(source_field).stats.aggregations > 0 {
                break;
            }
            current = self.resolve_source(source_field).source_field().cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::model::{Annotation, AnnotationOwner, UsageStats};

    fn annotate(model: &mut Model, field: FieldId, path: &str, value: &str) {
        let annotation = Annotation {
            path: path.into(),
            value: value.into(),
            owner: AnnotationOwner::Field(field),
            is_element_ref: false,
            is_parameter_ref: false,
            is_association_ref: false,
            is_entity_ref: false,
        };
        model.fields[field.index()]
            .annotations
            .insert(name_key(path), annotation);
    }

    fn link(model: &mut Model) {
        for i in 0..model.data_sources.len() {
            let entity = model.data_sources[i].entity_name.clone();
            model.data_sources[i].view = model.view_of_entity(&entity);
        }
    }

    /// Base.amount carries the annotation; Mid selects it; Top selects Mid.
    fn stacked_model() -> (Model, FieldId, FieldId, FieldId) {
        let mut model = Model::default();
        let base = model.add_view("base".into(), "Base".into(), true, 0, None);
        let base_amount =
            model.add_field(base, "amount".into(), false, "".into(), UsageStats::default());
        model.register_entity("Base", base);

        let mid = model.add_view("mid".into(), "Mid".into(), true, 0, None);
        model.add_data_source(mid, "Base".into(), "b".into(), false, false);
        let mid_amount =
            model.add_field(mid, "amount".into(), false, "b.amount".into(), UsageStats::default());
        model.register_entity("Mid", mid);

        let top = model.add_view("top".into(), "Top".into(), true, 0, None);
        model.add_data_source(top, "Mid".into(), "m".into(), false, false);
        let top_amount =
            model.add_field(top, "amount".into(), false, "m.amount".into(), UsageStats::default());
        model.register_entity("Top", top);

        annotate(&mut model, base_amount, "Semantics.amount.currencyCode", "Waers");
        link(&mut model);
        (model, base_amount, mid_amount, top_amount)
    }

    #[test]
    fn test_inherits_across_two_hops_with_original_owner() {
        let (mut model, base_amount, mid_amount, top_amount) = stacked_model();
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        for field in [mid_amount, top_amount] {
            let annotation = model
                .find_any_annotation(field, &[name_key("Semantics.amount.currencyCode")])
                .unwrap();
            assert_eq!(annotation.value, "Waers");
            assert_eq!(annotation.owner, AnnotationOwner::Field(base_amount));
        }
    }

    #[test]
    fn test_declared_annotation_is_never_replaced() {
        let (mut model, _, mid_amount, _) = stacked_model();
        annotate(&mut model, mid_amount, "Semantics.Amount.CurrencyCode", "Local");
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        let annotation = model
            .find_any_annotation(mid_amount, &[name_key("semantics.amount.currencycode")])
            .unwrap();
        assert_eq!(annotation.value, "Local");
        assert_eq!(annotation.owner, AnnotationOwner::Field(mid_amount));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let (mut model, _, mid_amount, top_amount) = stacked_model();
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);
        let before: Vec<_> = [mid_amount, top_amount]
            .map(|f| model.field(f).annotations.clone())
            .into_iter()
            .collect();
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);
        for (field, annotations) in [mid_amount, top_amount].into_iter().zip(before) {
            assert_eq!(model.field(field).annotations, annotations);
        }
    }

    #[test]
    fn test_aggregated_field_does_not_inherit() {
        let (mut model, _, _, _) = stacked_model();
        let top = model.view_of_entity("Top").unwrap();
        let stats = UsageStats { aggregations: 1, ..UsageStats::default() };
        let total = model.add_field(top, "Total".into(), false, "m.amount".into(), stats);
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        assert!(model.field(total).annotations.is_empty());
    }

    #[test]
    fn test_chain_stops_at_aggregated_source_field() {
        let (mut model, _, mid_amount, top_amount) = stacked_model();
        model.fields[mid_amount.index()].stats.aggregations = 1;
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        // the first hop carries no annotation and is itself aggregated
        assert!(model.field(top_amount).annotations.is_empty());
    }

    #[test]
    fn test_branch_field_inherits_from_main_branch() {
        let (mut model, base_amount, mid_amount, _) = stacked_model();
        let mid = model.view_of_entity("Mid").unwrap();
        let branch = model.add_view("mid".into(), "Mid+1".into(), true, 1, Some(mid));
        let branch_amount =
            model.add_field(branch, "amount".into(), false, "".into(), UsageStats::default());
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        let annotation = model
            .find_any_annotation(branch_amount, &[name_key("Semantics.amount.currencyCode")])
            .unwrap();
        assert_eq!(annotation.value, "Waers");
        // provenance runs through whatever the main branch field carries
        assert_eq!(
            annotation.owner,
            model
                .find_any_annotation(mid_amount, &[name_key("Semantics.amount.currencyCode")])
                .unwrap()
                .owner
        );
        let _ = base_amount;
    }

    #[test]
    fn test_branch_falls_back_to_source_chain() {
        // the main branch's field carries no annotation, so the branch
        // field walks its own source chain instead
        let mut model = Model::default();
        let src = model.add_view("src".into(), "I_Src".into(), true, 0, None);
        let src_balance =
            model.add_field(src, "Balance".into(), false, "".into(), UsageStats::default());
        annotate(&mut model, src_balance, "Semantics.amount.currencyCode", "Waers");
        model.register_entity("I_Src", src);

        let main = model.add_view("v".into(), "C_V".into(), true, 0, None);
        let main_balance =
            model.add_field(main, "Balance".into(), false, "".into(), UsageStats::default());

        let branch = model.add_view("v".into(), "C_V+1".into(), true, 1, Some(main));
        model.add_data_source(branch, "I_Src".into(), "s".into(), false, false);
        let branch_balance = model.add_field(
            branch,
            "Balance".into(),
            false,
            "s.Balance".into(),
            UsageStats::default(),
        );
        link(&mut model);
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        let inherited = model
            .find_any_annotation(branch_balance, &[name_key("Semantics.amount.currencyCode")])
            .unwrap();
        assert_eq!(inherited.owner, AnnotationOwner::Field(src_balance));
        // the main field had no chain of its own to follow
        assert!(model.field(main_balance).annotations.is_empty());
    }

    #[test]
    fn test_inferred_source_contributes_nothing() {
        let mut model = Model::default();
        let top = model.add_view("top".into(), "Top".into(), true, 0, None);
        model.add_data_source(top, "Unknown".into(), "u".into(), false, false);
        let amount =
            model.add_field(top, "amount".into(), false, "u.amount".into(), UsageStats::default());
        model.inherit_annotations(&["Semantics.amount.currencyCode"]);

        assert!(model.field(amount).annotations.is_empty());
    }
}
