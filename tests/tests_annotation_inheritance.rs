#![allow(clippy::unwrap_used)]

use viewlens::base::name_key;
use viewlens::semantic::{Analyzer, Annotation, AnnotationOwner, FieldId};

const CURRENCY_CODE: &str = "Semantics.amount.currencyCode";

fn field(analyzer: &Analyzer, entity: &str, name: &str) -> FieldId {
    let model = analyzer.model();
    let view = model.view_of_entity(entity).unwrap();
    model.view(view).field_by_name(name).unwrap()
}

fn annotation<'a>(analyzer: &'a Analyzer, field: FieldId, path: &str) -> Option<&'a Annotation> {
    analyzer.model().field(field).annotations.get(&name_key(path))
}

/// Base declares the annotation; Mid and Top select the field upwards.
fn stacked_analyzer() -> Analyzer {
    let mut analyzer = Analyzer::new();
    analyzer.add_source(
        "base",
        "define view entity I_Base as select from zdoc \
         { key zdoc.id as Id, \
           @Semantics.amount.currencyCode: 'Currency' \
           zdoc.amount as Amount, \
           zdoc.waers as Currency }",
    );
    analyzer.add_source(
        "mid",
        "define view entity I_Mid as select from I_Base as b \
         { key b.Id as Id, b.Amount as Amount, b.Currency as Currency }",
    );
    analyzer.add_source(
        "top",
        "define view entity I_Top as select from I_Mid as m \
         { key m.Id as Id, \
           m.Amount as GrossAmount, \
           sum( m.Amount ) as TotalAmount }",
    );
    analyzer.finish_build();
    analyzer
}

#[test]
fn test_annotation_travels_up_the_select_chain() {
    let mut analyzer = stacked_analyzer();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);

    let declared_on = field(&analyzer, "I_Base", "Amount");
    for (entity, name) in [("I_Mid", "Amount"), ("I_Top", "GrossAmount")] {
        let inherited = annotation(&analyzer, field(&analyzer, entity, name), CURRENCY_CODE)
            .unwrap_or_else(|| panic!("{entity}.{name} should have inherited"));
        assert_eq!(inherited.value, "Currency");
        // provenance points at the declaring field, however many hops away
        assert_eq!(inherited.owner, AnnotationOwner::Field(declared_on));
    }
}

#[test]
fn test_aggregated_field_does_not_inherit() {
    let mut analyzer = stacked_analyzer();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);

    let total = field(&analyzer, "I_Top", "TotalAmount");
    assert_eq!(annotation(&analyzer, total, CURRENCY_CODE), None);
}

#[test]
fn test_unrelated_fields_stay_clean() {
    let mut analyzer = stacked_analyzer();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);

    let id = field(&analyzer, "I_Top", "Id");
    assert_eq!(annotation(&analyzer, id, CURRENCY_CODE), None);
}

#[test]
fn test_declared_annotation_is_kept() {
    let mut analyzer = Analyzer::new();
    analyzer.add_source(
        "base",
        "define view entity I_Base as select from zdoc \
         { @Semantics.amount.currencyCode: 'Waers' \
           zdoc.amount as Amount }",
    );
    analyzer.add_source(
        "top",
        "define view entity I_Top as select from I_Base as b \
         { @Semantics.amount.currencyCode: 'OwnCurrency' \
           b.Amount as Amount }",
    );
    analyzer.finish_build();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);

    let own = field(&analyzer, "I_Top", "Amount");
    let kept = annotation(&analyzer, own, CURRENCY_CODE).unwrap();
    assert_eq!(kept.value, "OwnCurrency");
    assert_eq!(kept.owner, AnnotationOwner::Field(own));
}

#[test]
fn test_inheritance_is_idempotent() {
    let mut analyzer = stacked_analyzer();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);
    let first = annotation(
        &analyzer,
        field(&analyzer, "I_Top", "GrossAmount"),
        CURRENCY_CODE,
    )
    .cloned();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);
    let second = annotation(
        &analyzer,
        field(&analyzer, "I_Top", "GrossAmount"),
        CURRENCY_CODE,
    )
    .cloned();
    assert_eq!(first, second);
}

#[test]
fn test_union_branch_inherits_from_main_branch() {
    let mut analyzer = Analyzer::new();
    analyzer.add_source(
        "balance",
        "define view entity C_Balance as select from tfirst \
         { key tfirst.id as Id, \
           @Semantics.amount.currencyCode: 'Currency' \
           tfirst.bal as Balance, \
           tfirst.waers as Currency } \
         union all select from tsecond \
         { key tsecond.id as Id, \
           tsecond.bal as Balance, \
           tsecond.waers as Currency }",
    );
    analyzer.finish_build();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);

    let model = analyzer.model();
    let (_, branch) = model.views_in_order().nth(1).unwrap();
    assert_eq!(branch.entity_name, "C_Balance+1");
    let branch_balance = branch.field_by_name("Balance").unwrap();
    let main_balance = field(&analyzer, "C_Balance", "Balance");

    let inherited = annotation(&analyzer, branch_balance, CURRENCY_CODE).unwrap();
    assert_eq!(inherited.value, "Currency");
    assert_eq!(inherited.owner, AnnotationOwner::Field(main_balance));
}

#[test]
fn test_union_branch_falls_back_to_its_own_source_chain() {
    let mut analyzer = Analyzer::new();
    analyzer.add_source(
        "src",
        "define view entity I_Src as select from zsrc \
         { key zsrc.id as id, \
           @Semantics.amount.currencyCode: 'Waers' \
           zsrc.bal as Balance }",
    );
    analyzer.add_source(
        "balance",
        "define view entity C_V as select from tlocal \
         { key tlocal.id as Id, tlocal.bal as Balance } \
         union all select from I_Src as s \
         { key s.id as Id, s.Balance as Balance }",
    );
    analyzer.finish_build();
    analyzer.inherit_annotations(&[CURRENCY_CODE]);

    // the main branch's Balance carries nothing, so the branch walks its
    // own select chain into I_Src
    let model = analyzer.model();
    let (_, branch) = model.views_in_order().nth(2).unwrap();
    assert_eq!(branch.entity_name, "C_V+1");
    let branch_balance = branch.field_by_name("Balance").unwrap();
    let src_balance = field(&analyzer, "I_Src", "Balance");
    let inherited = annotation(&analyzer, branch_balance, CURRENCY_CODE).unwrap();
    assert_eq!(inherited.value, "Waers");
    assert_eq!(inherited.owner, AnnotationOwner::Field(src_balance));
    // the main branch reads from an unknown table and stays unannotated
    assert_eq!(
        annotation(&analyzer, field(&analyzer, "C_V", "Balance"), CURRENCY_CODE),
        None
    );
}

#[test]
fn test_alternative_path_spelling_blocks_inheritance() {
    // a field already carrying any of the requested paths inherits nothing
    let mut analyzer = Analyzer::new();
    analyzer.add_source(
        "base",
        "define view entity I_Base as select from zdoc \
         { @Semantics.amount.currencyCode: 'Waers' \
           zdoc.amount as Amount }",
    );
    analyzer.add_source(
        "top",
        "define view entity I_Top as select from I_Base as b \
         { @Semantics.currencyCode: 'Plain' \
           b.Amount as Amount }",
    );
    analyzer.finish_build();
    analyzer.inherit_annotations(&["Semantics.currencyCode", CURRENCY_CODE]);

    let own = field(&analyzer, "I_Top", "Amount");
    assert_eq!(annotation(&analyzer, own, CURRENCY_CODE), None);
    assert_eq!(
        annotation(&analyzer, own, "Semantics.currencyCode").unwrap().value,
        "Plain"
    );
}
