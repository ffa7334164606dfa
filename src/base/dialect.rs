//! Constant tables of the view-DDL dialect.
//!
//! Everything here is static vocabulary: keywords, the aggregation and
//! built-in function sets, arithmetic operators, and the default sets of
//! annotation paths that are known to reference elements, parameters,
//! associations, or entities. The annotation path sets are only defaults;
//! callers can supply their own via `semantic::AnnotationCatalog`.

/// Keywords of the dialect, matched case-insensitively.
///
/// Aggregation function names are keywords too (see [`AGGREGATION_FUNCTIONS`]);
/// built-in functions are plain identifiers checked against
/// [`is_builtin_function`].
pub const KEYWORDS: &[&str] = &[
    "ABSTRACT",
    "ALL",
    "AND",
    "AS",
    "ASSOCIATION",
    "AVG",
    "BETWEEN",
    "BY",
    "CASE",
    "CAST",
    "COUNT",
    "CROSS",
    "CUSTOM",
    "DEFINE",
    "DISTINCT",
    "ELSE",
    "END",
    "ENTITY",
    "EXCEPT",
    "EXTEND",
    "FROM",
    "GROUP",
    "HAVING",
    "INNER",
    "INTERSECT",
    "IS",
    "JOIN",
    "KEY",
    "LEFT",
    "LOCALIZED",
    "MANY",
    "MAX",
    "MIN",
    "NOT",
    "NULL",
    "ON",
    "ONE",
    "OR",
    "OUTER",
    "PARAMETERS",
    "PRESERVING",
    "PROJECTION",
    "RIGHT",
    "ROOT",
    "SELECT",
    "SUM",
    "THEN",
    "TO",
    "TRANSIENT",
    "TYPE",
    "UNION",
    "VIEW",
    "VIRTUAL",
    "WHEN",
    "WHERE",
    "WITH",
];

/// Aggregation functions; their tokens are keywords.
pub const AGGREGATION_FUNCTIONS: &[&str] = &["MAX", "MIN", "AVG", "SUM", "COUNT"];

/// Arithmetic operators; any of these in a field expression discards the
/// source path, since the expression no longer has a single origin.
pub const ARITHMETIC_OPERATORS: &[&str] = &["+", "-", "*", "/"];

/// The marker that starts an association name (`_Currency`, `_Supplier`, ...).
pub const ASSOCIATION_PREFIX: char = '_';

/// Built-in functions of the dialect (identifiers followed by `(`).
const BUILTIN_FUNCTIONS: &[&str] = &[
    "abap_system_timezone",
    "abap_user_timezone",
    "abs",
    "add_days",
    "add_months",
    "bintohex",
    "ceil",
    "coalesce",
    "concat",
    "concat_with_space",
    "currency_conversion",
    "curr_to_decfloat_amount",
    "datn_add_days",
    "datn_add_months",
    "datn_days_between",
    "dats_add_days",
    "dats_add_months",
    "dats_days_between",
    "dats_is_valid",
    "dats_tims_to_tstmp",
    "dayname",
    "days_between",
    "decimal_shift",
    "div",
    "division",
    "floor",
    "fltp_to_dec",
    "get_numeric_value",
    "hextobin",
    "instr",
    "is_valid",
    "left",
    "length",
    "lower",
    "lpad",
    "ltrim",
    "mod",
    "monthname",
    "replace",
    "replace_regexpr",
    "right",
    "round",
    "rpad",
    "rtrim",
    "substring",
    "tims_is_valid",
    "tstmp_add_seconds",
    "tstmp_current_utctimestamp",
    "tstmp_is_valid",
    "tstmp_seconds_between",
    "tstmp_to_dats",
    "tstmp_to_dst",
    "tstmp_to_tims",
    "unit_conversion",
    "upper",
    "utcl_add_seconds",
    "utcl_current",
    "utcl_seconds_between",
    "uuid",
    "weekday",
];

/// Default annotation paths whose value names an element of the same view.
pub const ELEMENT_REF_ANNOTATIONS: &[&str] = &[
    "Aggregation.referenceElement",
    "Consumption.derivation.binding.element",
    "DefaultAggregation.referenceElement",
    "ObjectModel.foreignKey.association",
    "ObjectModel.representativeKey",
    "ObjectModel.text.element",
    "Semantics.amount.currencyCode",
    "Semantics.quantity.unitOfMeasure",
];

/// Default annotation paths whose value names a parameter.
pub const PARAMETER_REF_ANNOTATIONS: &[&str] = &[
    "Consumption.derivation.binding.parameter",
    "Environment.systemField",
];

/// Default annotation paths whose value names an association.
pub const ASSOCIATION_REF_ANNOTATIONS: &[&str] = &[
    "ObjectModel.foreignKey.association",
    "ObjectModel.text.association",
];

/// Default annotation paths whose value names another entity.
pub const ENTITY_REF_ANNOTATIONS: &[&str] = &[
    "Consumption.valueHelpDefinition.entity.name",
    "ObjectModel.hierarchy.association",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(text))
}

pub fn is_aggregation_function(text: &str) -> bool {
    AGGREGATION_FUNCTIONS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(text))
}

pub fn is_builtin_function(text: &str) -> bool {
    BUILTIN_FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(text))
}

pub fn is_arithmetic_operator(text: &str) -> bool {
    ARITHMETIC_OPERATORS.contains(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_is_case_insensitive() {
        assert!(is_keyword("select"));
        assert!(is_keyword("Select"));
        assert!(is_keyword("UNION"));
        assert!(!is_keyword("CurrencyCode"));
    }

    #[test]
    fn test_aggregations_are_keywords() {
        for f in AGGREGATION_FUNCTIONS {
            assert!(is_keyword(f), "{f} must be in the keyword table");
        }
    }

    #[test]
    fn test_builtin_function_lookup() {
        assert!(is_builtin_function("concat"));
        assert!(is_builtin_function("CURRENCY_CONVERSION"));
        assert!(!is_builtin_function("sum"));
    }
}
