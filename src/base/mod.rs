//! Foundation types for the viewlens analyzer.
//!
//! This module provides fundamentals used throughout the crate:
//! - [`name_key`] - Case-insensitive lookup keys for entity/field/alias names
//! - [`dialect`] - Constant tables of the view-DDL dialect (keywords,
//!   aggregation and built-in functions, annotation reference paths)
//!
//! This module has NO dependencies on other viewlens modules.

pub mod dialect;

use smol_str::SmolStr;

/// Build the case-insensitive lookup key for an identifier.
///
/// The dialect compares entity names, aliases, field names, and annotation
/// paths without regard to case; all lookup maps are keyed by this form.
pub fn name_key(identifier: &str) -> SmolStr {
    SmolStr::new(identifier.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_folds_case() {
        assert_eq!(name_key("I_BusinessPartner"), "I_BUSINESSPARTNER");
        assert_eq!(name_key("_Currency"), "_CURRENCY");
        assert_eq!(name_key("already_upper"), "ALREADY_UPPER");
    }
}
