//! # viewlens
//!
//! Cross-file analysis of CDS-style view DDL: field lineage, expression
//! statistics, and annotation inheritance.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! semantic  → Model arenas, source resolution, inheritance, report
//!   ↓
//! parser    → Logos lexer, command segmentation and classification
//!   ↓
//! base      → Primitives (name keys, dialect tables)
//! ```
//!
//! ## Usage
//!
//! ```
//! use viewlens::semantic::Analyzer;
//!
//! let mut analyzer = Analyzer::new();
//! analyzer.add_source(
//!     "demo",
//!     "define view entity Demo as select from t100 { t100.amount as Amount }",
//! );
//! analyzer.finish_build();
//! analyzer.inherit_annotations(&["Semantics.amount.currencyCode"]);
//! let report = analyzer.render_report(&["Semantics.amount.currencyCode"]);
//! assert!(report.contains("Demo.Amount"));
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → semantic)
// ============================================================================

/// Foundation: case-insensitive name keys, dialect keyword/function tables
pub mod base;

/// Parser: Logos lexer, command segmentation and classification
pub mod parser;

/// Semantic analysis: model building, resolution, inheritance, report
pub mod semantic;

// Re-export the entry points
pub use parser::{parse_source, CommandSeq};
pub use semantic::{Analyzer, AnnotationCatalog, Diagnostic, Model, Resolution, Severity};
