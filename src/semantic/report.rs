//! Tab-separated field report.
//!
//! One row per selected field across every view in build order, with the
//! expression statistics, the resolved direct source, and the requested
//! annotations with their provenance. The output pastes directly into a
//! spreadsheet.

use std::fmt::Write as _;

use crate::base::name_key;
use crate::semantic::model::{AnnotationOwner, Model, SourceField};
use crate::semantic::resolve::Resolution;

const LINE_SEP: &str = if cfg!(windows) { "\r\n" } else { "\n" };
const TAB: char = '\t';

impl Model {
    /// Render the field report, with two extra columns per requested
    /// annotation path: the value and, for inherited entries, the declaring
    /// `view.field`.
    pub fn render_report(&self, annotation_paths: &[&str]) -> String {
        let mut out = String::new();

        out.push_str(
            "ID\tPackage\tView\tPos\tField\tLiterals\tCASTs\tCASEs\tFunctions\tAggregations\
             \tDirect Source View\tDirect Source Field",
        );
        for path in annotation_paths {
            let column = match path.rsplit_once('.') {
                Some((prefix, leaf)) if !prefix.is_empty() => leaf,
                _ => path,
            };
            let _ = write!(out, "{TAB}{column}{TAB}Source of {column}");
        }
        out.push_str(LINE_SEP);

        for (_, view) in self.views_in_order() {
            // file names follow the `<package> - <object>` download convention
            let package = match view.file_name.find(" - ") {
                Some(pos) if pos > 0 => &view.file_name[..pos],
                _ => "",
            };
            for &field_id in &view.fields {
                let field = self.field(field_id);
                if field.is_exposed_association {
                    continue;
                }

                let _ = write!(out, "{}.{}", view.entity_name, field.name);
                let _ = write!(out, "{TAB}{package}");
                let _ = write!(out, "{TAB}{}", view.entity_name);
                let _ = write!(out, "{TAB}{}", field.position);
                if field.is_virtual {
                    let _ = write!(out, "{TAB}({})", field.name);
                } else {
                    let _ = write!(out, "{TAB}{}", field.name);
                }

                let stats = field.stats;
                let _ = write!(
                    out,
                    "{TAB}{}{TAB}{}{TAB}{}{TAB}{}{TAB}{}",
                    stats.literals, stats.casts, stats.cases, stats.functions, stats.aggregations
                );

                match self.resolve_source(field_id) {
                    Resolution::Source(SourceField::Field(source)) => {
                        let source = self.field(source);
                        let source_view = self.view(source.view);
                        let _ = write!(
                            out,
                            "{TAB}{}{TAB}{}",
                            source_view.entity_name, source.name
                        );
                    }
                    Resolution::Source(SourceField::Inferred(inferred)) => {
                        let data_source = self.data_source(inferred.data_source);
                        let _ = write!(
                            out,
                            "{TAB}({}){TAB}{}",
                            data_source.entity_name, inferred.name
                        );
                    }
                    Resolution::Unresolved | Resolution::Cyclic => {
                        let _ = write!(out, "{TAB}{TAB}");
                    }
                }

                for path in annotation_paths {
                    match field.annotations.get(&name_key(path)) {
                        Some(annotation) => {
                            let _ = write!(out, "{TAB}{}", annotation.value);
                            let provenance = match annotation.owner {
                                AnnotationOwner::Field(owner) if owner != field_id => {
                                    let owner = self.field(owner);
                                    Some((self.view(owner.view).entity_name.clone(), owner.name.clone()))
                                }
                                _ => None,
                            };
                            match provenance {
                                Some((owner_view, owner_field)) => {
                                    let _ = write!(out, "{TAB}{owner_view}.{owner_field}");
                                }
                                None => out.push(TAB),
                            }
                        }
                        None => {
                            let _ = write!(out, "{TAB}{TAB}");
                        }
                    }
                }
                out.push_str(LINE_SEP);
            }
        }
        out
    }
}
