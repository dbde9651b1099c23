//! Doc-comment annotation of serialized configuration.

use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Renders `docs` as `#` comment lines.
fn comment_lines(docs: &str) -> String {
    docs.lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect()
}

/// Adds `docs` as comments after whatever prefix `decor` already carries,
/// separated by an empty comment line when the prefix ends in text.
pub fn prepend_doc_comments(decor: &mut Decor, docs: &str) {
    let comments = comment_lines(docs);
    let existing = decor.prefix().and_then(RawString::as_str).unwrap_or("");

    let prefix = match existing.lines().last() {
        None => comments,
        Some("") => format!("{existing}{comments}"),
        Some(_) if existing.ends_with('\n') => format!("{existing}#\n{comments}"),
        Some(_) => format!("{existing}\n#\n{comments}"),
    };
    decor.set_prefix(prefix);
}

/// Writes the field docs of `T` above each key of `table`.
///
/// Nested tables get the container docs of `T` as well unless `is_root`.
/// Keys with no matching field are left bare.
pub fn annotate_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        prepend_doc_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let name = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&name) else {
            warn!(
                "Field '{}' has no documentation in '{}'",
                name,
                type_name::<T>()
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(name)),
            Item::Value(_) => prepend_doc_comments(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => prepend_doc_comments(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(array) => {
                if let Some(first) = array.iter_mut().next() {
                    prepend_doc_comments(first.decor_mut(), docs);
                }
            }
        }
    }

    Ok(())
}
