//! Selection-set rendering.

use crate::{
    encode::encode_arguments,
    error::{BuildError, Result},
    fields::{Directive, Field, Fields},
};

/// One nesting level.
pub const INDENT_STEP: &str = "  ";

/// Renders a selection specification at the given indent.
///
/// An empty selection renders as empty text and names are emitted
/// verbatim. List items are rendered independently,
/// trimmed and joined by a newline plus `indent`. Nodes render as
/// `alias: name(args) @directives { ... }`, the block being present only
/// when the node has a nested selection. Indentation is cosmetic.
///
/// # Errors
///
/// [`BuildError::MalformedFields`] when a node or directive has an empty name.
pub fn render_fields(fields: &Fields, indent: &str) -> Result<String> {
    match fields {
        Fields::Empty => Ok(String::new()),
        Fields::Name(name) => Ok(name.clone()),
        Fields::List(items) => {
            let rendered = items
                .iter()
                .map(|item| render_fields(item, indent).map(|text| text.trim().to_string()))
                .collect::<Result<Vec<_>>>()?;
            Ok(rendered.join(&format!("\n{indent}")))
        }
        Fields::Node(field) => render_field(field, indent),
    }
}

fn render_field(field: &Field, indent: &str) -> Result<String> {
    if field.name.trim().is_empty() {
        return Err(BuildError::malformed("field node has no name"));
    }

    let mut out = match &field.alias {
        Some(alias) if !alias.is_empty() => format!("{}: {}", alias, field.name),
        _ => field.name.clone(),
    };

    if !field.args.is_empty() {
        out.push('(');
        out.push_str(&encode_arguments(&field.args));
        out.push(')');
    }

    if !field.directives.is_empty() {
        let directives = field
            .directives
            .iter()
            .map(render_directive)
            .collect::<Result<Vec<_>>>()?;
        out.push(' ');
        out.push_str(&directives.join(" "));
    }

    if let Some(nested) = &field.fields {
        let inner = format!("{indent}{INDENT_STEP}");
        let body = render_fields(nested, &inner)?;
        out.push_str(&format!(" {{\n{inner}{body}\n{indent}}}"));
    }

    Ok(out)
}

/// Renders `@name` or `@name(arg: value, ...)`.
pub fn render_directive(directive: &Directive) -> Result<String> {
    if directive.name.trim().is_empty() {
        return Err(BuildError::malformed("directive has no name"));
    }

    if directive.args.is_empty() {
        Ok(format!("@{}", directive.name))
    } else {
        Ok(format!(
            "@{}({})",
            directive.name,
            encode_arguments(&directive.args)
        ))
    }
}
