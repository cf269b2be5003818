//! Message template rendering.
//!
//! Templates use brace placeholders: `{field}` is replaced by the context
//! value of `field`, `{field:.2f}` formats a number with two decimals, and
//! `{{` / `}}` produce literal braces.

use serde_json::Value;
use tracing::warn;

use crate::error::{AlertError, Result};
use crate::types::AlertContext;

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(String),
    Field { name: &'a str, spec: Option<&'a str> },
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        literal.push_str(&rest[..pos]);
        let brace = &rest[pos..];

        if brace.starts_with("{{") {
            literal.push('{');
            rest = &brace[2..];
        } else if brace.starts_with("}}") {
            literal.push('}');
            rest = &brace[2..];
        } else if brace.starts_with('}') {
            return Err(AlertError::InvalidTemplate {
                reason: format!("single '}}' at offset {}", template.len() - brace.len()),
            });
        } else {
            let Some(end) = brace.find('}') else {
                return Err(AlertError::InvalidTemplate {
                    reason: format!("unclosed '{{' at offset {}", template.len() - brace.len()),
                });
            };
            let inner = &brace[1..end];
            let (name, spec) = match inner.split_once(':') {
                Some((name, spec)) => (name, Some(spec)),
                None => (inner, None),
            };
            let name = name.trim();
            if name.is_empty() || name.contains('{') {
                return Err(AlertError::InvalidTemplate {
                    reason: format!("placeholder '{{{inner}}}' has no field name"),
                });
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field { name, spec });
            rest = &brace[end + 1..];
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Checks the template's syntax and returns the field names it references.
///
/// # Errors
///
/// Returns `AlertError::InvalidTemplate` for unbalanced braces or empty
/// placeholders.
pub fn validate(template: &str) -> Result<Vec<String>> {
    Ok(parse(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Field { name, .. } => Some(name.to_string()),
            Segment::Literal(_) => None,
        })
        .collect())
}

/// Renders `template` with values from `context`.
///
/// # Errors
///
/// Returns `AlertError::InvalidTemplate` for malformed templates and
/// `AlertError::MissingField` for the first placeholder absent from `context`.
pub fn render(template: &str, context: &AlertContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());

    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Field { name, spec } => {
                let value = context.get(name).ok_or_else(|| AlertError::MissingField {
                    field: name.to_string(),
                })?;
                out.push_str(&format_value(value, spec));
            }
        }
    }

    Ok(out)
}

/// Renders `template`, degrading instead of failing.
///
/// When rendering fails the template itself is returned with a note naming
/// the problem, so the alert is still delivered.
pub fn render_lossy(template: &str, context: &AlertContext, rule: &str) -> String {
    match render(template, context) {
        Ok(message) => message,
        Err(AlertError::MissingField { field }) => {
            warn!(rule = %rule, field = %field, "alert context is missing a template field");
            format!("{template} (context incomplete: missing field '{field}')")
        }
        Err(e) => {
            warn!(rule = %rule, error = %e, "alert template could not be rendered");
            format!("{template} ({e})")
        }
    }
}

/// Plain-text form of a context value: strings without quotes, everything
/// else as JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_value(value: &Value, spec: Option<&str>) -> String {
    let precision = spec
        .and_then(|s| s.strip_prefix('.'))
        .and_then(|s| s.strip_suffix('f'))
        .and_then(|digits| digits.parse::<usize>().ok());

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };

    match (precision, number) {
        (Some(precision), Some(number)) => format!("{number:.precision$}"),
        _ => display_value(value),
    }
}
