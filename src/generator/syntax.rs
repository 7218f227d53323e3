//! Kotlin source fragments: identifiers, literals, types and annotations.

use super::imports::ImportSet;
use crate::models::{AnnotationSpec, AnnotationValue, TypeArgument, TypeName, Variance};

/// Kotlin hard keywords, which need backticks when used as names.
const HARD_KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

pub(crate) fn escape_identifier(name: &str) -> String {
    if HARD_KEYWORDS.contains(&name) {
        format!("`{}`", name)
    } else {
        name.to_string()
    }
}

/// Escapes each segment of a dotted name.
pub(crate) fn escape_dotted(name: &str) -> String {
    name.split('.')
        .map(escape_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

fn escape_char(c: char, quote: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\u{8}' => out.push_str("\\b"),
        '$' if quote == '"' => out.push_str("\\$"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c => out.push(c),
    }
}

pub(crate) fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        escape_char(c, '"', &mut out);
    }
    out.push('"');
    out
}

pub(crate) fn char_literal(value: char) -> String {
    let mut out = String::from("'");
    escape_char(value, '\'', &mut out);
    out.push('\'');
    out
}

pub(crate) fn render_type(type_name: &TypeName, imports: &ImportSet) -> String {
    let mut out = imports.reference(&type_name.class);
    if !type_name.arguments.is_empty() {
        let arguments: Vec<String> = type_name
            .arguments
            .iter()
            .map(|argument| match argument {
                TypeArgument::Star => "*".to_string(),
                TypeArgument::Type {
                    variance,
                    type_name,
                } => {
                    let rendered = render_type(type_name, imports);
                    match variance {
                        Variance::Invariant => rendered,
                        Variance::Out => format!("out {}", rendered),
                        Variance::In => format!("in {}", rendered),
                    }
                }
            })
            .collect();
        out.push('<');
        out.push_str(&arguments.join(", "));
        out.push('>');
    }
    if type_name.nullable {
        out.push('?');
    }
    out
}

/// Renders an annotation use, e.g. `@Named("primary")`.
pub(crate) fn render_annotation(spec: &AnnotationSpec, imports: &ImportSet) -> String {
    format!("@{}", annotation_body(spec, imports))
}

// Nested annotation arguments are written without the `@`.
fn annotation_body(spec: &AnnotationSpec, imports: &ImportSet) -> String {
    let mut out = imports.reference(&spec.class);
    if spec.members.is_empty() {
        return out;
    }

    let members: Vec<String> = spec
        .members
        .iter()
        .map(|member| {
            let value = render_value(&member.value, imports);
            match &member.name {
                Some(name) => format!("{} = {}", escape_identifier(name), value),
                None => value,
            }
        })
        .collect();
    out.push('(');
    out.push_str(&members.join(", "));
    out.push(')');
    out
}

fn render_value(value: &AnnotationValue, imports: &ImportSet) -> String {
    match value {
        AnnotationValue::String(s) => string_literal(s),
        AnnotationValue::Literal(text) => text.clone(),
        AnnotationValue::Boolean(b) => b.to_string(),
        AnnotationValue::Char(c) => char_literal(*c),
        AnnotationValue::Enum { class, entry } => {
            format!("{}.{}", imports.reference(class), escape_identifier(entry))
        }
        AnnotationValue::Class(class) => format!("{}::class", imports.reference(class)),
        AnnotationValue::Array(values) => {
            let values: Vec<String> = values.iter().map(|v| render_value(v, imports)).collect();
            format!("[{}]", values.join(", "))
        }
        AnnotationValue::Annotation(spec) => annotation_body(spec, imports),
    }
}
