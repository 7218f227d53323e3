//! Annotation references, replayed verbatim by the generator.

use serde::{Deserialize, Serialize};

use super::names::ClassName;

/// An annotation use: its class and argument list in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationSpec {
    pub class: ClassName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<AnnotationMember>,
}

/// One annotation argument, positional when `name` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: AnnotationValue,
}

/// The value of an annotation argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    String(String),
    /// Numeric (or other) literal text, emitted as written.
    Literal(String),
    Boolean(bool),
    Char(char),
    Enum { class: ClassName, entry: String },
    Class(ClassName),
    Array(Vec<AnnotationValue>),
    Annotation(AnnotationSpec),
}

impl AnnotationSpec {
    pub fn new(class: ClassName) -> Self {
        Self {
            class,
            members: Vec::new(),
        }
    }

    /// Adds a positional argument.
    pub fn with_value(mut self, value: AnnotationValue) -> Self {
        self.members.push(AnnotationMember { name: None, value });
        self
    }

    /// Adds a named argument.
    pub fn with_member(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.members.push(AnnotationMember {
            name: Some(name.into()),
            value,
        });
        self
    }

    /// The first argument if it is a string, as carried by `@Named`.
    pub fn first_string(&self) -> Option<&str> {
        match self.members.first().map(|m| &m.value) {
            Some(AnnotationValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Visits the annotation class and every class its arguments reference.
    pub fn visit_classes<'a>(&'a self, visit: &mut impl FnMut(&'a ClassName)) {
        visit(&self.class);
        for member in &self.members {
            member.value.visit_classes(visit);
        }
    }
}

impl AnnotationValue {
    fn visit_classes<'a>(&'a self, visit: &mut impl FnMut(&'a ClassName)) {
        match self {
            AnnotationValue::Enum { class, .. } | AnnotationValue::Class(class) => visit(class),
            AnnotationValue::Array(values) => {
                for value in values {
                    value.visit_classes(visit);
                }
            }
            AnnotationValue::Annotation(spec) => spec.visit_classes(visit),
            AnnotationValue::String(_)
            | AnnotationValue::Literal(_)
            | AnnotationValue::Boolean(_)
            | AnnotationValue::Char(_) => {}
        }
    }
}
