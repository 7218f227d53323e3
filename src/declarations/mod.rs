//! Symbol data describing declared classes, as handed to the parser.
//!
//! Declarations come from two sources:
//! - Kotlin sources, read by [`kotlin::read_source`] (headers and signatures only)
//! - JSON symbol dumps holding one [`SourceFile`] or an array of them
//!
//! All names are resolved to [`ClassName`]s when a source is loaded, so the
//! parser only deals with fully-qualified references.

mod kotlin;
mod loader;
mod symbols;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{AnnotationSpec, ClassName, TypeName};

pub use kotlin::read_source;
pub use loader::{load_sources, read_json, LoadedSources, RejectedSource};
pub use symbols::{DeclarationHandle, DeclarationOrigin, SymbolEntry, SymbolTable};

/// One compilation unit worth of declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path the declarations were read from, used to attribute failures.
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub declarations: Vec<ClassDeclaration>,
}

/// The flavor of a class-like declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Interface,
    Class,
    AbstractClass,
    Object,
    AnnotationClass,
}

/// A class, interface, object or annotation class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
    #[serde(default)]
    pub supertypes: Vec<TypeName>,
    #[serde(default)]
    pub functions: Vec<FunctionDeclaration>,
    #[serde(default)]
    pub nested: Vec<ClassDeclaration>,
}

/// A member function signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    /// Contract members are abstract; JSON dumps default to `true`.
    #[serde(default = "default_abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
    #[serde(default)]
    pub parameters: Vec<ParameterDeclaration>,
    #[serde(default)]
    pub return_type: Option<TypeName>,
}

/// A value parameter of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
    #[serde(rename = "type")]
    pub type_name: TypeName,
}

fn default_abstract() -> bool {
    true
}

impl ClassDeclaration {
    /// Returns true if this declaration carries an annotation of `class`.
    pub fn is_annotated_with(&self, class: &ClassName) -> bool {
        has_annotation(&self.annotations, class)
    }

    /// Abstract member functions in declaration order.
    pub fn abstract_functions(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.functions.iter().filter(|f| f.is_abstract)
    }

    /// The first nested declaration carrying an annotation of `class`.
    pub fn nested_annotated_with(&self, class: &ClassName) -> Option<&ClassDeclaration> {
        self.nested.iter().find(|n| n.is_annotated_with(class))
    }
}

/// Returns true if any annotation in `annotations` is of `class`.
pub fn has_annotation(annotations: &[AnnotationSpec], class: &ClassName) -> bool {
    annotations.iter().any(|a| &a.class == class)
}
