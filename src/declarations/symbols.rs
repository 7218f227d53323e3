//! Symbol table and the declaration handles passed through the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::{ClassDeclaration, SourceFile};
use crate::models::ClassName;

/// Where a declaration came from, used to attribute results and failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationOrigin {
    pub path: PathBuf,
    pub declaration: String,
}

impl fmt::Display for DeclarationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.as_os_str().is_empty() {
            write!(f, "{}", self.declaration)
        } else {
            write!(f, "{} ({})", self.declaration, self.path.display())
        }
    }
}

/// A class declaration indexed under its fully-qualified name.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub class_name: ClassName,
    pub path: PathBuf,
    pub declaration: ClassDeclaration,
}

/// Every class declared across a set of sources, nested classes included.
///
/// Entries keep source order; lookups go through an ordered index.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    index: BTreeMap<ClassName, usize>,
}

impl SymbolTable {
    /// Builds a table from loaded sources.
    ///
    /// A class declared twice keeps its first declaration.
    pub fn new(files: impl IntoIterator<Item = SourceFile>) -> Self {
        let mut table = Self::default();
        for file in files {
            for declaration in file.declarations {
                table.insert(&file.package, &[], &file.path, declaration);
            }
        }
        table
    }

    fn insert(
        &mut self,
        package: &str,
        outer: &[String],
        path: &Path,
        declaration: ClassDeclaration,
    ) {
        let mut names = outer.to_vec();
        names.push(declaration.name.clone());

        let class_name = match ClassName::new(package, names.clone()) {
            Ok(class_name) => class_name,
            Err(e) => {
                tracing::warn!("Skipping declaration in {}: {}", path.display(), e);
                return;
            }
        };

        let nested = declaration.nested.clone();

        if self.index.contains_key(&class_name) {
            tracing::warn!("Duplicate declaration of {}, keeping the first", class_name);
        } else {
            self.index.insert(class_name.clone(), self.entries.len());
            self.entries.push(SymbolEntry {
                class_name,
                path: path.to_path_buf(),
                declaration,
            });
        }

        for inner in nested {
            self.insert(package, &names, path, inner);
        }
    }

    pub fn get(&self, class_name: &ClassName) -> Option<&SymbolEntry> {
        self.index.get(class_name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles for every class annotated with `trigger`, in source order.
    pub fn discover(self: &Arc<Self>, trigger: &ClassName) -> Vec<DeclarationHandle> {
        self.entries
            .iter()
            .filter(|entry| entry.declaration.is_annotated_with(trigger))
            .map(|entry| DeclarationHandle::new(self.clone(), entry.class_name.clone()))
            .collect()
    }
}

/// An opaque reference to one component declaration.
///
/// Cheap to clone and safe to move across tasks; the table is shared.
#[derive(Debug, Clone)]
pub struct DeclarationHandle {
    symbols: Arc<SymbolTable>,
    class_name: ClassName,
}

impl DeclarationHandle {
    pub fn new(symbols: Arc<SymbolTable>, class_name: ClassName) -> Self {
        Self {
            symbols,
            class_name,
        }
    }

    pub fn class_name(&self) -> &ClassName {
        &self.class_name
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The declaration this handle points at, if the table has it.
    pub fn entry(&self) -> Option<&SymbolEntry> {
        self.symbols.get(&self.class_name)
    }

    pub fn origin(&self) -> DeclarationOrigin {
        DeclarationOrigin {
            path: self.entry().map(|e| e.path.clone()).unwrap_or_default(),
            declaration: self.class_name.canonical(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::ClassKind;
    use crate::models::AnnotationSpec;

    fn class(name: &str, annotations: &[&str], nested: Vec<ClassDeclaration>) -> ClassDeclaration {
        ClassDeclaration {
            name: name.to_string(),
            kind: ClassKind::Interface,
            annotations: annotations
                .iter()
                .map(|a| AnnotationSpec::new(ClassName::parse(a).unwrap()))
                .collect(),
            supertypes: Vec::new(),
            functions: Vec::new(),
            nested,
        }
    }

    fn table() -> Arc<SymbolTable> {
        let trigger = "com.example.Backstab";
        Arc::new(SymbolTable::new([
            SourceFile {
                path: PathBuf::from("a.kt"),
                package: "com.example".to_string(),
                declarations: vec![
                    class("First", &[trigger], Vec::new()),
                    class(
                        "Outer",
                        &[],
                        vec![class("Inner", &[trigger], Vec::new())],
                    ),
                ],
            },
            SourceFile {
                path: PathBuf::from("b.kt"),
                package: "com.example".to_string(),
                declarations: vec![
                    class("Last", &[trigger], Vec::new()),
                    class("First", &[], Vec::new()),
                ],
            },
        ]))
    }

    #[test]
    fn test_indexes_nested_declarations() {
        let table = table();
        let inner = ClassName::parse("com.example.Outer.Inner").unwrap();
        let entry = table.get(&inner).unwrap();
        assert_eq!(entry.declaration.name, "Inner");
        assert_eq!(entry.path, PathBuf::from("a.kt"));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let table = table();
        let first = ClassName::parse("com.example.First").unwrap();
        assert_eq!(table.get(&first).unwrap().path, PathBuf::from("a.kt"));
    }

    #[test]
    fn test_discover_returns_annotated_in_source_order() {
        let table = table();
        let trigger = ClassName::parse("com.example.Backstab").unwrap();
        let found: Vec<String> = table
            .discover(&trigger)
            .iter()
            .map(|h| h.class_name().canonical())
            .collect();

        assert_eq!(
            found,
            [
                "com.example.First",
                "com.example.Outer.Inner",
                "com.example.Last"
            ]
        );
    }

    #[test]
    fn test_origin_display() {
        let table = table();
        let handle = DeclarationHandle::new(table, ClassName::parse("com.example.Last").unwrap());
        assert_eq!(handle.origin().to_string(), "com.example.Last (b.kt)");
    }
}
