//! Import bookkeeping for one generated file.
//!
//! Every class a file references is claimed once, in emission order. The
//! first class to claim a simple name owns it and is written by that name;
//! later classes with the same simple name are written fully qualified.
//! The one exception follows Kotlin's own lookup: a class from the file's
//! package takes a name over from a default-import class.

use super::syntax::{escape_dotted, escape_identifier};
use crate::models::ClassName;

/// Packages every Kotlin file imports implicitly.
const DEFAULT_PACKAGES: &[&str] = &[
    "kotlin",
    "kotlin.annotation",
    "kotlin.collections",
    "kotlin.comparisons",
    "kotlin.io",
    "kotlin.jvm",
    "kotlin.ranges",
    "kotlin.sequences",
    "kotlin.text",
    "java.lang",
];

#[derive(Debug, Clone)]
pub(crate) struct ImportSet {
    package: String,
    /// Simple name to the top-level class that owns it, in claim order.
    claims: Vec<(String, ClassName)>,
}

impl ImportSet {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            claims: Vec::new(),
        }
    }

    /// Claims the simple name of `class`'s top-level class, unless another
    /// class already owns it.
    pub fn claim(&mut self, class: &ClassName) {
        let top = class.top_level();
        let name = top.simple_name().to_string();
        match self.claims.iter_mut().find(|(claimed, _)| *claimed == name) {
            None => self.claims.push((name, top)),
            // Same-package names shadow default imports.
            Some((_, owner))
                if is_default_package(owner.package()) && top.package() == self.package =>
            {
                *owner = top;
            }
            Some(_) => {}
        }
    }

    fn owns(&self, top: &ClassName) -> bool {
        self.claims
            .iter()
            .any(|(name, owner)| name == top.simple_name() && owner == top)
    }

    /// How `class` is written in this file.
    pub fn reference(&self, class: &ClassName) -> String {
        let names: Vec<String> = class
            .simple_names()
            .iter()
            .map(|n| escape_identifier(n))
            .collect();

        if self.owns(&class.top_level()) || class.package().is_empty() {
            names.join(".")
        } else {
            format!("{}.{}", escape_dotted(class.package()), names.join("."))
        }
    }

    /// Import lines for owned classes outside this file's package, sorted.
    pub fn imports(&self) -> Vec<String> {
        let mut imports: Vec<String> = self
            .claims
            .iter()
            .map(|(_, class)| class)
            .filter(|class| {
                let package = class.package();
                !package.is_empty() && package != self.package && !is_default_package(package)
            })
            .map(|class| escape_dotted(&class.canonical()))
            .collect();
        imports.sort();
        imports
    }
}

fn is_default_package(package: &str) -> bool {
    DEFAULT_PACKAGES.contains(&package)
}
