//! Class and type references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Returns true if `name` is a valid Kotlin/Java identifier.
///
/// Backtick-quoted names are not accepted; escaping is the renderer's job.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// A reference to a possibly nested class.
///
/// Serialized as its canonical dotted name, e.g. `com.example.Outer.Inner`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassName {
    package: String,
    simple_names: Vec<String>,
}

impl ClassName {
    /// Creates a class name, validating every segment.
    pub fn new<S: Into<String>>(
        package: impl Into<String>,
        simple_names: impl IntoIterator<Item = S>,
    ) -> Result<Self, AppError> {
        let package = package.into();
        let simple_names: Vec<String> = simple_names.into_iter().map(Into::into).collect();

        if simple_names.is_empty() {
            return Err(AppError::InvalidName(format!(
                "class in package '{}' has no name",
                package
            )));
        }
        if let Some(bad) = simple_names.iter().find(|n| !is_identifier(n)) {
            return Err(AppError::InvalidName(format!(
                "'{}' is not a valid class name segment",
                bad
            )));
        }
        if !package.is_empty() && !package.split('.').all(is_identifier) {
            return Err(AppError::InvalidName(format!(
                "'{}' is not a valid package",
                package
            )));
        }

        Ok(Self {
            package,
            simple_names,
        })
    }

    /// Builds a name from literals known to be valid.
    pub(crate) fn builtin(package: &str, simple_names: &[&str]) -> Self {
        Self {
            package: package.to_string(),
            simple_names: simple_names.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parses a canonical dotted name.
    ///
    /// The package ends before the first segment starting with an uppercase
    /// letter: `dagger.Component.Builder` is class `Component.Builder` in
    /// package `dagger`.
    pub fn parse(canonical: &str) -> Result<Self, AppError> {
        let segments: Vec<&str> = canonical.split('.').collect();
        let split = segments
            .iter()
            .position(|s| s.chars().next().is_some_and(char::is_uppercase))
            .ok_or_else(|| {
                AppError::InvalidName(format!("'{}' does not name a class", canonical))
            })?;

        Self::new(segments[..split].join("."), segments[split..].iter().copied())
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Nested-name chain, outermost first.
    pub fn simple_names(&self) -> &[String] {
        &self.simple_names
    }

    /// The innermost name.
    pub fn simple_name(&self) -> &str {
        // Non-empty by construction.
        self.simple_names.last().map(String::as_str).unwrap_or_default()
    }

    /// The outermost enclosing class, or `self` for top-level classes.
    pub fn top_level(&self) -> ClassName {
        Self {
            package: self.package.clone(),
            simple_names: self.simple_names[..1].to_vec(),
        }
    }

    /// A class nested inside this one.
    pub fn nested(&self, name: impl Into<String>) -> Result<ClassName, AppError> {
        let mut simple_names = self.simple_names.clone();
        simple_names.push(name.into());
        Self::new(self.package.clone(), simple_names)
    }

    /// The enclosing class, if this one is nested.
    pub fn enclosing(&self) -> Option<ClassName> {
        (self.simple_names.len() > 1).then(|| Self {
            package: self.package.clone(),
            simple_names: self.simple_names[..self.simple_names.len() - 1].to_vec(),
        })
    }

    /// The same class as a non-nullable type without arguments.
    pub fn to_type(&self) -> TypeName {
        TypeName::new(self.clone())
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            write!(f, "{}.", self.package)?;
        }
        write!(f, "{}", self.simple_names.join("."))
    }
}

impl TryFrom<String> for ClassName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClassName> for String {
    fn from(value: ClassName) -> Self {
        value.to_string()
    }
}

/// Use-site variance of a type argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    #[default]
    Invariant,
    Out,
    In,
}

/// A type argument: `*`, `T`, `out T` or `in T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeArgument {
    Star,
    Type {
        #[serde(default)]
        variance: Variance,
        #[serde(rename = "type")]
        type_name: TypeName,
    },
}

/// A use of a class as a type, with arguments and nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName {
    pub class: ClassName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<TypeArgument>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl TypeName {
    pub fn new(class: ClassName) -> Self {
        Self {
            class,
            arguments: Vec::new(),
            nullable: false,
        }
    }

    /// Adds an invariant type argument.
    pub fn with_argument(mut self, argument: TypeName) -> Self {
        self.arguments.push(TypeArgument::Type {
            variance: Variance::Invariant,
            type_name: argument,
        });
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Visits this class and every class in its arguments, depth first.
    pub fn visit_classes<'a>(&'a self, visit: &mut impl FnMut(&'a ClassName)) {
        visit(&self.class);
        for argument in &self.arguments {
            if let TypeArgument::Type { type_name, .. } = argument {
                type_name.visit_classes(visit);
            }
        }
    }
}
