//! Reader for Kotlin declaration headers.
//!
//! Parses a Kotlin source with the grammar in `kotlin.pest`, then resolves
//! every type and annotation name against the file's imports, its own
//! declarations and Kotlin's default imports.
//!
//! # Example
//!
//! ```ignore
//! use backstab::declarations::read_source;
//!
//! let file = read_source(
//!     "Foo.kt",
//!     "package com.example\nimport dagger.Component\n@Component interface Foo",
//! )
//! .unwrap();
//! assert_eq!(file.declarations[0].annotations[0].class.canonical(), "dagger.Component");
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::{ClassDeclaration, ClassKind, FunctionDeclaration, ParameterDeclaration, SourceFile};
use crate::error::AppError;
use crate::models::{
    AnnotationMember, AnnotationSpec, AnnotationValue, ClassName, TypeArgument, TypeName,
    Variance,
};

#[derive(Parser)]
#[grammar = "declarations/kotlin.pest"]
struct KotlinParser;

/// Reads the declarations of one Kotlin source file.
pub fn read_source(path: impl Into<PathBuf>, text: &str) -> Result<SourceFile, AppError> {
    let path = path.into();
    let syntax_error = |message: String| AppError::SourceSyntax {
        path: path.clone(),
        message,
    };

    let file = KotlinParser::parse(Rule::file, text)
        .map_err(|e| syntax_error(e.to_string()))?
        .next()
        .ok_or_else(|| syntax_error("empty source".to_string()))?;

    let mut package = String::new();
    let mut imports = Vec::new();
    let mut classes = Vec::new();
    let mut aliases = Vec::new();

    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::package_header => {
                package = pair
                    .into_inner()
                    .next()
                    .map(|name| qualified_name(name).join("."))
                    .unwrap_or_default();
            }
            Rule::import_header => imports.push(read_import(pair)),
            Rule::class_declaration => classes.push(read_class(pair)),
            Rule::typealias_declaration => aliases.extend(first_identifier(pair)),
            _ => {}
        }
    }

    let resolver = Resolver::new(package.clone(), imports, &classes, aliases);
    let declarations = classes
        .iter()
        .map(|class| resolver.class(class, &[], &[]))
        .collect::<Result<Vec<_>, String>>()
        .map_err(syntax_error)?;

    tracing::trace!(
        "Read {} top-level declarations from {}",
        declarations.len(),
        path.display()
    );

    Ok(SourceFile {
        path,
        package,
        declarations,
    })
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Debug)]
struct RawImport {
    segments: Vec<String>,
    alias: Option<String>,
    star: bool,
}

#[derive(Debug)]
struct RawClass {
    name: String,
    kind: ClassKind,
    annotations: Vec<RawAnnotation>,
    supertypes: Vec<RawType>,
    functions: Vec<RawFunction>,
    nested: Vec<RawClass>,
}

#[derive(Debug)]
struct RawFunction {
    name: String,
    abstract_modifier: bool,
    has_body: bool,
    annotations: Vec<RawAnnotation>,
    parameters: Vec<RawParameter>,
    return_type: Option<RawType>,
}

#[derive(Debug)]
struct RawParameter {
    name: String,
    annotations: Vec<RawAnnotation>,
    type_ref: RawType,
}

#[derive(Debug)]
struct RawType {
    segments: Vec<String>,
    arguments: Vec<RawProjection>,
    nullable: bool,
}

#[derive(Debug)]
enum RawProjection {
    Star,
    Type(Variance, RawType),
}

#[derive(Debug)]
struct RawAnnotation {
    segments: Vec<String>,
    arguments: Vec<(Option<String>, RawValue)>,
}

#[derive(Debug)]
enum RawValue {
    String(String),
    Char(char),
    Boolean(bool),
    Literal(String),
    Class(Vec<String>),
    Array(Vec<RawValue>),
    Annotation(RawAnnotation),
    Reference(Vec<String>),
}

fn identifier(pair: &Pair<Rule>) -> String {
    pair.as_str().trim_matches('`').to_string()
}

fn first_identifier(pair: Pair<Rule>) -> Option<String> {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::identifier)
        .map(|p| identifier(&p))
}

fn qualified_name(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| identifier(&p)).collect()
}

fn read_import(pair: Pair<Rule>) -> RawImport {
    let mut import = RawImport {
        segments: Vec::new(),
        alias: None,
        star: false,
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::qualified_name => import.segments = qualified_name(inner),
            Rule::import_star => import.star = true,
            Rule::import_alias => import.alias = first_identifier(inner),
            _ => {}
        }
    }
    import
}

fn read_class(pair: Pair<Rule>) -> RawClass {
    let mut class = RawClass {
        name: String::new(),
        kind: ClassKind::Class,
        annotations: Vec::new(),
        supertypes: Vec::new(),
        functions: Vec::new(),
        nested: Vec::new(),
    };
    let mut modifiers = Vec::new();
    let mut keyword = "class";

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => class.annotations.push(read_annotation(inner)),
            Rule::modifier => modifiers.push(inner.as_str()),
            Rule::class_keyword => keyword = inner.as_str(),
            Rule::identifier => class.name = identifier(&inner),
            Rule::supertypes => {
                class.supertypes = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::type_ref)
                    .map(read_type)
                    .collect();
            }
            Rule::class_declaration => class.nested.push(read_class(inner)),
            Rule::function_declaration => class.functions.push(read_function(inner)),
            _ => {}
        }
    }

    class.kind = match keyword {
        "interface" => ClassKind::Interface,
        "object" => ClassKind::Object,
        _ if modifiers.contains(&"annotation") => ClassKind::AnnotationClass,
        _ if modifiers.contains(&"abstract") || modifiers.contains(&"sealed") => {
            ClassKind::AbstractClass
        }
        _ => ClassKind::Class,
    };
    if class.name.is_empty() {
        // Only companion objects may omit their name.
        class.name = "Companion".to_string();
    }
    class
}

fn read_function(pair: Pair<Rule>) -> RawFunction {
    let mut function = RawFunction {
        name: String::new(),
        abstract_modifier: false,
        has_body: false,
        annotations: Vec::new(),
        parameters: Vec::new(),
        return_type: None,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => function.annotations.push(read_annotation(inner)),
            Rule::modifier => function.abstract_modifier |= inner.as_str() == "abstract",
            Rule::identifier => function.name = identifier(&inner),
            Rule::value_parameters => {
                function.parameters = inner.into_inner().map(read_parameter).collect();
            }
            Rule::type_ref => function.return_type = Some(read_type(inner)),
            Rule::function_body => function.has_body = true,
            _ => {}
        }
    }
    function
}

fn read_parameter(pair: Pair<Rule>) -> RawParameter {
    let mut name = String::new();
    let mut annotations = Vec::new();
    let mut type_ref = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => annotations.push(read_annotation(inner)),
            Rule::identifier => name = identifier(&inner),
            Rule::type_ref => type_ref = Some(read_type(inner)),
            _ => {}
        }
    }

    RawParameter {
        name,
        annotations,
        // The grammar requires a parameter type.
        type_ref: type_ref.unwrap_or(RawType {
            segments: Vec::new(),
            arguments: Vec::new(),
            nullable: false,
        }),
    }
}

fn read_type(pair: Pair<Rule>) -> RawType {
    let mut raw = RawType {
        segments: Vec::new(),
        arguments: Vec::new(),
        nullable: false,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_ref => {
                let parenthesized = read_type(inner);
                raw.segments = parenthesized.segments;
                raw.arguments = parenthesized.arguments;
                raw.nullable |= parenthesized.nullable;
            }
            Rule::user_type => {
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::qualified_name => raw.segments = qualified_name(part),
                        Rule::type_arguments => {
                            raw.arguments = part.into_inner().map(read_projection).collect();
                        }
                        _ => {}
                    }
                }
            }
            Rule::nullable => raw.nullable = true,
            _ => {}
        }
    }
    raw
}

fn read_projection(pair: Pair<Rule>) -> RawProjection {
    let mut variance = Variance::Invariant;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::star => return RawProjection::Star,
            Rule::variance if inner.as_str() == "out" => variance = Variance::Out,
            Rule::variance => variance = Variance::In,
            Rule::type_ref => return RawProjection::Type(variance, read_type(inner)),
            _ => {}
        }
    }
    RawProjection::Star
}

fn read_annotation(pair: Pair<Rule>) -> RawAnnotation {
    let mut annotation = RawAnnotation {
        segments: Vec::new(),
        arguments: Vec::new(),
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::qualified_name => annotation.segments = qualified_name(inner),
            Rule::annotation_arguments => {
                annotation.arguments = inner.into_inner().filter_map(read_argument).collect();
            }
            _ => {}
        }
    }
    annotation
}

fn read_argument(pair: Pair<Rule>) -> Option<(Option<String>, RawValue)> {
    let mut name = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::argument_name => name = first_identifier(inner),
            Rule::annotation_value => return read_value(inner).map(|value| (name, value)),
            _ => {}
        }
    }
    None
}

fn read_value(pair: Pair<Rule>) -> Option<RawValue> {
    let inner = pair.into_inner().next()?;
    let value = match inner.as_rule() {
        Rule::string_literal => RawValue::String(unescape(inner.into_inner().next()?.as_str())),
        Rule::char_literal => {
            RawValue::Char(unescape(inner.into_inner().next()?.as_str()).chars().next()?)
        }
        Rule::boolean_literal => RawValue::Boolean(inner.as_str() == "true"),
        Rule::number_literal => RawValue::Literal(inner.as_str().to_string()),
        Rule::class_literal => RawValue::Class(qualified_name(inner.into_inner().next()?)),
        Rule::array_literal => RawValue::Array(
            inner
                .into_inner()
                .filter(|p| p.as_rule() == Rule::annotation_value)
                .filter_map(read_value)
                .collect(),
        ),
        Rule::nested_annotation => RawValue::Annotation(read_annotation(inner)),
        Rule::reference => RawValue::Reference(qualified_name(inner.into_inner().next()?)),
        _ => return None,
    };
    Some(value)
}

/// Decodes Kotlin escape sequences in string and char literal content.
fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ============================================================================
// Name resolution
// ============================================================================

/// Classes visible by simple name inside a class body.
#[derive(Debug, Clone)]
struct Frame {
    class: ClassName,
    nested: Vec<String>,
}

struct Resolver {
    package: String,
    imports: BTreeMap<String, ClassName>,
    top_level: Vec<String>,
}

/// Packages imported by default into every Kotlin file, for common names.
fn default_package(name: &str) -> Option<&'static str> {
    let package = match name {
        "Any" | "Unit" | "Nothing" | "String" | "CharSequence" | "Int" | "Long" | "Short"
        | "Byte" | "Double" | "Float" | "Boolean" | "Char" | "Number" | "Array" | "IntArray"
        | "LongArray" | "ByteArray" | "BooleanArray" | "Comparable" | "Enum" | "Lazy"
        | "Pair" | "Triple" | "Result" | "Throwable" | "Exception" | "Deprecated"
        | "Suppress" | "Function" => "kotlin",
        "List" | "MutableList" | "Set" | "MutableSet" | "Map" | "MutableMap" | "Collection"
        | "MutableCollection" | "Iterable" | "Iterator" | "ArrayList" | "HashMap"
        | "HashSet" | "LinkedHashMap" | "LinkedHashSet" => "kotlin.collections",
        "Retention" | "Target" | "AnnotationRetention" | "AnnotationTarget"
        | "MustBeDocumented" | "Repeatable" => "kotlin.annotation",
        "JvmStatic" | "JvmField" | "JvmName" | "JvmSuppressWildcards" | "JvmWildcard"
        | "JvmOverloads" => "kotlin.jvm",
        "Sequence" => "kotlin.sequences",
        "Regex" => "kotlin.text",
        _ => return None,
    };
    Some(package)
}

impl Resolver {
    fn new(
        package: String,
        imports: Vec<RawImport>,
        classes: &[RawClass],
        aliases: Vec<String>,
    ) -> Self {
        let mut by_name = BTreeMap::new();
        for import in imports {
            if import.star {
                tracing::trace!("Ignoring star import {}.*", import.segments.join("."));
                continue;
            }
            // Imports of functions and properties do not name classes.
            let Ok(class) = ClassName::parse(&import.segments.join(".")) else {
                continue;
            };
            let key = import
                .alias
                .unwrap_or_else(|| class.simple_name().to_string());
            by_name.insert(key, class);
        }

        let mut top_level: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();
        top_level.extend(aliases);

        Self {
            package,
            imports: by_name,
            top_level,
        }
    }

    fn resolve(&self, segments: &[String], frames: &[Frame]) -> Result<ClassName, String> {
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| "empty type name".to_string())?;

        let scoped = frames.iter().rev().find_map(|frame| {
            if frame.nested.contains(first) {
                frame.class.nested(first.clone()).ok()
            } else if frame.class.simple_name() == first {
                Some(frame.class.clone())
            } else {
                None
            }
        });

        let base = scoped
            .or_else(|| self.imports.get(first).cloned())
            .or_else(|| {
                self.top_level
                    .contains(first)
                    .then(|| ClassName::new(self.package.clone(), [first.clone()]).ok())
                    .flatten()
            });

        let resolved = match base {
            Some(base) => rest
                .iter()
                .try_fold(base, |class, name| class.nested(name.clone())),
            None if first.starts_with(char::is_lowercase) && !rest.is_empty() => {
                ClassName::parse(&segments.join("."))
            }
            None => match default_package(first) {
                Some(package) => ClassName::new(package, segments.iter().cloned()),
                None => ClassName::new(self.package.clone(), segments.iter().cloned()),
            },
        };
        resolved.map_err(|e| e.to_string())
    }

    fn class(
        &self,
        raw: &RawClass,
        outer: &[Frame],
        outer_names: &[String],
    ) -> Result<ClassDeclaration, String> {
        let mut names = outer_names.to_vec();
        names.push(raw.name.clone());
        let class_name =
            ClassName::new(self.package.clone(), names.clone()).map_err(|e| e.to_string())?;

        // Annotations and supertypes are resolved outside the class body.
        let annotations = self.annotations(&raw.annotations, outer)?;
        let supertypes = raw
            .supertypes
            .iter()
            .map(|t| self.type_name(t, outer))
            .collect::<Result<Vec<_>, _>>()?;

        let mut frames = outer.to_vec();
        frames.push(Frame {
            class: class_name,
            nested: raw.nested.iter().map(|n| n.name.clone()).collect(),
        });

        let functions = raw
            .functions
            .iter()
            .map(|f| self.function(f, raw.kind, &frames))
            .collect::<Result<Vec<_>, _>>()?;
        let nested = raw
            .nested
            .iter()
            .map(|n| self.class(n, &frames, &names))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ClassDeclaration {
            name: raw.name.clone(),
            kind: raw.kind,
            annotations,
            supertypes,
            functions,
            nested,
        })
    }

    fn function(
        &self,
        raw: &RawFunction,
        owner: ClassKind,
        frames: &[Frame],
    ) -> Result<FunctionDeclaration, String> {
        let parameters = raw
            .parameters
            .iter()
            .map(|p| -> Result<ParameterDeclaration, String> {
                Ok(ParameterDeclaration {
                    name: p.name.clone(),
                    annotations: self.annotations(&p.annotations, frames)?,
                    type_name: self.type_name(&p.type_ref, frames)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(FunctionDeclaration {
            name: raw.name.clone(),
            is_abstract: raw.abstract_modifier || (!raw.has_body && owner == ClassKind::Interface),
            annotations: self.annotations(&raw.annotations, frames)?,
            parameters,
            return_type: raw
                .return_type
                .as_ref()
                .map(|t| self.type_name(t, frames))
                .transpose()?,
        })
    }

    fn type_name(&self, raw: &RawType, frames: &[Frame]) -> Result<TypeName, String> {
        let arguments = raw
            .arguments
            .iter()
            .map(|argument| -> Result<TypeArgument, String> {
                match argument {
                    RawProjection::Star => Ok(TypeArgument::Star),
                    RawProjection::Type(variance, inner) => Ok(TypeArgument::Type {
                        variance: *variance,
                        type_name: self.type_name(inner, frames)?,
                    }),
                }
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(TypeName {
            class: self.resolve(&raw.segments, frames)?,
            arguments,
            nullable: raw.nullable,
        })
    }

    fn annotations(
        &self,
        raw: &[RawAnnotation],
        frames: &[Frame],
    ) -> Result<Vec<AnnotationSpec>, String> {
        raw.iter().map(|a| self.annotation(a, frames)).collect()
    }

    fn annotation(&self, raw: &RawAnnotation, frames: &[Frame]) -> Result<AnnotationSpec, String> {
        let members = raw
            .arguments
            .iter()
            .map(|(name, value)| -> Result<AnnotationMember, String> {
                Ok(AnnotationMember {
                    name: name.clone(),
                    value: self.value(value, frames)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(AnnotationSpec {
            class: self.resolve(&raw.segments, frames)?,
            members,
        })
    }

    fn value(&self, raw: &RawValue, frames: &[Frame]) -> Result<AnnotationValue, String> {
        let value = match raw {
            RawValue::String(s) => AnnotationValue::String(s.clone()),
            RawValue::Char(c) => AnnotationValue::Char(*c),
            RawValue::Boolean(b) => AnnotationValue::Boolean(*b),
            RawValue::Literal(text) => AnnotationValue::Literal(text.clone()),
            RawValue::Class(segments) => AnnotationValue::Class(self.resolve(segments, frames)?),
            RawValue::Array(values) => AnnotationValue::Array(
                values
                    .iter()
                    .map(|v| self.value(v, frames))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            RawValue::Annotation(annotation) => {
                AnnotationValue::Annotation(self.annotation(annotation, frames)?)
            }
            RawValue::Reference(segments) => match segments.split_last() {
                Some((entry, prefix)) if !prefix.is_empty() => AnnotationValue::Enum {
                    class: self.resolve(prefix, frames)?,
                    entry: entry.clone(),
                },
                Some((entry, _)) => match self.imports.get(entry).and_then(ClassName::enclosing) {
                    Some(class) => AnnotationValue::Enum {
                        class,
                        entry: entry.clone(),
                    },
                    None => AnnotationValue::Literal(entry.clone()),
                },
                None => return Err("empty reference".to_string()),
            },
        };
        Ok(value)
    }
}
