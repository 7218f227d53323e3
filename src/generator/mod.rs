//! Renders aggregate modules for parsed components.
//!
//! Each component gets one Kotlin file holding a `@Module` object with a
//! single scoped `@Provides` function. The function builds the component
//! through the framework-generated implementation class, using whichever
//! contract the component declares:
//!
//! ```text
//! @Module
//! public object Foo_AggregateModule {
//!   @Provides
//!   @AggregateScope
//!   public fun provideFoo(arg0: Bar): Foo = DaggerFoo.builder()
//!     .bar(arg0)
//!     .build()
//! }
//! ```

mod imports;
mod provider;
mod syntax;

use std::path::PathBuf;

use serde::Serialize;

use crate::config::FrameworkSymbols;
use crate::error::AppError;
use crate::models::{
    AnnotationSpec, AnnotationValue, Binding, ClassName, Component, InstantiationContract,
    Qualification,
};

use imports::ImportSet;
use provider::{Parameter, ProviderFunction};
use syntax::{escape_dotted, escape_identifier, render_annotation, render_type};

pub use provider::ArgName;

/// A generated compilation unit. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedModule {
    package: String,
    name: String,
    source_text: String,
}

impl GeneratedModule {
    pub fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            source_text: source_text.into(),
        }
    }

    /// Package of the module, the component's own package.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Simple name of the module object, also the file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Path of the file relative to an output root: package directories
    /// followed by `<name>.kt`.
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self
            .package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();
        path.push(format!("{}.kt", self.name));
        path
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }
}

/// Renders a component into its aggregate module.
pub trait ModuleGenerator: Send + Sync {
    fn generate(&self, component: &Component) -> Result<GeneratedModule, AppError>;
}

/// Generator for `@Module` objects exposing one component each.
#[derive(Debug, Clone)]
pub struct AggregateModuleGenerator {
    symbols: FrameworkSymbols,
    line_width: usize,
}

impl AggregateModuleGenerator {
    pub fn new(symbols: FrameworkSymbols, line_width: usize) -> Self {
        Self {
            symbols,
            line_width,
        }
    }

    fn qualifier(&self, binding: &Binding) -> Option<AnnotationSpec> {
        match &binding.qualification {
            Some(Qualification::Named(value)) => Some(
                AnnotationSpec::new(self.symbols.named.clone())
                    .with_value(AnnotationValue::String(value.clone())),
            ),
            Some(Qualification::Custom(spec)) => Some(spec.clone()),
            None => None,
        }
    }
}

fn unrenderable(component: &Component, reason: impl ToString) -> AppError {
    AppError::UnrenderableContract {
        component: component.name.canonical(),
        reason: reason.to_string(),
    }
}

impl ModuleGenerator for AggregateModuleGenerator {
    fn generate(&self, component: &Component) -> Result<GeneratedModule, AppError> {
        component
            .validate()
            .map_err(|reason| unrenderable(component, reason))?;

        let package = component.name.package();
        let joined = component.name.simple_names().join("_");
        let module = ClassName::new(package, [format!("{}_AggregateModule", joined)])
            .map_err(|e| unrenderable(component, e))?;
        let implementation = ClassName::new(
            package,
            [format!("{}{}", self.symbols.implementation_prefix, joined)],
        )
        .map_err(|e| unrenderable(component, e))?;

        let bindings: Vec<&Binding> = match &component.contract {
            InstantiationContract::ImplicitCreate => Vec::new(),
            InstantiationContract::Builder(builder) => builder.bindings().collect(),
            InstantiationContract::Factory(factory) => factory.parameters.iter().collect(),
        };
        let qualifiers: Vec<Option<AnnotationSpec>> =
            bindings.iter().map(|b| self.qualifier(b)).collect();

        // Claim order decides which class keeps a contested simple name.
        let mut imports = ImportSet::new(package);
        imports.claim(&module);
        imports.claim(&component.name);
        imports.claim(&implementation);
        for (binding, qualifier) in bindings.iter().zip(&qualifiers) {
            if let Some(qualifier) = qualifier {
                qualifier.visit_classes(&mut |c| imports.claim(c));
            }
            binding.value_type.visit_classes(&mut |c| imports.claim(c));
        }
        imports.claim(&self.symbols.module);
        imports.claim(&self.symbols.provides);
        imports.claim(&self.symbols.scope);

        let parameters: Vec<Parameter> = bindings
            .iter()
            .zip(&qualifiers)
            .enumerate()
            .map(|(i, (binding, qualifier))| Parameter {
                name: ArgName(i),
                qualifier: qualifier.as_ref().map(|q| render_annotation(q, &imports)),
                type_text: render_type(&binding.value_type, &imports),
            })
            .collect();

        let implementation = imports.reference(&implementation);
        let (head, steps) = match &component.contract {
            InstantiationContract::ImplicitCreate => {
                (format!("{}.create()", implementation), Vec::new())
            }
            InstantiationContract::Builder(builder) => {
                let mut steps: Vec<String> = builder
                    .bindings()
                    .enumerate()
                    .map(|(i, b)| format!(".{}({})", escape_identifier(&b.member_name), ArgName(i)))
                    .collect();
                steps.push(format!(".{}()", escape_identifier(&builder.finalizer.name)));
                (format!("{}.builder()", implementation), steps)
            }
            InstantiationContract::Factory(factory) => {
                let arguments: Vec<String> = (0..factory.parameters.len())
                    .map(|i| ArgName(i).to_string())
                    .collect();
                (
                    format!(
                        "{}.factory().{}({})",
                        implementation,
                        escape_identifier(&factory.entry_point),
                        arguments.join(", ")
                    ),
                    Vec::new(),
                )
            }
        };

        let function = ProviderFunction {
            name: format!("provide{}", component.simple_name()),
            annotations: vec![
                render_annotation(&AnnotationSpec::new(self.symbols.provides.clone()), &imports),
                render_annotation(&AnnotationSpec::new(self.symbols.scope.clone()), &imports),
            ],
            parameters,
            return_type: imports.reference(&component.name),
            head,
            steps,
        };

        let mut source_text = String::new();
        if !package.is_empty() {
            source_text.push_str(&format!("package {}\n\n", escape_dotted(package)));
        }
        let import_lines = imports.imports();
        if !import_lines.is_empty() {
            for import in &import_lines {
                source_text.push_str(&format!("import {}\n", import));
            }
            source_text.push('\n');
        }
        source_text.push_str(&format!(
            "{}\n",
            render_annotation(&AnnotationSpec::new(self.symbols.module.clone()), &imports)
        ));
        source_text.push_str(&format!(
            "public object {} {{\n",
            imports.reference(&module)
        ));
        function.write_to(&mut source_text, self.line_width);
        source_text.push_str("}\n");

        tracing::debug!(
            "Generated {} with {} imports",
            module,
            import_lines.len()
        );

        Ok(GeneratedModule::new(package, module.simple_name(), source_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINE_WIDTH;
    use crate::models::{
        BuilderContract, FactoryContract, Finalizer, TypeArgument, TypeName, Variance,
    };

    fn class(name: &str) -> ClassName {
        ClassName::parse(name).unwrap()
    }

    fn ty(name: &str) -> TypeName {
        class(name).to_type()
    }

    fn builder(
        name: &str,
        component_bindings: Vec<Binding>,
        instance_bindings: Vec<Binding>,
    ) -> Component {
        Component::new(
            class(name),
            InstantiationContract::Builder(BuilderContract {
                component_bindings,
                instance_bindings,
                finalizer: Finalizer {
                    name: "build".to_string(),
                    return_type: ty(name),
                },
            }),
        )
    }

    fn factory(name: &str, parameters: Vec<Binding>) -> Component {
        Component::new(
            class(name),
            InstantiationContract::Factory(FactoryContract {
                entry_point: "create".to_string(),
                parameters,
            }),
        )
    }

    fn named(value: &str) -> Qualification {
        Qualification::Named(value.to_string())
    }

    fn custom() -> Qualification {
        Qualification::Custom(AnnotationSpec::new(class("com.example.MyQualifier")))
    }

    fn generate(component: &Component) -> String {
        AggregateModuleGenerator::new(FrameworkSymbols::default(), DEFAULT_LINE_WIDTH)
            .generate(component)
            .unwrap()
            .source_text()
            .to_string()
    }

    const HEADER: &str = "package com.example

import com.jackbradshaw.backstab.annotations.aggregate.AggregateScope
import dagger.Module
import dagger.Provides

";

    const NAMED_HEADER: &str = "package com.example

import com.jackbradshaw.backstab.annotations.aggregate.AggregateScope
import dagger.Module
import dagger.Provides
import javax.inject.Named

";

    #[test]
    fn test_builder_binds_instance() {
        let component = builder(
            "com.example.MyComponent",
            vec![Binding::new("bindFoo", ty("com.example.Foo"))],
            vec![],
        );

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object MyComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideMyComponent(arg0: Foo): MyComponent = DaggerMyComponent.builder()
    .bindFoo(arg0)
    .build()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_builder_named_qualifier() {
        let component = builder(
            "com.example.QualifiedComponent",
            vec![],
            vec![Binding::new("bindFoo", ty("com.example.Foo")).qualified(named("myQualifier"))],
        );

        let expected = format!(
            "{}{}",
            NAMED_HEADER,
            r#"@Module
public object QualifiedComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideQualifiedComponent(@Named("myQualifier") arg0: Foo): QualifiedComponent =
      DaggerQualifiedComponent.builder()
    .bindFoo(arg0)
    .build()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_builder_custom_qualifier() {
        let component = builder(
            "com.example.CustomQualifiedComponent",
            vec![],
            vec![Binding::new("bindFoo", ty("com.example.Foo")).qualified(custom())],
        );

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object CustomQualifiedComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideCustomQualifiedComponent(@MyQualifier arg0: Foo): CustomQualifiedComponent =
      DaggerCustomQualifiedComponent.builder()
    .bindFoo(arg0)
    .build()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_builder_mixed_bindings_wrap_parameters() {
        let component = builder(
            "com.example.MixedComponent",
            vec![Binding::new("dep", ty("com.example.DepComponent"))],
            vec![
                Binding::new("bindSimple", ty("com.example.Simple")),
                Binding::new("bindNamed", ty("com.example.NamedFoo")).qualified(named("myQualifier")),
                Binding::new("bindQualified", ty("com.example.QualifiedBar")).qualified(custom()),
            ],
        );

        let expected = format!(
            "{}{}",
            NAMED_HEADER,
            r#"@Module
public object MixedComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideMixedComponent(
    arg0: DepComponent,
    arg1: Simple,
    @Named("myQualifier") arg2: NamedFoo,
    @MyQualifier arg3: QualifiedBar,
  ): MixedComponent = DaggerMixedComponent.builder()
    .dep(arg0)
    .bindSimple(arg1)
    .bindNamed(arg2)
    .bindQualified(arg3)
    .build()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_builder_component_bindings_come_first() {
        let component = builder(
            "com.example.ComplexComponent",
            vec![Binding::new("dep1", ty("com.example.Dep1"))],
            vec![Binding::new("bindFoo", ty("com.example.Foo"))],
        );

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object ComplexComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideComplexComponent(arg0: Dep1, arg1: Foo): ComplexComponent =
      DaggerComplexComponent.builder()
    .dep1(arg0)
    .bindFoo(arg1)
    .build()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_builder_without_bindings() {
        let component = builder("com.example.MyComponent", vec![], vec![]);

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object MyComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideMyComponent(): MyComponent = DaggerMyComponent.builder()
    .build()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_implicit_create() {
        let component = Component::new(
            class("com.example.NoBuilderComponent"),
            InstantiationContract::ImplicitCreate,
        );

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object NoBuilderComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideNoBuilderComponent(): NoBuilderComponent = DaggerNoBuilderComponent.create()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_factory_single_parameter() {
        let component = factory(
            "com.example.FactoryComponent",
            vec![Binding::new("foo", ty("com.example.Foo"))],
        );

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object FactoryComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideFactoryComponent(arg0: Foo): FactoryComponent =
      DaggerFactoryComponent.factory().create(arg0)
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_factory_named_parameter() {
        let component = factory(
            "com.example.FactoryComponent",
            vec![Binding::new("foo", ty("com.example.Foo")).qualified(named("myQualifier"))],
        );

        let expected = format!(
            "{}{}",
            NAMED_HEADER,
            r#"@Module
public object FactoryComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideFactoryComponent(@Named("myQualifier") arg0: Foo): FactoryComponent =
      DaggerFactoryComponent.factory().create(arg0)
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_factory_mixed_parameters() {
        let component = factory(
            "com.example.FactoryComponent",
            vec![
                Binding::new("dep", ty("com.example.DepComponent")),
                Binding::new("simple", ty("com.example.Simple")),
                Binding::new("named", ty("com.example.NamedFoo")).qualified(named("myQualifier")),
                Binding::new("qualified", ty("com.example.QualifiedBar")).qualified(custom()),
            ],
        );

        let expected = format!(
            "{}{}",
            NAMED_HEADER,
            r#"@Module
public object FactoryComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideFactoryComponent(
    arg0: DepComponent,
    arg1: Simple,
    @Named("myQualifier") arg2: NamedFoo,
    @MyQualifier arg3: QualifiedBar,
  ): FactoryComponent = DaggerFactoryComponent.factory().create(arg0, arg1, arg2, arg3)
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_factory_without_parameters_fits_exactly() {
        let component = factory("com.example.FactoryComponent", vec![]);

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object FactoryComponent_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideFactoryComponent(): FactoryComponent = DaggerFactoryComponent.factory().create()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_nested_component_names() {
        let component = Component::new(
            class("com.example.Outer.Inner"),
            InstantiationContract::ImplicitCreate,
        );

        let expected = format!(
            "{}{}",
            HEADER,
            r#"@Module
public object Outer_Inner_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideInner(): Outer.Inner = DaggerOuter_Inner.create()
}
"#
        );
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_imports_foreign_and_generic_types() {
        let list = TypeName {
            class: class("kotlin.collections.List"),
            arguments: vec![TypeArgument::Type {
                variance: Variance::Out,
                type_name: ty("com.other.Plugin"),
            }],
            nullable: false,
        };
        let component = factory(
            "com.example.App",
            vec![
                Binding::new("plugins", list),
                Binding::new("name", ty("kotlin.String").nullable()),
            ],
        );

        let expected = r#"package com.example

import com.jackbradshaw.backstab.annotations.aggregate.AggregateScope
import com.other.Plugin
import dagger.Module
import dagger.Provides

@Module
public object App_AggregateModule {
  @Provides
  @AggregateScope
  public fun provideApp(arg0: List<out Plugin>, arg1: String?): App =
      DaggerApp.factory().create(arg0, arg1)
}
"#;
        assert_eq!(generate(&component), expected);
    }

    #[test]
    fn test_colliding_names_are_fully_qualified() {
        let component = factory(
            "com.example.App",
            vec![
                Binding::new("first", ty("com.one.Client")),
                Binding::new("second", ty("com.two.Client")),
                Binding::new("module", ty("com.two.Module")),
            ],
        );

        let output = generate(&component);
        assert!(output.contains("import com.one.Client\n"));
        assert!(output.contains("import com.two.Module\n"));
        assert!(!output.contains("import com.two.Client"));
        assert!(!output.contains("import dagger.Module"));
        assert!(output.contains("\n@dagger.Module\n"));
        assert!(output.contains("(arg0: Client, arg1: com.two.Client, arg2: Module): App =\n"));
    }

    #[test]
    fn test_same_package_type_shadows_kotlin_default() {
        let component = factory(
            "com.example.App",
            vec![
                Binding::new("text", ty("kotlin.String")),
                Binding::new("local", ty("com.example.String")),
            ],
        );

        let output = generate(&component);
        assert!(output.contains("provideApp(arg0: kotlin.String, arg1: String): App ="));
        assert!(!output.contains("import kotlin.String"));
        assert!(!output.contains("import com.example.String"));
    }

    #[test]
    fn test_keyword_members_are_escaped() {
        let component = builder(
            "com.example.App",
            vec![Binding::new("in", ty("com.example.Foo"))],
            vec![],
        );
        let output = generate(&component);
        assert!(output.contains("    .`in`(arg0)\n"));
    }

    #[test]
    fn test_no_package() {
        let component = Component::new(class("Root"), InstantiationContract::ImplicitCreate);
        let output = generate(&component);
        assert!(output.starts_with("import com.jackbradshaw"));
        assert!(output.ends_with("}\n"));
    }

    #[test]
    fn test_invalid_member_is_unrenderable() {
        let component = builder(
            "com.example.App",
            vec![Binding::new("not valid", ty("com.example.Foo"))],
            vec![],
        );
        let err = AggregateModuleGenerator::new(FrameworkSymbols::default(), DEFAULT_LINE_WIDTH)
            .generate(&component)
            .unwrap_err();
        assert_eq!(err.code(), "UNRENDERABLE_CONTRACT");
    }

    #[test]
    fn test_output_is_deterministic() {
        let component = builder(
            "com.example.MixedComponent",
            vec![Binding::new("dep", ty("com.one.Dep"))],
            vec![Binding::new("named", ty("com.two.Foo")).qualified(named("q"))],
        );
        assert_eq!(generate(&component), generate(&component));
    }

    #[test]
    fn test_relative_path() {
        let module = GeneratedModule::new("com.example.app", "Foo_AggregateModule", "");
        assert_eq!(module.package(), "com.example.app");
        assert_eq!(module.name(), "Foo_AggregateModule");
        assert_eq!(module.source_text(), "");
        assert_eq!(
            module.relative_path(),
            PathBuf::from("com/example/app/Foo_AggregateModule.kt")
        );
        assert_eq!(module.qualified_name(), "com.example.app.Foo_AggregateModule");
    }
}
