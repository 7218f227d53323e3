//! Turns component declarations into [`Component`] models.
//!
//! The parser reads a declaration from the symbol table and classifies how
//! the component is constructed:
//!
//! 1. A nested `@Component.Builder` gives a builder contract
//! 2. Otherwise a nested `@Component.Factory` gives a factory contract
//! 3. Otherwise the component is created implicitly
//!
//! Parsing is pure; a [`DeclarationParser`] can be shared across tasks.

use crate::config::FrameworkSymbols;
use crate::declarations::{
    has_annotation, ClassDeclaration, DeclarationHandle, FunctionDeclaration,
    ParameterDeclaration, SymbolTable,
};
use crate::error::AppError;
use crate::models::{
    is_identifier, AnnotationSpec, Binding, BuilderContract, ClassName, Component,
    FactoryContract, Finalizer, InstantiationContract, Qualification,
};

/// Builds a component model from a declaration handle.
pub trait ComponentParser: Send + Sync {
    fn parse(&self, handle: &DeclarationHandle) -> Result<Component, AppError>;
}

/// Parser over resolved declarations, keyed on the configured framework
/// symbols.
#[derive(Debug, Clone)]
pub struct DeclarationParser {
    symbols: FrameworkSymbols,
}

impl DeclarationParser {
    pub fn new(symbols: FrameworkSymbols) -> Self {
        Self { symbols }
    }

    fn builder(
        &self,
        component: &ClassName,
        builder: &ClassDeclaration,
        table: &SymbolTable,
    ) -> Result<BuilderContract, AppError> {
        let functions: Vec<&FunctionDeclaration> = builder.abstract_functions().collect();
        if functions.is_empty() {
            return Err(AppError::malformed(
                component,
                format!("builder {} declares no abstract functions", builder.name),
            ));
        }

        let build = functions
            .iter()
            .find(|f| f.parameters.is_empty())
            .ok_or_else(|| {
                AppError::malformed(
                    component,
                    format!("builder {} has no build function", builder.name),
                )
            })?;
        let return_type = build.return_type.clone().ok_or_else(|| {
            AppError::malformed(
                component,
                format!("build function '{}' has no return type", build.name),
            )
        })?;
        check_member(component, &build.name)?;

        let mut component_bindings = Vec::new();
        let mut instance_bindings = Vec::new();

        for function in functions.iter().filter(|f| !f.parameters.is_empty()) {
            check_member(component, &function.name)?;
            let parameter = &function.parameters[0];
            if function.parameters.len() > 1 {
                tracing::trace!(
                    "{}: setter '{}' takes {} parameters, binding the first",
                    component,
                    function.name,
                    function.parameters.len()
                );
            }

            let binding = Binding {
                member_name: function.name.clone(),
                value_type: parameter.type_name.clone(),
                qualification: self.qualification(component, &parameter.annotations, table)?,
            };

            if self.is_instance_binding(function, parameter, table) {
                instance_bindings.push(binding);
            } else {
                component_bindings.push(binding);
            }
        }

        Ok(BuilderContract {
            component_bindings,
            instance_bindings,
            finalizer: Finalizer {
                name: build.name.clone(),
                return_type,
            },
        })
    }

    fn factory(
        &self,
        component: &ClassName,
        factory: &ClassDeclaration,
        table: &SymbolTable,
    ) -> Result<FactoryContract, AppError> {
        let entry_point = factory.abstract_functions().next().ok_or_else(|| {
            AppError::malformed(
                component,
                format!("factory {} declares no abstract function", factory.name),
            )
        })?;
        check_member(component, &entry_point.name)?;

        let parameters = entry_point
            .parameters
            .iter()
            .map(|parameter| -> Result<Binding, AppError> {
                check_member(component, &parameter.name)?;
                Ok(Binding {
                    member_name: parameter.name.clone(),
                    value_type: parameter.type_name.clone(),
                    qualification: self.qualification(
                        component,
                        &parameter.annotations,
                        table,
                    )?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(FactoryContract {
            entry_point: entry_point.name.clone(),
            parameters,
        })
    }

    /// Whether a builder setter binds a plain value rather than a component.
    ///
    /// Explicit `@BindsInstance` wins. Otherwise a parameter type declared in
    /// the table that is neither a component nor a module is an instance.
    /// Unknown types stay component bindings.
    fn is_instance_binding(
        &self,
        function: &FunctionDeclaration,
        parameter: &ParameterDeclaration,
        table: &SymbolTable,
    ) -> bool {
        if has_annotation(&function.annotations, &self.symbols.binds_instance)
            || has_annotation(&parameter.annotations, &self.symbols.binds_instance)
        {
            return true;
        }

        table
            .get(&parameter.type_name.class)
            .is_some_and(|entry| {
                !entry.declaration.is_annotated_with(&self.symbols.component)
                    && !entry.declaration.is_annotated_with(&self.symbols.module)
            })
    }

    fn qualification(
        &self,
        component: &ClassName,
        annotations: &[AnnotationSpec],
        table: &SymbolTable,
    ) -> Result<Option<Qualification>, AppError> {
        if let Some(named) = annotations.iter().find(|a| a.class == self.symbols.named) {
            let value = named.first_string().ok_or_else(|| {
                AppError::malformed(
                    component,
                    format!("@{} requires a string value", self.symbols.named.simple_name()),
                )
            })?;
            return Ok(Some(Qualification::Named(value.to_string())));
        }

        let custom = annotations.iter().find(|a| self.is_qualifier(&a.class, table));
        if let Some(spec) = custom {
            if !spec.members.is_empty() {
                tracing::debug!(
                    "{}: replaying qualifier {} with its arguments unchanged",
                    component,
                    spec.class
                );
            }
            return Ok(Some(Qualification::Custom(spec.clone())));
        }
        Ok(None)
    }

    fn is_qualifier(&self, class: &ClassName, table: &SymbolTable) -> bool {
        table.get(class).is_some_and(|entry| {
            self.symbols
                .qualifier_markers
                .iter()
                .any(|marker| entry.declaration.is_annotated_with(marker))
        })
    }
}

impl ComponentParser for DeclarationParser {
    fn parse(&self, handle: &DeclarationHandle) -> Result<Component, AppError> {
        let entry = handle.entry().ok_or_else(|| {
            AppError::malformed(handle.class_name(), "declaration not found in symbol table")
        })?;
        let name = &entry.class_name;
        let declaration = &entry.declaration;

        if let Some(bad) = name.simple_names().iter().find(|n| !is_identifier(n)) {
            return Err(AppError::malformed(
                name,
                format!("'{}' is not a valid class name", bad),
            ));
        }

        let table = handle.symbols();
        let contract = if let Some(builder) =
            declaration.nested_annotated_with(&self.symbols.component_builder)
        {
            InstantiationContract::Builder(self.builder(name, builder, table)?)
        } else if let Some(factory) =
            declaration.nested_annotated_with(&self.symbols.component_factory)
        {
            InstantiationContract::Factory(self.factory(name, factory, table)?)
        } else {
            InstantiationContract::ImplicitCreate
        };

        tracing::debug!("Parsed {} with {} contract", name, contract_kind(&contract));
        Ok(Component::new(name.clone(), contract))
    }
}

fn contract_kind(contract: &InstantiationContract) -> &'static str {
    match contract {
        InstantiationContract::ImplicitCreate => "implicit",
        InstantiationContract::Builder(_) => "builder",
        InstantiationContract::Factory(_) => "factory",
    }
}

fn check_member(component: &ClassName, member: &str) -> Result<(), AppError> {
    if is_identifier(member) {
        Ok(())
    } else {
        Err(AppError::malformed(
            component,
            format!("'{}' is not a valid identifier", member),
        ))
    }
}
