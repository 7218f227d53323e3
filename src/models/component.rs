//! The component model consumed by the generator.

use serde::{Deserialize, Serialize};

use super::annotation::AnnotationSpec;
use super::names::{is_identifier, ClassName, TypeName};

/// A Dagger component to aggregate.
///
/// Built by the parser, consumed once by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Package and nested-name chain of the component.
    pub name: ClassName,
    /// How callers construct the component.
    pub contract: InstantiationContract,
}

/// The API a component exposes for its own construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstantiationContract {
    /// No builder or factory; the generated `create()` is used.
    ImplicitCreate,
    /// A `@Component.Builder` interface.
    Builder(BuilderContract),
    /// A `@Component.Factory` interface.
    Factory(FactoryContract),
}

/// Setter steps and the terminal build function of a component builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderContract {
    /// Other components (and module instances) passed to the builder.
    #[serde(default)]
    pub component_bindings: Vec<Binding>,
    /// Values bound with `@BindsInstance`.
    #[serde(default)]
    pub instance_bindings: Vec<Binding>,
    pub finalizer: Finalizer,
}

/// The terminal step of a builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finalizer {
    pub name: String,
    pub return_type: TypeName,
}

/// The single creation function of a component factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryContract {
    pub entry_point: String,
    #[serde(default)]
    pub parameters: Vec<Binding>,
}

/// One slot of a builder or factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Setter or parameter name on the contract. Never used as a generated
    /// parameter name.
    pub member_name: String,
    pub value_type: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<Qualification>,
}

/// A qualifier carried by a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Qualification {
    /// `@Named("...")`.
    Named(String),
    /// Any annotation meta-annotated with `@Qualifier`.
    Custom(AnnotationSpec),
}

impl Binding {
    pub fn new(member_name: impl Into<String>, value_type: TypeName) -> Self {
        Self {
            member_name: member_name.into(),
            value_type,
            qualification: None,
        }
    }

    pub fn qualified(mut self, qualification: Qualification) -> Self {
        self.qualification = Some(qualification);
        self
    }
}

impl BuilderContract {
    /// Component bindings followed by instance bindings, the order used for
    /// both generated parameters and chained calls.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.component_bindings
            .iter()
            .chain(self.instance_bindings.iter())
    }
}

impl Component {
    pub fn new(name: ClassName, contract: InstantiationContract) -> Self {
        Self { name, contract }
    }

    /// The innermost name of the component.
    pub fn simple_name(&self) -> &str {
        self.name.simple_name()
    }

    /// Checks the invariants a deserialized component may violate.
    ///
    /// Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.simple_names().is_empty() {
            return Err("qualified name is empty".to_string());
        }

        let members: Vec<&str> = match &self.contract {
            InstantiationContract::ImplicitCreate => Vec::new(),
            InstantiationContract::Builder(builder) => {
                let mut names: Vec<&str> =
                    builder.bindings().map(|b| b.member_name.as_str()).collect();
                names.push(&builder.finalizer.name);
                names
            }
            InstantiationContract::Factory(factory) => vec![factory.entry_point.as_str()],
        };

        match members.into_iter().find(|m| !is_identifier(m)) {
            Some(bad) => Err(format!("'{}' is not a valid member name", bad)),
            None => Ok(()),
        }
    }
}
