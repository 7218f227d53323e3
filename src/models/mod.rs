//! Domain model for components and the references they carry.

mod annotation;
mod component;
mod names;

pub use annotation::{AnnotationMember, AnnotationSpec, AnnotationValue};
pub use component::{
    Binding, BuilderContract, Component, FactoryContract, Finalizer, InstantiationContract,
    Qualification,
};
pub use names::{is_identifier, ClassName, TypeArgument, TypeName, Variance};
