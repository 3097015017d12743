//! Schema build pipeline with declarative mutation conventions.
//!
//! Object types are described with [`ObjectTypeDescriptor`]s whose fields are
//! [`ObjectFieldDescriptor`]s. A field can carry attributes
//! ([`ObjectFieldDescriptorAttribute`]) that are configured when the schema is built.
//! Attributes usually do not change the field right away. Instead they register
//! callbacks on the field definition that run in a later build phase:
//!
//! 1. [`ApplyConfigurationOn::Create`]
//! 2. [`ApplyConfigurationOn::BeforeNaming`]
//! 3. names are completed and validated
//! 4. [`ApplyConfigurationOn::AfterNaming`]
//! 5. [`ApplyConfigurationOn::BeforeCompletion`]
//!
//! Callbacks get the shared [`DescriptorContext`], whose [`ContextData`] bag collects
//! build-time records for passes that run after the build. [`MutationConvention`] is
//! such an attribute: it appends a [`MutationContextData`] record to the
//! [`mutation_fields`](MutationFieldsExt::mutation_fields) collection.

mod builder;
mod context;
mod descriptor;
pub mod error;
mod mutations;
pub mod naming;

pub use builder::{ObjectType, ObjectTypeDescriptor, SchemaBuild, SchemaBuilder};
pub use context::{ContextData, DescriptorContext};
pub use descriptor::{
    ApplyConfigurationOn, ArgumentDefinition, DescriptorExtension, FieldDefinitionRef,
    ObjectFieldDefinition, ObjectFieldDescriptor, ObjectFieldDescriptorAttribute,
};
pub use mutations::{MUTATION_FIELDS, MutationContextData, MutationConvention, MutationFieldsExt};
