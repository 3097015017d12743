//! Declarative mutation conventions.
//!
//! Tagging a field with [`MutationConvention`] registers it for a later pass that
//! rewrites the mutation into the input/payload shape. The tag itself never changes
//! the field. It only records a [`MutationContextData`] in the build context.

use tracing::trace;

use crate::context::{ContextData, DescriptorContext};
use crate::descriptor::{FieldDefinitionRef, ObjectFieldDescriptor, ObjectFieldDescriptorAttribute};

/// Context data key of the registered mutation fields
pub const MUTATION_FIELDS: &str = "graphql.mutation_fields";

/// A field registered for the mutation convention, along with its overrides
#[derive(Clone, Debug)]
pub struct MutationContextData {
    /// The field the convention applies to. Shared with the type that declares it.
    pub definition: FieldDefinitionRef,
    pub input_argument_name: Option<String>,
    pub input_type_name: Option<String>,
    pub payload_field_name: Option<String>,
    pub payload_type_name: Option<String>,
    pub enabled: bool,
}

/// Access to the mutation fields registered in a [`ContextData`] bag
pub trait MutationFieldsExt {
    /// The registered mutation fields, created empty on first access
    fn mutation_fields(&mut self) -> &mut Vec<MutationContextData>;

    fn registered_mutation_fields(&self) -> &[MutationContextData];
}

impl MutationFieldsExt for ContextData {
    fn mutation_fields(&mut self) -> &mut Vec<MutationContextData> {
        self.get_or_insert_with(MUTATION_FIELDS, Vec::new)
    }

    fn registered_mutation_fields(&self) -> &[MutationContextData] {
        self.get::<Vec<MutationContextData>>(MUTATION_FIELDS)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Marks a field as a mutation that follows the input/payload convention
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationConvention {
    input_argument_name: Option<String>,
    input_type_name: Option<String>,
    payload_field_name: Option<String>,
    payload_type_name: Option<String>,
    enabled: bool,
}

impl Default for MutationConvention {
    fn default() -> Self {
        Self {
            input_argument_name: None,
            input_type_name: None,
            payload_field_name: None,
            payload_type_name: None,
            enabled: true,
        }
    }
}

impl MutationConvention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_argument_name(mut self, name: impl Into<String>) -> Self {
        self.input_argument_name = Some(name.into());
        self
    }

    pub fn input_type_name(mut self, name: impl Into<String>) -> Self {
        self.input_type_name = Some(name.into());
        self
    }

    pub fn payload_field_name(mut self, name: impl Into<String>) -> Self {
        self.payload_field_name = Some(name.into());
        self
    }

    pub fn payload_type_name(mut self, name: impl Into<String>) -> Self {
        self.payload_type_name = Some(name.into());
        self
    }

    /// Whether the rewrite pass should apply the convention to this field
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl ObjectFieldDescriptorAttribute for MutationConvention {
    fn on_configure(&self, _context: &DescriptorContext, descriptor: &mut ObjectFieldDescriptor) {
        let convention = self.clone();
        descriptor
            .extend()
            .on_before_naming(move |context, definition| {
                trace!(
                    member = %definition.read().member_name,
                    enabled = convention.enabled,
                    "Registering mutation field"
                );
                context
                    .context_data_mut()
                    .mutation_fields()
                    .push(MutationContextData {
                        definition: definition.clone(),
                        input_argument_name: convention.input_argument_name,
                        input_type_name: convention.input_type_name,
                        payload_field_name: convention.payload_field_name,
                        payload_type_name: convention.payload_type_name,
                        enabled: convention.enabled,
                    });
            });
    }
}
