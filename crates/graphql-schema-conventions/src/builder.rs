use std::collections::HashSet;

use tracing::{debug, trace};

use crate::context::DescriptorContext;
use crate::descriptor::{ApplyConfigurationOn, FieldDefinitionRef, ObjectFieldDescriptor};
use crate::error::BuildError;

/// Declares an object type and its fields
#[derive(Debug)]
pub struct ObjectTypeDescriptor {
    name: String,
    fields: Vec<ObjectFieldDescriptor>,
}

impl ObjectTypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a field for `member_name` and configure it with `configure`
    pub fn field<F>(mut self, member_name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(&mut ObjectFieldDescriptor),
    {
        let mut descriptor = ObjectFieldDescriptor::new(member_name);
        configure(&mut descriptor);
        self.fields.push(descriptor);
        self
    }
}

/// A built object type
#[derive(Clone, Debug)]
pub struct ObjectType {
    name: String,
    fields: Vec<FieldDefinitionRef>,
}

impl ObjectType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDefinitionRef] {
        &self.fields
    }

    /// Look up a field by its final name
    pub fn field(&self, name: &str) -> Option<&FieldDefinitionRef> {
        self.fields
            .iter()
            .find(|field| field.read().name.as_deref() == Some(name))
    }
}

/// The result of a schema build: the finalized types and the build context
#[derive(Debug)]
pub struct SchemaBuild {
    context: DescriptorContext,
    types: Vec<ObjectType>,
}

impl SchemaBuild {
    pub fn context(&self) -> &DescriptorContext {
        &self.context
    }

    pub fn types(&self) -> &[ObjectType] {
        &self.types
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.iter().find(|object_type| object_type.name == name)
    }

    pub fn into_parts(self) -> (DescriptorContext, Vec<ObjectType>) {
        (self.context, self.types)
    }
}

/// Runs the build phases over every declared type
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    context: DescriptorContext,
    types: Vec<ObjectTypeDescriptor>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing context, e.g. one seeded with data for the callbacks
    pub fn with_context(context: DescriptorContext) -> Self {
        Self {
            context,
            types: Vec::new(),
        }
    }

    pub fn object_type(mut self, object_type: ObjectTypeDescriptor) -> Self {
        self.types.push(object_type);
        self
    }

    pub fn build(self) -> Result<SchemaBuild, BuildError> {
        let Self {
            mut context,
            mut types,
        } = self;

        for object_type in &types {
            if !context.is_valid_name(&object_type.name) {
                return Err(BuildError::InvalidTypeName(object_type.name.clone()));
            }
        }

        for field in types.iter_mut().flat_map(|object_type| object_type.fields.iter_mut()) {
            field.configure(&context);
        }

        run_phase(&mut context, &types, ApplyConfigurationOn::Create);
        run_phase(&mut context, &types, ApplyConfigurationOn::BeforeNaming);
        for object_type in &types {
            complete_names(&context, object_type)?;
        }
        run_phase(&mut context, &types, ApplyConfigurationOn::AfterNaming);
        run_phase(&mut context, &types, ApplyConfigurationOn::BeforeCompletion);

        let types: Vec<ObjectType> = types
            .into_iter()
            .map(|object_type| ObjectType {
                name: object_type.name,
                fields: object_type
                    .fields
                    .iter()
                    .map(|field| field.definition().clone())
                    .collect(),
            })
            .collect();

        debug!(types = types.len(), "Built schema");
        Ok(SchemaBuild { context, types })
    }
}

fn run_phase(context: &mut DescriptorContext, types: &[ObjectTypeDescriptor], on: ApplyConfigurationOn) {
    let applied: usize = types
        .iter()
        .flat_map(|object_type| object_type.fields.iter())
        .map(|field| field.apply_configurations(context, on))
        .sum();
    trace!(phase = ?on, applied, "Ran build phase");
}

fn complete_names(
    context: &DescriptorContext,
    object_type: &ObjectTypeDescriptor,
) -> Result<(), BuildError> {
    let mut seen = HashSet::new();

    for field in &object_type.fields {
        let mut definition = field.definition().write();
        let name = match &definition.name {
            Some(name) => name.clone(),
            None => {
                let name = context.field_name(&definition.member_name);
                definition.name = Some(name.clone());
                name
            }
        };

        if !context.is_valid_name(&name) {
            return Err(BuildError::InvalidName {
                type_name: object_type.name.clone(),
                name: name.clone(),
            });
        }
        if !seen.insert(name.clone()) {
            return Err(BuildError::DuplicateField {
                type_name: object_type.name.clone(),
                field_name: name.clone(),
            });
        }
    }

    Ok(())
}
