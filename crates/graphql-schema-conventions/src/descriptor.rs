use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use crate::context::DescriptorContext;

/// The build phase a configuration callback runs in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApplyConfigurationOn {
    /// Right after the descriptors have been configured
    Create,
    /// Before field names are completed and validated
    BeforeNaming,
    /// After every field has its final name
    AfterNaming,
    /// Last chance to change a definition before the build finishes
    BeforeCompletion,
}

impl ApplyConfigurationOn {
    /// Every phase, in execution order
    pub const ALL: [ApplyConfigurationOn; 4] = [
        ApplyConfigurationOn::Create,
        ApplyConfigurationOn::BeforeNaming,
        ApplyConfigurationOn::AfterNaming,
        ApplyConfigurationOn::BeforeCompletion,
    ];
}

type Configure = Box<dyn FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync>;

/// A callback deferred to a build phase
pub struct DescriptorConfiguration {
    on: ApplyConfigurationOn,
    configure: Configure,
}

impl fmt::Debug for DescriptorConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorConfiguration")
            .field("on", &self.on)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentDefinition {
    pub name: String,
    pub type_name: String,
}

/// The mutable definition behind a field descriptor
#[derive(Debug)]
pub struct ObjectFieldDefinition {
    /// The name of the member the field was declared for
    pub member_name: String,
    /// The GraphQL name. Completed from the member name if unset when names are finalized.
    pub name: Option<String>,
    pub description: Option<String>,
    pub type_name: Option<String>,
    pub arguments: Vec<ArgumentDefinition>,
    configurations: Vec<DescriptorConfiguration>,
}

impl ObjectFieldDefinition {
    fn new(member_name: String) -> Self {
        Self {
            member_name,
            name: None,
            description: None,
            type_name: None,
            arguments: Vec::new(),
            configurations: Vec::new(),
        }
    }

    /// Number of callbacks still waiting for `on`
    pub fn pending_configurations(&self, on: ApplyConfigurationOn) -> usize {
        self.configurations
            .iter()
            .filter(|configuration| configuration.on == on)
            .count()
    }
}

/// Shared handle to a field definition.
///
/// Build-time records keep these handles so later passes can find and change the
/// definition they were registered for.
#[derive(Clone, Debug)]
pub struct FieldDefinitionRef(Arc<RwLock<ObjectFieldDefinition>>);

impl FieldDefinitionRef {
    fn new(definition: ObjectFieldDefinition) -> Self {
        Self(Arc::new(RwLock::new(definition)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ObjectFieldDefinition> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ObjectFieldDefinition> {
        self.0.write()
    }

    /// Whether both handles point to the same definition
    pub fn ptr_eq(&self, other: &FieldDefinitionRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// An attribute applied to a field descriptor while the schema is built
pub trait ObjectFieldDescriptorAttribute: Send + Sync {
    fn on_configure(&self, context: &DescriptorContext, descriptor: &mut ObjectFieldDescriptor);
}

/// Fluent configuration of a single object field
pub struct ObjectFieldDescriptor {
    definition: FieldDefinitionRef,
    attributes: Vec<Box<dyn ObjectFieldDescriptorAttribute>>,
}

impl ObjectFieldDescriptor {
    pub fn new(member_name: impl Into<String>) -> Self {
        Self {
            definition: FieldDefinitionRef::new(ObjectFieldDefinition::new(member_name.into())),
            attributes: Vec::new(),
        }
    }

    pub fn definition(&self) -> &FieldDefinitionRef {
        &self.definition
    }

    /// Set an explicit GraphQL name, skipping the one derived from the member
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.definition.write().name = Some(name.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.definition.write().description = Some(description.into());
        self
    }

    pub fn type_name(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.definition.write().type_name = Some(type_name.into());
        self
    }

    pub fn argument(&mut self, name: impl Into<String>, type_name: impl Into<String>) -> &mut Self {
        self.definition.write().arguments.push(ArgumentDefinition {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Attach an attribute, configured once the build starts
    pub fn attribute(&mut self, attribute: impl ObjectFieldDescriptorAttribute + 'static) -> &mut Self {
        self.attributes.push(Box::new(attribute));
        self
    }

    /// Register callbacks for later build phases
    pub fn extend(&mut self) -> DescriptorExtension<'_> {
        DescriptorExtension { descriptor: self }
    }

    /// Let every attached attribute configure this descriptor
    pub fn configure(&mut self, context: &DescriptorContext) {
        for attribute in std::mem::take(&mut self.attributes) {
            attribute.on_configure(context, self);
        }
    }

    /// Run and discard the callbacks registered for `on`, returning how many ran.
    ///
    /// Callbacks registered while the phase runs are kept for their own phase.
    pub fn apply_configurations(
        &self,
        context: &mut DescriptorContext,
        on: ApplyConfigurationOn,
    ) -> usize {
        let due = {
            let mut definition = self.definition.write();
            let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut definition.configurations)
                .into_iter()
                .partition(|configuration| configuration.on == on);
            definition.configurations = pending;
            due
        };

        let count = due.len();
        for configuration in due {
            (configuration.configure)(context, &self.definition);
        }

        if count > 0 {
            trace!(
                member = %self.definition.read().member_name,
                phase = ?on,
                count,
                "Applied field configurations"
            );
        }
        count
    }

    fn push_configuration<F>(&mut self, on: ApplyConfigurationOn, configure: F)
    where
        F: FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync + 'static,
    {
        self.definition
            .write()
            .configurations
            .push(DescriptorConfiguration {
                on,
                configure: Box::new(configure),
            });
    }
}

impl fmt::Debug for ObjectFieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectFieldDescriptor")
            .field("definition", &self.definition)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

/// Hooks into the build phases of a field
pub struct DescriptorExtension<'a> {
    descriptor: &'a mut ObjectFieldDescriptor,
}

impl DescriptorExtension<'_> {
    pub fn on_before_create<F>(self, configure: F) -> Self
    where
        F: FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync + 'static,
    {
        self.on(ApplyConfigurationOn::Create, configure)
    }

    pub fn on_before_naming<F>(self, configure: F) -> Self
    where
        F: FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync + 'static,
    {
        self.on(ApplyConfigurationOn::BeforeNaming, configure)
    }

    pub fn on_after_naming<F>(self, configure: F) -> Self
    where
        F: FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync + 'static,
    {
        self.on(ApplyConfigurationOn::AfterNaming, configure)
    }

    pub fn on_before_completion<F>(self, configure: F) -> Self
    where
        F: FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync + 'static,
    {
        self.on(ApplyConfigurationOn::BeforeCompletion, configure)
    }

    pub fn on<F>(self, on: ApplyConfigurationOn, configure: F) -> Self
    where
        F: FnOnce(&mut DescriptorContext, &FieldDefinitionRef) + Send + Sync + 'static,
    {
        self.descriptor.push_configuration(on, configure);
        self
    }
}
