use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::naming;

/// Type-erased build-time data, addressed by name and value type
#[derive(Default)]
pub struct ContextData {
    entries: HashMap<(&'static str, TypeId), Box<dyn Any + Send + Sync>>,
}

impl ContextData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any>(&self, key: &'static str) -> Option<&T> {
        self.entries
            .get(&(key, TypeId::of::<T>()))
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &'static str) -> Option<&mut T> {
        self.entries
            .get_mut(&(key, TypeId::of::<T>()))
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Insert a value, returning the previous value stored under the same name and type
    pub fn insert<T: Any + Send + Sync>(&mut self, key: &'static str, value: T) -> Option<T> {
        self.entries
            .insert((key, TypeId::of::<T>()), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    #[allow(clippy::expect_used)]
    pub fn get_or_insert_with<T, F>(&mut self, key: &'static str, default: F) -> &mut T
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        // SAFETY: entries are keyed by the TypeId of the value they hold, so the
        // downcast cannot fail.
        self.entries
            .entry((key, TypeId::of::<T>()))
            .or_insert_with(|| Box::new(default()))
            .downcast_mut::<T>()
            .expect("context data entry holds a value of its key type")
    }

    pub fn remove<T: Any>(&mut self, key: &'static str) -> Option<T> {
        self.entries
            .remove(&(key, TypeId::of::<T>()))
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ContextData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.keys().map(|(key, _)| key))
            .finish()
    }
}

/// State shared by every descriptor while a schema is built
#[derive(Debug, Default)]
pub struct DescriptorContext {
    context_data: ContextData,
}

impl DescriptorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context_data(&self) -> &ContextData {
        &self.context_data
    }

    pub fn context_data_mut(&mut self) -> &mut ContextData {
        &mut self.context_data
    }

    /// The GraphQL field name for a member without an explicit name
    pub fn field_name(&self, member_name: &str) -> String {
        naming::member_to_field_name(member_name)
    }

    pub fn is_valid_name(&self, name: &str) -> bool {
        naming::is_valid_name(name)
    }
}
