//! Bean context.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Typed key-value accumulator that visitors populate during a run.
///
/// The dispatch core never looks inside; it only carries the context.
#[derive(Default)]
pub struct BeanContext {
    beans: HashMap<String, Box<dyn Any + Send>>,
}

impl BeanContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `bean` under `id`, returning the previous binding.
    pub fn insert<T: Any + Send>(
        &mut self,
        id: impl Into<String>,
        bean: T,
    ) -> Option<Box<dyn Any + Send>> {
        self.beans.insert(id.into(), Box::new(bean))
    }

    pub fn get<T: Any>(&self, id: &str) -> Option<&T> {
        self.beans.get(id).and_then(|bean| bean.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, id: &str) -> Option<&mut T> {
        self.beans.get_mut(id).and_then(|bean| bean.downcast_mut::<T>())
    }

    /// Returns the bean bound to `id`, inserting `T::default()` first if absent.
    ///
    /// A binding of a different type is replaced.
    pub fn get_or_default<T: Any + Send + Default>(&mut self, id: &str) -> &mut T {
        let slot = self
            .beans
            .entry(id.to_string())
            .or_insert_with(|| Box::new(T::default()));
        if !slot.is::<T>() {
            *slot = Box::new(T::default());
        }
        slot.downcast_mut::<T>()
            .expect("bean was just bound to the requested type")
    }

    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Any + Send>> {
        self.beans.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.beans.contains_key(id)
    }

    /// Returns the bound ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.beans.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }
}

impl fmt::Debug for BeanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanContext")
            .field("ids", &self.ids())
            .finish()
    }
}
