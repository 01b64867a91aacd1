//! Application scope shared by every run.

use std::collections::HashMap;

use parking_lot::RwLock;

/// State that outlives any single run.
///
/// Shared by reference between concurrently running execution contexts, so
/// every mutation goes through the internal lock.
#[derive(Debug, Default)]
pub struct ApplicationContext {
    attributes: RwLock<HashMap<String, String>>,
}

impl ApplicationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.attributes.write().insert(name.into(), value.into())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.read().get(name).cloned()
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.attributes.write().remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_attributes() {
        let app = ApplicationContext::new();
        assert_eq!(app.set_attribute("k", "1"), None);
        assert_eq!(app.set_attribute("k", "2"), Some("1".to_string()));
        assert_eq!(app.attribute("k"), Some("2".to_string()));
        assert_eq!(app.remove_attribute("k"), Some("2".to_string()));
        assert_eq!(app.attribute("k"), None);
    }

    #[test]
    fn test_concurrent_access() {
        let app = Arc::new(ApplicationContext::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let app = Arc::clone(&app);
                thread::spawn(move || {
                    app.set_attribute(format!("worker-{i}"), i.to_string());
                    app.attribute(&format!("worker-{i}"))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Some(i.to_string()));
        }
    }
}
