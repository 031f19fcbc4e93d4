//! Collection configuration and builder.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::collection::{ObservableCollection, OwnerRef};
use crate::error::Result;

/// Default name used in log output.
const DEFAULT_NAME: &str = "collection";

/// Configuration for creating an [`ObservableCollection`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    /// Name used in log output.
    pub name: String,
    /// Storage to reserve up front.
    pub initial_capacity: usize,
    /// Binding path identifying the collection. Can only be set once, so a
    /// path set here cannot be changed later.
    pub identity_path: Option<String>,
    /// Log every delivered notification at debug level.
    pub trace_notifications: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            initial_capacity: 0,
            identity_path: None,
            trace_notifications: false,
        }
    }
}

impl CollectionConfig {
    /// Create a new configuration with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating collections with custom configuration.
pub struct CollectionBuilder<T: 'static> {
    config: CollectionConfig,
    owner: Option<OwnerRef>,
    items: Vec<Arc<T>>,
}

impl<T: 'static> Default for CollectionBuilder<T> {
    fn default() -> Self {
        Self {
            config: CollectionConfig::default(),
            owner: None,
            items: Vec::new(),
        }
    }
}

impl<T: Send + Sync + 'static> CollectionBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name used in log output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Reserve storage for `capacity` elements.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Set the identity path.
    pub fn identity_path(mut self, path: impl Into<String>) -> Self {
        self.config.identity_path = Some(path.into());
        self
    }

    /// Record the owner. Only a weak reference is kept.
    pub fn owner<O: Any + Send + Sync>(mut self, owner: &Arc<O>) -> Self {
        let weak: OwnerRef = Arc::downgrade(owner) as Weak<O>;
        self.owner = Some(weak);
        self
    }

    /// Log every delivered notification.
    pub fn trace_notifications(mut self, enabled: bool) -> Self {
        self.config.trace_notifications = enabled;
        self
    }

    /// Initial elements. They are loaded without raising notifications.
    pub fn items<I, V>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<T>>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Build the collection.
    pub fn build(self) -> Result<ObservableCollection<T>> {
        tracing::debug!(
            target: horizon_observable_core::logging::targets::COLLECTION,
            name = %self.config.name,
            items = self.items.len(),
            "building collection"
        );
        let collection = ObservableCollection::with_config(self.config);
        if let Some(owner) = self.owner {
            collection.set_owner_ref(owner)?;
        }
        collection.load(self.items);
        Ok(collection)
    }
}

impl<T: 'static> fmt::Debug for CollectionBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("config", &self.config)
            .field("has_owner", &self.owner.is_some())
            .field("items", &self.items.len())
            .finish()
    }
}
