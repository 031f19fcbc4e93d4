//! Property system for Horizon Observable.
//!
//! Properties are the data backbone of the signal/slot system: when a
//! property changes, its owner emits a signal to notify interested parties.
//!
//! # Property Types
//!
//! - **Property<T>**: A reactive cell that reports whether a `set` changed it
//! - **OnceProperty<T>**: A cell that may be assigned exactly once
//!
//! # Example
//!
//! ```
//! use horizon_observable_core::property::Property;
//! use horizon_observable_core::signal::Signal;
//!
//! struct Counter {
//!     value: Property<i32>,
//!     value_changed: Signal<i32>,
//! }
//!
//! impl Counter {
//!     fn set_value(&self, new_value: i32) {
//!         if self.value.set(new_value) {
//!             self.value_changed.emit(new_value);
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::error::PropertyError;
use crate::logging::targets;

/// A reactive property that tracks changes.
///
/// `Property<T>` wraps a value and provides change detection. When `set()` is
/// called, it compares the new value with the current one and returns whether
/// the value actually changed.
///
/// # Example
///
/// ```
/// use horizon_observable_core::Property;
///
/// let prop = Property::new(42);
/// assert_eq!(prop.get(), 42);
///
/// // Setting same value returns false (no change)
/// assert!(!prop.set(42));
///
/// // Setting different value returns true (changed)
/// assert!(prop.set(100));
/// assert_eq!(prop.get(), 100);
/// ```
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Set the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    ///
    /// The caller should emit the associated notification signal when this
    /// returns `true`.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

/// A property that can be assigned exactly once.
///
/// Used for configuration that is fixed after the first assignment, such as
/// an owner reference. A second assignment fails with
/// [`PropertyError::AlreadySet`] and leaves the stored value untouched.
pub struct OnceProperty<T> {
    name: &'static str,
    value: OnceLock<T>,
}

impl<T> OnceProperty<T> {
    /// Create an unset property. `name` is reported in errors.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: OnceLock::new(),
        }
    }

    /// Create a property that already holds `value`.
    pub fn with_value(name: &'static str, value: T) -> Self {
        Self {
            name,
            value: OnceLock::from(value),
        }
    }

    /// Get the value, if assigned.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Assign the value.
    pub fn set(&self, value: T) -> Result<(), PropertyError> {
        self.value.set(value).map_err(|_| {
            tracing::debug!(target: targets::PROPERTY, name = self.name, "rejected second assignment");
            PropertyError::AlreadySet { name: self.name }
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for OnceProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceProperty")
            .field("name", &self.name)
            .field("value", &self.value.get())
            .finish()
    }
}
